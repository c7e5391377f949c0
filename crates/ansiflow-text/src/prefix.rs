//! Line prefixes: `prefix`/`initial` strings combined with indent/exdent.

use ansiflow_core::{CursorConfig, CursorState, Limits, Operation, Result, TextCursor};

/// A rendered line prefix.
///
/// `bytes` ends with `indent` spaces, which are also counted in `width`.
/// Lines without content drop those spaces.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrefixSpec {
    bytes: Vec<u8>,
    width: usize,
    indent: usize,
    has_multibyte: bool,
}

impl PrefixSpec {
    /// Measure a raw prefix. Controls are zero width.
    ///
    /// Returns the final cursor state too, so callers can report the
    /// warnings raised while measuring.
    #[must_use]
    pub fn measure(text: &[u8], config: CursorConfig) -> (Self, CursorState) {
        let cursor = TextCursor::new(text, config);
        let mut state = cursor.start();
        let mut width = 0;
        while !cursor.at_end(state) {
            let next = cursor.advance(state);
            width += next.width().saturating_sub(state.width());
            state = next;
        }
        let spec = Self {
            bytes: text.to_vec(),
            width,
            indent: 0,
            has_multibyte: state.has_multibyte(),
        };
        (spec, state)
    }

    /// Copy with `spaces` more indent spaces appended.
    ///
    /// # Errors
    ///
    /// `Overflow` tagged [`Operation::Prefix`] when the result is too long.
    pub fn with_spaces(&self, spaces: usize, limits: &Limits) -> Result<Self> {
        let len = limits.add(self.bytes.len(), spaces, Operation::Prefix)?;
        let width = limits.add(self.width, spaces, Operation::Prefix)?;
        let mut bytes = Vec::with_capacity(len);
        bytes.extend_from_slice(&self.bytes);
        bytes.resize(len, b' ');
        Ok(Self {
            bytes,
            width,
            indent: self.indent + spaces,
            has_multibyte: self.has_multibyte,
        })
    }

    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes without the trailing indent spaces.
    #[inline]
    #[must_use]
    pub fn without_indent(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - self.indent]
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn indent(&self) -> usize {
        self.indent
    }

    #[inline]
    #[must_use]
    pub fn has_multibyte(&self) -> bool {
        self.has_multibyte
    }
}

/// The three prefixes a wrap call can use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinePrefixes {
    /// `initial` + indent: paragraph starts of the first element.
    pub initial_first: PrefixSpec,
    /// `prefix` + indent: paragraph starts of later elements.
    pub prefix_first: PrefixSpec,
    /// `prefix` + exdent: every other line.
    pub prefix_next: PrefixSpec,
}

impl LinePrefixes {
    /// # Errors
    ///
    /// `Overflow` tagged [`Operation::Prefix`].
    pub fn new(
        initial: &PrefixSpec,
        prefix: &PrefixSpec,
        indent: usize,
        exdent: usize,
        limits: &Limits,
    ) -> Result<Self> {
        let initial_first = initial.with_spaces(indent, limits)?;
        let prefix_first = prefix.with_spaces(indent, limits)?;
        let prefix_next = prefix.with_spaces(exdent, limits)?;
        Ok(Self {
            initial_first,
            prefix_first,
            prefix_next,
        })
    }

    /// Paragraph-start prefix for the element at `index`.
    #[must_use]
    pub fn first_for(&self, index: usize) -> &PrefixSpec {
        if index == 0 {
            &self.initial_first
        } else {
            &self.prefix_first
        }
    }

    /// Widest of the three.
    #[must_use]
    pub fn max_width(&self) -> usize {
        self.initial_first
            .width
            .max(self.prefix_first.width)
            .max(self.prefix_next.width)
    }
}
