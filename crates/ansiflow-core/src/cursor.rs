//! Byte/width cursor over ANSI-laden text.
//!
//! [`TextCursor`] borrows the text; [`CursorState`] is a small `Copy` value
//! holding a position in it. Callers keep several states at once (line start,
//! last boundary, previous unit) and step them with [`TextCursor::advance`].

use unicode_width::UnicodeWidthChar;

use crate::scan::{ControlCategories, ControlKind, CsiRecovery, read_control};
use crate::style::{Style, TermCaps};
use crate::warning::WarningFlags;

/// How a cursor interprets control content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorConfig {
    /// Categories treated as control sequences.
    pub categories: ControlCategories,
    /// Colour capabilities used to judge SGR support.
    pub caps: TermCaps,
    /// Raise warning flags on the state.
    pub warn: bool,
    pub recovery: CsiRecovery,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            categories: ControlCategories::all(),
            caps: TermCaps::default(),
            warn: true,
            recovery: CsiRecovery::default(),
        }
    }
}

/// Position in a text: byte offset, display column and active style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    pos_byte: usize,
    pos_width: usize,
    style: Style,
    has_multibyte: bool,
    warnings: WarningFlags,
    warn_at: Option<usize>,
}

impl CursorState {
    /// Byte offset.
    #[inline]
    #[must_use]
    pub const fn byte(&self) -> usize {
        self.pos_byte
    }

    /// Display column since the last newline or width reset.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.pos_width
    }

    #[inline]
    #[must_use]
    pub const fn style(&self) -> &Style {
        &self.style
    }

    /// Whether any SGR attribute is active.
    #[inline]
    #[must_use]
    pub fn has_style(&self) -> bool {
        !self.style.is_empty()
    }

    /// Whether a multibyte character has been walked over.
    #[inline]
    #[must_use]
    pub const fn has_multibyte(&self) -> bool {
        self.has_multibyte
    }

    /// Warning flags raised so far.
    #[inline]
    #[must_use]
    pub const fn warnings(&self) -> WarningFlags {
        self.warnings
    }

    /// Byte offset of the first warning, if any.
    #[inline]
    #[must_use]
    pub const fn warn_at(&self) -> Option<usize> {
        self.warn_at
    }

    /// Same position with `extra` columns added, for tab spaces owed.
    #[inline]
    #[must_use]
    pub const fn with_extra_width(mut self, extra: usize) -> Self {
        self.pos_width = self.pos_width.saturating_add(extra);
        self
    }

    /// Same position with the column reset to zero.
    #[inline]
    #[must_use]
    pub const fn with_width_reset(mut self) -> Self {
        self.pos_width = 0;
        self
    }

    fn raise(&mut self, flag: WarningFlags, at: usize) {
        self.warnings |= flag;
        if self.warn_at.is_none() {
            self.warn_at = Some(at);
        }
    }
}

/// Walks one text a visual unit at a time.
#[derive(Debug, Clone, Copy)]
pub struct TextCursor<'a> {
    text: &'a [u8],
    config: CursorConfig,
}

impl<'a> TextCursor<'a> {
    #[must_use]
    pub fn new(text: &'a [u8], config: CursorConfig) -> Self {
        Self { text, config }
    }

    #[inline]
    #[must_use]
    pub fn text(&self) -> &'a [u8] {
        self.text
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &CursorConfig {
        &self.config
    }

    /// State at offset zero with no style.
    #[inline]
    #[must_use]
    pub fn start(&self) -> CursorState {
        CursorState::default()
    }

    /// Byte under the cursor, `None` at the end.
    #[inline]
    #[must_use]
    pub fn byte_at(&self, state: CursorState) -> Option<u8> {
        self.text.get(state.pos_byte).copied()
    }

    #[inline]
    #[must_use]
    pub fn at_end(&self, state: CursorState) -> bool {
        state.pos_byte >= self.text.len()
    }

    /// Step over one codepoint or one whole control sequence.
    ///
    /// At the end of the text the state is returned unchanged.
    #[must_use]
    pub fn advance(&self, state: CursorState) -> CursorState {
        let at = state.pos_byte;
        let Some(&lead) = self.text.get(at) else {
            return state;
        };
        let mut next = state;

        if let Some(seq) = read_control(self.text, at, self.config.recovery) {
            if !self.config.categories.contains(seq.kind.category()) {
                // Uninterpreted: the lead byte is zero width, the rest is text.
                next.pos_byte = at + 1;
                return next;
            }
            next.pos_byte = at + seq.len;
            match seq.kind {
                ControlKind::Newline => next.pos_width = 0,
                ControlKind::Sgr if seq.valid => {
                    // ESC [ params m
                    let params = &self.text[at + 2..at + seq.len - 1];
                    if !next.style.apply_sgr(params, self.config.caps) && self.config.warn {
                        next.raise(WarningFlags::UNSUPPORTED_SGR, at);
                    }
                }
                _ => {}
            }
            if !seq.valid && self.config.warn {
                next.raise(WarningFlags::INVALID_CONTROL, at);
            }
            return next;
        }

        if lead < 0x80 {
            next.pos_byte = at + 1;
            next.pos_width += 1;
            return next;
        }

        match self.decode(at, lead) {
            Some((ch, len)) => {
                next.pos_byte = at + len;
                next.pos_width += ch.width().unwrap_or(0);
                next.has_multibyte = true;
            }
            None => {
                next.pos_byte = at + 1;
                next.pos_width += 1;
                if self.config.warn {
                    next.raise(WarningFlags::MALFORMED_UTF8, at);
                }
            }
        }
        next
    }

    fn decode(&self, at: usize, lead: u8) -> Option<(char, usize)> {
        let len = match lead {
            0xc2..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf4 => 4,
            _ => return None,
        };
        let bytes = self.text.get(at..at + len)?;
        let ch = std::str::from_utf8(bytes).ok()?.chars().next()?;
        Some((ch, len))
    }

    /// Walk to the end and return the final state.
    #[must_use]
    pub fn finish(&self) -> CursorState {
        let mut state = self.start();
        while !self.at_end(state) {
            state = self.advance(state);
        }
        state
    }
}
