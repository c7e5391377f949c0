//! ANSI-aware word wrapping.
//!
//! Lines are broken at spaces, tabs and newlines, measured in display columns
//! with control sequences counted as zero width. The SGR style active where a
//! line breaks is closed with `ESC[0m` at the end of that line and reopened
//! at the start of the next one, so every emitted line renders on its own.
//!
//! # Example
//! ```
//! use ansiflow_text::wrap::wrap_str;
//!
//! let lines = wrap_str("Hello world foo bar", 11).unwrap();
//! assert_eq!(lines, vec!["Hello world", "foo bar"]);
//! ```

use std::borrow::Cow;

use ansiflow_core::{
    ArgumentError, CursorConfig, CursorState, Diagnostics, Error, Limits, Operation, Outcome,
    Result, SGR_RESET, ScratchBuffer, TextCursor, WarnPolicy, WarningSource,
};

use crate::normalize::normalize_whitespace;
use crate::options::TextOptions;
use crate::prefix::{LinePrefixes, PrefixSpec};
use crate::tabs::{TabStops, expand_one};

/// Options for reflowing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflowOptions {
    /// Maximum line width in columns, prefix included.
    pub width: usize,
    /// Spaces after the first-line prefix of each paragraph.
    pub indent: usize,
    /// Spaces after the prefix of other lines.
    pub exdent: usize,
    /// Prefix for every line except the very first one.
    pub prefix: Vec<u8>,
    /// Prefix for the first line of the first element; defaults to `prefix`.
    pub initial: Option<Vec<u8>>,
    /// Break inside words that do not fit.
    pub wrap_always: bool,
    /// Right-pad shorter lines with this printable ASCII character.
    pub pad: Option<char>,
    /// Normalize whitespace and drop leading spaces of continuation lines.
    pub strip_spaces: bool,
    /// Expand tabs in the input, prefix and initial first.
    pub tabs: Option<TabStops>,
    /// Return only the first line of each element.
    pub first_line_only: bool,
}

impl ReflowOptions {
    /// Create reflow options with the given width.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            width,
            indent: 0,
            exdent: 0,
            prefix: Vec::new(),
            initial: None,
            wrap_always: false,
            pad: None,
            strip_spaces: true,
            tabs: None,
            first_line_only: false,
        }
    }

    #[must_use]
    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn exdent(mut self, exdent: usize) -> Self {
        self.exdent = exdent;
        self
    }

    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn initial(mut self, initial: impl Into<Vec<u8>>) -> Self {
        self.initial = Some(initial.into());
        self
    }

    #[must_use]
    pub fn wrap_always(mut self, wrap_always: bool) -> Self {
        self.wrap_always = wrap_always;
        self
    }

    #[must_use]
    pub fn pad(mut self, pad: Option<char>) -> Self {
        self.pad = pad;
        self
    }

    #[must_use]
    pub fn strip_spaces(mut self, strip: bool) -> Self {
        self.strip_spaces = strip;
        self
    }

    /// Expand tabs against `stops` before wrapping.
    #[must_use]
    pub fn tabs_as_spaces(mut self, stops: TabStops) -> Self {
        self.tabs = Some(stops);
        self
    }

    #[must_use]
    pub fn first_line_only(mut self, first_only: bool) -> Self {
        self.first_line_only = first_only;
        self
    }

    /// Check the arguments that do not depend on the prefixes.
    ///
    /// # Errors
    ///
    /// [`ArgumentError::InvalidPad`] or [`ArgumentError::ZeroWidth`].
    pub fn validate(&self) -> Result<()> {
        if let Some(ch) = self.pad
            && !(' '..='~').contains(&ch)
        {
            return Err(ArgumentError::InvalidPad(ch).into());
        }
        if self.wrap_always && self.width == 0 {
            return Err(ArgumentError::ZeroWidth.into());
        }
        Ok(())
    }
}

impl Default for ReflowOptions {
    fn default() -> Self {
        Self::new(80)
    }
}

/// Output of [`reflow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reflowed {
    /// All lines of every element.
    Lines(Vec<Vec<Vec<u8>>>),
    /// The first line of every element.
    FirstLines(Vec<Vec<u8>>),
}

impl Reflowed {
    /// Number of input elements represented.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Lines(lines) => lines.len(),
            Self::FirstLines(lines) => lines.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lines of each element; `None` in first-line mode.
    #[must_use]
    pub fn lines(&self) -> Option<&[Vec<Vec<u8>>]> {
        match self {
            Self::Lines(lines) => Some(lines),
            Self::FirstLines(_) => None,
        }
    }

    /// First lines; `None` unless in first-line mode.
    #[must_use]
    pub fn first_lines(&self) -> Option<&[Vec<u8>]> {
        match self {
            Self::Lines(_) => None,
            Self::FirstLines(lines) => Some(lines),
        }
    }
}

/// Assemble one output line.
///
/// Layout: opening style, prefix, `text[start..bound]`, padding, closing
/// reset.
#[allow(clippy::too_many_arguments)]
fn write_line(
    text: &[u8],
    start: CursorState,
    bound: CursorState,
    spec: &PrefixSpec,
    target: isize,
    pad: Option<u8>,
    limits: &Limits,
    buf: &mut ScratchBuffer,
) -> Result<Vec<u8>> {
    if bound.byte() < start.byte() || bound.width() < start.width() {
        return Err(Error::Internal("line boundary before line start"));
    }
    let content = &text[start.byte()..bound.byte()];
    let width = bound.width() - start.width();
    let prefix = if content.is_empty() {
        spec.without_indent()
    } else {
        spec.bytes()
    };

    let target = usize::try_from(target).unwrap_or(0);
    let pad_len = match pad {
        Some(_) if width <= target => target - width,
        _ => 0,
    };
    let mut size = limits.add(content.len(), pad_len, Operation::Padding)?;
    size = limits.add(size, prefix.len(), Operation::Prefix)?;
    let close_len = if bound.has_style() { SGR_RESET.len() } else { 0 };
    size = limits.add(
        size,
        close_len + start.style().sgr_len(),
        Operation::StyleTagging,
    )?;

    let out = buf.reserve(size)?;
    start.style().write_sgr(out);
    out.extend_from_slice(prefix);
    out.extend_from_slice(content);
    if let Some(pad) = pad {
        out.resize(out.len() + pad_len, pad);
    }
    if close_len > 0 {
        out.extend_from_slice(SGR_RESET);
    }
    Ok(out.to_vec())
}

#[inline]
fn is_boundary(byte: Option<u8>) -> bool {
    matches!(byte, Some(b' ' | b'\t' | b'\n'))
}

/// Wraps the elements of one batch.
struct LineWrapper<'o> {
    opts: &'o ReflowOptions,
    prefixes: &'o LinePrefixes,
    limits: Limits,
}

impl LineWrapper<'_> {
    /// Wrap one element.
    ///
    /// Returns the lines and the furthest cursor state reached, whose
    /// warning flags cover everything walked.
    fn wrap(
        &self,
        text: &[u8],
        index: usize,
        config: CursorConfig,
        buf: &mut ScratchBuffer,
    ) -> Result<(Vec<Vec<u8>>, CursorState)> {
        let cursor = TextCursor::new(text, config);
        let limits = &self.limits;
        let first_spec = self.prefixes.first_for(index);
        let next_spec = &self.prefixes.prefix_next;
        let strip = self.opts.strip_spaces;
        let wrap_always = self.opts.wrap_always;
        let first_only = self.opts.first_line_only;
        let pad = self.opts.pad.map(|ch| ch as u8);

        let width = limits.signed(self.opts.width);
        let width_first = width - limits.signed(first_spec.width());
        let width_next = width - limits.signed(next_spec.width());
        let cols = |state: CursorState| limits.signed(state.width());

        let mut target = width_first;
        let mut prev_boundary = false;
        let mut has_boundary = false;
        let mut para_start = true;
        let mut first_line = true;
        let mut last_start = 0;

        let mut state = cursor.start();
        let (mut start, mut bound, mut prev) = (state, state, state);
        let mut furthest = state;
        let mut lines = Vec::new();

        loop {
            let next = if cursor.at_end(state) {
                state
            } else {
                cursor.advance(state)
            };
            if next.byte() > furthest.byte() {
                furthest = next;
            }
            let byte = cursor.byte_at(state);

            if is_boundary(byte) {
                if !strip || !prev_boundary {
                    bound = state;
                }
                has_boundary = true;
                prev_boundary = true;
            } else {
                prev_boundary = false;
            }

            let at_end = byte.is_none();
            let over = cols(state) > target
                || (cols(state) == target && next.width() > state.width());

            if !(at_end
                || (byte == Some(b'\n') && !first_only)
                || (over && (has_boundary || wrap_always)))
            {
                prev = state;
                state = next;
                continue;
            }

            // A boundary past the target (wide character then space) cannot
            // be used when every line must fit.
            let bound_overshoots = wrap_always && has_boundary && cols(bound) > target;
            if at_end || first_only || (wrap_always && !has_boundary) || bound_overshoots {
                if wrap_always && cols(state) > target {
                    state = prev;
                }
                bound = state;
                if bound_overshoots {
                    has_boundary = false;
                }
            }
            if !first_line && last_start >= start.byte() {
                if wrap_always {
                    return Err(Error::WidthTooNarrow {
                        width: self.opts.width,
                    });
                }
                return Err(Error::Internal("line break made no progress"));
            }
            // A kept space is emitted with the line, even when it is the
            // whole line, so the next line starts past it.
            if !strip
                && has_boundary
                && matches!(cursor.byte_at(bound), Some(b' ' | b'\t'))
                && (bound.byte() < state.byte() || bound.byte() == start.byte())
            {
                bound = cursor.advance(bound);
            }

            let spec = if para_start { first_spec } else { next_spec };
            let line = write_line(text, start, bound, spec, target, pad, limits, buf)?;
            tracing::trace!(
                element = index,
                start = start.byte(),
                end = bound.byte(),
                width = bound.width() - start.width(),
                "line break"
            );
            lines.push(line);
            first_line = false;
            last_start = start.byte();
            if first_only || cursor.at_end(state) {
                break;
            }

            para_start = cursor.byte_at(state) == Some(b'\n');
            target = if para_start { width_first } else { width_next };
            if has_boundary && para_start {
                bound = cursor.advance(bound);
            } else if !has_boundary {
                bound = state;
            }
            if strip {
                while cursor.byte_at(bound) == Some(b' ') {
                    bound = cursor.advance(bound);
                }
            }
            has_boundary = false;
            bound = bound.with_width_reset();

            prev = state;
            state = bound;
            start = bound;
        }
        Ok((lines, furthest))
    }
}

/// Measure `text` as a prefix, expanding tabs first when requested.
fn prepare_prefix(
    text: &[u8],
    reflow_opts: &ReflowOptions,
    opts: &TextOptions,
    buf: &mut ScratchBuffer,
    diag: &mut Diagnostics,
    source: WarningSource,
) -> Result<PrefixSpec> {
    opts.limits.check(text.len(), Operation::Prefix)?;
    let expanded = match &reflow_opts.tabs {
        Some(stops) => expand_one(
            text,
            stops,
            opts,
            buf,
            &mut Diagnostics::new(WarnPolicy::Silent),
            source,
        )?,
        None => Cow::Borrowed(text),
    };
    let (spec, state) = PrefixSpec::measure(&expanded, opts.cursor(diag));
    diag.record(source, state.warnings(), state.warn_at().unwrap_or(0));
    Ok(spec)
}

/// Wrap every string of a batch.
///
/// With [`ReflowOptions::first_line_only`] the result is
/// [`Reflowed::FirstLines`], otherwise [`Reflowed::Lines`].
///
/// Warning offsets refer to each element as wrapped, after whitespace
/// normalization and tab expansion.
///
/// # Errors
///
/// Argument errors before any element is processed; `Overflow`,
/// `WidthTooNarrow` or `Cancelled` abort the whole batch.
pub fn reflow<S>(
    strings: &[S],
    reflow_opts: &ReflowOptions,
    opts: &TextOptions,
) -> Result<Outcome<Reflowed>>
where
    S: AsRef<[u8]>,
{
    let span = tracing::debug_span!(
        "reflow",
        elements = strings.len(),
        width = reflow_opts.width,
        wrap_always = reflow_opts.wrap_always
    );
    let _guard = span.enter();
    reflow_batch(strings, reflow_opts, opts)
        .inspect_err(|err| tracing::debug!(%err, "reflow failed"))
}

fn reflow_batch<S>(
    strings: &[S],
    reflow_opts: &ReflowOptions,
    opts: &TextOptions,
) -> Result<Outcome<Reflowed>>
where
    S: AsRef<[u8]>,
{
    reflow_opts.validate()?;
    let limits = opts.limits;
    let mut diag = Diagnostics::new(opts.warn);
    let mut buf = ScratchBuffer::new(limits);

    let prefix = prepare_prefix(
        &reflow_opts.prefix,
        reflow_opts,
        opts,
        &mut buf,
        &mut diag,
        WarningSource::Prefix,
    )?;
    let initial = match &reflow_opts.initial {
        Some(initial) => prepare_prefix(
            initial,
            reflow_opts,
            opts,
            &mut buf,
            &mut diag,
            WarningSource::Initial,
        )?,
        None => prefix.clone(),
    };
    let prefixes = LinePrefixes::new(
        &initial,
        &prefix,
        reflow_opts.indent,
        reflow_opts.exdent,
        &limits,
    )?;
    if reflow_opts.wrap_always && prefixes.max_width() >= reflow_opts.width {
        return Err(ArgumentError::InfeasibleWidth {
            width: reflow_opts.width,
            prefix_width: prefixes.max_width(),
        }
        .into());
    }

    let wrapper = LineWrapper {
        opts: reflow_opts,
        prefixes: &prefixes,
        limits,
    };
    let mut all_lines = Vec::with_capacity(strings.len());
    for (index, text) in strings.iter().enumerate() {
        opts.checkpoint(index)?;
        let text = text.as_ref();
        limits.check(text.len(), Operation::Input)?;

        let text = if reflow_opts.strip_spaces {
            normalize_whitespace(text, opts)
        } else {
            Cow::Borrowed(text)
        };
        // Warnings for the element come from the wrap walk below.
        let text = match &reflow_opts.tabs {
            Some(stops) if text.contains(&b'\t') => Cow::Owned(
                expand_one(
                    &text,
                    stops,
                    opts,
                    &mut buf,
                    &mut Diagnostics::new(WarnPolicy::Silent),
                    WarningSource::Element(index),
                )?
                .into_owned(),
            ),
            _ => text,
        };

        let (lines, end) = wrapper.wrap(&text, index, opts.cursor(&diag), &mut buf)?;
        diag.record(
            WarningSource::Element(index),
            end.warnings(),
            end.warn_at().unwrap_or(0),
        );
        all_lines.push(lines);
    }

    let value = if reflow_opts.first_line_only {
        Reflowed::FirstLines(
            all_lines
                .into_iter()
                .map(|lines| lines.into_iter().next().unwrap_or_default())
                .collect(),
        )
    } else {
        Reflowed::Lines(all_lines)
    };
    Ok(diag.finish(value))
}

/// Wrap a single string with default options, stripping spaces.
///
/// # Errors
///
/// See [`reflow`].
pub fn wrap_str(text: &str, width: usize) -> Result<Vec<String>> {
    let outcome = reflow(
        &[text],
        &ReflowOptions::new(width),
        &TextOptions::new().warn(WarnPolicy::Silent),
    )?;
    let lines = match outcome.value {
        Reflowed::Lines(mut lines) => lines.pop().unwrap_or_default(),
        Reflowed::FirstLines(lines) => lines,
    };
    Ok(lines
        .into_iter()
        .map(|line| String::from_utf8_lossy(&line).into_owned())
        .collect())
}
