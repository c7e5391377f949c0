//! Tab expansion against a cumulative tab-stop table.
//!
//! Stops are widths between consecutive tab positions: `[4, 2]` puts tab
//! positions at columns 4, 6, 8, 10... because the last stop repeats once the
//! table runs out. Columns are display columns, so control sequences and
//! wide characters are accounted for, and every newline restarts at zero.

use std::borrow::Cow;

use ansiflow_core::{
    ArgumentError, Diagnostics, Limits, Operation, Outcome, Result, ScratchBuffer, TextCursor,
    WarningSource,
};
use smallvec::{SmallVec, smallvec};

use crate::options::TextOptions;

/// Validated tab-stop widths: non-empty and all positive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TabStops(SmallVec<[usize; 4]>);

impl Default for TabStops {
    fn default() -> Self {
        Self(smallvec![8])
    }
}

impl TabStops {
    /// # Errors
    ///
    /// [`ArgumentError::EmptyTabStops`] or [`ArgumentError::ZeroTabStop`].
    pub fn new<I: IntoIterator<Item = usize>>(stops: I) -> Result<Self> {
        let stops: SmallVec<[usize; 4]> = stops.into_iter().collect();
        if stops.is_empty() {
            return Err(ArgumentError::EmptyTabStops.into());
        }
        if let Some(index) = stops.iter().position(|s| *s == 0) {
            return Err(ArgumentError::ZeroTabStop { index }.into());
        }
        Ok(Self(stops))
    }

    /// Evenly spaced stops every `width` columns.
    ///
    /// # Errors
    ///
    /// [`ArgumentError::ZeroTabStop`] when `width` is zero.
    pub fn uniform(width: usize) -> Result<Self> {
        Self::new([width])
    }

    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Widest single stop.
    #[must_use]
    pub fn max_stop(&self) -> usize {
        self.0.iter().copied().max().unwrap_or(1)
    }

    /// Spaces a tab at column `col` expands to.
    ///
    /// That is the smallest cumulative stop strictly greater than `col`,
    /// minus `col`.
    ///
    /// # Errors
    ///
    /// [`ansiflow_core::Error::Overflow`] tagged [`Operation::TabStop`] if
    /// the cumulative position exceeds the limit.
    pub fn spaces_at(&self, col: usize, limits: &Limits) -> Result<usize> {
        let (last, leading) = match self.0.split_last() {
            Some(split) => split,
            None => return Err(ArgumentError::EmptyTabStops.into()),
        };
        let mut acc = 0;
        for stop in leading {
            if acc > col {
                return Ok(acc - col);
            }
            acc = limits.add(acc, *stop, Operation::TabStop)?;
        }
        if acc <= col {
            let steps = (col - acc) / last + 1;
            let extra = limits.mul(steps, *last, Operation::TabStop)?;
            acc = limits.add(acc, extra, Operation::TabStop)?;
        }
        Ok(acc - col)
    }
}

/// Expand the tabs of one string.
///
/// Strings without a tab are returned borrowed.
pub(crate) fn expand_one<'t>(
    text: &'t [u8],
    stops: &TabStops,
    opts: &TextOptions,
    buf: &mut ScratchBuffer,
    diag: &mut Diagnostics,
    source: WarningSource,
) -> Result<Cow<'t, [u8]>> {
    let limits = &opts.limits;
    limits.check(text.len(), Operation::Input)?;
    let tabs = text.iter().filter(|b| **b == b'\t').count();
    if tabs == 0 {
        return Ok(Cow::Borrowed(text));
    }
    let extra = limits.mul(tabs, stops.max_stop() - 1, Operation::TabExpansion)?;
    let size = limits.add(text.len(), extra, Operation::TabExpansion)?;

    let out = buf.reserve(size)?;
    let cursor = TextCursor::new(text, opts.cursor(diag));
    let mut state = cursor.start();
    let mut last = 0;
    while !cursor.at_end(state) {
        match cursor.byte_at(state) {
            Some(b'\t') => {
                out.extend_from_slice(&text[last..state.byte()]);
                let spaces = stops.spaces_at(state.width(), limits)?;
                out.resize(out.len() + spaces, b' ');
                state = cursor.advance(state).with_extra_width(spaces);
                last = state.byte();
            }
            Some(b'\n') => state = cursor.advance(state).with_width_reset(),
            _ => state = cursor.advance(state),
        }
    }
    out.extend_from_slice(&text[last..]);
    diag.record(source, state.warnings(), state.warn_at().unwrap_or(0));
    Ok(Cow::Owned(out.to_vec()))
}

/// Replace tabs with spaces in every string of a batch.
///
/// The batch is atomic: any error discards all output.
///
/// # Errors
///
/// `Overflow` when an expanded string could exceed the length limit, or
/// `Cancelled` when the token in `opts` fires.
pub fn expand_tabs<'t, S>(
    strings: &'t [S],
    stops: &TabStops,
    opts: &TextOptions,
) -> Result<Outcome<Vec<Cow<'t, [u8]>>>>
where
    S: AsRef<[u8]>,
{
    let span = tracing::debug_span!("expand_tabs", elements = strings.len());
    let _guard = span.enter();

    let mut diag = Diagnostics::new(opts.warn);
    let mut buf = ScratchBuffer::new(opts.limits);
    let mut out = Vec::with_capacity(strings.len());
    for (index, text) in strings.iter().enumerate() {
        opts.checkpoint(index)?;
        let expanded = expand_one(
            text.as_ref(),
            stops,
            opts,
            &mut buf,
            &mut diag,
            WarningSource::Element(index),
        )
        .inspect_err(|err| tracing::debug!(index, %err, "tab expansion failed"))?;
        out.push(expanded);
    }
    Ok(diag.finish(out))
}
