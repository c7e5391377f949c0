//! Control-sequence removal, detection and width measurement.

use std::borrow::Cow;

use ansiflow_core::{
    ControlScanner, CursorConfig, Diagnostics, Outcome, Result, TextCursor, WarningFlags,
    WarningSource,
};

use crate::options::TextOptions;

fn scanner(opts: &TextOptions) -> ControlScanner {
    ControlScanner::new(opts.categories).recovery(opts.recovery)
}

/// Remove the enabled control sequences of one string.
fn strip_one<'t>(text: &'t [u8], scanner: ControlScanner) -> (Cow<'t, [u8]>, Option<usize>) {
    let mut out: Option<Vec<u8>> = None;
    let mut invalid_at = None;
    let mut pos = 0;
    for found in scanner.matches(text) {
        if !found.valid && invalid_at.is_none() {
            invalid_at = Some(found.start);
        }
        let out = out.get_or_insert_with(|| Vec::with_capacity(text.len()));
        out.extend_from_slice(&text[pos..found.start]);
        pos = found.end();
    }
    match out {
        Some(mut out) => {
            out.extend_from_slice(&text[pos..]);
            (Cow::Owned(out), invalid_at)
        }
        None => (Cow::Borrowed(text), invalid_at),
    }
}

/// Remove the control sequences enabled in `opts` from every string.
///
/// Strings without such sequences are returned borrowed. Malformed
/// sequences are removed too and reported as warnings.
///
/// # Errors
///
/// `Cancelled` when the token in `opts` fires.
pub fn strip_controls<'t, S>(
    strings: &'t [S],
    opts: &TextOptions,
) -> Result<Outcome<Vec<Cow<'t, [u8]>>>>
where
    S: AsRef<[u8]>,
{
    let span = tracing::debug_span!("strip_controls", elements = strings.len());
    let _guard = span.enter();

    let scanner = scanner(opts);
    let mut diag = Diagnostics::new(opts.warn);
    let mut out = Vec::with_capacity(strings.len());
    for (index, text) in strings.iter().enumerate() {
        opts.checkpoint(index)?;
        let (stripped, invalid_at) = strip_one(text.as_ref(), scanner);
        if let Some(at) = invalid_at {
            diag.record(
                WarningSource::Element(index),
                WarningFlags::INVALID_CONTROL,
                at,
            );
        }
        out.push(stripped);
    }
    Ok(diag.finish(out))
}

/// Whether `text` contains any control sequence enabled in `opts`.
#[must_use]
pub fn has_controls(text: &[u8], opts: &TextOptions) -> bool {
    scanner(opts).find(text, 0).is_match()
}

/// Display width of the widest line of `text`.
///
/// Enabled control sequences are zero width.
#[must_use]
pub fn display_width(text: &[u8], opts: &TextOptions) -> usize {
    let config = CursorConfig {
        categories: opts.categories,
        caps: opts.caps,
        warn: false,
        recovery: opts.recovery,
    };
    let cursor = TextCursor::new(text, config);
    let mut state = cursor.start();
    let mut widest = 0;
    while !cursor.at_end(state) {
        state = match cursor.byte_at(state) {
            Some(b'\n') => cursor.advance(state).with_width_reset(),
            _ => cursor.advance(state),
        };
        widest = widest.max(state.width());
    }
    widest
}
