//! Whitespace normalization applied before wrapping with space stripping.
//!
//! - leading and trailing whitespace is removed
//! - a run of spaces, tabs and newlines becomes a single space
//! - a run of two or more whitespace bytes after a sentence end (`.`, `?` or
//!   `!`, optionally followed by `)`, `"` or `'`) becomes two spaces
//! - a run holding two or more newlines becomes a paragraph break `"\n\n"`
//!
//! Control sequences met inside a whitespace run are kept and emitted after
//! the replacement whitespace so style changes survive.

use std::borrow::Cow;

use ansiflow_core::read_control;

use crate::options::TextOptions;

#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n')
}

#[inline]
fn is_sentence_end(b: u8) -> bool {
    matches!(b, b'.' | b'?' | b'!')
}

#[inline]
fn is_closer(b: u8) -> bool {
    matches!(b, b')' | b'"' | b'\'')
}

#[derive(Default)]
struct Run {
    bytes: usize,
    newlines: usize,
    controls: Vec<u8>,
}

impl Run {
    fn is_open(&self) -> bool {
        self.bytes > 0
    }
}

/// Normalize the whitespace of one string.
///
/// Returns the input borrowed when nothing changes.
#[must_use]
pub fn normalize_whitespace<'t>(text: &'t [u8], opts: &TextOptions) -> Cow<'t, [u8]> {
    let mut out = Vec::with_capacity(text.len());
    let mut run = Run::default();
    let mut seen_content = false;
    // Last two content bytes, most recent last.
    let mut tail = [0u8; 2];
    let mut i = 0;

    while i < text.len() {
        let b = text[i];
        if is_space(b) {
            run.bytes += 1;
            run.newlines += usize::from(b == b'\n');
            i += 1;
            continue;
        }
        if let Some(seq) = read_control(text, i, opts.recovery)
            && opts.categories.contains(seq.kind.category())
        {
            let end = (i + seq.len).min(text.len());
            if run.is_open() {
                run.controls.extend_from_slice(&text[i..end]);
            } else {
                out.extend_from_slice(&text[i..end]);
            }
            i = end;
            continue;
        }

        if run.is_open() {
            if seen_content {
                let sentence =
                    is_sentence_end(tail[1]) || (is_closer(tail[1]) && is_sentence_end(tail[0]));
                if run.newlines >= 2 {
                    out.extend_from_slice(b"\n\n");
                } else if run.bytes >= 2 && sentence {
                    out.extend_from_slice(b"  ");
                } else {
                    out.push(b' ');
                }
            }
            out.append(&mut run.controls);
            run = Run::default();
        }
        out.push(b);
        tail = [tail[1], b];
        seen_content = true;
        i += 1;
    }
    out.append(&mut run.controls);

    if out == text {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(out)
    }
}
