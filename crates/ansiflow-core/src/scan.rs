//! Control-sequence scanner.
//!
//! Classifies terminal control content embedded in byte strings:
//!
//! - CSI SGR (`ESC [ params m`) -> [`ControlKind::Sgr`]
//! - any other CSI (`ESC [ params intermediates final`) -> [`ControlKind::Csi`]
//! - two-byte escapes and C1 (`ESC final`) -> [`ControlKind::Esc`]
//! - line feed -> [`ControlKind::Newline`]
//! - remaining C0 controls and DEL -> [`ControlKind::C0`]
//!
//! [`read_control`] holds the only copy of the grammar. The scanner and the
//! cursor both call it, so they always agree on where a sequence ends.

use std::str::FromStr;

use bitflags::bitflags;

use crate::error::ArgumentError;

pub(crate) const ESC: u8 = 0x1b;

bitflags! {
    /// Categories of control content a caller wants recognized.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ControlCategories: u8 {
        /// Line feed (`\n`).
        const NEWLINE = 1 << 0;
        /// C0 controls other than newline and ESC, plus DEL.
        const C0      = 1 << 1;
        /// `ESC` followed by a single byte (includes the C1 set).
        const ESC     = 1 << 2;
        /// CSI sequences that are not SGR.
        const CSI     = 1 << 3;
        /// CSI SGR sequences.
        const SGR     = 1 << 4;
    }
}

impl ControlCategories {
    /// Every category except `excluded`.
    #[must_use]
    pub fn all_except(excluded: Self) -> Self {
        Self::all().difference(excluded)
    }

    /// Build a category set from names.
    ///
    /// Recognized names are `nl`, `c0`, `esc`, `csi`, `sgr` and `all`. When
    /// `all` is present the other names are exclusions, so
    /// `["all", "sgr"]` selects everything except SGR.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::UnknownCategory`] for unrecognized names.
    pub fn from_names<'a, I>(names: I) -> Result<Self, ArgumentError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut set = Self::empty();
        let mut invert = false;
        for name in names {
            if name == "all" {
                invert = true;
            } else {
                set |= name.parse::<Self>()?;
            }
        }
        Ok(if invert { Self::all_except(set) } else { set })
    }
}

impl FromStr for ControlCategories {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nl" => Ok(Self::NEWLINE),
            "c0" => Ok(Self::C0),
            "esc" => Ok(Self::ESC),
            "csi" => Ok(Self::CSI),
            "sgr" => Ok(Self::SGR),
            "all" => Ok(Self::all()),
            other => Err(ArgumentError::UnknownCategory(other.to_string())),
        }
    }
}

/// What to do when a CSI sequence has no valid final byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CsiRecovery {
    /// Swallow any trailing parameter/intermediate bytes and the byte after
    /// them, the way common terminal emulators behave.
    #[default]
    ConsumeTrailing,
    /// End the sequence right before the offending byte.
    Strict,
}

/// Kind of a single control sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Newline,
    C0,
    Esc,
    Csi,
    Sgr,
}

impl ControlKind {
    /// The category bit this kind belongs to.
    #[must_use]
    pub const fn category(self) -> ControlCategories {
        match self {
            Self::Newline => ControlCategories::NEWLINE,
            Self::C0 => ControlCategories::C0,
            Self::Esc => ControlCategories::ESC,
            Self::Csi => ControlCategories::CSI,
            Self::Sgr => ControlCategories::SGR,
        }
    }
}

/// One control sequence located by [`read_control`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSeq {
    pub kind: ControlKind,
    /// Length in bytes, including the introducer.
    pub len: usize,
    /// Whether the sequence is well formed.
    pub valid: bool,
}

/// Bytes that start control content.
#[inline]
#[must_use]
pub const fn is_control_byte(b: u8) -> bool {
    b < 0x20 || b == 0x7f
}

#[inline]
fn byte_in(text: &[u8], i: usize, lo: u8, hi: u8) -> bool {
    matches!(text.get(i), Some(&b) if (lo..=hi).contains(&b))
}

/// Classify the control sequence starting at `at`.
///
/// Returns `None` when the byte at `at` is printable ASCII, part of a
/// multibyte character, or out of range.
#[must_use]
pub fn read_control(text: &[u8], at: usize, recovery: CsiRecovery) -> Option<ControlSeq> {
    let &lead = text.get(at)?;
    if !is_control_byte(lead) {
        return None;
    }
    if lead != ESC {
        let kind = if lead == b'\n' {
            ControlKind::Newline
        } else {
            ControlKind::C0
        };
        return Some(ControlSeq {
            kind,
            len: 1,
            valid: true,
        });
    }

    let mut i = at + 1;
    let (kind, valid) = if text.get(i) == Some(&b'[') {
        i += 1;
        while byte_in(text, i, 0x30, 0x3f) {
            i += 1;
        }
        let mut intermediate = false;
        while byte_in(text, i, 0x20, 0x2f) {
            intermediate = true;
            i += 1;
        }
        let valid = byte_in(text, i, 0x40, 0x7e);
        if !valid && recovery == CsiRecovery::ConsumeTrailing {
            while byte_in(text, i, 0x20, 0x3f) {
                i += 1;
            }
        }
        let sgr = !intermediate && text.get(i) == Some(&b'm');
        (
            if sgr {
                ControlKind::Sgr
            } else {
                ControlKind::Csi
            },
            valid,
        )
    } else {
        (ControlKind::Esc, byte_in(text, i, 0x40, 0x7e))
    };

    // Consume the final byte; a following ESC always starts a new sequence.
    if let Some(&b) = text.get(i)
        && b != ESC
        && (valid || recovery == CsiRecovery::ConsumeTrailing)
    {
        i += 1;
    }

    Some(ControlSeq {
        kind,
        len: i - at,
        valid,
    })
}

/// Result of a scan for the next run of enabled controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlMatch {
    /// Byte offset of the run, or the scan start when nothing matched.
    pub start: usize,
    /// Length of the run in bytes; zero when nothing matched.
    pub len: usize,
    /// Whether every control seen during the scan was well formed.
    pub valid: bool,
    /// Categories seen during the scan, enabled or not.
    pub observed: ControlCategories,
}

impl ControlMatch {
    /// Whether anything matched.
    #[inline]
    #[must_use]
    pub const fn is_match(&self) -> bool {
        self.len > 0
    }

    /// Offset one past the run.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Finds runs of enabled control sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlScanner {
    enabled: ControlCategories,
    recovery: CsiRecovery,
}

impl Default for ControlScanner {
    fn default() -> Self {
        Self::new(ControlCategories::all())
    }
}

impl ControlScanner {
    #[must_use]
    pub fn new(enabled: ControlCategories) -> Self {
        Self {
            enabled,
            recovery: CsiRecovery::default(),
        }
    }

    /// Set the invalid-CSI recovery policy.
    #[must_use]
    pub fn recovery(mut self, recovery: CsiRecovery) -> Self {
        self.recovery = recovery;
        self
    }

    /// Enabled categories.
    #[must_use]
    pub fn enabled(&self) -> ControlCategories {
        self.enabled
    }

    /// Find the next run of enabled controls at or after `from`.
    ///
    /// Adjacent enabled sequences merge into one run; the first byte that is
    /// not part of an enabled sequence ends it.
    #[must_use]
    pub fn find(&self, text: &[u8], from: usize) -> ControlMatch {
        let mut valid = true;
        let mut observed = ControlCategories::empty();
        let mut span: Option<(usize, usize)> = None;
        let mut i = from;

        while i < text.len() {
            let Some(seq) = read_control(text, i, self.recovery) else {
                if span.is_some() {
                    break;
                }
                i += 1;
                continue;
            };
            let category = seq.kind.category();
            observed |= category;
            valid &= seq.valid;
            let end = i + seq.len;
            if self.enabled.contains(category) {
                span = Some(match span {
                    Some((start, _)) => (start, end),
                    None => (i, end),
                });
            } else if span.is_some() {
                break;
            }
            i = end;
        }

        let (start, end) = span.unwrap_or((from, from));
        ControlMatch {
            start,
            len: end - start,
            valid,
            observed,
        }
    }

    /// Iterate over every run of enabled controls in `text`.
    #[must_use]
    pub fn matches<'a>(&self, text: &'a [u8]) -> ControlMatches<'a> {
        ControlMatches {
            scanner: *self,
            text,
            pos: 0,
        }
    }
}

/// Iterator over control runs, see [`ControlScanner::matches`].
#[derive(Debug, Clone)]
pub struct ControlMatches<'a> {
    scanner: ControlScanner,
    text: &'a [u8],
    pos: usize,
}

impl Iterator for ControlMatches<'_> {
    type Item = ControlMatch;

    fn next(&mut self) -> Option<Self::Item> {
        let found = self.scanner.find(self.text, self.pos);
        if !found.is_match() {
            self.pos = self.text.len();
            return None;
        }
        self.pos = found.end();
        Some(found)
    }
}

/// Find the first run of `enabled` controls in `text`.
#[must_use]
pub fn find_next_control(text: &[u8], enabled: ControlCategories) -> ControlMatch {
    ControlScanner::new(enabled).find(text, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &[u8]) -> Vec<(ControlKind, usize, bool)> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < text.len() {
            match read_control(text, i, CsiRecovery::ConsumeTrailing) {
                Some(seq) => {
                    out.push((seq.kind, seq.len, seq.valid));
                    i += seq.len;
                }
                None => i += 1,
            }
        }
        out
    }

    // ==========================================================================
    // read_control
    // ==========================================================================

    #[test]
    fn printable_and_multibyte_are_not_controls() {
        assert_eq!(read_control(b"a", 0, CsiRecovery::default()), None);
        assert_eq!(read_control("é".as_bytes(), 0, CsiRecovery::default()), None);
        assert_eq!(read_control(b"", 0, CsiRecovery::default()), None);
    }

    #[test]
    fn sgr_sequence() {
        assert_eq!(kinds(b"\x1b[31m"), vec![(ControlKind::Sgr, 5, true)]);
        assert_eq!(kinds(b"\x1b[m"), vec![(ControlKind::Sgr, 3, true)]);
        assert_eq!(kinds(b"\x1b[38;5;200m"), vec![(ControlKind::Sgr, 11, true)]);
    }

    #[test]
    fn csi_with_intermediate_is_not_sgr() {
        assert_eq!(kinds(b"\x1b[1 m"), vec![(ControlKind::Csi, 5, true)]);
    }

    #[test]
    fn other_csi() {
        assert_eq!(kinds(b"\x1b[2J"), vec![(ControlKind::Csi, 4, true)]);
        assert_eq!(kinds(b"\x1b[?25h"), vec![(ControlKind::Csi, 6, true)]);
    }

    #[test]
    fn two_byte_escape() {
        assert_eq!(kinds(b"\x1bM"), vec![(ControlKind::Esc, 2, true)]);
        // '7' is outside the final-byte range.
        assert_eq!(kinds(b"\x1b7"), vec![(ControlKind::Esc, 2, false)]);
    }

    #[test]
    fn lone_escape_at_end() {
        assert_eq!(kinds(b"\x1b"), vec![(ControlKind::Esc, 1, false)]);
    }

    #[test]
    fn escape_does_not_swallow_escape() {
        assert_eq!(
            kinds(b"\x1b\x1b[1m"),
            vec![(ControlKind::Esc, 1, false), (ControlKind::Sgr, 4, true)]
        );
    }

    #[test]
    fn c0_and_newline() {
        assert_eq!(
            kinds(b"a\tb\nc\x7f"),
            vec![
                (ControlKind::C0, 1, true),
                (ControlKind::Newline, 1, true),
                (ControlKind::C0, 1, true),
            ]
        );
    }

    #[test]
    fn invalid_csi_consumes_trailing_bytes() {
        // \x10 is not a final byte and not a parameter byte, so it becomes
        // the terminator.
        let seq = read_control(b"\x1b[12\x10x", 0, CsiRecovery::ConsumeTrailing).unwrap();
        assert_eq!(seq.kind, ControlKind::Csi);
        assert!(!seq.valid);
        assert_eq!(seq.len, 5);
    }

    #[test]
    fn invalid_csi_recovery_eats_parameters_after_intermediates() {
        // params "1", intermediate "!", then "23" which are parameter bytes
        // again, then \x01 as terminator.
        let seq = read_control(b"\x1b[1!23\x01", 0, CsiRecovery::ConsumeTrailing).unwrap();
        assert!(!seq.valid);
        assert_eq!(seq.len, 7);
    }

    #[test]
    fn strict_recovery_stops_at_offending_byte() {
        let seq = read_control(b"\x1b[1!23\x01", 0, CsiRecovery::Strict).unwrap();
        assert!(!seq.valid);
        assert_eq!(seq.len, 4);
    }

    #[test]
    fn truncated_csi() {
        let seq = read_control(b"\x1b[31", 0, CsiRecovery::ConsumeTrailing).unwrap();
        assert_eq!(seq.kind, ControlKind::Csi);
        assert!(!seq.valid);
        assert_eq!(seq.len, 4);
    }

    // ==========================================================================
    // ControlScanner
    // ==========================================================================

    #[test]
    fn sgr_matches_in_colored_text() {
        let text = b"\x1b[31mHELLO\x1b[0m";
        let found: Vec<_> = ControlScanner::new(ControlCategories::SGR)
            .matches(text)
            .collect();
        assert_eq!(found.len(), 2);
        assert_eq!((found[0].start, found[0].len), (0, 5));
        assert_eq!((found[1].start, found[1].len), (10, 4));
        assert!(found.iter().all(|m| m.valid));
    }

    #[test]
    fn sgr_not_found_when_only_csi_enabled() {
        let text = b"\x1b[31mHELLO\x1b[0m";
        let scanner = ControlScanner::new(ControlCategories::CSI);
        assert_eq!(scanner.matches(text).count(), 0);
        let first = scanner.find(text, 0);
        assert!(!first.is_match());
        assert_eq!(first.start, 0);
        // Excluded categories are still reported.
        assert!(first.observed.contains(ControlCategories::SGR));
        assert!(first.valid);
    }

    #[test]
    fn adjacent_matches_merge() {
        let text = b"ab\x1b[1m\x1b[2J\ncd";
        let found = find_next_control(text, ControlCategories::all());
        assert_eq!((found.start, found.len), (2, 9));
        assert_eq!(
            found.observed,
            ControlCategories::SGR | ControlCategories::CSI | ControlCategories::NEWLINE
        );
    }

    #[test]
    fn excluded_control_splits_runs() {
        let text = b"\x1b[1m\n\x1b[2m";
        let found: Vec<_> = ControlScanner::new(ControlCategories::SGR)
            .matches(text)
            .collect();
        assert_eq!(found.len(), 2);
        assert_eq!((found[0].start, found[0].len), (0, 4));
        assert_eq!((found[1].start, found[1].len), (5, 4));
    }

    #[test]
    fn invalid_sequence_reported() {
        let found = find_next_control(b"x\x1b7y", ControlCategories::ESC);
        assert!(found.is_match());
        assert!(!found.valid);
    }

    #[test]
    fn no_controls() {
        let found = find_next_control("plain 文字".as_bytes(), ControlCategories::all());
        assert!(!found.is_match());
        assert!(found.valid);
        assert!(found.observed.is_empty());
    }

    // ==========================================================================
    // Category names
    // ==========================================================================

    #[test]
    fn names_parse() {
        assert_eq!(
            ControlCategories::from_names(["sgr", "csi"]).unwrap(),
            ControlCategories::SGR | ControlCategories::CSI
        );
    }

    #[test]
    fn all_inverts_other_names() {
        assert_eq!(
            ControlCategories::from_names(["all"]).unwrap(),
            ControlCategories::all()
        );
        assert_eq!(
            ControlCategories::from_names(["all", "nl"]).unwrap(),
            ControlCategories::C0
                | ControlCategories::ESC
                | ControlCategories::CSI
                | ControlCategories::SGR
        );
    }

    #[test]
    fn unknown_name_rejected() {
        assert_eq!(
            ControlCategories::from_names(["bold"]),
            Err(ArgumentError::UnknownCategory("bold".into()))
        );
    }
}
