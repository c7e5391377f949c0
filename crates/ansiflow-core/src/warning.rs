//! Non-fatal diagnostics.
//!
//! Malformed input never aborts a call. The cursor raises [`WarningFlags`] on
//! its state while walking an element; the caller hands the final flags to
//! [`Diagnostics`], which filters them through the [`WarnPolicy`], logs what it
//! keeps, and returns the collected [`Warning`]s alongside the result.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Problems observed while walking one string.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WarningFlags: u8 {
        /// Bytes that do not decode as UTF-8.
        const MALFORMED_UTF8  = 1 << 0;
        /// A recognized control sequence without a valid terminator.
        const INVALID_CONTROL = 1 << 1;
        /// An SGR parameter that was not understood, or a colour mode outside
        /// the configured terminal capabilities.
        const UNSUPPORTED_SGR = 1 << 2;
    }
}

/// How many warnings a call records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WarnPolicy {
    /// Record nothing.
    Silent,
    /// Record the first warning of the call only.
    #[default]
    Once,
    /// Record every kind of warning raised by every element.
    Every,
}

/// Single warning category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    MalformedUtf8,
    InvalidControl,
    UnsupportedSgr,
}

impl WarningKind {
    const ALL: [(WarningFlags, WarningKind); 3] = [
        (WarningFlags::MALFORMED_UTF8, WarningKind::MalformedUtf8),
        (WarningFlags::INVALID_CONTROL, WarningKind::InvalidControl),
        (WarningFlags::UNSUPPORTED_SGR, WarningKind::UnsupportedSgr),
    ];

    /// Kinds set in `flags`, in a fixed order.
    pub fn from_flags(flags: WarningFlags) -> impl Iterator<Item = WarningKind> {
        Self::ALL
            .into_iter()
            .filter(move |(flag, _)| flags.contains(*flag))
            .map(|(_, kind)| kind)
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedUtf8 => write!(f, "malformed UTF-8"),
            Self::InvalidControl => write!(f, "invalid or incomplete control sequence"),
            Self::UnsupportedSgr => write!(f, "unsupported SGR parameter"),
        }
    }
}

/// Which input a warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningSource {
    /// Element of the input batch, by index.
    Element(usize),
    /// The continuation-line prefix.
    Prefix,
    /// The first-line prefix.
    Initial,
}

impl fmt::Display for WarningSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(idx) => write!(f, "element {idx}"),
            Self::Prefix => write!(f, "prefix"),
            Self::Initial => write!(f, "initial"),
        }
    }
}

/// One recorded warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Warning {
    pub source: WarningSource,
    pub kind: WarningKind,
    /// Byte offset of the first problem in the text as walked.
    ///
    /// For reflow that is the element after whitespace normalization and
    /// tab expansion, which can differ from the caller's string.
    pub byte: usize,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {} at byte {}", self.kind, self.source, self.byte)
    }
}

/// Warning collector for one call.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    policy: WarnPolicy,
    warnings: Vec<Warning>,
}

impl Diagnostics {
    #[must_use]
    pub fn new(policy: WarnPolicy) -> Self {
        Self {
            policy,
            warnings: Vec::new(),
        }
    }

    /// Whether walkers should bother raising flags at all.
    #[inline]
    #[must_use]
    pub fn enabled(&self) -> bool {
        match self.policy {
            WarnPolicy::Silent => false,
            WarnPolicy::Once => self.warnings.is_empty(),
            WarnPolicy::Every => true,
        }
    }

    /// Record the flags raised while walking `source`.
    pub fn record(&mut self, source: WarningSource, flags: WarningFlags, byte: usize) {
        if flags.is_empty() {
            return;
        }
        for kind in WarningKind::from_flags(flags) {
            if !self.enabled() {
                return;
            }
            let warning = Warning { source, kind, byte };
            tracing::warn!(%source, byte, "{kind}");
            self.warnings.push(warning);
        }
    }

    /// Warnings recorded so far.
    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Wrap a finished value together with the collected warnings.
    #[must_use]
    pub fn finish<T>(self, value: T) -> Outcome<T> {
        Outcome {
            value,
            warnings: self.warnings,
        }
    }
}

/// Result of a successful call plus its warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Outcome<T> {
    /// Drop the warnings.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Transform the value, keeping the warnings.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}
