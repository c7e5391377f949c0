//! Error types shared by the ansiflow crates.

use std::fmt;

/// Result alias used throughout ansiflow.
pub type Result<T> = std::result::Result<T, Error>;

/// Operation that produced an oversized length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// An input element is already longer than the limit.
    Input,
    /// Expanding tabs into spaces.
    TabExpansion,
    /// Accumulating cumulative tab stops.
    TabStop,
    /// Right-padding a line to the target width.
    Padding,
    /// Adding prefix/initial and indent/exdent.
    Prefix,
    /// Adding leading and trailing SGR sequences to a line.
    StyleTagging,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "reading input"),
            Self::TabExpansion => write!(f, "converting tabs to spaces"),
            Self::TabStop => write!(f, "computing tab width"),
            Self::Padding => write!(f, "padding"),
            Self::Prefix => write!(f, "adding prefix/initial/indent/exdent"),
            Self::StyleTagging => write!(f, "adding leading and trailing SGR sequences"),
        }
    }
}

/// Invalid call arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// The tab-stop table is empty.
    EmptyTabStops,
    /// A tab stop is not positive.
    ZeroTabStop { index: usize },
    /// The pad character is not a single printable ASCII character.
    InvalidPad(char),
    /// Wrap width must be positive when wrapping always.
    ZeroWidth,
    /// Prefix/initial plus indent/exdent leaves no room under wrap-always.
    InfeasibleWidth { width: usize, prefix_width: usize },
    /// The configured length limit is unusable.
    InvalidLimit { max_len: usize },
    /// Unknown control category name.
    UnknownCategory(String),
    /// Unknown terminal capability name.
    UnknownCapability(String),
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTabStops => write!(f, "tab stops must contain at least one value"),
            Self::ZeroTabStop { index } => {
                write!(f, "tab stop at index {index} must be positive")
            }
            Self::InvalidPad(ch) => write!(
                f,
                "pad must be a single printable ASCII character, got {ch:?}"
            ),
            Self::ZeroWidth => write!(f, "width must be positive when wrapping always"),
            Self::InfeasibleWidth {
                width,
                prefix_width,
            } => write!(
                f,
                "prefix/initial plus indent/exdent width {prefix_width} must be less than width {width} when wrapping always"
            ),
            Self::InvalidLimit { max_len } => write!(f, "invalid length limit {max_len}"),
            Self::UnknownCategory(name) => write!(f, "unknown control category {name:?}"),
            Self::UnknownCapability(name) => write!(f, "unknown terminal capability {name:?}"),
        }
    }
}

impl std::error::Error for ArgumentError {}

/// Errors that abort a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bad arguments, detected before any element is processed.
    InvalidArgument(ArgumentError),
    /// A computed length would exceed the configured limit.
    Overflow { operation: Operation, limit: usize },
    /// Wrap-always cannot place a character wider than the available width.
    WidthTooNarrow { width: usize },
    /// The host requested cancellation.
    Cancelled { processed: usize },
    /// An internal invariant was violated.
    Internal(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(err) => write!(f, "invalid argument: {err}"),
            Self::Overflow { operation, limit } => write!(
                f,
                "attempting to create string longer than {limit} bytes while {operation}"
            ),
            Self::WidthTooNarrow { width } => write!(
                f,
                "cannot wrap to width {width}, narrower than character width; disable wrap-always"
            ),
            Self::Cancelled { processed } => {
                write!(f, "cancelled after {processed} elements")
            }
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidArgument(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ArgumentError> for Error {
    fn from(err: ArgumentError) -> Self {
        Self::InvalidArgument(err)
    }
}
