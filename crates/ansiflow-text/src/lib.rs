#![forbid(unsafe_code)]

//! ANSI-aware text processing for terminal output.
//!
//! This crate works on byte strings that may carry terminal control
//! sequences, treating those sequences as zero width:
//! - [`reflow`] - word wrapping that re-emits SGR style on every line
//! - [`expand_tabs`] - tab to space conversion against a tab-stop table
//! - [`strip_controls`] - removal of selected control categories
//! - [`display_width`] / [`has_controls`] - measurement and detection
//!
//! Batch calls return an [`Outcome`] carrying the value plus the warnings
//! collected under the configured [`WarnPolicy`].
//!
//! # Example
//! ```
//! use ansiflow_text::{ReflowOptions, Reflowed, TextOptions, reflow};
//!
//! let out = reflow(
//!     &["\x1b[31mredredred text\x1b[0m"],
//!     &ReflowOptions::new(10),
//!     &TextOptions::new(),
//! )
//! .unwrap();
//! let Reflowed::Lines(lines) = out.value else { unreachable!() };
//! assert_eq!(lines[0][0], b"\x1b[31mredredred\x1b[0m");
//! assert_eq!(lines[0][1], b"\x1b[31mtext\x1b[0m");
//! ```

pub mod normalize;
pub mod options;
pub mod prefix;
pub mod strip;
pub mod tabs;
pub mod wrap;

pub use ansiflow_core::{
    ArgumentError, ControlCategories, CsiRecovery, Error, Limits, Operation, Outcome, Result,
    TermCaps, WarnPolicy, Warning, WarningKind, WarningSource, find_next_control,
};
pub use normalize::normalize_whitespace;
pub use options::{CANCEL_CHECK_INTERVAL, CancelToken, TextOptions};
pub use prefix::{LinePrefixes, PrefixSpec};
pub use strip::{display_width, has_controls, strip_controls};
pub use tabs::{TabStops, expand_tabs};
pub use wrap::{ReflowOptions, Reflowed, reflow, wrap_str};
