#![forbid(unsafe_code)]

//! Control-sequence aware text primitives.
//!
//! `ansiflow-core` knows how to find terminal control content inside byte
//! strings and how to walk such strings one visual unit at a time while
//! tracking the byte offset, the display column and the active SGR style.
//!
//! # Primary responsibilities
//!
//! - **Scanner**: classifies SGR, other CSI, two-byte escapes, C0 and newline.
//! - **Style**: SGR attribute set with interpretation and minimal re-encoding.
//! - **Cursor**: `Copy` state snapshots advanced over codepoints and controls.
//! - **Limits**: overflow-checked size arithmetic against a configurable cap.
//! - **Buffer**: reusable scratch memory sized before each write.
//! - **Diagnostics**: non-fatal warnings collected under a policy.
//!
//! # Design principles
//!
//! - **No I/O**: everything operates on caller-provided byte slices.
//! - **No global state**: length limits travel with each call.
//! - **`#![forbid(unsafe_code)]`**: safety enforced at compile time.

pub mod buffer;
pub mod cursor;
pub mod error;
pub mod limits;
pub mod scan;
pub mod style;
pub mod warning;

pub use buffer::ScratchBuffer;
pub use cursor::{CursorConfig, CursorState, TextCursor};
pub use error::{ArgumentError, Error, Operation, Result};
pub use limits::{DEFAULT_MAX_LEN, Limits};
pub use scan::{
    ControlCategories, ControlKind, ControlMatch, ControlMatches, ControlScanner, ControlSeq,
    CsiRecovery, find_next_control, is_control_byte, read_control,
};
pub use style::{Color, SGR_RESET, SgrFlags, Style, TermCaps};
pub use warning::{
    Diagnostics, Outcome, WarnPolicy, Warning, WarningFlags, WarningKind, WarningSource,
};
