//! Length limits and overflow-checked size arithmetic.
//!
//! Every size or width computed while expanding, padding or tagging text is
//! checked against a configurable maximum representable length. The limit is
//! threaded explicitly through each call so tests can shrink it without
//! touching shared state.

use crate::error::{ArgumentError, Error, Operation, Result};

/// Default maximum length of any produced string, in bytes.
pub const DEFAULT_MAX_LEN: usize = i32::MAX as usize;

/// Upper bound on lengths produced by a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Limits {
    max_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
        }
    }
}

impl Limits {
    /// Create limits with a custom maximum length.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::InvalidLimit`] if `max_len` is zero or too
    /// large to be represented as a signed width.
    pub fn new(max_len: usize) -> Result<Self> {
        if max_len == 0 || max_len >= isize::MAX as usize {
            return Err(ArgumentError::InvalidLimit { max_len }.into());
        }
        Ok(Self { max_len })
    }

    /// Maximum representable length.
    #[inline]
    #[must_use]
    pub const fn max_len(&self) -> usize {
        self.max_len
    }

    /// Largest scratch allocation a call may request.
    #[inline]
    #[must_use]
    pub const fn buffer_ceiling(&self) -> usize {
        self.max_len + 1
    }

    /// `a + b`, failing if the sum exceeds the limit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Overflow`] tagged with `operation`.
    #[inline]
    pub fn add(&self, a: usize, b: usize, operation: Operation) -> Result<usize> {
        a.checked_add(b)
            .filter(|sum| *sum <= self.max_len)
            .ok_or(Error::Overflow {
                operation,
                limit: self.max_len,
            })
    }

    /// `a * b`, failing if the product exceeds the limit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Overflow`] tagged with `operation`.
    #[inline]
    pub fn mul(&self, a: usize, b: usize, operation: Operation) -> Result<usize> {
        a.checked_mul(b)
            .filter(|product| *product <= self.max_len)
            .ok_or(Error::Overflow {
                operation,
                limit: self.max_len,
            })
    }

    /// Fail if `len` exceeds the limit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Overflow`] tagged with `operation`.
    #[inline]
    pub fn check(&self, len: usize, operation: Operation) -> Result<usize> {
        self.add(len, 0, operation)
    }

    /// Convert a checked length to a signed width.
    ///
    /// Lengths are capped below `isize::MAX` at construction, so any value
    /// that passed [`Limits::check`] converts losslessly.
    #[inline]
    #[must_use]
    pub fn signed(&self, len: usize) -> isize {
        isize::try_from(len.min(self.max_len)).unwrap_or(isize::MAX)
    }
}
