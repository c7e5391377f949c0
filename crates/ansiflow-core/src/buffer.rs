//! Reusable scratch buffer.
//!
//! Writers size their full output up front, call [`ScratchBuffer::reserve`],
//! and then write into the returned vector without triggering a reallocation.
//! Growth never preserves previous contents.

use crate::error::{Error, Result};
use crate::limits::Limits;

/// Smallest first allocation.
pub const MIN_CAPACITY: usize = 128;

/// Growable scratch memory shared by the elements of one batch call.
///
/// A buffer must not be shared between concurrent calls; each call owns one.
#[derive(Debug)]
pub struct ScratchBuffer {
    buf: Vec<u8>,
    capacity: usize,
    limits: Limits,
}

impl ScratchBuffer {
    /// Create an unallocated buffer.
    #[must_use]
    pub fn new(limits: Limits) -> Self {
        Self {
            buf: Vec::new(),
            capacity: 0,
            limits,
        }
    }

    /// Current logical capacity in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Make room for at least `size` bytes.
    ///
    /// Grows to `max(2 * capacity, size)`, with a floor of
    /// [`MIN_CAPACITY`] on the first allocation, capped at
    /// `max_len + 1`. Existing contents are discarded when growing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if `size` exceeds the ceiling; callers
    /// check lengths before asking, so this indicates a logic defect.
    pub fn ensure_capacity(&mut self, size: usize) -> Result<()> {
        if size <= self.capacity {
            return Ok(());
        }
        let ceiling = self.limits.buffer_ceiling();
        if size > ceiling {
            return Err(Error::Internal(
                "requested scratch buffer larger than max length + 1",
            ));
        }
        let grown = if self.capacity == 0 {
            if self.limits.max_len() > MIN_CAPACITY {
                size.max(MIN_CAPACITY)
            } else {
                size
            }
        } else {
            self.capacity.saturating_mul(2).min(ceiling).max(size)
        };
        self.buf = Vec::with_capacity(grown);
        self.capacity = grown;
        Ok(())
    }

    /// Prepare to write exactly `size` bytes.
    ///
    /// The returned vector is empty and can hold `size` bytes without
    /// reallocating.
    ///
    /// # Errors
    ///
    /// See [`ScratchBuffer::ensure_capacity`].
    pub fn reserve(&mut self, size: usize) -> Result<&mut Vec<u8>> {
        self.ensure_capacity(size)?;
        self.buf.clear();
        Ok(&mut self.buf)
    }

    /// Bytes written since the last [`ScratchBuffer::reserve`].
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_allocation_has_floor() {
        let mut buf = ScratchBuffer::new(Limits::default());
        assert_eq!(buf.capacity(), 0);
        buf.ensure_capacity(5).unwrap();
        assert_eq!(buf.capacity(), 128);
    }

    #[test]
    fn first_allocation_large_request() {
        let mut buf = ScratchBuffer::new(Limits::default());
        buf.ensure_capacity(1000).unwrap();
        assert_eq!(buf.capacity(), 1000);
    }

    #[test]
    fn grows_by_doubling() {
        let mut buf = ScratchBuffer::new(Limits::default());
        buf.ensure_capacity(10).unwrap();
        buf.ensure_capacity(129).unwrap();
        assert_eq!(buf.capacity(), 256);
    }

    #[test]
    fn grows_to_request_when_larger_than_double() {
        let mut buf = ScratchBuffer::new(Limits::default());
        buf.ensure_capacity(10).unwrap();
        buf.ensure_capacity(1000).unwrap();
        assert_eq!(buf.capacity(), 1000);
    }

    #[test]
    fn never_shrinks() {
        let mut buf = ScratchBuffer::new(Limits::default());
        buf.ensure_capacity(500).unwrap();
        buf.ensure_capacity(3).unwrap();
        assert_eq!(buf.capacity(), 500);
    }

    #[test]
    fn small_limit_skips_floor() {
        let mut buf = ScratchBuffer::new(Limits::new(20).unwrap());
        buf.ensure_capacity(5).unwrap();
        assert_eq!(buf.capacity(), 5);
    }

    #[test]
    fn doubling_capped_at_ceiling() {
        let mut buf = ScratchBuffer::new(Limits::new(20).unwrap());
        buf.ensure_capacity(15).unwrap();
        buf.ensure_capacity(16).unwrap();
        assert_eq!(buf.capacity(), 21);
    }

    #[test]
    fn ceiling_breach_is_internal_error() {
        let mut buf = ScratchBuffer::new(Limits::new(20).unwrap());
        assert!(matches!(buf.ensure_capacity(22), Err(Error::Internal(_))));
        assert!(buf.ensure_capacity(21).is_ok());
    }

    #[test]
    fn reserve_clears_previous_contents() {
        let mut buf = ScratchBuffer::new(Limits::default());
        buf.reserve(3).unwrap().extend_from_slice(b"abc");
        assert_eq!(buf.as_bytes(), b"abc");
        let out = buf.reserve(2).unwrap();
        assert!(out.is_empty());
        assert!(out.capacity() >= 2);
    }
}
