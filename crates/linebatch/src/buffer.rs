//! Fixed-capacity staging buffer behind the batch writer.

use std::io;

use crate::error::{invalid_write, short_write};
use crate::scan::last_newline;
use crate::sink::LineSink;

/// Fixed-capacity byte region with a fill mark.
///
/// Bytes in `[0, fill)` are pending and have not reached the sink. Forwarding
/// a prefix shifts the remaining suffix to the front so the free space is
/// always a single contiguous tail that a source can read into directly.
#[derive(Debug)]
pub(crate) struct LineBuffer {
    storage: Box<[u8]>,
    fill: usize,
}

impl LineBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            storage: vec![0u8; capacity].into_boxed_slice(),
            fill: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.fill
    }

    #[inline]
    pub(crate) const fn is_empty(&self) -> bool {
        self.fill == 0
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.fill == self.storage.len()
    }

    #[inline]
    pub(crate) fn pending(&self) -> &[u8] {
        &self.storage[..self.fill]
    }

    /// Free tail of the buffer, for sources to fill in place.
    #[inline]
    pub(crate) fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.fill..]
    }

    /// Marks `count` bytes of the spare tail as pending.
    #[inline]
    pub(crate) fn commit(&mut self, count: usize) {
        debug_assert!(count <= self.storage.len() - self.fill);
        self.fill += count;
    }

    /// Copies as much of `input` as fits and returns the number of bytes taken.
    pub(crate) fn push(&mut self, input: &[u8]) -> usize {
        let spare = self.spare_mut();
        let count = spare.len().min(input.len());
        spare[..count].copy_from_slice(&input[..count]);
        self.commit(count);
        count
    }

    /// Length of the longest pending prefix ending in a newline.
    #[inline]
    pub(crate) fn complete_prefix(&self) -> Option<usize> {
        last_newline(self.pending())
    }

    /// Drops the first `count` pending bytes and moves the rest to the front.
    pub(crate) fn consume(&mut self, count: usize) {
        debug_assert!(count <= self.fill);
        self.storage.copy_within(count..self.fill, 0);
        self.fill -= count;
    }

    /// Enlarges the buffer to `capacity` bytes, keeping pending data.
    pub(crate) fn grow_to(&mut self, capacity: usize) {
        if capacity <= self.storage.len() {
            return;
        }
        let mut storage = vec![0u8; capacity].into_boxed_slice();
        storage[..self.fill].copy_from_slice(&self.storage[..self.fill]);
        self.storage = storage;
    }

    /// Hands the first `len` pending bytes to `sink` in a single call.
    ///
    /// Whatever the sink accepted is removed from the buffer, also on a short
    /// write, so a failed call leaves exactly the unforwarded bytes pending.
    pub(crate) fn forward<S>(&mut self, sink: &mut S, len: usize) -> io::Result<()>
    where
        S: LineSink + ?Sized,
    {
        debug_assert!(len <= self.fill);
        let accepted = sink.accept(&self.storage[..len])?;

        if accepted > len {
            return Err(invalid_write(accepted, len));
        }

        self.consume(accepted);

        if accepted < len {
            return Err(short_write(accepted, len));
        }

        Ok(())
    }
}
