//! Capability traits for the destinations and origins the writers talk to.
//!
//! The writers never depend on a concrete I/O type. A [`LineSink`] only has to
//! accept a block of bytes and be closable once; a [`ByteSource`] only has to
//! fill a block. Any [`io::Write`] becomes a sink through [`WriteSink`], and
//! every [`io::Read`] is already a source.

use std::io::{self, Read, Write};

/// Destination for newline-aligned blocks.
///
/// # Contract
///
/// - [`accept`](Self::accept) returns the number of bytes taken from the front
///   of `block`. Returning fewer than `block.len()` is treated by the writers
///   as a failed write.
/// - [`close`](Self::close) is invoked exactly once by the writer that owns the
///   sink binding. Behaviour of `accept` after `close` is up to the sink.
pub trait LineSink {
    /// Accepts a contiguous block of bytes.
    fn accept(&mut self, block: &[u8]) -> io::Result<usize>;

    /// Releases the sink.
    fn close(&mut self) -> io::Result<()>;
}

impl<S: LineSink + ?Sized> LineSink for &mut S {
    #[inline]
    fn accept(&mut self, block: &[u8]) -> io::Result<usize> {
        (**self).accept(block)
    }

    #[inline]
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<S: LineSink + ?Sized> LineSink for Box<S> {
    #[inline]
    fn accept(&mut self, block: &[u8]) -> io::Result<usize> {
        (**self).accept(block)
    }

    #[inline]
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Origin of bytes for the pull-style transfer paths.
///
/// `fill` writes into the front of `block` and returns how many bytes it
/// produced. `Ok(0)` for a non-empty block signals end-of-stream. Errors of
/// kind [`io::ErrorKind::Interrupted`] are retried by the writers.
pub trait ByteSource {
    /// Fills the front of `block` with the next bytes of the stream.
    fn fill(&mut self, block: &mut [u8]) -> io::Result<usize>;
}

impl<R: Read + ?Sized> ByteSource for R {
    #[inline]
    fn fill(&mut self, block: &mut [u8]) -> io::Result<usize> {
        self.read(block)
    }
}

/// Adapts an [`io::Write`] implementor into a [`LineSink`].
///
/// Each accepted block is passed to a single [`Write::write`] call, so the
/// wrapped writer observes exactly the block boundaries chosen by the line
/// writer. Closing flushes the writer; the writer itself is released when the
/// adapter is dropped or unwrapped with [`into_inner`](Self::into_inner).
#[derive(Debug, Default)]
pub struct WriteSink<W> {
    writer: W,
    closed: bool,
}

impl<W> WriteSink<W> {
    /// Wraps `writer`.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            closed: false,
        }
    }

    /// Returns a shared reference to the wrapped writer.
    #[must_use]
    pub const fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Returns a mutable reference to the wrapped writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Reports whether [`LineSink::close`] has been called.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Consumes the adapter and returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> LineSink for WriteSink<W> {
    fn accept(&mut self, block: &[u8]) -> io::Result<usize> {
        self.writer.write(block)
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        self.writer.flush()
    }
}
