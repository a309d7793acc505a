//! The write contract shared by both delivery strategies.

use crate::error::LineWriterResult;
use crate::sink::ByteSource;

/// Newline-aligned writer bound to a [`LineSink`](crate::LineSink).
///
/// Implemented by [`BatchLineWriter`](crate::BatchLineWriter) and
/// [`PerLineWriter`](crate::PerLineWriter). The trait is object safe, so the
/// delivery strategy can be picked at runtime:
///
/// ```
/// use linebatch::{BatchLineWriter, LineWrite, PerLineWriter, WriteSink};
///
/// fn writer(one_call_per_line: bool) -> Box<dyn LineWrite> {
///     let sink = WriteSink::new(std::io::sink());
///     if one_call_per_line {
///         Box::new(PerLineWriter::new(sink))
///     } else {
///         Box::new(BatchLineWriter::new(sink, 4096).expect("non-zero capacity"))
///     }
/// }
///
/// let mut output = writer(true);
/// output.append(b"first\nsecond\n")?;
/// output.drain_from(&mut &b"third\n"[..])?;
/// output.close()?;
/// # Ok::<(), linebatch::LineWriterError>(())
/// ```
pub trait LineWrite {
    /// Pushes `bytes` into the writer and returns how many were consumed.
    ///
    /// On success the whole input is consumed.
    fn append(&mut self, bytes: &[u8]) -> LineWriterResult<usize>;

    /// Pulls from `source` until end-of-stream and returns the byte count.
    fn drain_from(&mut self, source: &mut dyn ByteSource) -> LineWriterResult<u64>;

    /// Flushes whatever is pending and closes the sink.
    ///
    /// Fails with [`LineWriterError::AlreadyClosed`](crate::LineWriterError::AlreadyClosed)
    /// when called a second time.
    fn close(&mut self) -> LineWriterResult<()>;

    /// Reports whether [`close`](Self::close) has been called.
    fn is_closed(&self) -> bool;
}
