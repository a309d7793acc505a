//! Batched delivery: many complete lines per sink call.

use std::io;

use crate::buffer::LineBuffer;
use crate::config::{BatchConfig, OversizeLinePolicy};
use crate::error::{LineWriterError, LineWriterResult, WriterOperation};
use crate::sink::{ByteSource, LineSink};
use crate::trace::{trace_close, trace_drain, trace_flush, trace_grow, trace_split};
use crate::traits::LineWrite;

/// Writer that forwards as many complete lines as fit in its buffer in a
/// single sink call.
///
/// Bytes accumulate in a fixed-capacity buffer. The moment the buffer becomes
/// full, the longest prefix ending in a newline is handed to the sink and the
/// trailing partial line is moved to the front to be completed by later
/// input. Because flushing is tied to the buffer filling up, the resulting
/// sink calls depend only on the byte stream, not on how it was chunked.
///
/// # Long lines
///
/// A line that does not fit in the buffer cannot be held back forever. With
/// the default [`OversizeLinePolicy::Split`], a buffer full of a single
/// partial line is forwarded as-is, so the sink receives that line across two
/// or more calls. The bytes are unchanged; only the call boundary falls
/// inside the line. [`OversizeLinePolicy::Grow`] keeps such lines whole by
/// enlarging the buffer instead.
///
/// # Examples
///
/// ```
/// use linebatch::{BatchLineWriter, WriteSink};
///
/// let mut sink = WriteSink::new(Vec::new());
/// let mut writer = BatchLineWriter::new(&mut sink, 8)?;
///
/// // Nothing reaches the sink until the buffer fills.
/// writer.append(b"ab\ncd\n")?;
/// assert_eq!(writer.buffered(), b"ab\ncd\n");
///
/// // Filling the buffer forwards the complete lines and keeps "ef".
/// writer.append(b"ef")?;
/// assert_eq!(writer.buffered(), b"ef");
///
/// writer.close()?;
/// drop(writer);
/// assert_eq!(sink.get_ref().as_slice(), b"ab\ncd\nef");
/// # Ok::<(), linebatch::LineWriterError>(())
/// ```
#[derive(Debug)]
pub struct BatchLineWriter<S: LineSink> {
    sink: S,
    buffer: LineBuffer,
    config: BatchConfig,
    closed: bool,
}

impl<S: LineSink> BatchLineWriter<S> {
    /// Creates a writer with a buffer of `capacity` bytes.
    ///
    /// Fails with [`LineWriterError::InvalidConfiguration`] when `capacity`
    /// is zero.
    pub fn new(sink: S, capacity: usize) -> LineWriterResult<Self> {
        Self::with_config(sink, BatchConfig::new().with_capacity(capacity))
    }

    /// Creates a writer from a full [`BatchConfig`].
    pub fn with_config(sink: S, config: BatchConfig) -> LineWriterResult<Self> {
        config.validate()?;
        Ok(Self {
            sink,
            buffer: LineBuffer::new(config.capacity()),
            config,
            closed: false,
        })
    }

    /// Copies `input` into the buffer, forwarding complete lines whenever the
    /// buffer fills.
    ///
    /// Returns `input.len()` on success. On a sink failure the error records
    /// how many input bytes were taken into the buffer; those bytes are either
    /// at the sink or still buffered.
    pub fn append(&mut self, input: &[u8]) -> LineWriterResult<usize> {
        self.ensure_open(WriterOperation::Append)?;

        if self.buffer.is_full() {
            self.make_room(WriterOperation::Append, 0)?;
        }

        let mut consumed = 0;
        while consumed < input.len() {
            consumed += self.buffer.push(&input[consumed..]);
            if self.buffer.is_full() {
                self.make_room(WriterOperation::Append, consumed as u64)?;
            }
        }

        Ok(input.len())
    }

    /// Reads from `source` directly into the free tail of the buffer until
    /// end-of-stream.
    ///
    /// This skips the staging buffer a generic copy loop would use. The
    /// flushing rules are the same as for [`append`](Self::append), so the
    /// sink sees the same calls either way. Interrupted reads are retried;
    /// any other source error ends the transfer with
    /// [`LineWriterError::SourceReadFailed`].
    pub fn drain_from<R>(&mut self, source: &mut R) -> LineWriterResult<u64>
    where
        R: ByteSource + ?Sized,
    {
        self.ensure_open(WriterOperation::Drain)?;

        if self.buffer.is_full() {
            self.make_room(WriterOperation::Drain, 0)?;
        }

        let mut transferred = 0u64;
        loop {
            let spare = self.buffer.spare_mut();
            let available = spare.len();
            let read = match source.fill(spare) {
                Ok(0) => break,
                Ok(read) if read > available => {
                    return Err(LineWriterError::SourceReadFailed {
                        transferred,
                        source: io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("source reported {read} bytes for a {available}-byte block"),
                        ),
                    });
                }
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    return Err(LineWriterError::SourceReadFailed {
                        transferred,
                        source: err,
                    });
                }
            };

            self.buffer.commit(read);
            transferred += read as u64;

            if self.buffer.is_full() {
                self.make_room(WriterOperation::Drain, transferred)?;
            }
        }

        trace_drain("batch", transferred);
        Ok(transferred)
    }

    /// Forwards the complete lines currently buffered without waiting for the
    /// buffer to fill. A trailing partial line stays buffered.
    pub fn flush_lines(&mut self) -> LineWriterResult<()> {
        self.ensure_open(WriterOperation::Flush)?;
        if let Some(len) = self.buffer.complete_prefix() {
            self.forward(len, WriterOperation::Flush, 0)?;
            trace_flush(len, self.buffer.len());
        }
        Ok(())
    }

    /// Forwards everything still buffered, newline or not, then closes the
    /// sink.
    ///
    /// The sink is closed even when the final forward fails; the first error
    /// is returned. A second call fails with
    /// [`LineWriterError::AlreadyClosed`].
    pub fn close(&mut self) -> LineWriterResult<()> {
        self.ensure_open(WriterOperation::Close)?;
        self.closed = true;

        let remainder = self.buffer.len();
        let flushed = if self.buffer.is_empty() {
            Ok(())
        } else {
            self.forward(remainder, WriterOperation::Close, 0)
        };
        let closed = self
            .sink
            .close()
            .map_err(|source| LineWriterError::SinkCloseFailed { source });

        trace_close("batch", remainder, flushed.is_err() || closed.is_err());
        flushed.and(closed)
    }

    /// Bytes accepted but not yet forwarded to the sink.
    #[must_use]
    pub fn buffered(&self) -> &[u8] {
        self.buffer.pending()
    }

    /// Current buffer capacity.
    ///
    /// Starts at the configured capacity and only changes under
    /// [`OversizeLinePolicy::Grow`].
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Configuration the writer was created with.
    #[must_use]
    pub const fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Reports whether [`close`](Self::close) has been called.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns a shared reference to the sink.
    #[must_use]
    pub const fn get_ref(&self) -> &S {
        &self.sink
    }

    /// Returns a mutable reference to the sink.
    ///
    /// Writing to the sink directly bypasses the buffer and can break the
    /// line alignment of later calls.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn ensure_open(&self, operation: WriterOperation) -> LineWriterResult<()> {
        if self.closed {
            Err(LineWriterError::closed(operation))
        } else {
            Ok(())
        }
    }

    /// Frees buffer space once the buffer is full.
    fn make_room(&mut self, operation: WriterOperation, processed: u64) -> LineWriterResult<()> {
        if let Some(len) = self.buffer.complete_prefix() {
            self.forward(len, operation, processed)?;
            trace_flush(len, self.buffer.len());
            return Ok(());
        }

        let capacity = self.buffer.capacity();
        if let OversizeLinePolicy::Grow { max_capacity } = self.config.oversize_policy() {
            let limit = max_capacity.map_or(usize::MAX, |limit| limit.get());
            if capacity < limit {
                let grown = capacity.saturating_mul(2).min(limit);
                trace_grow(capacity, grown);
                self.buffer.grow_to(grown);
                return Ok(());
            }
        }

        trace_split(capacity);
        self.forward(self.buffer.len(), operation, processed)
    }

    fn forward(
        &mut self,
        len: usize,
        operation: WriterOperation,
        processed: u64,
    ) -> LineWriterResult<()> {
        self.buffer
            .forward(&mut self.sink, len)
            .map_err(|err| LineWriterError::sink_write(operation, processed, err))
    }
}

impl<S: LineSink> LineWrite for BatchLineWriter<S> {
    fn append(&mut self, bytes: &[u8]) -> LineWriterResult<usize> {
        Self::append(self, bytes)
    }

    fn drain_from(&mut self, source: &mut dyn ByteSource) -> LineWriterResult<u64> {
        Self::drain_from(self, source)
    }

    fn close(&mut self) -> LineWriterResult<()> {
        Self::close(self)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<S: LineSink> io::Write for BatchLineWriter<S> {
    /// Reports the bytes taken before a sink failure as written; they stay
    /// pending and the failure surfaces again on the next call. An error is
    /// returned only when nothing from `buf` was taken.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.append(buf) {
            Ok(written) => Ok(written),
            Err(LineWriterError::SinkWriteFailed { processed, .. }) if processed > 0 => {
                Ok(processed as usize)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Forwards buffered complete lines; see
    /// [`flush_lines`](BatchLineWriter::flush_lines).
    fn flush(&mut self) -> io::Result<()> {
        Ok(self.flush_lines()?)
    }
}

impl<S: LineSink> Drop for BatchLineWriter<S> {
    fn drop(&mut self) {
        if !self.closed {
            // Errors cannot be reported from drop; call `close` to observe them.
            let _ = self.close();
        }
    }
}

#[cfg(test)]
mod tests;
