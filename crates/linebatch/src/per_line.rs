//! Per-line delivery: one sink call for every newline-terminated line.

use std::io;
use std::mem;

use crate::config::DEFAULT_TRANSFER_SIZE;
use crate::error::{LineWriterError, LineWriterResult, WriterOperation, invalid_write, short_write};
use crate::scan::{LineSegments, Segment, last_newline};
use crate::sink::{ByteSource, LineSink};
use crate::trace::{trace_close, trace_drain};
use crate::traits::LineWrite;

/// Writer that issues exactly one sink call per line.
///
/// Lines contained entirely in one input chunk are forwarded straight from
/// the caller's slice. A line that spans chunks is assembled in a carry-over
/// buffer and forwarded once its newline arrives. Until [`close`](Self::close),
/// the number of sink calls equals the number of newlines written.
///
/// Compared with [`BatchLineWriter`](crate::BatchLineWriter) this trades
/// throughput for a one-to-one mapping between lines and sink calls, which
/// suits sinks that treat each call as a record (datagrams, log records).
///
/// # Examples
///
/// ```
/// use linebatch::{PerLineWriter, WriteSink};
///
/// let mut sink = WriteSink::new(Vec::new());
/// let mut writer = PerLineWriter::new(&mut sink);
/// writer.append(b"first\nsec")?;
/// assert_eq!(writer.pending(), b"sec");
/// writer.append(b"ond\n")?;
/// writer.close()?;
/// drop(writer);
///
/// assert_eq!(sink.get_ref().as_slice(), b"first\nsecond\n");
/// # Ok::<(), linebatch::LineWriterError>(())
/// ```
#[derive(Debug)]
pub struct PerLineWriter<S: LineSink> {
    sink: S,
    /// Undelivered bytes: `carry[..complete]` holds whole lines left over
    /// from a failed delivery, the rest is a partial line.
    carry: Vec<u8>,
    complete: usize,
    transfer: Vec<u8>,
    transfer_size: usize,
    closed: bool,
}

impl<S: LineSink> PerLineWriter<S> {
    /// Creates a writer whose pull path reads [`DEFAULT_TRANSFER_SIZE`] bytes
    /// at a time.
    #[must_use]
    pub const fn new(sink: S) -> Self {
        Self {
            sink,
            carry: Vec::new(),
            complete: 0,
            transfer: Vec::new(),
            transfer_size: DEFAULT_TRANSFER_SIZE,
            closed: false,
        }
    }

    /// Creates a writer whose pull path reads at most `transfer_size` bytes
    /// at a time.
    ///
    /// Fails with [`LineWriterError::InvalidConfiguration`] when
    /// `transfer_size` is zero.
    pub fn with_transfer_size(sink: S, transfer_size: usize) -> LineWriterResult<Self> {
        if transfer_size == 0 {
            return Err(LineWriterError::invalid("transfer size must be at least 1"));
        }
        let mut writer = Self::new(sink);
        writer.transfer_size = transfer_size;
        Ok(writer)
    }

    /// Forwards every complete line in the carry-over plus `input` and keeps
    /// the trailing partial line.
    ///
    /// Returns `input.len()` on success. When a line cannot be delivered, the
    /// bytes the sink did not take stay pending and are sent again, as one
    /// call, before anything else on the next operation. The error's
    /// `processed` count includes that line; input after it was not taken.
    pub fn append(&mut self, input: &[u8]) -> LineWriterResult<usize> {
        self.ensure_open(WriterOperation::Append)?;
        self.route(input, WriterOperation::Append, 0, false)?;
        Ok(input.len())
    }

    /// Reads from `source` until end-of-stream, splitting each chunk into
    /// lines exactly as [`append`](Self::append) does.
    ///
    /// Every line still costs one sink call, so this path mainly saves the
    /// caller a staging buffer. Interrupted reads are retried. If the sink
    /// fails, every byte already read stays pending and the error's
    /// `processed` count covers all of them.
    pub fn drain_from<R>(&mut self, source: &mut R) -> LineWriterResult<u64>
    where
        R: ByteSource + ?Sized,
    {
        self.ensure_open(WriterOperation::Drain)?;

        let mut transfer = mem::take(&mut self.transfer);
        if transfer.is_empty() {
            transfer = vec![0u8; self.transfer_size];
        }
        let result = self.drain_with(source, &mut transfer);
        self.transfer = transfer;

        if let Ok(transferred) = result {
            trace_drain("per-line", transferred);
        }
        result
    }

    /// Forwards the carry-over as one final call, whether or not it ends in a
    /// newline, then closes the sink.
    ///
    /// The sink is closed even when that last call fails; the first error is
    /// returned. A second call fails with [`LineWriterError::AlreadyClosed`].
    pub fn close(&mut self) -> LineWriterResult<()> {
        self.ensure_open(WriterOperation::Close)?;
        self.closed = true;

        let remainder = self.carry.len();
        let flushed = self
            .send_pending()
            .map_err(|err| LineWriterError::sink_write(WriterOperation::Close, 0, err))
            .and_then(|()| self.send_tail());
        let closed = self
            .sink
            .close()
            .map_err(|source| LineWriterError::SinkCloseFailed { source });

        trace_close("per-line", remainder, flushed.is_err() || closed.is_err());
        flushed.and(closed)
    }

    /// Bytes received but not yet forwarded: a partial line, or the rest of
    /// a line whose delivery failed.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.carry
    }

    /// Maximum bytes requested from a source per read.
    #[must_use]
    pub const fn transfer_size(&self) -> usize {
        self.transfer_size
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

    fn drain_with<R>(&mut self, source: &mut R, transfer: &mut [u8]) -> LineWriterResult<u64>
    where
        R: ByteSource + ?Sized,
    {
        let mut transferred = 0u64;
        loop {
            let read = match source.fill(transfer) {
                Ok(0) => return Ok(transferred),
                Ok(read) if read > transfer.len() => {
                    return Err(LineWriterError::SourceReadFailed {
                        transferred,
                        source: io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!(
                                "source reported {read} bytes for a {}-byte block",
                                transfer.len()
                            ),
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

            self.route(&transfer[..read], WriterOperation::Drain, transferred, true)?;
            transferred += read as u64;
        }
    }

    /// Splits `input` into lines and forwards the complete ones.
    ///
    /// `processed` is the progress already made by the calling operation and
    /// is added to the count reported on failure. With `retain_unrouted`, input
    /// after a failed line is moved into the carry-over instead of being left
    /// to the caller.
    fn route(
        &mut self,
        input: &[u8],
        operation: WriterOperation,
        processed: u64,
        retain_unrouted: bool,
    ) -> LineWriterResult<()> {
        let mut routed = 0;
        let outcome = self
            .send_pending()
            .and_then(|()| self.route_lines(input, &mut routed));
        if let Err(err) = outcome {
            if retain_unrouted {
                self.carry.extend_from_slice(&input[routed..]);
                routed = input.len();
            }
            self.complete = last_newline(&self.carry).unwrap_or(0);
            return Err(LineWriterError::sink_write(
                operation,
                processed + routed as u64,
                err,
            ));
        }
        Ok(())
    }

    /// Delivers the lines of `input`, advancing `routed` past each segment
    /// as it is taken.
    fn route_lines(&mut self, input: &[u8], routed: &mut usize) -> io::Result<()> {
        for segment in LineSegments::new(input) {
            *routed += segment.as_bytes().len();
            match segment {
                Segment::Line(line) if self.carry.is_empty() => {
                    if let Err((accepted, err)) = deliver(&mut self.sink, line) {
                        self.carry.extend_from_slice(&line[accepted..]);
                        return Err(err);
                    }
                }
                Segment::Line(line) => {
                    self.carry.extend_from_slice(line);
                    if let Err((accepted, err)) = deliver(&mut self.sink, &self.carry) {
                        self.carry.drain(..accepted);
                        return Err(err);
                    }
                    self.carry.clear();
                }
                Segment::Partial(partial) => self.carry.extend_from_slice(partial),
            }
        }
        Ok(())
    }

    /// Re-sends the complete lines left in the carry-over by a failed
    /// delivery, one call per line.
    fn send_pending(&mut self) -> io::Result<()> {
        if self.complete == 0 {
            return Ok(());
        }

        let mut sent = 0;
        let mut failure = None;
        for segment in LineSegments::new(&self.carry[..self.complete]) {
            let line = segment.as_bytes();
            match deliver(&mut self.sink, line) {
                Ok(()) => sent += line.len(),
                Err((accepted, err)) => {
                    sent += accepted;
                    failure = Some(err);
                    break;
                }
            }
        }

        self.carry.drain(..sent);
        self.complete -= sent;
        failure.map_or(Ok(()), Err)
    }

    /// Sends the unterminated remainder as the last call before close.
    fn send_tail(&mut self) -> LineWriterResult<()> {
        if self.carry.is_empty() {
            return Ok(());
        }
        match deliver(&mut self.sink, &self.carry) {
            Ok(()) => {
                self.carry.clear();
                Ok(())
            }
            Err((accepted, err)) => {
                self.carry.drain(..accepted);
                Err(LineWriterError::sink_write(WriterOperation::Close, 0, err))
            }
        }
    }
}

/// Passes `line` to the sink, reporting how much was taken on failure.
fn deliver<S>(sink: &mut S, line: &[u8]) -> Result<(), (usize, io::Error)>
where
    S: LineSink + ?Sized,
{
    match sink.accept(line) {
        Ok(accepted) if accepted == line.len() => Ok(()),
        Ok(accepted) if accepted > line.len() => Err((0, invalid_write(accepted, line.len()))),
        Ok(accepted) => Err((accepted, short_write(accepted, line.len()))),
        Err(err) => Err((0, err)),
    }
}

impl<S: LineSink> LineWrite for PerLineWriter<S> {
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

impl<S: LineSink> io::Write for PerLineWriter<S> {
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

    /// Retries lines whose delivery previously failed. A partial line is
    /// never forwarded by a flush.
    fn flush(&mut self) -> io::Result<()> {
        self.ensure_open(WriterOperation::Flush)?;
        self.send_pending()
            .map_err(|err| LineWriterError::sink_write(WriterOperation::Flush, 0, err).into())
    }
}

impl<S: LineSink> Drop for PerLineWriter<S> {
    fn drop(&mut self) {
        if !self.closed {
            // Errors cannot be reported from drop; call `close` to observe them.
            let _ = self.close();
        }
    }
}
