//! Sink and source doubles for exercising the line writers.
//!
//! Available to this crate's unit tests and, through the `test-support`
//! feature, to integration tests and benchmarks.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use sha2::{Digest, Sha256};

use crate::sink::LineSink;

/// Sink that stores every block it accepts as a separate call.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    calls: Vec<Vec<u8>>,
    close_count: usize,
}

impl RecordingSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks received, one entry per `accept` call.
    #[must_use]
    pub fn calls(&self) -> &[Vec<u8>] {
        &self.calls
    }

    /// Blocks received, decoded lossily for readable assertions.
    #[must_use]
    pub fn calls_lossy(&self) -> Vec<String> {
        self.calls
            .iter()
            .map(|call| String::from_utf8_lossy(call).into_owned())
            .collect()
    }

    /// Concatenation of every accepted block.
    #[must_use]
    pub fn output(&self) -> Vec<u8> {
        self.calls.concat()
    }

    /// Number of times `close` was invoked.
    #[must_use]
    pub const fn close_count(&self) -> usize {
        self.close_count
    }
}

impl LineSink for RecordingSink {
    fn accept(&mut self, block: &[u8]) -> io::Result<usize> {
        self.calls.push(block.to_vec());
        Ok(block.len())
    }

    fn close(&mut self) -> io::Result<()> {
        self.close_count += 1;
        Ok(())
    }
}

/// Scripted behaviour for one [`FaultySink::accept`] call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SinkFault {
    /// Accept the whole block.
    Pass,
    /// Accept at most this many bytes and report no error.
    Short(usize),
    /// Fail with an error of this kind without accepting anything.
    Fail(io::ErrorKind),
    /// Accept nothing but report this count.
    Overreport(usize),
}

/// Sink that follows a script of faults, then accepts everything.
#[derive(Debug, Default)]
pub struct FaultySink {
    script: VecDeque<SinkFault>,
    close_error: Option<io::ErrorKind>,
    accepted: Vec<u8>,
    calls: usize,
    close_count: usize,
}

impl FaultySink {
    /// Creates a sink that applies `script` to its first calls.
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = SinkFault>,
    {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Makes `close` fail with an error of `kind`.
    #[must_use]
    pub fn with_close_error(mut self, kind: io::ErrorKind) -> Self {
        self.close_error = Some(kind);
        self
    }

    /// Bytes the sink actually took, in order.
    #[must_use]
    pub fn accepted(&self) -> &[u8] {
        &self.accepted
    }

    /// Number of `accept` calls, including failed ones.
    #[must_use]
    pub const fn calls(&self) -> usize {
        self.calls
    }

    /// Number of times `close` was invoked.
    #[must_use]
    pub const fn close_count(&self) -> usize {
        self.close_count
    }
}

impl LineSink for FaultySink {
    fn accept(&mut self, block: &[u8]) -> io::Result<usize> {
        self.calls += 1;
        match self.script.pop_front().unwrap_or(SinkFault::Pass) {
            SinkFault::Pass => {
                self.accepted.extend_from_slice(block);
                Ok(block.len())
            }
            SinkFault::Short(limit) => {
                let count = limit.min(block.len());
                self.accepted.extend_from_slice(&block[..count]);
                Ok(count)
            }
            SinkFault::Fail(kind) => Err(io::Error::new(kind, "scripted sink failure")),
            SinkFault::Overreport(count) => Ok(count),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.close_count += 1;
        match self.close_error {
            Some(kind) => Err(io::Error::new(kind, "scripted close failure")),
            None => Ok(()),
        }
    }
}

/// Sink that hashes everything it accepts with SHA-256.
///
/// Gives benchmarks a sink that does real work per byte while still letting
/// them verify that every byte went through.
#[derive(Clone, Default)]
pub struct DigestSink {
    hasher: Sha256,
    bytes: u64,
    calls: u64,
    close_count: usize,
}

impl DigestSink {
    /// Creates a sink with an empty digest state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// SHA-256 of the bytes accepted so far.
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        self.hasher.clone().finalize().into()
    }

    /// Total bytes accepted.
    #[must_use]
    pub const fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Number of `accept` calls.
    #[must_use]
    pub const fn calls(&self) -> u64 {
        self.calls
    }

    /// Number of times `close` was invoked.
    #[must_use]
    pub const fn close_count(&self) -> usize {
        self.close_count
    }

    /// Clears the digest and counters so the sink can be reused.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl std::fmt::Debug for DigestSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestSink")
            .field("bytes", &self.bytes)
            .field("calls", &self.calls)
            .field("close_count", &self.close_count)
            .finish_non_exhaustive()
    }
}

impl LineSink for DigestSink {
    fn accept(&mut self, block: &[u8]) -> io::Result<usize> {
        self.hasher.update(block);
        self.bytes += block.len() as u64;
        self.calls += 1;
        Ok(block.len())
    }

    fn close(&mut self) -> io::Result<()> {
        self.close_count += 1;
        Ok(())
    }
}

/// SHA-256 of `bytes`, for comparing against [`DigestSink::digest`].
#[must_use]
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Sink that counts and drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardSink {
    bytes: u64,
    calls: u64,
    close_count: usize,
}

impl DiscardSink {
    /// Creates a sink with zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: 0,
            calls: 0,
            close_count: 0,
        }
    }

    /// Total bytes accepted.
    #[must_use]
    pub const fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Number of `accept` calls.
    #[must_use]
    pub const fn calls(&self) -> u64 {
        self.calls
    }

    /// Number of times `close` was invoked.
    #[must_use]
    pub const fn close_count(&self) -> usize {
        self.close_count
    }
}

impl LineSink for DiscardSink {
    fn accept(&mut self, block: &[u8]) -> io::Result<usize> {
        self.bytes += block.len() as u64;
        self.calls += 1;
        Ok(block.len())
    }

    fn close(&mut self) -> io::Result<()> {
        self.close_count += 1;
        Ok(())
    }
}

/// Reader that returns its data in reads of at most `chunk` bytes.
///
/// Optionally reports [`io::ErrorKind::Interrupted`] before every
/// `interrupt_every`-th read.
#[derive(Clone, Debug)]
pub struct ChunkedSource {
    data: Vec<u8>,
    position: usize,
    chunk: usize,
    interrupt_every: Option<usize>,
    reads: usize,
}

impl ChunkedSource {
    /// Creates a source over `data` yielding at most `chunk` bytes per read.
    ///
    /// A `chunk` of zero is treated as one.
    pub fn new(data: impl Into<Vec<u8>>, chunk: usize) -> Self {
        Self {
            data: data.into(),
            position: 0,
            chunk: chunk.max(1),
            interrupt_every: None,
            reads: 0,
        }
    }

    /// Interrupts every `period`-th read attempt.
    #[must_use]
    pub fn interrupt_every(mut self, period: usize) -> Self {
        self.interrupt_every = Some(period.max(1));
        self
    }

    /// Bytes not yet returned.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}

impl Read for ChunkedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        if let Some(period) = self.interrupt_every {
            if self.reads % period == 0 {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
        }

        let count = buf.len().min(self.chunk).min(self.remaining());
        buf[..count].copy_from_slice(&self.data[self.position..self.position + count]);
        self.position += count;
        Ok(count)
    }
}

/// Reader that yields `data` and then fails with `kind` instead of reporting
/// end-of-stream.
#[derive(Clone, Debug)]
pub struct FailingSource {
    inner: io::Cursor<Vec<u8>>,
    kind: io::ErrorKind,
}

impl FailingSource {
    /// Creates a source that fails after producing `data`.
    pub fn new(data: impl Into<Vec<u8>>, kind: io::ErrorKind) -> Self {
        Self {
            inner: io::Cursor::new(data.into()),
            kind,
        }
    }
}

impl Read for FailingSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf)? {
            0 if !buf.is_empty() => Err(io::Error::new(self.kind, "scripted source failure")),
            count => Ok(count),
        }
    }
}

/// Copies `src` into `dst` through the caller's staging buffer.
///
/// Each read is passed to a single [`Write::write`] call. A write that takes
/// fewer bytes than were read ends the copy with
/// [`io::ErrorKind::WriteZero`], and interrupted reads are retried. This is
/// the push-style counterpart to the pull paths of the line writers.
pub fn copy_buffer<R, W>(dst: &mut W, src: &mut R, buf: &mut [u8]) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut written = 0u64;
    loop {
        let read = match src.read(buf) {
            Ok(0) => return Ok(written),
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };

        let wrote = dst.write(&buf[..read])?;
        if wrote > read {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "writer reported more bytes than it was given",
            ));
        }
        written += wrote as u64;
        if wrote != read {
            return Err(io::Error::from(io::ErrorKind::WriteZero));
        }
    }
}

/// Generates newline-terminated text lines of varying length.
///
/// The output is deterministic for a given `seed`, and every line is between
/// `1` and `max_line` bytes long including its newline.
#[must_use]
pub fn generate_lines(total: usize, max_line: usize, seed: u64) -> Vec<u8> {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz ,.;'ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let max_line = max_line.max(1);
    let mut state = seed | 1;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let mut out = Vec::with_capacity(total);
    while out.len() < total {
        let line_len = (next() as usize % max_line) + 1;
        for _ in 1..line_len {
            out.push(ALPHABET[next() as usize % ALPHABET.len()]);
        }
        out.push(b'\n');
    }
    out
}
