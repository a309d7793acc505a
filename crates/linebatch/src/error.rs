//! Error types shared by both line writers.

use std::fmt;
use std::io;

/// Result alias used throughout the crate.
pub type LineWriterResult<T> = Result<T, LineWriterError>;

/// Operation that was in progress when a [`LineWriterError`] was raised.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum WriterOperation {
    /// Push-style [`append`](crate::LineWrite::append).
    Append,
    /// Pull-style [`drain_from`](crate::LineWrite::drain_from).
    Drain,
    /// Explicit flush of buffered complete lines.
    Flush,
    /// Final flush and sink close.
    Close,
}

impl WriterOperation {
    /// Returns the lowercase name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Drain => "drain",
            Self::Flush => "flush",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for WriterOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by [`BatchLineWriter`](crate::BatchLineWriter) and
/// [`PerLineWriter`](crate::PerLineWriter).
///
/// Sink and source failures are never retried. Bytes that already reached
/// the sink cannot be recalled, so the `processed` and `transferred` counters
/// tell the caller how far the operation got before it failed.
#[derive(Debug, thiserror::Error)]
pub enum LineWriterError {
    /// The writer was configured with unusable parameters.
    #[error("invalid line writer configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the rejected parameter.
        reason: &'static str,
    },

    /// The sink failed, accepted fewer bytes than requested, or reported an
    /// impossible count.
    #[error("sink write failed during {operation} after {processed} bytes: {source}")]
    SinkWriteFailed {
        /// Operation that issued the failing sink call.
        operation: WriterOperation,
        /// Input bytes consumed by the operation before the failure.
        processed: u64,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The sink reported an error while being closed.
    #[error("sink close failed: {source}")]
    SinkCloseFailed {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The source reported an error other than end-of-stream.
    #[error("source read failed after {transferred} bytes: {source}")]
    SourceReadFailed {
        /// Bytes transferred from the source before the failure.
        transferred: u64,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The writer has already been closed.
    #[error("{operation} called on a closed line writer")]
    AlreadyClosed {
        /// Operation attempted after close.
        operation: WriterOperation,
    },
}

impl LineWriterError {
    pub(crate) const fn invalid(reason: &'static str) -> Self {
        Self::InvalidConfiguration { reason }
    }

    pub(crate) const fn closed(operation: WriterOperation) -> Self {
        Self::AlreadyClosed { operation }
    }

    pub(crate) fn sink_write(operation: WriterOperation, processed: u64, source: io::Error) -> Self {
        Self::SinkWriteFailed {
            operation,
            processed,
            source,
        }
    }

    /// Returns the underlying I/O error, if any.
    #[must_use]
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::SinkWriteFailed { source, .. }
            | Self::SinkCloseFailed { source }
            | Self::SourceReadFailed { source, .. } => Some(source),
            Self::InvalidConfiguration { .. } | Self::AlreadyClosed { .. } => None,
        }
    }

    /// Returns `true` for [`LineWriterError::AlreadyClosed`].
    #[must_use]
    pub const fn is_already_closed(&self) -> bool {
        matches!(self, Self::AlreadyClosed { .. })
    }
}

impl From<LineWriterError> for io::Error {
    fn from(error: LineWriterError) -> Self {
        let kind = match &error {
            LineWriterError::InvalidConfiguration { .. } => io::ErrorKind::InvalidInput,
            LineWriterError::AlreadyClosed { .. } => io::ErrorKind::BrokenPipe,
            LineWriterError::SinkWriteFailed { source, .. }
            | LineWriterError::SinkCloseFailed { source }
            | LineWriterError::SourceReadFailed { source, .. } => source.kind(),
        };
        Self::new(kind, error)
    }
}

/// Error used when a sink reports accepting fewer bytes than it was offered.
pub(crate) fn short_write(accepted: usize, requested: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::WriteZero,
        format!("sink accepted {accepted} of {requested} bytes"),
    )
}

/// Error used when a sink reports accepting more bytes than it was offered.
pub(crate) fn invalid_write(accepted: usize, requested: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("sink reported {accepted} bytes accepted for a {requested}-byte block"),
    )
}
