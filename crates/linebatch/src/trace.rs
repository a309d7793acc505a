//! Structured diagnostics for flush and close activity.
//!
//! With the `tracing` feature the helpers emit events under the
//! `linebatch::io` target; without it they compile to nothing.

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

/// Trace a batch of complete lines forwarded to the sink.
///
/// # Arguments
///
/// * `bytes` - Size of the forwarded block
/// * `retained` - Bytes of trailing partial line left in the buffer
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_flush(bytes: usize, retained: usize) {
    trace!(
        target: "linebatch::io",
        operation = "flush",
        bytes = bytes,
        retained = retained,
        "forwarded {} bytes, {} retained",
        bytes,
        retained
    );
}

#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_flush(_bytes: usize, _retained: usize) {}

/// Trace a full buffer forwarded without a newline.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_split(capacity: usize) {
    debug!(
        target: "linebatch::io",
        operation = "split",
        capacity = capacity,
        "line exceeds {} byte buffer; forwarding partial line",
        capacity
    );
}

#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_split(_capacity: usize) {}

/// Trace the batch buffer growing to hold a long line.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_grow(from: usize, to: usize) {
    debug!(
        target: "linebatch::io",
        operation = "grow",
        from = from,
        to = to,
        "growing line buffer from {} to {} bytes",
        from,
        to
    );
}

#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_grow(_from: usize, _to: usize) {}

/// Trace completion of a pull-style transfer.
///
/// # Arguments
///
/// * `writer` - Name of the writer performing the transfer
/// * `transferred` - Bytes read from the source
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_drain(writer: &str, transferred: u64) {
    debug!(
        target: "linebatch::io",
        operation = "drain",
        writer = writer,
        transferred = transferred,
        "{} drained {} bytes from source",
        writer,
        transferred
    );
}

#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_drain(_writer: &str, _transferred: u64) {}

/// Trace a writer closing its sink.
///
/// # Arguments
///
/// * `writer` - Name of the writer being closed
/// * `remainder` - Bytes forwarded by the final flush
/// * `failed` - Whether the final flush or the sink close reported an error
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_close(writer: &str, remainder: usize, failed: bool) {
    if failed {
        debug!(
            target: "linebatch::io",
            operation = "close",
            writer = writer,
            remainder = remainder,
            "{} closed with errors",
            writer
        );
    } else {
        debug!(
            target: "linebatch::io",
            operation = "close",
            writer = writer,
            remainder = remainder,
            "{} closed ({} trailing bytes)",
            writer,
            remainder
        );
    }
}

#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_close(_writer: &str, _remainder: usize, _failed: bool) {}
