#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/linebatch/src/lib.rs
//!
//! # Overview
//!
//! `linebatch` provides two writers that sit between a byte producer and a
//! closable [`LineSink`] and guarantee that every block handed to the sink
//! starts and ends on a newline boundary. The only exceptions are the final
//! block written at close, and a line longer than the batch buffer, which is
//! split when [`OversizeLinePolicy::Split`] is in effect.
//!
//! - [`BatchLineWriter`] accumulates bytes in a fixed-capacity buffer and,
//!   whenever the buffer fills, forwards the longest prefix that ends in a
//!   newline in a single sink call. It also offers
//!   [`BatchLineWriter::drain_from`], which reads from a [`ByteSource`]
//!   straight into the free tail of its buffer and skips the staging copy a
//!   generic copy loop would make.
//! - [`PerLineWriter`] issues exactly one sink call per newline-terminated
//!   line and keeps a partial trailing line as carry-over until it is
//!   completed or the writer is closed.
//!
//! # Design
//!
//! Both writers implement [`LineWrite`] and [`std::io::Write`]. The batch
//! writer flushes exactly when its buffer becomes full, so the sequence of
//! sink calls depends only on the byte stream and never on how the caller
//! chunks it. Pushing bytes through [`LineWrite::append`] and pulling them
//! through [`LineWrite::drain_from`] therefore produce identical sink calls.
//!
//! # Invariants
//!
//! - Bytes are forwarded unchanged and in order; the newline byte is the only
//!   boundary marker and is never stripped.
//! - [`LineSink::close`] is invoked exactly once per writer, either by an
//!   explicit [`LineWrite::close`] or, failing that, when the writer is
//!   dropped.
//! - A short write from the sink is an error even when the sink reported no
//!   error of its own.
//!
//! # Errors
//!
//! Fallible operations return [`LineWriterError`], which records the failing
//! operation and how many bytes had been processed so far. The error converts
//! into [`std::io::Error`] for use through the [`std::io::Write`]
//! implementations.
//!
//! # Examples
//!
//! ```
//! use linebatch::{BatchLineWriter, LineWrite, WriteSink};
//!
//! let mut output = WriteSink::new(Vec::new());
//! let mut writer = BatchLineWriter::new(&mut output, 16)?;
//! writer.append(b"ab\ncdefgh\nijklmnopqrstuvwxyz\n")?;
//! writer.close()?;
//! drop(writer);
//!
//! assert_eq!(output.get_ref().as_slice(), b"ab\ncdefgh\nijklmnopqrstuvwxyz\n");
//! # Ok::<(), linebatch::LineWriterError>(())
//! ```

mod batch;
mod buffer;
mod config;
mod error;
mod per_line;
mod scan;
mod sink;
mod trace;
mod traits;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use crate::batch::BatchLineWriter;
pub use crate::config::{
    BatchConfig, DEFAULT_BUFFER_SIZE, DEFAULT_TRANSFER_SIZE, OversizeLinePolicy,
};
pub use crate::error::{LineWriterError, LineWriterResult, WriterOperation};
pub use crate::per_line::PerLineWriter;
pub use crate::scan::{LineSegments, Segment, last_newline};
pub use crate::sink::{ByteSource, LineSink, WriteSink};
pub use crate::traits::LineWrite;
