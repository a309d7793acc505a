//! Construction parameters for the line writers.

use std::num::NonZeroUsize;

use crate::error::{LineWriterError, LineWriterResult};

/// Default batch buffer capacity (32 KiB).
///
/// Matches the staging buffer a generic copy loop allocates, so a batch
/// writer fed by such a loop fills its buffer in one call.
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// Default transfer buffer size used by [`PerLineWriter`](crate::PerLineWriter)
/// when pulling from a [`ByteSource`](crate::ByteSource).
pub const DEFAULT_TRANSFER_SIZE: usize = 32 * 1024;

/// What a [`BatchLineWriter`](crate::BatchLineWriter) does when its buffer is
/// full and contains no newline.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OversizeLinePolicy {
    /// Forward the full buffer as-is.
    ///
    /// Memory stays bounded by the configured capacity. A line longer than
    /// the capacity reaches the sink split across two or more calls; the
    /// bytes themselves are unchanged.
    #[default]
    Split,
    /// Double the buffer until the line fits.
    ///
    /// Keeps every line in a single sink call at the cost of unbounded (or
    /// `max_capacity`-bounded) memory. Once `max_capacity` is reached the
    /// writer falls back to [`OversizeLinePolicy::Split`]. The buffer never
    /// shrinks back.
    Grow {
        /// Upper bound on the buffer capacity, if any.
        max_capacity: Option<NonZeroUsize>,
    },
}

/// Configuration for a [`BatchLineWriter`](crate::BatchLineWriter).
///
/// # Examples
///
/// ```
/// use linebatch::{BatchConfig, OversizeLinePolicy};
///
/// let config = BatchConfig::new()
///     .with_capacity(4096)
///     .with_oversize_policy(OversizeLinePolicy::Grow { max_capacity: None });
/// assert!(config.validate().is_ok());
/// assert_eq!(config.capacity(), 4096);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BatchConfig {
    capacity: usize,
    oversize: OversizeLinePolicy,
}

impl BatchConfig {
    /// Returns the default configuration: [`DEFAULT_BUFFER_SIZE`] and
    /// [`OversizeLinePolicy::Split`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capacity: DEFAULT_BUFFER_SIZE,
            oversize: OversizeLinePolicy::Split,
        }
    }

    /// Sets the buffer capacity in bytes.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the policy applied to lines longer than the buffer.
    #[must_use]
    pub const fn with_oversize_policy(mut self, oversize: OversizeLinePolicy) -> Self {
        self.oversize = oversize;
        self
    }

    /// Returns the configured buffer capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the configured oversize line policy.
    #[must_use]
    pub const fn oversize_policy(&self) -> OversizeLinePolicy {
        self.oversize
    }

    /// Checks that the configuration can back a writer.
    pub fn validate(&self) -> LineWriterResult<()> {
        if self.capacity == 0 {
            return Err(LineWriterError::invalid("buffer capacity must be at least 1"));
        }

        if let OversizeLinePolicy::Grow {
            max_capacity: Some(limit),
        } = self.oversize
        {
            if limit.get() < self.capacity {
                return Err(LineWriterError::invalid(
                    "growth limit must not be smaller than the buffer capacity",
                ));
            }
        }

        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::new()
    }
}
