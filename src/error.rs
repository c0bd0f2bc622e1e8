//! Configuration errors raised while sizing the delay buffer.
//!
//! These never cross into `process()`. The audio path only ever sees a
//! buffer that is either correctly sized or disabled (zero capacity).

use std::collections::TryReserveError;

use thiserror::Error;

/// Why the delay buffer could not be configured.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `sample_rate * 3.0` is not a positive, finite number of samples.
    #[error("invalid delay buffer size for sample rate {sample_rate} Hz")]
    InvalidCapacity { sample_rate: f64 },

    /// The host announced a layout with no output channels.
    #[error("delay buffer needs at least one channel")]
    NoChannels,

    /// The allocator refused the requested buffer.
    #[error("failed to allocate {samples} samples x {channels} channels: {source}")]
    Allocation {
        samples: usize,
        channels: usize,
        #[source]
        source: TryReserveError,
    },

    /// The host may hand us blocks longer than the buffer can hold.
    #[error("host block size {block_len} exceeds delay buffer capacity {capacity}")]
    BlockTooLong { block_len: usize, capacity: usize },
}
