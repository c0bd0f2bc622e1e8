//! # Block Processor
//!
//! Owns everything that has to survive between two `process()` calls:
//! the [`DelayBuffer`], the shared write cursor, and the sample rate used
//! to turn seconds into samples.
//!
//! ## One Block, Three Steps
//!
//! For every channel, in order:
//!
//! 1. **Write** the incoming block into the ring at `write_cursor`.
//! 2. **Locate** the past: `read_offset = write_cursor - delay_samples`.
//! 3. **Read** a block from `read_offset` back into the host buffer,
//!    replacing the input in place.
//!
//! Only after every channel is done does the cursor move forward by one
//! block. All channels therefore see the same cursor, and the read always
//! uses the cursor from *before* the advance. With a delay of zero the
//! read lands exactly on the samples that were just written, so the
//! effect degrades to a clean pass-through.
//!
//! ```text
//!            write_cursor
//!                 │
//!   ... ──────────▼[ current block ]──────── ... ring
//!         ▲
//!         └── read_offset = write_cursor - delay_samples
//! ```

use nih_plug::prelude::*;

use super::delay_buffer::DelayBuffer;
use crate::error::ConfigError;

/// Longest delay the user can dial in, in seconds.
pub const MAX_DELAY_SECONDS: f32 = 2.95;

/// Per-session delay state, driven once per host block.
pub struct DelayProcessor {
    buffer: DelayBuffer,

    /// Next ring index to write. Shared by all channels and always
    /// `< capacity` (or 0 while the buffer is disabled).
    write_cursor: usize,

    sample_rate: f64,
}

impl Default for DelayProcessor {
    fn default() -> Self {
        Self {
            buffer: DelayBuffer::default(),
            write_cursor: 0,
            // Placeholder until the host calls configure().
            sample_rate: 44100.0,
        }
    }
}

impl DelayProcessor {
    /// Size the buffer for `sample_rate` and `channel_count` and rewind
    /// the cursor. Must run before the first [`process_block()`](Self::process_block)
    /// and again whenever the host changes rate or layout.
    pub fn configure(&mut self, sample_rate: f64, channel_count: usize) -> Result<(), ConfigError> {
        self.sample_rate = sample_rate;
        self.write_cursor = 0;
        self.buffer.configure(sample_rate, channel_count)
    }

    /// Check that blocks of up to `max_block_len` samples fit in the ring.
    ///
    /// If they don't, the buffer is disabled so that `process_block()`
    /// outputs silence instead of wrapping a block onto itself.
    pub fn ensure_block_fits(&mut self, max_block_len: usize) -> Result<(), ConfigError> {
        let capacity = self.buffer.capacity();
        if max_block_len > capacity {
            self.buffer.disable();
            self.write_cursor = 0;
            return Err(ConfigError::BlockTooLong {
                block_len: max_block_len,
                capacity,
            });
        }
        Ok(())
    }

    /// Silence the history and rewind the cursor, keeping the allocation.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.write_cursor = 0;
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn channel_count(&self) -> usize {
        self.buffer.channel_count()
    }

    #[cfg(test)]
    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    /// Convert a delay time to whole samples at the configured rate.
    ///
    /// The time is clamped to `[0, MAX_DELAY_SECONDS]` and rounded to the
    /// nearest sample.
    pub fn delay_samples(&self, delay_seconds: f32) -> usize {
        let seconds = delay_seconds.clamp(0.0, MAX_DELAY_SECONDS);
        let samples = (self.sample_rate * f64::from(seconds)).round();
        // NaN and negative rates both saturate to 0.
        samples as usize
    }

    /// Run one host block through the delay, in place.
    ///
    /// `channels` is the host's per-channel view of the block (nih-plug's
    /// `Buffer::as_slice()`); every slice has the same length. The delay
    /// time is read once and applies to the whole block, so a change made
    /// mid-block takes effect at the start of the next one.
    ///
    /// Callers must have configured at least `channels.len()` channels and
    /// a capacity of at least one block. Channels past the configured
    /// count, and samples past the capacity, are output as silence.
    pub fn process_block(&mut self, channels: &mut [&mut [f32]], delay_seconds: f32) {
        if !self.buffer.is_enabled() {
            for samples in channels.iter_mut() {
                samples.fill(0.0);
            }
            return;
        }

        let capacity = self.buffer.capacity();
        let block_len = channels.first().map_or(0, |samples| samples.len());
        nih_debug_assert!(
            block_len <= capacity,
            "block of {} samples exceeds delay buffer of {}",
            block_len,
            capacity
        );
        let block_len = block_len.min(capacity);

        let delay = self.delay_samples(delay_seconds);
        let read_offset = self.write_cursor as isize - delay as isize;

        for (channel_idx, samples) in channels.iter_mut().enumerate() {
            if channel_idx >= self.buffer.channel_count() {
                nih_debug_assert_failure!(
                    "channel {} not configured ({} channels)",
                    channel_idx,
                    self.buffer.channel_count()
                );
                samples.fill(0.0);
                continue;
            }

            let len = block_len.min(samples.len());
            let (block, overflow) = samples.split_at_mut(len);
            overflow.fill(0.0);

            self.buffer.write(channel_idx, block, self.write_cursor);
            self.buffer.read(channel_idx, block, read_offset);
        }

        self.write_cursor = (self.write_cursor + block_len) % capacity;
    }
}
