//! # Delay Buffer (Block-Based Ring Buffer)
//!
//! The delay buffer stores the last three seconds of audio for every
//! channel and hands back any slice of that history on request. Unlike a
//! per-sample delay line, it moves whole blocks at a time: one `write()`
//! copies the host's block in, and one `read()` copies a block of the
//! past back out.
//!
//! ## Splitting at the End of the Ring
//!
//! A block rarely fits neatly before the end of the buffer. When
//! `start + len` runs past `capacity`, the copy is split into two
//! contiguous pieces:
//!
//! ```text
//!  capacity = 10, start = 8, len = 5
//!
//!  index:   0   1   2   3   4   5   6   7   8   9
//!         ┌───┬───┬───┬───┬───┬───┬───┬───┬───┬───┐
//!         │ c │ d │ e │   │   │   │   │   │ a │ b │
//!         └───┴───┴───┴───┴───┴───┴───┴───┴───┴───┘
//!           └─── head ──┘                   └tail─┘
//!
//!  tail = capacity - start = 2 samples   (a, b)
//!  head = len - tail       = 3 samples   (c, d, e)
//! ```
//!
//! Both pieces are plain `copy_from_slice` calls at unity gain, so the
//! hot path is two `memcpy`s per channel and never allocates.
//!
//! ## Capacity
//!
//! The buffer always holds `floor(sample_rate * 3.0)` samples per channel.
//! The longest user-facing delay is 2.95 s, which leaves 50 ms of room
//! for the block that is being written while the oldest audio is read.

use std::ops::Range;

use nih_plug::prelude::*;

use crate::error::ConfigError;

/// How much audio history the buffer keeps, in seconds.
pub const BUFFER_SECONDS: f64 = 3.0;

/// Multi-channel circular sample store.
///
/// A freshly created buffer has zero capacity and is *disabled*: writes
/// are ignored and reads produce silence. It only becomes usable after a
/// successful [`configure()`](Self::configure).
#[derive(Default)]
pub struct DelayBuffer {
    /// One ring per channel, each exactly `capacity` samples long.
    channels: Vec<Vec<f32>>,

    /// Samples per channel. Zero while disabled.
    capacity: usize,
}

impl DelayBuffer {
    /// (Re)allocate the buffer for a new sample rate and channel count.
    ///
    /// Any previous contents are discarded and the new rings start out
    /// silent. On failure the buffer is left disabled (zero capacity),
    /// never half-sized.
    pub fn configure(&mut self, sample_rate: f64, channel_count: usize) -> Result<(), ConfigError> {
        self.disable();

        let samples = sample_rate * BUFFER_SECONDS;
        if !samples.is_finite() || samples < 1.0 {
            return Err(ConfigError::InvalidCapacity { sample_rate });
        }

        self.allocate(samples.floor() as usize, channel_count)
    }

    /// Allocate `channel_count` silent rings of `capacity` samples.
    ///
    /// Uses `try_reserve_exact` so an oversized request comes back as an
    /// error instead of aborting the host process.
    fn allocate(&mut self, capacity: usize, channel_count: usize) -> Result<(), ConfigError> {
        if channel_count == 0 {
            return Err(ConfigError::NoChannels);
        }

        let alloc_error = |source| ConfigError::Allocation {
            samples: capacity,
            channels: channel_count,
            source,
        };

        let mut channels = Vec::new();
        channels.try_reserve_exact(channel_count).map_err(alloc_error)?;
        for _ in 0..channel_count {
            let mut ring = Vec::new();
            ring.try_reserve_exact(capacity).map_err(alloc_error)?;
            ring.resize(capacity, 0.0);
            channels.push(ring);
        }

        self.channels = channels;
        self.capacity = capacity;
        Ok(())
    }

    /// Drop all storage and fall back to the silent, zero-capacity state.
    pub fn disable(&mut self) {
        self.channels = Vec::new();
        self.capacity = 0;
    }

    /// Samples stored per channel.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of channels the buffer was configured for.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    /// Silence every ring without reallocating.
    pub fn clear(&mut self) {
        for ring in &mut self.channels {
            ring.fill(0.0);
        }
    }

    /// Copy `input` into `channel`'s ring starting at `write_cursor`.
    ///
    /// The whole input is one block. If it runs past the end of the ring
    /// the remainder wraps to index 0.
    ///
    /// # Preconditions
    ///
    /// `channel < channel_count()`, `write_cursor < capacity()` and
    /// `input.len() <= capacity()`. Violations trip a debug assertion;
    /// release builds drop the channel or clamp the block instead of
    /// touching memory outside the ring.
    pub fn write(&mut self, channel: usize, input: &[f32], write_cursor: usize) {
        let capacity = self.capacity;
        if capacity == 0 {
            return;
        }
        let Some(ring) = self.channels.get_mut(channel) else {
            nih_debug_assert_failure!("write to unconfigured channel {}", channel);
            return;
        };

        nih_debug_assert!(write_cursor < capacity);
        nih_debug_assert!(input.len() <= capacity);
        let start = write_cursor.min(capacity - 1);
        let input = &input[..input.len().min(capacity)];

        let (tail, head) = ring_spans(start, input.len(), capacity);
        let (to_tail, to_head) = input.split_at(tail.len());
        ring[tail].copy_from_slice(to_tail);
        ring[head].copy_from_slice(to_head);
    }

    /// Fill `output` with `output.len()` samples of `channel`'s history,
    /// starting at `read_offset`.
    ///
    /// A negative offset is wrapped by adding `capacity` once, see
    /// [`normalize_offset()`](Self::normalize_offset). Anything that
    /// cannot be served (disabled buffer, unknown channel, samples past
    /// `capacity`) comes out as silence.
    pub fn read(&self, channel: usize, output: &mut [f32], read_offset: isize) {
        let capacity = self.capacity;
        let Some(ring) = self.channels.get(channel).filter(|_| capacity > 0) else {
            nih_debug_assert!(capacity == 0, "read from unconfigured channel {}", channel);
            output.fill(0.0);
            return;
        };

        nih_debug_assert!(output.len() <= capacity);
        let len = output.len().min(capacity);
        let start = self.normalize_offset(read_offset);

        let (tail, head) = ring_spans(start, len, capacity);
        let (from_tail, rest) = output.split_at_mut(tail.len());
        let (from_head, overflow) = rest.split_at_mut(head.len());
        from_tail.copy_from_slice(&ring[tail]);
        from_head.copy_from_slice(&ring[head]);
        overflow.fill(0.0);
    }

    /// Map a read offset into `[0, capacity)`.
    ///
    /// Offsets come from `write_cursor - delay_samples`, which for any
    /// delay shorter than the buffer dips below zero at most once. Only
    /// that single wrap is applied. Anything further out is a sizing bug
    /// upstream and gets clamped to the nearest valid index.
    pub fn normalize_offset(&self, read_offset: isize) -> usize {
        let capacity = self.capacity as isize;
        if capacity == 0 {
            return 0;
        }

        let offset = if read_offset < 0 {
            read_offset + capacity
        } else {
            read_offset
        };
        nih_debug_assert!(
            (0..capacity).contains(&offset),
            "read offset {} outside delay buffer of {} samples",
            read_offset,
            capacity
        );

        offset.clamp(0, capacity - 1) as usize
    }
}

/// Split a run of `len` samples starting at `start` into the part before
/// the end of the ring and the part that wraps to index 0.
///
/// Requires `start < capacity` and `len <= capacity`.
fn ring_spans(start: usize, len: usize, capacity: usize) -> (Range<usize>, Range<usize>) {
    let tail_end = (start + len).min(capacity);
    let head_len = len - (tail_end - start);
    (start..tail_end, 0..head_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with_capacity(capacity: usize, channels: usize) -> DelayBuffer {
        let mut buffer = DelayBuffer::default();
        buffer.allocate(capacity, channels).unwrap();
        buffer
    }

    #[test]
    fn capacity_is_three_seconds_of_audio() {
        for (sample_rate, expected) in [(44100.0, 132_300), (48000.0, 144_000), (96000.0, 288_000)] {
            let mut buffer = DelayBuffer::default();
            buffer.configure(sample_rate, 2).unwrap();

            assert_eq!(buffer.capacity(), expected, "capacity at {sample_rate} Hz");
            assert_eq!(buffer.channel_count(), 2);
            assert!(buffer.is_enabled());
        }
    }

    #[test]
    fn fractional_capacity_is_floored() {
        let mut buffer = DelayBuffer::default();
        // 22050.5 * 3.0 = 66151.5
        buffer.configure(22050.5, 1).unwrap();
        assert_eq!(buffer.capacity(), 66_151);
    }

    #[test]
    fn new_buffer_is_disabled() {
        let buffer = DelayBuffer::default();
        assert_eq!(buffer.capacity(), 0);
        assert_eq!(buffer.channel_count(), 0);
        assert!(!buffer.is_enabled());
    }

    #[test]
    fn write_straddling_the_end_splits_into_tail_and_head() {
        let mut buffer = buffer_with_capacity(10, 1);

        buffer.write(0, &[1.0, 2.0, 3.0, 4.0, 5.0], 8);

        // Samples land at indices [8, 9, 0, 1, 2].
        assert_eq!(
            buffer.channels[0],
            vec![3.0, 4.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0]
        );
    }

    #[test]
    fn write_that_fits_does_not_wrap() {
        let mut buffer = buffer_with_capacity(10, 1);

        buffer.write(0, &[1.0, 2.0, 3.0], 2);
        assert_eq!(
            buffer.channels[0],
            vec![0.0, 0.0, 1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );

        // Ending exactly on the last index is still a single copy.
        buffer.write(0, &[7.0, 8.0], 8);
        assert_eq!(&buffer.channels[0][8..], &[7.0, 8.0]);
        assert_eq!(buffer.channels[0][0], 0.0);
    }

    #[test]
    fn read_straddling_the_end_joins_tail_and_head() {
        let mut buffer = buffer_with_capacity(10, 1);
        for i in 0..10 {
            buffer.write(0, &[i as f32], i);
        }

        let mut out = [0.0; 5];
        buffer.read(0, &mut out, 7);
        assert_eq!(out, [7.0, 8.0, 9.0, 0.0, 1.0]);
    }

    #[test]
    fn negative_read_offset_wraps_once() {
        let mut buffer = buffer_with_capacity(10, 1);
        for i in 0..10 {
            buffer.write(0, &[i as f32], i);
        }

        assert_eq!(buffer.normalize_offset(-2), 8);
        assert_eq!(buffer.normalize_offset(-10), 0);

        let mut out = [0.0; 3];
        buffer.read(0, &mut out, -2);
        assert_eq!(out, [8.0, 9.0, 0.0]);
    }

    #[test]
    fn out_of_range_offsets_are_clamped() {
        let buffer = buffer_with_capacity(10, 1);
        assert_eq!(buffer.normalize_offset(-25), 0);
        assert_eq!(buffer.normalize_offset(42), 9);
    }

    #[test]
    fn channels_are_independent() {
        let mut buffer = buffer_with_capacity(8, 2);

        buffer.write(0, &[1.0; 4], 0);
        buffer.write(1, &[-1.0; 4], 2);

        let mut left = [0.0; 8];
        let mut right = [0.0; 8];
        buffer.read(0, &mut left, 0);
        buffer.read(1, &mut right, 0);

        assert_eq!(left, [1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(right, [0.0, 0.0, -1.0, -1.0, -1.0, -1.0, 0.0, 0.0]);
    }

    #[test]
    fn invalid_sample_rates_leave_buffer_disabled() {
        for sample_rate in [0.0, -48000.0, 0.2, f64::NAN, f64::INFINITY] {
            let mut buffer = buffer_with_capacity(10, 1);

            let err = buffer.configure(sample_rate, 2).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidCapacity { .. }),
                "unexpected error for {sample_rate}: {err}"
            );
            assert!(!buffer.is_enabled());
            assert_eq!(buffer.channel_count(), 0);
        }
    }

    #[test]
    fn zero_channels_is_rejected() {
        let mut buffer = DelayBuffer::default();
        let err = buffer.configure(48000.0, 0).unwrap_err();

        assert!(matches!(err, ConfigError::NoChannels));
        assert!(!buffer.is_enabled());
    }

    #[test]
    fn impossible_allocation_is_reported() {
        let mut buffer = DelayBuffer::default();
        let err = buffer.allocate(usize::MAX, 1).unwrap_err();

        assert!(matches!(err, ConfigError::Allocation { .. }));
        assert!(!buffer.is_enabled());
    }

    #[test]
    fn disabled_buffer_reads_silence_and_ignores_writes() {
        let mut buffer = DelayBuffer::default();
        buffer.write(0, &[1.0; 16], 0);

        let mut out = [0.5; 16];
        buffer.read(0, &mut out, 0);
        assert_eq!(out, [0.0; 16]);
    }

    #[test]
    fn reconfigure_discards_contents() {
        let mut buffer = DelayBuffer::default();
        buffer.configure(100.0, 1).unwrap();
        buffer.write(0, &[1.0; 50], 0);

        buffer.configure(100.0, 1).unwrap();
        assert_eq!(buffer.capacity(), 300);

        let mut out = [0.0; 50];
        buffer.read(0, &mut out, 0);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn clear_silences_without_resizing() {
        let mut buffer = buffer_with_capacity(10, 2);
        buffer.write(0, &[1.0; 10], 0);
        buffer.write(1, &[1.0; 10], 0);

        buffer.clear();

        assert_eq!(buffer.capacity(), 10);
        assert!(buffer.channels.iter().flatten().all(|&s| s == 0.0));
    }

    #[test]
    fn oversized_blocks_are_clamped_to_capacity() {
        let mut buffer = buffer_with_capacity(4, 1);

        buffer.write(0, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 0);
        assert_eq!(buffer.channels[0], vec![1.0, 2.0, 3.0, 4.0]);

        let mut out = [9.0; 6];
        buffer.read(0, &mut out, 2);
        assert_eq!(out, [3.0, 4.0, 1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn unknown_channels_read_silence() {
        let mut buffer = buffer_with_capacity(4, 1);
        buffer.write(3, &[1.0; 4], 0);
        assert!(buffer.channels[0].iter().all(|&s| s == 0.0));

        let mut out = [1.0; 4];
        buffer.read(3, &mut out, 0);
        assert_eq!(out, [0.0; 4]);
    }
}
