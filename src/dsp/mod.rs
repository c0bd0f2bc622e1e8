//! # DSP Core
//!
//! - **`delay_buffer`**: a multi-channel ring buffer that takes whole
//!   blocks in and gives whole blocks of the past back, splitting copies
//!   that run past the end of the ring.
//!
//! - **`processor`**: the per-block loop that writes each channel, reads
//!   it back `delay` samples behind the shared write cursor, and then
//!   advances that cursor once.

pub mod delay_buffer;
pub mod processor;
