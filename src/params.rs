//! # Plugin Parameters
//!
//! Dopo Delay exposes exactly one parameter: the delay time in seconds.
//! The host draws its own generic slider for it and persists the value
//! with the session under the parameter's ID.
//!
//! ## No Smoothing
//!
//! The delay time is read once per block and applied to the whole block.
//! A jump in the slider moves the read position in one step, which can
//! click. Ramping it would mean resampling the ring (pitch-shifting the
//! repeats), which is a different effect.

use nih_plug::prelude::*;

use crate::dsp::processor::MAX_DELAY_SECONDS;

/// Delay time shown to the user on first load, in seconds.
pub const DEFAULT_DELAY_SECONDS: f32 = 0.2;

/// All user-facing parameters for Dopo Delay.
#[derive(Params)]
pub struct DelayParams {
    /// **Delay Time** in seconds, from 0 (dry pass-through) to 2.95 s.
    ///
    /// The ID is what the host stores in presets and sessions. Once
    /// published, never change it.
    #[id = "delay"]
    pub delay_time: FloatParam,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            delay_time: FloatParam::new(
                "Delay Seconds",
                DEFAULT_DELAY_SECONDS,
                FloatRange::Linear {
                    min: 0.0,
                    max: MAX_DELAY_SECONDS,
                },
            )
            .with_unit(" s")
            .with_value_to_string(formatters::v2s_f32_rounded(3)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_time_defaults_to_a_short_slapback() {
        let params = DelayParams::default();
        assert_eq!(params.delay_time.value(), DEFAULT_DELAY_SECONDS);
        assert_eq!(params.delay_time.default_plain_value(), 0.2);
    }

    #[test]
    fn delay_time_spans_zero_to_max() {
        let params = DelayParams::default();
        let delay = &params.delay_time;

        assert_eq!(delay.preview_plain(0.0), 0.0);
        assert_eq!(delay.preview_plain(1.0), MAX_DELAY_SECONDS);
    }
}
