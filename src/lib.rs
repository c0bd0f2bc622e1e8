//! # Dopo Delay: A Single-Tap AU/VST3/CLAP Delay
//!
//! A plain time delay built with [nih-plug](https://github.com/robbert-vdh/nih-plug).
//! Every host block is written into a three-second ring buffer and the
//! same number of samples is read back from `delay` seconds earlier,
//! replacing the input. There is no dry signal, no feedback and no
//! modulation: what goes in comes out once, later.
//!
//! ## Signal Flow
//!
//! ```text
//!            ┌──────────────── Ring Buffer (3 s per channel) ───────────────┐
//!            │                                                              │
//! Input ───► write @ write_cursor          read @ write_cursor - delay ─────┼──► Output
//!            │                                                              │
//!            └──────────────────────────────────────────────────────────────┘
//!                         write_cursor += block_len  (once per block)
//! ```

mod dsp;
mod error;
mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::processor::{DelayProcessor, MAX_DELAY_SECONDS};
use nih_plug::prelude::*;
use params::DelayParams;

/// The main plugin struct.
///
/// Parameters live behind an `Arc` because the host, the UI and the audio
/// thread all read them. The [`DelayProcessor`] is touched only from
/// `initialize()`, `reset()` and `process()`, which nih-plug never runs
/// at the same time.
#[derive(Default)]
struct DopoDelay {
    params: Arc<DelayParams>,

    /// Ring buffer, write cursor and sample rate. Disabled (silent) until
    /// `initialize()` sizes it.
    processor: DelayProcessor,
}

impl Plugin for DopoDelay {
    const NAME: &'static str = "Dopo Delay";
    const VENDOR: &'static str = "Dopo Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo first so hosts pick it for ordinary tracks. Input and output
    // channel counts always match.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // The delay time is sampled once per block, so there is nothing to
    // gain from having the host split blocks at automation points.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Size the ring buffer for the host's sample rate and channel count.
    ///
    /// Called before playback and again after any rate or layout change.
    /// Returning `false` tells the host this configuration can't be used;
    /// the processor is left disabled and would only output silence.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let sample_rate = f64::from(buffer_config.sample_rate);
        let num_channels = audio_io_layout
            .main_output_channels
            .map_or(0, |c| c.get() as usize);
        let max_block_len = buffer_config.max_buffer_size as usize;

        let configured = self
            .processor
            .configure(sample_rate, num_channels)
            .and_then(|()| self.processor.ensure_block_fits(max_block_len));
        if let Err(err) = configured {
            nih_error!("Dopo Delay disabled: {err}");
            return false;
        }

        // The longest delay reads samples that sit just ahead of the
        // current block. If a block is longer than that gap, the start
        // of the read overlaps audio written in this very call.
        let headroom = self
            .processor
            .capacity()
            .saturating_sub(self.processor.delay_samples(MAX_DELAY_SECONDS));
        if max_block_len > headroom {
            nih_warn!(
                "Host blocks of {max_block_len} samples exceed the {headroom}-sample headroom; \
                 delays near {MAX_DELAY_SECONDS} s will be shortened by up to one block"
            );
        }

        nih_log!(
            "Delay buffer ready: {} channel(s) x {} samples at {} Hz",
            self.processor.channel_count(),
            self.processor.capacity(),
            sample_rate
        );

        true
    }

    /// Playback stopped or the plugin was bypassed: forget the history so
    /// the next start doesn't replay stale audio.
    fn reset(&mut self) {
        self.processor.reset();
    }

    /// Delay one host block in place.
    ///
    /// The parameter is read once here and passed down by value. It is an
    /// atomic inside nih-plug, so the audio thread never blocks on the UI.
    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let delay_seconds = self.params.delay_time.value();

        self.processor.process_block(buffer.as_slice(), delay_seconds);

        // Keep the host calling us for one delay period after the input
        // ends, otherwise the last echo is cut off.
        let tail_samples = self.processor.delay_samples(delay_seconds);
        ProcessStatus::Tail(u32::try_from(tail_samples).unwrap_or(u32::MAX))
    }
}

impl ClapPlugin for DopoDelay {
    const CLAP_ID: &'static str = "com.dopo-audio.dopo-delay";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A single-tap delay with one delay-time control");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for DopoDelay {
    // `*b"..."` turns the 16-character ASCII literal into `[u8; 16]`.
    const VST3_CLASS_ID: [u8; 16] = *b"DopoDelayPlugv01";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

nih_export_clap!(DopoDelay);
nih_export_vst3!(DopoDelay);

// AUv2 entry point for Logic Pro, generated from the CLAP export.
clap_wrapper::export_auv2!();
