//! # Elastic Delay — An AU/VST3/CLAP Variable-Length Delay
//!
//! A feedback delay built with [nih-plug](https://github.com/robbert-vdh/nih-plug)
//! whose delay time can be swept freely during playback. Instead of moving
//! a read head through a fixed buffer (which clicks or warbles), every
//! change of delay length stretches the buffered audio to the new length
//! before the block is mixed.
//!
//! ## Signal Flow
//!
//! ```text
//! Input ──┬──────────────────────────────────────── × (1 - mix) ───┐
//!         │                                                        │
//!         │    ┌─────────────── FEEDBACK LOOP ──────────────┐      │
//!         │    │                                            │      │
//!         └──►(+)──► [Delay Store] ──► delayed ── × feedback┘      │
//!                     ▲   (resampled when                          │
//!                     │    the length changes)                     │
//!              time ──┴─ [Ramp Smoother]                           │
//!                                     delayed ── × mix ──────────►(+)──► × gain ──► Output
//! ```
//!
//! The plugin shell here only translates between nih-plug and the engine:
//! `initialize()` prepares it, `process()` hands it a parameter snapshot and
//! the host's buffer, `deactivate()` releases it.

mod dsp;
mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use dsp::engine::{DelayEngine, EngineConfig};
use nih_plug::prelude::*;
use params::PluginParams;

/// The main plugin struct.
///
/// Parameters are shared with the host through `Arc` and may be changed
/// from the UI or automation threads at any time. The engine is owned
/// exclusively by the audio thread and only sees one snapshot of the
/// parameters per block, so no locking is needed.
struct ElasticDelay {
    params: Arc<PluginParams>,
    engine: DelayEngine,
}

impl Default for ElasticDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(PluginParams::default()),
            // Allocation waits for initialize(), once the sample rate and
            // channel count are known.
            engine: DelayEngine::new(EngineConfig::default()),
        }
    }
}

impl Plugin for ElasticDelay {
    const NAME: &'static str = "Elastic Delay";
    const VENDOR: &'static str = "Elastic Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo first, mono as fallback. Input and output always match.
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

    // The engine reads parameters once per block, so splitting blocks at
    // automation points keeps its snapshots close to the host's timeline.
    const SAMPLE_ACCURATE_AUTOMATION: bool = true;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Allocate the delay store for the host's sample rate and channel
    /// count. Returning `false` makes the host reject this configuration.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let num_channels = audio_io_layout
            .main_input_channels
            .map(|c| c.get() as usize)
            .unwrap_or(2);

        // Resampling and bypass behavior are fixed per engine, so a fresh
        // one is built from the current choices before allocating.
        self.engine = DelayEngine::new(self.params.engine_config());

        match self.engine.prepare(
            buffer_config.sample_rate,
            num_channels,
            buffer_config.max_buffer_size as usize,
        ) {
            Ok(()) => true,
            Err(err) => {
                nih_error!("Cannot initialize {}: {err}", Self::NAME);
                false
            }
        }
    }

    /// Called when playback stops or restarts. Old echoes must not bleed
    /// into the next playback.
    fn reset(&mut self) {
        self.engine.reset();
    }

    fn deactivate(&mut self) {
        self.engine.release();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let params = self.params.snapshot();
        self.engine.process(buffer.as_slice(), &params);

        // Keep the host calling process() after the input goes silent
        // until the echoes have decayed to -60 dB. While bypassed there is
        // nothing to ring out. Feedback at or above 100% never decays.
        if !params.enabled {
            return ProcessStatus::Normal;
        }
        match self.engine.tail_samples(params.feedback) {
            Some(tail) => ProcessStatus::Tail(tail),
            None => ProcessStatus::KeepAlive,
        }
    }
}

impl ClapPlugin for ElasticDelay {
    const CLAP_ID: &'static str = "com.elastic-audio.elastic-delay";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A feedback delay that resamples its buffer when the delay time changes");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for ElasticDelay {
    const VST3_CLASS_ID: [u8; 16] = *b"ElasticDelay_v01";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

nih_export_clap!(ElasticDelay);
nih_export_vst3!(ElasticDelay);

// AUv2 entry point for Logic Pro, generated from the CLAP export.
clap_wrapper::export_auv2!();
