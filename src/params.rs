//! # Plugin Parameters
//!
//! The host owns these values; the engine only ever sees a
//! [`DelayParams`] snapshot taken once per block. The `#[id]` strings are
//! the persistence keys nih-plug uses for presets and session state, so
//! they must never change once published.
//!
//! None of the parameters carry a host-side smoother. Delay time is
//! smoothed by the engine itself (a jump in delay length is handled by a
//! resample pass, not by ramping the read position), and gain, feedback
//! and mix are read as block snapshots.

use nih_plug::prelude::*;

use crate::dsp::engine::{BypassBehavior, DelayParams, EngineConfig};
use crate::dsp::resample::ResampleMode;

/// All user-facing parameters.
#[derive(Params)]
pub struct PluginParams {
    /// **Gain**: output level applied after the dry/wet mix.
    #[id = "gain"]
    pub gain: FloatParam,

    /// **Feedback**: how much of the delayed signal is written back.
    ///
    /// The full 0..100% range is exposed. At 100% the repeats never decay,
    /// and with host automation beyond that they grow.
    #[id = "feedback"]
    pub feedback: FloatParam,

    /// **Dry / Mix**: 0% is the untouched input, 100% only the echoes.
    #[id = "mix"]
    pub mix: FloatParam,

    /// **Time**: the delay length, 4 ms to 2 s.
    ///
    /// Skewed toward the low end, where small changes are audible.
    #[id = "time"]
    pub time: FloatParam,

    /// **On / Off**: when off, audio passes through untouched.
    #[id = "toggle"]
    pub enabled: BoolParam,

    /// **Resampling**: how the buffered echoes follow a delay time change.
    ///
    /// Fixed for the lifetime of the engine, so it is not automatable and
    /// only takes effect the next time the host initializes the plugin.
    #[id = "resample"]
    pub resample: EnumParam<ResampleMode>,

    /// **Bypass Mode**: whether the delay keeps recording while switched
    /// off. Like resampling, read at initialization only.
    #[id = "bypass_mode"]
    pub bypass_behavior: EnumParam<BypassBehavior>,
}

impl PluginParams {
    /// Read the current values for one block.
    pub fn snapshot(&self) -> DelayParams {
        DelayParams {
            gain: self.gain.value(),
            feedback: self.feedback.value(),
            mix: self.mix.value(),
            time_seconds: self.time.value() / 1000.0,
            enabled: self.enabled.value(),
        }
    }

    /// The engine settings chosen by the user, on top of the defaults.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            resample: self.resample.value(),
            bypass: self.bypass_behavior.value(),
            ..EngineConfig::default()
        }
    }
}

impl Default for PluginParams {
    fn default() -> Self {
        Self {
            gain: FloatParam::new("Gain", 1.0, FloatRange::Linear { min: 0.0, max: 1.0 })
                .with_unit("%")
                .with_value_to_string(formatters::v2s_f32_percentage(1))
                .with_string_to_value(formatters::s2v_f32_percentage()),

            feedback: FloatParam::new(
                "Feedback",
                0.35,
                FloatRange::Linear { min: 0.0, max: 1.0 },
            )
            .with_unit("%")
            .with_value_to_string(formatters::v2s_f32_percentage(1))
            .with_string_to_value(formatters::s2v_f32_percentage()),

            mix: FloatParam::new("Dry / Mix", 0.5, FloatRange::Linear { min: 0.0, max: 1.0 })
                .with_unit("%")
                .with_value_to_string(formatters::v2s_f32_percentage(1))
                .with_string_to_value(formatters::s2v_f32_percentage()),

            time: FloatParam::new(
                "Time",
                300.0,
                FloatRange::Skewed {
                    min: 4.0,
                    max: 2000.0,
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_unit(" ms")
            .with_step_size(0.1),

            enabled: BoolParam::new("On / Off", true),

            resample: EnumParam::new("Resampling", ResampleMode::Cubic).non_automatable(),

            bypass_behavior: EnumParam::new("Bypass Mode", BypassBehavior::KeepWriting)
                .non_automatable(),
        }
    }
}
