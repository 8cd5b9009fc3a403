//! # Delay Engine
//!
//! Turns one input block into one output block. Per block:
//!
//! 1. Feed the user's delay time into a linear ramp (nih-plug's
//!    [`Smoother`], stepped once per block) and convert the
//!    smoothed time to a whole number of samples, clamped to
//!    `[1, capacity]`.
//! 2. If that length differs from the previous block's, stretch or
//!    squeeze the delayed span of every channel to the new length (see
//!    [`resample`](super::resample)). This is a batch pass and finishes
//!    before any sample is mixed.
//! 3. Run the per-sample loop:
//!
//! ```text
//! delayed  = store[head - delay]
//! store[head] = dry + delayed * feedback
//! out      = (dry * (1 - mix) + delayed * mix) * gain
//! head    += 1
//! ```
//!
//! Feedback is deliberately not clamped. At `feedback >= 1.0` every echo is
//! at least as loud as the one before and the signal grows without bound.
//! That is the user's call to make.
//!
//! ## Real-time contract
//!
//! [`prepare`](DelayEngine::prepare) and [`release`](DelayEngine::release)
//! allocate and log; they run off the audio thread. [`process`](DelayEngine::process)
//! and [`reset`](DelayEngine::reset) never allocate, lock or log.

use nih_plug::prelude::{Enum, Smoother, SmoothingStyle};
use nih_plug::{nih_debug_assert, nih_debug_assert_failure, nih_log};
use thiserror::Error;

use super::delay_store::DelayStore;
use super::resample::ResampleMode;

/// One block's worth of parameter values, read once from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayParams {
    /// Output gain, 0..1.
    pub gain: f32,
    /// Amount of the delayed signal written back into the store.
    pub feedback: f32,
    /// 0 = fully dry, 1 = fully wet.
    pub mix: f32,
    /// Requested delay time in seconds, before smoothing.
    pub time_seconds: f32,
    /// `false` bypasses the effect.
    pub enabled: bool,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            gain: 1.0,
            feedback: 0.35,
            mix: 0.5,
            time_seconds: 0.3,
            enabled: true,
        }
    }
}

/// What the store does while the effect is bypassed.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BypassBehavior {
    /// Keep recording the dry signal and advancing the write heads, so
    /// re-enabling picks up with a full, current buffer.
    #[default]
    #[id = "keep-writing"]
    #[name = "Keep Writing"]
    KeepWriting,
    /// Leave the store and write heads untouched.
    #[id = "freeze"]
    #[name = "Freeze"]
    Freeze,
}

/// Fixed per-engine settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Longest supported delay. Sets the store capacity at prepare time.
    pub max_delay_seconds: f32,
    /// Length of the delay time ramp. The smoother advances one step per
    /// block, with `round(seconds * sample_rate)` steps per ramp.
    pub time_smoothing_seconds: f32,
    /// How content is carried over when the delay length changes.
    pub resample: ResampleMode,
    pub bypass: BypassBehavior,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_delay_seconds: 2.0,
            time_smoothing_seconds: 0.001,
            resample: ResampleMode::Cubic,
            bypass: BypassBehavior::KeepWriting,
        }
    }
}

/// Configuration problems caught by [`DelayEngine::prepare`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum PrepareError {
    #[error("sample rate must be positive and finite, got {0} Hz")]
    InvalidSampleRate(f32),
    #[error("maximum delay time must be positive and finite, got {0} s")]
    InvalidMaxDelay(f32),
    #[error("at least one channel is required")]
    NoChannels,
    #[error("maximum block size must be at least one sample")]
    ZeroBlockSize,
    #[error("{max_delay_seconds} s at {sample_rate} Hz rounds to a zero-sample delay store")]
    ZeroCapacity {
        max_delay_seconds: f32,
        sample_rate: f32,
    },
}

/// A variable-length feedback delay over a [`DelayStore`].
pub struct DelayEngine {
    config: EngineConfig,

    store: DelayStore,

    /// Holds one channel's new span during a resample pass. Sized to the
    /// store capacity so the pass never allocates.
    scratch: Vec<f32>,

    /// One write position per channel, always in `[0, capacity)`.
    write_heads: Vec<usize>,

    sample_rate: f32,
    max_block_size: usize,

    /// Glides the delay time in seconds. `set_target()` restarts the ramp,
    /// so it is only called when the requested time actually changes.
    time_smoother: Smoother<f32>,
    /// The last time handed to the smoother.
    time_target: f32,

    /// Cleared by prepare/reset. The first block after that snaps the
    /// smoother to the requested time instead of gliding to it.
    primed: bool,

    /// Delay length used by the most recent block.
    current_delay: usize,
    /// Delay length as of the end of the previous block.
    previous_delay: usize,

    prepared: bool,
}

impl DelayEngine {
    /// Create an engine. Nothing is allocated until [`prepare`](Self::prepare).
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            store: DelayStore::new(0, 1),
            scratch: Vec::new(),
            write_heads: Vec::new(),
            sample_rate: 0.0,
            max_block_size: 0,
            time_smoother: Smoother::new(SmoothingStyle::Linear(
                config.time_smoothing_seconds * 1000.0,
            )),
            time_target: 0.0,
            primed: false,
            current_delay: 1,
            previous_delay: 1,
            prepared: false,
        }
    }

    /// Allocate and clear the store for a new sample rate and channel
    /// count, and reset the smoother and write heads.
    ///
    /// On error the engine stays unprepared and `process` leaves audio
    /// untouched until a later `prepare` succeeds.
    pub fn prepare(
        &mut self,
        sample_rate: f32,
        num_channels: usize,
        max_block_size: usize,
    ) -> Result<(), PrepareError> {
        self.prepared = false;

        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(PrepareError::InvalidSampleRate(sample_rate));
        }
        let max_delay_seconds = self.config.max_delay_seconds;
        if !max_delay_seconds.is_finite() || max_delay_seconds <= 0.0 {
            return Err(PrepareError::InvalidMaxDelay(max_delay_seconds));
        }
        if num_channels == 0 {
            return Err(PrepareError::NoChannels);
        }
        if max_block_size == 0 {
            return Err(PrepareError::ZeroBlockSize);
        }

        let capacity = (max_delay_seconds * sample_rate).round() as usize;
        if capacity == 0 {
            return Err(PrepareError::ZeroCapacity {
                max_delay_seconds,
                sample_rate,
            });
        }

        self.store.resize(num_channels, capacity);
        self.scratch = vec![0.0; capacity];
        self.write_heads = vec![0; num_channels];
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.primed = false;
        self.current_delay = 1;
        self.previous_delay = 1;
        self.prepared = true;

        nih_log!(
            "Delay engine prepared: {num_channels} channel(s), {capacity} samples at {sample_rate} Hz, {:?} resampling",
            self.config.resample
        );

        Ok(())
    }

    /// Stop processing and free the store.
    pub fn release(&mut self) {
        self.prepared = false;
        self.store = DelayStore::new(0, 1);
        self.scratch = Vec::new();
        self.write_heads = Vec::new();

        nih_log!("Delay engine released");
    }

    /// Silence the store and rewind the write heads without reallocating.
    pub fn reset(&mut self) {
        self.store.clear();
        self.write_heads.fill(0);
        self.primed = false;
    }

    /// Process one block in place. `block` holds one slice per channel;
    /// the block length is the shortest slice.
    pub fn process(&mut self, block: &mut [&mut [f32]], params: &DelayParams) {
        if !self.prepared {
            nih_debug_assert_failure!("process() called on an unprepared delay engine");
            return;
        }

        let num_samples = block.iter().map(|channel| channel.len()).min().unwrap_or(0);
        nih_debug_assert!(num_samples <= self.max_block_size);
        nih_debug_assert!(block.len() <= self.store.channel_count());
        let num_channels = block.len().min(self.store.channel_count());
        let block = &mut block[..num_channels];

        if !params.enabled {
            self.bypass(block, num_samples);
            return;
        }

        let delay = self.next_delay_samples(params.time_seconds);

        if delay != self.previous_delay {
            let mode = self.config.resample;
            for channel in 0..self.store.channel_count() {
                mode.resample(
                    &mut self.store,
                    channel,
                    self.write_heads[channel],
                    self.previous_delay,
                    delay,
                    &mut self.scratch,
                );
            }
        }
        self.current_delay = delay;

        let DelayParams {
            gain,
            feedback,
            mix,
            ..
        } = *params;
        let capacity = self.store.capacity();
        let offset = delay as isize;

        for (channel, samples) in block.iter_mut().enumerate() {
            let mut head = self.write_heads[channel];

            for sample in samples[..num_samples].iter_mut() {
                let dry = *sample;
                let delayed = self.store.read(channel, head as isize - offset);
                self.store.write(channel, head as isize, dry + delayed * feedback);
                *sample = (dry * (1.0 - mix) + delayed * mix) * gain;
                head = (head + 1) % capacity;
            }

            self.write_heads[channel] = head;
        }

        self.previous_delay = delay;
    }

    /// Output equals input. Depending on the bypass behavior the dry
    /// signal is still recorded.
    fn bypass(&mut self, block: &[&mut [f32]], num_samples: usize) {
        if self.config.bypass == BypassBehavior::Freeze {
            return;
        }

        let capacity = self.store.capacity();
        for (channel, samples) in block.iter().enumerate() {
            let mut head = self.write_heads[channel];
            for &dry in &samples[..num_samples] {
                self.store.write(channel, head as isize, dry);
                head = (head + 1) % capacity;
            }
            self.write_heads[channel] = head;
        }
    }

    /// Advance the smoother by one block and return the delay length.
    fn next_delay_samples(&mut self, time_seconds: f32) -> usize {
        if !self.primed {
            self.time_smoother.reset(time_seconds);
            self.time_target = time_seconds;
            let delay = self.seconds_to_samples(time_seconds);
            self.previous_delay = delay;
            self.primed = true;
            return delay;
        }

        if time_seconds != self.time_target {
            self.time_target = time_seconds;
            self.time_smoother.set_target(self.sample_rate, time_seconds);
        }
        let smoothed = self.time_smoother.next();
        self.seconds_to_samples(smoothed)
    }

    /// Round to whole samples and clamp to `[1, capacity]`. Non-finite
    /// and non-positive times land on 1.
    fn seconds_to_samples(&self, seconds: f32) -> usize {
        let samples = (seconds * self.sample_rate).round();
        if samples >= 1.0 {
            (samples as usize).min(self.store.capacity())
        } else {
            1
        }
    }

    /// How long the echoes take to fall below -60 dB at the current delay
    /// length, in samples. `None` when `feedback >= 1.0`: the tail never
    /// decays.
    pub fn tail_samples(&self, feedback: f32) -> Option<u32> {
        let feedback = feedback.abs();
        let delay = self.current_delay as f32;

        if feedback >= 1.0 {
            None
        } else if feedback > 0.001 {
            // feedback^N = 0.001  =>  N = -3 / log10(feedback)
            let repeats = -3.0 / feedback.log10();
            Some((repeats * delay) as u32)
        } else {
            Some(delay as u32)
        }
    }
}

/// Read-only views used by the tests.
#[cfg(test)]
impl DelayEngine {
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Store capacity in samples (the longest possible delay).
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn current_delay_samples(&self) -> usize {
        self.current_delay
    }

    pub fn previous_delay_samples(&self) -> usize {
        self.previous_delay
    }

    pub fn write_head(&self, channel: usize) -> usize {
        self.write_heads[channel]
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
