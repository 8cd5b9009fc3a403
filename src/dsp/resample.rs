//! # Resample-on-Change
//!
//! The delayed signal is the span of the store that sits between
//! `write_head - delay` (oldest, read next) and `write_head - 1` (newest).
//! When the delay length changes from `D1` to `D2`, the read head would
//! jump to a different point in history and the output would click.
//!
//! Instead, the span is *stretched* (or squeezed) so that the new span of
//! `D2` slots covers the same stretch of history the old `D1` slots did:
//!
//! ```text
//! old span:  [o0 o1 o2 o3 o4 o5]                 D1 = 6
//! new span:  [o0 .. o1 .. o2 .. o3 .. o4 .. o5]  D2 = 11, ratio = 5/10
//! ```
//!
//! New slot `k` takes old position `k * (D1 - 1) / (D2 - 1)`, so the
//! oldest and newest samples stay pinned to the ends of the span. The
//! next sample the engine reads is still `o0`, so the output continues
//! without a step; the stretched content then plays back slightly
//! pitch-shifted until fresh audio reaches the read head.
//!
//! The pass reads through a scratch buffer because old and new spans
//! overlap in the store.

use nih_plug::prelude::Enum;

use super::delay_store::DelayStore;
use super::interpolation;

/// How buffer content is carried across a delay length change.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleMode {
    /// Plain ring buffer. The read head jumps; the content is untouched.
    #[id = "off"]
    #[name = "Off"]
    Off,
    /// Stretch the span with 2-point linear interpolation.
    #[id = "linear"]
    #[name = "Linear"]
    Linear,
    /// Stretch the span with 4-point cubic Hermite interpolation.
    #[default]
    #[id = "cubic"]
    #[name = "Cubic"]
    Cubic,
}

impl ResampleMode {
    /// Re-index one channel's delayed span from `initial_len` to
    /// `target_len` samples, relative to `write_head`.
    ///
    /// `scratch` must hold at least `target_len` samples. Returns `false`
    /// when nothing was done: resampling is off, the lengths are equal,
    /// or either length is zero.
    pub fn resample(
        self,
        store: &mut DelayStore,
        channel: usize,
        write_head: usize,
        initial_len: usize,
        target_len: usize,
        scratch: &mut [f32],
    ) -> bool {
        if self == ResampleMode::Off
            || initial_len == target_len
            || initial_len == 0
            || target_len == 0
        {
            return false;
        }

        let initial_len = initial_len.min(store.capacity());
        let target_len = target_len.min(store.capacity());
        debug_assert!(scratch.len() >= target_len);
        let scratch = &mut scratch[..target_len];

        let head = write_head as isize;
        let old_start = head - initial_len as isize;
        let new_start = head - target_len as isize;
        let last = (initial_len - 1) as f64;

        // A one-sample span only has a newest sample to keep.
        let ratio = if target_len > 1 {
            last / (target_len - 1) as f64
        } else {
            0.0
        };

        for (k, slot) in scratch.iter_mut().enumerate() {
            let source = if target_len > 1 { k as f64 * ratio } else { last };
            *slot = self.sample_span(store, channel, old_start, initial_len, source.min(last));
        }

        for (k, &value) in scratch.iter().enumerate() {
            store.write(channel, new_start + k as isize, value);
        }

        true
    }

    /// Read the old span at fractional `source` (0 = oldest). Neighbours
    /// outside the span are extrapolated from its two edge samples, which
    /// keeps straight segments straight up to the ends.
    fn sample_span(
        self,
        store: &DelayStore,
        channel: usize,
        start: isize,
        len: usize,
        source: f64,
    ) -> f32 {
        let last = len as isize - 1;
        let index = source.floor() as isize;
        let t = (source - index as f64) as f32;
        let read = |i: isize| store.read(channel, start + i);
        let at = |i: isize| {
            if last == 0 {
                read(0)
            } else if i < 0 {
                read(0) + i as f32 * (read(1) - read(0))
            } else if i > last {
                read(last) + (i - last) as f32 * (read(last) - read(last - 1))
            } else {
                read(i)
            }
        };

        match self {
            ResampleMode::Off => at(index),
            ResampleMode::Linear => interpolation::linear(at(index), at(index + 1), t),
            ResampleMode::Cubic => interpolation::cubic_hermite(
                at(index - 1),
                at(index),
                at(index + 1),
                at(index + 2),
                t,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fill `len` slots behind `write_head` with a ramp: oldest = 0.0,
    /// newest = len - 1.
    fn ramp_store(capacity: usize, write_head: usize, len: usize) -> DelayStore {
        let mut store = DelayStore::new(1, capacity);
        let start = write_head as isize - len as isize;
        for k in 0..len {
            store.write(0, start + k as isize, k as f32);
        }
        store
    }

    fn span(store: &DelayStore, write_head: usize, len: usize) -> Vec<f32> {
        let start = write_head as isize - len as isize;
        (0..len).map(|k| store.read(0, start + k as isize)).collect()
    }

    #[test]
    fn test_equal_lengths_leave_content_bit_identical() {
        let mut store = ramp_store(32, 5, 20);
        let before: Vec<u32> = (0..32).map(|p| store.read(0, p).to_bits()).collect();
        let mut scratch = vec![0.0; 32];

        for mode in [ResampleMode::Off, ResampleMode::Linear, ResampleMode::Cubic] {
            assert!(!mode.resample(&mut store, 0, 5, 20, 20, &mut scratch));
        }

        let after: Vec<u32> = (0..32).map(|p| store.read(0, p).to_bits()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_zero_lengths_are_skipped() {
        let mut store = ramp_store(16, 0, 8);
        let mut scratch = vec![0.0; 16];

        assert!(!ResampleMode::Cubic.resample(&mut store, 0, 0, 0, 8, &mut scratch));
        assert!(!ResampleMode::Cubic.resample(&mut store, 0, 0, 8, 0, &mut scratch));
    }

    #[test]
    fn test_off_never_touches_the_store() {
        let mut store = ramp_store(16, 3, 8);
        let before = span(&store, 3, 16);
        let mut scratch = vec![0.0; 16];

        assert!(!ResampleMode::Off.resample(&mut store, 0, 3, 8, 12, &mut scratch));
        assert_eq!(before, span(&store, 3, 16));
    }

    /// Stretching a ramp keeps both ends and stays a straight line.
    #[test]
    fn test_stretch_keeps_endpoints() {
        for mode in [ResampleMode::Linear, ResampleMode::Cubic] {
            // The write head sits near the start so the span wraps.
            let mut store = ramp_store(64, 4, 11);
            let mut scratch = vec![0.0; 64];

            assert!(mode.resample(&mut store, 0, 4, 11, 21, &mut scratch));

            let out = span(&store, 4, 21);
            for (k, value) in out.iter().enumerate() {
                let expected = k as f32 * 0.5;
                assert!(
                    (value - expected).abs() < 1e-4,
                    "{mode:?} slot {k}: expected {expected}, got {value}"
                );
            }
        }
    }

    #[test]
    fn test_squeeze_keeps_endpoints() {
        for mode in [ResampleMode::Linear, ResampleMode::Cubic] {
            let mut store = ramp_store(64, 30, 21);
            let mut scratch = vec![0.0; 64];

            assert!(mode.resample(&mut store, 0, 30, 21, 11, &mut scratch));

            let out = span(&store, 30, 11);
            assert!(out[0].abs() < 1e-5);
            assert!((out[10] - 20.0).abs() < 1e-4);
            for (k, value) in out.iter().enumerate() {
                assert!((value - 2.0 * k as f32).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_single_sample_target_keeps_newest() {
        let mut store = ramp_store(16, 8, 5);
        let mut scratch = vec![0.0; 16];

        assert!(ResampleMode::Cubic.resample(&mut store, 0, 8, 5, 1, &mut scratch));
        assert!((store.read(0, 7) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_sample_source_fills_the_span() {
        let mut store = DelayStore::new(1, 16);
        store.write(0, 2, 0.5);
        let mut scratch = vec![0.0; 16];

        assert!(ResampleMode::Linear.resample(&mut store, 0, 3, 1, 4, &mut scratch));
        for value in span(&store, 3, 4) {
            assert!((value - 0.5).abs() < 1e-6);
        }
    }

    /// Channels other than the one being resampled are left alone.
    #[test]
    fn test_only_the_given_channel_changes() {
        let mut store = DelayStore::new(2, 32);
        for p in 0..32 {
            store.write(0, p, p as f32);
            store.write(1, p, -(p as f32));
        }
        let mut scratch = vec![0.0; 32];

        ResampleMode::Cubic.resample(&mut store, 0, 10, 8, 16, &mut scratch);

        for p in 0..32 {
            assert!((store.read(1, p) + p as f32).abs() < 1e-6);
        }
    }
}
