//! # Delay Store (Multi-Channel Ring Buffer)
//!
//! The delay store keeps the last `capacity` samples of every channel.
//! Think of it as one circular tape loop per channel: positions run from
//! `0` to `capacity - 1` and then wrap back to `0`.
//!
//! ## Position Normalization
//!
//! Every position handed to [`DelayStore::read`] or [`DelayStore::write`]
//! is a signed, *unwrapped* position. The engine computes read positions
//! as `write_head - delay`, which is negative whenever the write head is
//! near the start of the buffer. Rust's `%` keeps the sign of the left
//! operand, so `-3 % 10 == -3`. We use `rem_euclid` instead, which always
//! lands in `[0, capacity)`:
//!
//! ```text
//! (-3).rem_euclid(10) == 7
//! ```
//!
//! That is the same as `((position % capacity) + capacity) % capacity`,
//! and it is the only place in the crate where wraparound happens.

/// A fixed-capacity circular sample buffer, one lane per channel.
///
/// Allocation happens only in [`new`](Self::new) and
/// [`resize`](Self::resize), both of which run during the prepare phase.
/// Reads and writes never allocate.
pub struct DelayStore {
    /// `channels[channel][position]`. Every lane has exactly `capacity`
    /// samples.
    channels: Vec<Vec<f32>>,

    /// Lane length in samples, cached for the modulo arithmetic.
    capacity: usize,
}

impl DelayStore {
    /// Create a zero-filled store.
    ///
    /// `capacity` must be non-zero; the engine rejects a zero capacity
    /// before it gets here.
    pub fn new(channel_count: usize, capacity: usize) -> Self {
        debug_assert!(capacity > 0, "delay store capacity must be > 0");

        Self {
            channels: vec![vec![0.0; capacity]; channel_count],
            capacity,
        }
    }

    /// Number of channel lanes.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Lane length in samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Map any signed position onto a valid lane index.
    #[inline]
    pub fn wrap(&self, position: isize) -> usize {
        position.rem_euclid(self.capacity as isize) as usize
    }

    /// Store `value` at `position mod capacity` in `channel`'s lane.
    ///
    /// `channel` must be `< channel_count()`. This is a caller contract;
    /// the slice index panics if it is violated.
    #[inline]
    pub fn write(&mut self, channel: usize, position: isize, value: f32) {
        let index = self.wrap(position);
        self.channels[channel][index] = value;
    }

    /// Read the sample at `position mod capacity` in `channel`'s lane.
    #[inline]
    pub fn read(&self, channel: usize, position: isize) -> f32 {
        self.channels[channel][self.wrap(position)]
    }

    /// Zero-fill every lane.
    pub fn clear(&mut self) {
        for lane in &mut self.channels {
            lane.fill(0.0);
        }
    }

    /// Reallocate to a new shape and clear.
    ///
    /// Only legal while audio processing is halted: this allocates.
    pub fn resize(&mut self, channel_count: usize, capacity: usize) {
        debug_assert!(capacity > 0, "delay store capacity must be > 0");

        self.channels = vec![vec![0.0; capacity]; channel_count];
        self.capacity = capacity;
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read_exact() {
        let mut store = DelayStore::new(2, 100);

        store.write(0, 5, 0.75);
        store.write(1, 5, -0.25);

        assert!((store.read(0, 5) - 0.75).abs() < 1e-6);
        assert!((store.read(1, 5) + 0.25).abs() < 1e-6);
    }

    /// Writing `capacity + k` samples leaves the last lap's value at `k`.
    #[test]
    fn test_wrapping() {
        let capacity = 8;
        let k = 3;
        let mut store = DelayStore::new(1, capacity);

        for i in 0..(capacity + k) {
            store.write(0, i as isize, i as f32);
        }

        // Raw positions 0..capacity+k were written, so slots 0..k hold the
        // second lap and slots k..capacity still hold the first.
        for slot in 0..k {
            let expected = (slot + capacity) as f32;
            assert!((store.read(0, slot as isize) - expected).abs() < 1e-6);
        }
        assert!((store.read(0, k as isize) - k as f32).abs() < 1e-6);

        // Reading through an unwrapped position hits the same slot.
        assert!((store.read(0, (k + capacity) as isize) - k as f32).abs() < 1e-6);
    }

    /// Negative positions are normalized, not truncated toward zero.
    #[test]
    fn test_negative_positions() {
        let mut store = DelayStore::new(1, 10);
        store.write(0, 7, 1.5);

        assert_eq!(store.wrap(-3), 7);
        assert_eq!(store.wrap(-13), 7);
        assert_eq!(store.wrap(-10), 0);
        assert!((store.read(0, -3) - 1.5).abs() < 1e-6);

        store.write(0, -1, 2.0);
        assert!((store.read(0, 9) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut store = DelayStore::new(2, 4);
        store.write(0, 1, 1.0);

        assert!(store.read(1, 1).abs() < 1e-6);
    }

    #[test]
    fn test_clear() {
        let mut store = DelayStore::new(2, 10);
        for pos in 0..10 {
            store.write(0, pos, 0.5);
            store.write(1, pos, -0.5);
        }

        store.clear();

        for pos in 0..10 {
            assert!(store.read(0, pos).abs() < 1e-6);
            assert!(store.read(1, pos).abs() < 1e-6);
        }
    }

    #[test]
    fn test_resize_reshapes_and_clears() {
        let mut store = DelayStore::new(1, 4);
        store.write(0, 2, 1.0);

        store.resize(3, 16);

        assert_eq!(store.channel_count(), 3);
        assert_eq!(store.capacity(), 16);
        for channel in 0..3 {
            for pos in 0..16 {
                assert!(store.read(channel, pos).abs() < 1e-6);
            }
        }
        assert_eq!(store.wrap(16), 0);
    }
}
