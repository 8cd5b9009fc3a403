//! # Point Interpolation
//!
//! When the delay length changes, the resample pass has to read the old
//! buffer content at fractional positions (e.g. slot 12.37). These
//! kernels estimate the signal between stored samples.
//!
//! ## Linear
//!
//! ```text
//! y = y0 + t * (y1 - y0)
//! ```
//!
//! Cheap, but it acts as a gentle lowpass: every resample pass smears a
//! little high-frequency content, and repeated passes during a sweep add up.
//!
//! ## Cubic Hermite (Catmull-Rom)
//!
//! Uses four neighbours `y[-1], y[0], y[1], y[2]` and fits a cubic that
//! passes through `y[0]` and `y[1]` with slopes estimated from the outer
//! points. It reproduces straight lines exactly and keeps much more of the
//! top end than linear interpolation.

/// Linear interpolation between `y0` (t = 0) and `y1` (t = 1).
#[inline]
pub fn linear(y0: f32, y1: f32, t: f32) -> f32 {
    y0 + t * (y1 - y0)
}

/// 4-point cubic Hermite interpolation between `y0` (t = 0) and `y1` (t = 1).
#[inline]
pub fn cubic_hermite(y_m1: f32, y0: f32, y1: f32, y2: f32, t: f32) -> f32 {
    let c0 = y0;
    let c1 = 0.5 * (y1 - y_m1);
    let c2 = y_m1 - 2.5 * y0 + 2.0 * y1 - 0.5 * y2;
    let c3 = 0.5 * (y2 - y_m1) + 1.5 * (y0 - y1);

    ((c3 * t + c2) * t + c1) * t + c0
}
