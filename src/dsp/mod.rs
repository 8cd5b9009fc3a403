//! # DSP Core
//!
//! - **`delay_store`**: per-channel ring buffer. All wraparound
//!   arithmetic lives here.
//! - **`interpolation`**: linear and cubic point interpolation.
//! - **`resample`**: the strategies for carrying buffer content across a
//!   delay length change (off, linear, cubic).
//! - **`engine`**: the block processor tying the above together, with
//!   the delay time glided by nih-plug's `Smoother`.

pub mod delay_store;
pub mod engine;
pub mod interpolation;
pub mod resample;
