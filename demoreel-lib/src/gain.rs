//! Per-track gain planning from loudness estimates.

use crate::constants::{MAX_GAIN, MIN_GAIN, TARGET_RMS};

/// Gain multiplier for a track with estimated loudness `rms`.
///
/// With normalization disabled the gain is exactly `1.0`. Silent tracks
/// (`rms == 0`, or a non-finite estimate) are never boosted and also get
/// `1.0`. Otherwise the gain is `TARGET_RMS / rms` clamped to
/// `[MIN_GAIN, MAX_GAIN]`.
pub fn plan_gain(rms: f32, normalize: bool) -> f32 {
    if !normalize || !rms.is_finite() || rms <= 0.0 {
        return 1.0;
    }
    (TARGET_RMS / rms).clamp(MIN_GAIN, MAX_GAIN)
}

/// Gains for a list of loudness estimates, in the same order.
pub fn plan_gains(loudness: &[f32], normalize: bool) -> Vec<f32> {
    loudness.iter().map(|&rms| plan_gain(rms, normalize)).collect()
}
