//! Loudness estimation.
//!
//! This is a coarse loudness proxy, not a calibrated measurement: it is the
//! RMS of the first channel only, sampled every [`LOUDNESS_STRIDE`]th frame
//! to keep analysis of long sources cheap. It is neither LUFS nor an exact
//! RMS of the whole signal.

use crate::audio::SampleBuffer;
use crate::constants::LOUDNESS_STRIDE;

/// Estimate `sqrt(mean(sample^2))` over every 4th frame of channel 0.
///
/// Returns `0.0` for empty buffers.
pub fn estimate_rms(buffer: &SampleBuffer) -> f32 {
    let Some(samples) = buffer.channel(0) else {
        return 0.0;
    };

    let mut sum = 0.0_f64;
    let mut count = 0_usize;
    for &sample in samples.iter().step_by(LOUDNESS_STRIDE) {
        sum += f64::from(sample) * f64::from(sample);
        count += 1;
    }

    if count == 0 {
        return 0.0;
    }
    (sum / count as f64).sqrt() as f32
}
