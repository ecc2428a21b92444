//! Feed-forward soft-knee compressor for the mastering bus.
//!
//! Detection is linked across channels: the per-frame peak of all channels
//! drives one gain value that is applied to every channel, so the stereo
//! image does not shift under gain reduction.

use crate::audio::SampleBuffer;
use crate::settings::MasteringBusConfig;

use super::level::{db_to_linear, linear_to_db};

/// Compressor with runtime state for a single offline pass.
#[derive(Debug, Clone)]
pub struct MasteringCompressor {
    threshold_db: f32,
    knee_db: f32,
    ratio: f32,
    attack_coeff: f32,
    release_coeff: f32,
    current_gain_db: f32,
}

impl MasteringCompressor {
    /// Build a compressor for `sample_rate` from a (possibly unsanitized) config.
    pub fn new(config: &MasteringBusConfig, sample_rate: u32) -> Self {
        let config = config.sanitized();
        Self {
            threshold_db: config.threshold_db,
            knee_db: config.knee_db,
            ratio: config.ratio,
            attack_coeff: time_to_coeff(config.attack_seconds, sample_rate),
            release_coeff: time_to_coeff(config.release_seconds, sample_rate),
            current_gain_db: 0.0,
        }
    }

    /// Compress `buffer` in place.
    pub fn process(&mut self, buffer: &mut SampleBuffer) {
        let frames = buffer.frames();
        let channels = buffer.channels_mut();

        for frame in 0..frames {
            let peak = channels
                .iter()
                .map(|channel| channel[frame].abs())
                .fold(0.0_f32, f32::max);

            let gain = self.next_gain(peak);
            for channel in channels.iter_mut() {
                channel[frame] *= gain;
            }
        }
    }

    /// Advance the envelope follower by one frame and return the linear gain.
    fn next_gain(&mut self, peak: f32) -> f32 {
        let level_db = linear_to_db(peak);
        let target_gain_db = compute_gain_db(level_db, self.threshold_db, self.knee_db, self.ratio);
        self.update_gain(target_gain_db);
        db_to_linear(self.current_gain_db)
    }

    fn update_gain(&mut self, target_gain_db: f32) {
        // more reduction = attack, recovery = release
        let coeff = if target_gain_db < self.current_gain_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.current_gain_db = coeff * self.current_gain_db + (1.0 - coeff) * target_gain_db;
    }

    /// Gain reduction currently applied, in dB (zero or negative).
    pub fn gain_reduction_db(&self) -> f32 {
        self.current_gain_db
    }
}

/// Static gain curve: dB change applied to a signal at `level_db`.
pub(crate) fn compute_gain_db(level_db: f32, threshold_db: f32, knee_db: f32, ratio: f32) -> f32 {
    let overshoot = level_db - threshold_db;
    let slope = 1.0 / ratio - 1.0;

    if knee_db > 0.0 && 2.0 * overshoot.abs() <= knee_db {
        let x = overshoot + knee_db / 2.0;
        slope * x * x / (2.0 * knee_db)
    } else if overshoot > 0.0 {
        slope * overshoot
    } else {
        0.0
    }
}

fn time_to_coeff(time_seconds: f32, sample_rate: u32) -> f32 {
    if time_seconds <= 0.0 || !time_seconds.is_finite() || sample_rate == 0 {
        return 0.0;
    }
    (-1.0 / (time_seconds * sample_rate as f32)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    fn instant_config(threshold_db: f32, knee_db: f32, ratio: f32) -> MasteringBusConfig {
        MasteringBusConfig {
            threshold_db,
            knee_db,
            ratio,
            attack_seconds: 0.0,
            release_seconds: 0.0,
        }
    }

    #[test]
    fn curve_is_flat_below_knee() {
        assert_eq!(compute_gain_db(-40.0, -20.0, 10.0, 4.0), 0.0);
        assert_eq!(compute_gain_db(-25.0, -20.0, 10.0, 4.0), 0.0);
    }

    #[test]
    fn curve_applies_ratio_above_knee() {
        // 20 dB over threshold at 4:1 -> 5 dB out, i.e. -15 dB of change
        assert!(approx_eq(compute_gain_db(0.0, -20.0, 10.0, 4.0), -15.0, 1e-5));
    }

    #[test]
    fn knee_is_continuous_at_its_edges() {
        let upper = compute_gain_db(-15.0, -20.0, 10.0, 4.0);
        assert!(approx_eq(upper, (1.0 / 4.0 - 1.0) * 5.0, 1e-5));
        let mid = compute_gain_db(-20.0, -20.0, 10.0, 4.0);
        assert!(mid < 0.0 && mid > upper);
    }

    #[test]
    fn quiet_material_passes_untouched() {
        let mut buffer =
            SampleBuffer::new(44_100, vec![vec![0.01; 64], vec![-0.01; 64]]).expect("buffer");
        let original = buffer.clone();
        MasteringCompressor::new(&MasteringBusConfig::default(), 44_100).process(&mut buffer);
        assert_eq!(buffer, original);
    }

    #[test]
    fn linked_detection_applies_same_gain_to_both_channels() {
        let mut buffer =
            SampleBuffer::new(44_100, vec![vec![1.0; 8], vec![0.1; 8]]).expect("buffer");
        let mut compressor = MasteringCompressor::new(&instant_config(-6.0, 0.0, 2.0), 44_100);
        compressor.process(&mut buffer);

        let expected = db_to_linear(-3.0);
        let left = buffer.channel(0).expect("left");
        let right = buffer.channel(1).expect("right");
        assert!(left.iter().all(|v| approx_eq(*v, expected, 1e-4)));
        assert!(right.iter().all(|v| approx_eq(*v, 0.1 * expected, 1e-4)));
    }

    #[test]
    fn attack_smooths_gain_reduction() {
        let mut buffer = SampleBuffer::new(44_100, vec![vec![1.0; 4_410]]).expect("buffer");
        let mut compressor = MasteringCompressor::new(&MasteringBusConfig::default(), 44_100);
        compressor.process(&mut buffer);

        let samples = buffer.channel(0).expect("channel");
        // first frame only partially reduced, then settles near the static curve
        assert!(samples[0] > samples[4_000]);
        assert!(approx_eq(compressor.gain_reduction_db(), -15.0, 0.05));
    }

    #[test]
    fn release_recovers_after_loud_passage() {
        let mut loud = vec![1.0_f32; 4_410];
        loud.extend(std::iter::repeat(0.001).take(88_200));
        let mut buffer = SampleBuffer::new(44_100, vec![loud]).expect("buffer");
        let mut compressor = MasteringCompressor::new(&MasteringBusConfig::default(), 44_100);
        compressor.process(&mut buffer);
        assert!(compressor.gain_reduction_db() > -0.1);
    }
}
