//! Shared constants for decoding, mixing and mastering defaults.

/// Working sample rate of the engine (Hz).
///
/// Every source is conformed to this rate on decode so that all timeline
/// arithmetic runs on one clock. The encoded output uses it as well.
pub const SAMPLE_RATE: u32 = 44_100;

/// Channel count of the master bus and of the encoded output.
pub const OUTPUT_CHANNELS: usize = 2;

/// Highest source channel count the decoder accepts.
pub const MAX_SOURCE_CHANNELS: usize = 2;

/// Loudness analysis reads every Nth frame of the first channel.
pub const LOUDNESS_STRIDE: usize = 4;

/// RMS level the gain planner aims for when normalization is enabled.
pub const TARGET_RMS: f32 = 0.15;
/// Lower bound of a normalized gain multiplier.
pub const MIN_GAIN: f32 = 0.5;
/// Upper bound of a normalized gain multiplier.
pub const MAX_GAIN: f32 = 3.0;

/// Constant mix gain of every watermark occurrence.
pub const WATERMARK_GAIN: f32 = 0.4;
/// Latest time (s) the first watermark may start.
pub const FIRST_WATERMARK_SECONDS: f64 = 5.0;

pub const DEFAULT_SEGMENT_SECONDS: f64 = 25.0;
pub const DEFAULT_FADE_SECONDS: f64 = 0.5;
pub const DEFAULT_SILENCE_GAP_SECONDS: f64 = 0.3;
pub const DEFAULT_TAG_INTERVAL_SECONDS: f64 = 30.0;

pub const DEFAULT_THRESHOLD_DB: f32 = -20.0;
pub const DEFAULT_KNEE_DB: f32 = 10.0;
pub const DEFAULT_RATIO: f32 = 4.0;
pub const DEFAULT_ATTACK_SECONDS: f32 = 0.003;
pub const DEFAULT_RELEASE_SECONDS: f32 = 0.25;
