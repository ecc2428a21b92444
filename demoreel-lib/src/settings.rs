//! Render configuration.
//!
//! Settings are plain serde structs so they can be loaded from JSON. Field
//! names are snake_case; the camelCase spellings used by web front ends are
//! accepted as aliases.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ATTACK_SECONDS, DEFAULT_FADE_SECONDS, DEFAULT_KNEE_DB, DEFAULT_RATIO,
    DEFAULT_RELEASE_SECONDS, DEFAULT_SEGMENT_SECONDS, DEFAULT_SILENCE_GAP_SECONDS,
    DEFAULT_TAG_INTERVAL_SECONDS, DEFAULT_THRESHOLD_DB,
};
use crate::dsp::level::deserialize_db;
use crate::error::ReelError;

/// Parameters of the mastering-bus compressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasteringBusConfig {
    #[serde(alias = "threshold", deserialize_with = "deserialize_db")]
    pub threshold_db: f32,
    #[serde(alias = "knee", deserialize_with = "deserialize_db")]
    pub knee_db: f32,
    pub ratio: f32,
    #[serde(alias = "attack")]
    pub attack_seconds: f32,
    #[serde(alias = "release")]
    pub release_seconds: f32,
}

impl Default for MasteringBusConfig {
    fn default() -> Self {
        Self {
            threshold_db: DEFAULT_THRESHOLD_DB,
            knee_db: DEFAULT_KNEE_DB,
            ratio: DEFAULT_RATIO,
            attack_seconds: DEFAULT_ATTACK_SECONDS,
            release_seconds: DEFAULT_RELEASE_SECONDS,
        }
    }
}

impl MasteringBusConfig {
    /// Copy with non-finite or out-of-range values replaced.
    pub fn sanitized(&self) -> Self {
        Self {
            threshold_db: finite_or(self.threshold_db, DEFAULT_THRESHOLD_DB).min(0.0),
            knee_db: finite_or(self.knee_db, DEFAULT_KNEE_DB).max(0.0),
            ratio: finite_or(self.ratio, DEFAULT_RATIO).max(1.0),
            attack_seconds: finite_or(self.attack_seconds, DEFAULT_ATTACK_SECONDS).max(0.0),
            release_seconds: finite_or(self.release_seconds, DEFAULT_RELEASE_SECONDS).max(0.0),
        }
    }
}

/// Options recognized by [`crate::engine::render`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Apply loudness normalization to every track.
    pub normalize: bool,
    /// Maximum seconds of each track admitted into the reel.
    #[serde(alias = "segmentDuration", alias = "segment")]
    pub segment_duration: f64,
    /// Length of the linear fade-out at the end of each track window.
    #[serde(alias = "fadeDuration", alias = "fade")]
    pub fade_duration: f64,
    /// Silence inserted between consecutive tracks.
    #[serde(alias = "silenceGap", alias = "gap")]
    pub silence_gap: f64,
    /// Seconds between watermark occurrences; `0` disables the watermark.
    #[serde(alias = "tagInterval")]
    pub tag_interval: f64,
    pub mastering: MasteringBusConfig,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            normalize: false,
            segment_duration: DEFAULT_SEGMENT_SECONDS,
            fade_duration: DEFAULT_FADE_SECONDS,
            silence_gap: DEFAULT_SILENCE_GAP_SECONDS,
            tag_interval: DEFAULT_TAG_INTERVAL_SECONDS,
            mastering: MasteringBusConfig::default(),
        }
    }
}

impl RenderSettings {
    /// Parse settings from a JSON document. Missing fields take defaults.
    ///
    /// # Errors
    /// Returns [`ReelError::Input`] if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, ReelError> {
        serde_json::from_str(json)
            .map_err(|err| ReelError::Input(format!("invalid render settings: {}", err)))
    }

    /// Copy with durations forced finite and non-negative.
    pub fn sanitized(&self) -> Self {
        Self {
            normalize: self.normalize,
            segment_duration: sanitize_seconds(self.segment_duration, DEFAULT_SEGMENT_SECONDS),
            fade_duration: sanitize_seconds(self.fade_duration, DEFAULT_FADE_SECONDS),
            silence_gap: sanitize_seconds(self.silence_gap, DEFAULT_SILENCE_GAP_SECONDS),
            tag_interval: sanitize_seconds(self.tag_interval, DEFAULT_TAG_INTERVAL_SECONDS),
            mastering: self.mastering.sanitized(),
        }
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

fn sanitize_seconds(value: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        return fallback;
    }
    value.max(0.0)
}
