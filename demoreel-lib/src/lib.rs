//! # Demo Reel Audio Library
//!
//! Offline mixing and mastering engine for demo reels. An ordered list of
//! recordings plus an optional watermark clip is decoded, loudness-matched,
//! laid out on a timeline with fades and gaps, summed into a stereo master bus,
//! compressed, and encoded as 16-bit PCM WAV.

pub mod analysis;
pub mod audio;
pub mod constants;
pub mod context;
pub mod decode;
pub mod dsp;
pub mod encode;
pub mod engine;
pub mod error;
pub mod gain;
pub mod render;
pub mod settings;
pub mod timeline;

#[cfg(test)]
mod test_support;

pub use audio::SampleBuffer;
pub use context::RenderContext;
pub use engine::{
    plan, render, spawn_render, ReelPlan, RenderJob, RenderOutput, RenderRequest, TrackSource,
    TrackSummary,
};
pub use error::ReelError;
pub use settings::{MasteringBusConfig, RenderSettings};
