//! Timeline scheduling: play windows, fades, gaps and watermark placement.
//!
//! All times are seconds on the output timeline. The scheduler only needs
//! durations and gains, so it can be exercised without any audio.

use serde::Serialize;

use crate::constants::{FIRST_WATERMARK_SECONDS, WATERMARK_GAIN};
use crate::settings::RenderSettings;

/// Tolerance (in frames) absorbed before rounding a duration up to frames.
const FRAME_EPSILON: f64 = 1e-6;

/// What the scheduler needs to know about one track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSlot {
    /// Full decoded duration in seconds.
    pub duration: f64,
    /// Planned gain multiplier.
    pub gain: f32,
}

/// Portion of a source admitted into the reel, relative to the source start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayWindow {
    pub start: f64,
    pub length: f64,
}

impl PlayWindow {
    /// Window starting at the top of the source, capped at `segment_cap`.
    pub fn capped(duration: f64, segment_cap: f64) -> Self {
        Self {
            start: 0.0,
            length: duration.min(segment_cap).max(0.0),
        }
    }
}

/// Which buffer an event plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// Index into the ordered track list.
    Track(usize),
    Watermark,
}

/// Gain applied to an event over time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GainEnvelope {
    Constant { gain: f32 },
    /// Constant `gain` until `fade_start`, then a linear ramp to 0 at `end`.
    FadeOut { gain: f32, fade_start: f64, end: f64 },
}

impl GainEnvelope {
    /// Gain at absolute timeline position `time`.
    pub fn gain_at(&self, time: f64) -> f32 {
        match *self {
            GainEnvelope::Constant { gain } => gain,
            GainEnvelope::FadeOut {
                gain,
                fade_start,
                end,
            } => {
                if time < fade_start {
                    gain
                } else if time >= end {
                    0.0
                } else {
                    let progress = (end - time) / (end - fade_start);
                    gain * progress as f32
                }
            }
        }
    }
}

/// A source placed on the output timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledEvent {
    pub source: EventSource,
    pub start: f64,
    pub end: f64,
    pub envelope: GainEnvelope,
}

impl ScheduledEvent {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Ordered events plus the total output duration.
///
/// Track events come first in input order, followed by watermark events in
/// time order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub events: Vec<ScheduledEvent>,
    pub total_duration: f64,
}

impl Timeline {
    /// Frames needed to hold the timeline: `ceil(sample_rate * total_duration)`.
    pub fn frame_count(&self, sample_rate: u32) -> usize {
        let frames = self.total_duration * f64::from(sample_rate) - FRAME_EPSILON;
        frames.ceil().max(0.0) as usize
    }

    pub fn track_events(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.events
            .iter()
            .filter(|event| matches!(event.source, EventSource::Track(_)))
    }

    /// Start times of every watermark occurrence.
    pub fn watermark_starts(&self) -> Vec<f64> {
        self.events
            .iter()
            .filter(|event| event.source == EventSource::Watermark)
            .map(|event| event.start)
            .collect()
    }
}

/// Lay tracks end to end and place watermark occurrences.
///
/// # Arguments
/// * `slots` - Tracks in input order.
/// * `watermark_duration` - Duration of the decoded watermark, if any.
/// * `settings` - Segment cap, fade, gap and tag interval.
pub fn schedule(
    slots: &[TrackSlot],
    watermark_duration: Option<f64>,
    settings: &RenderSettings,
) -> Timeline {
    let settings = settings.sanitized();
    let mut events = Vec::with_capacity(slots.len());
    let mut cursor = 0.0_f64;

    for (index, slot) in slots.iter().enumerate() {
        let window = PlayWindow::capped(slot.duration, settings.segment_duration);
        let start = cursor;
        let end = start + window.length;
        let fade_start = (end - settings.fade_duration).max(start);

        events.push(ScheduledEvent {
            source: EventSource::Track(index),
            start,
            end,
            envelope: GainEnvelope::FadeOut {
                gain: slot.gain,
                fade_start,
                end,
            },
        });

        cursor = end;
        if index + 1 < slots.len() {
            cursor += settings.silence_gap;
        }
    }

    let total_duration = cursor;

    if let Some(tag_duration) = watermark_duration {
        for start in watermark_times(total_duration, settings.tag_interval) {
            events.push(ScheduledEvent {
                source: EventSource::Watermark,
                start,
                end: (start + tag_duration).min(total_duration),
                envelope: GainEnvelope::Constant {
                    gain: WATERMARK_GAIN,
                },
            });
        }
    }

    Timeline {
        events,
        total_duration,
    }
}

/// Watermark start times for a reel of `total_duration` seconds.
///
/// The first occurrence is at `min(5s, total / 2)`, then every `interval`
/// seconds while strictly before the end. A non-positive interval yields none.
pub fn watermark_times(total_duration: f64, interval: f64) -> Vec<f64> {
    if !interval.is_finite() || interval <= 0.0 || total_duration <= 0.0 {
        return Vec::new();
    }

    let first = FIRST_WATERMARK_SECONDS.min(total_duration / 2.0);
    (0_u32..)
        .map(|step| first + f64::from(step) * interval)
        .take_while(|time| *time < total_duration)
        .collect()
}
