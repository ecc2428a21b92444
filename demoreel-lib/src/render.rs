//! Offline mix-down of a timeline into the master bus.
//!
//! Rendering is two deterministic passes: every scheduled event is summed into
//! a zeroed stereo buffer, then the whole buffer runs once through the
//! mastering compressor and is hard-clamped to `[-1, 1]`.

use log::{debug, warn};

use crate::audio::SampleBuffer;
use crate::context::RenderContext;
use crate::dsp::MasteringCompressor;
use crate::error::ReelError;
use crate::settings::MasteringBusConfig;
use crate::timeline::{EventSource, ScheduledEvent, Timeline};

/// Buffers referenced by a timeline's events.
#[derive(Debug, Clone, Copy)]
pub struct MixSources<'a> {
    /// Decoded tracks, indexed by [`EventSource::Track`].
    pub tracks: &'a [SampleBuffer],
    pub watermark: Option<&'a SampleBuffer>,
}

/// Sum every event of `timeline` into a new master buffer.
///
/// The buffer has `timeline.frame_count(rate)` frames and `context.channels()`
/// channels. Events reaching past the buffer are clipped with a warning.
///
/// # Errors
/// Returns [`ReelError::Render`] if the master cannot be allocated, an event
/// references a missing track, or a source runs at a different rate.
pub fn mix_down(
    timeline: &Timeline,
    sources: &MixSources<'_>,
    context: &RenderContext,
) -> Result<SampleBuffer, ReelError> {
    let sample_rate = context.sample_rate();
    let frames = timeline.frame_count(sample_rate);
    let mut master = SampleBuffer::silent(sample_rate, context.channels(), frames)?;

    for event in &timeline.events {
        let source = match event.source {
            EventSource::Track(index) => sources.tracks.get(index).ok_or_else(|| {
                ReelError::Render(format!("timeline references missing track {}", index))
            })?,
            EventSource::Watermark => match sources.watermark {
                Some(buffer) => buffer,
                None => {
                    warn!("watermark event at {:.3}s has no watermark buffer", event.start);
                    continue;
                }
            },
        };

        if source.sample_rate() != sample_rate {
            return Err(ReelError::Render(format!(
                "source runs at {} Hz but the master bus runs at {} Hz",
                source.sample_rate(),
                sample_rate
            )));
        }

        add_event(&mut master, event, source);
    }

    debug!(
        "mixed {} events into {} frames ({:.3}s)",
        timeline.events.len(),
        frames,
        timeline.total_duration
    );

    Ok(master)
}

fn add_event(master: &mut SampleBuffer, event: &ScheduledEvent, source: &SampleBuffer) {
    let rate = f64::from(master.sample_rate());
    let total_frames = master.frames();
    let start_frame = (event.start.max(0.0) * rate).round() as usize;
    let requested_end = (event.end.max(0.0) * rate).round() as usize;

    if event.start < 0.0 || requested_end > total_frames {
        warn!(
            "event {:?} [{:.3}s, {:.3}s) exceeds the master bus; clipping",
            event.source, event.start, event.end
        );
    }

    let end_frame = requested_end
        .min(total_frames)
        .min(start_frame.saturating_add(source.frames()));
    if start_frame >= end_frame {
        return;
    }

    let channels = master.channels_mut();
    for frame in start_frame..end_frame {
        let gain = event.envelope.gain_at(frame as f64 / rate);
        let offset = frame - start_frame;
        for (channel_index, channel) in channels.iter_mut().enumerate() {
            channel[frame] += source.output_sample(channel_index, offset) * gain;
        }
    }
}

/// Run the mastering bus over a summed mix: compress, then hard-clamp.
pub fn master_bus(mut mix: SampleBuffer, config: &MasteringBusConfig) -> SampleBuffer {
    let mut compressor = MasteringCompressor::new(config, mix.sample_rate());
    compressor.process(&mut mix);

    for channel in mix.channels_mut() {
        for sample in channel.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }
    mix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RenderSettings;
    use crate::timeline::{schedule, GainEnvelope, TrackSlot};

    const RATE: u32 = 44_100;

    fn buffer(channels: Vec<Vec<f32>>) -> SampleBuffer {
        SampleBuffer::new(RATE, channels).expect("buffer")
    }

    fn single_event_timeline(start: f64, end: f64, total: f64) -> Timeline {
        Timeline {
            events: vec![ScheduledEvent {
                source: EventSource::Track(0),
                start,
                end,
                envelope: GainEnvelope::Constant { gain: 1.0 },
            }],
            total_duration: total,
        }
    }

    #[test]
    fn mono_source_lands_in_both_channels() {
        let tracks = [buffer(vec![vec![0.2; 441]])];
        let timeline = single_event_timeline(0.0, 0.01, 0.01);
        let sources = MixSources {
            tracks: &tracks,
            watermark: None,
        };
        let master = mix_down(&timeline, &sources, &RenderContext::new()).expect("mix");
        assert_eq!(master.channel_count(), 2);
        assert_eq!(master.frames(), 441);
        assert_eq!(master.channel(0), master.channel(1));
        assert!(master.channel(0).expect("left").iter().all(|s| *s == 0.2));
    }

    #[test]
    fn stereo_source_keeps_its_channels() {
        let tracks = [buffer(vec![vec![0.1; 10], vec![-0.3; 10]])];
        let timeline = single_event_timeline(0.0, 10.0 / 44_100.0, 10.0 / 44_100.0);
        let sources = MixSources {
            tracks: &tracks,
            watermark: None,
        };
        let master = mix_down(&timeline, &sources, &RenderContext::new()).expect("mix");
        assert!(master.channel(0).expect("left").iter().all(|s| *s == 0.1));
        assert!(master.channel(1).expect("right").iter().all(|s| *s == -0.3));
    }

    #[test]
    fn events_past_the_end_are_clipped() {
        let tracks = [buffer(vec![vec![0.5; 44_100]])];
        let timeline = single_event_timeline(0.5, 1.5, 1.0);
        let sources = MixSources {
            tracks: &tracks,
            watermark: None,
        };
        let master = mix_down(&timeline, &sources, &RenderContext::new()).expect("mix");
        assert_eq!(master.frames(), 44_100);
        let left = master.channel(0).expect("left");
        assert_eq!(left[22_049], 0.0);
        assert_eq!(left[22_050], 0.5);
        assert_eq!(left[44_099], 0.5);
    }

    #[test]
    fn missing_track_is_a_render_error() {
        let timeline = single_event_timeline(0.0, 0.1, 0.1);
        let sources = MixSources {
            tracks: &[],
            watermark: None,
        };
        let result = mix_down(&timeline, &sources, &RenderContext::new());
        assert!(matches!(result, Err(ReelError::Render(_))));
    }

    #[test]
    fn mismatched_rate_is_rejected() {
        let tracks = [SampleBuffer::new(48_000, vec![vec![0.1; 480]]).expect("buffer")];
        let timeline = single_event_timeline(0.0, 0.01, 0.01);
        let sources = MixSources {
            tracks: &tracks,
            watermark: None,
        };
        assert!(mix_down(&timeline, &sources, &RenderContext::new()).is_err());
    }

    #[test]
    fn fade_out_reaches_silence_at_window_end() {
        let tracks = [buffer(vec![vec![0.05; 44_100]])];
        let timeline = schedule(
            &[TrackSlot {
                duration: 1.0,
                gain: 1.0,
            }],
            None,
            &RenderSettings::default(),
        );
        let sources = MixSources {
            tracks: &tracks,
            watermark: None,
        };
        let master = mix_down(&timeline, &sources, &RenderContext::new()).expect("mix");
        let left = master.channel(0).expect("left");
        let fade = &left[22_050..];
        assert!(fade.windows(2).all(|pair| pair[1] <= pair[0]));
        assert!(left[44_099] < 1e-4);
        assert_eq!(left[1_000], 0.05);
    }

    #[test]
    fn watermark_is_mixed_at_fixed_gain() {
        let tracks = [buffer(vec![vec![0.0; 44_100]])];
        let tag = buffer(vec![vec![0.5; 4_410]]);
        let timeline = schedule(
            &[TrackSlot {
                duration: 1.0,
                gain: 1.0,
            }],
            Some(tag.duration()),
            &RenderSettings::default(),
        );
        let sources = MixSources {
            tracks: &tracks,
            watermark: Some(&tag),
        };
        let master = mix_down(&timeline, &sources, &RenderContext::new()).expect("mix");
        let left = master.channel(0).expect("left");
        // first occurrence at min(5, 1.0 / 2) = 0.5s
        assert_eq!(left[22_049], 0.0);
        assert!((left[22_050] - 0.2).abs() < 1e-6);
        assert_eq!(left[22_050 + 4_410], 0.0);
    }

    #[test]
    fn master_bus_clamps_to_unit_range() {
        let mix = buffer(vec![vec![3.0; 4_410], vec![-3.0; 4_410]]);
        let mastered = master_bus(mix, &MasteringBusConfig::default());
        assert!(mastered
            .channels()
            .iter()
            .flatten()
            .all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn master_bus_reduces_loud_material() {
        let mix = buffer(vec![vec![0.9; 44_100], vec![0.9; 44_100]]);
        let mastered = master_bus(mix, &MasteringBusConfig::default());
        let last = mastered.channel(0).expect("left")[44_099];
        assert!(last < 0.5, "expected gain reduction, got {}", last);
    }
}
