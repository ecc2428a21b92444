//! Render entry points.
//!
//! A render runs decode, analysis, gain planning, scheduling, mixing,
//! mastering and encoding in that order. Tracks decode concurrently, but
//! results are placed by input index so the timeline always follows the
//! caller's order.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};
use serde::Serialize;

use crate::analysis::estimate_rms;
use crate::audio::SampleBuffer;
use crate::context::{Milestone, ProgressTracker, RenderContext};
use crate::decode::{decode_source, DecodedSource};
use crate::encode::{encode_wav, EncodedAudio, OutputFormat};
use crate::error::ReelError;
use crate::gain::plan_gain;
use crate::render::{master_bus, mix_down, MixSources};
use crate::settings::RenderSettings;
use crate::timeline::{schedule, PlayWindow, Timeline, TrackSlot};

const WATERMARK_NAME: &str = "watermark";

/// Raw bytes of one input recording, owned by the caller.
#[derive(Debug, Clone)]
pub struct TrackSource {
    pub id: String,
    pub display_name: String,
    pub bytes: Vec<u8>,
}

impl TrackSource {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            bytes,
        }
    }
}

/// Everything a render needs besides its [`RenderContext`].
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    /// Tracks in reel order.
    pub tracks: Vec<TrackSource>,
    /// Optional watermark clip.
    pub tag_source: Option<Vec<u8>>,
    pub settings: RenderSettings,
}

/// What the engine learned about one track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub id: String,
    pub name: String,
    pub source_sample_rate: u32,
    pub source_channels: usize,
    /// Decoded duration in seconds.
    pub duration: f64,
    /// Approximate loudness, see [`estimate_rms`].
    pub rms: f32,
    pub gain: f32,
    pub window: PlayWindow,
}

/// Result of [`plan`]: the reel's layout without any mixing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReelPlan {
    pub tracks: Vec<TrackSummary>,
    pub timeline: Timeline,
    /// Duration of the decoded watermark, if one will be mixed.
    pub watermark_duration: Option<f64>,
}

/// Result of [`render`].
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Mastered stereo buffer at the working rate.
    pub master: SampleBuffer,
    pub timeline: Timeline,
    pub tracks: Vec<TrackSummary>,
    /// 16-bit PCM WAV encoding of `master`.
    pub wav: Vec<u8>,
    /// Second deliverable. Currently the same PCM WAV, labelled as such.
    pub delivery: EncodedAudio,
}

/// A render running on a worker thread.
#[derive(Debug)]
pub struct RenderJob {
    context: RenderContext,
    handle: JoinHandle<Result<RenderOutput, ReelError>>,
}

impl RenderJob {
    /// Request cancellation. Takes effect at the next phase boundary.
    pub fn cancel(&self) {
        self.context.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the render to finish.
    ///
    /// # Errors
    /// Returns the render's error, or [`ReelError::Render`] if the worker panicked.
    pub fn join(self) -> Result<RenderOutput, ReelError> {
        self.handle
            .join()
            .unwrap_or_else(|_| Err(ReelError::Render("render worker panicked".to_string())))
    }
}

struct Prepared {
    buffers: Vec<SampleBuffer>,
    watermark: Option<SampleBuffer>,
    tracks: Vec<TrackSummary>,
    timeline: Timeline,
}

/// Decode, analyze and schedule a request without mixing it.
///
/// # Errors
/// Fails with [`ReelError::Input`] for an empty track list, [`ReelError::Decode`]
/// if any track cannot be decoded, or [`ReelError::Cancelled`].
pub fn plan(request: &RenderRequest, context: &RenderContext) -> Result<ReelPlan, ReelError> {
    let mut tracker = context.progress_tracker();
    let prepared = prepare(request, context, &mut tracker)?;
    Ok(ReelPlan {
        watermark_duration: prepared.watermark.as_ref().map(SampleBuffer::duration),
        tracks: prepared.tracks,
        timeline: prepared.timeline,
    })
}

/// Render a request into a mastered buffer and its encodings.
///
/// Either the full output is returned or an error; there is no partial result.
///
/// # Errors
/// See [`plan`]. Additionally fails with [`ReelError::Render`] if the master
/// bus cannot be allocated or encoded.
pub fn render(request: &RenderRequest, context: &RenderContext) -> Result<RenderOutput, ReelError> {
    let mut tracker = context.progress_tracker();
    let prepared = prepare(request, context, &mut tracker)?;

    context.ensure_active()?;
    let sources = MixSources {
        tracks: &prepared.buffers,
        watermark: prepared.watermark.as_ref(),
    };
    let mix = mix_down(&prepared.timeline, &sources, context)?;
    let settings = request.settings.sanitized();
    let master = master_bus(mix, &settings.mastering);
    drop(prepared.buffers);
    drop(prepared.watermark);
    tracker.report(Milestone::RenderComplete);

    context.ensure_active()?;
    let wav = encode_wav(&master)?;
    let delivery = EncodedAudio {
        format: OutputFormat::Wav,
        bytes: wav.clone(),
    };
    tracker.report(Milestone::EncodeComplete);

    info!(
        "rendered {} tracks into {:.2}s ({} watermark occurrences, {} bytes)",
        prepared.tracks.len(),
        prepared.timeline.total_duration,
        prepared.timeline.watermark_starts().len(),
        wav.len()
    );

    Ok(RenderOutput {
        master,
        timeline: prepared.timeline,
        tracks: prepared.tracks,
        wav,
        delivery,
    })
}

/// Run [`render`] on a worker thread.
///
/// The job shares `context`'s cancellation flag.
pub fn spawn_render(request: RenderRequest, context: RenderContext) -> RenderJob {
    let worker_context = context.clone();
    let handle = thread::spawn(move || render(&request, &worker_context));
    RenderJob { context, handle }
}

fn prepare(
    request: &RenderRequest,
    context: &RenderContext,
    tracker: &mut ProgressTracker<'_>,
) -> Result<Prepared, ReelError> {
    if request.tracks.is_empty() {
        return Err(ReelError::Input("no tracks supplied".to_string()));
    }
    context.ensure_active()?;

    let settings = request.settings.sanitized();
    tracker.report(Milestone::DecodeStart);

    let decoded = decode_tracks(&request.tracks, context, tracker)?;
    let watermark = decode_watermark(request.tag_source.as_deref(), &settings, context);
    context.ensure_active()?;
    tracker.report(Milestone::DecodeComplete);

    let mut tracks = Vec::with_capacity(decoded.len());
    let mut slots = Vec::with_capacity(decoded.len());
    let mut buffers = Vec::with_capacity(decoded.len());
    for (source, decoded) in request.tracks.iter().zip(decoded) {
        let rms = estimate_rms(&decoded.buffer);
        let gain = plan_gain(rms, settings.normalize);
        let duration = decoded.buffer.duration();
        debug!(
            "{}: {:.3}s, rms {:.4}, gain {:.3}",
            source.display_name, duration, rms, gain
        );

        slots.push(TrackSlot { duration, gain });
        tracks.push(TrackSummary {
            id: source.id.clone(),
            name: source.display_name.clone(),
            source_sample_rate: decoded.source_sample_rate,
            source_channels: decoded.source_channels,
            duration,
            rms,
            gain,
            window: PlayWindow::capped(duration, settings.segment_duration),
        });
        buffers.push(decoded.buffer);
    }

    let timeline = schedule(
        &slots,
        watermark.as_ref().map(SampleBuffer::duration),
        &settings,
    );
    debug!(
        "scheduled {} events over {:.3}s",
        timeline.events.len(),
        timeline.total_duration
    );
    tracker.report(Milestone::ScheduleComplete);

    Ok(Prepared {
        buffers,
        watermark,
        tracks,
        timeline,
    })
}

/// Decode every track on a small pool of scoped workers.
///
/// The first failure stops the pool and is returned as is.
fn decode_tracks(
    tracks: &[TrackSource],
    context: &RenderContext,
    tracker: &mut ProgressTracker<'_>,
) -> Result<Vec<DecodedSource>, ReelError> {
    let total = tracks.len();
    let workers = thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(total);
    let next = AtomicUsize::new(0);
    let mut decoded: Vec<Option<DecodedSource>> = vec![None; total];

    thread::scope(|scope| -> Result<(), ReelError> {
        let (sender, receiver) = mpsc::channel();
        for _ in 0..workers {
            let sender = sender.clone();
            let next = &next;
            scope.spawn(move || loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                let Some(track) = tracks.get(index) else {
                    break;
                };
                let result = context
                    .ensure_active()
                    .and_then(|()| decode_source(&track.bytes, &track.display_name, context));
                let failed = result.is_err();
                if sender.send((index, result)).is_err() || failed {
                    break;
                }
            });
        }
        drop(sender);

        let mut completed = 0;
        for (index, result) in receiver {
            match result {
                Ok(source) => decoded[index] = Some(source),
                Err(err) => {
                    next.store(total, Ordering::Relaxed);
                    return Err(err);
                }
            }
            completed += 1;
            tracker.report(Milestone::DecodeProgress { completed, total });
        }
        Ok(())
    })?;

    decoded
        .into_iter()
        .zip(tracks)
        .map(|(source, track)| {
            source.ok_or_else(|| {
                ReelError::Render(format!("no decode result for {}", track.display_name))
            })
        })
        .collect()
}

fn decode_watermark(
    bytes: Option<&[u8]>,
    settings: &RenderSettings,
    context: &RenderContext,
) -> Option<SampleBuffer> {
    let bytes = bytes?;
    if settings.tag_interval <= 0.0 {
        debug!("tag interval is zero; watermark disabled");
        return None;
    }

    match decode_source(bytes, WATERMARK_NAME, context) {
        Ok(decoded) => Some(decoded.buffer),
        Err(err) => {
            warn!("rendering without watermark: {}", err);
            None
        }
    }
}
