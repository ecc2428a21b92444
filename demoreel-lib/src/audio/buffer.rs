//! Planar float sample buffer shared by every engine stage.

use crate::error::ReelError;

/// Planar f32 audio with a fixed sample rate.
///
/// Each channel holds the same number of frames. Samples are nominally in
/// `[-1, 1]`. Buffers handed out by the decoder are never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl SampleBuffer {
    /// Build a buffer from planar channel data.
    ///
    /// # Errors
    /// Fails if the sample rate is zero, no channels are given, or the
    /// channels differ in length.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, ReelError> {
        if sample_rate == 0 {
            return Err(ReelError::Input("sample rate must be non-zero".to_string()));
        }
        let Some(first) = channels.first() else {
            return Err(ReelError::Input(
                "a sample buffer needs at least one channel".to_string(),
            ));
        };
        let frames = first.len();
        if channels.iter().any(|channel| channel.len() != frames) {
            return Err(ReelError::Input(
                "all channels must have the same length".to_string(),
            ));
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Zero-initialized buffer, allocated without aborting on failure.
    pub(crate) fn silent(
        sample_rate: u32,
        channel_count: usize,
        frames: usize,
    ) -> Result<Self, ReelError> {
        let mut channels = Vec::with_capacity(channel_count);
        for _ in 0..channel_count {
            let mut channel: Vec<f32> = Vec::new();
            channel.try_reserve_exact(frames).map_err(|err| {
                ReelError::Render(format!(
                    "cannot allocate {} frames for the master bus: {}",
                    frames, err
                ))
            })?;
            channel.resize(frames, 0.0);
            channels.push(channel);
        }
        Self::new(sample_rate, channels)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub(crate) fn channels_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.channels
    }

    /// Sample for output channel `channel` at `frame`.
    ///
    /// Mono buffers answer with their single channel for every output channel.
    pub fn output_sample(&self, channel: usize, frame: usize) -> f32 {
        let source = if self.channels.len() == 1 { 0 } else { channel };
        self.channels
            .get(source)
            .and_then(|samples| samples.get(frame))
            .copied()
            .unwrap_or(0.0)
    }
}
