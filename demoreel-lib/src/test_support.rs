//! In-memory WAV fixtures for unit tests.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

/// 16-bit PCM WAV whose samples come from `sample(frame, channel)`.
pub(crate) fn wav_bytes<F>(sample_rate: u32, channels: u16, frames: usize, sample: F) -> Vec<u8>
where
    F: Fn(usize, u16) -> f32,
{
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut bytes = Vec::new();
    {
        let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec).expect("wav writer");
        for frame in 0..frames {
            for channel in 0..channels {
                let value = sample(frame, channel).clamp(-1.0, 1.0);
                writer
                    .write_sample((value * i16::MAX as f32) as i16)
                    .expect("write sample");
            }
        }
        writer.finalize().expect("finalize wav");
    }
    bytes
}

pub(crate) fn constant_wav(sample_rate: u32, channels: u16, frames: usize, value: f32) -> Vec<u8> {
    wav_bytes(sample_rate, channels, frames, |_, _| value)
}

pub(crate) fn sine_wav(
    sample_rate: u32,
    channels: u16,
    seconds: f64,
    frequency: f32,
    amplitude: f32,
) -> Vec<u8> {
    let frames = (seconds * f64::from(sample_rate)).round() as usize;
    wav_bytes(sample_rate, channels, frames, |frame, _| {
        let t = frame as f32 / sample_rate as f32;
        amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
    })
}
