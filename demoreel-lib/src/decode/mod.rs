//! Decoding of raw source bytes into the engine's canonical buffer.
//!
//! The container is auto-detected by symphonia. The source's display name
//! only serves as a probe hint.

mod convert;
mod resample;

use std::io::{Cursor, ErrorKind};
use std::path::Path;

use log::{debug, warn};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::SampleBuffer;
use crate::constants::MAX_SOURCE_CHANNELS;
use crate::context::RenderContext;
use crate::error::ReelError;

/// A decoded source conformed to the context's working rate.
#[derive(Debug, Clone)]
pub struct DecodedSource {
    pub buffer: SampleBuffer,
    /// Sample rate of the encoded source before conversion.
    pub source_sample_rate: u32,
    pub source_channels: usize,
}

/// Decode `bytes` into a [`SampleBuffer`] at `context.sample_rate()`.
///
/// # Arguments
/// * `bytes` - Encoded audio in any container symphonia can probe.
/// * `name` - Display name of the source, used as probe hint and in errors.
/// * `context` - Rendering context providing the working clock.
///
/// # Errors
/// Returns [`ReelError::Decode`] for unsupported or corrupt sources, sources
/// without audio frames, and sources with more than two channels.
pub fn decode_source(
    bytes: &[u8],
    name: &str,
    context: &RenderContext,
) -> Result<DecodedSource, ReelError> {
    let (mut format, mut decoder, track_id) = open_source(bytes, name)?;
    let mut source_rate = decoder.codec_params().sample_rate;
    let mut channels: Vec<Vec<f32>> = Vec::new();
    let mut skipped_packets = 0_u64;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(err)) if err.kind() == ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(ReelError::decode(name, err)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let count = spec.channels.count();
                if channels.is_empty() {
                    check_channel_count(count, name)?;
                    channels = vec![Vec::new(); count];
                    source_rate = source_rate.or(Some(spec.rate));
                } else if count != channels.len() {
                    return Err(ReelError::decode(
                        name,
                        format!("channel count changed from {} to {}", channels.len(), count),
                    ));
                }
                convert::append_planar(decoded, &mut channels);
            }
            Err(Error::DecodeError(err)) => {
                skipped_packets += 1;
                warn!("{}: skipping undecodable packet: {}", name, err);
            }
            Err(Error::IoError(err)) if err.kind() == ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(ReelError::decode(name, err)),
        }
    }

    if channels.first().map_or(true, Vec::is_empty) {
        return Err(ReelError::decode(name, "source contains no audio frames"));
    }
    let source_sample_rate =
        source_rate.ok_or_else(|| ReelError::decode(name, "missing sample rate"))?;
    let source_channels = channels.len();
    let source_frames = channels[0].len();

    let channels = resample::conform_rate(channels, source_sample_rate, context.sample_rate())
        .map_err(|err| ReelError::decode(name, err))?;
    let buffer = SampleBuffer::new(context.sample_rate(), channels)
        .map_err(|err| ReelError::decode(name, err))?;

    debug!(
        "decoded {}: {} ch, {} Hz, {} frames -> {} frames ({} packets skipped)",
        name,
        source_channels,
        source_sample_rate,
        source_frames,
        buffer.frames(),
        skipped_packets
    );

    Ok(DecodedSource {
        buffer,
        source_sample_rate,
        source_channels,
    })
}

fn check_channel_count(count: usize, name: &str) -> Result<(), ReelError> {
    if count == 0 {
        return Err(ReelError::decode(name, "source has no channels"));
    }
    if count > MAX_SOURCE_CHANNELS {
        return Err(ReelError::decode(
            name,
            format!(
                "unsupported channel layout: {} channels (at most {} supported)",
                count, MAX_SOURCE_CHANNELS
            ),
        ));
    }
    Ok(())
}

/// Probe the bytes and build a decoder for the first decodable track.
fn open_source(
    bytes: &[u8],
    name: &str,
) -> Result<(Box<dyn FormatReader>, Box<dyn Decoder>, u32), ReelError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = Path::new(name).extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let fmt_opts = FormatOptions {
        enable_gapless: true,
        ..Default::default()
    };
    let meta_opts: MetadataOptions = Default::default();
    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|err| ReelError::decode(name, err))?;
    let format = probed.format;

    let (track_id, codec_params) = format
        .tracks()
        .iter()
        .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        .map(|track| (track.id, track.codec_params.clone()))
        .ok_or_else(|| ReelError::decode(name, "no supported audio tracks"))?;

    if let Some(channels) = codec_params.channels {
        check_channel_count(channels.count(), name)?;
    }

    let dec_opts: DecoderOptions = Default::default();
    let decoder = symphonia::default::get_codecs()
        .make(&codec_params, &dec_opts)
        .map_err(|err| ReelError::decode(name, err))?;

    Ok((format, decoder, track_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{constant_wav, wav_bytes};

    #[test]
    fn decodes_stereo_wav_at_working_rate() {
        let bytes = constant_wav(44_100, 2, 4_410, 0.25);
        let decoded = decode_source(&bytes, "a.wav", &RenderContext::new()).expect("decode");
        assert_eq!(decoded.buffer.channel_count(), 2);
        assert_eq!(decoded.buffer.frames(), 4_410);
        assert_eq!(decoded.source_sample_rate, 44_100);
        let first = decoded.buffer.channel(0).expect("channel")[100];
        assert!((first - 0.25).abs() < 1e-3);
    }

    #[test]
    fn keeps_mono_sources_mono() {
        let bytes = constant_wav(44_100, 1, 441, 0.1);
        let decoded = decode_source(&bytes, "mono.wav", &RenderContext::new()).expect("decode");
        assert_eq!(decoded.buffer.channel_count(), 1);
        assert_eq!(decoded.source_channels, 1);
    }

    #[test]
    fn resamples_to_working_rate() {
        let bytes = constant_wav(22_050, 1, 22_050, 0.0);
        let decoded = decode_source(&bytes, "low.wav", &RenderContext::new()).expect("decode");
        assert_eq!(decoded.source_sample_rate, 22_050);
        assert_eq!(decoded.buffer.sample_rate(), 44_100);
        assert_eq!(decoded.buffer.frames(), 44_100);
    }

    #[test]
    fn garbage_bytes_fail_with_source_name() {
        let err = decode_source(b"definitely not audio", "broken.wav", &RenderContext::new())
            .expect_err("garbage must not decode");
        match err {
            ReelError::Decode { name, .. } => assert_eq!(name, "broken.wav"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_surround_sources() {
        let bytes = wav_bytes(44_100, 6, 100, |_, _| 0.0);
        let result = decode_source(&bytes, "surround.wav", &RenderContext::new());
        assert!(matches!(result, Err(ReelError::Decode { .. })));
    }

    #[test]
    fn empty_wav_has_no_frames() {
        let bytes = wav_bytes(44_100, 2, 0, |_, _| 0.0);
        assert!(decode_source(&bytes, "empty.wav", &RenderContext::new()).is_err());
    }
}
