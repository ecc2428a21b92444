//! 16-bit PCM RIFF/WAVE encoder.

use log::debug;

use super::writer::ByteWriter;
use crate::audio::SampleBuffer;
use crate::error::ReelError;

const HEADER_BYTES: usize = 44;
const BITS_PER_SAMPLE: u16 = 16;
const PCM_FORMAT_TAG: u16 = 1;

/// Encode a buffer as a canonical 44-byte-header PCM WAV file.
///
/// Samples are interleaved frame by frame. Negative samples scale by 32768,
/// the rest by 32767, truncating toward zero after clamping to `[-1, 1]`.
///
/// # Errors
/// Returns [`ReelError::Render`] if the data does not fit a 32-bit RIFF size.
pub fn encode_wav(buffer: &SampleBuffer) -> Result<Vec<u8>, ReelError> {
    let channel_count = buffer.channel_count();
    let frames = buffer.frames();
    let block_align = channel_count * usize::from(BITS_PER_SAMPLE / 8);

    let data_len = frames
        .checked_mul(block_align)
        .and_then(|len| u32::try_from(len).ok())
        .filter(|len| len.checked_add(36).is_some())
        .ok_or_else(|| {
            ReelError::Render(format!(
                "{} frames of {} channels exceed the WAV size limit",
                frames, channel_count
            ))
        })?;
    let channels = u16::try_from(channel_count)
        .map_err(|_| ReelError::Render(format!("too many channels: {}", channel_count)))?;
    let block_align = channels * (BITS_PER_SAMPLE / 8);
    let byte_rate = buffer.sample_rate() * u32::from(block_align);

    let mut writer = ByteWriter::with_capacity(HEADER_BYTES + data_len as usize);
    writer.write_tag(b"RIFF");
    writer.write_u32_le(36 + data_len);
    writer.write_tag(b"WAVE");

    writer.write_tag(b"fmt ");
    writer.write_u32_le(16);
    writer.write_u16_le(PCM_FORMAT_TAG);
    writer.write_u16_le(channels);
    writer.write_u32_le(buffer.sample_rate());
    writer.write_u32_le(byte_rate);
    writer.write_u16_le(block_align);
    writer.write_u16_le(BITS_PER_SAMPLE);

    writer.write_tag(b"data");
    writer.write_u32_le(data_len);

    let planes = buffer.channels();
    for frame in 0..frames {
        for plane in planes {
            writer.write_i16_le(quantize(plane[frame]));
        }
    }

    debug!(
        "encoded {} frames x {} channels into {} bytes",
        frames,
        channel_count,
        writer.position()
    );

    Ok(writer.into_inner())
}

/// Convert a float sample to 16-bit PCM.
pub(crate) fn quantize(sample: f32) -> i16 {
    let sample = sample.clamp(-1.0, 1.0);
    if sample < 0.0 {
        (sample * 32_768.0) as i16
    } else {
        (sample * 32_767.0) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RenderContext;
    use crate::decode::decode_source;

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    #[test]
    fn quantize_uses_asymmetric_scale() {
        assert_eq!(quantize(-1.0), i16::MIN);
        assert_eq!(quantize(1.0), i16::MAX);
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(0.5), 16_383);
        assert_eq!(quantize(-0.5), -16_384);
        assert_eq!(quantize(4.0), i16::MAX);
    }

    #[test]
    fn header_fields_match_buffer() {
        let buffer =
            SampleBuffer::new(44_100, vec![vec![0.0; 100], vec![0.0; 100]]).expect("buffer");
        let bytes = encode_wav(&buffer).expect("encode");

        assert_eq!(bytes.len(), 44 + 400);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(&bytes, 4) as usize, bytes.len() - 8);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32_at(&bytes, 16), 16);
        assert_eq!(u16_at(&bytes, 20), 1);
        assert_eq!(u16_at(&bytes, 22), 2);
        assert_eq!(u32_at(&bytes, 24), 44_100);
        assert_eq!(u32_at(&bytes, 28), 176_400);
        assert_eq!(u16_at(&bytes, 32), 4);
        assert_eq!(u16_at(&bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32_at(&bytes, 40), 400);
    }

    #[test]
    fn samples_are_interleaved() {
        let buffer = SampleBuffer::new(8_000, vec![vec![1.0, 0.0], vec![-1.0, 0.5]])
            .expect("buffer");
        let bytes = encode_wav(&buffer).expect("encode");
        let samples: Vec<i16> = bytes[44..]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(samples, vec![32_767, -32_768, 0, 16_383]);
    }

    #[test]
    fn empty_buffer_is_header_only() {
        let buffer = SampleBuffer::new(44_100, vec![Vec::new(), Vec::new()]).expect("buffer");
        let bytes = encode_wav(&buffer).expect("encode");
        assert_eq!(bytes.len(), 44);
        assert_eq!(u32_at(&bytes, 40), 0);
    }

    #[test]
    fn output_decodes_back() {
        let buffer =
            SampleBuffer::new(44_100, vec![vec![0.25; 4_410], vec![-0.25; 4_410]]).expect("buffer");
        let bytes = encode_wav(&buffer).expect("encode");
        let decoded = decode_source(&bytes, "master.wav", &RenderContext::new()).expect("decode");
        assert_eq!(decoded.buffer.frames(), 4_410);
        assert_eq!(decoded.source_channels, 2);
    }
}
