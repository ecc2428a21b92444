//! Sample format conversion for decoded packets.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::sample::Sample;

fn convert_unsigned_8bit_to_f32(sample: u8) -> f32 {
    (i16::from(sample) - 128) as f32 / 128.0
}

fn convert_signed_8bit_to_f32(sample: i8) -> f32 {
    f32::from(sample) / 128.0
}

fn convert_unsigned_16bit_to_f32(sample: u16) -> f32 {
    (i32::from(sample) - 32_768) as f32 / 32_768.0
}

fn convert_signed_16bit_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32_768.0
}

/// Signed 24-bit sample stored in the low bits of an `i32`.
fn convert_signed_24bit_to_f32(sample: i32) -> f32 {
    let shifted_sample = sample << 8 >> 8;
    shifted_sample as f32 / 2f32.powi(23)
}

fn convert_unsigned_24bit_to_f32(sample: u32) -> f32 {
    let shifted_sample = (sample & 0x00FF_FFFF) as i32 - (1 << 23);
    shifted_sample as f32 / 2f32.powi(23)
}

fn convert_unsigned_32bit_to_f32(sample: u32) -> f32 {
    (i64::from(sample) - (1_i64 << 31)) as f32 / 2f32.powi(31)
}

fn convert_signed_32bit_to_f32(sample: i32) -> f32 {
    sample as f32 / 2f32.powi(31)
}

/// Append every channel of a decoded packet to the matching planar vector.
///
/// Channels beyond `channels.len()` are ignored.
pub(crate) fn append_planar(decoded: AudioBufferRef<'_>, channels: &mut [Vec<f32>]) {
    match decoded {
        AudioBufferRef::U8(buf) => extend_planar(&*buf, channels, convert_unsigned_8bit_to_f32),
        AudioBufferRef::S8(buf) => extend_planar(&*buf, channels, convert_signed_8bit_to_f32),
        AudioBufferRef::U16(buf) => extend_planar(&*buf, channels, convert_unsigned_16bit_to_f32),
        AudioBufferRef::S16(buf) => extend_planar(&*buf, channels, convert_signed_16bit_to_f32),
        AudioBufferRef::U24(buf) => {
            extend_planar(&*buf, channels, |s| convert_unsigned_24bit_to_f32(s.0))
        }
        AudioBufferRef::S24(buf) => {
            extend_planar(&*buf, channels, |s| convert_signed_24bit_to_f32(s.0))
        }
        AudioBufferRef::U32(buf) => extend_planar(&*buf, channels, convert_unsigned_32bit_to_f32),
        AudioBufferRef::S32(buf) => extend_planar(&*buf, channels, convert_signed_32bit_to_f32),
        AudioBufferRef::F32(buf) => extend_planar(&*buf, channels, |s| s),
        AudioBufferRef::F64(buf) => extend_planar(&*buf, channels, |s| s as f32),
    }
}

fn extend_planar<S, F>(buf: &AudioBuffer<S>, channels: &mut [Vec<f32>], convert: F)
where
    S: Sample,
    F: Fn(S) -> f32,
{
    let available = buf.spec().channels.count();
    for (index, channel) in channels.iter_mut().enumerate().take(available) {
        channel.extend(buf.chan(index).iter().map(|&sample| convert(sample)));
    }
}
