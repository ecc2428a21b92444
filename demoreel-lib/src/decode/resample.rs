//! Conform decoded audio to the working sample rate.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

const RESAMPLE_CHUNK_FRAMES: usize = 1024;
const RESAMPLE_SINC_LEN: usize = 128;
const RESAMPLE_CUTOFF: f32 = 0.95;
const RESAMPLE_OVERSAMPLING_FACTOR: usize = 128;

/// Resample planar channels from `src_rate` to `dst_rate`.
///
/// The output holds `ceil(frames * dst_rate / src_rate)` frames per channel,
/// aligned with the input (the filter delay is removed).
pub(crate) fn conform_rate(
    channels: Vec<Vec<f32>>,
    src_rate: u32,
    dst_rate: u32,
) -> Result<Vec<Vec<f32>>, String> {
    if src_rate == dst_rate || channels.is_empty() {
        return Ok(channels);
    }
    if src_rate == 0 {
        return Err("source sample rate is zero".to_string());
    }

    let input_frames = channels[0].len();
    let ratio = f64::from(dst_rate) / f64::from(src_rate);
    let expected_frames = (input_frames as f64 * ratio).ceil() as usize;
    if input_frames == 0 {
        return Ok(vec![Vec::new(); channels.len()]);
    }

    let params = SincInterpolationParameters {
        sinc_len: RESAMPLE_SINC_LEN,
        f_cutoff: RESAMPLE_CUTOFF,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: RESAMPLE_OVERSAMPLING_FACTOR,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler =
        SincFixedIn::<f32>::new(ratio, 2.0, params, RESAMPLE_CHUNK_FRAMES, channels.len())
            .map_err(|err| format!("failed to create resampler: {}", err))?;

    let delay = resampler.output_delay();
    let wanted = expected_frames + delay;
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(wanted); channels.len()];

    let mut position = 0;
    while position + RESAMPLE_CHUNK_FRAMES <= input_frames {
        let chunk: Vec<&[f32]> = channels
            .iter()
            .map(|channel| &channel[position..position + RESAMPLE_CHUNK_FRAMES])
            .collect();
        let resampled = resampler
            .process(&chunk, None)
            .map_err(|err| format!("resample error: {}", err))?;
        append(&mut output, resampled);
        position += RESAMPLE_CHUNK_FRAMES;
    }

    if position < input_frames {
        let chunk: Vec<&[f32]> = channels.iter().map(|channel| &channel[position..]).collect();
        let resampled = resampler
            .process_partial(Some(chunk.as_slice()), None)
            .map_err(|err| format!("resample error: {}", err))?;
        append(&mut output, resampled);
    }

    // flush the filter tail until the delayed output is complete
    while output[0].len() < wanted {
        let resampled = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|err| format!("resample error: {}", err))?;
        if resampled.first().map_or(true, Vec::is_empty) {
            break;
        }
        append(&mut output, resampled);
    }

    for channel in &mut output {
        channel.drain(..delay.min(channel.len()));
        channel.resize(expected_frames, 0.0);
    }

    Ok(output)
}

fn append(output: &mut [Vec<f32>], resampled: Vec<Vec<f32>>) {
    for (channel, samples) in output.iter_mut().zip(resampled) {
        channel.extend(samples);
    }
}
