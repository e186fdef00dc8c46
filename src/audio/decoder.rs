// Audio decoding front-end for the feature pipeline.
//
// Decodes an entire file to mono f32 PCM via symphonia, then resamples to the
// pipeline's analysis rate (8 kHz by default). Every downstream transform
// (frame tensor, mel spectrogram, MFCC) starts from the Waveform produced
// here.

use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::conv::FromSample;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::PipelineError;

/// Decoded mono audio at the pipeline's analysis sample rate.
#[derive(Debug, Clone)]
pub struct Waveform {
    /// Mono samples in range [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sample rate of `samples` (the requested target rate).
    pub sample_rate: u32,
}

/// Decode an audio file to mono f32 samples at `target_rate`.
///
/// Reads the full file, decodes all packets, mixes all channels down to mono,
/// and resamples to `target_rate` with linear interpolation. Fails if the
/// file is missing, unreadable, or not a supported audio format.
pub fn decode_audio(path: &Path, target_rate: u32) -> Result<Waveform, PipelineError> {
    let decode_err = |reason: String| PipelineError::Decode {
        path: path.to_path_buf(),
        reason,
    };

    let file = std::fs::File::open(path)
        .map_err(|e| decode_err(format!("failed to open file: {}", e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Extension hint helps the probe pick the right demuxer
    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(&ext.to_string_lossy());
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_err(format!("failed to probe audio format: {}", e)))?;

    let mut format_reader = probed.format;

    let track = format_reader
        .default_track()
        .ok_or_else(|| decode_err("no audio tracks found".to_string()))?;

    let track_id = track.id;
    let native_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| decode_err("stream does not report a sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(format!("failed to create decoder: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break; // end of file
            }
            Err(e) => return Err(decode_err(format!("error reading packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(msg)) => {
                // Corrupted packets are skipped; decoding continues
                log::warn!("skipping corrupted packet in {}: {}", path.display(), msg);
                continue;
            }
            Err(e) => return Err(decode_err(format!("decode error: {}", e))),
        };

        mix_to_mono(&decoded, &mut samples);
    }

    Ok(Waveform {
        samples: resample(&samples, native_rate, target_rate),
        sample_rate: target_rate,
    })
}

/// Mix a decoded buffer down to mono f32 and append it to `out`.
/// Multichannel input is averaged across channels.
fn mix_to_mono(decoded: &AudioBufferRef, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::U8(buf) => mix_buffer(buf, out),
        AudioBufferRef::U16(buf) => mix_buffer(buf, out),
        AudioBufferRef::U24(buf) => mix_buffer(buf, out),
        AudioBufferRef::U32(buf) => mix_buffer(buf, out),
        AudioBufferRef::S8(buf) => mix_buffer(buf, out),
        AudioBufferRef::S16(buf) => mix_buffer(buf, out),
        AudioBufferRef::S24(buf) => mix_buffer(buf, out),
        AudioBufferRef::S32(buf) => mix_buffer(buf, out),
        AudioBufferRef::F32(buf) => mix_buffer(buf, out),
        AudioBufferRef::F64(buf) => mix_buffer(buf, out),
    }
}

fn mix_buffer<S>(buf: &symphonia::core::audio::AudioBuffer<S>, out: &mut Vec<f32>)
where
    S: symphonia::core::sample::Sample,
    f32: FromSample<S>,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();

    if channels == 0 || frames == 0 {
        return;
    }

    if channels == 1 {
        out.extend(buf.chan(0).iter().map(|&s| f32::from_sample(s)));
    } else {
        let base = out.len();
        out.resize(base + frames, 0.0);
        let scale = 1.0 / channels as f32;
        for ch in 0..channels {
            let channel_data = buf.chan(ch);
            for (i, &sample) in channel_data.iter().enumerate() {
                out[base + i] += f32::from_sample(sample) * scale;
            }
        }
    }
}

/// Resample audio from `from_rate` to `to_rate` using linear interpolation.
///
/// Good enough for feature extraction at 8 kHz; the pipeline never plays
/// audio back, so filter quality is not a concern.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = (samples.len() as f64 / ratio) as usize;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let src_idx = i as f64 * ratio;
        let idx0 = src_idx as usize;
        let frac = (src_idx - idx0 as f64) as f32;
        let s0 = samples[idx0];
        let s1 = if idx0 + 1 < samples.len() {
            samples[idx0 + 1]
        } else {
            s0
        };
        out.push(s0 + frac * (s1 - s0));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_resample_identity() {
        let samples = vec![0.1, 0.2, 0.3, 0.4];
        let out = resample(&samples, 8000, 8000);
        assert_eq!(out, samples);
    }

    #[test]
    fn test_resample_halves_length() {
        let samples: Vec<f32> = (0..1000).map(|i| i as f32 / 1000.0).collect();
        let out = resample(&samples, 16000, 8000);
        assert_eq!(out.len(), 500);
        // A linear ramp survives linear interpolation exactly
        assert!((out[250] - samples[500]).abs() < 1e-6);
    }

    #[test]
    fn test_resample_doubles_length() {
        let samples = vec![0.0, 1.0];
        let out = resample(&samples, 4000, 8000);
        assert_eq!(out.len(), 4);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_resample_empty() {
        let out = resample(&[], 44100, 8000);
        assert!(out.is_empty());
    }

    #[test]
    fn test_decode_missing_file() {
        let result = decode_audio(&PathBuf::from("/nonexistent/song.mp3"), 8000);
        assert!(matches!(result, Err(PipelineError::Decode { .. })));
    }

    #[test]
    fn test_decode_unsupported_content() {
        // A text file with an audio extension must fail the probe
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fake.mp3");
        std::fs::write(&path, b"this is not audio").unwrap();

        let result = decode_audio(&path, 8000);
        assert!(matches!(result, Err(PipelineError::Decode { .. })));
    }
}
