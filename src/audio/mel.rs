// Mel-scaled power spectrogram and its log-amplitude transform.
//
// Algorithm overview:
// 1. Slide a Hann-windowed FFT frame across the signal, centered on multiples
//    of the hop length and zero-padded at the edges, so the frame count is
//    ceil(n / hop) regardless of signal length
// 2. FFT each frame and take the power spectrum (magnitude squared)
// 3. Collapse FFT bins into mel bands through a triangular filterbank
//    (HTK mel scale: mel = 2595 * log10(1 + hz / 700))
// 4. Log-amplitude: 10 * log10(power), referenced to the maximum power in
//    the spectrogram, floored 80 dB below the peak
//
// The 0 dB reference is recomputed per call from the input's own maximum, so
// the same frame has different log values depending on what else is in the
// slice it was computed from.

use ndarray::Array2;
use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::PI;

/// Power floor before taking logs, to avoid log(0) on silence.
const AMIN: f32 = 1e-10;

/// Dynamic range of the log spectrogram: values more than 80 dB below the
/// peak are clamped.
const TOP_DB: f32 = 80.0;

/// Compute a mel power spectrogram and its log-amplitude transform.
///
/// Returns `(S, log_S)`, both of shape `(n_mels, ceil(n / window_size))`
/// where `window_size` is the hop between consecutive analysis frames.
/// `log_S` maps the loudest frame-band to 0 dB.
pub fn mel_spectrogram(
    samples: &[f32],
    sample_rate: u32,
    window_size: usize,
    n_fft: usize,
    n_mels: usize,
) -> (Array2<f32>, Array2<f32>) {
    let n_frames = samples.len().div_ceil(window_size);
    let n_bins = n_fft / 2 + 1;

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n_fft);

    // Hann window
    let window: Vec<f32> = (0..n_fft)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / n_fft as f32).cos()))
        .collect();

    let filterbank = mel_filterbank(sample_rate, n_fft, n_mels);

    let mut s = Array2::<f32>::zeros((n_mels, n_frames));
    let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];

    for t in 0..n_frames {
        // Frame centered on t * hop; out-of-range positions are zero
        let center = (t * window_size) as isize;
        let start = center - (n_fft / 2) as isize;
        for (i, slot) in buffer.iter_mut().enumerate() {
            let idx = start + i as isize;
            let sample = if idx >= 0 && (idx as usize) < samples.len() {
                samples[idx as usize]
            } else {
                0.0
            };
            *slot = Complex::new(sample * window[i], 0.0);
        }

        fft.process(&mut buffer);

        for (m, filter) in filterbank.iter().enumerate() {
            let mut energy = 0.0f32;
            for (bin, &weight) in filter.iter().enumerate().take(n_bins) {
                if weight > 0.0 {
                    energy += buffer[bin].norm_sqr() * weight;
                }
            }
            s[[m, t]] = energy;
        }
    }

    let log_s = power_to_db(&s);
    (s, log_s)
}

/// Convert a power spectrogram to decibels referenced to its own maximum,
/// so the loudest frame-band maps to 0 dB. Output is clamped to
/// `[-TOP_DB, 0]`.
pub fn power_to_db(s: &Array2<f32>) -> Array2<f32> {
    let ref_power = s.iter().cloned().fold(AMIN, f32::max);
    let ref_db = 10.0 * ref_power.log10();
    let mut out = s.mapv(|p| 10.0 * p.max(AMIN).log10() - ref_db);
    let floor = -TOP_DB;
    out.mapv_inplace(|db| db.max(floor));
    out
}

/// Build a triangular mel filterbank mapping `n_fft / 2 + 1` FFT bins to
/// `n_mels` bands spanning 0 Hz to Nyquist.
fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Vec<Vec<f32>> {
    let n_bins = n_fft / 2 + 1;

    let hz_to_mel = |hz: f32| 2595.0 * (1.0 + hz / 700.0).log10();
    let mel_to_hz = |mel: f32| 700.0 * (10.0f32.powf(mel / 2595.0) - 1.0);

    let mel_min = hz_to_mel(0.0);
    let mel_max = hz_to_mel(sample_rate as f32 / 2.0);

    // n_mels + 2 equally spaced points on the mel axis: each band's
    // left edge, center, and right edge
    let bin_points: Vec<usize> = (0..=n_mels + 1)
        .map(|i| {
            let mel = mel_min + (mel_max - mel_min) * i as f32 / (n_mels + 1) as f32;
            let hz = mel_to_hz(mel);
            ((n_fft as f32 * hz / sample_rate as f32).round() as usize).min(n_bins - 1)
        })
        .collect();

    let mut filterbank = vec![vec![0.0f32; n_bins]; n_mels];

    for m in 0..n_mels {
        let left = bin_points[m];
        let center = bin_points[m + 1];
        let right = bin_points[m + 2];

        for k in left..center {
            if center > left {
                filterbank[m][k] = (k - left) as f32 / (center - left) as f32;
            }
        }
        for k in center..=right {
            if right > center {
                filterbank[m][k] = (right - k) as f32 / (right - center) as f32;
            }
        }
    }

    filterbank
}
