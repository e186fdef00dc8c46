// Mel-frequency cepstral coefficients.
//
// The MFCCs are the low-order terms of an orthonormal DCT-II applied to each
// column (time frame) of the log-mel spectrogram. Keeping only the first 13
// coefficients compresses 128 mel bands into a compact spectral-envelope
// descriptor.

use ndarray::Array2;
use std::f32::consts::PI;

/// Derive cepstral coefficients from a log-mel spectrogram.
///
/// `log_s` has shape `(n_mels, n_frames)`; the output has shape
/// `(n_mfcc, n_frames)`.
pub fn mfcc(log_s: &Array2<f32>, n_mfcc: usize) -> Array2<f32> {
    let n_mels = log_s.nrows();
    let n_frames = log_s.ncols();

    let mut out = Array2::<f32>::zeros((n_mfcc, n_frames));
    if n_mels == 0 {
        return out;
    }

    // Orthonormal DCT-II scale factors
    let scale0 = (1.0 / n_mels as f32).sqrt();
    let scale = (2.0 / n_mels as f32).sqrt();

    for t in 0..n_frames {
        for k in 0..n_mfcc {
            let mut acc = 0.0f32;
            for m in 0..n_mels {
                let angle = PI * k as f32 * (2.0 * m as f32 + 1.0) / (2.0 * n_mels as f32);
                acc += log_s[[m, t]] * angle.cos();
            }
            out[[k, t]] = acc * if k == 0 { scale0 } else { scale };
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_mfcc_shape() {
        let log_s = Array2::<f32>::zeros((128, 10));
        let coeffs = mfcc(&log_s, 13);
        assert_eq!(coeffs.shape(), &[13, 10]);
    }

    #[test]
    fn test_mfcc_shape_matches_input_frames() {
        for n_frames in [0, 1, 7, 64] {
            let log_s = Array2::<f32>::zeros((128, n_frames));
            let coeffs = mfcc(&log_s, 13);
            assert_eq!(coeffs.nrows(), 13);
            assert_eq!(coeffs.ncols(), n_frames);
        }
    }

    #[test]
    fn test_mfcc_constant_input_is_dc_only() {
        // A constant column has all its energy in coefficient 0
        let log_s = Array2::<f32>::from_elem((128, 3), -20.0);
        let coeffs = mfcc(&log_s, 13);

        let expected_c0 = -20.0 * 128.0 * (1.0f32 / 128.0).sqrt();
        for t in 0..3 {
            assert!((coeffs[[0, t]] - expected_c0).abs() < 1e-3);
            for k in 1..13 {
                assert!(
                    coeffs[[k, t]].abs() < 1e-3,
                    "c[{}] = {} should be ~0 for constant input",
                    k,
                    coeffs[[k, t]]
                );
            }
        }
    }

    #[test]
    fn test_mfcc_single_basis_function() {
        // Input equal to DCT basis function k=2 should excite only c[2]
        let n_mels = 128;
        let log_s = Array2::from_shape_fn((n_mels, 1), |(m, _)| {
            (PI * 2.0 * (2.0 * m as f32 + 1.0) / (2.0 * n_mels as f32)).cos()
        });
        let coeffs = mfcc(&log_s, 13);

        for k in 0..13 {
            if k == 2 {
                assert!(coeffs[[k, 0]].abs() > 1.0, "c[2] should be large");
            } else {
                assert!(
                    coeffs[[k, 0]].abs() < 1e-3,
                    "c[{}] = {} should be ~0",
                    k,
                    coeffs[[k, 0]]
                );
            }
        }
    }
}
