// Frame tensor: the raw waveform sliced into non-overlapping windows.

use ndarray::Array2;

/// Slice `samples` into non-overlapping frames of `window_size` samples.
///
/// Returns a matrix of `floor(n / window_size)` rows by `window_size`
/// columns. Trailing samples that do not fill a complete frame are dropped;
/// there is no padding, so up to `window_size - 1` samples at the end of the
/// signal never appear in the output.
pub fn frame(samples: &[f32], window_size: usize) -> Array2<f32> {
    let n_frames = samples.len() / window_size;
    Array2::from_shape_fn((n_frames, window_size), |(row, col)| {
        samples[row * window_size + col]
    })
}
