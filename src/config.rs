// Fixed parameters of the feature extraction chain.
//
// The whole corpus is processed with one configuration; mixing configurations
// across files would make the stacked matrices meaningless.

/// Feature extraction parameters.
#[derive(Debug, Clone, Copy)]
pub struct FeatureConfig {
    /// Target sample rate every file is resampled to before analysis.
    pub sample_rate: u32,
    /// Frame length for the frame tensor, and hop length for the
    /// mel spectrogram.
    pub window_size: usize,
    /// FFT size for the mel spectrogram. Larger than the hop, so consecutive
    /// analysis windows overlap.
    pub n_fft: usize,
    /// Number of mel bands.
    pub n_mels: usize,
    /// Number of cepstral coefficients kept from the DCT.
    pub n_mfcc: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 8000,
            window_size: 512,
            n_fft: 2048,
            n_mels: 128,
            n_mfcc: 13,
        }
    }
}
