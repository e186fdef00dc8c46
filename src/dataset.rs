// Corpus feature pipeline.
//
// Runs the full transform chain over every file in the corpus, pairs each
// feature matrix with a per-frame label vector, stacks everything into
// corpus-wide matrices, and persists the result through the cache. On a
// later run with a complete cache, nothing is recomputed: the pipeline is a
// stateless re-loader.
//
// Processing is single-threaded and sequential, in corpus order. There is
// no partial-progress checkpointing; artifacts are written only after the
// whole corpus has been stacked, so an aborted run leaves no cache and the
// next run starts from scratch. A decode failure on any single file aborts
// the whole run.

use ndarray::{concatenate, Array2, Axis};
use std::path::Path;

use crate::audio::decoder::decode_audio;
use crate::audio::frame::frame;
use crate::audio::mel::mel_spectrogram;
use crate::audio::mfcc::mfcc;
use crate::cache::FeatureCache;
use crate::config::FeatureConfig;
use crate::corpus::Corpus;
use crate::error::PipelineError;

/// How many files between progress log lines.
const PROGRESS_INTERVAL: usize = 4;

/// All five representations of a single audio file, with rows indexing
/// time frames (the frame tensor is built that way; the spectral outputs
/// are transposed from their natural band-by-frame orientation so vertical
/// stacking across files is well-defined).
#[derive(Debug, Clone)]
pub struct FileFeatures {
    /// Raw mono waveform at the analysis sample rate.
    pub waveform: Vec<f32>,
    /// `floor(n / window_size)` x `window_size` frame tensor.
    pub frames: Array2<f32>,
    /// `ceil(n / window_size)` x `n_mels` mel power spectrogram.
    pub mel: Array2<f32>,
    /// Log-amplitude mel spectrogram, same shape as `mel`.
    pub log_mel: Array2<f32>,
    /// `ceil(n / window_size)` x `n_mfcc` cepstral coefficients.
    pub mfcc: Array2<f32>,
}

impl FileFeatures {
    /// Run the full per-file transform chain: decode, frame, mel
    /// spectrogram, log-amplitude, MFCC.
    pub fn extract(path: &Path, config: &FeatureConfig) -> Result<Self, PipelineError> {
        let waveform = decode_audio(path, config.sample_rate)?;
        let frames = frame(&waveform.samples, config.window_size);
        let (s, log_s) = mel_spectrogram(
            &waveform.samples,
            waveform.sample_rate,
            config.window_size,
            config.n_fft,
            config.n_mels,
        );
        let coeffs = mfcc(&log_s, config.n_mfcc);

        Ok(Self {
            waveform: waveform.samples,
            frames,
            mel: s.reversed_axes(),
            log_mel: log_s.reversed_axes(),
            mfcc: coeffs.reversed_axes(),
        })
    }
}

/// Column vector of `n_rows` copies of a file's label ID: the scalar label
/// broadcast to every time frame of its feature matrix.
pub fn label_vector(n_rows: usize, id: u32) -> Array2<u32> {
    Array2::from_elem((n_rows, 1), id)
}

/// The persisted artifact set for a whole corpus: one stacked matrix and
/// one label vector per representation. Raw waveforms differ in length per
/// file, so they stay a list instead of a matrix, with one label per file.
#[derive(Debug, Clone)]
pub struct CorpusDataset {
    pub frame_tensor: Array2<f32>,
    pub mel: Array2<f32>,
    pub log_mel: Array2<f32>,
    pub mfcc: Array2<f32>,
    pub waveforms: Vec<Vec<f32>>,

    pub frame_tensor_labels: Array2<u32>,
    pub mel_labels: Array2<u32>,
    pub log_mel_labels: Array2<u32>,
    pub mfcc_labels: Array2<u32>,
    pub waveform_labels: Vec<u32>,
}

impl CorpusDataset {
    /// Load the full artifact set from the cache. Returns None unless all
    /// ten artifacts are present and readable.
    pub fn load(cache: &FeatureCache) -> Option<CorpusDataset> {
        Some(CorpusDataset {
            frame_tensor: cache.load("frame_tensor")?,
            mel: cache.load("mel")?,
            log_mel: cache.load("log_mel")?,
            mfcc: cache.load("mfcc")?,
            waveforms: cache.load("waveforms")?,
            frame_tensor_labels: cache.load("frame_tensor_labels")?,
            mel_labels: cache.load("mel_labels")?,
            log_mel_labels: cache.load("log_mel_labels")?,
            mfcc_labels: cache.load("mfcc_labels")?,
            waveform_labels: cache.load("waveform_labels")?,
        })
    }

    /// Cache-or-compute entry point: load the dataset if every artifact is
    /// cached, otherwise build it from the corpus and reload. `force` skips
    /// the cache and recomputes unconditionally.
    pub fn load_or_build(
        corpus: &Corpus,
        cache: &FeatureCache,
        config: &FeatureConfig,
        force: bool,
    ) -> Result<CorpusDataset, PipelineError> {
        if !force {
            if let Some(dataset) = Self::load(cache) {
                log::info!(
                    "loaded dataset from cache: {} feature rows",
                    dataset.frame_tensor.nrows()
                );
                return Ok(dataset);
            }
        }

        build_dataset(corpus, cache, config)?;
        Self::load(cache).ok_or_else(|| {
            PipelineError::Shape("dataset artifacts missing immediately after build".to_string())
        })
    }
}

/// Compute and persist the full artifact set for a corpus.
///
/// Feature matrices are stacked and written first, then dropped before the
/// label vectors are stacked, so peak memory stays around one set of
/// stacked matrices instead of two.
pub fn build_dataset(
    corpus: &Corpus,
    cache: &FeatureCache,
    config: &FeatureConfig,
) -> Result<(), PipelineError> {
    let n_files = corpus.files().len();
    log::info!("extracting features from {} files", n_files);

    let mut waveforms: Vec<Vec<f32>> = Vec::with_capacity(n_files);
    let mut frame_list: Vec<Array2<f32>> = Vec::with_capacity(n_files);
    let mut mel_list: Vec<Array2<f32>> = Vec::with_capacity(n_files);
    let mut log_mel_list: Vec<Array2<f32>> = Vec::with_capacity(n_files);
    let mut mfcc_list: Vec<Array2<f32>> = Vec::with_capacity(n_files);

    let mut waveform_labels: Vec<u32> = Vec::with_capacity(n_files);
    let mut frame_label_list: Vec<Array2<u32>> = Vec::with_capacity(n_files);
    let mut mel_label_list: Vec<Array2<u32>> = Vec::with_capacity(n_files);
    let mut log_mel_label_list: Vec<Array2<u32>> = Vec::with_capacity(n_files);
    let mut mfcc_label_list: Vec<Array2<u32>> = Vec::with_capacity(n_files);

    for (i, path) in corpus.files().iter().enumerate() {
        let features = FileFeatures::extract(path, config)?;
        let id = corpus.label_id(path)?;

        frame_label_list.push(label_vector(features.frames.nrows(), id));
        mel_label_list.push(label_vector(features.mel.nrows(), id));
        log_mel_label_list.push(label_vector(features.log_mel.nrows(), id));
        mfcc_label_list.push(label_vector(features.mfcc.nrows(), id));
        waveform_labels.push(id);

        waveforms.push(features.waveform);
        frame_list.push(features.frames);
        mel_list.push(features.mel);
        log_mel_list.push(features.log_mel);
        mfcc_list.push(features.mfcc);

        if (i + 1) % PROGRESS_INTERVAL == 0 {
            log::info!("{} completed.", i + 1);
        }
    }

    // Stack and persist the feature matrices
    let frame_tensor = vstack(frame_list, config.window_size)?;
    let mel = vstack(mel_list, config.n_mels)?;
    let log_mel = vstack(log_mel_list, config.n_mels)?;
    let mfcc = vstack(mfcc_list, config.n_mfcc)?;

    cache.save("frame_tensor", &frame_tensor)?;
    cache.save("mel", &mel)?;
    cache.save("log_mel", &log_mel)?;
    cache.save("mfcc", &mfcc)?;
    cache.save("waveforms", &waveforms)?;
    log::info!("finished computing and writing feature matrices");

    // Free the feature matrices before stacking labels to bound peak memory
    drop(frame_tensor);
    drop(mel);
    drop(log_mel);
    drop(mfcc);
    drop(waveforms);

    let frame_tensor_labels = vstack(frame_label_list, 1)?;
    let mel_labels = vstack(mel_label_list, 1)?;
    let log_mel_labels = vstack(log_mel_label_list, 1)?;
    let mfcc_labels = vstack(mfcc_label_list, 1)?;

    cache.save("frame_tensor_labels", &frame_tensor_labels)?;
    cache.save("mel_labels", &mel_labels)?;
    cache.save("log_mel_labels", &log_mel_labels)?;
    cache.save("mfcc_labels", &mfcc_labels)?;
    cache.save("waveform_labels", &waveform_labels)?;
    log::info!("finished computing and writing label vectors");

    Ok(())
}

/// Vertically stack per-file matrices into one corpus-wide matrix.
/// An empty corpus yields a 0 x `ncols` matrix.
fn vstack<A: Clone + Default>(
    mats: Vec<Array2<A>>,
    ncols: usize,
) -> Result<Array2<A>, PipelineError> {
    if mats.is_empty() {
        return Ok(Array2::from_elem((0, ncols), A::default()));
    }
    let views: Vec<_> = mats.iter().map(|m| m.view()).collect();
    concatenate(Axis(0), &views).map_err(|e| PipelineError::Shape(e.to_string()))
}
