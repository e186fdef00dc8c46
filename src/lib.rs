// coverfeat: batch feature extraction for cover-song classification.
//
// Two layers, strictly ordered: the signal transform library (audio::*) maps
// one file to its numeric representations, and the corpus pipeline (corpus,
// dataset, cache) walks a directory tree, labels every feature row with its
// source song, and persists the stacked result.

pub mod audio;
pub mod cache;
pub mod config;
pub mod corpus;
pub mod dataset;
pub mod error;

pub use cache::FeatureCache;
pub use config::FeatureConfig;
pub use corpus::{Corpus, LabelVocabulary};
pub use dataset::{CorpusDataset, FileFeatures};
pub use error::PipelineError;
