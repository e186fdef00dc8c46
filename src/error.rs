// Error taxonomy for the feature pipeline.
//
// Everything here is terminal for the current run: there is no retry logic.
// Cache *read* problems are deliberately not represented — an absent or
// unreadable artifact is a cache miss and falls back to recomputation.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Audio file missing, unreadable, or not a supported format.
    /// Fatal to the whole corpus run; the operator must remove or fix
    /// the offending file and restart.
    #[error("failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// A discovered file sits directly under the corpus root, so no label
    /// segment can be extracted. Raised up front at discovery rather than
    /// deep inside feature computation.
    #[error("{} has no label directory under corpus root {}", path.display(), root.display())]
    PathShape { path: PathBuf, root: PathBuf },

    /// Cache write failure (creating the cache directory or an artifact file).
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache artifact could not be serialized.
    #[error("cache serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Per-file matrices disagreed on column count while stacking.
    /// Unreachable for a corpus processed with one FeatureConfig.
    #[error("failed to stack feature matrices: {0}")]
    Shape(String),
}
