// Numeric persistence collaborator.
//
// Every corpus artifact (file list, vocabulary, feature matrices, label
// vectors) is one named JSON file in the cache directory. Loading follows
// cache-or-compute semantics: a missing or unreadable artifact is reported
// as absence, never as an error, so the pipeline falls back to
// recomputation.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use crate::error::PipelineError;

pub struct FeatureCache {
    dir: PathBuf,
}

impl FeatureCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Serialize `value` to `<dir>/<name>.json`, creating the cache
    /// directory if needed. Write failures are fatal.
    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<(), PipelineError> {
        std::fs::create_dir_all(&self.dir)?;
        let file = File::create(self.artifact_path(name))?;
        serde_json::to_writer(BufWriter::new(file), value)?;
        Ok(())
    }

    /// Load a named artifact. Returns None if the artifact is absent or
    /// unreadable (the normal cold-start path).
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.artifact_path(name);
        let file = File::open(&path).ok()?;
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("ignoring unreadable cache artifact {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = FeatureCache::new(dir.path());

        let data = vec![1.0f32, 2.0, 3.5];
        cache.save("numbers", &data).unwrap();

        let loaded: Vec<f32> = cache.load("numbers").unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn test_load_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let cache = FeatureCache::new(dir.path());

        let loaded: Option<Vec<f32>> = cache.load("never_written");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_corrupt_artifact_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = FeatureCache::new(dir.path());

        std::fs::write(dir.path().join("broken.json"), b"{not valid json").unwrap();

        let loaded: Option<Vec<f32>> = cache.load("broken");
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_creates_cache_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let cache = FeatureCache::new(&nested);

        cache.save("x", &42u32).unwrap();
        assert!(nested.join("x.json").exists());
        let loaded: u32 = cache.load("x").unwrap();
        assert_eq!(loaded, 42);
    }

    #[test]
    fn test_matrix_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = FeatureCache::new(dir.path());

        let matrix = ndarray::Array2::<f32>::from_shape_fn((3, 4), |(r, c)| (r * 4 + c) as f32);
        cache.save("matrix", &matrix).unwrap();

        let loaded: ndarray::Array2<f32> = cache.load("matrix").unwrap();
        assert_eq!(loaded, matrix);
    }
}
