// Corpus discovery: walk a directory tree of audio recordings, derive each
// file's song label from its path, and assign dense integer IDs to labels.
//
// The expected layout is one directory per original song directly under the
// corpus root, each containing that song's recordings:
//
//   covers32k/
//     A_Whiter_Shade_Of_Pale/
//       annie_lennox+Medusa+03.mp3
//       procol_harum+Best_Of+01.mp3
//     Abracadabra/
//       ...
//
// Discovery is cached; a complete cached set of artifacts is trusted
// verbatim with no staleness check against the filesystem (pass force to
// rewalk).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cache::FeatureCache;
use crate::error::PipelineError;

/// Supported audio file extensions
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "aiff", "aif", "m4a", "ogg"];

/// Bidirectional mapping between song labels and dense integer IDs.
/// IDs start at 0 and are assigned in first-encounter order during
/// discovery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelVocabulary {
    names: Vec<String>,
    ids: HashMap<String, u32>,
}

impl LabelVocabulary {
    pub fn get_or_insert(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len() as u32;
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(|s| s.as_str())
    }

    /// Distinct labels, in ID (first-encounter) order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// The discovered corpus: every audio file path under the root plus the
/// label vocabulary built from them. Immutable once constructed; all
/// downstream pipeline stages take it explicitly.
#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
    files: Vec<PathBuf>,
    vocabulary: LabelVocabulary,
}

impl Corpus {
    /// Discover the corpus under `root`, or load a previously cached
    /// discovery.
    ///
    /// The cached file list and vocabulary are trusted blindly: files added
    /// or removed since the cache was written are not noticed. `force`
    /// skips the cache and rewalks the filesystem.
    pub fn discover(
        root: &Path,
        cache: &FeatureCache,
        force: bool,
    ) -> Result<Corpus, PipelineError> {
        if !force {
            if let Some(corpus) = Self::load_cached(root, cache) {
                log::info!(
                    "loaded cached corpus: {} files, {} labels",
                    corpus.files.len(),
                    corpus.vocabulary.len()
                );
                return Ok(corpus);
            }
        }

        let mut files = Vec::new();
        let mut vocabulary = LabelVocabulary::default();

        // Sorted walk so label IDs are reproducible across runs
        for entry in WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(ext) = path.extension() else {
                continue;
            };
            let ext_str = ext.to_string_lossy().to_lowercase();
            if !SUPPORTED_EXTENSIONS.contains(&ext_str.as_str()) {
                continue;
            }

            // Validate the path shape up front so a bad layout fails here,
            // not deep inside feature extraction
            let label = label_for_path(root, path)?;
            vocabulary.get_or_insert(&label);
            files.push(path.to_path_buf());
        }

        log::info!(
            "discovered {} files across {} songs under {}",
            files.len(),
            vocabulary.len(),
            root.display()
        );

        cache.save("all_files", &files)?;
        cache.save("label_to_id", &vocabulary.ids)?;
        cache.save("id_to_label", &vocabulary.names)?;
        cache.save("label_names", &vocabulary.names)?;

        Ok(Corpus {
            root: root.to_path_buf(),
            files,
            vocabulary,
        })
    }

    /// Load a cached discovery. Returns None unless all four artifacts are
    /// present and readable.
    fn load_cached(root: &Path, cache: &FeatureCache) -> Option<Corpus> {
        let files: Vec<PathBuf> = cache.load("all_files")?;
        let ids: HashMap<String, u32> = cache.load("label_to_id")?;
        let names: Vec<String> = cache.load("id_to_label")?;
        let _names_set: Vec<String> = cache.load("label_names")?;

        Some(Corpus {
            root: root.to_path_buf(),
            files,
            vocabulary: LabelVocabulary { names, ids },
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn vocabulary(&self) -> &LabelVocabulary {
        &self.vocabulary
    }

    /// Integer label ID for one of the corpus' files.
    pub fn label_id(&self, path: &Path) -> Result<u32, PipelineError> {
        let label = label_for_path(&self.root, path)?;
        self.vocabulary.id_of(&label).ok_or_else(|| {
            PipelineError::Shape(format!("label '{}' missing from vocabulary", label))
        })
    }
}

/// Extract the song label from a file path: the first path component below
/// the corpus root. Fails with PathShape if the file sits directly under the
/// root (or outside it), since no label directory exists then.
pub fn label_for_path(root: &Path, path: &Path) -> Result<String, PipelineError> {
    let shape_err = || PipelineError::PathShape {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    };

    let rel = path.strip_prefix(root).map_err(|_| shape_err())?;
    let mut components = rel.components();
    let label = components.next().ok_or_else(shape_err)?;
    // The label must be a directory component, not the file name itself
    if components.next().is_none() {
        return Err(shape_err());
    }
    Ok(label.as_os_str().to_string_lossy().into_owned())
}
