//! Bulk ingestion of documents from files.
//!
//! Paths are resolved from glob patterns; directories matched by a pattern are
//! walked recursively. Each file becomes a [`DocumentInput`] whose id is the file
//! path and whose title is the file name. PDFs are parsed when the `pdf` feature
//! is enabled, every other file is read as UTF-8 text.

mod utils;

use glob::Pattern;
use thiserror::Error;
use tracing::{debug, warn};

use crate::document::DocumentInput;
use utils::{parse_file, resolve_input_to_files};

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Invalid glob-pattern")]
    InvalidGlobPattern(#[from] glob::PatternError),
    #[error("No matching documents found")]
    NoMatchingDocuments,
    #[error("Failed to read files: {0}")]
    Io(#[from] std::io::Error),
    #[error("Loader task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Files read by [`FileLoader::load`], plus the ones that could not be read.
#[derive(Debug, Default)]
pub struct LoadedFiles {
    pub documents: Vec<DocumentInput>,
    /// Path and read error of every unreadable file.
    pub failed: Vec<(String, LoaderError)>,
}

/// Reads the files matching a set of glob patterns.
pub struct FileLoader {
    glob_patterns: Vec<String>,
}

impl FileLoader {
    /// Validates the patterns up front.
    pub fn new(glob_patterns: Vec<String>) -> Result<Self, LoaderError> {
        for p in &glob_patterns {
            Pattern::new(p)?;
        }
        Ok(Self { glob_patterns })
    }

    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.glob_patterns
    }

    /// Reads every matching file. A file that cannot be read lands in
    /// [`LoadedFiles::failed`] instead of failing the whole load.
    pub async fn load(&self) -> Result<LoadedFiles, LoaderError> {
        let patterns = self.glob_patterns.clone();
        tokio::task::spawn_blocking(move || {
            let files = resolve_input_to_files(&patterns)?;
            if files.is_empty() {
                return Err(LoaderError::NoMatchingDocuments);
            }

            let mut loaded = LoadedFiles::default();
            for path in files {
                match parse_file(&path) {
                    Ok(content) => {
                        let title = path
                            .file_name()
                            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
                        debug!(path = %path.display(), bytes = content.len(), "Loaded file");
                        loaded
                            .documents
                            .push(DocumentInput::new(path.display().to_string(), title, content));
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to read file");
                        loaded.failed.push((path.display().to_string(), e.into()));
                    }
                }
            }
            Ok(loaded)
        })
        .await?
    }
}
