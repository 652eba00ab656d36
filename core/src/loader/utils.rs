use glob::glob;
use std::{
    io,
    path::{Path, PathBuf},
};
use tracing::warn;
use walkdir::WalkDir;

use super::LoaderError;

pub(super) fn resolve_input_to_files(inputs: &[String]) -> Result<Vec<PathBuf>, LoaderError> {
    let mut files = Vec::new();

    for input in inputs {
        for entry in glob(input)? {
            match entry {
                Ok(path) => {
                    if path.is_dir() {
                        for entry in WalkDir::new(path) {
                            let entry = entry.map_err(io::Error::from)?;
                            if entry.file_type().is_file() {
                                files.push(entry.path().to_path_buf());
                            }
                        }
                    } else if path.is_file() {
                        files.push(path);
                    }
                }
                Err(e) => warn!(error = %e, "Glob error"),
            }
        }
    }

    Ok(files)
}

#[cfg(feature = "pdf")]
pub(super) fn parse_file(file_path: &Path) -> io::Result<String> {
    match file_path.extension() {
        Some(ext) if ext == "pdf" => pdf_extract::extract_text(file_path)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Failed to parse PDF: {e}"))),
        _ => std::fs::read_to_string(file_path),
    }
}

#[cfg(not(feature = "pdf"))]
pub(super) fn parse_file(file_path: &Path) -> io::Result<String> {
    std::fs::read_to_string(file_path)
}
