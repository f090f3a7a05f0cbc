//! File enumeration.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::EngineError;

/// Default inclusion predicate: Solidity sources.
pub fn is_solidity_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "sol")
}

/// Enumerate candidate files under `target`, recursing into directories and
/// applying `filter` to file entries only. A file target yields itself. The
/// result is sorted, so scheduling order is deterministic.
pub fn list_files(
    target: &Path,
    filter: &(dyn Fn(&Path) -> bool + Send + Sync),
) -> Result<Vec<PathBuf>, EngineError> {
    let meta = std::fs::metadata(target).map_err(|source| EngineError::Io {
        path: target.to_path_buf(),
        source,
    })?;
    if meta.is_file() {
        return Ok(if filter(target) {
            vec![target.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(target).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(target).to_path_buf();
            match e.into_io_error() {
                Some(source) => EngineError::Io { path, source },
                None => EngineError::Io {
                    path,
                    source: std::io::Error::other("walk error"),
                },
            }
        })?;
        if entry.file_type().is_file() && filter(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
