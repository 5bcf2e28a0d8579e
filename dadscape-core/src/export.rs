//! Sharing diaries as standalone JSON files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::Diary;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Diary not found: {0}")]
    NotFound(String),

    #[error("I/O error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid diary JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Replaces anything outside `[A-Za-z0-9_-]` with `_` and appends `.json`.
pub fn export_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.json", sanitized)
}

pub fn to_json(diary: &Diary) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(diary)?)
}

pub fn from_json(json: &str) -> Result<Diary, ExportError> {
    Ok(serde_json::from_str(json)?)
}

/// Writes `diary` to `dir/<sanitized file_name>.json`, creating `dir` if needed.
pub fn write_file(diary: &Diary, dir: &Path, file_name: &str) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(export_file_name(file_name));
    fs::write(&path, to_json(diary)?).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::info!(name = %diary.name, path = %path.display(), "Exported diary");
    Ok(path)
}

pub fn read_file(path: &Path) -> Result<Diary, ExportError> {
    let json = fs::read_to_string(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let diary = from_json(&json)?;
    tracing::info!(name = %diary.name, path = %path.display(), "Read diary file");
    Ok(diary)
}

/// `*.json` files in `dir`, sorted by name. A missing directory has none.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ExportError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}
