//! Candidate file handles for intake.
//!
//! This module handles:
//! - Wrapping selected or dropped files with their name, MIME type and size
//! - Expanding dropped directories into their contained files
//! - Size formatting for display
//!
//! A [`FileHandle`] is what the picker/drop surface delivers to a session.
//! It carries the platform handle (a path) or, for synthetic input, the
//! bytes themselves; nothing is read until the session's reader runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Where a candidate file's bytes live.
#[derive(Debug, Clone)]
pub enum Source {
    /// A file on disk, read lazily by the session reader
    Path(PathBuf),
    /// In-memory bytes (pasted content, tests)
    Memory(Arc<[u8]>),
}

/// A file offered to an intake session.
///
/// Created on selection or drop, before validation; owned by the session
/// once accepted.
#[derive(Debug, Clone)]
pub struct FileHandle {
    name: String,
    mime_type: String,
    size: u64,
    source: Source,
}

impl FileHandle {
    /// Create a handle from a file on disk.
    ///
    /// The MIME type is guessed from the file name; files with no
    /// recognizable extension fall back to [`crate::FALLBACK_MIME`].
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a regular file or its metadata
    /// cannot be read.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .map_err(|_| Error::FileNotFound(path.display().to_string()))?;

        if !metadata.is_file() {
            return Err(Error::InvalidPath(format!(
                "not a regular file: {}",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or_else(|| "unknown".to_string(), str::to_string);

        Ok(Self {
            mime_type: guess_mime(path),
            size: metadata.len(),
            source: Source::Path(path.to_path_buf()),
            name,
        })
    }

    /// Create a handle from in-memory bytes.
    ///
    /// The MIME type is guessed from `name`.
    #[must_use]
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let bytes = bytes.into();
        Self {
            mime_type: guess_mime(Path::new(&name)),
            size: bytes.len() as u64,
            source: Source::Memory(bytes),
            name,
        }
    }

    /// File name as presented by the picker or drop.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type, never empty.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Override the guessed MIME type (the platform surface may know better).
    #[must_use]
    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        let mime = mime.into();
        self.mime_type = if mime.is_empty() {
            crate::FALLBACK_MIME.to_string()
        } else {
            mime
        };
        self
    }

    /// Size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// The underlying byte source.
    #[must_use]
    pub const fn source(&self) -> &Source {
        &self.source
    }
}

fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map_or_else(|| crate::FALLBACK_MIME.to_string(), |m| m.to_string())
}

/// Expand a set of dropped paths into file handles.
///
/// Plain files map one-to-one; directories are walked recursively with
/// hidden entries skipped. The result is ordered: input order for the
/// top-level paths, name order within a directory.
///
/// # Errors
///
/// Returns an error if a path does not exist or cannot be read.
pub fn collect_paths(paths: &[PathBuf]) -> Result<Vec<FileHandle>> {
    let mut handles = Vec::new();

    for path in paths {
        if path.is_file() {
            handles.push(FileHandle::from_path(path)?);
        } else if path.is_dir() {
            collect_directory(path, &mut handles)?;
        } else {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
    }

    Ok(handles)
}

fn collect_directory(dir: &Path, handles: &mut Vec<FileHandle>) -> Result<()> {
    let mut entries: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_none_or(|name| !name.starts_with('.'))
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    entries.sort();

    for path in entries {
        handles.push(FileHandle::from_path(&path)?);
    }

    Ok(())
}

/// Format a file size for display.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
