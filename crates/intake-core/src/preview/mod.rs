//! Preview generation and the preview handle registry.
//!
//! Previews are derived from a file's bytes right after a successful read:
//!
//! | File Type | Preview Method | Budget |
//! |-----------|----------------|--------|
//! | Images | Thumbnail (256x256 PNG, base64) | 50KB |
//! | Text | First 1KB of content | 1KB |
//! | Other | Icon with metadata only | - |
//!
//! A generated preview is parked in a [`PreviewRegistry`] behind an opaque
//! `preview://<uuid>` handle. Handles are process-wide resources: whoever
//! owns the session owns its handles and must revoke them on removal and
//! teardown, or the registry keeps the preview bytes alive indefinitely.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PreviewConfig;
use crate::error::{Error, Result};
use crate::file::FileHandle;

/// Type of preview generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewKind {
    /// Image thumbnail
    Thumbnail,
    /// Text snippet
    Text,
    /// Generic icon with metadata only
    Icon,
}

/// A generated file preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewData {
    /// Type of preview
    pub kind: PreviewKind,
    /// Preview data (base64 encoded for thumbnails, raw for text)
    pub data: String,
    /// MIME type of the preview data
    pub mime_type: String,
    /// Size of the original file
    pub original_size: u64,
    /// Original image dimensions, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<(u32, u32)>,
}

/// An opaque, revocable handle to a registered preview.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreviewUrl {
    id: Uuid,
}

impl PreviewUrl {
    /// Parse a `preview://<uuid>` string back into a handle.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let id = input.strip_prefix("preview://")?;
        Uuid::parse_str(id).ok().map(|id| Self { id })
    }
}

impl fmt::Display for PreviewUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preview://{}", self.id)
    }
}

/// Registry of live preview handles.
///
/// The analogue of the platform object-URL registry: entries survive until
/// explicitly revoked, independent of which session created them.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    entries: Mutex<HashMap<Uuid, Arc<PreviewData>>>,
}

impl PreviewRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared process-wide registry.
    #[must_use]
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<PreviewRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(Self::new())).clone()
    }

    /// Register a preview, minting a fresh handle for it.
    #[must_use]
    pub fn register(&self, data: PreviewData) -> PreviewUrl {
        let id = Uuid::new_v4();
        self.entries
            .lock()
            .expect("preview registry poisoned")
            .insert(id, Arc::new(data));
        PreviewUrl { id }
    }

    /// Look up the preview behind a handle.
    #[must_use]
    pub fn resolve(&self, url: &PreviewUrl) -> Option<Arc<PreviewData>> {
        self.entries
            .lock()
            .expect("preview registry poisoned")
            .get(&url.id)
            .cloned()
    }

    /// Release a handle, dropping its preview bytes.
    ///
    /// Returns whether the handle was still live.
    pub fn revoke(&self, url: &PreviewUrl) -> bool {
        let released = self
            .entries
            .lock()
            .expect("preview registry poisoned")
            .remove(&url.id)
            .is_some();
        if released {
            tracing::debug!(%url, "preview handle revoked");
        }
        released
    }

    /// Number of live handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("preview registry poisoned")
            .len()
    }
}

/// Preview generator.
#[derive(Debug, Clone)]
pub struct PreviewGenerator {
    config: PreviewConfig,
}

impl PreviewGenerator {
    /// Create a new preview generator with default config.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PreviewConfig::default())
    }

    /// Create a new preview generator with custom config.
    #[must_use]
    pub const fn with_config(config: PreviewConfig) -> Self {
        Self { config }
    }

    /// Generate a preview from a file's bytes.
    ///
    /// Undecodable images degrade to an icon preview rather than failing.
    ///
    /// # Errors
    ///
    /// Returns an error only when thumbnail encoding itself fails.
    pub fn generate(&self, file: &FileHandle, bytes: &[u8]) -> Result<PreviewData> {
        match self.kind_for(file.mime_type()) {
            PreviewKind::Thumbnail => self.generate_thumbnail(file, bytes),
            PreviewKind::Text => Ok(self.generate_text(file, bytes)),
            PreviewKind::Icon => Ok(self.icon(file)),
        }
    }

    fn kind_for(&self, mime: &str) -> PreviewKind {
        if mime.starts_with("image/") {
            PreviewKind::Thumbnail
        } else if mime.starts_with("text/") {
            PreviewKind::Text
        } else {
            PreviewKind::Icon
        }
    }

    fn generate_thumbnail(&self, file: &FileHandle, bytes: &[u8]) -> Result<PreviewData> {
        use image::GenericImageView;
        use std::io::Cursor;

        let Ok(img) = image::load_from_memory(bytes) else {
            // Unsupported or corrupt image data: fall back to an icon
            return Ok(self.icon(file));
        };

        let (width, height) = img.dimensions();
        let (max_w, max_h) = self.config.thumbnail_size;
        let thumb = img.thumbnail(max_w, max_h);

        let mut buf = Vec::new();
        let mut cursor = Cursor::new(&mut buf);
        thumb
            .write_to(&mut cursor, image::ImageFormat::Png)
            .map_err(|e| Error::PreviewFailed {
                file: file.name().to_string(),
                reason: e.to_string(),
            })?;

        if buf.len() > self.config.max_thumbnail_bytes {
            tracing::debug!(
                name = file.name(),
                size = buf.len(),
                "thumbnail over budget, degrading to icon"
            );
            return Ok(self.icon(file));
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(&buf);

        Ok(PreviewData {
            kind: PreviewKind::Thumbnail,
            data: encoded,
            mime_type: "image/png".to_string(),
            original_size: file.size(),
            dimensions: Some((width, height)),
        })
    }

    fn generate_text(&self, file: &FileHandle, bytes: &[u8]) -> PreviewData {
        let end = bytes.len().min(self.config.max_text_length);
        let text = String::from_utf8_lossy(&bytes[..end]).into_owned();

        PreviewData {
            kind: PreviewKind::Text,
            data: text,
            mime_type: "text/plain".to_string(),
            original_size: file.size(),
            dimensions: None,
        }
    }

    fn icon(&self, file: &FileHandle) -> PreviewData {
        PreviewData {
            kind: PreviewKind::Icon,
            data: String::new(),
            mime_type: file.mime_type().to_string(),
            original_size: file.size(),
            dimensions: None,
        }
    }
}

impl Default for PreviewGenerator {
    fn default() -> Self {
        Self::new()
    }
}
