//! Parallel file reading with progress tracking.
//!
//! The [`Reader`] turns a batch of accepted [`FileHandle`]s into payloads:
//!
//! - One task per file, all started at once; a batch of N files is N
//!   concurrent reads
//! - Files are read in fixed-size chunks; every chunk updates the shared
//!   [`ProgressTracker`], so observers see per-file percentages and one
//!   aggregate percentage computed from loaded/total byte counts
//! - The batch fails on the first read error while sibling reads keep
//!   running; they are never cancelled, only unobserved
//! - On success the payloads preserve the input order of the batch
//!
//! Aborts come only from an external [`AbortHandle`]; there is no caller
//! cancellation of an individual read once started, and no timeout.

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::Engine;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::file::{FileHandle, Source};

/// What the reader produces for each file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadMode {
    /// Base64 payload, renderable as a `data:` URL
    DataUrl,
    /// Lossy UTF-8 text
    Text,
    /// Raw bytes
    #[default]
    Buffer,
}

/// The decoded result of reading one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Base64-encoded bytes
    Base64(String),
    /// Text content
    Text(String),
    /// Raw bytes
    Buffer(Vec<u8>),
}

impl Payload {
    /// Render a base64 payload as a `data:` URL for the given MIME type.
    ///
    /// Returns `None` for text and buffer payloads.
    #[must_use]
    pub fn data_url(&self, mime: &str) -> Option<String> {
        match self {
            Self::Base64(encoded) => Some(format!("data:{mime};base64,{encoded}")),
            Self::Text(_) | Self::Buffer(_) => None,
        }
    }

    /// Length of the payload in its stored representation.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Base64(s) | Self::Text(s) => s.len(),
            Self::Buffer(b) => b.len(),
        }
    }
}

/// Byte-level progress of one file's read.
#[derive(Debug, Clone, Copy, Default)]
struct FileBytes {
    loaded: u64,
    total: u64,
    done: bool,
}

/// A point-in-time view of read progress across the session's files.
///
/// Entries are keyed by file index and stay index-aligned with the
/// session's accepted-file list.
#[derive(Debug, Clone, Default)]
pub struct ProgressSnapshot {
    files: BTreeMap<usize, FileBytes>,
}

impl ProgressSnapshot {
    /// Per-file progress for `index` as a 0-100 integer.
    ///
    /// Unknown indices report zero.
    #[must_use]
    pub fn file_percent(&self, index: usize) -> u8 {
        self.files.get(&index).map_or(0, |f| {
            if f.done {
                100
            } else if f.total == 0 {
                0
            } else {
                u8::try_from(f.loaded.saturating_mul(100) / f.total).unwrap_or(100)
            }
        })
    }

    /// All per-file percentages, keyed by file index.
    #[must_use]
    pub fn per_file(&self) -> BTreeMap<usize, u8> {
        self.files
            .keys()
            .map(|&index| (index, self.file_percent(index)))
            .collect()
    }

    /// Aggregate progress as a percentage (0.0 - 100.0).
    ///
    /// Total loaded bytes across all files divided by the sum of all file
    /// sizes; an empty set reads 100.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.is_complete() {
            return 100.0;
        }

        let total: u64 = self.files.values().map(|f| f.total).sum();
        if total == 0 {
            return 0.0;
        }

        let loaded: u64 = self.files.values().map(|f| f.loaded).sum();
        (loaded as f64 / total as f64) * 100.0
    }

    /// Whether every tracked file has completed reading.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.files.values().all(|f| f.done)
    }

    /// Number of tracked files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }
}

/// Shared progress state, updated by reader tasks and observed over a
/// watch channel.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    tx: watch::Sender<ProgressSnapshot>,
}

impl ProgressTracker {
    /// Create a tracker with no files registered.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressSnapshot::default());
        Self { tx }
    }

    /// Subscribe to progress snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.tx.subscribe()
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.tx.borrow().clone()
    }

    /// Register a new batch of files starting at `base` with the given sizes.
    pub fn begin_batch(&self, base: usize, sizes: &[u64]) {
        self.tx.send_modify(|snapshot| {
            for (offset, &total) in sizes.iter().enumerate() {
                snapshot.files.insert(
                    base + offset,
                    FileBytes {
                        loaded: 0,
                        total,
                        done: false,
                    },
                );
            }
        });
    }

    /// Report loaded bytes for one file.
    ///
    /// Reaching the file's total marks it complete.
    pub fn report(&self, index: usize, loaded: u64) {
        self.tx.send_modify(|snapshot| {
            if let Some(file) = snapshot.files.get_mut(&index) {
                file.loaded = loaded.min(file.total);
                if file.total > 0 && file.loaded >= file.total {
                    file.done = true;
                }
            }
        });
    }

    /// Mark one file's read as complete.
    pub fn mark_complete(&self, index: usize) {
        self.tx.send_modify(|snapshot| {
            if let Some(file) = snapshot.files.get_mut(&index) {
                file.loaded = file.total;
                file.done = true;
            }
        });
    }

    /// Drop the entry at `index`, shifting higher indices down by one.
    pub fn remove(&self, index: usize) {
        self.tx.send_modify(|snapshot| {
            snapshot.files = snapshot
                .files
                .iter()
                .filter(|&(&i, _)| i != index)
                .map(|(&i, &bytes)| if i > index { (i - 1, bytes) } else { (i, bytes) })
                .collect();
        });
    }

    /// Drop every entry at `start` or above, keeping lower entries intact.
    ///
    /// Used to back out a batch whose read failed before commit.
    pub fn truncate_from(&self, start: usize) {
        self.tx.send_modify(|snapshot| {
            snapshot.files.retain(|&i, _| i < start);
        });
    }

    /// Forget every tracked file.
    pub fn clear(&self) {
        self.tx.send_modify(|snapshot| snapshot.files.clear());
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle used to abort in-flight reads from outside the session.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    tx: Arc<watch::Sender<bool>>,
}

/// Signal observed by reader tasks between chunks.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortHandle {
    /// Create a connected handle/signal pair.
    #[must_use]
    pub fn new() -> (Self, AbortSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, AbortSignal { rx })
    }

    /// Abort every read observing the paired signal.
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }
}

impl AbortSignal {
    /// Whether the paired handle has fired.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Reads accepted files into payloads, in parallel, with progress.
#[derive(Debug, Clone)]
pub struct Reader {
    mode: ReadMode,
    chunk_size: usize,
}

impl Reader {
    /// Create a reader.
    #[must_use]
    pub const fn new(mode: ReadMode, chunk_size: usize) -> Self {
        Self { mode, chunk_size }
    }

    /// Read every file in the batch, starting all reads at once.
    ///
    /// Progress entries are registered at `base + i` for the i-th file, so
    /// a session appending to an existing list passes its current length
    /// as `base`. Payloads preserve the batch's input order.
    ///
    /// # Errors
    ///
    /// Fails with the first read error; sibling reads continue running but
    /// their results are discarded.
    pub async fn read_all(
        &self,
        files: &[FileHandle],
        base: usize,
        tracker: &ProgressTracker,
        abort: Option<AbortSignal>,
    ) -> Result<Vec<Payload>> {
        let sizes: Vec<u64> = files.iter().map(FileHandle::size).collect();
        tracker.begin_batch(base, &sizes);

        let mut reads: FuturesUnordered<_> = files
            .iter()
            .enumerate()
            .map(|(offset, file)| {
                let file = file.clone();
                let tracker = tracker.clone();
                let abort = abort.clone();
                let mode = self.mode;
                let chunk_size = self.chunk_size;
                let index = base + offset;

                let handle = tokio::spawn(async move {
                    read_one(&file, index, mode, chunk_size, &tracker, abort.as_ref()).await
                });

                async move {
                    let result = handle
                        .await
                        .unwrap_or_else(|e| Err(Error::ReadFailed(e.to_string())));
                    (offset, result)
                }
            })
            .collect();

        let mut payloads: Vec<Option<Payload>> = (0..files.len()).map(|_| None).collect();

        while let Some((offset, result)) = reads.next().await {
            match result {
                Ok(payload) => payloads[offset] = Some(payload),
                Err(err) => {
                    tracing::warn!(%err, "batch read failed");
                    return Err(err);
                }
            }
        }

        payloads.into_iter().map(|p| p.ok_or(Error::InvalidResult)).collect()
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self::new(ReadMode::default(), crate::DEFAULT_READ_CHUNK_SIZE)
    }
}

async fn read_one(
    file: &FileHandle,
    index: usize,
    mode: ReadMode,
    chunk_size: usize,
    tracker: &ProgressTracker,
    abort: Option<&AbortSignal>,
) -> Result<Payload> {
    let expected = file.size();
    let bytes = match file.source() {
        Source::Path(path) => {
            let mut reader = tokio::fs::File::open(path)
                .await
                .map_err(|e| Error::ReadFailed(e.to_string()))?;

            let mut bytes = Vec::with_capacity(usize::try_from(expected).unwrap_or(0));
            let mut buffer = vec![0u8; chunk_size];

            loop {
                if abort.is_some_and(AbortSignal::is_aborted) {
                    return Err(Error::ReadAborted);
                }

                let n = reader
                    .read(&mut buffer)
                    .await
                    .map_err(|e| Error::ReadFailed(e.to_string()))?;
                if n == 0 {
                    break;
                }

                bytes.extend_from_slice(&buffer[..n]);
                tracker.report(index, bytes.len() as u64);
            }

            bytes
        }
        Source::Memory(data) => {
            let mut bytes = Vec::with_capacity(data.len());

            for chunk in data.chunks(chunk_size.max(1)) {
                if abort.is_some_and(AbortSignal::is_aborted) {
                    return Err(Error::ReadAborted);
                }

                bytes.extend_from_slice(chunk);
                tracker.report(index, bytes.len() as u64);
                tokio::task::yield_now().await;
            }

            bytes
        }
    };

    if expected > 0 && bytes.is_empty() {
        return Err(Error::InvalidResult);
    }

    tracker.mark_complete(index);
    tracing::debug!(name = file.name(), size = bytes.len(), "file read complete");

    Ok(match mode {
        ReadMode::Buffer => Payload::Buffer(bytes),
        ReadMode::Text => Payload::Text(String::from_utf8_lossy(&bytes).into_owned()),
        ReadMode::DataUrl => {
            Payload::Base64(base64::engine::general_purpose::STANDARD.encode(&bytes))
        }
    })
}
