//! Intake session state machines.
//!
//! A session owns everything a widget shows: the accepted files, their
//! derived artifacts (preview handle plus decoded payload), the progress
//! tracker, and the single last-error slot. Two variants exist behind the
//! common [`IngestSession`] capability trait, chosen at construction:
//!
//! - [`MultiFileSession`] accumulates files across selections
//! - [`SingleFileSession`] holds at most one file, replaced each time
//!
//! ## Phases
//!
//! ```text
//! Empty -> Selecting -> Validating -> Reading -> Ready
//!                                        ^          |
//!                                        +----------+   (multi re-entry)
//! ```
//!
//! Any phase returns to `Empty` on a full reset. A failed selection or
//! read restores the prior `Ready`/`Empty` phase with the error slot set.
//!
//! Files and artifacts are committed together, atomically, only after the
//! whole batch has been read; the file list never shows an entry whose
//! artifact is missing. The two sequences and the index-keyed progress
//! map stay index-aligned through removals.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use tokio::sync::watch;

pub use crate::config::SessionOptions;
use crate::error::{Error, Result};
use crate::file::FileHandle;
use crate::preview::{PreviewGenerator, PreviewRegistry, PreviewUrl};
use crate::read::{AbortSignal, Payload, ProgressSnapshot, ProgressTracker, Reader};
use crate::surface::{EventDisposition, InputBinding, SurfaceEvent};
use crate::validate::Validator;

/// Lifecycle phase of an intake session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No files held
    Empty,
    /// A selection or drop is being received
    Selecting,
    /// The incoming batch is being validated
    Validating,
    /// Accepted files are being read
    Reading,
    /// Files and artifacts are committed and consistent
    Ready,
}

/// What a successful read derives for one accepted file.
#[derive(Debug, Clone)]
pub struct DerivedArtifact {
    /// Revocable preview handle, when preview generation is enabled
    pub preview: Option<PreviewUrl>,
    /// Decoded payload
    pub payload: Payload,
}

/// Common capability surface of both session variants.
#[async_trait]
pub trait IngestSession: Send {
    /// Current lifecycle phase.
    fn phase(&self) -> SessionPhase;

    /// Accepted files, in acceptance order.
    fn files(&self) -> &[FileHandle];

    /// Derived artifacts, index-aligned with [`files`](Self::files).
    fn artifacts(&self) -> &[DerivedArtifact];

    /// Subscribe to progress snapshots.
    fn progress(&self) -> watch::Receiver<ProgressSnapshot>;

    /// Current progress snapshot.
    fn progress_snapshot(&self) -> ProgressSnapshot;

    /// The most recent error, if any.
    fn last_error(&self) -> Option<&Error>;

    /// Whether a drag is currently over the drop target.
    fn is_dragging(&self) -> bool;

    /// Declarative description of the picker input for this session.
    fn input_binding(&self) -> InputBinding;

    /// Handle a widget event, funneling drops and picker selections
    /// through the ingest path.
    async fn handle(&mut self, event: SurfaceEvent) -> EventDisposition;

    /// Validate, read, and commit a batch of candidate files.
    async fn ingest(&mut self, batch: Vec<FileHandle>);

    /// Remove the file at `index`, or everything when `None`.
    fn remove(&mut self, index: Option<usize>);

    /// Return the session to `Empty`, releasing every preview handle.
    fn reset(&mut self);
}

/// State shared by both session variants.
struct SessionCore {
    options: SessionOptions,
    validator: Validator,
    reader: Reader,
    generator: PreviewGenerator,
    registry: Arc<PreviewRegistry>,
    tracker: ProgressTracker,
    phase: SessionPhase,
    dragging: bool,
    files: Vec<FileHandle>,
    artifacts: Vec<DerivedArtifact>,
    error: Option<Error>,
    abort: Option<AbortSignal>,
}

impl SessionCore {
    fn new(options: SessionOptions, registry: Arc<PreviewRegistry>) -> Self {
        let mut validator = Validator::new(options.allowed_types.clone());
        if let Some(min) = options.min_size {
            validator = validator.with_min_size(min);
        }
        if let Some(max) = options.max_size {
            validator = validator.with_max_size(max);
        }
        if let Some(limit) = options.max_files {
            validator = validator.with_max_files(limit);
        }

        Self {
            validator,
            reader: Reader::new(options.read_mode, options.chunk_size),
            generator: PreviewGenerator::with_config(options.preview.clone()),
            registry,
            tracker: ProgressTracker::new(),
            phase: SessionPhase::Empty,
            dragging: false,
            files: Vec::new(),
            artifacts: Vec::new(),
            error: None,
            abort: None,
            options,
        }
    }

    /// The phase to fall back to when an ingest attempt fails.
    fn restore_phase(&self) -> SessionPhase {
        if self.files.is_empty() {
            SessionPhase::Empty
        } else {
            SessionPhase::Ready
        }
    }

    /// Read a screened batch and derive its artifacts. Nothing is
    /// committed here; the caller owns the commit.
    async fn read_batch(&self, accepted: &[FileHandle], base: usize) -> Result<Vec<DerivedArtifact>> {
        let payloads = self
            .reader
            .read_all(accepted, base, &self.tracker, self.abort.clone())
            .await?;

        Ok(accepted
            .iter()
            .zip(payloads)
            .map(|(file, payload)| self.build_artifact(file, payload))
            .collect())
    }

    fn build_artifact(&self, file: &FileHandle, payload: Payload) -> DerivedArtifact {
        let preview = if self.options.preview.enabled {
            payload_bytes(&payload)
                .and_then(|bytes| match self.generator.generate(file, &bytes) {
                    Ok(data) => Some(self.registry.register(data)),
                    Err(err) => {
                        tracing::warn!(name = file.name(), %err, "preview generation failed");
                        None
                    }
                })
        } else {
            None
        };

        DerivedArtifact { preview, payload }
    }

    fn revoke_previews(&self) {
        for artifact in &self.artifacts {
            if let Some(url) = &artifact.preview {
                self.registry.revoke(url);
            }
        }
    }

    fn clear_all(&mut self) {
        self.revoke_previews();
        self.files.clear();
        self.artifacts.clear();
        self.tracker.clear();
        self.error = None;
        self.phase = SessionPhase::Empty;
    }

    fn remove_at(&mut self, index: usize) {
        if index >= self.files.len() {
            tracing::debug!(index, "removal index out of range");
            return;
        }

        let artifact = self.artifacts.remove(index);
        if let Some(url) = &artifact.preview {
            self.registry.revoke(url);
        }
        self.files.remove(index);
        self.tracker.remove(index);
        self.error = None;

        if self.files.is_empty() {
            self.phase = SessionPhase::Empty;
        }
    }
}

impl Drop for SessionCore {
    fn drop(&mut self) {
        self.revoke_previews();
    }
}

fn payload_bytes(payload: &Payload) -> Option<Cow<'_, [u8]>> {
    match payload {
        Payload::Buffer(bytes) => Some(Cow::Borrowed(bytes.as_slice())),
        Payload::Text(text) => Some(Cow::Borrowed(text.as_bytes())),
        Payload::Base64(encoded) => base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .ok()
            .map(Cow::Owned),
    }
}

/// A session that accumulates files across successive selections.
pub struct MultiFileSession {
    core: SessionCore,
}

impl std::fmt::Debug for MultiFileSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiFileSession")
            .field("phase", &self.core.phase)
            .field("files", &self.core.files.len())
            .finish_non_exhaustive()
    }
}

impl MultiFileSession {
    /// Create a session using the process-wide preview registry.
    #[must_use]
    pub fn new(options: SessionOptions) -> Self {
        Self::with_registry(options, PreviewRegistry::global())
    }

    /// Create a session with its own preview registry.
    #[must_use]
    pub fn with_registry(options: SessionOptions, registry: Arc<PreviewRegistry>) -> Self {
        Self {
            core: SessionCore::new(options, registry),
        }
    }

    /// Attach an externally-triggered abort signal to subsequent reads.
    #[must_use]
    pub fn with_abort(mut self, signal: AbortSignal) -> Self {
        self.core.abort = Some(signal);
        self
    }
}

#[async_trait]
impl IngestSession for MultiFileSession {
    fn phase(&self) -> SessionPhase {
        self.core.phase
    }

    fn files(&self) -> &[FileHandle] {
        &self.core.files
    }

    fn artifacts(&self) -> &[DerivedArtifact] {
        &self.core.artifacts
    }

    fn progress(&self) -> watch::Receiver<ProgressSnapshot> {
        self.core.tracker.subscribe()
    }

    fn progress_snapshot(&self) -> ProgressSnapshot {
        self.core.tracker.snapshot()
    }

    fn last_error(&self) -> Option<&Error> {
        self.core.error.as_ref()
    }

    fn is_dragging(&self) -> bool {
        self.core.dragging
    }

    fn input_binding(&self) -> InputBinding {
        InputBinding::from_options(&self.core.options, true)
    }

    async fn handle(&mut self, event: SurfaceEvent) -> EventDisposition {
        match event {
            SurfaceEvent::Click => {
                if self.core.options.disabled {
                    EventDisposition::none()
                } else {
                    EventDisposition::picker()
                }
            }
            SurfaceEvent::DragEnter | SurfaceEvent::DragOver => {
                self.core.dragging = true;
                EventDisposition::suppress()
            }
            SurfaceEvent::DragLeave => {
                self.core.dragging = false;
                EventDisposition::suppress()
            }
            SurfaceEvent::Drop(files) => {
                self.core.dragging = false;
                self.ingest(files).await;
                EventDisposition::suppress()
            }
            SurfaceEvent::InputChange(files) => {
                self.ingest(files).await;
                EventDisposition::none()
            }
        }
    }

    async fn ingest(&mut self, batch: Vec<FileHandle>) {
        let prior = self.core.restore_phase();
        self.core.phase = SessionPhase::Selecting;

        if batch.is_empty() {
            self.core.phase = prior;
            return;
        }

        self.core.phase = SessionPhase::Validating;
        let screened = self.core.validator.screen(batch, self.core.files.len());
        self.core.error = screened.error;

        if screened.accepted.is_empty() {
            self.core.phase = prior;
            return;
        }

        self.core.phase = SessionPhase::Reading;
        let base = self.core.files.len();

        match self.core.read_batch(&screened.accepted, base).await {
            Ok(artifacts) => {
                self.core.files.extend(screened.accepted);
                self.core.artifacts.extend(artifacts);
                self.core.phase = SessionPhase::Ready;
                tracing::info!(total = self.core.files.len(), "batch committed");
            }
            Err(err) => {
                self.core.tracker.truncate_from(base);
                self.core.error = Some(err);
                self.core.phase = prior;
            }
        }
    }

    fn remove(&mut self, index: Option<usize>) {
        match index {
            Some(i) => self.core.remove_at(i),
            None => self.core.clear_all(),
        }
    }

    fn reset(&mut self) {
        self.core.clear_all();
    }
}

/// A session that holds at most one file, replaced on each selection.
pub struct SingleFileSession {
    core: SessionCore,
}

impl std::fmt::Debug for SingleFileSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFileSession")
            .field("phase", &self.core.phase)
            .field("held", &!self.core.files.is_empty())
            .finish_non_exhaustive()
    }
}

impl SingleFileSession {
    /// Create a session using the process-wide preview registry.
    #[must_use]
    pub fn new(options: SessionOptions) -> Self {
        Self::with_registry(options, PreviewRegistry::global())
    }

    /// Create a session with its own preview registry.
    #[must_use]
    pub fn with_registry(options: SessionOptions, registry: Arc<PreviewRegistry>) -> Self {
        Self {
            core: SessionCore::new(options, registry),
        }
    }

    /// Attach an externally-triggered abort signal to subsequent reads.
    #[must_use]
    pub fn with_abort(mut self, signal: AbortSignal) -> Self {
        self.core.abort = Some(signal);
        self
    }

    /// The held file, if any.
    #[must_use]
    pub fn file(&self) -> Option<&FileHandle> {
        self.core.files.first()
    }

    /// The held file's artifact, if any.
    #[must_use]
    pub fn artifact(&self) -> Option<&DerivedArtifact> {
        self.core.artifacts.first()
    }
}

#[async_trait]
impl IngestSession for SingleFileSession {
    fn phase(&self) -> SessionPhase {
        self.core.phase
    }

    fn files(&self) -> &[FileHandle] {
        &self.core.files
    }

    fn artifacts(&self) -> &[DerivedArtifact] {
        &self.core.artifacts
    }

    fn progress(&self) -> watch::Receiver<ProgressSnapshot> {
        self.core.tracker.subscribe()
    }

    fn progress_snapshot(&self) -> ProgressSnapshot {
        self.core.tracker.snapshot()
    }

    fn last_error(&self) -> Option<&Error> {
        self.core.error.as_ref()
    }

    fn is_dragging(&self) -> bool {
        self.core.dragging
    }

    fn input_binding(&self) -> InputBinding {
        InputBinding::from_options(&self.core.options, false)
    }

    async fn handle(&mut self, event: SurfaceEvent) -> EventDisposition {
        match event {
            SurfaceEvent::Click => {
                if self.core.options.disabled {
                    EventDisposition::none()
                } else {
                    EventDisposition::picker()
                }
            }
            SurfaceEvent::DragEnter | SurfaceEvent::DragOver => {
                self.core.dragging = true;
                EventDisposition::suppress()
            }
            SurfaceEvent::DragLeave => {
                self.core.dragging = false;
                EventDisposition::suppress()
            }
            SurfaceEvent::Drop(files) => {
                self.core.dragging = false;
                self.ingest(files).await;
                EventDisposition::suppress()
            }
            SurfaceEvent::InputChange(files) => {
                self.ingest(files).await;
                EventDisposition::none()
            }
        }
    }

    async fn ingest(&mut self, batch: Vec<FileHandle>) {
        let prior = self.core.restore_phase();
        self.core.phase = SessionPhase::Selecting;

        if batch.is_empty() {
            self.core.phase = prior;
            return;
        }

        self.core.phase = SessionPhase::Validating;
        let screened = self.core.validator.screen(batch, 0);
        self.core.error = screened.error;

        // Only the first surviving file is kept; the rest are never read
        let mut accepted = screened.accepted;
        accepted.truncate(1);

        if accepted.is_empty() {
            self.core.phase = prior;
            return;
        }

        self.core.phase = SessionPhase::Reading;
        self.core.tracker.clear();

        match self.core.read_batch(&accepted, 0).await {
            Ok(artifacts) => {
                self.core.revoke_previews();
                self.core.files = accepted;
                self.core.artifacts = artifacts;
                self.core.phase = SessionPhase::Ready;
            }
            Err(err) => {
                // Re-register the surviving file's completed entry so the
                // progress map stays aligned with the held file
                self.core.tracker.clear();
                if let Some(file) = self.core.files.first() {
                    self.core.tracker.begin_batch(0, &[file.size()]);
                    self.core.tracker.mark_complete(0);
                }
                self.core.error = Some(err);
                self.core.phase = prior;
            }
        }
    }

    fn remove(&mut self, _index: Option<usize>) {
        self.core.clear_all();
    }

    fn reset(&mut self) {
        self.core.clear_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::ReadMode;

    fn registry() -> Arc<PreviewRegistry> {
        Arc::new(PreviewRegistry::new())
    }

    fn options() -> SessionOptions {
        SessionOptions::default()
    }

    fn text_file(name: &str, size: usize) -> FileHandle {
        FileHandle::from_bytes(name, vec![b'x'; size])
    }

    #[tokio::test]
    async fn test_starts_empty() {
        let session = MultiFileSession::with_registry(options(), registry());
        assert_eq!(session.phase(), SessionPhase::Empty);
        assert!(session.files().is_empty());
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn test_multi_accumulates_across_selections() {
        let mut session = MultiFileSession::with_registry(options(), registry());

        session.ingest(vec![text_file("a.txt", 8)]).await;
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert_eq!(session.files().len(), 1);

        session
            .ingest(vec![text_file("b.txt", 8), text_file("c.txt", 8)])
            .await;
        assert_eq!(session.files().len(), 3);
        assert_eq!(session.artifacts().len(), 3);

        let names: Vec<&str> = session.files().iter().map(FileHandle::name).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[tokio::test]
    async fn test_single_replaces_on_each_selection() {
        let reg = registry();
        let mut session = SingleFileSession::with_registry(options(), reg.clone());

        session.ingest(vec![text_file("first.txt", 8)]).await;
        assert_eq!(session.file().map(FileHandle::name), Some("first.txt"));
        assert_eq!(reg.len(), 1);

        session.ingest(vec![text_file("second.txt", 8)]).await;
        assert_eq!(session.files().len(), 1);
        assert_eq!(session.file().map(FileHandle::name), Some("second.txt"));
        assert_eq!(reg.len(), 1, "replaced preview must be revoked");
    }

    #[tokio::test]
    async fn test_artifacts_stay_index_aligned() {
        let mut session = MultiFileSession::with_registry(
            options().with_read_mode(ReadMode::Text),
            registry(),
        );

        session
            .ingest(vec![
                FileHandle::from_bytes("a.txt", b"alpha".to_vec()),
                FileHandle::from_bytes("b.txt", b"bravo".to_vec()),
            ])
            .await;

        assert_eq!(session.files()[0].name(), "a.txt");
        assert_eq!(session.artifacts()[0].payload, Payload::Text("alpha".into()));
        assert_eq!(session.files()[1].name(), "b.txt");
        assert_eq!(session.artifacts()[1].payload, Payload::Text("bravo".into()));
    }

    #[tokio::test]
    async fn test_wildcard_allow_list_rejects_mismatch() {
        // image/* allow-list: a 2MB PNG and a 3MB text file
        let mut session = MultiFileSession::with_registry(
            options()
                .with_allowed_types(["image/*"])
                .without_previews(),
            registry(),
        );

        session
            .ingest(vec![
                text_file("photo.png", 2 * 1024 * 1024),
                text_file("notes.txt", 3 * 1024 * 1024),
            ])
            .await;

        assert_eq!(session.files().len(), 1);
        assert_eq!(session.files()[0].name(), "photo.png");

        let err = session.last_error().expect("error recorded");
        assert!(matches!(err, Error::InvalidType { .. }));
        assert!(err.to_string().contains("text/plain"));
    }

    #[tokio::test]
    async fn test_count_bound_keeps_existing_files() {
        let mut session =
            MultiFileSession::with_registry(options().with_max_files(2), registry());

        session
            .ingest(vec![text_file("a.txt", 4), text_file("b.txt", 4)])
            .await;
        assert_eq!(session.files().len(), 2);
        assert!(session.last_error().is_none());

        session.ingest(vec![text_file("c.txt", 4)]).await;
        assert_eq!(session.files().len(), 2, "bound must hold");
        assert!(matches!(
            session.last_error(),
            Some(Error::TooManyFiles { limit: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_clean_selection_clears_stale_error() {
        let mut session = MultiFileSession::with_registry(
            options().with_allowed_types(["text/plain"]),
            registry(),
        );

        session.ingest(vec![text_file("a.png", 4)]).await;
        assert!(session.last_error().is_some());

        session.ingest(vec![text_file("b.txt", 4)]).await;
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn test_all_invalid_batch_restores_phase() {
        let mut session = MultiFileSession::with_registry(
            options().with_allowed_types(["image/*"]),
            registry(),
        );

        session.ingest(vec![text_file("a.txt", 4)]).await;
        assert_eq!(session.phase(), SessionPhase::Empty);
        assert!(session.files().is_empty());
        assert!(session.last_error().is_some());
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let mut session = MultiFileSession::with_registry(options(), registry());
        session.ingest(Vec::new()).await;
        assert_eq!(session.phase(), SessionPhase::Empty);
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn test_remove_shifts_progress_and_revokes_preview() {
        let reg = registry();
        let mut session = MultiFileSession::with_registry(options(), reg.clone());

        session
            .ingest(vec![
                text_file("a.txt", 4),
                text_file("b.txt", 4),
                text_file("c.txt", 4),
            ])
            .await;
        assert_eq!(reg.len(), 3);

        session.remove(Some(1));

        assert_eq!(session.files().len(), 2);
        let names: Vec<&str> = session.files().iter().map(FileHandle::name).collect();
        assert_eq!(names, vec!["a.txt", "c.txt"]);
        assert_eq!(reg.len(), 2, "removed preview must be revoked");

        let snapshot = session.progress_snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.file_percent(0), 100);
        assert_eq!(snapshot.file_percent(1), 100);
    }

    #[tokio::test]
    async fn test_remove_out_of_range_is_ignored() {
        let mut session = MultiFileSession::with_registry(options(), registry());
        session.ingest(vec![text_file("a.txt", 4)]).await;

        session.remove(Some(7));
        assert_eq!(session.files().len(), 1);
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[tokio::test]
    async fn test_remove_all_clears_everything() {
        let reg = registry();
        let mut session = MultiFileSession::with_registry(options(), reg.clone());

        session
            .ingest(vec![text_file("a.txt", 4), text_file("b.txt", 4)])
            .await;
        session.remove(None);

        assert_eq!(session.phase(), SessionPhase::Empty);
        assert!(session.files().is_empty());
        assert!(session.artifacts().is_empty());
        assert_eq!(session.progress_snapshot().len(), 0);
        assert_eq!(reg.len(), 0);
    }

    #[tokio::test]
    async fn test_read_failure_commits_nothing() {
        let temp_dir = tempfile::TempDir::new().expect("create temp dir");
        let doomed_path = temp_dir.path().join("doomed.bin");
        std::fs::write(&doomed_path, b"short-lived").expect("write");
        let doomed = FileHandle::from_path(&doomed_path).expect("handle");
        std::fs::remove_file(&doomed_path).expect("remove");

        let mut session = MultiFileSession::with_registry(options(), registry());
        session.ingest(vec![text_file("kept.txt", 4)]).await;

        session
            .ingest(vec![text_file("other.txt", 4), doomed])
            .await;

        assert_eq!(session.phase(), SessionPhase::Ready);
        assert_eq!(session.files().len(), 1, "failed batch must not commit");
        assert_eq!(session.progress_snapshot().len(), 1);
        assert!(matches!(
            session.last_error(),
            Some(Error::ReadFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_aborted_read_surfaces_read_aborted() {
        let (handle, signal) = crate::read::AbortHandle::new();
        handle.abort();

        let mut session =
            MultiFileSession::with_registry(options(), registry()).with_abort(signal);
        session.ingest(vec![text_file("a.txt", 64)]).await;

        assert!(matches!(session.last_error(), Some(Error::ReadAborted)));
        assert!(session.files().is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_progress_complete_after_commit() {
        let mut session = MultiFileSession::with_registry(options(), registry());
        session
            .ingest(vec![text_file("a.bin", 512), text_file("b.bin", 1024)])
            .await;

        let snapshot = session.progress_snapshot();
        assert!(snapshot.is_complete());
        assert!((snapshot.percentage() - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_drag_flag_transitions() {
        let mut session = MultiFileSession::with_registry(options(), registry());

        let disposition = session.handle(SurfaceEvent::DragEnter).await;
        assert!(session.is_dragging());
        assert!(disposition.suppress_default);

        session.handle(SurfaceEvent::DragOver).await;
        assert!(session.is_dragging());

        session.handle(SurfaceEvent::DragLeave).await;
        assert!(!session.is_dragging());
    }

    #[tokio::test]
    async fn test_drop_ingests_and_clears_drag_flag() {
        let mut session = MultiFileSession::with_registry(options(), registry());
        session.handle(SurfaceEvent::DragEnter).await;

        let disposition = session
            .handle(SurfaceEvent::Drop(vec![text_file("a.txt", 4)]))
            .await;

        assert!(disposition.suppress_default);
        assert!(!session.is_dragging());
        assert_eq!(session.files().len(), 1);
    }

    #[tokio::test]
    async fn test_click_respects_disabled() {
        let mut enabled = MultiFileSession::with_registry(options(), registry());
        assert!(enabled.handle(SurfaceEvent::Click).await.open_picker);

        let mut disabled =
            MultiFileSession::with_registry(options().with_disabled(true), registry());
        assert!(!disabled.handle(SurfaceEvent::Click).await.open_picker);
    }

    #[tokio::test]
    async fn test_input_binding_reflects_session_kind() {
        let multi = MultiFileSession::with_registry(
            options().with_allowed_types(["image/*", "text/plain"]),
            registry(),
        );
        let binding = multi.input_binding();
        assert!(binding.multiple);
        assert_eq!(binding.accept, "image/*,text/plain");

        let single = SingleFileSession::with_registry(options(), registry());
        assert!(!single.input_binding().multiple);
    }

    #[tokio::test]
    async fn test_teardown_revokes_previews() {
        let reg = registry();
        {
            let mut session = MultiFileSession::with_registry(options(), reg.clone());
            session
                .ingest(vec![text_file("a.txt", 4), text_file("b.txt", 4)])
                .await;
            assert_eq!(reg.len(), 2);
        }
        assert_eq!(reg.len(), 0, "drop must release every preview handle");
    }

    #[tokio::test]
    async fn test_single_ignores_extra_batch_files() {
        let mut session = SingleFileSession::with_registry(options(), registry());
        session
            .ingest(vec![text_file("a.txt", 4), text_file("b.txt", 4)])
            .await;

        assert_eq!(session.files().len(), 1);
        assert_eq!(session.file().map(FileHandle::name), Some("a.txt"));
    }

    #[tokio::test]
    async fn test_sessions_usable_through_trait_object() {
        let mut session: Box<dyn IngestSession> =
            Box::new(SingleFileSession::with_registry(options(), registry()));

        session.ingest(vec![text_file("a.txt", 4)]).await;
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert_eq!(session.files().len(), 1);

        session.reset();
        assert_eq!(session.phase(), SessionPhase::Empty);
    }
}
