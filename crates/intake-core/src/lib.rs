//! # Intake Core Library
//!
//! `intake-core` provides file intake sessions for building upload widgets:
//! selecting files via a picker or drag-and-drop, validating MIME type, size
//! and count, reading file bytes in parallel with progress reporting, and
//! generating revocable preview handles.
//!
//! ## Features
//!
//! - **Validation**: MIME allow-lists with `type/*` wildcards, size bounds,
//!   batch count limits
//! - **Parallel reads**: one task per file, per-file and aggregate progress
//!   over a watch channel
//! - **Previews**: thumbnails and text snippets behind revocable
//!   `preview://` handles
//! - **Sessions**: single-file and multi-file variants behind one trait
//!
//! ## Modules
//!
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`mod@file`] - Candidate file handles and directory expansion
//! - [`preview`] - Preview generation and the preview handle registry
//! - [`read`] - Parallel file reading with progress tracking
//! - [`session`] - Intake session state machines
//! - [`surface`] - Drop-target and picker event surface
//! - [`validate`] - MIME, size and count validation
//!
//! ## Example
//!
//! ```rust,ignore
//! use intake_core::session::{IngestSession, MultiFileSession, SessionOptions};
//! use intake_core::surface::SurfaceEvent;
//!
//! let mut session = MultiFileSession::new(SessionOptions::default());
//! session.handle(SurfaceEvent::Drop(files)).await;
//! for (file, artifact) in session.files().iter().zip(session.artifacts()) {
//!     println!("{}: {:?}", file.name(), artifact.preview);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::unused_async)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::derivable_impls)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::unused_self)]

pub mod config;
pub mod error;
pub mod file;
pub mod preview;
pub mod read;
pub mod session;
pub mod surface;
pub mod validate;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default maximum accepted file size (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default chunk size for file reads (64 KiB)
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

/// MIME type assumed when none can be determined
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Allow-list sentinel that accepts every MIME type
pub const ACCEPT_ANY: &str = "*";
