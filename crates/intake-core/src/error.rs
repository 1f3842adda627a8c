//! Error types for Intake.
//!
//! This module provides a unified error type for all intake operations,
//! with specific error variants for different failure modes.
//!
//! Validation errors are detected synchronously during screening; read
//! errors surface asynchronously, once per failing batch. Sessions never
//! propagate either past their event surface: the most recent error is
//! parked in the session's single error slot instead.

use std::io;

use thiserror::Error;

/// A specialized `Result` type for intake operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Intake.
#[derive(Error, Debug)]
pub enum Error {
    /// File MIME type is not in the allow-list
    #[error("file type \"{mime}\" is not allowed. accepted types: {allowed}")]
    InvalidType {
        /// MIME type of the rejected file
        mime: String,
        /// Comma-joined allow-list shown to the user
        allowed: String,
    },

    /// File is smaller than the configured minimum
    #[error("file size is below the minimum limit of {limit_mb:.2} MB")]
    SizeTooSmall {
        /// Minimum size in megabytes
        limit_mb: f64,
    },

    /// File is larger than the configured maximum
    #[error("file size exceeds the maximum limit of {limit_mb:.2} MB")]
    SizeTooLarge {
        /// Maximum size in megabytes
        limit_mb: f64,
    },

    /// Accepting the batch would exceed the file count bound
    #[error("cannot accept more than {limit} file(s): {existing} already accepted, {attempted} more offered")]
    TooManyFiles {
        /// Configured maximum number of files
        limit: usize,
        /// Files already held by the session
        existing: usize,
        /// Files in the offered batch
        attempted: usize,
    },

    /// A file read was aborted before completion
    #[error("file reading aborted")]
    ReadAborted,

    /// A file read failed
    #[error("failed to read file: {0}")]
    ReadFailed(String),

    /// The reader completed without producing usable data
    #[error("reader produced no usable data")]
    InvalidResult,

    /// Preview generation failed
    #[error("failed to generate preview for '{file}': {reason}")]
    PreviewFailed {
        /// File name
        file: String,
        /// Reason for failure
        reason: String,
    },

    /// Configuration file error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Reason for invalidity
        reason: String,
    },

    /// File not found
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Invalid path
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns whether this error was produced by synchronous validation.
    ///
    /// Validation errors pre-empt any read attempt for the offending file.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidType { .. }
                | Self::SizeTooSmall { .. }
                | Self::SizeTooLarge { .. }
                | Self::TooManyFiles { .. }
        )
    }

    /// Returns whether this error was produced by an asynchronous read.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        matches!(
            self,
            Self::ReadAborted | Self::ReadFailed(_) | Self::InvalidResult
        )
    }
}
