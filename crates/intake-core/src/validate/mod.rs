//! File validation for intake sessions.
//!
//! A [`Validator`] checks candidate files against a MIME allow-list and
//! size bounds, and screens whole batches against the session's file count
//! limit. Validation is synchronous and pre-empts any read attempt for the
//! offending file.
//!
//! ## Allow-list matching
//!
//! - Exact match: `image/png` accepts only `image/png`
//! - Wildcard subtype: `image/*` accepts any `image/<subtype>`
//! - Sentinel `*`: accepts everything
//!
//! ## Error slot semantics
//!
//! One screening pass writes at most one error: the last failure wins when
//! several files in a batch fail, and a fully clean pass reports none.

use crate::config::LimitsConfig;
use crate::error::{Error, Result};
use crate::file::FileHandle;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Outcome of screening a batch of candidate files.
#[derive(Debug)]
pub struct Screened {
    /// Files that passed validation, in input order, truncated to the
    /// count bound
    pub accepted: Vec<FileHandle>,
    /// Number of files dropped by validation or truncation
    pub rejected: usize,
    /// The last validation failure of the pass, if any
    pub error: Option<Error>,
}

/// Checks candidate files against configured constraints.
#[derive(Debug, Clone)]
pub struct Validator {
    allowed_types: Vec<String>,
    min_size: Option<u64>,
    max_size: Option<u64>,
    max_files: Option<usize>,
}

impl Validator {
    /// Create a validator accepting the given MIME types.
    #[must_use]
    pub fn new(allowed_types: Vec<String>) -> Self {
        Self {
            allowed_types,
            min_size: None,
            max_size: None,
            max_files: None,
        }
    }

    /// Create a validator from the limits section of a configuration.
    #[must_use]
    pub fn from_limits(limits: &LimitsConfig) -> Self {
        Self {
            allowed_types: limits.allowed_types.clone(),
            min_size: limits.min_size,
            max_size: limits.max_size,
            max_files: limits.max_files,
        }
    }

    /// Set the minimum accepted size in bytes.
    #[must_use]
    pub const fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = Some(min_size);
        self
    }

    /// Set the maximum accepted size in bytes.
    #[must_use]
    pub const fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Set the maximum total number of accepted files.
    #[must_use]
    pub const fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = Some(max_files);
        self
    }

    /// The configured file count bound, if any.
    #[must_use]
    pub const fn max_files(&self) -> Option<usize> {
        self.max_files
    }

    /// Check a single file against the size bounds and allow-list.
    ///
    /// # Errors
    ///
    /// Returns the specific constraint violation: size bounds are checked
    /// before the type allow-list.
    pub fn check(&self, file: &FileHandle) -> Result<()> {
        if let Some(min) = self.min_size {
            if file.size() < min {
                return Err(Error::SizeTooSmall {
                    limit_mb: min as f64 / BYTES_PER_MB,
                });
            }
        }

        if let Some(max) = self.max_size {
            if file.size() > max {
                return Err(Error::SizeTooLarge {
                    limit_mb: max as f64 / BYTES_PER_MB,
                });
            }
        }

        if !self.accepts_mime(file.mime_type()) {
            return Err(Error::InvalidType {
                mime: file.mime_type().to_string(),
                allowed: self.allowed_types.join(", "),
            });
        }

        Ok(())
    }

    /// Screen a batch of candidate files in one validation pass.
    ///
    /// Files failing [`check`](Self::check) are dropped, not retried. When
    /// a count bound is set, the surviving batch is truncated so the total
    /// accepted count (`existing` plus the batch) never exceeds the bound;
    /// truncation silently drops trailing files while still reporting
    /// [`Error::TooManyFiles`].
    #[must_use]
    pub fn screen(&self, batch: Vec<FileHandle>, existing: usize) -> Screened {
        let offered = batch.len();
        let mut error = None;
        let mut accepted = Vec::with_capacity(offered);

        for file in batch {
            match self.check(&file) {
                Ok(()) => accepted.push(file),
                Err(err) => {
                    tracing::debug!(name = file.name(), %err, "file rejected");
                    error = Some(err);
                }
            }
        }

        if let Some(limit) = self.max_files {
            let room = limit.saturating_sub(existing);
            if accepted.len() > room {
                error = Some(Error::TooManyFiles {
                    limit,
                    existing,
                    attempted: accepted.len(),
                });
                accepted.truncate(room);
            }
        }

        let rejected = offered - accepted.len();
        if rejected > 0 {
            tracing::debug!(offered, rejected, "screening dropped files");
        }

        Screened {
            rejected,
            accepted,
            error,
        }
    }

    fn accepts_mime(&self, mime: &str) -> bool {
        if self.allowed_types.iter().any(|t| t == crate::ACCEPT_ANY) {
            return true;
        }

        self.allowed_types.iter().any(|allowed| {
            if let Some(prefix) = allowed.strip_suffix("/*") {
                mime.strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
            } else {
                allowed == mime
            }
        })
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(vec![crate::ACCEPT_ANY.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: usize) -> FileHandle {
        FileHandle::from_bytes(name, vec![0u8; size])
    }

    #[test]
    fn test_exact_type_match() {
        let validator = Validator::new(vec!["image/png".to_string()]);
        assert!(validator.check(&file("a.png", 4)).is_ok());
        assert!(matches!(
            validator.check(&file("a.gif", 4)),
            Err(Error::InvalidType { .. })
        ));
    }

    #[test]
    fn test_wildcard_subtype_match() {
        let validator = Validator::new(vec!["image/*".to_string()]);
        assert!(validator.check(&file("a.png", 4)).is_ok());
        assert!(validator.check(&file("a.gif", 4)).is_ok());

        let err = validator.check(&file("a.txt", 4)).unwrap_err();
        assert!(err.to_string().contains("text/plain"));
    }

    #[test]
    fn test_wildcard_does_not_match_bare_prefix() {
        // "image/*" must not accept a literal "image" type with no subtype
        let validator = Validator::new(vec!["image/*".to_string()]);
        let candidate = file("a.bin", 4).with_mime_type("image");
        assert!(validator.check(&candidate).is_err());
    }

    #[test]
    fn test_accept_any_sentinel() {
        let validator = Validator::default();
        assert!(validator.check(&file("a.xyzzy", 4)).is_ok());
    }

    #[test]
    fn test_size_bounds() {
        let validator = Validator::default().with_min_size(10).with_max_size(100);

        assert!(matches!(
            validator.check(&file("small.bin", 5)),
            Err(Error::SizeTooSmall { .. })
        ));
        assert!(matches!(
            validator.check(&file("big.bin", 200)),
            Err(Error::SizeTooLarge { .. })
        ));
        assert!(validator.check(&file("ok.bin", 50)).is_ok());
    }

    #[test]
    fn test_size_checked_before_type() {
        let validator = Validator::new(vec!["image/*".to_string()]).with_max_size(10);
        // Oversized AND wrong type: the size violation is reported
        assert!(matches!(
            validator.check(&file("a.txt", 100)),
            Err(Error::SizeTooLarge { .. })
        ));
    }

    #[test]
    fn test_screen_drops_invalid_and_keeps_valid() {
        let validator = Validator::new(vec!["image/*".to_string()]);
        let batch = vec![
            file("photo.png", 2 * 1024 * 1024),
            file("notes.txt", 3 * 1024 * 1024),
        ];

        let screened = validator.screen(batch, 0);
        assert_eq!(screened.accepted.len(), 1);
        assert_eq!(screened.accepted[0].name(), "photo.png");
        assert_eq!(screened.rejected, 1);

        let err = screened.error.expect("error recorded");
        assert!(matches!(err, Error::InvalidType { .. }));
        assert!(err.to_string().contains("text/plain"));
    }

    #[test]
    fn test_screen_clean_pass_has_no_error() {
        let validator = Validator::new(vec!["image/*".to_string()]);
        let screened = validator.screen(vec![file("a.png", 4), file("b.gif", 4)], 0);
        assert!(screened.error.is_none());
        assert_eq!(screened.accepted.len(), 2);
        assert_eq!(screened.rejected, 0);
    }

    #[test]
    fn test_screen_last_failure_wins() {
        let validator = Validator::new(vec!["image/*".to_string()]).with_max_size(10);
        let screened = validator.screen(
            vec![
                file("a.txt", 4),   // type violation
                file("b.png", 100), // size violation, recorded last
            ],
            0,
        );
        assert!(matches!(screened.error, Some(Error::SizeTooLarge { .. })));
    }

    #[test]
    fn test_screen_truncates_to_count_bound() {
        let validator = Validator::default().with_max_files(2);
        let screened = validator.screen(vec![file("a", 1), file("b", 1), file("c", 1)], 0);

        assert_eq!(screened.accepted.len(), 2);
        assert_eq!(screened.rejected, 1);
        assert!(matches!(
            screened.error,
            Some(Error::TooManyFiles {
                limit: 2,
                existing: 0,
                attempted: 3
            })
        ));
    }

    #[test]
    fn test_screen_full_session_accepts_nothing_more() {
        let validator = Validator::default().with_max_files(2);
        let screened = validator.screen(vec![file("extra", 1)], 2);

        assert!(screened.accepted.is_empty());
        assert!(matches!(
            screened.error,
            Some(Error::TooManyFiles { limit: 2, .. })
        ));
    }

    #[test]
    fn test_screen_count_error_overwrites_file_error() {
        let validator = Validator::new(vec!["image/*".to_string()]).with_max_files(1);
        let screened = validator.screen(
            vec![file("a.txt", 1), file("b.png", 1), file("c.png", 1)],
            0,
        );
        // The count check runs after the per-file pass, so it wins the slot
        assert!(matches!(screened.error, Some(Error::TooManyFiles { .. })));
        assert_eq!(screened.accepted.len(), 1);
    }
}
