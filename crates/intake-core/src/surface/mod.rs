//! Drop-target and picker event surface.
//!
//! Sessions are UI-agnostic: the host widget translates its native events
//! (clicks, drag-and-drop, picker changes) into [`SurfaceEvent`]s and feeds
//! them to the session. Each event returns an [`EventDisposition`] telling
//! the host what to do on its side: suppress the platform's default drop
//! navigation, or open the file picker.
//!
//! [`InputBinding`] describes the hidden picker input declaratively so the
//! host can configure its widget from the session's options.

use serde::{Deserialize, Serialize};

use crate::config::SessionOptions;
use crate::file::FileHandle;

/// An event delivered by the host widget.
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    /// The drop target was clicked
    Click,
    /// A drag entered the drop target
    DragEnter,
    /// A drag moved over the drop target
    DragOver,
    /// A drag left the drop target
    DragLeave,
    /// Files were dropped on the drop target
    Drop(Vec<FileHandle>),
    /// Files were selected through the picker input
    InputChange(Vec<FileHandle>),
}

/// What the host should do after an event was handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventDisposition {
    /// Suppress the platform's default handling (drop navigation)
    pub suppress_default: bool,
    /// Open the file picker
    pub open_picker: bool,
}

impl EventDisposition {
    /// Nothing for the host to do.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            suppress_default: false,
            open_picker: false,
        }
    }

    /// Suppress the platform default; all drag handlers return this.
    #[must_use]
    pub const fn suppress() -> Self {
        Self {
            suppress_default: true,
            open_picker: false,
        }
    }

    /// Ask the host to open its file picker.
    #[must_use]
    pub const fn picker() -> Self {
        Self {
            suppress_default: false,
            open_picker: true,
        }
    }
}

/// Declarative description of the hidden picker input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputBinding {
    /// Comma-joined accept list for the picker dialog
    pub accept: String,
    /// Whether the picker allows selecting several files
    pub multiple: bool,
    /// Whether the input is disabled
    pub disabled: bool,
}

impl InputBinding {
    /// Build a binding from session options and the session's multiplicity.
    #[must_use]
    pub fn from_options(options: &SessionOptions, multiple: bool) -> Self {
        Self {
            accept: options.allowed_types.join(","),
            multiple,
            disabled: options.disabled,
        }
    }
}
