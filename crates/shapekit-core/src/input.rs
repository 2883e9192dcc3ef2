//! Pointer-drag input types.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Only shift held.
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Whether the ratio-lock modifier is held.
    pub fn locks_ratio(&self) -> bool {
        self.shift
    }
}

/// A pointer-drag event in device coordinates.
///
/// A gesture is always `Start`, any number of `Drag`, then `Stop`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum DragEvent {
    Start {
        position: Point,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Drag {
        position: Point,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Stop {
        #[serde(default)]
        modifiers: Modifiers,
    },
}

/// Tracks whether a drag gesture is in progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct DragTracker {
    /// Start position of the current drag, if one is in progress.
    pub drag_start: Option<Point>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, position: Point) {
        self.drag_start = Some(position);
    }

    pub fn end(&mut self) {
        self.drag_start = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }
}
