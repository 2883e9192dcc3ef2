//! Change notifications queued by the shape manager.

use crate::shapes::ShapeId;
use serde::Serialize;

/// Something observers of the manager may need to react to.
///
/// Events are queued as they happen and drained with
/// [`crate::ShapeManager::poll_events`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "ids", rename_all = "camelCase")]
pub enum ShapeEvent {
    /// The set of selected shapes changed.
    SelectionChanged,
    /// Geometry or style of these shapes changed.
    ShapesChanged(Vec<ShapeId>),
    /// A shape was created by a drawing gesture.
    ShapeCreated(ShapeId),
}

/// FIFO queue of pending events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<ShapeEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: ShapeEvent) {
        // Consecutive selection changes collapse into one
        if event == ShapeEvent::SelectionChanged
            && self.events.last() == Some(&ShapeEvent::SelectionChanged)
        {
            return;
        }
        self.events.push(event);
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<ShapeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
