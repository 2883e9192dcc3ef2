//! In-progress pointer manipulations of existing shapes.
//!
//! Every state keeps the shapes as they were when the drag started and
//! re-applies the total drag delta to those originals on each update, so
//! rounding never accumulates over a long drag.

use crate::geometry::Region;
use crate::handles::{HandleKind, handle_position};
use crate::input::Modifiers;
use crate::shapes::{Shape, ShapeId};
use kurbo::{Point, Vec2};
use std::collections::HashMap;

/// State for dragging one handle of one shape.
#[derive(Debug, Clone)]
pub struct ManipulationState {
    /// The shape being manipulated.
    pub shape_id: ShapeId,
    /// The handle being dragged.
    pub handle: HandleKind,
    /// Model position of the handle when the drag started.
    pub handle_origin: Point,
    /// Starting pointer position (model space).
    pub start_point: Point,
    /// Current pointer position (model space).
    pub current_point: Point,
    /// Shape as it was when the drag started.
    pub original_shape: Shape,
}

impl ManipulationState {
    /// Start dragging `handle` of `shape`. Returns `None` if the shape has
    /// no such handle.
    pub fn new(shape: &Shape, handle: HandleKind, start_point: Point) -> Option<Self> {
        let handle_origin = handle_position(&shape.handles(), handle)?;
        let mut original_shape = shape.clone();
        original_shape.start_handle_drag();
        Some(Self {
            shape_id: shape.id(),
            handle,
            handle_origin,
            start_point,
            current_point: start_point,
            original_shape,
        })
    }

    /// Get the drag delta.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    /// Apply the drag to `target`, starting again from the original shape.
    ///
    /// A rejected update leaves `target` as it was.
    pub fn apply(&self, target: &mut Shape, modifiers: Modifiers) -> bool {
        let mut candidate = self.original_shape.clone();
        // Selection and zoom may have changed since the drag began
        candidate.set_selected(target.is_selected());
        candidate.set_zoom(target.zoom_fraction() * 100.0);
        let point = self.handle_origin + self.delta();
        if candidate.update_handle(self.handle, point, modifiers) {
            *target = candidate;
            true
        } else {
            false
        }
    }
}

/// State for moving several shapes at once.
#[derive(Debug, Clone)]
pub struct MultiMoveState {
    /// Starting pointer position (model space).
    pub start_point: Point,
    /// Current pointer position (model space).
    pub current_point: Point,
    /// Original shapes (shape_id -> original shape).
    pub original_shapes: HashMap<ShapeId, Shape>,
}

impl MultiMoveState {
    /// Create a new multi-move state.
    pub fn new<'a>(start_point: Point, shapes: impl IntoIterator<Item = &'a Shape>) -> Self {
        Self {
            start_point,
            current_point: start_point,
            original_shapes: shapes.into_iter().map(|s| (s.id(), s.clone())).collect(),
        }
    }

    /// Get the drag delta.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    /// Position `target` at its original place plus the drag delta.
    pub fn apply(&self, target: &mut Shape) -> bool {
        let Some(original) = self.original_shapes.get(&target.id()) else {
            return false;
        };
        let delta = self.delta();
        let selected = target.is_selected();
        let zoom = target.zoom_fraction() * 100.0;
        *target = original.clone();
        target.set_selected(selected);
        target.set_zoom(zoom);
        target.offset_shape(delta.x, delta.y);
        true
    }
}

/// A rubber-band selection rectangle being dragged out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RubberBand {
    /// Where the drag started (model space).
    pub anchor: Point,
    /// Latest pointer position (model space).
    pub current: Point,
}

impl RubberBand {
    pub fn new(anchor: Point) -> Self {
        Self {
            anchor,
            current: anchor,
        }
    }

    /// The band as a normalized region.
    pub fn region(&self) -> Region {
        Region::from_corners(self.anchor, self.current)
    }
}

/// What a select-mode drag is doing.
#[derive(Debug, Clone, Default)]
pub enum SelectDrag {
    /// No drag in progress.
    #[default]
    Idle,
    /// Dragging a handle of a selected shape.
    Handle(ManipulationState),
    /// Moving the selected shapes.
    Move(MultiMoveState),
    /// Dragging out a selection region.
    RubberBand(RubberBand),
}
