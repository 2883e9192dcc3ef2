//! Handle definitions for shape manipulation.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Handle size in device pixels.
pub const HANDLE_SIZE: f64 = 6.0;
/// Handle hit tolerance in device pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 5.0;

/// The kind of handle - determines what manipulation it performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    // Corner handles (rectangles)
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    // Edge handles (rectangles); Left/Right are also the ellipse width handles
    Top,
    Bottom,
    Left,
    Right,
    // Axis handles (lines, arrows, ellipse length)
    Start,
    Middle,
    End,
    // Polygon vertex
    Vertex(usize),
}

impl HandleKind {
    /// Corner handles resize two edges at once.
    pub fn is_corner(&self) -> bool {
        matches!(
            self,
            HandleKind::TopLeft
                | HandleKind::TopRight
                | HandleKind::BottomLeft
                | HandleKind::BottomRight
        )
    }
}

/// A manipulation handle on a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// The kind of handle (determines behavior).
    pub kind: HandleKind,
    /// Position in model coordinates.
    pub position: Point,
}

impl Handle {
    /// Create a new handle.
    pub fn new(kind: HandleKind, position: Point) -> Self {
        Self { kind, position }
    }

    /// Check if a point (in model coordinates) hits this handle.
    /// `tolerance` should already be divided by the zoom fraction.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= tolerance * tolerance
    }

    /// Square marker for this handle in device space.
    pub fn device_rect(&self, zoom_fraction: f64) -> Rect {
        let cx = self.position.x * zoom_fraction;
        let cy = self.position.y * zoom_fraction;
        let half = HANDLE_SIZE / 2.0;
        Rect::new(cx - half, cy - half, cx + half, cy + half)
    }
}

/// Find which handle (if any) is hit at the given point.
pub fn hit_test_handles(handles: &[Handle], point: Point, tolerance: f64) -> Option<HandleKind> {
    handles
        .iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}

/// Look up a handle's position by kind.
pub fn handle_position(handles: &[Handle], kind: HandleKind) -> Option<Point> {
    handles.iter().find(|h| h.kind == kind).map(|h| h.position)
}
