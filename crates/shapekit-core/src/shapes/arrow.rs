//! Arrow shape.

use super::{Line, LineJson, ShapeId, ShapeJson, ShapeStyle, ShapeTrait};
use crate::handles::{Handle, HandleKind};
use crate::input::Modifiers;
use kurbo::{BezPath, Point, Rect};

/// Angle of each arrowhead wing relative to the shaft (radians).
pub const WING_ANGLE: f64 = 0.4;

/// A line with a solid arrowhead at its end point.
///
/// Everything but the outline is the line's behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    pub(crate) line: Line,
}

impl Arrow {
    /// Create a new arrow.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            line: Line::new(start, end),
        }
    }

    pub(crate) fn from_json(json: &LineJson, defaults: &ShapeStyle) -> Self {
        Self {
            line: Line::from_json(json, defaults),
        }
    }

    pub fn start(&self) -> Point {
        self.line.start
    }

    pub fn end(&self) -> Point {
        self.line.end
    }

    /// Arrowhead length in device pixels.
    pub fn head_size(&self) -> f64 {
        (self.line.style.stroke_width * 3.0 + 9.0) * self.line.zoom_fraction()
    }

    /// The two wing tips of the arrowhead in device space.
    pub fn wing_points(&self) -> (Point, Point) {
        let (start, tip) = self.line.device_points();
        let angle = (tip.y - start.y).atan2(tip.x - start.x);
        let size = self.head_size();
        let wing = |a: f64| Point::new(tip.x - size * a.cos(), tip.y - size * a.sin());
        (wing(angle - WING_ANGLE), wing(angle + WING_ANGLE))
    }
}

impl ShapeTrait for Arrow {
    fn id(&self) -> ShapeId {
        self.line.id()
    }

    fn bounds(&self) -> Rect {
        self.line.bounds()
    }

    fn anchor(&self) -> Point {
        self.line.anchor()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.line.hit_test(point, tolerance)
    }

    fn to_path(&self) -> BezPath {
        let (start, tip) = self.line.device_points();
        let (wing1, wing2) = self.wing_points();
        // Retrace through the tip so the head fills in as a solid stroke
        let mut path = BezPath::new();
        path.move_to(start);
        path.line_to(tip);
        path.line_to(wing1);
        path.line_to(tip);
        path.line_to(wing2);
        path.line_to(tip);
        path
    }

    fn handles(&self) -> Vec<Handle> {
        self.line.handles()
    }

    fn update_handle(&mut self, kind: HandleKind, point: Point, modifiers: Modifiers) -> bool {
        self.line.update_handle(kind, point, modifiers)
    }

    fn offset_shape(&mut self, dx: f64, dy: f64) {
        self.line.offset_shape(dx, dy);
    }

    fn to_json(&self) -> ShapeJson {
        ShapeJson::Arrow(self.line.to_record())
    }

    fn style(&self) -> &ShapeStyle {
        self.line.style()
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        self.line.style_mut()
    }

    fn is_selected(&self) -> bool {
        self.line.is_selected()
    }

    fn set_selected(&mut self, selected: bool) {
        self.line.set_selected(selected);
    }

    fn zoom_fraction(&self) -> f64 {
        self.line.zoom_fraction()
    }

    fn set_zoom(&mut self, zoom_percent: f64) {
        self.line.set_zoom(zoom_percent);
    }
}
