//! Line shape.

use super::{LineJson, ShapeId, ShapeJson, ShapeStyle, ShapeTrait, random_shape_id};
use crate::geometry::point_to_segment_dist;
use crate::handles::{Handle, HandleKind};
use crate::input::Modifiers;
use kurbo::{BezPath, Point, Rect};

/// A straight line segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub(crate) id: ShapeId,
    /// Start point (model space).
    pub start: Point,
    /// End point (model space).
    pub end: Point,
    /// Style properties.
    pub style: ShapeStyle,
    selected: bool,
    zoom_fraction: f64,
}

impl Line {
    /// Create a new line.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: random_shape_id(),
            start,
            end,
            style: ShapeStyle::default(),
            selected: false,
            zoom_fraction: 1.0,
        }
    }

    pub(crate) fn from_json(json: &LineJson, defaults: &ShapeStyle) -> Self {
        let mut line = Self::new(Point::new(json.x1, json.y1), Point::new(json.x2, json.y2));
        line.id = json.id.unwrap_or(line.id);
        line.style = ShapeStyle::resolve(json.stroke_color.as_deref(), json.stroke_width, defaults);
        line
    }

    /// Record with this line's coordinates, style and id.
    pub(crate) fn to_record(&self) -> LineJson {
        LineJson {
            x1: self.start.x,
            y1: self.start.y,
            x2: self.end.x,
            y2: self.end.y,
            stroke_color: Some(self.style.stroke_color.clone()),
            stroke_width: Some(self.style.stroke_width),
            id: Some(self.id),
        }
    }

    /// Get the length of the line.
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Get the midpoint of the line.
    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }

    /// Start and end scaled into device space.
    pub(crate) fn device_points(&self) -> (Point, Point) {
        let f = self.zoom_fraction;
        (
            Point::new(self.start.x * f, self.start.y * f),
            Point::new(self.end.x * f, self.end.y * f),
        )
    }
}

impl ShapeTrait for Line {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    fn anchor(&self) -> Point {
        self.midpoint()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_segment_dist(point, self.start, self.end)
            <= tolerance + self.style.stroke_width / 2.0
    }

    fn to_path(&self) -> BezPath {
        let (start, end) = self.device_points();
        let mut path = BezPath::new();
        path.move_to(start);
        path.line_to(end);
        path
    }

    fn handles(&self) -> Vec<Handle> {
        vec![
            Handle::new(HandleKind::Start, self.start),
            Handle::new(HandleKind::Middle, self.midpoint()),
            Handle::new(HandleKind::End, self.end),
        ]
    }

    fn update_handle(&mut self, kind: HandleKind, point: Point, _modifiers: Modifiers) -> bool {
        match kind {
            HandleKind::Start => self.start = point,
            HandleKind::End => self.end = point,
            HandleKind::Middle => {
                let delta = point - self.midpoint();
                self.start += delta;
                self.end += delta;
            }
            _ => return false,
        }
        true
    }

    fn offset_shape(&mut self, dx: f64, dy: f64) {
        self.start.x += dx;
        self.start.y += dy;
        self.end.x += dx;
        self.end.y += dy;
    }

    fn to_json(&self) -> ShapeJson {
        ShapeJson::Line(self.to_record())
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    fn zoom_fraction(&self) -> f64 {
        self.zoom_fraction
    }

    fn set_zoom(&mut self, zoom_percent: f64) {
        self.zoom_fraction = zoom_percent / 100.0;
    }
}
