//! Rectangle shape.

use super::{RectangleJson, ShapeId, ShapeJson, ShapeStyle, ShapeTrait, random_shape_id};
use crate::handles::{Handle, HandleKind};
use crate::input::Modifiers;
use kurbo::{BezPath, Point, Rect, Shape as KurboShape};

/// Smallest width or height a resize may produce (model units).
pub const MIN_RESIZE_SIZE: f64 = 1.0;

/// An axis-aligned rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub(crate) id: ShapeId,
    /// Top-left corner (model space).
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Style properties.
    pub style: ShapeStyle,
    /// Keep the aspect ratio on corner drags even without a modifier.
    pub fixed_ratio: bool,
    selected: bool,
    zoom_fraction: f64,
    /// Aspect ratio (width / height) recorded when a handle drag starts.
    drag_aspect: f64,
}

impl Rectangle {
    /// Create a new rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: random_shape_id(),
            x,
            y,
            width,
            height,
            style: ShapeStyle::default(),
            fixed_ratio: false,
            selected: false,
            zoom_fraction: 1.0,
            drag_aspect: 1.0,
        }
    }

    /// Create a rectangle from two corner points.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        let mut rect = Self::new(0.0, 0.0, 0.0, 0.0);
        rect.set_corners(p1, p2);
        rect
    }

    pub(crate) fn from_json(json: &RectangleJson, defaults: &ShapeStyle) -> Self {
        let mut rect = Self::new(json.x, json.y, json.width, json.height);
        rect.id = json.id.unwrap_or(rect.id);
        rect.style = ShapeStyle::resolve(json.stroke_color.as_deref(), json.stroke_width, defaults);
        rect
    }

    /// Reposition from two opposite corners, normalized to a top-left origin.
    pub fn set_corners(&mut self, p1: Point, p2: Point) {
        self.x = p1.x.min(p2.x);
        self.y = p1.y.min(p2.y);
        self.width = (p2.x - p1.x).abs();
        self.height = (p2.y - p1.y).abs();
    }

    /// Get the rectangle as a kurbo Rect (model space).
    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Resize for a corner drag. The opposite corner stays fixed.
    fn corner_resize(&self, kind: HandleKind, point: Point, keep_ratio: bool) -> Option<Rect> {
        let r = self.as_rect();
        // (fixed corner, outward direction of the dragged corner)
        let (anchor, sx, sy) = match kind {
            HandleKind::TopLeft => (Point::new(r.x1, r.y1), -1.0, -1.0),
            HandleKind::TopRight => (Point::new(r.x0, r.y1), 1.0, -1.0),
            HandleKind::BottomLeft => (Point::new(r.x1, r.y0), -1.0, 1.0),
            HandleKind::BottomRight => (Point::new(r.x0, r.y0), 1.0, 1.0),
            _ => return None,
        };

        let mut w = (point.x - anchor.x) * sx;
        let mut h = (point.y - anchor.y) * sy;
        if w < MIN_RESIZE_SIZE || h < MIN_RESIZE_SIZE {
            return None;
        }

        if keep_ratio && self.drag_aspect > 0.0 {
            // The dominant axis drives the other one
            if w / h > self.drag_aspect {
                h = w / self.drag_aspect;
            } else {
                w = h * self.drag_aspect;
            }
        }

        Some(Rect::from_points(
            anchor,
            Point::new(anchor.x + w * sx, anchor.y + h * sy),
        ))
    }

    /// Resize for an edge-midpoint drag. Only the dragged edge moves.
    fn edge_resize(&self, kind: HandleKind, point: Point) -> Option<Rect> {
        let r = self.as_rect();
        let resized = match kind {
            HandleKind::Top => Rect::new(r.x0, point.y, r.x1, r.y1),
            HandleKind::Bottom => Rect::new(r.x0, r.y0, r.x1, point.y),
            HandleKind::Left => Rect::new(point.x, r.y0, r.x1, r.y1),
            HandleKind::Right => Rect::new(r.x0, r.y0, point.x, r.y1),
            _ => return None,
        };
        // Crossing the opposite edge shows up as a negative extent
        (resized.width() >= MIN_RESIZE_SIZE && resized.height() >= MIN_RESIZE_SIZE)
            .then_some(resized)
    }
}

impl ShapeTrait for Rectangle {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn anchor(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let pad = tolerance + self.style.stroke_width / 2.0;
        self.as_rect().inflate(pad, pad).contains(point)
    }

    fn to_path(&self) -> BezPath {
        let f = self.zoom_fraction;
        Rect::new(
            self.x * f,
            self.y * f,
            (self.x + self.width) * f,
            (self.y + self.height) * f,
        )
        .to_path(0.1)
    }

    fn handles(&self) -> Vec<Handle> {
        let r = self.as_rect();
        let c = r.center();
        vec![
            Handle::new(HandleKind::TopLeft, Point::new(r.x0, r.y0)),
            Handle::new(HandleKind::Top, Point::new(c.x, r.y0)),
            Handle::new(HandleKind::TopRight, Point::new(r.x1, r.y0)),
            Handle::new(HandleKind::Right, Point::new(r.x1, c.y)),
            Handle::new(HandleKind::BottomRight, Point::new(r.x1, r.y1)),
            Handle::new(HandleKind::Bottom, Point::new(c.x, r.y1)),
            Handle::new(HandleKind::BottomLeft, Point::new(r.x0, r.y1)),
            Handle::new(HandleKind::Left, Point::new(r.x0, c.y)),
        ]
    }

    fn start_handle_drag(&mut self) {
        self.drag_aspect = if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        };
    }

    fn update_handle(&mut self, kind: HandleKind, point: Point, modifiers: Modifiers) -> bool {
        let keep_ratio = modifiers.locks_ratio() || self.fixed_ratio;
        let resized = if kind.is_corner() {
            self.corner_resize(kind, point, keep_ratio)
        } else {
            self.edge_resize(kind, point)
        };
        let Some(r) = resized else {
            log::debug!("Rejected resize of rectangle {} via {:?}", self.id, kind);
            return false;
        };

        self.x = r.x0;
        self.y = r.y0;
        self.width = r.width();
        self.height = r.height();
        true
    }

    fn offset_shape(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    fn to_json(&self) -> ShapeJson {
        ShapeJson::Rectangle(RectangleJson {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            stroke_color: Some(self.style.stroke_color.clone()),
            stroke_width: Some(self.style.stroke_width),
            id: Some(self.id),
        })
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Region;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_from_json_record() {
        let json: RectangleJson = serde_json::from_str(
            r##"{"x":100,"y":250,"width":325,"height":250,"strokeColor":"#00FF00","strokeWidth":3,"id":42}"##,
        )
        .unwrap();
        let rect = Rectangle::from_json(&json, &ShapeStyle::default());
        assert_eq!(rect.id(), 42);
        assert!(approx(rect.x, 100.0));
        assert!(approx(rect.width, 325.0));
        assert_eq!(rect.style.stroke_color, "#00FF00");
        assert!(approx(rect.style.stroke_width, 3.0));
    }

    #[test]
    fn test_from_corners_normalizes() {
        let rect = Rectangle::from_corners(Point::new(50.0, 40.0), Point::new(10.0, 80.0));
        assert!(approx(rect.x, 10.0));
        assert!(approx(rect.y, 40.0));
        assert!(approx(rect.width, 40.0));
        assert!(approx(rect.height, 40.0));
    }

    #[test]
    fn test_corner_drag_keeps_opposite_corner() {
        let mut rect = Rectangle::new(10.0, 10.0, 100.0, 50.0);
        rect.start_handle_drag();
        assert!(rect.update_handle(HandleKind::TopLeft, Point::new(0.0, 5.0), Modifiers::NONE));
        assert!(approx(rect.x, 0.0));
        assert!(approx(rect.y, 5.0));
        assert!(approx(rect.x + rect.width, 110.0));
        assert!(approx(rect.y + rect.height, 60.0));
    }

    #[test]
    fn test_edge_drag_moves_one_edge() {
        let mut rect = Rectangle::new(10.0, 10.0, 100.0, 50.0);
        rect.start_handle_drag();
        assert!(rect.update_handle(HandleKind::Right, Point::new(200.0, 999.0), Modifiers::NONE));
        assert!(approx(rect.width, 190.0));
        assert!(approx(rect.height, 50.0));
        assert!(approx(rect.x, 10.0));
    }

    #[test]
    fn test_resize_below_minimum_is_rejected() {
        let mut rect = Rectangle::new(10.0, 10.0, 100.0, 50.0);
        rect.start_handle_drag();
        let before = rect.clone();
        // Zero width
        assert!(!rect.update_handle(HandleKind::Right, Point::new(10.0, 30.0), Modifiers::NONE));
        // Past the opposite corner
        assert!(!rect.update_handle(
            HandleKind::BottomRight,
            Point::new(0.0, 100.0),
            Modifiers::NONE
        ));
        assert!(!rect.update_handle(HandleKind::Top, Point::new(50.0, 59.5), Modifiers::NONE));
        assert_eq!(rect, before);
    }

    #[test]
    fn test_shift_keeps_aspect_ratio() {
        let mut rect = Rectangle::new(0.0, 0.0, 100.0, 50.0);
        rect.start_handle_drag();
        // Width dominates: height follows
        assert!(rect.update_handle(
            HandleKind::BottomRight,
            Point::new(300.0, 60.0),
            Modifiers::SHIFT
        ));
        assert!(approx(rect.width, 300.0));
        assert!(approx(rect.height, 150.0));

        // Height dominates: width follows
        assert!(rect.update_handle(
            HandleKind::BottomRight,
            Point::new(50.0, 200.0),
            Modifiers::SHIFT
        ));
        assert!(approx(rect.height, 200.0));
        assert!(approx(rect.width, 400.0));
    }

    #[test]
    fn test_fixed_ratio_flag_locks_without_modifier() {
        let mut rect = Rectangle::new(0.0, 0.0, 40.0, 40.0);
        rect.fixed_ratio = true;
        rect.start_handle_drag();
        assert!(rect.update_handle(
            HandleKind::BottomRight,
            Point::new(100.0, 60.0),
            Modifiers::NONE
        ));
        assert!(approx(rect.width, 100.0));
        assert!(approx(rect.height, 100.0));
    }

    #[test]
    fn test_region_uses_top_left_anchor() {
        let rect = Rectangle::new(10.0, 10.0, 200.0, 200.0);
        // Contains the top-left corner
        assert!(rect.intersect_region(&Region::new(0.0, 0.0, 20.0, 20.0)));
        // Crosses the left edge only
        assert!(rect.intersect_region(&Region::new(0.0, 100.0, 20.0, 20.0)));
        // Strictly inside, touching neither the anchor nor the outline
        assert!(!rect.intersect_region(&Region::new(50.0, 50.0, 20.0, 20.0)));
        // Far away
        assert!(!rect.intersect_region(&Region::new(500.0, 500.0, 20.0, 20.0)));
    }

    #[test]
    fn test_hit_test_interior_and_outside() {
        let rect = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        assert!(rect.hit_test(Point::new(50.0, 50.0), 2.0));
        assert!(rect.hit_test(Point::new(102.0, 50.0), 2.0));
        assert!(!rect.hit_test(Point::new(110.0, 50.0), 2.0));
    }

    #[test]
    fn test_to_json_is_model_space() {
        let mut rect = Rectangle::new(5.0, 6.0, 7.0, 8.0);
        rect.set_zoom(300.0);
        let ShapeJson::Rectangle(json) = rect.to_json() else {
            panic!("expected a rectangle record");
        };
        assert!(approx(json.x, 5.0));
        assert!(approx(json.height, 8.0));
        assert_eq!(json.id, Some(rect.id()));
    }
}
