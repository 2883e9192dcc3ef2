//! Shape definitions for the editor.

mod arrow;
mod ellipse;
mod json;
mod line;
mod polygon;
mod rectangle;

pub use arrow::Arrow;
pub use ellipse::{Ellipse, parse_transform};
pub use json::{EllipseJson, LineJson, PolygonJson, RectangleJson, ShapeJson};
pub use line::Line;
pub use polygon::{Polygon, format_points, parse_points};
pub use rectangle::Rectangle;

use crate::geometry::{Region, paths_intersect, point_in_path, region_to_closed_path};
use crate::handles::{Handle, HandleKind};
use crate::input::Modifiers;
use crate::zoom::Zoom;
use kurbo::{BezPath, Point, Rect};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for shapes.
///
/// Server-assigned ids are positive; ids generated on the client are
/// negative so the two never collide.
pub type ShapeId = i64;

/// Largest magnitude of a generated id (2^53 - 1, exact as a JSON number).
const MAX_GENERATED_ID: u64 = (1 << 53) - 1;

/// Generate a random negative shape id.
pub fn random_shape_id() -> ShapeId {
    let bits = Uuid::new_v4().as_u128() as u64;
    let magnitude = (bits & MAX_GENERATED_ID).max(1);
    -(magnitude as i64)
}

/// Errors raised while building shapes from external records.
#[derive(Debug, Error, PartialEq)]
pub enum ShapeError {
    #[error("Malformed polygon point '{0}', expected 'x,y'")]
    MalformedPoint(String),
    #[error("Polygon needs at least 2 points, got {0}")]
    TooFewPoints(usize),
    #[error("Malformed transform '{0}', expected 'matrix(a,b,c,d,e,f)'")]
    MalformedTransform(String),
}

/// Stroke style shared by every shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeStyle {
    /// Stroke color as given by the UI (e.g. `"#FF0000"`).
    pub stroke_color: String,
    /// Stroke width in model units (zoom independent).
    pub stroke_width: f64,
}

impl ShapeStyle {
    pub fn new(stroke_color: impl Into<String>, stroke_width: f64) -> Self {
        Self {
            stroke_color: stroke_color.into(),
            stroke_width,
        }
    }

    /// Resolve optional JSON style fields against the given defaults.
    ///
    /// A stroke width that is not a positive number is logged and replaced
    /// by the default.
    pub fn resolve(color: Option<&str>, width: Option<f64>, defaults: &ShapeStyle) -> Self {
        let stroke_width = match width {
            Some(width) if is_valid_stroke_width(width) => width,
            Some(width) => {
                log::warn!(
                    "Ignoring invalid stroke width {width}, using {}",
                    defaults.stroke_width
                );
                defaults.stroke_width
            }
            None => defaults.stroke_width,
        };
        Self {
            stroke_color: color
                .map(str::to_string)
                .unwrap_or_else(|| defaults.stroke_color.clone()),
            stroke_width,
        }
    }
}

/// Stroke widths must be finite and positive.
pub fn is_valid_stroke_width(width: f64) -> bool {
    width.is_finite() && width > 0.0
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: "#FF0000".to_string(),
            stroke_width: 2.0,
        }
    }
}

/// Common capabilities of all shapes.
pub trait ShapeTrait {
    /// Get the unique identifier.
    fn id(&self) -> ShapeId;

    /// Get the bounding box in model coordinates.
    fn bounds(&self) -> Rect;

    /// Reference point (model space) used for region selection.
    fn anchor(&self) -> Point;

    /// Check if a point (in model coordinates) hits this shape.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Get the outline in device coordinates (scaled by the zoom fraction).
    fn to_path(&self) -> BezPath;

    /// Check whether this shape falls within a model-space query region.
    ///
    /// The default compares in device space: the anchor inside the region
    /// outline, or the shape outline crossing it.
    fn intersect_region(&self, region: &Region) -> bool {
        let zoom = Zoom::new(self.zoom_fraction() * 100.0);
        let region_path = region_to_closed_path(region, zoom.percent);
        if point_in_path(&region_path, zoom.model_to_device(self.anchor())) {
            return true;
        }
        paths_intersect(&self.to_path(), &region_path)
    }

    /// Manipulation handles in model coordinates.
    fn handles(&self) -> Vec<Handle>;

    /// Called once when a handle drag begins.
    fn start_handle_drag(&mut self) {}

    /// Move a handle to a new model position and rebuild the geometry.
    ///
    /// Returns false when the update was rejected and nothing changed.
    fn update_handle(&mut self, kind: HandleKind, point: Point, modifiers: Modifiers) -> bool;

    /// Translate the whole shape (model units).
    fn offset_shape(&mut self, dx: f64, dy: f64);

    /// Export as a JSON record in model coordinates.
    fn to_json(&self) -> ShapeJson;

    /// Get the style.
    fn style(&self) -> &ShapeStyle;

    /// Get mutable style.
    fn style_mut(&mut self) -> &mut ShapeStyle;

    fn is_selected(&self) -> bool;

    fn set_selected(&mut self, selected: bool);

    /// Current zoom as a fraction (1.0 = 100%).
    fn zoom_fraction(&self) -> f64;

    /// Set the rendering zoom in percent. Model geometry is untouched.
    fn set_zoom(&mut self, zoom_percent: f64);
}

/// Enum wrapper for all shape types.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rectangle(Rectangle),
    Line(Line),
    Arrow(Arrow),
    Ellipse(Ellipse),
    Polygon(Polygon),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Shape::Rectangle($s) => $body,
            Shape::Line($s) => $body,
            Shape::Arrow($s) => $body,
            Shape::Ellipse($s) => $body,
            Shape::Polygon($s) => $body,
        }
    };
}

impl Shape {
    /// Build a shape from a JSON record.
    ///
    /// Missing style fields fall back to `defaults`, a missing id is
    /// generated. The shape starts unselected at `zoom_percent`.
    pub fn from_json(
        json: &ShapeJson,
        defaults: &ShapeStyle,
        zoom_percent: f64,
    ) -> Result<Shape, ShapeError> {
        let mut shape = match json {
            ShapeJson::Rectangle(r) => Shape::Rectangle(Rectangle::from_json(r, defaults)),
            ShapeJson::Line(l) => Shape::Line(Line::from_json(l, defaults)),
            ShapeJson::Arrow(l) => Shape::Arrow(Arrow::from_json(l, defaults)),
            ShapeJson::Ellipse(e) => Shape::Ellipse(Ellipse::from_json(e, defaults)?),
            ShapeJson::Polygon(p) => Shape::Polygon(Polygon::from_json(p, defaults)?),
        };
        shape.set_zoom(zoom_percent);
        Ok(shape)
    }

    /// Name of the variant as used in the JSON `type` field.
    pub fn type_name(&self) -> &'static str {
        match self {
            Shape::Rectangle(_) => "Rectangle",
            Shape::Line(_) => "Line",
            Shape::Arrow(_) => "Arrow",
            Shape::Ellipse(_) => "Ellipse",
            Shape::Polygon(_) => "Polygon",
        }
    }

    /// Check whether this shape has the same type and coordinates as a
    /// JSON record, ignoring id and style.
    pub fn compare_coords(&self, json: &ShapeJson) -> bool {
        self.to_json().compare_coords(json)
    }

    /// Replace the id (used when pasting copies).
    pub fn set_id(&mut self, id: ShapeId) {
        match self {
            Shape::Rectangle(s) => s.id = id,
            Shape::Line(s) => s.id = id,
            Shape::Arrow(s) => s.line.id = id,
            Shape::Ellipse(s) => s.id = id,
            Shape::Polygon(s) => s.id = id,
        }
    }

    pub fn id(&self) -> ShapeId {
        dispatch!(self, s => s.id())
    }

    pub fn bounds(&self) -> Rect {
        dispatch!(self, s => s.bounds())
    }

    pub fn anchor(&self) -> Point {
        dispatch!(self, s => s.anchor())
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        dispatch!(self, s => s.hit_test(point, tolerance))
    }

    pub fn to_path(&self) -> BezPath {
        dispatch!(self, s => s.to_path())
    }

    pub fn intersect_region(&self, region: &Region) -> bool {
        dispatch!(self, s => s.intersect_region(region))
    }

    pub fn handles(&self) -> Vec<Handle> {
        dispatch!(self, s => s.handles())
    }

    pub fn start_handle_drag(&mut self) {
        dispatch!(self, s => s.start_handle_drag())
    }

    pub fn update_handle(&mut self, kind: HandleKind, point: Point, modifiers: Modifiers) -> bool {
        dispatch!(self, s => s.update_handle(kind, point, modifiers))
    }

    pub fn offset_shape(&mut self, dx: f64, dy: f64) {
        dispatch!(self, s => s.offset_shape(dx, dy))
    }

    pub fn to_json(&self) -> ShapeJson {
        dispatch!(self, s => s.to_json())
    }

    pub fn style(&self) -> &ShapeStyle {
        dispatch!(self, s => s.style())
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        dispatch!(self, s => s.style_mut())
    }

    pub fn set_stroke_color(&mut self, color: &str) {
        self.style_mut().stroke_color = color.to_string();
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.style_mut().stroke_width = width;
    }

    pub fn is_selected(&self) -> bool {
        dispatch!(self, s => s.is_selected())
    }

    pub fn set_selected(&mut self, selected: bool) {
        dispatch!(self, s => s.set_selected(selected))
    }

    pub fn zoom_fraction(&self) -> f64 {
        dispatch!(self, s => s.zoom_fraction())
    }

    pub fn set_zoom(&mut self, zoom_percent: f64) {
        dispatch!(self, s => s.set_zoom(zoom_percent))
    }

    /// Stroke width in device pixels.
    pub fn device_stroke_width(&self) -> f64 {
        self.style().stroke_width * self.zoom_fraction()
    }
}
