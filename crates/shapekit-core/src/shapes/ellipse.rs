//! Ellipse shape.
//!
//! The geometry is edited through four handles on the two axes. `Start` and
//! `End` sit on the length axis and drive the centre, rotation and `rx`;
//! `Left` and `Right` sit on the width axis and drive `ry`. Rebuilding from
//! handles is the only way radii change after construction.

use super::{EllipseJson, ShapeError, ShapeId, ShapeJson, ShapeStyle, ShapeTrait, random_shape_id};
use crate::geometry::{axis_angle_degrees, rotate_about};
use crate::handles::{Handle, HandleKind, handle_position};
use crate::input::Modifiers;
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape};

/// Width/length ratio used while the length axis is still zero.
pub const DEFAULT_YX_RATIO: f64 = 0.5;

/// Tolerance when deciding whether an import matrix is a similarity.
const SIMILARITY_EPSILON: f64 = 1e-6;

/// A rotated ellipse.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipse {
    pub(crate) id: ShapeId,
    pub cx: f64,
    pub cy: f64,
    pub rx: f64,
    pub ry: f64,
    /// Rotation of the length axis in degrees.
    pub rotation: f64,
    /// Retained `ry / rx`, updated whenever the width is set explicitly.
    pub yx_ratio: f64,
    /// Style properties.
    pub style: ShapeStyle,
    selected: bool,
    zoom_fraction: f64,
}

/// The four axis handles in model space.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisHandles {
    start: Point,
    end: Point,
    left: Point,
    right: Point,
}

impl AxisHandles {
    fn transformed(self, affine: Affine) -> Self {
        Self {
            start: affine * self.start,
            end: affine * self.end,
            left: affine * self.left,
            right: affine * self.right,
        }
    }
}

impl Ellipse {
    /// Create a new ellipse.
    pub fn new(cx: f64, cy: f64, rx: f64, ry: f64, rotation: f64) -> Self {
        Self {
            id: random_shape_id(),
            cx,
            cy,
            rx,
            ry,
            rotation,
            yx_ratio: ratio_of(rx, ry),
            style: ShapeStyle::default(),
            selected: false,
            zoom_fraction: 1.0,
        }
    }

    pub(crate) fn from_json(json: &EllipseJson, defaults: &ShapeStyle) -> Result<Self, ShapeError> {
        let mut ellipse = Self::new(json.cx, json.cy, json.rx, json.ry, json.rotation);
        ellipse.id = json.id.unwrap_or(ellipse.id);
        ellipse.style =
            ShapeStyle::resolve(json.stroke_color.as_deref(), json.stroke_width, defaults);
        if let Some(transform) = &json.transform {
            let affine = parse_transform(transform)?;
            ellipse.apply_transform(affine);
        }
        Ok(ellipse)
    }

    pub fn center(&self) -> Point {
        Point::new(self.cx, self.cy)
    }

    fn axis_handles(&self) -> AxisHandles {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        AxisHandles {
            start: Point::new(self.cx - cos * self.rx, self.cy - sin * self.rx),
            end: Point::new(self.cx + cos * self.rx, self.cy + sin * self.rx),
            left: Point::new(self.cx + sin * self.ry, self.cy - cos * self.ry),
            right: Point::new(self.cx - sin * self.ry, self.cy + cos * self.ry),
        }
    }

    /// Rebuild centre, rotation and `rx` from the length axis.
    fn set_length_axis(&mut self, start: Point, end: Point) {
        self.rotation = axis_angle_degrees(start, end);
        let center = start.midpoint(end);
        self.cx = center.x;
        self.cy = center.y;
        self.rx = start.distance(end) / 2.0;
    }

    /// Set `ry` from the width axis and retain the new ratio.
    fn set_width_axis(&mut self, left: Point, right: Point) {
        self.ry = left.distance(right) / 2.0;
        self.yx_ratio = ratio_of(self.rx, self.ry);
    }

    /// Apply a one-off import matrix to the handles and rebuild from them.
    ///
    /// Only rotation, translation and uniform scale map an ellipse onto an
    /// ellipse; anything else is applied best effort.
    pub fn apply_transform(&mut self, affine: Affine) {
        if !is_similarity(affine) {
            log::warn!(
                "Ellipse {} transform {:?} has skew or non-uniform scale, result is approximate",
                self.id,
                affine.as_coeffs()
            );
        }
        let handles = self.axis_handles().transformed(affine);
        self.set_length_axis(handles.start, handles.end);
        self.set_width_axis(handles.left, handles.right);
    }

    /// Move the `End` handle while the ellipse is being drawn.
    ///
    /// Unlike an edit, the width follows the length at the retained ratio,
    /// or as a circle while the ratio-lock modifier is held. The retained
    /// ratio itself only changes in [`Ellipse::finish_creation`].
    pub fn drag_creation_end(&mut self, point: Point, modifiers: Modifiers) {
        let start = self.axis_handles().start;
        self.set_length_axis(start, point);
        let ratio = if modifiers.locks_ratio() {
            1.0
        } else {
            self.yx_ratio
        };
        self.ry = ratio * self.rx;
    }

    /// Retain the ratio the ellipse was drawn with.
    pub fn finish_creation(&mut self) {
        self.yx_ratio = ratio_of(self.rx, self.ry);
    }
}

fn ratio_of(rx: f64, ry: f64) -> f64 {
    if rx > 0.0 { ry / rx } else { DEFAULT_YX_RATIO }
}

fn is_similarity(affine: Affine) -> bool {
    let [a, b, c, d, _, _] = affine.as_coeffs();
    let same_scale = ((a * a + b * b) - (c * c + d * d)).abs() < SIMILARITY_EPSILON;
    let orthogonal = (a * c + b * d).abs() < SIMILARITY_EPSILON;
    same_scale && orthogonal
}

/// Parse an SVG-style `matrix(a,b,c,d,e,f)` string.
///
/// Values may be separated by commas, whitespace or both.
pub fn parse_transform(transform: &str) -> Result<Affine, ShapeError> {
    let malformed = || ShapeError::MalformedTransform(transform.to_string());
    let inner = transform
        .trim()
        .strip_prefix("matrix(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(malformed)?;

    let values = inner
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().map_err(|_| malformed()))
        .collect::<Result<Vec<_>, _>>()?;

    let coeffs: [f64; 6] = values.try_into().map_err(|_| malformed())?;
    Ok(Affine::new(coeffs))
}

impl ShapeTrait for Ellipse {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let half_w = ((self.rx * cos).powi(2) + (self.ry * sin).powi(2)).sqrt();
        let half_h = ((self.rx * sin).powi(2) + (self.ry * cos).powi(2)).sqrt();
        Rect::new(
            self.cx - half_w,
            self.cy - half_h,
            self.cx + half_w,
            self.cy + half_h,
        )
    }

    fn anchor(&self) -> Point {
        self.center()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        // Undo the rotation and test against the axis-aligned ellipse
        let local = rotate_about(point, self.center(), -self.rotation);
        let pad = tolerance + self.style.stroke_width / 2.0;
        let a = self.rx + pad;
        let b = self.ry + pad;
        let dx = local.x - self.cx;
        let dy = local.y - self.cy;
        (dx * dx) / (a * a) + (dy * dy) / (b * b) <= 1.0
    }

    fn to_path(&self) -> BezPath {
        let f = self.zoom_fraction;
        kurbo::Ellipse::new(
            Point::new(self.cx * f, self.cy * f),
            (self.rx * f, self.ry * f),
            self.rotation.to_radians(),
        )
        .to_path(0.1)
    }

    fn handles(&self) -> Vec<Handle> {
        let h = self.axis_handles();
        vec![
            Handle::new(HandleKind::Start, h.start),
            Handle::new(HandleKind::End, h.end),
            Handle::new(HandleKind::Left, h.left),
            Handle::new(HandleKind::Right, h.right),
        ]
    }

    fn update_handle(&mut self, kind: HandleKind, point: Point, modifiers: Modifiers) -> bool {
        let handles = self.handles();
        let (Some(start), Some(end), Some(left), Some(right)) = (
            handle_position(&handles, HandleKind::Start),
            handle_position(&handles, HandleKind::End),
            handle_position(&handles, HandleKind::Left),
            handle_position(&handles, HandleKind::Right),
        ) else {
            return false;
        };

        match kind {
            HandleKind::Start | HandleKind::End => {
                let (start, end) = if kind == HandleKind::Start {
                    (point, end)
                } else {
                    (start, point)
                };
                self.set_length_axis(start, end);
                if modifiers.locks_ratio() {
                    self.yx_ratio = 1.0;
                    self.ry = self.rx;
                } else {
                    // Width is left alone; only the ratio follows
                    self.yx_ratio = ratio_of(self.rx, self.ry);
                }
            }
            HandleKind::Left | HandleKind::Right => {
                let (left, right) = if kind == HandleKind::Left {
                    (point, right)
                } else {
                    (left, point)
                };
                self.set_length_axis(start, end);
                self.set_width_axis(left, right);
            }
            _ => return false,
        }
        true
    }

    fn offset_shape(&mut self, dx: f64, dy: f64) {
        self.cx += dx;
        self.cy += dy;
    }

    fn to_json(&self) -> ShapeJson {
        ShapeJson::Ellipse(EllipseJson {
            cx: self.cx,
            cy: self.cy,
            rx: self.rx,
            ry: self.ry,
            rotation: self.rotation,
            transform: None,
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
