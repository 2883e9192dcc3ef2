//! Serialized shape records.
//!
//! These are the model-space records exchanged with the host. The `type`
//! field selects the variant; style and id are optional on input.

use super::{Shape, ShapeError, ShapeId, ShapeStyle, format_points, parse_points};
use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Tolerance used when comparing coordinates of two records.
const COORD_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectangleJson {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ShapeId>,
}

/// Record shared by lines and arrows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineJson {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ShapeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EllipseJson {
    pub cx: f64,
    pub cy: f64,
    pub rx: f64,
    pub ry: f64,
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
    /// Optional `matrix(a,b,c,d,e,f)` applied to the geometry on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ShapeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonJson {
    /// Space separated `x,y` pairs.
    pub points: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ShapeId>,
}

/// A serialized shape of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShapeJson {
    Rectangle(RectangleJson),
    Line(LineJson),
    Arrow(LineJson),
    Ellipse(EllipseJson),
    Polygon(PolygonJson),
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < COORD_EPSILON
}

impl ShapeJson {
    pub fn type_name(&self) -> &'static str {
        match self {
            ShapeJson::Rectangle(_) => "Rectangle",
            ShapeJson::Line(_) => "Line",
            ShapeJson::Arrow(_) => "Arrow",
            ShapeJson::Ellipse(_) => "Ellipse",
            ShapeJson::Polygon(_) => "Polygon",
        }
    }

    pub fn id(&self) -> Option<ShapeId> {
        match self {
            ShapeJson::Rectangle(r) => r.id,
            ShapeJson::Line(l) | ShapeJson::Arrow(l) => l.id,
            ShapeJson::Ellipse(e) => e.id,
            ShapeJson::Polygon(p) => p.id,
        }
    }

    pub fn set_id(&mut self, id: Option<ShapeId>) {
        match self {
            ShapeJson::Rectangle(r) => r.id = id,
            ShapeJson::Line(l) | ShapeJson::Arrow(l) => l.id = id,
            ShapeJson::Ellipse(e) => e.id = id,
            ShapeJson::Polygon(p) => p.id = id,
        }
    }

    /// Same type and same coordinates. Id and style are ignored.
    pub fn compare_coords(&self, other: &ShapeJson) -> bool {
        match (self, other) {
            (ShapeJson::Rectangle(a), ShapeJson::Rectangle(b)) => {
                close(a.x, b.x)
                    && close(a.y, b.y)
                    && close(a.width, b.width)
                    && close(a.height, b.height)
            }
            (ShapeJson::Line(a), ShapeJson::Line(b))
            | (ShapeJson::Arrow(a), ShapeJson::Arrow(b)) => {
                close(a.x1, b.x1) && close(a.y1, b.y1) && close(a.x2, b.x2) && close(a.y2, b.y2)
            }
            (ShapeJson::Ellipse(a), ShapeJson::Ellipse(b)) => {
                close(a.cx, b.cx)
                    && close(a.cy, b.cy)
                    && close(a.rx, b.rx)
                    && close(a.ry, b.ry)
                    && close(a.rotation, b.rotation)
            }
            (ShapeJson::Polygon(a), ShapeJson::Polygon(b)) => {
                match (parse_points(&a.points), parse_points(&b.points)) {
                    (Ok(pa), Ok(pb)) => {
                        pa.len() == pb.len()
                            && pa.iter().zip(&pb).all(|(p, q)| close(p.x, q.x) && close(p.y, q.y))
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// Model-space bounding box of the shape this record describes.
    pub fn bounds(&self) -> Result<Rect, ShapeError> {
        Ok(Shape::from_json(self, &ShapeStyle::default(), 100.0)?.bounds())
    }

    /// Translate the record's coordinates (model units).
    pub fn offset_coords(&mut self, dx: f64, dy: f64) -> Result<(), ShapeError> {
        match self {
            ShapeJson::Rectangle(r) => {
                r.x += dx;
                r.y += dy;
            }
            ShapeJson::Line(l) | ShapeJson::Arrow(l) => {
                l.x1 += dx;
                l.y1 += dy;
                l.x2 += dx;
                l.y2 += dy;
            }
            ShapeJson::Ellipse(e) => {
                e.cx += dx;
                e.cy += dy;
            }
            ShapeJson::Polygon(p) => {
                let moved: Vec<_> = parse_points(&p.points)?
                    .into_iter()
                    .map(|pt| kurbo::Point::new(pt.x + dx, pt.y + dy))
                    .collect();
                p.points = format_points(&moved);
            }
        }
        Ok(())
    }
}
