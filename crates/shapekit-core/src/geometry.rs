//! Coordinate transforms, angle math and outline intersection tests.
//!
//! Everything here works on plain kurbo values. Shapes use these helpers to
//! build their device-space outlines and to answer region queries.

use crate::zoom::Zoom;
use kurbo::{BezPath, PathEl, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Flattening tolerance (device pixels) used when outlines contain curves.
pub const FLATTEN_TOLERANCE: f64 = 0.25;

/// Convert a model-space value to device space at the given zoom percent.
pub fn to_device_coords(model_value: f64, zoom_percent: f64) -> f64 {
    model_value * zoom_percent / 100.0
}

/// Convert a device-space value back to model space at the given zoom percent.
pub fn to_model_coords(device_value: f64, zoom_percent: f64) -> f64 {
    device_value * 100.0 / zoom_percent
}

/// An axis-aligned rectangle in model space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a region from an anchor and the current drag point.
    ///
    /// The result always has its origin at the top-left, whichever way the
    /// drag went.
    pub fn from_corners(anchor: Point, current: Point) -> Self {
        Self {
            x: anchor.x.min(current.x),
            y: anchor.y.min(current.y),
            width: (current.x - anchor.x).abs(),
            height: (current.y - anchor.y).abs(),
        }
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }

    /// Check whether a point lies inside or on the edge of the region.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Check whether two regions overlap (touching edges count).
    pub fn overlaps(&self, other: &Region) -> bool {
        !(other.x > self.x + self.width
            || other.y > self.y + self.height
            || other.x + other.width < self.x
            || other.y + other.height < self.y)
    }
}

/// Convert a model-space region into a closed 4-point outline in device space.
pub fn region_to_closed_path(region: &Region, zoom_percent: f64) -> BezPath {
    let (x0, y0) = (region.x, region.y);
    let (x1, y1) = (region.x + region.width, region.y + region.height);

    let mut path = BezPath::new();
    path.move_to(Point::new(x0, y0));
    path.line_to(Point::new(x1, y0));
    path.line_to(Point::new(x1, y1));
    path.line_to(Point::new(x0, y1));
    path.close_path();
    Zoom::new(zoom_percent).transform() * path
}

/// Check whether a point lies inside a closed path (non-zero winding).
pub fn point_in_path(path: &BezPath, point: Point) -> bool {
    path.contains(point)
}

/// Check whether the outlines of two paths cross or touch.
///
/// Curves are flattened first, then every segment pair is tested.
pub fn paths_intersect(a: &BezPath, b: &BezPath) -> bool {
    let segs_a = flatten_segments(a);
    let segs_b = flatten_segments(b);
    if segs_a.is_empty() || segs_b.is_empty() {
        return false;
    }

    // Cheap reject on bounding boxes
    let bb_a = a.bounding_box();
    let bb_b = b.bounding_box();
    if bb_a.x0 > bb_b.x1 || bb_b.x0 > bb_a.x1 || bb_a.y0 > bb_b.y1 || bb_b.y0 > bb_a.y1 {
        return false;
    }

    segs_a.iter().any(|&(p1, p2)| {
        segs_b
            .iter()
            .any(|&(q1, q2)| segments_intersect(p1, p2, q1, q2))
    })
}

/// Flatten a path into straight segments, closing subpaths where requested.
pub fn flatten_segments(path: &BezPath) -> Vec<(Point, Point)> {
    let mut segments = Vec::new();
    let mut subpath_start: Option<Point> = None;
    let mut last: Option<Point> = None;

    kurbo::flatten(path.iter(), FLATTEN_TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => {
            subpath_start = Some(p);
            last = Some(p);
        }
        PathEl::LineTo(p) => {
            if let Some(prev) = last {
                segments.push((prev, p));
            }
            last = Some(p);
        }
        PathEl::ClosePath => {
            if let (Some(prev), Some(start)) = (last, subpath_start) {
                if prev != start {
                    segments.push((prev, start));
                }
                last = Some(start);
            }
        }
        // flatten only emits MoveTo, LineTo and ClosePath
        _ => {}
    });
    segments
}

/// Test if two line segments (a-b) and (c-d) intersect.
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let cross = |o: Point, p: Point, q: Point| -> f64 {
        (p.x - o.x) * (q.y - o.y) - (p.y - o.y) * (q.x - o.x)
    };
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    // Collinear cases: check if endpoint lies on the other segment
    let on_segment = |p: Point, q: Point, r: Point| -> bool {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };
    (d1.abs() < 1e-10 && on_segment(c, d, a))
        || (d2.abs() < 1e-10 && on_segment(c, d, b))
        || (d3.abs() < 1e-10 && on_segment(a, b, c))
        || (d4.abs() < 1e-10 && on_segment(a, b, d))
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    point.distance(proj)
}

/// Angle in degrees of the axis running from `from` to `to`.
///
/// A vertical axis (dx == 0) is always 90°, whichever way it points. For
/// dx < 0 the arctangent is shifted by 180° so the angle follows the axis
/// direction into the second and third quadrants.
pub fn axis_angle_degrees(from: Point, to: Point) -> f64 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0.0 {
        90.0
    } else if dx > 0.0 {
        (dy / dx).atan().to_degrees()
    } else {
        180.0 + (dy / dx).atan().to_degrees()
    }
}

/// Rotate a point around a centre by an angle in degrees.
pub fn rotate_about(point: Point, center: Point, degrees: f64) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Point::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}

/// Axis-aligned bounding box of a set of points.
pub fn points_bounds(points: &[Point]) -> Rect {
    let (min_x, max_x) = points.iter().fold((f64::MAX, f64::MIN), |(mn, mx), p| {
        (mn.min(p.x), mx.max(p.x))
    });
    let (min_y, max_y) = points.iter().fold((f64::MAX, f64::MIN), |(mn, mx), p| {
        (mn.min(p.y), mx.max(p.y))
    });
    if points.is_empty() {
        return Rect::ZERO;
    }
    Rect::new(min_x, min_y, max_x, max_y)
}
