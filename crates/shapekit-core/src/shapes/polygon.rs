//! Polygon shape.

use super::{PolygonJson, ShapeError, ShapeId, ShapeJson, ShapeStyle, ShapeTrait, random_shape_id};
use crate::geometry::{Region, point_to_segment_dist, points_bounds};
use crate::handles::{Handle, HandleKind};
use crate::input::Modifiers;
use kurbo::{BezPath, Point, Rect, Shape as KurboShape};

/// Minimum number of vertices a stored polygon record must have.
pub const MIN_POINTS: usize = 2;

/// A closed polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub(crate) id: ShapeId,
    /// Vertices in drawing order (model space).
    pub points: Vec<Point>,
    /// Style properties.
    pub style: ShapeStyle,
    selected: bool,
    zoom_fraction: f64,
}

/// Parse a `"x1,y1 x2,y2 ..."` vertex string.
pub fn parse_points(points: &str) -> Result<Vec<Point>, ShapeError> {
    points
        .split_whitespace()
        .map(|pair| {
            let malformed = || ShapeError::MalformedPoint(pair.to_string());
            let (x, y) = pair.split_once(',').ok_or_else(malformed)?;
            let x = x.trim().parse::<f64>().map_err(|_| malformed())?;
            let y = y.trim().parse::<f64>().map_err(|_| malformed())?;
            Ok(Point::new(x, y))
        })
        .collect()
}

/// Format vertices as a `"x1,y1 x2,y2 ..."` string.
pub fn format_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Polygon {
    /// Create a new polygon.
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            id: random_shape_id(),
            points,
            style: ShapeStyle::default(),
            selected: false,
            zoom_fraction: 1.0,
        }
    }

    pub(crate) fn from_json(json: &PolygonJson, defaults: &ShapeStyle) -> Result<Self, ShapeError> {
        let points = parse_points(&json.points)?;
        if points.len() < MIN_POINTS {
            return Err(ShapeError::TooFewPoints(points.len()));
        }
        let mut polygon = Self::new(points);
        polygon.id = json.id.unwrap_or(polygon.id);
        polygon.style =
            ShapeStyle::resolve(json.stroke_color.as_deref(), json.stroke_width, defaults);
        Ok(polygon)
    }

    pub(crate) fn push_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Move the trailing (in-progress) vertex.
    pub(crate) fn move_last_point(&mut self, point: Point) {
        if let Some(last) = self.points.last_mut() {
            *last = point;
        }
    }

    pub(crate) fn pop_point(&mut self) -> Option<Point> {
        self.points.pop()
    }

    /// Number of vertices ignoring consecutive repeats (and a closing repeat
    /// of the first vertex).
    pub fn distinct_point_count(&self) -> usize {
        let mut count = 0;
        let mut prev: Option<Point> = None;
        for &p in &self.points {
            if prev != Some(p) {
                count += 1;
            }
            prev = Some(p);
        }
        if count > 1 && self.points.first() == self.points.last() {
            count -= 1;
        }
        count
    }

    fn closed_path(&self, scale: f64) -> BezPath {
        let mut path = BezPath::new();
        let mut iter = self.points.iter().map(|p| Point::new(p.x * scale, p.y * scale));
        if let Some(first) = iter.next() {
            path.move_to(first);
            for p in iter {
                path.line_to(p);
            }
            path.close_path();
        }
        path
    }
}

impl ShapeTrait for Polygon {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        points_bounds(&self.points)
    }

    fn anchor(&self) -> Point {
        self.bounds().center()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if self.closed_path(1.0).contains(point) {
            return true;
        }
        let reach = tolerance + self.style.stroke_width / 2.0;
        let n = self.points.len();
        (0..n).any(|i| {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            point_to_segment_dist(point, a, b) <= reach
        })
    }

    fn to_path(&self) -> BezPath {
        self.closed_path(self.zoom_fraction)
    }

    /// Bounding-box overlap only; vertices and edges are not tested.
    fn intersect_region(&self, region: &Region) -> bool {
        region.overlaps(&Region::from_rect(self.bounds()))
    }

    fn handles(&self) -> Vec<Handle> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, &p)| Handle::new(HandleKind::Vertex(i), p))
            .collect()
    }

    fn update_handle(&mut self, kind: HandleKind, point: Point, _modifiers: Modifiers) -> bool {
        match kind {
            HandleKind::Vertex(i) => match self.points.get_mut(i) {
                Some(vertex) => {
                    *vertex = point;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    fn offset_shape(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            p.x += dx;
            p.y += dy;
        }
    }

    fn to_json(&self) -> ShapeJson {
        ShapeJson::Polygon(PolygonJson {
            points: format_points(&self.points),
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
