//! Tool modes and the shape factories that build new shapes from drags.

use crate::error::ManagerError;
use crate::input::Modifiers;
use crate::shapes::{Arrow, Ellipse, Line, Polygon, Rectangle, Shape, ShapeStyle, ShapeTrait};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shapes whose extent stays within this many model units on the relevant
/// axes when the drag ends are discarded.
pub const DEGENERATE_THRESHOLD: f64 = 2.0;

/// A click within this distance of the first polygon vertex closes it.
pub const POLYGON_CLOSE_DISTANCE: f64 = 2.0;

/// Available tool modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ToolMode {
    #[default]
    Select,
    Rect,
    Line,
    Arrow,
    Ellipse,
    Polygon,
}

impl ToolMode {
    pub const ALL: [ToolMode; 6] = [
        ToolMode::Select,
        ToolMode::Rect,
        ToolMode::Line,
        ToolMode::Arrow,
        ToolMode::Ellipse,
        ToolMode::Polygon,
    ];

    /// Name used by hosts (`"SELECT"`, `"RECT"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolMode::Select => "SELECT",
            ToolMode::Rect => "RECT",
            ToolMode::Line => "LINE",
            ToolMode::Arrow => "ARROW",
            ToolMode::Ellipse => "ELLIPSE",
            ToolMode::Polygon => "POLYGON",
        }
    }

    /// Whether this mode draws new shapes.
    pub fn is_creation(&self) -> bool {
        !matches!(self, ToolMode::Select)
    }
}

impl fmt::Display for ToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolMode {
    type Err = ManagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ManagerError::InvalidState(s.to_string()))
    }
}

/// Result of ending a creation gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum FactoryOutcome {
    /// A finished shape, ready to be added.
    Created(Shape),
    /// The result was degenerate and has been dropped.
    Discarded,
    /// More input is needed (multi-click shapes), or nothing was started.
    Pending,
}

fn apply_session_style<S: ShapeTrait>(shape: &mut S, style: &ShapeStyle, zoom_percent: f64) {
    *shape.style_mut() = style.clone();
    shape.set_zoom(zoom_percent);
}

fn too_small(a: Point, b: Point) -> bool {
    (b.x - a.x).abs() <= DEGENERATE_THRESHOLD && (b.y - a.y).abs() <= DEGENERATE_THRESHOLD
}

/// Drag-to-create session for rectangles.
#[derive(Debug, Clone, Default)]
pub struct CreateRect {
    session: Option<(Point, Rectangle)>,
}

impl CreateRect {
    pub fn begin(&mut self, point: Point, style: &ShapeStyle, zoom_percent: f64) {
        let mut rect = Rectangle::from_corners(point, point);
        apply_session_style(&mut rect, style, zoom_percent);
        self.session = Some((point, rect));
    }

    /// Stretch from the anchor to `point`. Shift makes a square.
    pub fn update(&mut self, point: Point, modifiers: Modifiers) {
        if let Some((anchor, rect)) = &mut self.session {
            let corner = if modifiers.locks_ratio() {
                let side = (point.x - anchor.x).abs().max((point.y - anchor.y).abs());
                Point::new(
                    anchor.x + side.copysign(point.x - anchor.x),
                    anchor.y + side.copysign(point.y - anchor.y),
                )
            } else {
                point
            };
            rect.set_corners(*anchor, corner);
        }
    }

    pub fn end(&mut self) -> FactoryOutcome {
        let Some((_, rect)) = self.session.take() else {
            return FactoryOutcome::Pending;
        };
        if rect.width <= DEGENERATE_THRESHOLD || rect.height <= DEGENERATE_THRESHOLD {
            log::debug!("Discarding {}x{} rectangle", rect.width, rect.height);
            return FactoryOutcome::Discarded;
        }
        FactoryOutcome::Created(Shape::Rectangle(rect))
    }

    pub fn preview(&self) -> Option<Shape> {
        self.session
            .as_ref()
            .map(|(_, rect)| Shape::Rectangle(rect.clone()))
    }
}

/// Drag-to-create session for lines.
#[derive(Debug, Clone, Default)]
pub struct CreateLine {
    session: Option<Line>,
}

impl CreateLine {
    pub fn begin(&mut self, point: Point, style: &ShapeStyle, zoom_percent: f64) {
        let mut line = Line::new(point, point);
        apply_session_style(&mut line, style, zoom_percent);
        self.session = Some(line);
    }

    pub fn update(&mut self, point: Point, _modifiers: Modifiers) {
        if let Some(line) = &mut self.session {
            line.end = point;
        }
    }

    pub fn end(&mut self) -> FactoryOutcome {
        let Some(line) = self.session.take() else {
            return FactoryOutcome::Pending;
        };
        if too_small(line.start, line.end) {
            log::debug!("Discarding zero-length line");
            return FactoryOutcome::Discarded;
        }
        FactoryOutcome::Created(Shape::Line(line))
    }

    pub fn preview(&self) -> Option<Shape> {
        self.session.clone().map(Shape::Line)
    }
}

/// Drag-to-create session for arrows.
#[derive(Debug, Clone, Default)]
pub struct CreateArrow {
    lines: CreateLine,
}

impl CreateArrow {
    pub fn begin(&mut self, point: Point, style: &ShapeStyle, zoom_percent: f64) {
        self.lines.begin(point, style, zoom_percent);
    }

    pub fn update(&mut self, point: Point, modifiers: Modifiers) {
        self.lines.update(point, modifiers);
    }

    pub fn end(&mut self) -> FactoryOutcome {
        match self.lines.end() {
            FactoryOutcome::Created(Shape::Line(line)) => {
                FactoryOutcome::Created(Shape::Arrow(Arrow { line }))
            }
            other => other,
        }
    }

    pub fn preview(&self) -> Option<Shape> {
        self.lines
            .session
            .clone()
            .map(|line| Shape::Arrow(Arrow { line }))
    }
}

/// Drag-to-create session for ellipses.
///
/// The press point is the `Start` handle; dragging moves the `End` handle.
#[derive(Debug, Clone, Default)]
pub struct CreateEllipse {
    session: Option<(Point, Point, Ellipse)>,
}

impl CreateEllipse {
    pub fn begin(&mut self, point: Point, style: &ShapeStyle, zoom_percent: f64) {
        let mut ellipse = Ellipse::new(point.x, point.y, 0.0, 0.0, 0.0);
        apply_session_style(&mut ellipse, style, zoom_percent);
        self.session = Some((point, point, ellipse));
    }

    pub fn update(&mut self, point: Point, modifiers: Modifiers) {
        if let Some((_, current, ellipse)) = &mut self.session {
            *current = point;
            ellipse.drag_creation_end(point, modifiers);
        }
    }

    pub fn end(&mut self) -> FactoryOutcome {
        let Some((start, current, mut ellipse)) = self.session.take() else {
            return FactoryOutcome::Pending;
        };
        if too_small(start, current) {
            log::debug!("Discarding zero-size ellipse");
            return FactoryOutcome::Discarded;
        }
        ellipse.finish_creation();
        FactoryOutcome::Created(Shape::Ellipse(ellipse))
    }

    pub fn preview(&self) -> Option<Shape> {
        self.session
            .as_ref()
            .map(|(_, _, ellipse)| Shape::Ellipse(ellipse.clone()))
    }
}

/// Multi-click session for polygons.
///
/// The first click seeds the first vertex plus an in-progress vertex that
/// follows the pointer. Every further click commits the in-progress vertex
/// where it was clicked and starts a new one. Clicking near the first vertex,
/// or calling [`CreatePolygon::close`], finishes the outline.
#[derive(Debug, Clone, Default)]
pub struct CreatePolygon {
    session: Option<Polygon>,
    closing: bool,
}

impl CreatePolygon {
    pub fn begin(&mut self, point: Point, style: &ShapeStyle, zoom_percent: f64) {
        match &mut self.session {
            None => {
                let mut polygon = Polygon::new(vec![point, point]);
                apply_session_style(&mut polygon, style, zoom_percent);
                self.session = Some(polygon);
                self.closing = false;
            }
            Some(polygon) => {
                let near_first = polygon
                    .points
                    .first()
                    .is_some_and(|first| first.distance(point) <= POLYGON_CLOSE_DISTANCE);
                if near_first {
                    self.closing = true;
                } else {
                    polygon.move_last_point(point);
                    polygon.push_point(point);
                }
            }
        }
    }

    pub fn update(&mut self, point: Point, _modifiers: Modifiers) {
        if self.closing {
            return;
        }
        if let Some(polygon) = &mut self.session {
            polygon.move_last_point(point);
        }
    }

    /// End of one click. Only finishes the polygon when it was closed.
    pub fn end(&mut self) -> FactoryOutcome {
        if self.closing {
            self.close()
        } else {
            FactoryOutcome::Pending
        }
    }

    /// Finish the outline, dropping the in-progress vertex.
    pub fn close(&mut self) -> FactoryOutcome {
        self.closing = false;
        let Some(mut polygon) = self.session.take() else {
            return FactoryOutcome::Pending;
        };
        polygon.pop_point();
        if polygon.distinct_point_count() < 3 {
            log::debug!(
                "Discarding polygon with {} distinct vertices",
                polygon.distinct_point_count()
            );
            return FactoryOutcome::Discarded;
        }
        FactoryOutcome::Created(Shape::Polygon(polygon))
    }

    pub fn preview(&self) -> Option<Shape> {
        self.session.clone().map(Shape::Polygon)
    }
}

/// The active creation session of a creation tool mode.
#[derive(Debug, Clone)]
pub enum ShapeFactory {
    Rect(CreateRect),
    Line(CreateLine),
    Arrow(CreateArrow),
    Ellipse(CreateEllipse),
    Polygon(CreatePolygon),
}

macro_rules! dispatch {
    ($self:expr, $f:ident => $body:expr) => {
        match $self {
            ShapeFactory::Rect($f) => $body,
            ShapeFactory::Line($f) => $body,
            ShapeFactory::Arrow($f) => $body,
            ShapeFactory::Ellipse($f) => $body,
            ShapeFactory::Polygon($f) => $body,
        }
    };
}

impl ShapeFactory {
    /// Factory for a creation mode; `None` for `Select`.
    pub fn for_mode(mode: ToolMode) -> Option<Self> {
        match mode {
            ToolMode::Select => None,
            ToolMode::Rect => Some(ShapeFactory::Rect(CreateRect::default())),
            ToolMode::Line => Some(ShapeFactory::Line(CreateLine::default())),
            ToolMode::Arrow => Some(ShapeFactory::Arrow(CreateArrow::default())),
            ToolMode::Ellipse => Some(ShapeFactory::Ellipse(CreateEllipse::default())),
            ToolMode::Polygon => Some(ShapeFactory::Polygon(CreatePolygon::default())),
        }
    }

    pub fn begin(&mut self, point: Point, style: &ShapeStyle, zoom_percent: f64) {
        dispatch!(self, f => f.begin(point, style, zoom_percent))
    }

    pub fn update(&mut self, point: Point, modifiers: Modifiers) {
        dispatch!(self, f => f.update(point, modifiers))
    }

    pub fn end(&mut self) -> FactoryOutcome {
        dispatch!(self, f => f.end())
    }

    /// Finish a multi-click shape. Drag-created shapes just end.
    pub fn close(&mut self) -> FactoryOutcome {
        match self {
            ShapeFactory::Polygon(f) => f.close(),
            other => other.end(),
        }
    }

    /// The in-progress shape, for drawing feedback.
    pub fn preview(&self) -> Option<Shape> {
        dispatch!(self, f => f.preview())
    }

    /// Drop any in-progress shape.
    pub fn cancel(&mut self) {
        match self {
            ShapeFactory::Rect(f) => f.session = None,
            ShapeFactory::Line(f) => f.session = None,
            ShapeFactory::Arrow(f) => f.lines.session = None,
            ShapeFactory::Ellipse(f) => f.session = None,
            ShapeFactory::Polygon(f) => {
                f.session = None;
                f.closing = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> ShapeStyle {
        ShapeStyle::new("#00FF00", 3.0)
    }

    fn drag(factory: &mut ShapeFactory, from: Point, to: Point) -> FactoryOutcome {
        factory.begin(from, &style(), 100.0);
        factory.update(to, Modifiers::NONE);
        factory.end()
    }

    #[test]
    fn test_tool_mode_names() {
        for mode in ToolMode::ALL {
            assert_eq!(mode.as_str().parse::<ToolMode>().unwrap(), mode);
            assert_eq!(mode.to_string(), mode.as_str());
        }
        assert!(matches!(
            "CIRCLE".parse::<ToolMode>(),
            Err(ManagerError::InvalidState(name)) if name == "CIRCLE"
        ));
        assert!("select".parse::<ToolMode>().is_err());
        assert!(!ToolMode::Select.is_creation());
        assert!(ToolMode::Polygon.is_creation());
        assert!(ShapeFactory::for_mode(ToolMode::Select).is_none());
    }

    #[test]
    fn test_create_rect() {
        let mut factory = ShapeFactory::for_mode(ToolMode::Rect).unwrap();
        let outcome = drag(&mut factory, Point::new(100.0, 250.0), Point::new(425.0, 500.0));
        let FactoryOutcome::Created(Shape::Rectangle(rect)) = outcome else {
            panic!("expected a rectangle");
        };
        assert!((rect.x - 100.0).abs() < f64::EPSILON);
        assert!((rect.y - 250.0).abs() < f64::EPSILON);
        assert!((rect.width - 325.0).abs() < f64::EPSILON);
        assert!((rect.height - 250.0).abs() < f64::EPSILON);
        assert_eq!(rect.style, style());
        assert!(factory.preview().is_none());
    }

    #[test]
    fn test_degenerate_rect_is_discarded() {
        let mut factory = ShapeFactory::for_mode(ToolMode::Rect).unwrap();
        assert_eq!(
            drag(&mut factory, Point::new(50.0, 50.0), Point::new(52.0, 52.0)),
            FactoryOutcome::Discarded
        );
        // Thin but long
        assert_eq!(
            drag(&mut factory, Point::new(50.0, 50.0), Point::new(150.0, 51.0)),
            FactoryOutcome::Discarded
        );
    }

    #[test]
    fn test_rect_shift_makes_square() {
        let mut factory = CreateRect::default();
        factory.begin(Point::new(10.0, 10.0), &style(), 100.0);
        factory.update(Point::new(-40.0, 30.0), Modifiers::SHIFT);
        let FactoryOutcome::Created(Shape::Rectangle(rect)) = factory.end() else {
            panic!("expected a rectangle");
        };
        assert!((rect.width - 50.0).abs() < f64::EPSILON);
        assert!((rect.height - 50.0).abs() < f64::EPSILON);
        assert!((rect.x + 40.0).abs() < f64::EPSILON);
        assert!((rect.y - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_create_line_and_arrow() {
        let mut factory = ShapeFactory::for_mode(ToolMode::Line).unwrap();
        assert!(matches!(
            drag(&mut factory, Point::new(0.0, 0.0), Point::new(0.0, 3.0)),
            FactoryOutcome::Created(Shape::Line(_))
        ));
        assert_eq!(
            drag(&mut factory, Point::new(0.0, 0.0), Point::new(2.0, -2.0)),
            FactoryOutcome::Discarded
        );

        let mut factory = ShapeFactory::for_mode(ToolMode::Arrow).unwrap();
        let FactoryOutcome::Created(Shape::Arrow(arrow)) =
            drag(&mut factory, Point::new(0.0, 0.0), Point::new(40.0, 30.0))
        else {
            panic!("expected an arrow");
        };
        assert_eq!(arrow.end(), Point::new(40.0, 30.0));
        assert_eq!(arrow.style(), &style());
    }

    #[test]
    fn test_create_ellipse() {
        let mut factory = ShapeFactory::for_mode(ToolMode::Ellipse).unwrap();
        factory.begin(Point::new(100.0, 150.0), &style(), 100.0);
        factory.update(Point::new(300.0, 150.0), Modifiers::NONE);
        let Some(Shape::Ellipse(preview)) = factory.preview() else {
            panic!("expected an ellipse preview");
        };
        assert!((preview.cx - 200.0).abs() < 1e-9);
        assert!((preview.rx - 100.0).abs() < 1e-9);
        assert!((preview.ry - 50.0).abs() < 1e-9);
        assert!(matches!(factory.end(), FactoryOutcome::Created(Shape::Ellipse(_))));

        assert_eq!(
            drag(&mut factory, Point::new(10.0, 10.0), Point::new(11.0, 12.0)),
            FactoryOutcome::Discarded
        );
    }

    #[test]
    fn test_ellipse_shift_only_while_held() {
        let mut factory = ShapeFactory::for_mode(ToolMode::Ellipse).unwrap();
        factory.begin(Point::new(0.0, 0.0), &style(), 100.0);
        factory.update(Point::new(100.0, 0.0), Modifiers::SHIFT);
        factory.update(Point::new(200.0, 0.0), Modifiers::NONE);
        let FactoryOutcome::Created(Shape::Ellipse(ellipse)) = factory.end() else {
            panic!("expected an ellipse");
        };
        assert!((ellipse.rx - 100.0).abs() < 1e-9);
        assert!((ellipse.ry - 50.0).abs() < 1e-9);
        assert!((ellipse.yx_ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_create_polygon_by_clicks() {
        let mut factory = ShapeFactory::for_mode(ToolMode::Polygon).unwrap();
        let clicks = [
            Point::new(10.0, 10.0),
            Point::new(60.0, 10.0),
            Point::new(35.0, 50.0),
        ];
        for click in clicks {
            factory.begin(click, &style(), 100.0);
            assert_eq!(factory.end(), FactoryOutcome::Pending);
        }
        // Click back on the first vertex
        factory.begin(Point::new(11.0, 11.0), &style(), 100.0);
        let FactoryOutcome::Created(Shape::Polygon(polygon)) = factory.end() else {
            panic!("expected a polygon");
        };
        assert_eq!(polygon.points, clicks.to_vec());
    }

    #[test]
    fn test_polygon_drag_moves_in_progress_vertex() {
        let mut factory = CreatePolygon::default();
        factory.begin(Point::new(0.0, 0.0), &style(), 100.0);
        factory.update(Point::new(30.0, 0.0), Modifiers::NONE);
        assert_eq!(factory.end(), FactoryOutcome::Pending);
        let Some(Shape::Polygon(preview)) = factory.preview() else {
            panic!("expected a polygon preview");
        };
        assert_eq!(preview.points, vec![Point::new(0.0, 0.0), Point::new(30.0, 0.0)]);

        factory.begin(Point::new(30.0, 0.0), &style(), 100.0);
        factory.begin(Point::new(30.0, 40.0), &style(), 100.0);
        let FactoryOutcome::Created(Shape::Polygon(polygon)) = factory.close() else {
            panic!("expected a polygon");
        };
        assert_eq!(polygon.points.len(), 3);
    }

    #[test]
    fn test_polygon_with_too_few_vertices_is_discarded() {
        let mut factory = ShapeFactory::for_mode(ToolMode::Polygon).unwrap();
        factory.begin(Point::new(0.0, 0.0), &style(), 100.0);
        factory.end();
        factory.begin(Point::new(50.0, 0.0), &style(), 100.0);
        factory.end();
        assert_eq!(factory.close(), FactoryOutcome::Discarded);
        assert!(factory.preview().is_none());
    }

    #[test]
    fn test_cancel_drops_session() {
        let mut factory = ShapeFactory::for_mode(ToolMode::Ellipse).unwrap();
        factory.begin(Point::new(0.0, 0.0), &style(), 100.0);
        assert!(factory.preview().is_some());
        factory.cancel();
        assert!(factory.preview().is_none());
        assert_eq!(factory.end(), FactoryOutcome::Pending);
    }
}
