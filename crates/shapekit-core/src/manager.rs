//! The shape manager: owns the shapes, the tool mode and the selection, and
//! routes pointer drags to creation, manipulation or region selection.

use crate::config::ManagerConfig;
use crate::error::{ManagerError, ManagerResult};
use crate::events::{EventQueue, ShapeEvent};
use crate::geometry::Region;
use crate::handles::{HANDLE_HIT_TOLERANCE, HandleKind, hit_test_handles};
use crate::input::{DragEvent, DragTracker, Modifiers};
use crate::selection::{ManipulationState, MultiMoveState, RubberBand, SelectDrag};
use crate::shapes::{
    Shape, ShapeId, ShapeJson, ShapeStyle, is_valid_stroke_width, random_shape_id,
};
use crate::tools::{FactoryOutcome, ShapeFactory, ToolMode};
use crate::zoom::Zoom;
use kurbo::Point;
use std::collections::HashSet;

/// Where the full-surface input capture layer sits relative to the shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureLayer {
    /// Above all shapes: drags always reach the active factory.
    Raised,
    /// Below the shapes: drags on a shape reach that shape.
    Lowered,
    /// Not shown at all (read-only surfaces).
    Hidden,
}

/// Owns the shape collection and all interaction state.
#[derive(Debug)]
pub struct ShapeManager {
    config: ManagerConfig,
    /// Shapes in z-order, back to front.
    shapes: Vec<Shape>,
    mode: ToolMode,
    factory: Option<ShapeFactory>,
    zoom: Zoom,
    /// Style given to new shapes and to records without one.
    style: ShapeStyle,
    fixed_ratio: bool,
    read_only: bool,
    select_drag: SelectDrag,
    tracker: DragTracker,
    /// Shapes currently under the rubber band.
    live_hits: Vec<ShapeId>,
    events: EventQueue,
}

impl Default for ShapeManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl ShapeManager {
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            style: config.style(),
            zoom: Zoom::new(config.zoom),
            read_only: config.read_only,
            config,
            shapes: Vec::new(),
            mode: ToolMode::default(),
            factory: None,
            fixed_ratio: false,
            select_drag: SelectDrag::Idle,
            tracker: DragTracker::new(),
            live_hits: Vec::new(),
            events: EventQueue::default(),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // --- Tool mode -------------------------------------------------------

    /// Current tool mode.
    pub fn state(&self) -> ToolMode {
        self.mode
    }

    /// Switch tool mode by name (`"SELECT"`, `"RECT"`, ...).
    ///
    /// An unknown name is logged and rejected; the mode stays as it was.
    pub fn set_state(&mut self, name: &str) -> ManagerResult<()> {
        match name.parse::<ToolMode>() {
            Ok(mode) => {
                self.set_mode(mode);
                Ok(())
            }
            Err(err) => {
                log::warn!("Ignoring state change: {err}");
                Err(err)
            }
        }
    }

    /// Switch tool mode.
    ///
    /// Creation modes clear the selection and get a fresh factory; `Select`
    /// drops any creation in progress.
    pub fn set_mode(&mut self, mode: ToolMode) {
        self.select_drag = SelectDrag::Idle;
        self.live_hits.clear();
        self.mode = mode;
        self.factory = ShapeFactory::for_mode(mode);
        if mode.is_creation() {
            self.clear_selected();
        }
        log::debug!("Tool mode is now {mode}");
    }

    /// Position of the input capture layer for the current mode.
    pub fn capture_layer(&self) -> CaptureLayer {
        if self.mode.is_creation() {
            CaptureLayer::Raised
        } else if self.read_only {
            CaptureLayer::Hidden
        } else {
            CaptureLayer::Lowered
        }
    }

    /// The shape being drawn, if any.
    pub fn preview(&self) -> Option<Shape> {
        self.factory.as_ref().and_then(ShapeFactory::preview)
    }

    // --- Zoom and style ---------------------------------------------------

    /// Current zoom in percent.
    pub fn zoom(&self) -> f64 {
        self.zoom.percent
    }

    /// Change the zoom. Shapes rescale for display; the model is untouched.
    pub fn set_zoom(&mut self, percent: f64) {
        self.zoom = Zoom::new(percent);
        let percent = self.zoom.percent;
        for shape in &mut self.shapes {
            shape.set_zoom(percent);
        }
    }

    /// Set the default stroke color and apply it to the selected shapes.
    pub fn set_stroke_color(&mut self, color: &str) {
        self.style.stroke_color = color.to_string();
        let changed = self.update_selected(|shape| shape.set_stroke_color(color));
        self.notify_changed(changed);
    }

    /// Set the default stroke width and apply it to the selected shapes.
    ///
    /// Widths that are not positive numbers are logged and ignored.
    pub fn set_stroke_width(&mut self, width: f64) {
        if !is_valid_stroke_width(width) {
            log::warn!("Ignoring invalid stroke width {width}");
            return;
        }
        self.style.stroke_width = width;
        let changed = self.update_selected(|shape| shape.set_stroke_width(width));
        self.notify_changed(changed);
    }

    /// Stroke color to show in the UI.
    ///
    /// The selection's color if all selected shapes agree, `None` if they
    /// differ, the default when nothing is selected.
    pub fn stroke_color(&self) -> Option<String> {
        self.common_selected(|s| s.style().stroke_color.clone())
            .unwrap_or_else(|| Some(self.style.stroke_color.clone()))
    }

    /// Stroke width to show in the UI. Same rules as [`Self::stroke_color`].
    pub fn stroke_width(&self) -> Option<f64> {
        self.common_selected(|s| s.style().stroke_width)
            .unwrap_or(Some(self.style.stroke_width))
    }

    /// Style given to new shapes.
    pub fn default_style(&self) -> &ShapeStyle {
        &self.style
    }

    /// `None` when nothing is selected, otherwise the common value (or
    /// `Some(None)` if the selected shapes disagree).
    fn common_selected<T: PartialEq>(&self, value: impl Fn(&Shape) -> T) -> Option<Option<T>> {
        let mut selected = self.shapes.iter().filter(|s| s.is_selected());
        let first = value(selected.next()?);
        if selected.all(|s| value(s) == first) {
            Some(Some(first))
        } else {
            Some(None)
        }
    }

    pub fn set_fixed_ratio(&mut self, fixed_ratio: bool) {
        self.fixed_ratio = fixed_ratio;
        for shape in &mut self.shapes {
            if let Shape::Rectangle(rect) = shape {
                rect.fixed_ratio = fixed_ratio;
            }
        }
    }

    pub fn fixed_ratio(&self) -> bool {
        self.fixed_ratio
    }

    /// Toggle read-only mode. Any move or resize in progress is abandoned.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
        if read_only && !matches!(self.select_drag, SelectDrag::RubberBand(_)) {
            self.select_drag = SelectDrag::Idle;
        }
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    // --- Collection ---------------------------------------------------------

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id() == id)
    }

    /// A negative id not used by any shape in the collection.
    pub fn random_id(&self) -> ShapeId {
        self.fresh_id(&HashSet::new())
    }

    fn fresh_id(&self, also_taken: &HashSet<ShapeId>) -> ShapeId {
        loop {
            let id = random_shape_id();
            if !also_taken.contains(&id) && self.shape(id).is_none() {
                return id;
            }
        }
    }

    /// Add a shape, giving it a new id if its id is already taken.
    fn insert_shape(&mut self, mut shape: Shape) -> ShapeId {
        if self.shape(shape.id()).is_some() {
            let id = self.random_id();
            log::debug!("Shape id {} already in use, assigning {}", shape.id(), id);
            shape.set_id(id);
        }
        shape.set_zoom(self.zoom.percent);
        if let Shape::Rectangle(rect) = &mut shape {
            rect.fixed_ratio = self.fixed_ratio;
        }
        let id = shape.id();
        self.shapes.push(shape);
        id
    }

    fn build_shapes(&self, records: &[ShapeJson]) -> ManagerResult<Vec<Shape>> {
        records
            .iter()
            .map(|json| {
                Shape::from_json(json, &self.style, self.zoom.percent).map_err(ManagerError::from)
            })
            .collect()
    }

    /// Add one shape from a record. Returns its id.
    pub fn add_shape_json(&mut self, json: &ShapeJson) -> ManagerResult<ShapeId> {
        let shape = Shape::from_json(json, &self.style, self.zoom.percent)?;
        Ok(self.insert_shape(shape))
    }

    /// Add several shapes. Nothing is added if any record is invalid.
    pub fn add_shapes_json(&mut self, records: &[ShapeJson]) -> ManagerResult<Vec<ShapeId>> {
        let shapes = self.build_shapes(records)?;
        Ok(shapes.into_iter().map(|s| self.insert_shape(s)).collect())
    }

    /// Replace every shape. The collection is untouched if any record is
    /// invalid.
    pub fn set_shapes_json(&mut self, records: &[ShapeJson]) -> ManagerResult<Vec<ShapeId>> {
        let shapes = self.build_shapes(records)?;
        self.delete_all();
        Ok(shapes.into_iter().map(|s| self.insert_shape(s)).collect())
    }

    /// All shapes as records, back to front.
    pub fn shapes_json(&self) -> Vec<ShapeJson> {
        self.shapes.iter().map(Shape::to_json).collect()
    }

    pub fn selected_shapes_json(&self) -> Vec<ShapeJson> {
        self.shapes
            .iter()
            .filter(|s| s.is_selected())
            .map(Shape::to_json)
            .collect()
    }

    /// Replace all shapes from a JSON array string.
    pub fn load_json_str(&mut self, json: &str) -> ManagerResult<Vec<ShapeId>> {
        let records: Vec<ShapeJson> = serde_json::from_str(json)?;
        self.set_shapes_json(&records)
    }

    /// All shapes as a pretty-printed JSON array.
    pub fn to_json_string(&self) -> ManagerResult<String> {
        Ok(serde_json::to_string_pretty(&self.shapes_json())?)
    }

    /// Remove the shapes matching `remove`, returning their ids.
    fn remove_where(&mut self, remove: impl Fn(&Shape) -> bool) -> Vec<ShapeId> {
        let mut removed = Vec::new();
        let mut selection_changed = false;
        self.shapes.retain(|shape| {
            if remove(shape) {
                removed.push(shape.id());
                selection_changed |= shape.is_selected();
                false
            } else {
                true
            }
        });
        if !removed.is_empty() {
            // An in-progress drag may reference a removed shape
            self.select_drag = SelectDrag::Idle;
            self.live_hits.retain(|id| !removed.contains(id));
        }
        if selection_changed {
            self.events.push(ShapeEvent::SelectionChanged);
        }
        removed
    }

    pub fn delete_selected(&mut self) -> Vec<ShapeId> {
        self.remove_where(Shape::is_selected)
    }

    pub fn delete_all(&mut self) -> Vec<ShapeId> {
        self.remove_where(|_| true)
    }

    pub fn delete_shapes_by_ids(&mut self, ids: &[ShapeId]) -> Vec<ShapeId> {
        for id in ids {
            if self.shape(*id).is_none() {
                log::debug!("Cannot delete unknown shape {id}");
            }
        }
        self.remove_where(|s| ids.contains(&s.id()))
    }

    /// Model-space bounding box of a shape.
    pub fn shape_bounding_box(&self, id: ShapeId) -> Option<Region> {
        let bounds = self.shape(id).map(Shape::bounds);
        if bounds.is_none() {
            log::debug!("No bounding box for unknown shape {id}");
        }
        bounds.map(Region::from_rect)
    }

    // --- Selection ----------------------------------------------------------

    pub fn selected_ids(&self) -> Vec<ShapeId> {
        self.shapes
            .iter()
            .filter(|s| s.is_selected())
            .map(Shape::id)
            .collect()
    }

    /// Make exactly the shapes for which `selected` is true selected.
    fn apply_selection(&mut self, selected: impl Fn(&Shape) -> bool) {
        let mut changed = false;
        for shape in &mut self.shapes {
            let want = selected(shape);
            if shape.is_selected() != want {
                shape.set_selected(want);
                changed = true;
            }
        }
        if changed {
            self.events.push(ShapeEvent::SelectionChanged);
        }
    }

    pub fn select_all(&mut self) {
        self.apply_selection(|_| true);
    }

    pub fn clear_selected(&mut self) {
        self.apply_selection(|_| false);
    }

    /// Select exactly these shapes. Unknown ids are ignored.
    pub fn select_shapes_by_id(&mut self, ids: &[ShapeId]) {
        for id in ids {
            if self.shape(*id).is_none() {
                log::debug!("Cannot select unknown shape {id}");
            }
        }
        self.apply_selection(|s| ids.contains(&s.id()));
    }

    /// Run `f` on every selected shape and return their ids.
    fn update_selected(&mut self, mut f: impl FnMut(&mut Shape)) -> Vec<ShapeId> {
        self.shapes
            .iter_mut()
            .filter(|s| s.is_selected())
            .map(|shape| {
                f(shape);
                shape.id()
            })
            .collect()
    }

    fn notify_changed(&mut self, ids: Vec<ShapeId>) {
        if !ids.is_empty() {
            self.events.push(ShapeEvent::ShapesChanged(ids));
        }
    }

    /// Translate the selected shapes (model units). No-op when read-only.
    pub fn move_selected_shapes(&mut self, dx: f64, dy: f64) -> bool {
        if self.read_only {
            return false;
        }
        let moved = self.update_selected(|shape| shape.offset_shape(dx, dy));
        let any = !moved.is_empty();
        self.notify_changed(moved);
        any
    }

    /// Ids of the shapes a region query would select.
    pub fn shapes_in_region(&self, region: &Region) -> Vec<ShapeId> {
        self.shapes
            .iter()
            .filter(|s| s.intersect_region(region))
            .map(Shape::id)
            .collect()
    }

    /// Shapes under the rubber band being dragged, for live highlighting.
    pub fn rubber_band_hits(&self) -> &[ShapeId] {
        &self.live_hits
    }

    /// The rubber band being dragged, in model space.
    pub fn rubber_band_region(&self) -> Option<Region> {
        match &self.select_drag {
            SelectDrag::RubberBand(band) => Some(band.region()),
            _ => None,
        }
    }

    // --- Paste --------------------------------------------------------------

    /// Paste copies of `records`.
    ///
    /// Copies get new ids. A copy landing exactly on an existing or already
    /// pasted shape is shifted by the paste offset until it is unique. With
    /// `constrain_to_viewport`, copies entirely outside the surface are
    /// skipped and the call returns `Ok(false)`. The pasted shapes become the
    /// selection.
    pub fn paste_shapes_json(
        &mut self,
        records: &[ShapeJson],
        constrain_to_viewport: bool,
    ) -> ManagerResult<bool> {
        let (dx, dy) = self.config.paste_offset;
        let viewport = Region::new(0.0, 0.0, self.config.width, self.config.height);
        let mut occupied = self.shapes_json();
        let mut taken = HashSet::new();
        let mut pasted = Vec::new();
        let mut all_pasted = true;

        for record in records {
            // Compare final geometry, with any import transform already applied
            let mut candidate =
                Shape::from_json(record, &self.style, self.zoom.percent)?.to_json();
            candidate.set_id(None);

            // Each step moves past at most one occupied position
            let mut steps = 0;
            while occupied.iter().any(|o| o.compare_coords(&candidate)) {
                if (dx == 0.0 && dy == 0.0) || steps > occupied.len() {
                    break;
                }
                candidate.offset_coords(dx, dy)?;
                steps += 1;
            }

            let bounds = Region::from_rect(candidate.bounds()?);
            if constrain_to_viewport && !viewport.overlaps(&bounds) {
                log::info!(
                    "Not pasting {} outside the {}x{} viewport",
                    candidate.type_name(),
                    viewport.width,
                    viewport.height
                );
                all_pasted = false;
                continue;
            }

            let mut shape = Shape::from_json(&candidate, &self.style, self.zoom.percent)?;
            let id = self.fresh_id(&taken);
            shape.set_id(id);
            taken.insert(id);
            occupied.push(candidate);
            pasted.push(shape);
        }

        let ids: Vec<ShapeId> = pasted.into_iter().map(|s| self.insert_shape(s)).collect();
        self.apply_selection(|s| ids.contains(&s.id()));
        Ok(all_pasted)
    }

    // --- Pointer routing ----------------------------------------------------

    /// Handle hit tolerance in model units at the current zoom.
    fn model_tolerance(&self) -> f64 {
        HANDLE_HIT_TOLERANCE / self.zoom.fraction()
    }

    /// Topmost selected shape with a handle under `point`.
    fn handle_at(&self, point: Point) -> Option<(ShapeId, HandleKind)> {
        let tolerance = self.model_tolerance();
        self.shapes
            .iter()
            .rev()
            .filter(|s| s.is_selected())
            .find_map(|s| {
                hit_test_handles(&s.handles(), point, tolerance).map(|kind| (s.id(), kind))
            })
    }

    /// Topmost shape under `point`.
    pub fn shape_at(&self, point: Point) -> Option<ShapeId> {
        let tolerance = self.model_tolerance();
        self.shapes
            .iter()
            .rev()
            .find(|s| s.hit_test(point, tolerance))
            .map(Shape::id)
    }

    /// Feed one pointer-drag event (device coordinates).
    ///
    /// Returns the id of a shape created when the gesture ends, if any.
    pub fn handle_drag_event(&mut self, event: DragEvent) -> Option<ShapeId> {
        match event {
            DragEvent::Start { position, modifiers } => {
                self.start_drag(position, modifiers);
                None
            }
            DragEvent::Drag { position, modifiers } => {
                self.drag(position, modifiers);
                None
            }
            DragEvent::Stop { modifiers } => self.stop_drag(modifiers),
        }
    }

    /// Whether a pointer gesture is in progress.
    pub fn is_dragging(&self) -> bool {
        self.tracker.is_dragging()
    }

    /// Pointer pressed at a device position.
    pub fn start_drag(&mut self, device_point: Point, modifiers: Modifiers) {
        self.tracker.begin(device_point);
        let point = self.zoom.device_to_model(device_point);
        if let Some(factory) = &mut self.factory {
            factory.begin(point, &self.style, self.zoom.percent);
            return;
        }

        let handle_hit = if self.read_only { None } else { self.handle_at(point) };
        let next = if let Some((id, kind)) = handle_hit {
            self.shape(id)
                .and_then(|shape| ManipulationState::new(shape, kind, point))
                .map_or(SelectDrag::Idle, SelectDrag::Handle)
        } else if let Some(id) = self.shape_at(point) {
            self.select_for_drag(id, modifiers);
            if self.read_only {
                SelectDrag::Idle
            } else {
                let selected = self.shapes.iter().filter(|s| s.is_selected());
                SelectDrag::Move(MultiMoveState::new(point, selected))
            }
        } else {
            self.live_hits.clear();
            SelectDrag::RubberBand(RubberBand::new(point))
        };
        self.select_drag = next;
    }

    /// Select a clicked shape, keeping a multi-selection that contains it.
    fn select_for_drag(&mut self, id: ShapeId, modifiers: Modifiers) {
        let already_selected = self.shape(id).is_some_and(Shape::is_selected);
        if already_selected {
            return;
        }
        if modifiers.shift {
            let mut ids = self.selected_ids();
            ids.push(id);
            self.apply_selection(|s| ids.contains(&s.id()));
        } else {
            self.apply_selection(|s| s.id() == id);
        }
    }

    /// Pointer moved with the button held.
    pub fn drag(&mut self, device_point: Point, modifiers: Modifiers) {
        if !self.tracker.is_dragging() {
            return;
        }
        let point = self.zoom.device_to_model(device_point);
        if let Some(factory) = &mut self.factory {
            factory.update(point, modifiers);
            return;
        }

        let mut select_drag = std::mem::take(&mut self.select_drag);
        match &mut select_drag {
            SelectDrag::Idle => {}
            SelectDrag::Handle(state) => {
                state.current_point = point;
                if let Some(shape) = self.shape_mut(state.shape_id) {
                    state.apply(shape, modifiers);
                }
            }
            SelectDrag::Move(state) => {
                state.current_point = point;
                for shape in &mut self.shapes {
                    state.apply(shape);
                }
            }
            SelectDrag::RubberBand(band) => {
                band.current = point;
                self.live_hits = self.shapes_in_region(&band.region());
            }
        }
        self.select_drag = select_drag;
    }

    /// Pointer released.
    ///
    /// Returns the id of a shape created by this gesture, if any.
    pub fn stop_drag(&mut self, modifiers: Modifiers) -> Option<ShapeId> {
        if !self.tracker.is_dragging() {
            return None;
        }
        self.tracker.end();
        if let Some(factory) = &mut self.factory {
            let outcome = factory.end();
            return self.finish_creation(outcome);
        }

        match std::mem::take(&mut self.select_drag) {
            SelectDrag::Idle => {}
            SelectDrag::Handle(state) => {
                if state.delta() != kurbo::Vec2::ZERO {
                    self.notify_changed(vec![state.shape_id]);
                }
            }
            SelectDrag::Move(state) => {
                if state.delta() != kurbo::Vec2::ZERO {
                    let moved = self
                        .shapes
                        .iter()
                        .map(Shape::id)
                        .filter(|id| state.original_shapes.contains_key(id))
                        .collect();
                    self.notify_changed(moved);
                }
            }
            SelectDrag::RubberBand(band) => {
                let mut hits = self.shapes_in_region(&band.region());
                if modifiers.shift {
                    hits.extend(self.selected_ids());
                }
                self.apply_selection(|s| hits.contains(&s.id()));
                self.live_hits.clear();
            }
        }
        None
    }

    /// Finish a multi-click shape (polygon) without another click.
    pub fn close_shape(&mut self) -> Option<ShapeId> {
        let outcome = self.factory.as_mut()?.close();
        self.finish_creation(outcome)
    }

    /// Abandon the shape being drawn.
    pub fn cancel_creation(&mut self) {
        if let Some(factory) = &mut self.factory {
            factory.cancel();
        }
    }

    fn finish_creation(&mut self, outcome: FactoryOutcome) -> Option<ShapeId> {
        match outcome {
            FactoryOutcome::Created(shape) => {
                let id = self.insert_shape(shape);
                self.events.push(ShapeEvent::ShapeCreated(id));
                self.apply_selection(|s| s.id() == id);
                Some(id)
            }
            FactoryOutcome::Discarded | FactoryOutcome::Pending => None,
        }
    }

    // --- Events -------------------------------------------------------------

    /// Take all notifications queued since the last call.
    pub fn poll_events(&mut self) -> Vec<ShapeEvent> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> ShapeJson {
        serde_json::from_str(json).unwrap()
    }

    fn manager_with(records: &[&str]) -> (ShapeManager, Vec<ShapeId>) {
        let mut manager = ShapeManager::default();
        let records: Vec<ShapeJson> = records.iter().map(|r| record(r)).collect();
        let ids = manager.add_shapes_json(&records).unwrap();
        (manager, ids)
    }

    fn gesture(
        manager: &mut ShapeManager,
        from: Point,
        to: Point,
        modifiers: Modifiers,
    ) -> Option<ShapeId> {
        manager.start_drag(from, modifiers);
        manager.drag(to, modifiers);
        manager.stop_drag(modifiers)
    }

    const RECT: &str = r#"{"type":"Rectangle","x":100,"y":100,"width":100,"height":50}"#;
    const LINE: &str = r#"{"type":"Line","x1":300,"y1":300,"x2":400,"y2":350}"#;

    #[test]
    fn test_initial_state() {
        let manager = ShapeManager::default();
        assert_eq!(manager.state(), ToolMode::Select);
        assert!((manager.zoom() - 100.0).abs() < f64::EPSILON);
        assert_eq!(manager.stroke_color().as_deref(), Some("#FF0000"));
        assert_eq!(manager.stroke_width(), Some(2.0));
        assert_eq!(manager.capture_layer(), CaptureLayer::Lowered);
    }

    #[test]
    fn test_invalid_state_is_rejected() {
        let mut manager = ShapeManager::default();
        manager.set_state("ELLIPSE").unwrap();
        assert!(matches!(
            manager.set_state("HEXAGON"),
            Err(ManagerError::InvalidState(_))
        ));
        assert_eq!(manager.state(), ToolMode::Ellipse);
        assert_eq!(manager.capture_layer(), CaptureLayer::Raised);
    }

    #[test]
    fn test_creation_mode_clears_selection() {
        let (mut manager, _) = manager_with(&[RECT, LINE]);
        manager.select_all();
        manager.poll_events();
        manager.set_state("RECT").unwrap();
        assert!(manager.selected_ids().is_empty());
        assert_eq!(manager.poll_events(), vec![ShapeEvent::SelectionChanged]);
    }

    #[test]
    fn test_create_rectangle_at_zoom() {
        let mut manager = ShapeManager::default();
        manager.set_zoom(200.0);
        manager.set_state("RECT").unwrap();
        let id = gesture(
            &mut manager,
            Point::new(200.0, 500.0),
            Point::new(850.0, 1000.0),
            Modifiers::NONE,
        )
        .unwrap();

        let value = serde_json::to_value(manager.shape(id).unwrap().to_json()).unwrap();
        assert_eq!(value["type"], "Rectangle");
        assert_eq!(value["x"].as_f64(), Some(100.0));
        assert_eq!(value["y"].as_f64(), Some(250.0));
        assert_eq!(value["width"].as_f64(), Some(325.0));
        assert_eq!(value["height"].as_f64(), Some(250.0));
        assert_eq!(value["strokeColor"], "#FF0000");

        let events = manager.poll_events();
        assert!(events.contains(&ShapeEvent::ShapeCreated(id)));
        assert_eq!(manager.selected_ids(), vec![id]);
    }

    #[test]
    fn test_degenerate_rectangle_is_discarded() {
        let mut manager = ShapeManager::default();
        manager.set_state("RECT").unwrap();
        let created = gesture(
            &mut manager,
            Point::new(50.0, 50.0),
            Point::new(52.0, 52.0),
            Modifiers::NONE,
        );
        assert!(created.is_none());
        assert!(manager.shapes().is_empty());
        assert!(manager.poll_events().is_empty());
    }

    #[test]
    fn test_new_shapes_use_current_style() {
        let mut manager = ShapeManager::default();
        manager.set_stroke_color("#00FF00");
        manager.set_stroke_width(5.0);
        manager.set_state("ARROW").unwrap();
        let id = gesture(
            &mut manager,
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Modifiers::NONE,
        )
        .unwrap();
        let shape = manager.shape(id).unwrap();
        assert_eq!(shape.type_name(), "Arrow");
        assert_eq!(shape.style(), &ShapeStyle::new("#00FF00", 5.0));
    }

    #[test]
    fn test_polygon_through_manager() {
        let mut manager = ShapeManager::default();
        manager.set_state("POLYGON").unwrap();
        for (x, y) in [(10.0, 10.0), (60.0, 10.0), (35.0, 50.0)] {
            manager.start_drag(Point::new(x, y), Modifiers::NONE);
            assert!(manager.stop_drag(Modifiers::NONE).is_none());
        }
        assert!(manager.preview().is_some());
        let id = manager.close_shape().unwrap();
        let ShapeJson::Polygon(json) = manager.shape(id).unwrap().to_json() else {
            panic!("expected a polygon");
        };
        assert_eq!(json.points, "10,10 60,10 35,50");
    }

    #[test]
    fn test_click_selects_and_drag_moves() {
        let (mut manager, ids) = manager_with(&[RECT, LINE]);
        manager.set_zoom(50.0);
        // Rectangle spans device (50,50)-(100,75) at 50%
        gesture(
            &mut manager,
            Point::new(60.0, 60.0),
            Point::new(70.0, 65.0),
            Modifiers::NONE,
        );
        assert_eq!(manager.selected_ids(), vec![ids[0]]);
        let bounds = manager.shape_bounding_box(ids[0]).unwrap();
        // 10 device px at 50% = 20 model units
        assert!((bounds.x - 120.0).abs() < 1e-9);
        assert!((bounds.y - 110.0).abs() < 1e-9);

        let events = manager.poll_events();
        assert!(events.contains(&ShapeEvent::SelectionChanged));
        assert!(events.contains(&ShapeEvent::ShapesChanged(vec![ids[0]])));
    }

    #[test]
    fn test_group_move_keeps_multi_selection() {
        let (mut manager, ids) = manager_with(&[RECT, LINE]);
        manager.select_all();
        gesture(
            &mut manager,
            Point::new(150.0, 120.0),
            Point::new(160.0, 130.0),
            Modifiers::NONE,
        );
        assert_eq!(manager.selected_ids(), ids);
        let line = manager.shape_bounding_box(ids[1]).unwrap();
        assert!((line.x - 310.0).abs() < 1e-9);
        assert!((line.y - 310.0).abs() < 1e-9);
    }

    #[test]
    fn test_handle_drag_resizes() {
        let (mut manager, ids) = manager_with(&[RECT]);
        manager.select_shapes_by_id(&[ids[0]]);
        // Bottom-right handle at (200,150)
        gesture(
            &mut manager,
            Point::new(200.0, 150.0),
            Point::new(250.0, 170.0),
            Modifiers::NONE,
        );
        let bounds = manager.shape_bounding_box(ids[0]).unwrap();
        assert!((bounds.width - 150.0).abs() < 1e-9);
        assert!((bounds.height - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_ratio_flag() {
        let (mut manager, ids) = manager_with(&[RECT]);
        manager.set_fixed_ratio(true);
        manager.select_shapes_by_id(&[ids[0]]);
        gesture(
            &mut manager,
            Point::new(200.0, 150.0),
            Point::new(300.0, 160.0),
            Modifiers::NONE,
        );
        let bounds = manager.shape_bounding_box(ids[0]).unwrap();
        assert!((bounds.width - 200.0).abs() < 1e-9);
        assert!((bounds.height - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_read_only_blocks_moves() {
        let (mut manager, ids) = manager_with(&[RECT]);
        manager.set_read_only(true);
        assert_eq!(manager.capture_layer(), CaptureLayer::Hidden);
        gesture(
            &mut manager,
            Point::new(150.0, 120.0),
            Point::new(250.0, 220.0),
            Modifiers::NONE,
        );
        // Selected, but not moved
        assert_eq!(manager.selected_ids(), vec![ids[0]]);
        assert!((manager.shape_bounding_box(ids[0]).unwrap().x - 100.0).abs() < f64::EPSILON);
        assert!(!manager.move_selected_shapes(5.0, 5.0));
    }

    #[test]
    fn test_rubber_band_selection() {
        let (mut manager, ids) = manager_with(&[RECT, LINE]);
        manager.start_drag(Point::new(90.0, 90.0), Modifiers::NONE);
        manager.drag(Point::new(120.0, 120.0), Modifiers::NONE);
        assert_eq!(manager.rubber_band_hits(), &[ids[0]]);
        assert_eq!(
            manager.rubber_band_region(),
            Some(Region::new(90.0, 90.0, 30.0, 30.0))
        );
        // Drag back past the anchor: region is normalized
        manager.drag(Point::new(0.0, 0.0), Modifiers::NONE);
        assert!(manager.rubber_band_hits().is_empty());
        manager.drag(Point::new(500.0, 500.0), Modifiers::NONE);
        manager.stop_drag(Modifiers::NONE);
        assert_eq!(manager.selected_ids(), ids);
        assert!(manager.rubber_band_hits().is_empty());
        assert!(manager.rubber_band_region().is_none());
    }

    #[test]
    fn test_region_selection_properties() {
        let (manager, ids) = manager_with(&[
            RECT,
            LINE,
            r#"{"type":"Ellipse","cx":600,"cy":100,"rx":40,"ry":20}"#,
            r#"{"type":"Polygon","points":"500,400 560,400 530,450"}"#,
        ]);
        // Far away from everything
        assert!(manager.shapes_in_region(&Region::new(900.0, 900.0, 50.0, 50.0)).is_empty());
        // Each anchor inside a small region
        let anchors = [
            Region::new(95.0, 95.0, 10.0, 10.0),
            Region::new(345.0, 320.0, 10.0, 10.0),
            Region::new(595.0, 95.0, 10.0, 10.0),
            Region::new(525.0, 420.0, 10.0, 10.0),
        ];
        for (region, id) in anchors.iter().zip(&ids) {
            assert!(manager.shapes_in_region(region).contains(id));
        }
    }

    #[test]
    fn test_stroke_aggregation() {
        let (mut manager, ids) = manager_with(&[
            r##"{"type":"Line","x1":0,"y1":0,"x2":10,"y2":10,"strokeColor":"#00FF00","strokeWidth":3}"##,
            r##"{"type":"Line","x1":0,"y1":20,"x2":10,"y2":30,"strokeColor":"#0000FF","strokeWidth":3}"##,
        ]);
        manager.select_all();
        assert_eq!(manager.stroke_color(), None);
        assert_eq!(manager.stroke_width(), Some(3.0));

        manager.select_shapes_by_id(&[ids[1]]);
        assert_eq!(manager.stroke_color().as_deref(), Some("#0000FF"));

        manager.poll_events();
        manager.set_stroke_color("#123456");
        assert_eq!(manager.shape(ids[1]).unwrap().style().stroke_color, "#123456");
        assert_eq!(manager.shape(ids[0]).unwrap().style().stroke_color, "#00FF00");
        assert_eq!(manager.poll_events(), vec![ShapeEvent::ShapesChanged(vec![ids[1]])]);

        manager.clear_selected();
        assert_eq!(manager.stroke_color().as_deref(), Some("#123456"));
    }

    #[test]
    fn test_paste_offsets_until_unique() {
        let (mut manager, _) = manager_with(&[LINE]);
        let clipboard = manager.shapes_json();

        assert!(manager.paste_shapes_json(&clipboard, false).unwrap());
        assert!(manager.paste_shapes_json(&clipboard, false).unwrap());

        let lines = manager.shapes_json();
        assert_eq!(lines.len(), 3);
        let ShapeJson::Line(first) = &lines[1] else {
            panic!("expected a line");
        };
        assert!((first.x1 - 320.0).abs() < f64::EPSILON);
        assert!((first.y1 - 310.0).abs() < f64::EPSILON);
        let ShapeJson::Line(second) = &lines[2] else {
            panic!("expected a line");
        };
        assert!((second.x1 - 340.0).abs() < f64::EPSILON);
        assert!((second.y1 - 320.0).abs() < f64::EPSILON);

        // New ids, and the last paste is the selection
        let ids: HashSet<_> = lines.iter().filter_map(ShapeJson::id).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(manager.selected_ids(), vec![lines[2].id().unwrap()]);
    }

    #[test]
    fn test_invalid_stroke_width_is_ignored() {
        let (mut manager, ids) = manager_with(&[LINE]);
        manager.select_all();
        manager.poll_events();
        for width in [0.0, -2.0, f64::NAN] {
            manager.set_stroke_width(width);
        }
        assert_eq!(manager.stroke_width(), Some(2.0));
        assert!((manager.default_style().stroke_width - 2.0).abs() < f64::EPSILON);
        assert!(manager.poll_events().is_empty());
        manager.set_stroke_width(4.0);
        assert_eq!(manager.shape(ids[0]).unwrap().style().stroke_width, 4.0);
    }

    #[test]
    fn test_paste_compares_transformed_geometry() {
        let rotated = record(
            r#"{"type":"Ellipse","cx":100,"cy":0,"rx":50,"ry":20,"transform":"matrix(0,1,-1,0,0,0)"}"#,
        );
        let (mut manager, _) = manager_with(&[]);
        manager.add_shape_json(&rotated).unwrap();

        manager.paste_shapes_json(&[rotated.clone()], false).unwrap();
        manager.paste_shapes_json(&[rotated], false).unwrap();

        let centers: Vec<(f64, f64)> = manager
            .shapes_json()
            .iter()
            .map(|json| match json {
                ShapeJson::Ellipse(e) => (e.cx, e.cy),
                other => panic!("expected an ellipse, got {}", other.type_name()),
            })
            .collect();
        let expected = [(0.0, 100.0), (20.0, 110.0), (40.0, 120.0)];
        for ((cx, cy), (ex, ey)) in centers.iter().zip(expected) {
            assert!((cx - ex).abs() < 1e-9, "cx {cx} != {ex}");
            assert!((cy - ey).abs() < 1e-9, "cy {cy} != {ey}");
        }
        // Pasted copies carry their final geometry, not the import transform
        assert!(manager.shapes_json().iter().all(|json| match json {
            ShapeJson::Ellipse(e) => e.transform.is_none(),
            _ => false,
        }));
    }

    #[test]
    fn test_paste_ignores_shape_only_matching_before_transform() {
        let (mut manager, _) = manager_with(&[
            r#"{"type":"Ellipse","cx":100,"cy":0,"rx":50,"ry":20}"#,
        ]);
        let rotated = record(
            r#"{"type":"Ellipse","cx":100,"cy":0,"rx":50,"ry":20,"transform":"matrix(0,1,-1,0,0,0)"}"#,
        );
        manager.paste_shapes_json(&[rotated], false).unwrap();
        let ShapeJson::Ellipse(pasted) = &manager.shapes_json()[1] else {
            panic!("expected an ellipse");
        };
        assert!(pasted.cx.abs() < 1e-9);
        assert!((pasted.cy - 100.0).abs() < 1e-9);
        assert!((pasted.rotation - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_paste_outside_viewport() {
        let mut manager = ShapeManager::default();
        let outside = record(r#"{"type":"Rectangle","x":1000,"y":1000,"width":10,"height":10}"#);
        let inside = record(r#"{"type":"Rectangle","x":10,"y":10,"width":10,"height":10}"#);

        assert!(!manager.paste_shapes_json(&[outside.clone(), inside], true).unwrap());
        assert_eq!(manager.shapes().len(), 1);

        // Unconstrained paste accepts it
        assert!(manager.paste_shapes_json(&[outside], false).unwrap());
        assert_eq!(manager.shapes().len(), 2);
    }

    #[test]
    fn test_delete_operations() {
        let (mut manager, ids) = manager_with(&[RECT, LINE, RECT]);
        assert_eq!(ids.len(), 3);
        manager.select_shapes_by_id(&[ids[1]]);
        assert_eq!(manager.delete_selected(), vec![ids[1]]);
        assert_eq!(manager.delete_shapes_by_ids(&[ids[2], 12345]), vec![ids[2]]);
        assert_eq!(manager.delete_all(), vec![ids[0]]);
        assert!(manager.shapes().is_empty());
    }

    #[test]
    fn test_duplicate_ids_are_replaced() {
        let (mut manager, ids) = manager_with(&[
            r#"{"type":"Line","x1":0,"y1":0,"x2":10,"y2":10,"id":5}"#,
            r#"{"type":"Line","x1":0,"y1":20,"x2":10,"y2":30,"id":5}"#,
        ]);
        assert_eq!(ids[0], 5);
        assert_ne!(ids[1], 5);
        assert!(ids[1] < 0);
        assert!(manager.random_id() < 0);
        assert_eq!(manager.delete_all().len(), 2);
    }

    #[test]
    fn test_set_shapes_is_all_or_nothing() {
        let (mut manager, _) = manager_with(&[RECT]);
        let bad = vec![
            record(LINE),
            record(r#"{"type":"Polygon","points":"1,1 nope"}"#),
        ];
        assert!(matches!(
            manager.set_shapes_json(&bad),
            Err(ManagerError::Shape(_))
        ));
        assert_eq!(manager.shapes().len(), 1);
    }

    #[test]
    fn test_zoom_is_lossless() {
        let (mut manager, _) = manager_with(&[
            RECT,
            LINE,
            r#"{"type":"Ellipse","cx":600,"cy":100,"rx":40,"ry":20,"rotation":33}"#,
        ]);
        let before = manager.shapes_json();
        for zoom in [10.0, 37.5, 250.0, 1000.0] {
            manager.set_zoom(zoom);
            assert_eq!(manager.shapes_json(), before);
        }
        manager.set_zoom(100.0);
        assert_eq!(manager.shapes_json(), before);
    }

    #[test]
    fn test_json_string_roundtrip() {
        let (manager, _) = manager_with(&[RECT, LINE]);
        let json = manager.to_json_string().unwrap();
        let mut other = ShapeManager::default();
        other.load_json_str(&json).unwrap();
        assert_eq!(other.shapes_json(), manager.shapes_json());
        assert!(matches!(other.load_json_str("{"), Err(ManagerError::Json(_))));
    }

    #[test]
    fn test_drag_events() {
        let mut manager = ShapeManager::default();
        manager.set_state("LINE").unwrap();
        // Drags outside a gesture are ignored
        manager.handle_drag_event(DragEvent::Drag {
            position: Point::new(5.0, 5.0),
            modifiers: Modifiers::NONE,
        });
        assert!(manager.preview().is_none());

        manager.handle_drag_event(DragEvent::Start {
            position: Point::new(10.0, 10.0),
            modifiers: Modifiers::NONE,
        });
        assert!(manager.is_dragging());
        manager.handle_drag_event(DragEvent::Drag {
            position: Point::new(60.0, 10.0),
            modifiers: Modifiers::NONE,
        });
        let id = manager.handle_drag_event(DragEvent::Stop {
            modifiers: Modifiers::NONE,
        });
        assert!(!manager.is_dragging());
        let bounds = manager.shape_bounding_box(id.unwrap()).unwrap();
        assert!((bounds.width - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_selected_shapes_json() {
        let (mut manager, ids) = manager_with(&[RECT, LINE]);
        manager.select_shapes_by_id(&[ids[1]]);
        let selected = manager.selected_shapes_json();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].type_name(), "Line");
    }
}
