//! Scripted editing sessions.
//!
//! A script is a JSON array of steps, each tagged by `op`:
//!
//! ```json
//! [
//!   {"op": "setState", "state": "RECT"},
//!   {"op": "start", "x": 10, "y": 10},
//!   {"op": "drag", "x": 110, "y": 60, "modifiers": {"shift": true}},
//!   {"op": "stop"}
//! ]
//! ```
//!
//! Pointer positions are device coordinates, as a host would deliver them.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use shapekit_core::{DragEvent, ManagerResult, Modifiers, ShapeEvent, ShapeJson, ShapeManager};

/// One step of a script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
    SetState {
        state: String,
    },
    SetZoom {
        zoom: f64,
    },
    SetStrokeColor {
        color: String,
    },
    SetStrokeWidth {
        width: f64,
    },
    SetFixedRatio {
        enabled: bool,
    },
    SetReadOnly {
        enabled: bool,
    },
    Start {
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Drag {
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Stop {
        #[serde(default)]
        modifiers: Modifiers,
    },
    /// Finish a polygon being drawn.
    CloseShape,
    SelectAll,
    ClearSelection,
    DeleteSelected,
}

impl Step {
    /// The pointer event this step stands for, if any.
    fn drag_event(&self) -> Option<DragEvent> {
        match *self {
            Step::Start { x, y, modifiers } => Some(DragEvent::Start {
                position: Point::new(x, y),
                modifiers,
            }),
            Step::Drag { x, y, modifiers } => Some(DragEvent::Drag {
                position: Point::new(x, y),
                modifiers,
            }),
            Step::Stop { modifiers } => Some(DragEvent::Stop { modifiers }),
            _ => None,
        }
    }
}

/// Final state of a replayed session.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub shapes: Vec<ShapeJson>,
    pub events: Vec<ShapeEvent>,
}

/// Parse a script from its JSON text.
pub fn parse_script(json: &str) -> serde_json::Result<Vec<Step>> {
    serde_json::from_str(json)
}

/// Apply one step to the manager.
pub fn run_step(manager: &mut ShapeManager, step: &Step) -> ManagerResult<()> {
    if let Some(event) = step.drag_event() {
        manager.handle_drag_event(event);
        return Ok(());
    }
    match step {
        Step::SetState { state } => manager.set_state(state)?,
        Step::SetZoom { zoom } => manager.set_zoom(*zoom),
        Step::SetStrokeColor { color } => manager.set_stroke_color(color),
        Step::SetStrokeWidth { width } => manager.set_stroke_width(*width),
        Step::SetFixedRatio { enabled } => manager.set_fixed_ratio(*enabled),
        Step::SetReadOnly { enabled } => manager.set_read_only(*enabled),
        Step::CloseShape => {
            manager.close_shape();
        }
        Step::SelectAll => manager.select_all(),
        Step::ClearSelection => manager.clear_selected(),
        Step::DeleteSelected => {
            manager.delete_selected();
        }
        Step::Start { .. } | Step::Drag { .. } | Step::Stop { .. } => {}
    }
    Ok(())
}

/// Run every step in order and collect the resulting shapes and events.
///
/// Stops at the first failing step.
pub fn replay(manager: &mut ShapeManager, steps: &[Step]) -> ManagerResult<ReplayReport> {
    let mut events = Vec::new();
    for (index, step) in steps.iter().enumerate() {
        log::debug!("Step {index}: {step:?}");
        run_step(manager, step)?;
        events.extend(manager.poll_events());
    }
    Ok(ReplayReport {
        shapes: manager.shapes_json(),
        events,
    })
}
