//! shapekit Core Library
//!
//! Platform-agnostic shape geometry and interaction state for the shapekit
//! vector editor. Rendering and event delivery are left to the host: it
//! feeds pointer drags into a [`ShapeManager`] and draws the device-space
//! paths the shapes produce.

pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod handles;
pub mod input;
pub mod manager;
pub mod selection;
pub mod shapes;
pub mod tools;
pub mod zoom;

pub use config::ManagerConfig;
pub use error::{ManagerError, ManagerResult};
pub use events::{EventQueue, ShapeEvent};
pub use geometry::Region;
pub use handles::{HANDLE_HIT_TOLERANCE, HANDLE_SIZE, Handle, HandleKind};
pub use input::{DragEvent, DragTracker, Modifiers};
pub use manager::{CaptureLayer, ShapeManager};
pub use selection::{ManipulationState, MultiMoveState, RubberBand, SelectDrag};
pub use shapes::{Shape, ShapeError, ShapeId, ShapeJson, ShapeStyle, ShapeTrait};
pub use tools::{FactoryOutcome, ShapeFactory, ToolMode};
pub use zoom::Zoom;
