//! Shape manager configuration.

use crate::shapes::ShapeStyle;
use crate::zoom::BASE_ZOOM_PERCENT;
use serde::{Deserialize, Serialize};

/// Configuration for a [`crate::ShapeManager`].
///
/// Every field is optional in JSON; missing ones take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManagerConfig {
    /// Drawing surface width in model units.
    pub width: f64,
    /// Drawing surface height in model units.
    pub height: f64,
    /// Stroke color for new shapes and records without one.
    pub stroke_color: String,
    /// Stroke width (model units) for new shapes and records without one.
    pub stroke_width: f64,
    /// Initial zoom in percent.
    pub zoom: f64,
    /// Shapes can be selected but not edited.
    pub read_only: bool,
    /// Offset applied per step when a pasted shape lands on an existing one.
    pub paste_offset: (f64, f64),
}

impl Default for ManagerConfig {
    fn default() -> Self {
        let style = ShapeStyle::default();
        Self {
            width: 512.0,
            height: 512.0,
            stroke_color: style.stroke_color,
            stroke_width: style.stroke_width,
            zoom: BASE_ZOOM_PERCENT,
            read_only: false,
            paste_offset: (20.0, 10.0),
        }
    }
}

impl ManagerConfig {
    /// Default style for new shapes. An invalid stroke width falls back to
    /// the built-in default.
    pub fn style(&self) -> ShapeStyle {
        ShapeStyle::resolve(
            Some(&self.stroke_color),
            Some(self.stroke_width),
            &ShapeStyle::default(),
        )
    }
}
