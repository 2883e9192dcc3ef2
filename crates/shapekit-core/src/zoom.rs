//! Zoom transform between model space and device space.

use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};

/// Zoom percentage that maps model space 1:1 onto the device.
pub const BASE_ZOOM_PERCENT: f64 = 100.0;

/// Zoom manages the scale between model coordinates and device pixels.
///
/// Model coordinates are what shapes store and serialize. Device
/// coordinates are `model * percent / 100` and are only ever derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zoom {
    /// Current zoom level in percent (100 = 1:1).
    pub percent: f64,
}

impl Default for Zoom {
    fn default() -> Self {
        Self {
            percent: BASE_ZOOM_PERCENT,
        }
    }
}

impl Zoom {
    /// Create a zoom at the given percentage.
    ///
    /// Non-positive or non-finite values fall back to 100%.
    pub fn new(percent: f64) -> Self {
        if percent.is_finite() && percent > 0.0 {
            Self { percent }
        } else {
            log::warn!("Ignoring invalid zoom {percent}%, using {BASE_ZOOM_PERCENT}%");
            Self::default()
        }
    }

    /// Scale factor applied to model coordinates.
    pub fn fraction(&self) -> f64 {
        self.percent / 100.0
    }

    /// Get the affine transform from model to device coordinates.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.fraction())
    }

    /// Convert a device point (pointer position) to model coordinates.
    pub fn device_to_model(&self, device_point: Point) -> Point {
        Point::new(
            crate::geometry::to_model_coords(device_point.x, self.percent),
            crate::geometry::to_model_coords(device_point.y, self.percent),
        )
    }

    /// Convert a model point to device coordinates.
    pub fn model_to_device(&self, model_point: Point) -> Point {
        Point::new(
            crate::geometry::to_device_coords(model_point.x, self.percent),
            crate::geometry::to_device_coords(model_point.y, self.percent),
        )
    }
}
