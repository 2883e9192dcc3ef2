//! Manager-level errors.

use crate::shapes::ShapeError;
use thiserror::Error;

/// Errors surfaced by [`crate::ShapeManager`] entry points.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Invalid state '{0}', expected one of SELECT, RECT, LINE, ARROW, ELLIPSE, POLYGON")]
    InvalidState(String),
    #[error("Invalid shape: {0}")]
    Shape(#[from] ShapeError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;
