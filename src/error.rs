//! Error taxonomy for island generation.

use thiserror::Error;

/// Everything that can go wrong while configuring or generating an island.
///
/// Generation itself is a pure pipeline, so most variants are precondition
/// failures surfaced before any chunk is built.
#[derive(Debug, Error)]
pub enum TerrainError {
    /// A configuration value is out of its accepted range.
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// Density grid extent does not match the declared chunk dimensions.
    #[error(
        "density grid is {actual_x}x{actual_y}x{actual_z} but chunk size {chunk_size} / height {chunk_height} needs {expected_xz}x{expected_y}x{expected_xz}"
    )]
    GridMismatch {
        actual_x: usize,
        actual_y: usize,
        actual_z: usize,
        chunk_size: u32,
        chunk_height: u32,
        expected_xz: usize,
        expected_y: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl TerrainError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        TerrainError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TerrainError>;
