// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types shared by every subsystem of the editor.

use uuid::Uuid;

/// Errors surfaced by the editing core.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Invalid image data: {0}")]
    InvalidImageData(String),

    #[error("Invalid dimension: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    #[error("Placement ({x:.3}, {y:.3}) is outside the image content")]
    PlacementOutOfBounds { x: f64, y: f64 },

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Project not found: {0}")]
    NotFound(Uuid),

    #[error("Saved projects are unreadable: {0}")]
    PersistenceCorrupt(String),

    #[error("No project is open")]
    NoActiveProject,

    #[error("Missing input: {0}")]
    MissingInput(&'static str),

    #[error("Failed to fetch sample image: {0}")]
    SampleFetch(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl From<image::ImageError> for EditorError {
    fn from(err: image::ImageError) -> Self {
        EditorError::InvalidImageData(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;
