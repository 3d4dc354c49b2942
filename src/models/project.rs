// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project state management.
//!
//! A project is one redesign effort anchored to the scene image the user
//! started from. The original image and its dimensions never change after
//! creation; generated versions accumulate in the project's history.

use super::history::History;
use super::image::{Dimensions, ImageData};
use crate::error::Result;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One redesign project.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    thumbnail: String,
    original_image: ImageData,
    original_dimensions: Dimensions,
    history: History,
}

impl Project {
    /// Create a project from a freshly supplied scene image.
    ///
    /// The original dimensions are read from the image itself.
    pub fn new(
        name: String,
        scene: ImageData,
        thumbnail: String,
        max_history: Option<usize>,
    ) -> Result<Self> {
        let original_dimensions = scene.dimensions()?;
        // Millisecond precision so the timestamp survives the store unchanged
        let created_at = DateTime::from_timestamp_millis(Utc::now().timestamp_millis())
            .unwrap_or_else(Utc::now);

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            created_at,
            thumbnail,
            original_image: scene,
            original_dimensions,
            history: History::new(max_history),
        })
    }

    /// Rebuild a project from stored parts.
    pub fn restore(
        id: Uuid,
        name: String,
        created_at: DateTime<Utc>,
        thumbnail: String,
        original_image: ImageData,
        original_dimensions: Dimensions,
        history: History,
    ) -> Self {
        Self {
            id,
            name,
            created_at,
            thumbnail,
            original_image,
            original_dimensions,
            history,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: String) {
        self.name = name;
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn thumbnail(&self) -> &str {
        &self.thumbnail
    }

    pub fn original_image(&self) -> &ImageData {
        &self.original_image
    }

    pub fn original_dimensions(&self) -> Dimensions {
        self.original_dimensions
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    /// The version currently on display.
    pub fn current_image(&self) -> &ImageData {
        self.history.current(&self.original_image)
    }

    /// Whether the displayed version is a generated one.
    pub fn is_iterative_edit(&self) -> bool {
        self.history.cursor().is_some()
    }
}
