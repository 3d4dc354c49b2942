// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Generation history with a movable cursor.
//!
//! A project's generated versions form a single linear list. The cursor
//! selects the version on display; `None` means the original image is
//! shown. Appending after an undo discards the versions beyond the cursor,
//! so there is never more than one redo branch.

use super::image::ImageData;

/// Linear undo/redo history of generated images.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    /// Generated versions, oldest first
    generations: Vec<ImageData>,
    /// Index of the displayed version, `None` for the original
    cursor: Option<usize>,
    /// Maximum number of versions kept, unbounded when `None`
    max_size: Option<usize>,
}

impl History {
    pub fn new(max_size: Option<usize>) -> Self {
        Self {
            generations: Vec::new(),
            cursor: None,
            max_size,
        }
    }

    /// Rebuild a history from stored versions, positioned at the latest one.
    pub fn from_generations(generations: Vec<ImageData>, max_size: Option<usize>) -> Self {
        let mut history = Self {
            generations,
            cursor: None,
            max_size,
        };
        history.enforce_limit();
        history.seek_latest();
        history
    }

    /// Record a new version after the cursor, dropping any redo branch.
    pub fn append(&mut self, version: ImageData) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.generations.truncate(keep);
        self.generations.push(version);
        self.enforce_limit();
        self.cursor = Some(self.generations.len() - 1);
    }

    /// Step back one version. Returns false when already at the original.
    pub fn undo(&mut self) -> bool {
        match self.cursor {
            Some(0) => {
                self.cursor = None;
                true
            }
            Some(c) => {
                self.cursor = Some(c - 1);
                true
            }
            None => false,
        }
    }

    /// Step forward one version. Returns false at the newest version.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor = Some(self.cursor.map_or(0, |c| c + 1));
        true
    }

    /// Drop every generated version and show the original again.
    pub fn revert_to_original(&mut self) {
        self.generations.clear();
        self.cursor = None;
    }

    /// Move the cursor to the newest version (or the original if empty).
    pub fn seek_latest(&mut self) {
        self.cursor = self.generations.len().checked_sub(1);
    }

    /// The displayed version, falling back to `original` at the start.
    pub fn current<'a>(&'a self, original: &'a ImageData) -> &'a ImageData {
        self.cursor
            .and_then(|c| self.generations.get(c))
            .unwrap_or(original)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        let next = self.cursor.map_or(0, |c| c + 1);
        next < self.generations.len()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn generations(&self) -> &[ImageData] {
        &self.generations
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    fn enforce_limit(&mut self) {
        if let Some(max) = self.max_size {
            let max = max.max(1);
            if self.generations.len() > max {
                let excess = self.generations.len() - max;
                self.generations.drain(..excess);
                log::debug!("History limit reached, dropped {} oldest version(s)", excess);
            }
        }
    }
}
