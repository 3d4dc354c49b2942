// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project collection and the active project's working state.
//!
//! The session manager owns every project, tracks which one is open, and
//! holds the transient inputs (prompt, sketch, product) that are never
//! saved. Every change to the collection queues a background save; the
//! in-memory state stays authoritative if that save fails.

use crate::error::{EditorError, Result};
use crate::io::flush::FlushWorker;
use crate::io::media::{fetch_sample, thumbnail_data_url};
use crate::io::serialization::load_projects;
use crate::io::store::KeyValueStore;
use crate::models::image::ImageData;
use crate::models::project::Project;
use std::time::Duration;
use uuid::Uuid;

/// Session-level settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub thumbnail_size: u32,
    pub max_history: Option<usize>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            thumbnail_size: 256,
            max_history: None,
        }
    }
}

/// Unsaved inputs for the active project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkingState {
    pub prompt: String,
    pub sketch_overlay: Option<ImageData>,
    pub product_image: Option<ImageData>,
}

/// Owns all projects and the active-project pointer.
pub struct SessionManager {
    /// Most recently created first
    projects: Vec<Project>,
    active: Option<Uuid>,
    working: WorkingState,
    settings: SessionSettings,
    flush: FlushWorker,
}

impl SessionManager {
    /// Load saved projects from `store` and start background saving.
    ///
    /// No project is active after opening.
    pub fn open(store: Box<dyn KeyValueStore>, settings: SessionSettings) -> Self {
        let projects = load_projects(store.as_ref(), settings.max_history);
        Self {
            projects,
            active: None,
            working: WorkingState::default(),
            settings,
            flush: FlushWorker::spawn(store),
        }
    }

    /// Start a new project from a scene image and make it active.
    ///
    /// If the image cannot be read, no project is left active.
    pub fn create_project(&mut self, scene: ImageData) -> Result<&Project> {
        self.working = WorkingState::default();

        let project = thumbnail_data_url(&scene, self.settings.thumbnail_size).and_then(|thumbnail| {
            let name = format!("Design {}", self.next_design_number());
            Project::new(name, scene, thumbnail, self.settings.max_history)
        });
        let project = match project {
            Ok(project) => project,
            Err(e) => {
                log::error!("Failed to start project: {}", e);
                self.active = None;
                return Err(e);
            }
        };

        log::info!(
            "Created project {} ({}x{})",
            project.id(),
            project.original_dimensions().width,
            project.original_dimensions().height
        );

        self.active = Some(project.id());
        self.projects.insert(0, project);
        self.persist();
        Ok(&self.projects[0])
    }

    /// Download the bundled sample scene and start a project from it.
    ///
    /// A failed download leaves no project active.
    pub fn start_from_sample(&mut self, url: &str, timeout: Duration) -> Result<&Project> {
        match fetch_sample(url, timeout) {
            Ok(scene) => self.create_project(scene),
            Err(e) => {
                log::error!("{}", e);
                self.active = None;
                self.working = WorkingState::default();
                Err(e)
            }
        }
    }

    /// Open an existing project at its latest version.
    pub fn select_project(&mut self, id: Uuid) -> Result<()> {
        let project = self.projects.iter_mut().find(|p| p.id() == id).ok_or_else(|| {
            log::warn!("Cannot select unknown project {}", id);
            EditorError::NotFound(id)
        })?;

        project.history_mut().seek_latest();
        self.active = Some(id);
        self.working = WorkingState::default();
        log::info!("Selected project {}", id);
        Ok(())
    }

    /// Remove a project. If it was open, the newest remaining one opens instead.
    pub fn delete_project(&mut self, id: Uuid) -> Result<()> {
        let index = self.projects.iter().position(|p| p.id() == id).ok_or_else(|| {
            log::warn!("Cannot delete unknown project {}", id);
            EditorError::NotFound(id)
        })?;

        self.projects.remove(index);
        log::info!("Deleted project {}", id);

        if self.active == Some(id) {
            self.active = None;
            self.working = WorkingState::default();
            // The collection is kept newest first
            if let Some(next) = self.projects.first().map(Project::id) {
                self.select_project(next)?;
            }
        }

        self.persist();
        Ok(())
    }

    pub fn rename_project(&mut self, id: Uuid, name: String) -> Result<()> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or(EditorError::NotFound(id))?;
        project.rename(name);
        self.persist();
        Ok(())
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.active
    }

    pub fn active_project(&self) -> Option<&Project> {
        let id = self.active?;
        self.projects.iter().find(|p| p.id() == id)
    }

    fn active_project_mut(&mut self) -> Result<&mut Project> {
        let id = self.active.ok_or(EditorError::NoActiveProject)?;
        self.projects
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or(EditorError::NotFound(id))
    }

    /// The version on display for the active project.
    pub fn current_image(&self) -> Option<&ImageData> {
        self.active_project().map(Project::current_image)
    }

    pub fn working(&self) -> &WorkingState {
        &self.working
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.working.prompt = prompt.into();
    }

    pub fn clear_prompt(&mut self) {
        self.working.prompt.clear();
    }

    pub fn set_sketch_overlay(&mut self, sketch: ImageData) {
        self.working.sketch_overlay = Some(sketch);
    }

    pub fn clear_sketch_overlay(&mut self) {
        self.working.sketch_overlay = None;
    }

    pub fn set_product_image(&mut self, product: ImageData) {
        self.working.product_image = Some(product);
    }

    pub fn clear_product_image(&mut self) {
        self.working.product_image = None;
    }

    /// Record a finished generation on the active project.
    pub fn append_generation(&mut self, image: ImageData) -> Result<()> {
        let project = self.active_project_mut()?;
        project.history_mut().append(image);
        log::info!(
            "Project {} now at version {} of {}",
            project.id(),
            project.history().cursor().map_or(0, |c| c + 1),
            project.history().len()
        );
        self.persist();
        Ok(())
    }

    /// Step back one version. Returns whether the cursor moved.
    pub fn undo(&mut self) -> Result<bool> {
        Ok(self.active_project_mut()?.history_mut().undo())
    }

    /// Step forward one version. Returns whether the cursor moved.
    pub fn redo(&mut self) -> Result<bool> {
        Ok(self.active_project_mut()?.history_mut().redo())
    }

    /// Throw away every generated version and any pending sketch.
    pub fn revert_to_original(&mut self) -> Result<()> {
        let project = self.active_project_mut()?;
        project.history_mut().revert_to_original();
        log::info!("Reverted project {} to its original image", project.id());
        self.working.sketch_overlay = None;
        self.persist();
        Ok(())
    }

    /// Block until queued saves have been written.
    pub fn wait_for_flush(&self) {
        self.flush.wait_idle();
    }

    fn persist(&self) {
        self.flush.submit(self.projects.clone());
    }

    /// One past the highest "Design N" in use, so default names never repeat.
    fn next_design_number(&self) -> usize {
        self.projects
            .iter()
            .filter_map(|p| p.name().strip_prefix("Design ")?.parse::<usize>().ok())
            .max()
            .unwrap_or(0)
            + 1
    }
}
