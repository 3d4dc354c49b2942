// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editing flows on top of the session manager.
//!
//! Each flow prepares padded square inputs from the active project, sends
//! them to the image model with an assembled instruction, crops the reply
//! back to the scene's aspect ratio and records it as a new version. A
//! failed request leaves the prompt, sketch and product untouched so the
//! user can simply submit again. Callers must not run two flows at once.

use crate::config::{GenerationSettings, ProductRetention};
use crate::error::{EditorError, Result};
use crate::generation::{
    build_instruction, GenerationRequest, ImageGenerator, InstructionParams, PromptTemplates,
};
use crate::models::image::ImageData;
use crate::models::project::Project;
use crate::session::SessionManager;
use crate::util::geometry::{
    crop_to_original_aspect_ratio, draw_marker, map_relative_to_absolute, normalize_coordinates,
    pad_to_square, Point,
};

/// Snapshot of the active project taken before a request.
struct ActiveView {
    current: ImageData,
    original: ImageData,
    width: u32,
    height: u32,
    is_iterative_edit: bool,
}

impl ActiveView {
    fn of(project: &Project) -> Self {
        let dims = project.original_dimensions();
        Self {
            current: project.current_image().clone(),
            original: project.original_image().clone(),
            width: dims.width,
            height: dims.height,
            is_iterative_edit: project.is_iterative_edit(),
        }
    }
}

/// The editor: projects plus access to the image model.
pub struct App {
    session: SessionManager,
    generator: Box<dyn ImageGenerator>,
    prompts: PromptTemplates,
    settings: GenerationSettings,
}

impl App {
    pub fn new(
        session: SessionManager,
        generator: Box<dyn ImageGenerator>,
        prompts: PromptTemplates,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            session,
            generator,
            prompts,
            settings,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionManager {
        &mut self.session
    }

    /// Give back the session, e.g. once the last flow has run.
    pub fn into_session(self) -> SessionManager {
        self.session
    }

    /// Apply the current prompt, sketch and product to the displayed version.
    pub fn submit_edit(&mut self) -> Result<()> {
        let view = self.active_view()?;
        let working = self.session.working().clone();
        if working.prompt.trim().is_empty()
            && working.sketch_overlay.is_none()
            && working.product_image.is_none()
        {
            return Err(EditorError::MissingInput("prompt, sketch or product"));
        }

        let mut images = vec![self.pad(&view.current)?];
        if let Some(ref sketch) = working.sketch_overlay {
            images.push(self.pad(sketch)?);
        }
        if let Some(ref product) = working.product_image {
            images.push(product.clone());
        }
        if view.is_iterative_edit {
            images.push(self.pad(&view.original)?);
        }

        let instruction = build_instruction(
            &self.prompts,
            &InstructionParams {
                user_prompt: &working.prompt,
                sketch: working.sketch_overlay.as_ref().map(|_| self.settings.sketch_mode),
                has_product: working.product_image.is_some(),
                is_iterative_edit: view.is_iterative_edit,
                ..Default::default()
            },
        );

        self.generate_and_record(&view, images, instruction)?;
        self.session.clear_prompt();
        self.session.clear_sketch_overlay();
        self.session.clear_product_image();
        Ok(())
    }

    /// Insert the product image at a point picked on the displayed image.
    ///
    /// `relative` is a fraction of the displayed content area.
    pub fn drop_product(&mut self, relative: Point) -> Result<()> {
        let view = self.active_view()?;
        let product = self
            .session
            .working()
            .product_image
            .clone()
            .ok_or(EditorError::MissingInput("product image"))?;

        let size = self.settings.square_size;
        let at = map_relative_to_absolute(relative, view.width, view.height, size)?;
        log::debug!(
            "Drop at ({:.3}, {:.3}) maps to ({:.1}, {:.1}) on the {}px square",
            relative.x,
            relative.y,
            at.x,
            at.y,
            size
        );

        let marked = draw_marker(&self.pad(&view.current)?, at, self.settings.jpeg_quality)?;
        let prompt = self.session.working().prompt.clone();
        let instruction = build_instruction(
            &self.prompts,
            &InstructionParams {
                user_prompt: &prompt,
                has_product: true,
                marked_location: true,
                ..Default::default()
            },
        );

        self.generate_and_record(&view, vec![marked, product], instruction)?;
        self.session.clear_product_image();
        self.session.clear_prompt();
        Ok(())
    }

    /// Like [`App::drop_product`], with the pointer given in pixels of the
    /// `display_width` x `display_height` area the image is shown in.
    pub fn drop_product_at_pointer(
        &mut self,
        pointer: Point,
        display_width: u32,
        display_height: u32,
    ) -> Result<()> {
        if display_width == 0 || display_height == 0 {
            return Err(EditorError::InvalidDimension {
                width: display_width,
                height: display_height,
            });
        }
        let relative = normalize_coordinates(pointer.x, pointer.y, display_width, display_height);
        self.drop_product(relative)
    }

    /// Change only the surroundings of the displayed version.
    ///
    /// The primary prompt is kept; the product image is kept or cleared
    /// according to the configured retention.
    pub fn change_scenery(&mut self, scenery_prompt: &str) -> Result<()> {
        if scenery_prompt.trim().is_empty() {
            return Err(EditorError::MissingInput("scenery description"));
        }
        let view = self.active_view()?;
        let working = self.session.working().clone();

        let mut images = vec![self.pad(&view.current)?];
        if let Some(ref sketch) = working.sketch_overlay {
            images.push(self.pad(sketch)?);
        }
        if let Some(ref product) = working.product_image {
            images.push(product.clone());
        }

        let instruction = build_instruction(
            &self.prompts,
            &InstructionParams {
                user_prompt: scenery_prompt,
                scenery_only: true,
                sketch: working.sketch_overlay.as_ref().map(|_| self.settings.sketch_mode),
                has_product: working.product_image.is_some(),
                ..Default::default()
            },
        );

        self.generate_and_record(&view, images, instruction)?;
        self.session.clear_sketch_overlay();
        if self.settings.scenery_product == ProductRetention::Clear {
            self.session.clear_product_image();
        }
        Ok(())
    }

    /// Re-render the displayed version from a rotated viewpoint.
    pub fn rotate_view(&mut self, degrees: i32) -> Result<()> {
        let view = self.active_view()?;
        let mut images = vec![self.pad(&view.current)?];
        if view.is_iterative_edit {
            images.push(self.pad(&view.original)?);
        }

        let instruction = build_instruction(
            &self.prompts,
            &InstructionParams {
                rotation_degrees: Some(degrees),
                is_iterative_edit: view.is_iterative_edit,
                ..Default::default()
            },
        );

        self.generate_and_record(&view, images, instruction)?;
        self.session.clear_sketch_overlay();
        Ok(())
    }

    fn active_view(&self) -> Result<ActiveView> {
        self.session
            .active_project()
            .map(ActiveView::of)
            .ok_or(EditorError::NoActiveProject)
    }

    fn pad(&self, image: &ImageData) -> Result<ImageData> {
        pad_to_square(image, self.settings.square_size, self.settings.jpeg_quality)
    }

    fn generate_and_record(
        &mut self,
        view: &ActiveView,
        images: Vec<ImageData>,
        instruction: String,
    ) -> Result<()> {
        let request = GenerationRequest::new(images, instruction);
        let reply = self.generator.generate(&request).map_err(|e| {
            log::error!("{}", e);
            if matches!(e, EditorError::GenerationFailed(_)) {
                e
            } else {
                EditorError::GenerationFailed(e.to_string())
            }
        })?;

        let number = self.session.active_project().map_or(1, next_version_number);
        let mut cropped = crop_to_original_aspect_ratio(
            &reply,
            view.width,
            view.height,
            self.settings.square_size,
            self.settings.jpeg_quality,
        )
        .map_err(|e| EditorError::GenerationFailed(format!("unusable reply: {}", e)))?;
        cropped.name = format!("generation-{}.jpg", number);

        self.session.append_generation(cropped)
    }
}

/// One past the highest numbered version that survives the next append.
///
/// Versions beyond the cursor are about to be discarded and versions dropped
/// by the history limit are gone, so numbers only ever grow along a branch.
fn next_version_number(project: &Project) -> usize {
    let history = project.history();
    let kept = history.cursor().map_or(0, |c| c + 1);
    history
        .generations()
        .iter()
        .take(kept)
        .filter_map(|g| {
            g.name
                .strip_prefix("generation-")?
                .strip_suffix(".jpg")?
                .parse::<usize>()
                .ok()
        })
        .max()
        .unwrap_or(0)
        + 1
}
