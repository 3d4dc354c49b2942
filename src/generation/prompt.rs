// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Instruction text sent alongside the images.
//!
//! The text is assembled from configurable templates. `{prompt}` and
//! `{degrees}` are substituted; every other sentence is sent verbatim.

use serde::{Deserialize, Serialize};

/// How a sketch overlay is meant to be read by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SketchMode {
    /// Edits are confined to the sketched regions
    #[default]
    Confine,
    /// Sketched shapes become concrete objects
    Objects,
}

/// Template set for instruction text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub task: String,
    pub scenery: String,
    pub rotation: String,
    pub structure: String,
    pub iterative: String,
    pub sketch_confine: String,
    pub sketch_objects: String,
    pub product: String,
    pub product_marked: String,
    pub output: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            task: "Redesign the photographed space according to this request: {prompt}".to_string(),
            scenery: "Change only the background, environment and lighting as follows: {prompt}. \
                      Keep the primary subject exactly as it is."
                .to_string(),
            rotation: "Show the same space from a camera position rotated {degrees} degrees around \
                       its center, keeping every object, material and light source consistent."
                .to_string(),
            structure: "Never alter structural or architectural elements such as walls, windows, \
                        doors, ceilings, floors or rooflines unless explicitly instructed."
                .to_string(),
            iterative: "The first image is the current design. The last image is the original \
                        photo; treat it as the structural ground truth."
                .to_string(),
            sketch_confine: "A sketch overlay aligned with the current design is provided. Apply \
                             edits only within the sketched regions and leave everything outside \
                             them unchanged."
                .to_string(),
            sketch_objects: "A sketch overlay aligned with the current design is provided. \
                             Interpret each sketched shape as a concrete object and render it \
                             photorealistically in its place."
                .to_string(),
            product: "A product image is provided. Integrate this product into the scene at the \
                      correct scale and perspective, with lighting and shadows that match the scene."
                .to_string(),
            product_marked: "Place the product at the location marked by the red circle and do not \
                             render the marker itself."
                .to_string(),
            output: "Output a single photorealistic image with no text, labels, watermarks or other \
                     artifacts."
                .to_string(),
        }
    }
}

/// What a particular request contains.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstructionParams<'a> {
    pub user_prompt: &'a str,
    pub sketch: Option<SketchMode>,
    pub scenery_only: bool,
    pub has_product: bool,
    pub marked_location: bool,
    /// Set when the displayed version is a generated one, not the original
    pub is_iterative_edit: bool,
    pub rotation_degrees: Option<i32>,
}

/// Assemble the instruction text for one request.
pub fn build_instruction(templates: &PromptTemplates, params: &InstructionParams) -> String {
    let prompt = params.user_prompt.trim();
    let mut parts: Vec<String> = Vec::new();

    if let Some(degrees) = params.rotation_degrees {
        parts.push(templates.rotation.replace("{degrees}", &degrees.to_string()));
    } else if params.scenery_only {
        parts.push(templates.scenery.replace("{prompt}", prompt));
    } else if !prompt.is_empty() {
        parts.push(templates.task.replace("{prompt}", prompt));
    }

    parts.push(templates.structure.clone());

    if params.is_iterative_edit {
        parts.push(templates.iterative.clone());
    }

    match params.sketch {
        Some(SketchMode::Confine) => parts.push(templates.sketch_confine.clone()),
        Some(SketchMode::Objects) => parts.push(templates.sketch_objects.clone()),
        None => {}
    }

    if params.has_product {
        parts.push(templates.product.clone());
        if params.marked_location {
            parts.push(templates.product_marked.clone());
        }
    }

    parts.push(templates.output.clone());
    parts.join("\n")
}
