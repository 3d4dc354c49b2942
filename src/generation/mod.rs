// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Requests to the remote image model.

pub mod client;
pub mod prompt;

pub use client::{GenerationRequest, HttpGenerator, ImageGenerator};
pub use prompt::{build_instruction, InstructionParams, PromptTemplates, SketchMode};
