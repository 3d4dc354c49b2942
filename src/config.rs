// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Settings are read from an optional YAML file. Every field has a default,
//! so a partial file only overrides what it names.

use crate::generation::prompt::{PromptTemplates, SketchMode};
use crate::session::SessionSettings;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What happens to the product image after a scenery change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductRetention {
    #[default]
    Keep,
    Clear,
}

/// Remote model connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash-image-preview".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Settings that shape generation requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub square_size: u32,
    pub jpeg_quality: u8,
    pub scenery_product: ProductRetention,
    pub sketch_mode: SketchMode,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        AppConfig::default().generation_settings()
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory of the session store; the platform data directory when unset
    pub store_dir: Option<PathBuf>,
    pub square_size: u32,
    pub jpeg_quality: u8,
    pub thumbnail_size: u32,
    /// Generated versions kept per project; unbounded when unset
    pub max_history: Option<usize>,
    pub scenery_product: ProductRetention,
    pub sketch_mode: SketchMode,
    pub sample_url: String,
    pub generator: GeneratorConfig,
    pub prompts: PromptTemplates,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_dir: None,
            square_size: 1024,
            jpeg_quality: 95,
            thumbnail_size: 256,
            max_history: None,
            scenery_product: ProductRetention::Keep,
            sketch_mode: SketchMode::Confine,
            sample_url:
                "https://raw.githubusercontent.com/yourusername/roomforge/main/assets/sample-living-room.jpg"
                    .to_string(),
            generator: GeneratorConfig::default(),
            prompts: PromptTemplates::default(),
        }
    }
}

impl AppConfig {
    /// Load from a YAML file, or use defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let yaml = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_yaml::from_str(&yaml)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the geometry and encoders cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.square_size == 0 {
            bail!("square_size must be greater than zero");
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            bail!("jpeg_quality must be between 1 and 100, got {}", self.jpeg_quality);
        }
        if self.thumbnail_size == 0 {
            bail!("thumbnail_size must be greater than zero");
        }
        if self.max_history == Some(0) {
            bail!("max_history must be at least 1 when set");
        }
        Ok(())
    }

    /// Where saved projects live.
    pub fn store_dir(&self) -> PathBuf {
        self.store_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("roomforge")
        })
    }

    pub fn generator_timeout(&self) -> Duration {
        Duration::from_secs(self.generator.timeout_secs)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            thumbnail_size: self.thumbnail_size,
            max_history: self.max_history,
        }
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            square_size: self.square_size,
            jpeg_quality: self.jpeg_quality,
            scenery_product: self.scenery_product,
            sketch_mode: self.sketch_mode,
        }
    }
}
