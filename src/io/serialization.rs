// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project serialization and deserialization.
//!
//! All projects are stored together as one JSON array under a fixed key.
//! Image blobs are embedded as base64 data URLs so the whole collection is
//! plain text. Record order is preserved in both directions.

use super::store::KeyValueStore;
use crate::error::{EditorError, Result};
use crate::models::history::History;
use crate::models::image::{Dimensions, ImageData};
use crate::models::project::Project;
use chrono::DateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Key of the single record holding every saved project.
pub const STORAGE_KEY: &str = "roomforge-sessions";

/// Stored form of an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub data_url: String,
}

/// Stored form of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProject {
    pub id: Uuid,
    pub name: String,
    /// Creation time in milliseconds since the Unix epoch
    pub timestamp: i64,
    pub thumbnail: String,
    pub scene_image: StoredImage,
    pub original_dimensions: Dimensions,
    pub generations: Vec<StoredImage>,
}

impl From<&ImageData> for StoredImage {
    fn from(image: &ImageData) -> Self {
        Self {
            name: image.name.clone(),
            mime_type: image.mime_type.clone(),
            data_url: image.to_data_url(),
        }
    }
}

impl StoredImage {
    fn into_image(self) -> Result<ImageData> {
        let mut image = ImageData::from_data_url(self.name, &self.data_url)?;
        image.mime_type = self.mime_type;
        Ok(image)
    }
}

impl From<&Project> for StoredProject {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id(),
            name: project.name().to_string(),
            timestamp: project.created_at().timestamp_millis(),
            thumbnail: project.thumbnail().to_string(),
            scene_image: project.original_image().into(),
            original_dimensions: project.original_dimensions(),
            generations: project
                .history()
                .generations()
                .par_iter()
                .map(StoredImage::from)
                .collect(),
        }
    }
}

impl StoredProject {
    fn into_project(self, max_history: Option<usize>) -> Result<Project> {
        let created_at = DateTime::from_timestamp_millis(self.timestamp).ok_or_else(|| {
            EditorError::PersistenceCorrupt(format!("timestamp {} out of range", self.timestamp))
        })?;
        let original_dimensions = self.original_dimensions.validate()?;
        let original_image = self.scene_image.into_image()?;
        let intrinsic = original_image.dimensions()?;
        if intrinsic != original_dimensions {
            return Err(EditorError::PersistenceCorrupt(format!(
                "stored dimensions {}x{} do not match the {}x{} scene image",
                original_dimensions.width,
                original_dimensions.height,
                intrinsic.width,
                intrinsic.height
            )));
        }
        let generations = self
            .generations
            .into_iter()
            .map(StoredImage::into_image)
            .collect::<Result<Vec<_>>>()?;

        Ok(Project::restore(
            self.id,
            self.name,
            created_at,
            self.thumbnail,
            original_image,
            original_dimensions,
            History::from_generations(generations, max_history),
        ))
    }
}

/// Serialize every project into one JSON text blob.
pub fn serialize_all(projects: &[Project]) -> Result<String> {
    let records: Vec<StoredProject> = projects.par_iter().map(StoredProject::from).collect();
    serde_json::to_string(&records).map_err(|e| EditorError::PersistenceCorrupt(e.to_string()))
}

/// Rebuild projects from a blob produced by [`serialize_all`].
pub fn deserialize_all(blob: &str, max_history: Option<usize>) -> Result<Vec<Project>> {
    let records: Vec<StoredProject> =
        serde_json::from_str(blob).map_err(|e| EditorError::PersistenceCorrupt(e.to_string()))?;
    records
        .into_iter()
        .map(|record| {
            record
                .into_project(max_history)
                .map_err(|e| EditorError::PersistenceCorrupt(e.to_string()))
        })
        .collect()
}

/// Load saved projects, discarding the record if it cannot be read.
pub fn load_projects(store: &dyn KeyValueStore, max_history: Option<usize>) -> Vec<Project> {
    let blob = match store.get(STORAGE_KEY) {
        Ok(Some(blob)) => blob,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log::error!("Failed to read saved projects: {}", e);
            return Vec::new();
        }
    };

    match deserialize_all(&blob, max_history) {
        Ok(projects) => {
            log::info!("Loaded {} saved project(s)", projects.len());
            projects
        }
        Err(e) => {
            log::error!("Discarding saved projects: {}", e);
            if let Err(e) = store.remove(STORAGE_KEY) {
                log::error!("Failed to remove corrupt record: {}", e);
            }
            Vec::new()
        }
    }
}

/// Save every project, logging instead of failing.
pub fn save_projects(store: &dyn KeyValueStore, projects: &[Project]) {
    let result = serialize_all(projects).and_then(|blob| store.set(STORAGE_KEY, &blob));
    match result {
        Ok(()) => log::debug!("Saved {} project(s)", projects.len()),
        Err(e) => log::error!("Failed to save projects: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::MemoryStore;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32, shade: u8) -> ImageData {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([shade, 0, 0])));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        ImageData::new(format!("img-{}.png", shade), "image/png", bytes)
    }

    fn project(generations: usize) -> Project {
        let mut project = Project::new(
            "Design 1".to_string(),
            png(16, 9, 1),
            "data:image/jpeg;base64,AAAA".to_string(),
            None,
        )
        .unwrap();
        for i in 0..generations {
            project.history_mut().append(png(16, 9, 10 + i as u8));
        }
        project
    }

    fn assert_same(restored: &Project, original: &Project) {
        assert_eq!(restored.id(), original.id());
        assert_eq!(restored.name(), original.name());
        assert_eq!(restored.created_at(), original.created_at());
        assert_eq!(restored.thumbnail(), original.thumbnail());
        assert_eq!(restored.original_dimensions(), original.original_dimensions());
        assert_eq!(restored.original_image(), original.original_image());
        assert_eq!(
            restored.history().generations(),
            original.history().generations()
        );
    }

    #[test]
    fn test_roundtrip_with_zero_one_and_many_generations() {
        for count in [0, 1, 5] {
            let original = project(count);
            let blob = serialize_all(std::slice::from_ref(&original)).unwrap();
            let restored = deserialize_all(&blob, None).unwrap();

            assert_eq!(restored.len(), 1);
            assert_same(&restored[0], &original);
            assert_eq!(restored[0].history().cursor(), count.checked_sub(1));
        }
    }

    #[test]
    fn test_order_is_preserved() {
        let projects: Vec<Project> = (0..4).map(|_| project(1)).collect();
        let blob = serialize_all(&projects).unwrap();
        let restored = deserialize_all(&blob, None).unwrap();

        let ids: Vec<Uuid> = restored.iter().map(Project::id).collect();
        let expected: Vec<Uuid> = projects.iter().map(Project::id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_stored_layout_field_names() {
        let blob = serialize_all(&[project(1)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
        let record = &value[0];

        for field in [
            "id",
            "name",
            "timestamp",
            "thumbnail",
            "sceneImage",
            "originalDimensions",
            "generations",
        ] {
            assert!(record.get(field).is_some(), "missing {}", field);
        }
        assert_eq!(record["sceneImage"]["type"], "image/png");
        assert!(record["sceneImage"]["dataUrl"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
        assert_eq!(record["originalDimensions"]["width"], 16);
    }

    #[test]
    fn test_malformed_blobs_are_corrupt() {
        for blob in ["", "{not json", "{\"id\": 1}", "[{\"id\": \"nope\"}]"] {
            assert!(matches!(
                deserialize_all(blob, None),
                Err(EditorError::PersistenceCorrupt(_))
            ));
        }
    }

    #[test]
    fn test_bad_data_url_is_corrupt() {
        let mut record = StoredProject::from(&project(0));
        record.scene_image.data_url = "data:image/png;base64,!!!".to_string();
        let blob = serde_json::to_string(&vec![record]).unwrap();
        assert!(matches!(
            deserialize_all(&blob, None),
            Err(EditorError::PersistenceCorrupt(_))
        ));
    }

    #[test]
    fn test_load_discards_corrupt_record() {
        let store = MemoryStore::new();
        store.set(STORAGE_KEY, "[{garbage").unwrap();

        let projects = load_projects(&store, None);
        assert!(projects.is_empty());
        assert_eq!(store.get(STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        assert!(load_projects(&store, None).is_empty());

        let original = project(2);
        save_projects(&store, std::slice::from_ref(&original));
        let loaded = load_projects(&store, None);
        assert_eq!(loaded.len(), 1);
        assert_same(&loaded[0], &original);
    }

    #[test]
    fn test_mismatched_dimensions_are_corrupt() {
        let mut record = StoredProject::from(&project(0));
        record.original_dimensions = Dimensions::new(9, 16);
        let blob = serde_json::to_string(&vec![record]).unwrap();
        assert!(matches!(
            deserialize_all(&blob, None),
            Err(EditorError::PersistenceCorrupt(_))
        ));

        let store = MemoryStore::new();
        store.set(STORAGE_KEY, &blob).unwrap();
        assert!(load_projects(&store, None).is_empty());
        assert_eq!(store.get(STORAGE_KEY).unwrap(), None);
    }

    /// Reads like an empty store, refuses every write.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "quota exceeded").into())
        }

        fn remove(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_save_failure_is_logged_not_returned() {
        let projects = vec![project(1), project(0)];
        save_projects(&ReadOnlyStore, &projects);

        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].history().len(), 1);
        assert!(load_projects(&ReadOnlyStore, None).is_empty());
    }
}
