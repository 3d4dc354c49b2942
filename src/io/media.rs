// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image encoding, thumbnails and sample downloads.
//!
//! Everything handed to the model is re-encoded as JPEG so that padding
//! renders as solid black regardless of the source format's alpha channel.

use crate::error::{EditorError, Result};
use crate::models::image::ImageData;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::time::Duration;

const THUMBNAIL_QUALITY: u8 = 80;

/// Encode pixels as a JPEG image blob.
pub fn encode_jpeg(img: &DynamicImage, name: impl Into<String>, quality: u8) -> Result<ImageData> {
    let rgb = img.to_rgb8();
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)?;
    Ok(ImageData::new(name, "image/jpeg", bytes))
}

/// Small JPEG preview of `scene`, returned as a data URL.
pub fn thumbnail_data_url(scene: &ImageData, max_size: u32) -> Result<String> {
    let decoded = scene.decode()?;
    let preview = decoded.thumbnail(max_size.max(1), max_size.max(1));
    let encoded = encode_jpeg(&preview, scene.name.clone(), THUMBNAIL_QUALITY)?;
    Ok(encoded.to_data_url())
}

/// Download the bundled sample scene.
pub fn fetch_sample(url: &str, timeout: Duration) -> Result<ImageData> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| EditorError::SampleFetch(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| EditorError::SampleFetch(e.to_string()))?;
    if !response.status().is_success() {
        return Err(EditorError::SampleFetch(format!(
            "{} returned {}",
            url,
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .map_err(|e| EditorError::SampleFetch(e.to_string()))?;
    let name = url
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("sample.jpg")
        .to_string();

    log::info!("Fetched sample image {} ({} bytes)", name, bytes.len());
    ImageData::from_bytes(name, bytes.to_vec())
        .map_err(|e| EditorError::SampleFetch(e.to_string()))
}
