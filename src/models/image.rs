// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Encoded image blobs and their pixel dimensions.
//!
//! Images travel through the editor in their encoded form (PNG, JPEG, ...)
//! together with a display name and mime type. They are decoded only when
//! a geometry operation needs the pixels.

use crate::error::{EditorError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, ImageReader};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Reject degenerate geometry.
    pub fn validate(self) -> Result<Self> {
        if self.width == 0 || self.height == 0 {
            return Err(EditorError::InvalidDimension {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// An encoded image with its name and mime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageData {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Wrap encoded bytes, sniffing the mime type from the content.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let format = image::guess_format(&bytes)?;
        Ok(Self::new(name, format.to_mime_type(), bytes))
    }

    /// Read an image file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());
        Self::from_bytes(name, bytes)
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(name: impl Into<String>, data_url: &str) -> Result<Self> {
        let rest = data_url
            .strip_prefix("data:")
            .ok_or_else(|| EditorError::InvalidImageData("missing data: prefix".to_string()))?;
        let (mime_type, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| EditorError::InvalidImageData("data URL is not base64".to_string()))?;
        let bytes = BASE64
            .decode(payload)
            .map_err(|e| EditorError::InvalidImageData(format!("bad base64 payload: {}", e)))?;
        Ok(Self::new(name, mime_type, bytes))
    }

    /// Encode as a self-describing data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.bytes))
    }

    /// Decode the pixels.
    pub fn decode(&self) -> Result<DynamicImage> {
        Ok(image::load_from_memory(&self.bytes)?)
    }

    /// Read the pixel dimensions from the image header without decoding.
    pub fn dimensions(&self) -> Result<Dimensions> {
        let reader = ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .map_err(|e| EditorError::InvalidImageData(e.to_string()))?;
        let (width, height) = reader.into_dimensions()?;
        Dimensions::new(width, height).validate()
    }

    /// Write the encoded bytes to a file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    #[test]
    fn test_from_bytes_sniffs_mime() {
        let data = ImageData::from_bytes("room.png", png(4, 3)).unwrap();
        assert_eq!(data.mime_type, "image/png");
        assert_eq!(data.dimensions().unwrap(), Dimensions::new(4, 3));
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let result = ImageData::from_bytes("junk", b"not an image".to_vec());
        assert!(matches!(result, Err(EditorError::InvalidImageData(_))));
    }

    #[test]
    fn test_data_url_preserves_bytes() {
        let data = ImageData::from_bytes("room.png", png(2, 2)).unwrap();
        let url = data.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));

        let parsed = ImageData::from_data_url("room.png", &url).unwrap();
        assert_eq!(parsed, data);
    }

    #[test]
    fn test_malformed_data_urls() {
        assert!(ImageData::from_data_url("a", "image/png;base64,AAAA").is_err());
        assert!(ImageData::from_data_url("a", "data:image/png,AAAA").is_err());
        assert!(ImageData::from_data_url("a", "data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(Dimensions::new(0, 10).validate().is_err());
        assert!(Dimensions::new(10, 0).validate().is_err());
        assert!((Dimensions::new(1600, 900).aspect_ratio() - 1.7777).abs() < 0.001);
    }
}
