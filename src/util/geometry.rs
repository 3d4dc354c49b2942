// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! The model consumes fixed-size square images. Scene photos are scaled to
//! fit inside the square and padded with black; results are cropped back to
//! the scene's aspect ratio afterwards. Pointer positions picked on the
//! displayed (unpadded) image are re-projected into the padded square.

use crate::error::{EditorError, Result};
use crate::io::media::encode_jpeg;
use crate::models::image::{Dimensions, ImageData};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};

/// Marker circle radius in pixels.
pub const MARKER_RADIUS: f64 = 10.0;
/// Width of the marker's outline in pixels.
pub const MARKER_STROKE: f64 = 3.0;
const MARKER_FILL: [u8; 3] = [255, 0, 0];
const MARKER_STROKE_COLOR: [u8; 3] = [255, 255, 255];
const MARKER_STROKE_ALPHA: f32 = 0.8;

/// A 2D point, relative (0.0 to 1.0) or absolute depending on context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Area of the padded square covered by the scaled source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ContentRect {
    /// Whole-pixel rectangle `(x, y, width, height)` used for drawing and cropping.
    ///
    /// Both padding and cropping go through this, so they always agree.
    pub fn to_pixels(&self, size: u32) -> (u32, u32, u32, u32) {
        let width = (self.width.round() as u32).clamp(1, size);
        let height = (self.height.round() as u32).clamp(1, size);
        ((size - width) / 2, (size - height) / 2, width, height)
    }
}

/// Compute where an `orig_w` x `orig_h` image lands inside a `size` square.
pub fn content_rect(orig_w: u32, orig_h: u32, size: u32) -> Result<ContentRect> {
    let dims = Dimensions::new(orig_w, orig_h).validate()?;
    if size == 0 {
        return Err(EditorError::InvalidDimension { width: size, height: size });
    }

    let size = size as f64;
    let aspect = dims.aspect_ratio();
    let (width, height) = if aspect > 1.0 {
        (size, size / aspect)
    } else {
        (size * aspect, size)
    };

    Ok(ContentRect {
        x: (size - width) / 2.0,
        y: (size - height) / 2.0,
        width,
        height,
    })
}

/// Convert pixel coordinates to normalized coordinates (0.0 to 1.0).
///
/// Positions outside the displayed image yield values outside the unit range.
pub fn normalize_coordinates(pixel_x: f64, pixel_y: f64, width: u32, height: u32) -> Point {
    Point {
        x: pixel_x / width as f64,
        y: pixel_y / height as f64,
    }
}

/// Scale `source` to fit a `size` square, pad with black, encode as JPEG.
pub fn pad_to_square(source: &ImageData, size: u32, quality: u8) -> Result<ImageData> {
    let decoded = source.decode()?;
    let rect = content_rect(decoded.width(), decoded.height(), size)?;
    let (x, y, width, height) = rect.to_pixels(size);

    let scaled = decoded.resize_exact(width, height, FilterType::Lanczos3).to_rgb8();
    let mut canvas = RgbImage::from_pixel(size, size, Rgb([0, 0, 0]));
    imageops::overlay(&mut canvas, &scaled, x as i64, y as i64);

    log::debug!(
        "Padded {}x{} to {}x{} (content {}x{} at {},{})",
        decoded.width(),
        decoded.height(),
        size,
        size,
        width,
        height,
        x,
        y
    );

    encode_jpeg(&DynamicImage::ImageRgb8(canvas), padded_name(&source.name), quality)
}

/// Map a point relative to the displayed content onto the padded square.
pub fn map_relative_to_absolute(relative: Point, orig_w: u32, orig_h: u32, size: u32) -> Result<Point> {
    let rect = content_rect(orig_w, orig_h, size)?;
    let in_range = |v: f64| (0.0..=1.0).contains(&v);
    if !in_range(relative.x) || !in_range(relative.y) {
        return Err(EditorError::PlacementOutOfBounds {
            x: relative.x,
            y: relative.y,
        });
    }

    Ok(Point {
        x: rect.x + relative.x * rect.width,
        y: rect.y + relative.y * rect.height,
    })
}

/// Remove the padding added by [`pad_to_square`].
///
/// The output keeps the scaled content size; it is not upscaled back to the
/// original resolution. A model reply that is not exactly `size` square is
/// resized to it first.
pub fn crop_to_original_aspect_ratio(
    square: &ImageData,
    orig_w: u32,
    orig_h: u32,
    size: u32,
    quality: u8,
) -> Result<ImageData> {
    let rect = content_rect(orig_w, orig_h, size)?;
    let (x, y, width, height) = rect.to_pixels(size);

    let mut decoded = square.decode()?;
    if decoded.width() != size || decoded.height() != size {
        log::debug!(
            "Resizing {}x{} reply to {}x{} before cropping",
            decoded.width(),
            decoded.height(),
            size,
            size
        );
        decoded = decoded.resize_exact(size, size, FilterType::Lanczos3);
    } else if width == size && height == size {
        return Ok(square.clone());
    }

    let cropped = decoded.crop_imm(x, y, width, height);
    encode_jpeg(&cropped, square.name.clone(), quality)
}

/// Draw the placement marker onto a padded square at an absolute position.
pub fn draw_marker(padded: &ImageData, at: Point, quality: u8) -> Result<ImageData> {
    let mut canvas = padded.decode()?.to_rgb8();
    let (width, height) = canvas.dimensions();
    if at.x < 0.0 || at.y < 0.0 || at.x > width as f64 || at.y > height as f64 {
        return Err(EditorError::PlacementOutOfBounds { x: at.x, y: at.y });
    }

    let outer = MARKER_RADIUS + MARKER_STROKE / 2.0;
    let min_x = (at.x - outer).floor().max(0.0) as u32;
    let min_y = (at.y - outer).floor().max(0.0) as u32;
    let max_x = ((at.x + outer).ceil() as u32).min(width.saturating_sub(1));
    let max_y = ((at.y + outer).ceil() as u32).min(height.saturating_sub(1));

    for py in min_y..=max_y {
        for px in min_x..=max_x {
            // Sample at pixel centers
            let dx = px as f64 + 0.5 - at.x;
            let dy = py as f64 + 0.5 - at.y;
            let distance = (dx * dx + dy * dy).sqrt();

            if (distance - MARKER_RADIUS).abs() <= MARKER_STROKE / 2.0 {
                let pixel = canvas.get_pixel_mut(px, py);
                for (channel, stroke) in pixel.0.iter_mut().zip(MARKER_STROKE_COLOR) {
                    let blended = *channel as f32 * (1.0 - MARKER_STROKE_ALPHA)
                        + stroke as f32 * MARKER_STROKE_ALPHA;
                    *channel = blended.round() as u8;
                }
            } else if distance < MARKER_RADIUS {
                canvas.put_pixel(px, py, Rgb(MARKER_FILL));
            }
        }
    }

    encode_jpeg(&DynamicImage::ImageRgb8(canvas), padded.name.clone(), quality)
}

fn padded_name(name: &str) -> String {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    format!("{}-square.jpg", stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use proptest::prelude::*;
    use std::io::Cursor;

    fn solid(width: u32, height: u32, color: [u8; 3]) -> ImageData {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        ImageData::new("scene.png", "image/png", bytes)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.0001
    }

    #[test]
    fn test_pointer_inside_display_normalizes_to_unit_range() {
        let relative = normalize_coordinates(80.0, 45.0, 800, 450);
        assert!(close(relative.x, 0.1));
        assert!(close(relative.y, 0.1));

        let abs = map_relative_to_absolute(relative, 1600, 900, 1024).unwrap();
        assert!(close(abs.x, 102.4));
        assert!(close(abs.y, 281.6));
    }

    #[test]
    fn test_landscape_content_rect() {
        let rect = content_rect(1600, 900, 1024).unwrap();
        assert!(close(rect.x, 0.0));
        assert!(close(rect.y, 224.0));
        assert!(close(rect.width, 1024.0));
        assert!(close(rect.height, 576.0));
        assert_eq!(rect.to_pixels(1024), (0, 224, 1024, 576));
    }

    #[test]
    fn test_portrait_content_rect() {
        let rect = content_rect(900, 1600, 1024).unwrap();
        assert!(close(rect.x, 224.0));
        assert!(close(rect.y, 0.0));
        assert!(close(rect.width, 576.0));
        assert!(close(rect.height, 1024.0));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            content_rect(0, 900, 1024),
            Err(EditorError::InvalidDimension { .. })
        ));
        assert!(matches!(
            content_rect(1600, 900, 0),
            Err(EditorError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn test_drop_position_scenario() {
        let abs = map_relative_to_absolute(Point::new(0.1, 0.1), 1600, 900, 1024).unwrap();
        assert!(close(abs.x, 102.4));
        assert!(close(abs.y, 281.6));

        let above = map_relative_to_absolute(Point::new(0.5, -0.05), 1600, 900, 1024);
        assert!(matches!(above, Err(EditorError::PlacementOutOfBounds { .. })));
    }

    #[test]
    fn test_pointer_outside_display_is_rejected() {
        // 800x450 display, pointer 20px to the left of the image
        let relative = normalize_coordinates(-20.0, 100.0, 800, 450);
        let result = map_relative_to_absolute(relative, 1600, 900, 1024);
        assert!(matches!(result, Err(EditorError::PlacementOutOfBounds { .. })));
    }

    #[test]
    fn test_pad_to_square_letterboxes_with_black() {
        let source = solid(160, 90, [250, 250, 250]);
        let padded = pad_to_square(&source, 128, 95).unwrap();
        assert_eq!(padded.mime_type, "image/jpeg");
        assert_eq!(padded.name, "scene-square.jpg");

        let img = padded.decode().unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (128, 128));
        // Margins are black, the middle carries the source
        assert!(img.get_pixel(64, 2).0.iter().all(|&c| c < 20));
        assert!(img.get_pixel(64, 125).0.iter().all(|&c| c < 20));
        assert!(img.get_pixel(64, 64).0.iter().all(|&c| c > 230));
    }

    #[test]
    fn test_pad_flattens_transparency() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(20, 10, Rgba([0, 0, 255, 0])));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        let source = ImageData::new("cutout.png", "image/png", bytes);

        let padded = pad_to_square(&source, 64, 95).unwrap();
        assert_eq!(padded.decode().unwrap().color(), image::ColorType::Rgb8);
    }

    #[test]
    fn test_square_source_crop_is_noop() {
        let source = solid(50, 50, [10, 200, 10]);
        let padded = pad_to_square(&source, 64, 95).unwrap();
        let cropped = crop_to_original_aspect_ratio(&padded, 50, 50, 64, 95).unwrap();
        assert_eq!(cropped, padded);
    }

    #[test]
    fn test_crop_resizes_off_size_reply() {
        let reply = solid(512, 512, [90, 90, 90]);
        let cropped = crop_to_original_aspect_ratio(&reply, 1600, 900, 1024, 95).unwrap();
        assert_eq!(cropped.dimensions().unwrap(), Dimensions::new(1024, 576));
    }

    #[test]
    fn test_draw_marker_paints_red_center() {
        let padded = pad_to_square(&solid(100, 100, [0, 0, 255]), 100, 95).unwrap();
        let marked = draw_marker(&padded, Point::new(50.0, 50.0), 95).unwrap();
        let img = marked.decode().unwrap().to_rgb8();

        let center = img.get_pixel(50, 50).0;
        assert!(center[0] > 200 && center[1] < 60 && center[2] < 60);
        // Well outside the marker the image is untouched
        let far = img.get_pixel(5, 5).0;
        assert!(far[2] > 200 && far[0] < 60);
    }

    #[test]
    fn test_draw_marker_rejects_outside_point() {
        let padded = pad_to_square(&solid(10, 10, [0, 0, 0]), 32, 95).unwrap();
        let result = draw_marker(&padded, Point::new(40.0, 5.0), 95);
        assert!(matches!(result, Err(EditorError::PlacementOutOfBounds { .. })));
    }

    proptest! {
        #[test]
        fn center_maps_to_square_center(
            w in 1u32..10_000,
            h in 1u32..10_000,
            size in 1u32..4096,
        ) {
            let abs = map_relative_to_absolute(Point::new(0.5, 0.5), w, h, size).unwrap();
            let half = size as f64 / 2.0;
            prop_assert!((abs.x - half).abs() < 1e-6, "{}x{} in {} -> {:?}", w, h, size, abs);
            prop_assert!((abs.y - half).abs() < 1e-6, "{}x{} in {} -> {:?}", w, h, size, abs);
        }

        #[test]
        fn mapped_points_stay_inside_content(
            w in 1u32..10_000,
            h in 1u32..10_000,
            size in 1u32..4096,
            rx in 0.0f64..=1.0,
            ry in 0.0f64..=1.0,
        ) {
            let rect = content_rect(w, h, size).unwrap();
            let abs = map_relative_to_absolute(Point::new(rx, ry), w, h, size).unwrap();
            prop_assert!(abs.x >= rect.x - 1e-9 && abs.x <= rect.x + rect.width + 1e-9);
            prop_assert!(abs.y >= rect.y - 1e-9 && abs.y <= rect.y + rect.height + 1e-9);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn crop_restores_aspect_ratio(
            w in 1u32..320,
            h in 1u32..320,
            size in 16u32..160,
        ) {
            let source = solid(w, h, [120, 80, 40]);
            let padded = pad_to_square(&source, size, 95).unwrap();
            let cropped = crop_to_original_aspect_ratio(&padded, w, h, size, 95).unwrap();
            let dims = cropped.dimensions().unwrap();

            let (_, _, expected_w, expected_h) = content_rect(w, h, size).unwrap().to_pixels(size);
            prop_assert_eq!((dims.width, dims.height), (expected_w, expected_h));
            prop_assert!(dims.width == size || dims.height == size);

            // Whole-pixel rounding moves the short side by at most one pixel
            let skew = (dims.width as i64 * h as i64 - dims.height as i64 * w as i64).abs();
            prop_assert!(skew <= w.max(h) as i64, "{}x{} in {} -> {:?}", w, h, size, dims);
        }
    }
}
