//! Placeholder tile for failed fetches.
//!
//! When a tile fetch fails (HTTP error, timeout, undecodable body) the
//! service returns a solid yellow (255, 255, 0) PNG of the expected tile
//! dimensions so the map shows a clearly visible gap marker instead of
//! aborting the whole grid.
//!
//! # Static Placeholder
//!
//! A singleton placeholder at the standard 256×256 size is generated at
//! first access and cached for the lifetime of the application, so the
//! failure path never allocates or fails after startup.

use crate::provider::TILE_SIZE_PX;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::OnceLock;

/// Static placeholder cache - generated once, never fails after first success.
static DEFAULT_PLACEHOLDER: OnceLock<Vec<u8>> = OnceLock::new();

/// Placeholder fill colour (solid yellow).
const PLACEHOLDER_COLOR: Rgba<u8> = Rgba([255, 255, 0, 255]);

/// Generates a solid yellow placeholder PNG of the given edge length.
///
/// # Errors
///
/// Returns an error if PNG encoding fails (should not happen for a solid
/// colour image).
pub fn generate_placeholder(size: u32) -> Result<Vec<u8>, image::ImageError> {
    let image = RgbaImage::from_pixel(size, size, PLACEHOLDER_COLOR);

    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}

/// Returns the standard 256×256 placeholder, guaranteed non-empty.
///
/// The placeholder is generated once at first access and cached. If the
/// initial generation fails (which would indicate a broken PNG encoder),
/// this panics at that first access rather than handing corrupt data to
/// the renderer.
pub fn default_placeholder() -> Vec<u8> {
    DEFAULT_PLACEHOLDER
        .get_or_init(|| {
            generate_placeholder(TILE_SIZE_PX)
                .expect("Failed to generate default placeholder tile")
        })
        .clone()
}

/// Returns a placeholder of the given edge length.
///
/// Uses the cached default for the standard size; other sizes are
/// generated on demand, falling back to the default if encoding fails.
pub fn placeholder_for_size(size: u32) -> Vec<u8> {
    if size == TILE_SIZE_PX {
        return default_placeholder();
    }
    match generate_placeholder(size) {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(size = size, error = %e, "placeholder generation failed, using default size");
            default_placeholder()
        }
    }
}

/// Validates fetched tile bytes, substituting the placeholder when they
/// are not a decodable image of the expected dimensions.
///
/// This keeps undecodable or truncated provider responses out of the
/// cache and away from the renderer.
pub fn validate_tile_or_placeholder(data: Vec<u8>, size: u32, context: &str) -> (Vec<u8>, bool) {
    if data.is_empty() {
        tracing::warn!(context = context, "tile validation failed: empty body");
        return (placeholder_for_size(size), true);
    }

    match image::load_from_memory(&data) {
        Ok(decoded) => {
            if decoded.width() != size || decoded.height() != size {
                tracing::warn!(
                    context = context,
                    width = decoded.width(),
                    height = decoded.height(),
                    expected = size,
                    "tile validation failed: unexpected dimensions"
                );
                return (placeholder_for_size(size), true);
            }
            (data, false)
        }
        Err(e) => {
            tracing::warn!(context = context, error = %e, "tile validation failed: undecodable image");
            (placeholder_for_size(size), true)
        }
    }
}
