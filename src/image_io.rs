//! Getting pixels into and out of the engine: decoding, rescaling, the
//! fallback image, PNG export and export file names.

use image::{imageops, imageops::FilterType, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::error::{CatMapError, Result};
use crate::grid::{PixelGrid, Rgba, CHANNELS, MIN_SIDE};

pub const MAX_SIDE: usize = 500;
pub const DEFAULT_SIDE: usize = 16;
pub const DEFAULT_EXPORT_STEM: &str = "arnold-cat-map";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideClamp {
    pub side: usize,
    /// The request was above [`MAX_SIDE`]; UIs surface this as a warning.
    pub exceeded_max: bool,
}

pub fn clamp_side(requested: i64) -> SideClamp {
    let side = requested.clamp(MIN_SIDE as i64, MAX_SIDE as i64) as usize;
    SideClamp {
        side,
        exceeded_max: requested > MAX_SIDE as i64,
    }
}

/// Unparsable input means [`DEFAULT_SIDE`].
pub fn parse_side(input: &str) -> SideClamp {
    input
        .trim()
        .parse::<i64>()
        .map(clamp_side)
        .unwrap_or_else(|_| clamp_side(DEFAULT_SIDE as i64))
}

/// Solid teal grid used when no image is available.
pub fn fallback_grid(side: usize) -> Result<PixelGrid> {
    PixelGrid::filled(side, Rgba::TEAL)
}

/// Flattens alpha against an opaque white background.
fn composite_over_white(image: &mut RgbaImage) {
    for px in image.pixels_mut() {
        let alpha = px[3] as u32;
        for c in 0..3 {
            px[c] = ((px[c] as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        }
        px[3] = 255;
    }
}

fn grid_from_image(mut image: RgbaImage, side: usize) -> Result<PixelGrid> {
    if side < MIN_SIDE {
        return Err(CatMapError::SideTooSmall {
            side,
            min: MIN_SIDE,
        });
    }
    composite_over_white(&mut image);
    let resized = imageops::resize(&image, side as u32, side as u32, FilterType::Nearest);
    PixelGrid::new(side, resized.into_raw())
}

/// Rescales a `width x height` RGBA buffer to a `side x side` grid with
/// nearest-neighbour sampling, over a white background.
pub fn grid_from_rgba(width: u32, height: u32, rgba: Vec<u8>, side: usize) -> Result<PixelGrid> {
    let expected = width as usize * height as usize * CHANNELS;
    let actual = rgba.len();
    let image = RgbaImage::from_raw(width, height, rgba).ok_or(CatMapError::SourceMismatch {
        width,
        height,
        expected,
        actual,
    })?;
    grid_from_image(image, side)
}

/// Decodes PNG, JPEG or GIF bytes into a `side x side` grid.
pub fn decode_image(bytes: &[u8], side: usize) -> Result<PixelGrid> {
    let decoded = image::load_from_memory(bytes).map_err(CatMapError::Decode)?;
    console_log!(
        "decoded {}x{} image, rescaling to {}x{}",
        decoded.width(),
        decoded.height(),
        side,
        side
    );
    grid_from_image(decoded.to_rgba8(), side)
}

pub fn encode_png(grid: &PixelGrid) -> Result<Vec<u8>> {
    let side = grid.side();
    let image = RgbaImage::from_raw(side as u32, side as u32, grid.to_vec()).ok_or(
        CatMapError::ShapeMismatch {
            side,
            expected: side * side * CHANNELS,
            actual: grid.as_bytes().len(),
        },
    )?;
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(CatMapError::Encode)?;
    Ok(out.into_inner())
}

/// `"{stem}-iteration-{n}.png"`, where the stem is the source file name
/// without its last extension.
pub fn export_file_name(source_name: Option<&str>, iteration: usize) -> String {
    let stem = match source_name {
        Some(name) if !name.is_empty() => strip_extension(name),
        _ => DEFAULT_EXPORT_STEM,
    };
    format!("{}-iteration-{}.png", stem, iteration)
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() && !name[dot + 1..].contains('/') => &name[..dot],
        _ => name,
    }
}
