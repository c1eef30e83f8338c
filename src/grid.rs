use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{CatMapError, Result};

/// Smallest side length a grid may have.
pub const MIN_SIDE: usize = 2;

/// Bytes per cell: red, green, blue, alpha.
pub const CHANNELS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const WHITE: Rgba = Rgba::new(0xff, 0xff, 0xff, 0xff);
    /// Fallback fill used when no source image is available (`#3bbfbf`).
    pub const TEAL: Rgba = Rgba::new(0x3b, 0xbf, 0xbf, 0xff);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn to_bytes(self) -> [u8; CHANNELS] {
        [self.r, self.g, self.b, self.a]
    }

    fn from_slice(px: &[u8]) -> Self {
        Self::new(px[0], px[1], px[2], px[3])
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::TRANSPARENT
    }
}

/// Immutable N×N RGBA image, stored row-major.
///
/// Cell `(x, y)` (x = column, y = row) lives at bytes `4 * (y * N + x)..+4`.
/// The buffer is shared, so cloning a grid for a history snapshot never
/// copies pixels.
#[derive(Debug, Clone, Eq)]
pub struct PixelGrid {
    side: usize,
    data: Arc<[u8]>,
}

fn expected_len(side: usize) -> Result<usize> {
    if side < MIN_SIDE {
        return Err(CatMapError::SideTooSmall {
            side,
            min: MIN_SIDE,
        });
    }
    Ok(side * side * CHANNELS)
}

impl PixelGrid {
    pub fn new(side: usize, data: Vec<u8>) -> Result<Self> {
        let expected = expected_len(side)?;
        if data.len() != expected {
            return Err(CatMapError::ShapeMismatch {
                side,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self::from_raw(side, data))
    }

    pub fn filled(side: usize, color: Rgba) -> Result<Self> {
        let len = expected_len(side)?;
        let data = color
            .to_bytes()
            .iter()
            .copied()
            .cycle()
            .take(len)
            .collect();
        Ok(Self::from_raw(side, data))
    }

    /// Builds a grid by evaluating `f(x, y)` for every cell in row-major order.
    pub fn from_fn(side: usize, mut f: impl FnMut(usize, usize) -> Rgba) -> Result<Self> {
        let len = expected_len(side)?;
        let mut data = Vec::with_capacity(len);
        for y in 0..side {
            for x in 0..side {
                data.extend_from_slice(&f(x, y).to_bytes());
            }
        }
        Ok(Self::from_raw(side, data))
    }

    /// Caller guarantees `data.len() == 4 * side * side` and `side >= MIN_SIDE`.
    pub(crate) fn from_raw(side: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), side * side * CHANNELS);
        Self {
            side,
            data: data.into(),
        }
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn cell_count(&self) -> usize {
        self.side * self.side
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.data.to_vec()
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.side || y >= self.side {
            return None;
        }
        let offset = (y * self.side + x) * CHANNELS;
        Some(Rgba::from_slice(&self.data[offset..offset + CHANNELS]))
    }

    /// True when both grids point at the same pixel buffer.
    pub fn shares_buffer(&self, other: &PixelGrid) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

/// Exact equality: same side and every byte of every cell identical.
pub fn grids_equal(a: &PixelGrid, b: &PixelGrid) -> bool {
    a.side == b.side && (a.shares_buffer(b) || a.data == b.data)
}

impl PartialEq for PixelGrid {
    fn eq(&self, other: &Self) -> bool {
        grids_equal(self, other)
    }
}

/// Grid whose cells are pairwise distinct for `side <= 256`.
#[cfg(test)]
pub(crate) fn gradient(side: usize) -> PixelGrid {
    PixelGrid::from_fn(side, |x, y| {
        Rgba::new(x as u8, y as u8, ((x * 7 + y * 13) % 256) as u8, 255)
    })
    .unwrap()
}
