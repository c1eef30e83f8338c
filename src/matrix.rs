use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 2x2 integer matrix of the map `(x, y) -> (a11 x + a12 y, a21 x + a22 y) mod N`.
///
/// Entries may be negative or exceed N; nothing requires the matrix to be
/// invertible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformMatrix {
    pub a11: i64,
    pub a12: i64,
    pub a21: i64,
    pub a22: i64,
}

impl TransformMatrix {
    /// The classic cat map `[[1, 1], [1, 0]]`.
    pub const CLASSIC: TransformMatrix = TransformMatrix::new(1, 1, 1, 0);
    pub const IDENTITY: TransformMatrix = TransformMatrix::new(1, 0, 0, 1);

    pub const fn new(a11: i64, a12: i64, a21: i64, a22: i64) -> Self {
        Self { a11, a12, a21, a22 }
    }

    /// Parses four integer fields in `a11, a12, a21, a22` order. A field that
    /// does not parse takes the classic matrix's entry at that position.
    pub fn parse_fields(fields: [&str; 4]) -> Self {
        let defaults = Self::CLASSIC.entries();
        let mut entries = [0i64; 4];
        for (slot, (field, default)) in entries.iter_mut().zip(fields.iter().zip(defaults)) {
            *slot = field.trim().parse().unwrap_or(default);
        }
        Self::new(entries[0], entries[1], entries[2], entries[3])
    }

    pub fn entries(&self) -> [i64; 4] {
        [self.a11, self.a12, self.a21, self.a22]
    }

    pub fn linear(&self) -> Matrix2<i64> {
        Matrix2::new(self.a11, self.a12, self.a21, self.a22)
    }

    /// Entries reduced into `[0, side)`. Multiplying by the reduced matrix
    /// gives the same residues as the raw one without overflow.
    pub fn reduced(&self, side: usize) -> Matrix2<i64> {
        let n = side as i64;
        self.linear().map(|a| a.rem_euclid(n))
    }

    /// Image of `(x, y)` under the linear map, before any modulo.
    pub fn linear_image(&self, x: i64, y: i64) -> Vector2<i64> {
        self.linear() * Vector2::new(x, y)
    }

    /// Destination of cell `(x, y)` on a `side`-sized torus.
    pub fn map_point(&self, x: usize, y: usize, side: usize) -> (usize, usize) {
        map_reduced(&self.reduced(side), x, y, side)
    }
}

pub(crate) fn map_reduced(reduced: &Matrix2<i64>, x: usize, y: usize, side: usize) -> (usize, usize) {
    let n = side as i64;
    let image = reduced * Vector2::new(x as i64, y as i64);
    (image.x.rem_euclid(n) as usize, image.y.rem_euclid(n) as usize)
}

impl Default for TransformMatrix {
    fn default() -> Self {
        Self::CLASSIC
    }
}

impl fmt::Display for TransformMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[[{}, {}], [{}, {}]]",
            self.a11, self.a12, self.a21, self.a22
        )
    }
}
