//! Point-level model of the step-by-step walkthrough: a small lattice of
//! labelled points pushed through the map one application at a time.

use serde::{Deserialize, Serialize};

use crate::error::{CatMapError, Result};
use crate::grid::MIN_SIDE;
use crate::matrix::TransformMatrix;

pub const DIDACTIC_SIDE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatticePoint {
    pub x: usize,
    pub y: usize,
    /// Stable label assigned at construction, `x * side + y`.
    pub index: usize,
}

/// Where a point lands under the linear map before wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearImage {
    pub x: i64,
    pub y: i64,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct DidacticLattice {
    side: usize,
    matrix: TransformMatrix,
    original: Vec<LatticePoint>,
    points: Vec<LatticePoint>,
    iteration: usize,
}

impl DidacticLattice {
    pub fn new(side: usize) -> Result<Self> {
        Self::with_matrix(side, TransformMatrix::CLASSIC)
    }

    pub fn with_matrix(side: usize, matrix: TransformMatrix) -> Result<Self> {
        if side < MIN_SIDE {
            return Err(CatMapError::SideTooSmall {
                side,
                min: MIN_SIDE,
            });
        }
        let original: Vec<LatticePoint> = (0..side)
            .flat_map(|i| {
                (0..side).map(move |j| LatticePoint {
                    x: i,
                    y: j,
                    index: i * side + j,
                })
            })
            .collect();
        Ok(Self {
            side,
            matrix,
            points: original.clone(),
            original,
            iteration: 0,
        })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn matrix(&self) -> TransformMatrix {
        self.matrix
    }

    pub fn points(&self) -> &[LatticePoint] {
        &self.points
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn is_original(&self) -> bool {
        self.points == self.original
    }

    /// Positions after one more application, without moving the lattice.
    pub fn next_preview(&self) -> Vec<LatticePoint> {
        self.points
            .iter()
            .map(|p| {
                let (x, y) = self.matrix.map_point(p.x, p.y, self.side);
                LatticePoint { x, y, index: p.index }
            })
            .collect()
    }

    pub fn linear_image(&self) -> Vec<LinearImage> {
        self.points
            .iter()
            .map(|p| {
                let v = self.matrix.linear_image(p.x as i64, p.y as i64);
                LinearImage {
                    x: v.x,
                    y: v.y,
                    index: p.index,
                }
            })
            .collect()
    }

    pub fn apply(&mut self) {
        self.points = self.next_preview();
        self.iteration += 1;
    }

    pub fn reset(&mut self) {
        self.points = self.original.clone();
        self.iteration = 0;
    }

    /// Hue in degrees; points sharing a starting row share a hue.
    pub fn hue(&self, index: usize) -> f64 {
        let j = (index % self.side) as f64;
        let n = self.side as f64;
        (510.0 + j * 50.0 / n + j * 105.0 / n) % 360.0
    }

    pub fn css_color(&self, index: usize) -> String {
        format!("hsl({}, 60%, 50%)", self.hue(index))
    }
}
