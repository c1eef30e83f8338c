use nalgebra::Matrix2;

use crate::error::{CatMapError, Result};
use crate::grid::{PixelGrid, Rgba, CHANNELS};
use crate::matrix::{map_reduced, TransformMatrix};

/// Precomputed destination table for one `(matrix, side)` pair.
///
/// `destinations[i]` is the row-major cell index that source cell `i` is
/// copied to. Every step of a session, period search or sequence reuses the
/// same table.
#[derive(Debug, Clone)]
pub struct TransformPlan {
    matrix: TransformMatrix,
    side: usize,
    destinations: Vec<usize>,
}

fn destination_index(reduced: &Matrix2<i64>, cell: usize, side: usize) -> usize {
    let (nx, ny) = map_reduced(reduced, cell % side, cell / side, side);
    ny * side + nx
}

#[cfg(not(target_arch = "wasm32"))]
fn build_destinations(reduced: &Matrix2<i64>, side: usize) -> Vec<usize> {
    use rayon::prelude::*;

    (0..side * side)
        .into_par_iter()
        .map(|cell| destination_index(reduced, cell, side))
        .collect()
}

#[cfg(target_arch = "wasm32")]
fn build_destinations(reduced: &Matrix2<i64>, side: usize) -> Vec<usize> {
    (0..side * side)
        .map(|cell| destination_index(reduced, cell, side))
        .collect()
}

impl TransformPlan {
    pub fn new(matrix: TransformMatrix, side: usize) -> Self {
        let reduced = matrix.reduced(side);
        Self {
            matrix,
            side,
            destinations: build_destinations(&reduced, side),
        }
    }

    pub fn matrix(&self) -> TransformMatrix {
        self.matrix
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn destination(&self, x: usize, y: usize) -> (usize, usize) {
        let cell = self.destinations[y * self.side + x];
        (cell % self.side, cell / self.side)
    }

    /// True when every destination cell receives exactly one source cell.
    pub fn is_bijective(&self) -> bool {
        let mut hit = vec![false; self.destinations.len()];
        for &dst in &self.destinations {
            if hit[dst] {
                return false;
            }
            hit[dst] = true;
        }
        true
    }

    pub fn apply(&self, grid: &PixelGrid) -> Result<PixelGrid> {
        self.apply_with_fill(grid, Rgba::TRANSPARENT)
    }

    pub fn apply_with_fill(&self, grid: &PixelGrid, fill: Rgba) -> Result<PixelGrid> {
        if grid.side() != self.side {
            return Err(CatMapError::SideMismatch {
                plan_side: self.side,
                grid_side: grid.side(),
            });
        }
        Ok(self.scatter(grid, fill))
    }

    /// Copies each source record to its destination in row-major source
    /// order, so the last writer wins on collisions. Cells nobody writes keep
    /// `fill`. Caller guarantees matching sides.
    pub(crate) fn scatter(&self, grid: &PixelGrid, fill: Rgba) -> PixelGrid {
        let src = grid.as_bytes();
        let mut out = if fill == Rgba::TRANSPARENT {
            vec![0u8; src.len()]
        } else {
            fill.to_bytes()
                .iter()
                .copied()
                .cycle()
                .take(src.len())
                .collect()
        };

        for (cell, &dst) in self.destinations.iter().enumerate() {
            let si = cell * CHANNELS;
            let di = dst * CHANNELS;
            out[di..di + CHANNELS].copy_from_slice(&src[si..si + CHANNELS]);
        }

        PixelGrid::from_raw(self.side, out)
    }
}

/// One step of the cat map. Unwritten cells (non-bijective matrices only)
/// are left transparent.
pub fn apply(grid: &PixelGrid, matrix: TransformMatrix) -> PixelGrid {
    apply_with_fill(grid, matrix, Rgba::TRANSPARENT)
}

pub fn apply_with_fill(grid: &PixelGrid, matrix: TransformMatrix, fill: Rgba) -> PixelGrid {
    TransformPlan::new(matrix, grid.side()).scatter(grid, fill)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{gradient, grids_equal};
    use proptest::prelude::*;

    fn arb_grid() -> impl Strategy<Value = PixelGrid> {
        (2usize..9).prop_flat_map(|side| {
            prop::collection::vec(any::<u8>(), side * side * CHANNELS)
                .prop_map(move |data| PixelGrid::new(side, data).unwrap())
        })
    }

    fn arb_matrix() -> impl Strategy<Value = TransformMatrix> {
        (-20i64..20, -20i64..20, -20i64..20, -20i64..20)
            .prop_map(|(a, b, c, d)| TransformMatrix::new(a, b, c, d))
    }

    #[test]
    fn test_identity_leaves_grid_unchanged() {
        let grid = gradient(6);
        let out = apply(&grid, TransformMatrix::IDENTITY);
        assert!(grids_equal(&grid, &out));
        assert!(!out.shares_buffer(&grid));
    }

    #[test]
    fn test_classic_moves_cells() {
        let grid = gradient(4);
        let out = apply(&grid, TransformMatrix::CLASSIC);
        // source (3, 2) lands on (1, 3)
        assert_eq!(out.pixel(1, 3), grid.pixel(3, 2));
        // origin is fixed
        assert_eq!(out.pixel(0, 0), grid.pixel(0, 0));
    }

    #[test]
    fn test_input_not_mutated() {
        let grid = gradient(5);
        let before = grid.to_vec();
        let _ = apply(&grid, TransformMatrix::CLASSIC);
        assert_eq!(grid.as_bytes(), &before[..]);
    }

    #[test]
    fn test_singular_matrix_collides_and_fills() {
        let side = 4;
        let grid = gradient(side);
        let singular = TransformMatrix::new(1, 0, 0, 0);
        let out = apply(&grid, singular);

        for x in 0..side {
            // every row collapses onto row 0; the last row in scan order wins
            assert_eq!(out.pixel(x, 0), grid.pixel(x, side - 1));
            for y in 1..side {
                assert_eq!(out.pixel(x, y), Some(Rgba::TRANSPARENT));
            }
        }

        let filled = apply_with_fill(&grid, singular, Rgba::WHITE);
        assert_eq!(filled.pixel(2, 3), Some(Rgba::WHITE));
        assert_eq!(filled.pixel(2, 0), grid.pixel(2, side - 1));
    }

    #[test]
    fn test_plan_bijectivity() {
        assert!(TransformPlan::new(TransformMatrix::CLASSIC, 10).is_bijective());
        assert!(TransformPlan::new(TransformMatrix::new(2, 1, 1, 1), 7).is_bijective());
        // determinant 2 is not a unit mod 4
        assert!(!TransformPlan::new(TransformMatrix::new(2, 0, 0, 1), 4).is_bijective());
        assert!(!TransformPlan::new(TransformMatrix::new(1, 0, 0, 0), 3).is_bijective());
    }

    #[test]
    fn test_plan_destination_matches_matrix() {
        let m = TransformMatrix::new(3, -2, 5, 7);
        let plan = TransformPlan::new(m, 9);
        for y in 0..9 {
            for x in 0..9 {
                assert_eq!(plan.destination(x, y), m.map_point(x, y, 9));
            }
        }
    }

    #[test]
    fn test_plan_rejects_other_side() {
        let plan = TransformPlan::new(TransformMatrix::CLASSIC, 4);
        let err = plan.apply(&gradient(5)).unwrap_err();
        assert!(matches!(
            err,
            CatMapError::SideMismatch {
                plan_side: 4,
                grid_side: 5
            }
        ));
    }

    proptest! {
        #[test]
        fn prop_apply_is_deterministic(grid in arb_grid(), m in arb_matrix()) {
            prop_assert_eq!(apply(&grid, m), apply(&grid, m));
        }

        #[test]
        fn prop_identity_is_noop(grid in arb_grid()) {
            prop_assert_eq!(apply(&grid, TransformMatrix::IDENTITY), grid);
        }

        #[test]
        fn prop_plan_agrees_with_apply(grid in arb_grid(), m in arb_matrix()) {
            let plan = TransformPlan::new(m, grid.side());
            prop_assert_eq!(plan.apply(&grid).unwrap(), apply(&grid, m));
        }

        #[test]
        fn prop_bijective_step_permutes_cells(grid in arb_grid(), m in arb_matrix()) {
            let plan = TransformPlan::new(m, grid.side());
            prop_assume!(plan.is_bijective());
            let out = plan.apply(&grid).unwrap();
            let mut before: Vec<&[u8]> = grid.as_bytes().chunks(CHANNELS).collect();
            let mut after: Vec<&[u8]> = out.as_bytes().chunks(CHANNELS).collect();
            before.sort();
            after.sort();
            prop_assert_eq!(before, after);
        }
    }
}
