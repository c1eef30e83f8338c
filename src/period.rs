use serde::{Deserialize, Serialize};
use std::fmt;

use crate::grid::{grids_equal, PixelGrid, Rgba};
use crate::matrix::TransformMatrix;
use crate::transform::TransformPlan;

/// Hard ceiling on the number of applications a single search may perform.
pub const MAX_PERIOD_SEARCH_LIMIT: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodResult {
    Found { period: usize },
    /// No return within `limit` applications. `capped` is set when the
    /// requested limit exceeded [`MAX_PERIOD_SEARCH_LIMIT`].
    NotFound { limit: usize, capped: bool },
}

impl PeriodResult {
    pub fn period(&self) -> Option<usize> {
        match self {
            PeriodResult::Found { period } => Some(*period),
            PeriodResult::NotFound { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.period().is_some()
    }
}

impl fmt::Display for PeriodResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodResult::Found { period } => write!(f, "period = {}", period),
            PeriodResult::NotFound { .. } => write!(f, "period = >limit"),
        }
    }
}

/// How many applications a period search may spend for a given side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PeriodLimitPolicy {
    Fixed {
        limit: usize,
    },
    /// `small_limit` for sides up to `max_side`, `large_limit` beyond it.
    SizeThreshold {
        max_side: usize,
        small_limit: usize,
        large_limit: usize,
    },
    /// Spend at most `cell_steps` cell copies, i.e. `cell_steps / N^2`
    /// applications, clamped to `[min_limit, max_limit]`.
    WorkBudget {
        cell_steps: u64,
        min_limit: usize,
        max_limit: usize,
    },
}

impl Default for PeriodLimitPolicy {
    fn default() -> Self {
        PeriodLimitPolicy::SizeThreshold {
            max_side: 500,
            small_limit: 1500,
            large_limit: 300,
        }
    }
}

impl PeriodLimitPolicy {
    pub fn limit_for(&self, side: usize) -> usize {
        match *self {
            PeriodLimitPolicy::Fixed { limit } => limit,
            PeriodLimitPolicy::SizeThreshold {
                max_side,
                small_limit,
                large_limit,
            } => {
                if side <= max_side {
                    small_limit
                } else {
                    large_limit
                }
            }
            PeriodLimitPolicy::WorkBudget {
                cell_steps,
                min_limit,
                max_limit,
            } => {
                let cells = (side as u64).saturating_mul(side as u64).max(1);
                let steps = usize::try_from(cell_steps / cells).unwrap_or(usize::MAX);
                steps.clamp(min_limit, max_limit.max(min_limit))
            }
        }
    }
}

/// Smallest `i` in `1..=limit` with `transform^i(original) == original`.
pub fn detect_period(original: &PixelGrid, matrix: TransformMatrix, limit: usize) -> PeriodResult {
    detect_period_with_fill(original, matrix, limit, Rgba::TRANSPARENT)
}

pub fn detect_period_with_fill(
    original: &PixelGrid,
    matrix: TransformMatrix,
    limit: usize,
    fill: Rgba,
) -> PeriodResult {
    let plan = TransformPlan::new(matrix, original.side());
    detect_with_plan(original, &plan, limit, fill)
}

pub(crate) fn detect_with_plan(
    original: &PixelGrid,
    plan: &TransformPlan,
    limit: usize,
    fill: Rgba,
) -> PeriodResult {
    let effective = limit.min(MAX_PERIOD_SEARCH_LIMIT);
    let mut current = original.clone();

    for i in 1..=effective {
        current = plan.scatter(&current, fill);
        if grids_equal(&current, original) {
            console_log!(
                "period search: matrix {} on {}x{} returns after {} steps",
                plan.matrix(),
                plan.side(),
                plan.side(),
                i
            );
            return PeriodResult::Found { period: i };
        }
    }

    console_log!(
        "period search: matrix {} on {}x{} did not return within {} steps",
        plan.matrix(),
        plan.side(),
        plan.side(),
        effective
    );
    PeriodResult::NotFound {
        limit: effective,
        capped: limit > MAX_PERIOD_SEARCH_LIMIT,
    }
}

/// Checks that `period` applications return to `original` and no fewer do.
pub fn verify_minimal_period(original: &PixelGrid, matrix: TransformMatrix, period: usize) -> bool {
    if period == 0 {
        return false;
    }
    let plan = TransformPlan::new(matrix, original.side());
    let mut current = original.clone();
    for i in 1..=period {
        current = plan.scatter(&current, Rgba::TRANSPARENT);
        if grids_equal(&current, original) {
            return i == period;
        }
    }
    false
}

/// Period search for several matrices over the same image.
#[cfg(not(target_arch = "wasm32"))]
pub fn detect_periods(
    original: &PixelGrid,
    matrices: &[TransformMatrix],
    limit: usize,
) -> Vec<PeriodResult> {
    use rayon::prelude::*;

    matrices
        .par_iter()
        .map(|&m| detect_period(original, m, limit))
        .collect()
}

#[cfg(target_arch = "wasm32")]
pub fn detect_periods(
    original: &PixelGrid,
    matrices: &[TransformMatrix],
    limit: usize,
) -> Vec<PeriodResult> {
    matrices
        .iter()
        .map(|&m| detect_period(original, m, limit))
        .collect()
}

#[derive(Debug, Clone)]
struct CacheEntry {
    original: PixelGrid,
    matrix: TransformMatrix,
    limit: usize,
    fill: Rgba,
    result: PeriodResult,
}

/// Remembers the last period search, keyed by image, matrix, limit and fill.
#[derive(Debug, Clone, Default)]
pub struct PeriodCache {
    entry: Option<CacheEntry>,
    hits: usize,
    misses: usize,
}

impl PeriodCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_detect(
        &mut self,
        original: &PixelGrid,
        matrix: TransformMatrix,
        limit: usize,
        fill: Rgba,
    ) -> PeriodResult {
        if let Some(entry) = &self.entry {
            if entry.matrix == matrix
                && entry.limit == limit
                && entry.fill == fill
                && grids_equal(&entry.original, original)
            {
                self.hits += 1;
                return entry.result;
            }
        }

        self.misses += 1;
        let result = detect_period_with_fill(original, matrix, limit, fill);
        self.entry = Some(CacheEntry {
            original: original.clone(),
            matrix,
            limit,
            fill,
            result,
        });
        result
    }

    pub fn cached(&self) -> Option<PeriodResult> {
        self.entry.as_ref().map(|e| e.result)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::gradient;
    use crate::transform::apply;

    fn apply_n(grid: &PixelGrid, m: TransformMatrix, n: usize) -> PixelGrid {
        (0..n).fold(grid.clone(), |g, _| apply(&g, m))
    }

    #[test]
    fn test_classic_period_small_sides() {
        // the classic matrix's order mod N is the Pisano period of N
        for (side, expected) in [(2, 3), (3, 8), (4, 6), (5, 20), (10, 60)] {
            let grid = gradient(side);
            let result = detect_period(&grid, TransformMatrix::CLASSIC, 1500);
            assert_eq!(result, PeriodResult::Found { period: expected }, "side {side}");
        }
    }

    #[test]
    fn test_reported_period_verified_by_direct_iteration() {
        let grid = gradient(4);
        let period = detect_period(&grid, TransformMatrix::CLASSIC, 100)
            .period()
            .unwrap();
        assert_eq!(apply_n(&grid, TransformMatrix::CLASSIC, period), grid);
        for k in 1..period {
            assert_ne!(apply_n(&grid, TransformMatrix::CLASSIC, k), grid, "k = {k}");
        }
        assert!(verify_minimal_period(&grid, TransformMatrix::CLASSIC, period));
        assert!(!verify_minimal_period(&grid, TransformMatrix::CLASSIC, 2 * period));
        assert!(!verify_minimal_period(&grid, TransformMatrix::CLASSIC, 0));
    }

    #[test]
    fn test_standard_cat_map_period() {
        let grid = gradient(4);
        let standard = TransformMatrix::new(2, 1, 1, 1);
        assert_eq!(detect_period(&grid, standard, 100).period(), Some(3));
    }

    #[test]
    fn test_uniform_grid_returns_immediately() {
        let grid = PixelGrid::filled(8, Rgba::TEAL).unwrap();
        assert_eq!(detect_period(&grid, TransformMatrix::CLASSIC, 10).period(), Some(1));
    }

    #[test]
    fn test_singular_matrix_not_found() {
        let grid = gradient(5);
        let result = detect_period(&grid, TransformMatrix::new(1, 0, 0, 0), 50);
        assert_eq!(
            result,
            PeriodResult::NotFound {
                limit: 50,
                capped: false
            }
        );
        assert_eq!(result.to_string(), "period = >limit");
    }

    #[test]
    fn test_limit_is_capped() {
        let grid = gradient(2);
        let result = detect_period(
            &grid,
            TransformMatrix::new(1, 0, 0, 0),
            MAX_PERIOD_SEARCH_LIMIT + 1,
        );
        assert_eq!(
            result,
            PeriodResult::NotFound {
                limit: MAX_PERIOD_SEARCH_LIMIT,
                capped: true
            }
        );
    }

    #[test]
    fn test_period_beyond_limit_not_found() {
        let grid = gradient(10);
        let result = detect_period(&grid, TransformMatrix::CLASSIC, 59);
        assert!(!result.is_found());
    }

    #[test]
    fn test_limit_policies() {
        let default = PeriodLimitPolicy::default();
        assert_eq!(default.limit_for(16), 1500);
        assert_eq!(default.limit_for(500), 1500);
        assert_eq!(default.limit_for(501), 300);

        let budget = PeriodLimitPolicy::WorkBudget {
            cell_steps: 1_000_000,
            min_limit: 10,
            max_limit: 2000,
        };
        assert_eq!(budget.limit_for(10), 2000);
        assert_eq!(budget.limit_for(100), 100);
        assert_eq!(budget.limit_for(500), 10);

        assert_eq!(PeriodLimitPolicy::Fixed { limit: 7 }.limit_for(300), 7);
    }

    #[test]
    fn test_policy_from_json() {
        let policy: PeriodLimitPolicy =
            serde_json::from_str(r#"{"policy":"fixed","limit":42}"#).unwrap();
        assert_eq!(policy, PeriodLimitPolicy::Fixed { limit: 42 });
    }

    #[test]
    fn test_cache_reuses_matching_triple() {
        let grid = gradient(4);
        let mut cache = PeriodCache::new();
        let first = cache.get_or_detect(&grid, TransformMatrix::CLASSIC, 100, Rgba::TRANSPARENT);
        let copy = PixelGrid::new(4, grid.to_vec()).unwrap();
        let second = cache.get_or_detect(&copy, TransformMatrix::CLASSIC, 100, Rgba::TRANSPARENT);
        assert_eq!(first, second);
        assert_eq!((cache.hits(), cache.misses()), (1, 1));

        let third = cache.get_or_detect(&grid, TransformMatrix::new(2, 1, 1, 1), 100, Rgba::TRANSPARENT);
        assert_eq!(third.period(), Some(3));
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.cached(), Some(third));

        cache.invalidate();
        assert_eq!(cache.cached(), None);
    }

    #[test]
    fn test_batch_matches_individual() {
        let grid = gradient(5);
        let matrices = [
            TransformMatrix::CLASSIC,
            TransformMatrix::IDENTITY,
            TransformMatrix::new(2, 1, 1, 1),
            TransformMatrix::new(1, 0, 0, 0),
        ];
        let batch = detect_periods(&grid, &matrices, 200);
        let single: Vec<_> = matrices.iter().map(|&m| detect_period(&grid, m, 200)).collect();
        assert_eq!(batch, single);
        assert_eq!(batch[1].period(), Some(1));
    }
}
