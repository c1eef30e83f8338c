use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::grid::PixelGrid;
use crate::image_io::export_file_name;
use crate::matrix::TransformMatrix;
use crate::period::{PeriodCache, PeriodResult};
use crate::transform::TransformPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Moved to `position`; `reused` is true when the snapshot came from history.
    Advanced { position: usize, reused: bool },
    /// Reached the known period and looped back to the original.
    Wrapped { period: usize },
}

/// Interactive stepping session over one `(image, matrix)` pair.
///
/// `history[k]` is the grid after `k` applications; `history[0]` is always
/// the original and `history[position]` is the grid on display. History is
/// contiguous and only ever grows at the frontier.
#[derive(Debug, Clone)]
pub struct CatMapSession {
    original: PixelGrid,
    matrix: TransformMatrix,
    config: SessionConfig,
    plan: TransformPlan,
    history: Vec<PixelGrid>,
    position: usize,
    period: PeriodResult,
    period_cache: PeriodCache,
    source_name: Option<String>,
}

impl CatMapSession {
    pub fn new(original: PixelGrid, matrix: TransformMatrix) -> Self {
        Self::with_config(original, matrix, SessionConfig::default())
    }

    pub fn with_config(original: PixelGrid, matrix: TransformMatrix, config: SessionConfig) -> Self {
        let plan = TransformPlan::new(matrix, original.side());
        let mut session = Self {
            history: vec![original.clone()],
            original,
            matrix,
            config,
            plan,
            position: 0,
            period: PeriodResult::NotFound {
                limit: 0,
                capped: false,
            },
            period_cache: PeriodCache::new(),
            source_name: None,
        };
        session.on_matrix_or_image_change();
        session
    }

    pub fn step_forward(&mut self) -> StepOutcome {
        let next = self.position + 1;
        let reused = next < self.history.len();
        if !reused {
            let grid = self.plan.scatter(&self.history[self.position], self.config.fill);
            self.history.truncate(next);
            self.history.push(grid);
        }
        self.position = next;

        if let Some(period) = self.period.period() {
            if self.position >= period {
                self.reset();
                return StepOutcome::Wrapped { period };
            }
        }

        StepOutcome::Advanced {
            position: self.position,
            reused,
        }
    }

    /// Returns false at position 0, where nothing changes.
    pub fn step_backward(&mut self) -> bool {
        if self.position == 0 {
            return false;
        }
        self.position -= 1;
        true
    }

    pub fn reset(&mut self) {
        self.history.truncate(1);
        self.position = 0;
    }

    /// Drops all history and re-resolves the period for the current inputs.
    pub fn on_matrix_or_image_change(&mut self) {
        if self.plan.matrix() != self.matrix || self.plan.side() != self.original.side() {
            self.plan = TransformPlan::new(self.matrix, self.original.side());
        }
        self.history.clear();
        self.history.push(self.original.clone());
        self.position = 0;

        let limit = self.period_limit();
        self.period = self
            .period_cache
            .get_or_detect(&self.original, self.matrix, limit, self.config.fill);

        console_log!(
            "session rebuilt: {}x{} grid, matrix {}, {}",
            self.side(),
            self.side(),
            self.matrix,
            self.period
        );
    }

    pub fn set_matrix(&mut self, matrix: TransformMatrix) {
        self.matrix = matrix;
        self.on_matrix_or_image_change();
    }

    /// Replaces the source image; a new side length is picked up from `original`.
    pub fn set_image(&mut self, original: PixelGrid, source_name: Option<String>) {
        self.original = original;
        self.source_name = source_name;
        self.on_matrix_or_image_change();
    }

    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
        self.on_matrix_or_image_change();
    }

    pub fn current(&self) -> &PixelGrid {
        &self.history[self.position]
    }

    pub fn original(&self) -> &PixelGrid {
        &self.original
    }

    pub fn snapshot(&self, index: usize) -> Option<&PixelGrid> {
        self.history.get(index)
    }

    pub fn matrix(&self) -> TransformMatrix {
        self.matrix
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn side(&self) -> usize {
        self.original.side()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn period(&self) -> PeriodResult {
        self.period
    }

    pub fn period_limit(&self) -> usize {
        self.config.period_limit.limit_for(self.side())
    }

    pub fn period_cache(&self) -> &PeriodCache {
        &self.period_cache
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub fn caption(&self) -> String {
        match self.period.period() {
            Some(p) => format!("Iteration {} of {}", self.position, p),
            None => format!("Iteration {}", self.position),
        }
    }

    /// Fraction of the current cycle completed, when the period is known.
    pub fn progress(&self) -> Option<f64> {
        self.period
            .period()
            .map(|p| (self.position % p) as f64 / p as f64)
    }

    pub fn export_file_name(&self) -> String {
        export_file_name(self.source_name.as_deref(), self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{gradient, Rgba};
    use crate::period::PeriodLimitPolicy;
    use crate::transform::apply;

    fn apply_n(grid: &PixelGrid, m: TransformMatrix, n: usize) -> PixelGrid {
        (0..n).fold(grid.clone(), |g, _| apply(&g, m))
    }

    #[test]
    fn test_new_session_starts_at_original() {
        let grid = gradient(4);
        let session = CatMapSession::new(grid.clone(), TransformMatrix::CLASSIC);
        assert_eq!(session.position(), 0);
        assert_eq!(session.history_len(), 1);
        assert_eq!(session.current(), &grid);
        assert_eq!(session.period().period(), Some(6));
        assert_eq!(session.period_limit(), 1500);
    }

    #[test]
    fn test_forward_back_forward_matches_direct() {
        let grid = gradient(10);
        let m = TransformMatrix::CLASSIC;
        let mut session = CatMapSession::new(grid.clone(), m);

        for _ in 0..5 {
            assert!(matches!(
                session.step_forward(),
                StepOutcome::Advanced { reused: false, .. }
            ));
        }
        assert!(session.step_backward());
        assert!(session.step_backward());
        assert_eq!(session.position(), 3);
        assert_eq!(session.history_len(), 6);

        assert_eq!(
            session.step_forward(),
            StepOutcome::Advanced {
                position: 4,
                reused: true
            }
        );
        assert_eq!(
            session.step_forward(),
            StepOutcome::Advanced {
                position: 5,
                reused: true
            }
        );
        assert_eq!(session.current(), &apply_n(&grid, m, 5));
        assert_eq!(session.history_len(), 6);
    }

    #[test]
    fn test_interior_step_reuses_snapshot_buffer() {
        let mut session = CatMapSession::new(gradient(6), TransformMatrix::CLASSIC);
        session.step_forward();
        session.step_forward();
        let cached = session.snapshot(2).unwrap().clone();
        session.step_backward();
        session.step_forward();
        assert!(session.current().shares_buffer(&cached));
    }

    #[test]
    fn test_backward_at_origin_is_noop() {
        let grid = gradient(4);
        let mut session = CatMapSession::new(grid.clone(), TransformMatrix::CLASSIC);
        assert!(!session.step_backward());
        assert_eq!(session.position(), 0);
        assert_eq!(session.current(), &grid);
    }

    #[test]
    fn test_wraps_at_period() {
        let grid = gradient(4);
        let mut session = CatMapSession::new(grid.clone(), TransformMatrix::CLASSIC);
        for expected in 1..6 {
            assert_eq!(
                session.step_forward(),
                StepOutcome::Advanced {
                    position: expected,
                    reused: false
                }
            );
        }
        assert_eq!(session.step_forward(), StepOutcome::Wrapped { period: 6 });
        assert_eq!(session.position(), 0);
        assert_eq!(session.history_len(), 1);
        assert_eq!(session.current(), &grid);
    }

    #[test]
    fn test_matrix_change_clears_history() {
        let grid = gradient(10);
        let mut session = CatMapSession::new(grid.clone(), TransformMatrix::CLASSIC);
        for _ in 0..5 {
            session.step_forward();
        }
        session.step_backward();
        session.step_backward();
        session.step_backward();
        assert_eq!(session.position(), 2);

        let standard = TransformMatrix::new(2, 1, 1, 1);
        session.set_matrix(standard);
        assert_eq!(session.position(), 0);
        assert_eq!(session.history_len(), 1);

        session.step_forward();
        assert_eq!(session.position(), 1);
        assert_eq!(session.history_len(), 2);
        assert_eq!(session.current(), &apply(&grid, standard));
    }

    #[test]
    fn test_reset_truncates() {
        let mut session = CatMapSession::new(gradient(10), TransformMatrix::CLASSIC);
        for _ in 0..4 {
            session.step_forward();
        }
        session.reset();
        assert_eq!(session.position(), 0);
        assert_eq!(session.history_len(), 1);
        assert_eq!(session.current(), session.original());
    }

    #[test]
    fn test_unknown_period_keeps_growing() {
        let config = SessionConfig {
            period_limit: PeriodLimitPolicy::Fixed { limit: 20 },
            ..SessionConfig::default()
        };
        let mut session =
            CatMapSession::with_config(gradient(5), TransformMatrix::new(1, 0, 0, 0), config);
        assert!(!session.period().is_found());
        for _ in 0..30 {
            session.step_forward();
        }
        assert_eq!(session.position(), 30);
        assert_eq!(session.history_len(), 31);
        assert_eq!(session.progress(), None);
        assert_eq!(session.caption(), "Iteration 30");
    }

    #[test]
    fn test_same_matrix_hits_period_cache() {
        let mut session = CatMapSession::new(gradient(4), TransformMatrix::CLASSIC);
        session.step_forward();
        session.set_matrix(TransformMatrix::CLASSIC);
        assert_eq!(session.position(), 0);
        assert_eq!(session.period_cache().hits(), 1);
        assert_eq!(session.period_cache().misses(), 1);
    }

    #[test]
    fn test_image_change_recomputes_period() {
        let mut session = CatMapSession::new(gradient(4), TransformMatrix::CLASSIC);
        assert_eq!(session.period().period(), Some(6));

        session.set_image(gradient(5), Some("cat.png".to_string()));
        assert_eq!(session.side(), 5);
        assert_eq!(session.period().period(), Some(20));
        assert_eq!(session.source_name(), Some("cat.png"));

        session.set_image(PixelGrid::filled(5, Rgba::TEAL).unwrap(), None);
        assert_eq!(session.period().period(), Some(1));
    }

    #[test]
    fn test_fill_policy_applies_to_steps() {
        let config = SessionConfig {
            fill: Rgba::WHITE,
            ..SessionConfig::default()
        };
        let mut session =
            CatMapSession::with_config(gradient(4), TransformMatrix::new(1, 0, 0, 0), config);
        session.step_forward();
        assert_eq!(session.current().pixel(1, 2), Some(Rgba::WHITE));
    }

    #[test]
    fn test_presentation_state() {
        let mut session = CatMapSession::new(gradient(4), TransformMatrix::CLASSIC);
        session.step_forward();
        session.step_forward();
        session.step_forward();
        assert_eq!(session.caption(), "Iteration 3 of 6");
        assert_eq!(session.progress(), Some(0.5));
        assert_eq!(session.export_file_name(), "arnold-cat-map-iteration-3.png");

        session.set_image(gradient(4), Some("my.cat.jpeg".to_string()));
        assert_eq!(session.export_file_name(), "my.cat-iteration-0.png");
    }
}
