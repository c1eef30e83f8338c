use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{CatMapError, Result};
use crate::grid::{grids_equal, PixelGrid, Rgba, CHANNELS};
use crate::matrix::TransformMatrix;
use crate::transform::TransformPlan;

/// Upper bound on the iteration count of one generated sequence.
pub const MAX_SEQUENCE_COUNT: usize = 1_000;

/// Upper bound on the pixel bytes held by one generated sequence.
pub const MAX_SEQUENCE_BYTES: usize = 256 * 1024 * 1024;

/// The count `generate` will actually honour for a grid of `side`.
pub fn capped_count(count: usize, side: usize) -> usize {
    let frame_bytes = (side * side * CHANNELS).max(1);
    let by_memory = (MAX_SEQUENCE_BYTES / frame_bytes).saturating_sub(1);
    count.min(MAX_SEQUENCE_COUNT).min(by_memory)
}

/// Lazy walk over `original, T(original), ..., T^count(original)`.
///
/// Yields `(index, grid)` pairs. Cloning an unstarted iterator (or calling
/// [`FrameIter::restart`]) replays the same frames.
#[derive(Debug, Clone)]
pub struct FrameIter {
    plan: Arc<TransformPlan>,
    fill: Rgba,
    original: PixelGrid,
    current: Option<PixelGrid>,
    next_index: usize,
    count: usize,
}

impl FrameIter {
    pub fn restart(&mut self) {
        self.current = None;
        self.next_index = 0;
    }

    pub fn count_limit(&self) -> usize {
        self.count
    }
}

impl Iterator for FrameIter {
    type Item = (usize, PixelGrid);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index > self.count {
            return None;
        }
        let grid = match &self.current {
            None => self.original.clone(),
            Some(prev) => self.plan.scatter(prev, self.fill),
        };
        let index = self.next_index;
        self.current = Some(grid.clone());
        self.next_index += 1;
        Some((index, grid))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count + 1).saturating_sub(self.next_index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FrameIter {}

pub fn iterate(original: &PixelGrid, matrix: TransformMatrix, count: usize) -> FrameIter {
    iterate_with_fill(original, matrix, count, Rgba::TRANSPARENT)
}

pub fn iterate_with_fill(
    original: &PixelGrid,
    matrix: TransformMatrix,
    count: usize,
    fill: Rgba,
) -> FrameIter {
    FrameIter {
        plan: Arc::new(TransformPlan::new(matrix, original.side())),
        fill,
        original: original.clone(),
        current: None,
        next_index: 0,
        count,
    }
}

#[derive(Debug, Clone)]
pub struct IterationSequence {
    frames: Vec<PixelGrid>,
    period_index: Option<usize>,
    requested: usize,
    capped: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceSummary {
    pub side: usize,
    pub frame_count: usize,
    pub period_index: Option<usize>,
    pub requested: usize,
    pub capped: bool,
}

impl IterationSequence {
    pub fn frames(&self) -> &[PixelGrid] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Result<&PixelGrid> {
        self.frames.get(index).ok_or(CatMapError::FrameOutOfRange {
            index,
            len: self.frames.len(),
        })
    }

    pub fn into_frames(self) -> Vec<PixelGrid> {
        self.frames
    }

    /// Number of applications performed; one less than the frame count.
    pub fn count(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    /// First index `i >= 1` whose frame equals the original.
    pub fn period_index(&self) -> Option<usize> {
        self.period_index
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn capped(&self) -> bool {
        self.capped
    }

    /// Caption for a frame card: `Original`, `n = i` or `n = i  ← period`.
    pub fn frame_label(&self, index: usize) -> String {
        if index == 0 {
            "Original".to_string()
        } else if Some(index) == self.period_index {
            format!("n = {}  ← period", index)
        } else {
            format!("n = {}", index)
        }
    }

    pub fn summary(&self) -> SequenceSummary {
        SequenceSummary {
            side: self.frames.first().map(PixelGrid::side).unwrap_or(0),
            frame_count: self.frames.len(),
            period_index: self.period_index,
            requested: self.requested,
            capped: self.capped,
        }
    }
}

/// Collects `count + 1` frames (after capping) and the first recurrence of
/// the original.
pub fn generate(original: &PixelGrid, matrix: TransformMatrix, count: usize) -> IterationSequence {
    generate_with_fill(original, matrix, count, Rgba::TRANSPARENT)
}

pub fn generate_with_fill(
    original: &PixelGrid,
    matrix: TransformMatrix,
    count: usize,
    fill: Rgba,
) -> IterationSequence {
    let effective = capped_count(count, original.side());
    if effective < count {
        console_log!(
            "sequence: requested {} iterations on {}x{}, capped to {}",
            count,
            original.side(),
            original.side(),
            effective
        );
    }

    let mut frames = Vec::with_capacity(effective + 1);
    let mut period_index = None;
    for (i, grid) in iterate_with_fill(original, matrix, effective, fill) {
        if i > 0 && period_index.is_none() && grids_equal(&grid, original) {
            period_index = Some(i);
        }
        frames.push(grid);
    }

    IterationSequence {
        frames,
        period_index,
        requested: count,
        capped: effective < count,
    }
}
