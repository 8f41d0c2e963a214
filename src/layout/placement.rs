// Sequential label placement along one axis.
// Labels are moved one at a time in sorted order; each placement reads the
// previous label's committed box back from the document, never a cached one.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, warn};

use super::bounds::{LabelBounds, bounds_at};
use super::sorter::{ResolvedLabel, SortedLabels};
use super::{BBox, Point};
use crate::config::PlacementConfig;
use crate::document::{DocumentStore, StoreError};
use crate::model::{FailurePolicy, Label, LabelId, PlacementStrategy, SortAxis};

const MIN_GRID_CELL: f64 = 16.0;
/// Rects covering more cells than this skip the grid and are scanned linearly.
const MAX_CELLS_PER_RECT: i128 = 4096;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("failed to move label {label}: {source}")]
pub struct PlacementError {
    pub label: LabelId,
    #[source]
    pub source: StoreError,
}

/// Final position of one label.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub label: LabelId,
    pub anchor: Point,
    pub head: Point,
    /// Box at `head`, as reported by the document after the move.
    pub bbox: BBox,
    pub degenerate: bool,
    /// Shift attempts spent in overlap-repair mode.
    pub attempts: usize,
    /// Overlap repair gave up and kept the last candidate.
    pub exhausted: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementOutcome {
    pub placements: Vec<Placement>,
    /// Labels the document refused to move; only filled under
    /// [`FailurePolicy::SkipAndContinue`].
    pub failed: Vec<PlacementError>,
}

/// Move every sorted label to its slot, starting at `origin`.
///
/// Placement is forward-only: a label is never touched again once the next one
/// has been placed. Under [`FailurePolicy::AllOrNothing`] the first refused move
/// aborts with an error and the caller is expected to roll back.
pub fn place_labels<S: DocumentStore + ?Sized>(
    store: &mut S,
    sorted: &SortedLabels,
    origin: Point,
    config: &PlacementConfig,
) -> Result<PlacementOutcome, PlacementError> {
    let mut state = PlacementState::new(sorted, origin, config);
    let mut outcome = PlacementOutcome::default();

    for entry in &sorted.labels {
        let label = store.label(entry.label.id).unwrap_or_else(|| entry.label.clone());
        let candidate = match config.strategy {
            PlacementStrategy::OrientedEdge => state.next_edge_slot(&*store, &label),
            PlacementStrategy::OverlapRepair => state.next_repair_slot(&*store, &label),
        };

        match commit_move(store, entry, candidate.head) {
            Ok((moved, committed)) => {
                state.accept(&moved, &committed);
                debug!(
                    label = %moved.id,
                    x = moved.head.x,
                    y = moved.head.y,
                    attempts = candidate.attempts,
                    "label placed"
                );
                outcome.placements.push(Placement {
                    label: moved.id,
                    anchor: entry.anchor,
                    head: moved.head,
                    bbox: committed.bbox,
                    degenerate: committed.degenerate,
                    attempts: candidate.attempts,
                    exhausted: candidate.exhausted,
                });
            }
            Err(err) => {
                if config.failure_policy == FailurePolicy::AllOrNothing {
                    return Err(err);
                }
                warn!(label = %err.label, error = %err.source, "label skipped");
                outcome.failed.push(err);
            }
        }
        state.slot += 1;
    }

    Ok(outcome)
}

fn commit_move<S: DocumentStore + ?Sized>(
    store: &mut S,
    entry: &ResolvedLabel,
    head: Point,
) -> Result<(Label, LabelBounds), PlacementError> {
    let id = entry.label.id;
    store
        .set_head_position(id, head)
        .map_err(|source| PlacementError { label: id, source })?;
    let moved = store.label(id).ok_or(PlacementError {
        label: id,
        source: StoreError::UnknownLabel(id),
    })?;
    let committed = bounds_at(&*store, &moved, moved.head);
    Ok((moved, committed))
}

struct Candidate {
    head: Point,
    attempts: usize,
    exhausted: bool,
}

struct PlacementState<'a> {
    config: &'a PlacementConfig,
    axis: SortAxis,
    dir: f64,
    origin: Point,
    slot: usize,
    /// Far edge of the last placed box along the growth direction.
    trailing: Option<f64>,
    /// Obstacles for overlap repair; `None` in oriented-edge mode.
    grid: Option<ObstacleGrid>,
}

impl<'a> PlacementState<'a> {
    fn new(sorted: &SortedLabels, origin: Point, config: &'a PlacementConfig) -> Self {
        Self {
            config,
            axis: sorted.axis,
            dir: sorted.growth(),
            origin,
            slot: 0,
            trailing: None,
            grid: (config.strategy == PlacementStrategy::OverlapRepair)
                .then(|| ObstacleGrid::new(config.step.abs().max(config.spacing.abs()))),
        }
    }

    /// Head on the layout line through the origin, at `along`.
    fn head_at(&self, label: &Label, along: f64) -> Point {
        label
            .head
            .with_across(self.axis, self.origin.across(self.axis))
            .with_along(self.axis, along)
    }

    fn next_edge_slot<S: DocumentStore + ?Sized>(&self, store: &S, label: &Label) -> Candidate {
        let head = match self.trailing {
            None => self.head_at(label, self.origin.along(self.axis)),
            Some(trailing) => {
                let probe = self.head_at(label, 0.0);
                let bounds = bounds_at(store, label, probe);
                let leading = trailing + self.dir * self.config.spacing;
                let offset = bounds.leading_offset(probe, self.axis, self.dir);
                self.head_at(label, leading + self.dir * offset)
            }
        };
        Candidate {
            head,
            attempts: 0,
            exhausted: false,
        }
    }

    fn next_repair_slot<S: DocumentStore + ?Sized>(&self, store: &S, label: &Label) -> Candidate {
        let base = self.origin.along(self.axis) + self.dir * self.config.step * self.slot as f64;
        let mut head = self.head_at(label, base);
        let mut attempts = 0;
        loop {
            let bounds = bounds_at(store, label, head);
            if bounds.degenerate || !self.collides(&bounds.bbox.inflate(self.config.margin)) {
                return Candidate {
                    head,
                    attempts,
                    exhausted: false,
                };
            }
            if attempts >= self.config.max_shift_attempts {
                warn!(
                    label = %label.id,
                    attempts,
                    "no free slot within shift bound, keeping last candidate"
                );
                return Candidate {
                    head,
                    attempts,
                    exhausted: true,
                };
            }
            let along = head.along(self.axis) + self.dir * self.config.shift_step;
            head = head.with_along(self.axis, along);
            attempts += 1;
        }
    }

    fn collides(&self, rect: &BBox) -> bool {
        self.grid.as_ref().is_some_and(|grid| grid.collides(rect))
    }

    fn accept(&mut self, moved: &Label, committed: &LabelBounds) {
        let along = moved.head.along(self.axis);
        self.trailing =
            Some(along + self.dir * committed.trailing_offset(moved.head, self.axis, self.dir));
        if let Some(grid) = self.grid.as_mut().filter(|_| !committed.degenerate) {
            grid.insert(committed.bbox.inflate(self.config.margin));
        }
    }
}

/// Uniform grid over placed boxes for overlap queries.
///
/// Rects spanning more than [`MAX_CELLS_PER_RECT`] cells are kept in `wide`
/// and checked on every query; a query rect that large scans every box.
struct ObstacleGrid {
    cell: f64,
    rects: Vec<BBox>,
    /// Maps grid cell (ix, iy) to indices into `rects`.
    cells: HashMap<(i64, i64), Vec<usize>>,
    wide: Vec<usize>,
}

impl ObstacleGrid {
    fn new(cell: f64) -> Self {
        Self {
            cell: cell.max(MIN_GRID_CELL),
            rects: Vec::new(),
            cells: HashMap::new(),
            wide: Vec::new(),
        }
    }

    /// Cell bounds of `rect`, or `None` when it covers too many cells (or is
    /// not finite).
    fn cell_range(&self, rect: &BBox) -> Option<(i64, i64, i64, i64)> {
        let coords = [rect.min.x, rect.min.y, rect.max.x, rect.max.y];
        if coords.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let [x0, y0, x1, y1] = coords.map(|v| (v / self.cell).floor() as i64);
        let cols = i128::from(x1) - i128::from(x0) + 1;
        let rows = i128::from(y1) - i128::from(y0) + 1;
        (cols * rows <= MAX_CELLS_PER_RECT).then_some((x0, y0, x1, y1))
    }

    fn insert(&mut self, rect: BBox) {
        let idx = self.rects.len();
        match self.cell_range(&rect) {
            Some((x0, y0, x1, y1)) => {
                for ix in x0..=x1 {
                    for iy in y0..=y1 {
                        self.cells.entry((ix, iy)).or_default().push(idx);
                    }
                }
            }
            None => self.wide.push(idx),
        }
        self.rects.push(rect);
    }

    /// Indices of boxes that could touch `rect`.
    fn candidates(&self, rect: &BBox) -> Vec<usize> {
        let Some((x0, y0, x1, y1)) = self.cell_range(rect) else {
            return (0..self.rects.len()).collect();
        };
        let mut seen = HashSet::new();
        let mut out: Vec<usize> = self.wide.clone();
        for ix in x0..=x1 {
            for iy in y0..=y1 {
                if let Some(indices) = self.cells.get(&(ix, iy)) {
                    out.extend(indices.iter().copied().filter(|idx| seen.insert(*idx)));
                }
            }
        }
        out
    }

    fn collides(&self, rect: &BBox) -> bool {
        self.candidates(rect)
            .into_iter()
            .any(|idx| self.rects[idx].intersects(rect))
    }
}
