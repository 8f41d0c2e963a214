//! One arrangement operation: validate, sort, place, re-wire leaders, commit.
//!
//! All document mutations happen inside a single transaction. Validation and
//! sorting run before it is opened, so a rejected request leaves the document
//! untouched; anything that goes wrong after that rolls the whole batch back.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, debug_span, error, info, warn};

use crate::config::PlacementConfig;
use crate::document::{DocumentStore, StoreError};
use crate::layout::{
    LeaderOutcome, Placement, Point, Region, ResolvedLabel, Side, log_order, place_labels,
    reconnect, resolve_anchor, sort_labels,
};
use crate::model::{FailurePolicy, LabelId, SortAxis};

pub const TRANSACTION_NAME: &str = "Arrange labels";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrangePhase {
    Idle,
    Validating,
    Sorting,
    Placing,
    Reconnecting,
    Committed,
    RolledBack,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArrangeError {
    #[error("no labels selected")]
    EmptySelection,
    #[error("no origin point supplied")]
    NullOrigin,
    #[error("none of the selected labels has a resolvable anchor")]
    NoValidLabels,
    #[error("label {label} could not be arranged: {reason}")]
    LabelFailed { label: LabelId, reason: String },
    #[error("could not open transaction: {0}")]
    Transaction(#[source] StoreError),
    #[error("commit failed: {0}")]
    Commit(#[source] StoreError),
}

impl ArrangeError {
    /// Rejected before any document access.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptySelection | Self::NullOrigin)
    }
}

/// Non-fatal problem with a single label. Only visible in the report and log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LabelIssue {
    NotFound,
    /// Repeated in the selection; only the first occurrence is arranged.
    Duplicate,
    AnchorUnresolved,
    BoundsUnavailable,
    RetryExhausted { attempts: usize },
    MoveFailed { reason: String },
    LeaderFailed { reason: String },
}

impl LabelIssue {
    /// The label was left where it was.
    pub fn excludes_label(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::AnchorUnresolved | Self::MoveFailed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelReport {
    pub label: LabelId,
    pub issue: LabelIssue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrangeReport {
    pub axis: SortAxis,
    pub origin: Point,
    pub region: Option<Region>,
    pub side: Option<Side>,
    #[serde(skip)]
    pub placements: Vec<Placement>,
    pub leaders_reconnected: usize,
    pub issues: Vec<LabelReport>,
    pub phases: Vec<ArrangePhase>,
}

impl ArrangeReport {
    pub fn placed(&self) -> usize {
        self.placements.len()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &LabelReport> {
        self.issues.iter().filter(|r| r.issue.excludes_label())
    }
}

struct Run<'s, S: DocumentStore + ?Sized> {
    store: &'s mut S,
    phase: ArrangePhase,
    phases: Vec<ArrangePhase>,
    issues: Vec<LabelReport>,
    open: bool,
}

impl<'s, S: DocumentStore + ?Sized> Run<'s, S> {
    fn enter(&mut self, phase: ArrangePhase) {
        debug!(from = ?self.phase, to = ?phase, "arrange phase");
        self.phase = phase;
        self.phases.push(phase);
    }

    fn issue(&mut self, label: LabelId, issue: LabelIssue) {
        warn!(label = %label, ?issue, "label issue");
        self.issues.push(LabelReport { label, issue });
    }

    fn abort(&mut self, err: ArrangeError) -> ArrangeError {
        if self.open {
            self.store.rollback();
            self.open = false;
        }
        self.enter(ArrangePhase::RolledBack);
        error!(error = %err, "arrangement rolled back");
        err
    }
}

/// Arrange `selected` labels into a row or column starting at `origin`.
///
/// Returns the report of a committed arrangement; `report.placed()` is the number
/// of labels moved. Per-label problems are collected in the report unless
/// `config.failure_policy` is [`FailurePolicy::AllOrNothing`].
pub fn arrange<S: DocumentStore + ?Sized>(
    store: &mut S,
    selected: &[LabelId],
    origin: Option<Point>,
    config: &PlacementConfig,
) -> Result<ArrangeReport, ArrangeError> {
    let span = debug_span!("arrange", count = selected.len(), axis = ?config.axis);
    let _guard = span.enter();

    let mut run = Run {
        store,
        phase: ArrangePhase::Idle,
        phases: vec![ArrangePhase::Idle],
        issues: Vec::new(),
        open: false,
    };

    run.enter(ArrangePhase::Validating);
    if selected.is_empty() {
        return Err(run.abort(ArrangeError::EmptySelection));
    }
    let Some(origin) = origin else {
        return Err(run.abort(ArrangeError::NullOrigin));
    };

    run.enter(ArrangePhase::Sorting);
    let mut resolved = Vec::with_capacity(selected.len());
    let mut seen = HashSet::with_capacity(selected.len());
    for (input_index, &id) in selected.iter().enumerate() {
        if !seen.insert(id) {
            run.issue(id, LabelIssue::Duplicate);
            continue;
        }
        let Some(label) = run.store.label(id) else {
            run.issue(id, LabelIssue::NotFound);
            continue;
        };
        match resolve_anchor(&*run.store, &label) {
            Some(anchor) => resolved.push(ResolvedLabel {
                label,
                anchor,
                input_index,
            }),
            None => run.issue(id, LabelIssue::AnchorUnresolved),
        }
    }
    if resolved.is_empty() {
        return Err(run.abort(ArrangeError::NoValidLabels));
    }
    let sorted = sort_labels(resolved, config.axis, origin, config.coordinate_precision);
    log_order(&sorted);

    if let Err(err) = run.store.begin(TRANSACTION_NAME) {
        return Err(run.abort(ArrangeError::Transaction(err)));
    }
    run.open = true;

    run.enter(ArrangePhase::Placing);
    let outcome = match place_labels(&mut *run.store, &sorted, origin, config) {
        Ok(outcome) => outcome,
        Err(err) => {
            return Err(run.abort(ArrangeError::LabelFailed {
                label: err.label,
                reason: err.source.to_string(),
            }));
        }
    };
    for failed in &outcome.failed {
        run.issue(
            failed.label,
            LabelIssue::MoveFailed {
                reason: failed.source.to_string(),
            },
        );
    }
    for placement in &outcome.placements {
        if placement.degenerate {
            run.issue(placement.label, LabelIssue::BoundsUnavailable);
        }
        if placement.exhausted {
            run.issue(
                placement.label,
                LabelIssue::RetryExhausted {
                    attempts: placement.attempts,
                },
            );
        }
    }

    run.enter(ArrangePhase::Reconnecting);
    let mut leaders_reconnected = 0;
    for placement in &outcome.placements {
        let Some(label) = run.store.label(placement.label) else {
            continue;
        };
        let anchor = resolve_anchor(&*run.store, &label);
        match reconnect(
            &mut *run.store,
            &label,
            anchor,
            config.leader_style,
            sorted.axis,
        ) {
            Ok(LeaderOutcome::Reconnected { .. }) => leaders_reconnected += 1,
            Ok(LeaderOutcome::NoLeader | LeaderOutcome::AnchorUnresolved) => {}
            Err(err) if config.failure_policy == FailurePolicy::AllOrNothing => {
                return Err(run.abort(ArrangeError::LabelFailed {
                    label: label.id,
                    reason: err.to_string(),
                }));
            }
            Err(err) => run.issue(
                label.id,
                LabelIssue::LeaderFailed {
                    reason: err.to_string(),
                },
            ),
        }
    }

    if let Err(err) = run.store.commit() {
        return Err(run.abort(ArrangeError::Commit(err)));
    }
    run.open = false;
    run.enter(ArrangePhase::Committed);

    info!(
        outcome = "success",
        placed = outcome.placements.len(),
        leaders = leaders_reconnected,
        issues = run.issues.len(),
        "labels arranged"
    );

    Ok(ArrangeReport {
        axis: sorted.axis,
        origin,
        region: sorted.region,
        side: sorted.side,
        placements: outcome.placements,
        leaders_reconnected,
        issues: run.issues,
        phases: run.phases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Extent, Scene};
    use crate::model::{Element, Label, LeaderStyle};

    fn scene() -> Scene {
        let mut scene = Scene::new();
        scene.add_element(Element::at(1, Point::xy(0.0, -60.0)));
        scene.add_element(Element::at(2, Point::xy(50.0, -60.0)));
        scene.add_label(
            Label::new(1, Point::xy(300.0, 300.0)).tagging(1).with_leader(),
            Some(Extent::centered(40.0, 10.0)),
        );
        scene.add_label(
            Label::new(2, Point::xy(-300.0, 300.0)).tagging(2),
            Some(Extent::centered(40.0, 10.0)),
        );
        scene.add_label(
            Label::new(3, Point::xy(0.0, 0.0)).tagging(77),
            Some(Extent::centered(40.0, 10.0)),
        );
        scene
    }

    #[test]
    fn validation_errors_touch_nothing() {
        let mut doc = scene();
        let before = doc.to_json().expect("json");
        let config = PlacementConfig::default();
        let err = arrange(&mut doc, &[], Some(Point::xy(0.0, 0.0)), &config).unwrap_err();
        assert_eq!(err, ArrangeError::EmptySelection);
        assert!(err.is_validation());
        let err = arrange(&mut doc, &[LabelId(1)], None, &config).unwrap_err();
        assert_eq!(err, ArrangeError::NullOrigin);
        assert_eq!(doc.to_json().expect("json"), before);
        assert!(!doc.in_transaction());
    }

    #[test]
    fn unresolvable_selection_fails_without_mutation() {
        let mut doc = scene();
        let err = arrange(
            &mut doc,
            &[LabelId(3), LabelId(99)],
            Some(Point::xy(0.0, 0.0)),
            &PlacementConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, ArrangeError::NoValidLabels);
        assert!(!err.is_validation());
        assert_eq!(doc.label(LabelId(3)).expect("label").head, Point::xy(0.0, 0.0));
    }

    #[test]
    fn partial_success_reports_skipped_labels() {
        let mut doc = scene();
        let config = PlacementConfig {
            leader_style: LeaderStyle::Straight,
            ..PlacementConfig::default()
        };
        let report = arrange(
            &mut doc,
            &[LabelId(1), LabelId(2), LabelId(3)],
            Some(Point::xy(0.0, 0.0)),
            &config,
        )
        .expect("arrange");
        assert_eq!(report.placed(), 2);
        assert_eq!(report.leaders_reconnected, 1);
        let skipped: Vec<_> = report.skipped().map(|r| r.label).collect();
        assert_eq!(skipped, vec![LabelId(3)]);
        assert_eq!(
            report.phases,
            vec![
                ArrangePhase::Idle,
                ArrangePhase::Validating,
                ArrangePhase::Sorting,
                ArrangePhase::Placing,
                ArrangePhase::Reconnecting,
                ArrangePhase::Committed,
            ]
        );
        assert!(!doc.in_transaction(), "transaction must be closed");
        let leader = doc.label(LabelId(1)).and_then(|l| l.leader).expect("leader");
        assert_eq!(leader.end, Some(Point::xy(0.0, -60.0)));
    }
}
