use std::cmp::Ordering;

use serde::Serialize;
use tracing::{debug, info};

use super::Point;
use crate::model::{Label, SortAxis};

/// A label whose anchor resolved, remembered with its position in the selection
/// so equal keys keep input order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLabel {
    pub label: Label,
    pub anchor: Point,
    pub input_index: usize,
}

/// Where the anchor set sits, on average, relative to the origin's Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Region {
    Above,
    Below,
}

/// Where the anchor set sits, on average, relative to the origin's X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortedLabels {
    pub axis: SortAxis,
    pub labels: Vec<ResolvedLabel>,
    /// Set for vertical layouts only.
    pub region: Option<Region>,
    pub side: Option<Side>,
}

impl SortedLabels {
    /// `+1.0` when positions grow along the axis, `-1.0` when they shrink.
    ///
    /// Rows always grow to the right. Columns grow upwards when the anchors sit
    /// below the origin and downwards otherwise.
    pub fn growth(&self) -> f64 {
        match (self.axis, self.region) {
            (SortAxis::Vertical, Some(Region::Above)) => -1.0,
            _ => 1.0,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Classify the anchor set against the origin. An empty set counts as above
/// and right.
pub fn classify(labels: &[ResolvedLabel], origin: Point) -> (Region, Side) {
    if labels.is_empty() {
        return (Region::Above, Side::Right);
    }
    let n = labels.len() as f64;
    let mean_x = labels.iter().map(|l| l.anchor.x).sum::<f64>() / n;
    let mean_y = labels.iter().map(|l| l.anchor.y).sum::<f64>() / n;
    let region = if mean_y < origin.y {
        Region::Below
    } else {
        Region::Above
    };
    let side = if mean_x < origin.x { Side::Left } else { Side::Right };
    (region, side)
}

/// Order labels for placement.
///
/// Rows visit anchors left to right. Columns visit anchors top to bottom;
/// anchors on the same rounded Y are grouped by rounded X (nearest column to
/// the origin first), and inside a group the one farthest from the origin goes
/// first. Input order breaks any remaining tie.
pub fn sort_labels(
    mut labels: Vec<ResolvedLabel>,
    axis: SortAxis,
    origin: Point,
    precision: u32,
) -> SortedLabels {
    match axis {
        SortAxis::Horizontal => {
            labels.sort_by(|a, b| {
                a.anchor
                    .x
                    .total_cmp(&b.anchor.x)
                    .then(a.input_index.cmp(&b.input_index))
            });
            info!(count = labels.len(), "horizontal sort complete");
            SortedLabels {
                axis,
                labels,
                region: None,
                side: None,
            }
        }
        SortAxis::Vertical => {
            let (region, side) = classify(&labels, origin);
            let above = labels.iter().filter(|l| l.anchor.y > origin.y).count();
            info!(
                above,
                below = labels.len() - above,
                ?region,
                ?side,
                origin_y = origin.y,
                "classified anchors against origin"
            );
            labels.sort_by(|a, b| vertical_order(a, b, origin, precision));
            info!(count = labels.len(), "vertical sort complete");
            SortedLabels {
                axis,
                labels,
                region: Some(region),
                side: Some(side),
            }
        }
    }
}

fn vertical_order(a: &ResolvedLabel, b: &ResolvedLabel, origin: Point, precision: u32) -> Ordering {
    let scale = 10f64.powi(precision as i32);
    let round = |v: f64| (v * scale).round() as i64;
    let column_gap = |l: &ResolvedLabel| (round(l.anchor.x) - round(origin.x)).abs();
    round(b.anchor.y)
        .cmp(&round(a.anchor.y))
        .then_with(|| column_gap(a).cmp(&column_gap(b)))
        .then_with(|| round(a.anchor.x).cmp(&round(b.anchor.x)))
        .then_with(|| {
            let da = a.anchor.distance_xy(&origin);
            let db = b.anchor.distance_xy(&origin);
            db.total_cmp(&da)
        })
        .then_with(|| b.anchor.y.total_cmp(&a.anchor.y))
        .then_with(|| a.input_index.cmp(&b.input_index))
}

/// Debug helper: the visiting order as label ids.
pub(crate) fn log_order(sorted: &SortedLabels) {
    let ids: Vec<u64> = sorted.labels.iter().map(|l| l.label.id.0).collect();
    debug!(?ids, axis = ?sorted.axis, "sorted labels");
}
