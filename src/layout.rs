//! Ordering, placement and leader geometry for label arrangement.

mod anchor;
mod bounds;
mod leader;
mod placement;
mod sorter;
mod types;

pub use anchor::resolve_anchor;
pub use bounds::{LabelBounds, bounds_at};
pub use leader::{LeaderOutcome, elbow_point, reconnect};
pub use placement::{Placement, PlacementError, PlacementOutcome, place_labels};
pub use sorter::{Region, ResolvedLabel, Side, SortedLabels, classify, sort_labels};
pub use types::{BBox, Point};

pub(crate) use sorter::log_order;
