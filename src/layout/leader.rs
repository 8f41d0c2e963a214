use tracing::debug;

use super::Point;
use crate::document::{DocumentStore, StoreError};
use crate::model::{Label, LeaderEndCondition, LeaderStyle, SortAxis};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeaderOutcome {
    Reconnected { end: Point, elbow: Option<Point> },
    /// Label draws no leader; nothing to do.
    NoLeader,
    /// Anchor could not be re-resolved after the move; leader left as is.
    AnchorUnresolved,
}

/// Bend point of an L-shaped leader.
///
/// Rows drop vertically from the head to the anchor's height and then run
/// horizontally; columns run horizontally from the head to the anchor's X and
/// then drop vertically. Either way one segment shares the head's coordinate
/// and the other the anchor's.
pub fn elbow_point(head: Point, anchor: Point, axis: SortAxis) -> Point {
    match axis {
        SortAxis::Horizontal => Point::new(head.x, anchor.y, head.z),
        SortAxis::Vertical => Point::new(anchor.x, head.y, head.z),
    }
}

/// Re-wire the leader of `label` (already at its new head) to `anchor`.
pub fn reconnect<S: DocumentStore + ?Sized>(
    store: &mut S,
    label: &Label,
    anchor: Option<Point>,
    style: LeaderStyle,
    axis: SortAxis,
) -> Result<LeaderOutcome, StoreError> {
    if !label.has_leader {
        return Ok(LeaderOutcome::NoLeader);
    }
    let Some(anchor) = anchor else {
        debug!(label = %label.id, "anchor gone, leader left untouched");
        return Ok(LeaderOutcome::AnchorUnresolved);
    };
    let (condition, elbow) = match style {
        LeaderStyle::Straight => (LeaderEndCondition::Attached, None),
        LeaderStyle::LShape => (
            LeaderEndCondition::Free,
            Some(elbow_point(label.head, anchor, axis)),
        ),
    };
    store.set_leader(label.id, condition, anchor, elbow)?;
    debug!(label = %label.id, ?style, "leader reconnected");
    Ok(LeaderOutcome::Reconnected { end: anchor, elbow })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Scene;
    use crate::model::LabelId;

    fn scene_with(label: Label) -> Scene {
        let mut scene = Scene::new();
        scene.add_label(label, None);
        scene.begin("leaders").expect("begin");
        scene
    }

    #[test]
    fn straight_leader_ends_on_anchor() {
        let label = Label::new(1, Point::xy(100.0, 0.0)).with_leader();
        let mut scene = scene_with(label.clone());
        let anchor = Point::xy(30.0, -40.0);
        let outcome = reconnect(
            &mut scene,
            &label,
            Some(anchor),
            LeaderStyle::Straight,
            SortAxis::Horizontal,
        )
        .expect("reconnect");
        assert_eq!(outcome, LeaderOutcome::Reconnected { end: anchor, elbow: None });
        let leader = scene.label(LabelId(1)).and_then(|l| l.leader).expect("leader");
        assert_eq!(leader.end_condition, LeaderEndCondition::Attached);
        assert_eq!(leader.end, Some(anchor));
    }

    #[test]
    fn l_shape_elbow_is_axis_aligned() {
        let head = Point::new(0.0, 250.0, 2.0);
        let anchor = Point::xy(-80.0, 40.0);
        let label = Label::new(1, head).with_leader();
        let mut scene = scene_with(label.clone());
        reconnect(
            &mut scene,
            &label,
            Some(anchor),
            LeaderStyle::LShape,
            SortAxis::Vertical,
        )
        .expect("reconnect");
        let leader = scene.label(LabelId(1)).and_then(|l| l.leader).expect("leader");
        let elbow = leader.elbow.expect("elbow");
        assert_eq!(leader.end_condition, LeaderEndCondition::Free);
        assert_eq!(elbow.y, head.y, "head-to-elbow segment is horizontal");
        assert_eq!(elbow.x, anchor.x, "elbow-to-anchor segment is vertical");
        assert_eq!(
            elbow_point(head, anchor, SortAxis::Horizontal),
            Point::new(0.0, 40.0, 2.0)
        );
    }

    #[test]
    fn labels_without_leader_or_anchor_are_skipped() {
        let bare = Label::new(1, Point::xy(0.0, 0.0));
        let mut scene = scene_with(bare.clone());
        let outcome = reconnect(
            &mut scene,
            &bare,
            Some(Point::xy(1.0, 1.0)),
            LeaderStyle::Straight,
            SortAxis::Horizontal,
        )
        .expect("no-op");
        assert_eq!(outcome, LeaderOutcome::NoLeader);

        let led = Label::new(1, Point::xy(0.0, 0.0)).with_leader();
        let outcome = reconnect(&mut scene, &led, None, LeaderStyle::LShape, SortAxis::Vertical)
            .expect("no-op");
        assert_eq!(outcome, LeaderOutcome::AnchorUnresolved);
        assert_eq!(scene.label(LabelId(1)).and_then(|l| l.leader), None);
    }
}
