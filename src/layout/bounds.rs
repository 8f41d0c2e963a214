use tracing::warn;

use super::{BBox, Point};
use crate::document::DocumentStore;
use crate::model::{Label, SortAxis};

/// A label's box at some head position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelBounds {
    pub bbox: BBox,
    /// The document had no box for the label; the label never collides.
    pub degenerate: bool,
}

impl LabelBounds {
    /// Distance from the head to the box edge facing backwards along the growth
    /// direction (`dir` is `+1.0` or `-1.0`).
    pub fn leading_offset(&self, head: Point, axis: SortAxis, dir: f64) -> f64 {
        let (low, high) = self.bbox.span(axis);
        let h = head.along(axis);
        if dir >= 0.0 { h - low } else { high - h }
    }

    /// Distance from the head to the box edge facing forwards along the growth
    /// direction.
    pub fn trailing_offset(&self, head: Point, axis: SortAxis, dir: f64) -> f64 {
        let (low, high) = self.bbox.span(axis);
        let h = head.along(axis);
        if dir >= 0.0 { high - h } else { h - low }
    }
}

/// Box of `label` if its head were at `head`.
///
/// The document is always asked for the box at the label's *current* head; the
/// result is translated rigidly by `head - current`. A missing box yields a
/// zero-size box at `head`.
pub fn bounds_at<S: DocumentStore + ?Sized>(store: &S, label: &Label, head: Point) -> LabelBounds {
    match store.bounding_box(label.id) {
        Some(current) => LabelBounds {
            bbox: current.translate(head - label.head),
            degenerate: false,
        },
        None => {
            warn!(label = %label.id, "bounding box unavailable, treating label as non-colliding");
            LabelBounds {
                bbox: BBox::degenerate(head),
                degenerate: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Extent, Scene};

    fn off_center_scene() -> (Scene, Label) {
        let mut scene = Scene::new();
        let label = Label::new(1, Point::xy(10.0, 10.0));
        // Head sits at the left-middle of a 40x10 box.
        let extent = Extent {
            min_dx: 0.0,
            min_dy: -5.0,
            max_dx: 40.0,
            max_dy: 5.0,
        };
        scene.add_label(label.clone(), Some(extent));
        (scene, label)
    }

    #[test]
    fn box_is_translated_with_head_offset_preserved() {
        let (scene, label) = off_center_scene();
        let bounds = bounds_at(&scene, &label, Point::xy(100.0, -20.0));
        assert!(!bounds.degenerate);
        assert_eq!(bounds.bbox.min, Point::xy(100.0, -25.0));
        assert_eq!(bounds.bbox.max, Point::xy(140.0, -15.0));
    }

    #[test]
    fn missing_box_is_degenerate_at_head() {
        let mut scene = Scene::new();
        let label = Label::new(2, Point::xy(0.0, 0.0));
        scene.add_label(label.clone(), None);
        let head = Point::xy(7.0, 8.0);
        let bounds = bounds_at(&scene, &label, head);
        assert!(bounds.degenerate);
        assert_eq!(bounds.bbox, BBox::degenerate(head));
    }

    #[test]
    fn edge_offsets_depend_on_direction() {
        let (scene, label) = off_center_scene();
        let head = Point::xy(0.0, 0.0);
        let bounds = bounds_at(&scene, &label, head);
        let axis = SortAxis::Horizontal;
        assert_eq!(bounds.leading_offset(head, axis, 1.0), 0.0);
        assert_eq!(bounds.trailing_offset(head, axis, 1.0), 40.0);
        assert_eq!(bounds.leading_offset(head, axis, -1.0), 40.0);
        assert_eq!(bounds.trailing_offset(head, axis, -1.0), 0.0);
        assert_eq!(bounds.trailing_offset(head, SortAxis::Vertical, 1.0), 5.0);
    }
}
