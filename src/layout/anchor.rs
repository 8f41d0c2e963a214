use tracing::{debug, warn};

use super::Point;
use crate::document::DocumentStore;
use crate::model::{ElementLocation, Label};

/// Resolve the point a label refers to.
///
/// Point elements give their location, curves give their start point. Anything
/// else (no tagged element, missing element, unlocated element, empty curve)
/// resolves to `None` and the label is left out of the arrangement.
pub fn resolve_anchor<S: DocumentStore + ?Sized>(store: &S, label: &Label) -> Option<Point> {
    let Some(element_id) = label.primary_element() else {
        warn!(label = %label.id, "label tags no element");
        return None;
    };
    let Some(element) = store.element(element_id) else {
        warn!(label = %label.id, element = %element_id, "tagged element not found");
        return None;
    };
    let anchor = match &element.location {
        ElementLocation::Point(point) => Some(*point),
        ElementLocation::Curve(points) => points.first().copied(),
        ElementLocation::Unlocated => None,
    };
    match anchor {
        Some(point) => {
            debug!(label = %label.id, element = %element_id, x = point.x, y = point.y, "anchor resolved");
        }
        None => {
            warn!(label = %label.id, element = %element_id, "element has no usable location");
        }
    }
    anchor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Scene;
    use crate::model::Element;

    fn scene_with(element: Element) -> Scene {
        let mut scene = Scene::new();
        scene.add_element(element);
        scene
    }

    #[test]
    fn point_element_resolves_to_its_location() {
        let scene = scene_with(Element::at(1, Point::xy(3.0, 4.0)));
        let label = Label::new(1, Point::xy(0.0, 0.0)).tagging(1);
        assert_eq!(resolve_anchor(&scene, &label), Some(Point::xy(3.0, 4.0)));
    }

    #[test]
    fn curve_element_resolves_to_start_point() {
        let scene = scene_with(Element::curve(
            1,
            vec![Point::xy(-5.0, 2.0), Point::xy(50.0, 2.0)],
        ));
        let label = Label::new(1, Point::xy(0.0, 0.0)).tagging(1);
        assert_eq!(resolve_anchor(&scene, &label), Some(Point::xy(-5.0, 2.0)));
    }

    #[test]
    fn unresolvable_anchors_return_none() {
        let scene = scene_with(Element::curve(1, Vec::new()));
        let empty_curve = Label::new(1, Point::xy(0.0, 0.0)).tagging(1);
        let missing = Label::new(2, Point::xy(0.0, 0.0)).tagging(99);
        let untagged = Label::new(3, Point::xy(0.0, 0.0));
        assert_eq!(resolve_anchor(&scene, &empty_curve), None);
        assert_eq!(resolve_anchor(&scene, &missing), None);
        assert_eq!(resolve_anchor(&scene, &untagged), None);
    }
}
