use serde::{Deserialize, Serialize};
use std::fmt;

use crate::layout::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Axis along which labels are laid out. Also the primary sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortAxis {
    #[default]
    Horizontal,
    Vertical,
}

impl SortAxis {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "h" | "horizontal" | "row" => Some(Self::Horizontal),
            "v" | "vertical" | "column" => Some(Self::Vertical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeaderStyle {
    /// Head connects directly to the anchor.
    #[default]
    Straight,
    /// One elbow, two axis-aligned segments.
    LShape,
}

impl LeaderStyle {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "straight" | "s" => Some(Self::Straight),
            "l" | "lshape" | "l-shape" | "elbow" => Some(Self::LShape),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlacementStrategy {
    /// Edge-to-edge spacing along the axis; never retries.
    #[default]
    OrientedEdge,
    /// Fixed increments with bounded shift-until-clear repair.
    OverlapRepair,
}

impl PlacementStrategy {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "edge" | "oriented" | "oriented-edge" => Some(Self::OrientedEdge),
            "repair" | "overlap-repair" | "fixed" => Some(Self::OverlapRepair),
            _ => None,
        }
    }
}

/// What happens to the batch when a single label cannot be moved or re-wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailurePolicy {
    #[default]
    SkipAndContinue,
    AllOrNothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeaderEndCondition {
    #[default]
    Attached,
    Free,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leader {
    pub end_condition: LeaderEndCondition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elbow: Option<Point>,
}

/// An annotation label as read from the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: LabelId,
    pub head: Point,
    #[serde(default)]
    pub tagged: Vec<ElementId>,
    #[serde(default)]
    pub has_leader: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader: Option<Leader>,
}

impl Label {
    pub fn new(id: u64, head: Point) -> Self {
        Self {
            id: LabelId(id),
            head,
            tagged: Vec::new(),
            has_leader: false,
            leader: None,
        }
    }

    pub fn tagging(mut self, element: u64) -> Self {
        self.tagged.push(ElementId(element));
        self
    }

    pub fn with_leader(mut self) -> Self {
        self.has_leader = true;
        self
    }

    /// The element this label describes. A label has exactly one anchor; extra
    /// tagged ids are ignored.
    pub fn primary_element(&self) -> Option<ElementId> {
        self.tagged.first().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementLocation {
    Point(Point),
    Curve(Vec<Point>),
    Unlocated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: ElementLocation,
}

impl Element {
    pub fn at(id: u64, point: Point) -> Self {
        Self {
            id: ElementId(id),
            name: None,
            location: ElementLocation::Point(point),
        }
    }

    pub fn curve(id: u64, points: Vec<Point>) -> Self {
        Self {
            id: ElementId(id),
            name: None,
            location: ElementLocation::Curve(points),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_parse_case_insensitively() {
        assert_eq!(SortAxis::from_token("Vertical"), Some(SortAxis::Vertical));
        assert_eq!(SortAxis::from_token(" h "), Some(SortAxis::Horizontal));
        assert_eq!(SortAxis::from_token("diagonal"), None);
        assert_eq!(LeaderStyle::from_token("L-Shape"), Some(LeaderStyle::LShape));
        assert_eq!(
            PlacementStrategy::from_token("repair"),
            Some(PlacementStrategy::OverlapRepair)
        );
    }

    #[test]
    fn label_json_uses_camel_case() {
        let json = r#"{"id":4,"head":{"x":1.0,"y":2.0},"tagged":[9],"hasLeader":true}"#;
        let label: Label = serde_json::from_str(json).expect("label should parse");
        assert_eq!(label.id, LabelId(4));
        assert_eq!(label.head.z, 0.0);
        assert!(label.has_leader);
        assert_eq!(label.primary_element(), Some(ElementId(9)));
    }

    #[test]
    fn element_location_variants_parse() {
        let json = r#"[
            {"id":1,"location":{"point":{"x":0.0,"y":0.0}}},
            {"id":2,"location":{"curve":[{"x":1.0,"y":1.0},{"x":2.0,"y":2.0}]}},
            {"id":3,"location":"unlocated"}
        ]"#;
        let elements: Vec<Element> = serde_json::from_str(json).expect("elements should parse");
        assert!(matches!(elements[0].location, ElementLocation::Point(_)));
        assert!(matches!(&elements[1].location, ElementLocation::Curve(pts) if pts.len() == 2));
        assert_eq!(elements[2].location, ElementLocation::Unlocated);
    }
}
