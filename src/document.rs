//! Access to the drawing that owns labels and elements.
//!
//! The arrangement engine never holds on to document state: it reads labels,
//! elements and boxes through [`DocumentStore`] and writes head positions and
//! leaders back inside one transaction opened by the caller-facing
//! orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::layout::{BBox, Point};
use crate::model::{Element, ElementId, Label, LabelId, Leader, LeaderEndCondition};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("label {0} does not exist")]
    UnknownLabel(LabelId),
    #[error("no transaction is open")]
    NoTransaction,
    #[error("transaction '{0}' is already open")]
    TransactionActive(String),
    #[error("document rejected the change: {0}")]
    Rejected(String),
}

pub trait DocumentStore {
    fn label(&self, id: LabelId) -> Option<Label>;

    /// Every label in document order.
    fn label_ids(&self) -> Vec<LabelId>;

    fn element(&self, id: ElementId) -> Option<Element>;

    /// Box of the label as drawn at its current head, `None` when the label is
    /// not drawable in the active view.
    fn bounding_box(&self, id: LabelId) -> Option<BBox>;

    fn set_head_position(&mut self, id: LabelId, head: Point) -> Result<(), StoreError>;

    fn set_leader(
        &mut self,
        id: LabelId,
        end_condition: LeaderEndCondition,
        end: Point,
        elbow: Option<Point>,
    ) -> Result<(), StoreError>;

    fn begin(&mut self, name: &str) -> Result<(), StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    fn rollback(&mut self);
}

/// Box of a label relative to its head point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extent {
    pub min_dx: f64,
    pub min_dy: f64,
    pub max_dx: f64,
    pub max_dy: f64,
}

impl Extent {
    /// Box of `width` x `height` centered on the head.
    pub fn centered(width: f64, height: f64) -> Self {
        Self {
            min_dx: -width * 0.5,
            min_dy: -height * 0.5,
            max_dx: width * 0.5,
            max_dy: height * 0.5,
        }
    }

    pub fn at(&self, head: Point) -> BBox {
        BBox::new(
            Point::new(head.x + self.min_dx, head.y + self.min_dy, head.z),
            Point::new(head.x + self.max_dx, head.y + self.max_dy, head.z),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneLabel {
    #[serde(flatten)]
    pub label: Label,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,
}

#[derive(Debug, Clone)]
struct OpenTransaction {
    name: String,
    snapshot: BTreeMap<LabelId, SceneLabel>,
}

/// In-memory drawing: the scene files read and written by `tagarr`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default, with = "by_id::elements")]
    elements: BTreeMap<ElementId, Element>,
    #[serde(default, with = "by_id::labels")]
    labels: BTreeMap<LabelId, SceneLabel>,
    #[serde(skip)]
    open: Option<OpenTransaction>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_element(&mut self, element: Element) {
        self.elements.insert(element.id, element);
    }

    pub fn add_label(&mut self, label: Label, extent: Option<Extent>) {
        self.labels.insert(label.id, SceneLabel { label, extent });
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.labels.values().map(|entry| &entry.label)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn in_transaction(&self) -> bool {
        self.open.is_some()
    }

    pub fn from_json(input: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn entry_mut(&mut self, id: LabelId) -> Result<&mut SceneLabel, StoreError> {
        if self.open.is_none() {
            return Err(StoreError::NoTransaction);
        }
        self.labels.get_mut(&id).ok_or(StoreError::UnknownLabel(id))
    }
}

impl DocumentStore for Scene {
    fn label(&self, id: LabelId) -> Option<Label> {
        self.labels.get(&id).map(|entry| entry.label.clone())
    }

    fn label_ids(&self) -> Vec<LabelId> {
        self.labels.keys().copied().collect()
    }

    fn element(&self, id: ElementId) -> Option<Element> {
        self.elements.get(&id).cloned()
    }

    fn bounding_box(&self, id: LabelId) -> Option<BBox> {
        let entry = self.labels.get(&id)?;
        entry.extent.map(|extent| extent.at(entry.label.head))
    }

    fn set_head_position(&mut self, id: LabelId, head: Point) -> Result<(), StoreError> {
        let entry = self.entry_mut(id)?;
        entry.label.head = head;
        Ok(())
    }

    fn set_leader(
        &mut self,
        id: LabelId,
        end_condition: LeaderEndCondition,
        end: Point,
        elbow: Option<Point>,
    ) -> Result<(), StoreError> {
        let entry = self.entry_mut(id)?;
        if !entry.label.has_leader {
            return Err(StoreError::Rejected(format!("label {id} has no leader")));
        }
        entry.label.leader = Some(Leader {
            end_condition,
            end: Some(end),
            elbow,
        });
        Ok(())
    }

    fn begin(&mut self, name: &str) -> Result<(), StoreError> {
        if let Some(open) = &self.open {
            return Err(StoreError::TransactionActive(open.name.clone()));
        }
        self.open = Some(OpenTransaction {
            name: name.to_string(),
            snapshot: self.labels.clone(),
        });
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.open.take().map(|_| ()).ok_or(StoreError::NoTransaction)
    }

    fn rollback(&mut self) {
        if let Some(open) = self.open.take() {
            self.labels = open.snapshot;
        }
    }
}

/// Scene files list elements and labels as arrays; in memory they are keyed by id.
mod by_id {
    macro_rules! keyed_list {
        ($name:ident, $key:ty, $value:ty, $id:expr) => {
            pub mod $name {
                use super::super::*;
                use serde::{Deserializer, Serializer};

                pub fn serialize<S: Serializer>(
                    map: &BTreeMap<$key, $value>,
                    serializer: S,
                ) -> Result<S::Ok, S::Error> {
                    serializer.collect_seq(map.values())
                }

                pub fn deserialize<'de, D: Deserializer<'de>>(
                    deserializer: D,
                ) -> Result<BTreeMap<$key, $value>, D::Error> {
                    let items: Vec<$value> = Vec::deserialize(deserializer)?;
                    let id_of: fn(&$value) -> $key = $id;
                    Ok(items.into_iter().map(|item| (id_of(&item), item)).collect())
                }
            }
        };
    }

    keyed_list!(elements, ElementId, Element, |e| e.id);
    keyed_list!(labels, LabelId, SceneLabel, |l| l.label.id);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Scene {
        let mut scene = Scene::new();
        scene.add_element(Element::at(1, Point::xy(10.0, 10.0)));
        scene.add_label(
            Label::new(7, Point::xy(0.0, 0.0)).tagging(1).with_leader(),
            Some(Extent::centered(40.0, 10.0)),
        );
        scene
    }

    #[test]
    fn bounding_box_follows_head() {
        let mut scene = sample();
        let before = scene.bounding_box(LabelId(7)).expect("box");
        assert_eq!(before.min, Point::xy(-20.0, -5.0));
        scene.begin("move").expect("begin");
        scene
            .set_head_position(LabelId(7), Point::xy(100.0, 50.0))
            .expect("move");
        let after = scene.bounding_box(LabelId(7)).expect("box");
        assert_eq!(after.min, Point::xy(80.0, 45.0));
        assert_eq!(after.max, Point::xy(120.0, 55.0));
    }

    #[test]
    fn mutations_require_transaction() {
        let mut scene = sample();
        let err = scene
            .set_head_position(LabelId(7), Point::xy(1.0, 1.0))
            .unwrap_err();
        assert_eq!(err, StoreError::NoTransaction);
    }

    #[test]
    fn rollback_restores_snapshot() {
        let mut scene = sample();
        scene.begin("arrange").expect("begin");
        scene
            .set_head_position(LabelId(7), Point::xy(5.0, 5.0))
            .expect("move");
        assert!(matches!(
            scene.begin("nested"),
            Err(StoreError::TransactionActive(name)) if name == "arrange"
        ));
        scene.rollback();
        assert!(!scene.in_transaction());
        assert_eq!(scene.label(LabelId(7)).expect("label").head, Point::xy(0.0, 0.0));
    }

    #[test]
    fn commit_keeps_changes() {
        let mut scene = sample();
        scene.begin("arrange").expect("begin");
        scene
            .set_leader(
                LabelId(7),
                LeaderEndCondition::Attached,
                Point::xy(10.0, 10.0),
                None,
            )
            .expect("leader");
        scene.commit().expect("commit");
        let label = scene.label(LabelId(7)).expect("label");
        assert_eq!(
            label.leader.and_then(|l| l.end),
            Some(Point::xy(10.0, 10.0))
        );
        assert_eq!(scene.commit(), Err(StoreError::NoTransaction));
    }

    #[test]
    fn scene_json_round_trips_as_lists() {
        let scene = sample();
        let json = scene.to_json().expect("serialize");
        assert!(json.contains("\"labels\": ["), "labels should serialize as a list");
        let back = Scene::from_json(&json).expect("parse");
        assert_eq!(back.label(LabelId(7)), scene.label(LabelId(7)));
        assert_eq!(back.bounding_box(LabelId(7)), scene.bounding_box(LabelId(7)));
    }
}
