//! Diff wire format consumed from the diff-computation collaborator.
//!
//! # Responsibility
//! - Represent added / changed / removed entries per object category.
//! - Normalize the legacy single-key changed encoding (`{"<kiid>": {..}}`)
//!   into explicit `{id, properties}` records.
//! - Fold successive diffs so one object is updated once per application.
//!
//! # Invariants
//! - A `ChangedEntry` always names exactly one object.
//! - After `merge`, each kiid appears at most once in `changed`.

use crate::model::kiid::Kiid;
use crate::model::shadow::Category;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Property updates for one existing object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ChangedEntryWire")]
pub struct ChangedEntry {
    pub id: Kiid,
    pub properties: Map<String, Value>,
}

impl ChangedEntry {
    pub fn new(id: Kiid, properties: Map<String, Value>) -> Self {
        Self { id, properties }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ExplicitChange {
    id: Kiid,
    properties: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChangedEntryWire {
    Explicit(ExplicitChange),
    Legacy(Map<String, Value>),
}

impl TryFrom<ChangedEntryWire> for ChangedEntry {
    type Error = String;

    fn try_from(value: ChangedEntryWire) -> Result<Self, Self::Error> {
        match value {
            ChangedEntryWire::Explicit(change) => Ok(Self::new(change.id, change.properties)),
            ChangedEntryWire::Legacy(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "changed entry must name exactly one object, got {} keys",
                        map.len()
                    ));
                }
                let Some((raw_id, raw_properties)) = map.into_iter().next() else {
                    return Err("changed entry is empty".to_string());
                };
                let id = Kiid::new(raw_id).ok_or("changed entry has an empty kiid")?;
                match raw_properties {
                    Value::Object(properties) => Ok(Self::new(id, properties)),
                    other => Err(format!(
                        "changed properties for {id} must be an object, got {other}"
                    )),
                }
            }
        }
    }
}

/// Added / changed / removed entries of one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryDiff {
    /// Object descriptors without a kiid; the host assigns one on insert.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed: Vec<ChangedEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<Kiid>,
}

impl CategoryDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }

    /// Appends `other` into `self`.
    ///
    /// Changed entries for a kiid already present are folded: later values
    /// override, new properties are added. Unseen kiids keep arrival order.
    pub fn merge(&mut self, other: CategoryDiff) {
        self.added.extend(other.added);
        self.removed.extend(other.removed);

        for change in other.changed {
            match self.changed.iter_mut().find(|existing| existing.id == change.id) {
                Some(existing) => existing.properties.extend(change.properties),
                None => self.changed.push(change),
            }
        }
    }
}

/// Full diff across categories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diff {
    #[serde(default, skip_serializing_if = "CategoryDiff::is_empty")]
    pub drawings: CategoryDiff,
    #[serde(default, skip_serializing_if = "CategoryDiff::is_empty")]
    pub footprints: CategoryDiff,
}

impl Diff {
    pub fn category(&self, category: Category) -> &CategoryDiff {
        match category {
            Category::Drawings => &self.drawings,
            Category::Footprints => &self.footprints,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty() && self.footprints.is_empty()
    }

    pub fn merge(&mut self, other: Diff) {
        self.drawings.merge(other.drawings);
        self.footprints.merge(other.footprints);
    }
}
