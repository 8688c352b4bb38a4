//! Shadow model: serializable mirror of board contents.
//!
//! # Responsibility
//! - Hold drawing and footprint entries keyed by `Kiid`.
//! - Compute the per-entry content hash used for change detection.
//!
//! # Invariants
//! - `kiid` is unique within each collection.
//! - `hash` is the hex SHA-256 of the entry's canonical JSON form (keys
//!   sorted, `hash` excluded, `kiid` included).
//! - Sections other than `drawings` and `footprints` round-trip untouched.

use crate::model::geometry::{ShapeKind, PROP_SHAPE};
use crate::model::kiid::Kiid;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const KEY_KIID: &str = "kiid";
const KEY_HASH: &str = "hash";

/// Object category shared by the shadow model and diffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Drawings,
    Footprints,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Drawings => "drawings",
            Self::Footprints => "footprints",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mirrored board object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowEntry {
    pub kiid: Kiid,
    #[serde(default)]
    pub hash: String,
    /// Remaining properties (`shape`, `start`, `ref`, `pos`, ...).
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl ShadowEntry {
    /// Creates an entry with a freshly computed hash.
    ///
    /// Stray `kiid` / `hash` keys in `properties` are dropped.
    pub fn new(kiid: Kiid, mut properties: Map<String, Value>) -> Self {
        properties.remove(KEY_KIID);
        properties.remove(KEY_HASH);
        let mut entry = Self {
            kiid,
            hash: String::new(),
            properties,
        };
        entry.refresh_hash();
        entry
    }

    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }

    /// Writes one property. Does not touch `hash`; call `refresh_hash` after a batch.
    pub fn set_property(&mut self, property: impl Into<String>, value: Value) {
        self.properties.insert(property.into(), value);
    }

    /// Shape tag of a drawing entry, when present and recognized.
    pub fn shape_kind(&self) -> Option<ShapeKind> {
        self.get(PROP_SHAPE)
            .and_then(Value::as_str)
            .and_then(ShapeKind::parse)
    }

    /// Digest of the canonical serialization of this entry.
    pub fn compute_hash(&self) -> String {
        let mut canonical = self.properties.clone();
        canonical.insert(KEY_KIID.to_string(), Value::from(self.kiid.as_str()));
        let mut hasher = Sha256::new();
        hasher.update(Value::Object(canonical).to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn refresh_hash(&mut self) {
        self.hash = self.compute_hash();
    }

    pub fn hash_is_current(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

/// Shadow model errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShadowError {
    DuplicateKiid { category: Category, kiid: Kiid },
}

impl Display for ShadowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateKiid { category, kiid } => {
                write!(f, "duplicate kiid in {category}: {kiid}")
            }
        }
    }
}

impl Error for ShadowError {}

/// Mirror of board contents owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowModel {
    #[serde(default)]
    pub drawings: Vec<ShadowEntry>,
    #[serde(default)]
    pub footprints: Vec<ShadowEntry>,
    /// Other sections (`general`, `vias`, ...), preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ShadowModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self, category: Category) -> &[ShadowEntry] {
        match category {
            Category::Drawings => &self.drawings,
            Category::Footprints => &self.footprints,
        }
    }

    pub fn entries_mut(&mut self, category: Category) -> &mut Vec<ShadowEntry> {
        match category {
            Category::Drawings => &mut self.drawings,
            Category::Footprints => &mut self.footprints,
        }
    }

    pub fn find(&self, category: Category, kiid: &Kiid) -> Option<&ShadowEntry> {
        self.entries(category).iter().find(|entry| &entry.kiid == kiid)
    }

    pub fn find_mut(&mut self, category: Category, kiid: &Kiid) -> Option<&mut ShadowEntry> {
        self.entries_mut(category)
            .iter_mut()
            .find(|entry| &entry.kiid == kiid)
    }

    pub fn contains(&self, category: Category, kiid: &Kiid) -> bool {
        self.find(category, kiid).is_some()
    }

    /// Checks kiid uniqueness in both collections.
    pub fn validate(&self) -> Result<(), ShadowError> {
        for category in [Category::Drawings, Category::Footprints] {
            let mut seen = HashSet::new();
            for entry in self.entries(category) {
                if !seen.insert(&entry.kiid) {
                    return Err(ShadowError::DuplicateKiid {
                        category,
                        kiid: entry.kiid.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Recomputes every entry hash, e.g. after importing hashes from another digest scheme.
    pub fn refresh_hashes(&mut self) {
        self.drawings
            .iter_mut()
            .chain(self.footprints.iter_mut())
            .for_each(ShadowEntry::refresh_hash);
    }
}

#[cfg(test)]
mod tests {
    use super::{ShadowEntry, ShadowModel};
    use crate::model::kiid::Kiid;
    use serde_json::{json, Map, Value};

    fn props(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test input must be an object"),
        }
    }

    #[test]
    fn hash_ignores_previous_hash_value() {
        let kiid = Kiid::new("k1").unwrap();
        let mut entry = ShadowEntry::new(kiid, props(json!({"shape": "Line"})));
        let first = entry.hash.clone();
        entry.hash = "stale".to_string();
        assert_eq!(entry.compute_hash(), first);
    }

    #[test]
    fn hash_depends_on_kiid() {
        let a = ShadowEntry::new(Kiid::new("a").unwrap(), props(json!({"ref": "R1"})));
        let b = ShadowEntry::new(Kiid::new("b").unwrap(), props(json!({"ref": "R1"})));
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn new_drops_reserved_keys_from_properties() {
        let entry = ShadowEntry::new(
            Kiid::new("k").unwrap(),
            props(json!({"kiid": "other", "hash": "x", "ref": "R1"})),
        );
        assert_eq!(entry.kiid.as_str(), "k");
        assert!(entry.get("hash").is_none());
        assert!(entry.hash_is_current());
    }

    #[test]
    fn unknown_sections_round_trip() {
        let raw = json!({
            "general": {"pcb_name": "test"},
            "drawings": [],
            "footprints": [],
            "vias": []
        });
        let model: ShadowModel = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&model).unwrap(), raw);
    }
}
