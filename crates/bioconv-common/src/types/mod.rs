//! Common types used across bioconv
//!
//! An [`Item`] is the unit every converter emits: a class name, a run-unique
//! identifier, plain string attributes, single-valued references and
//! multi-valued collections pointing at other items.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of an item within one run (e.g. `"1_42"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRef(String);

impl ItemRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A typed record handed to an item sink.
///
/// Collections behave as insertion-ordered sets: adding a reference that is
/// already present does nothing.
///
/// # Examples
///
/// ```
/// use bioconv_common::types::{Item, ItemRef};
///
/// let mut regulation = Item::new("TranscriptionalRegulation", ItemRef::new("1_7"));
/// regulation.add_to_collection("experiments", ItemRef::new("1_3"));
/// regulation.add_to_collection("experiments", ItemRef::new("1_3"));
/// assert_eq!(regulation.collection("experiments").len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Model class name (e.g. "Gene", "Interaction")
    pub class: String,

    /// Run-unique identifier
    pub identifier: ItemRef,

    /// Plain attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    /// Single-valued references to other items
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub references: BTreeMap<String, ItemRef>,

    /// Multi-valued references to other items
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub collections: BTreeMap<String, Vec<ItemRef>>,
}

impl Item {
    pub fn new(class: impl Into<String>, identifier: ItemRef) -> Self {
        Self {
            class: class.into(),
            identifier,
            attributes: BTreeMap::new(),
            references: BTreeMap::new(),
            collections: BTreeMap::new(),
        }
    }

    /// Reference to this item, for use by other items
    pub fn item_ref(&self) -> ItemRef {
        self.identifier.clone()
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn set_reference(&mut self, name: &str, target: ItemRef) {
        self.references.insert(name.to_string(), target);
    }

    /// Add a reference to a collection, ignoring duplicates
    ///
    /// Returns `true` if the reference was not already present.
    pub fn add_to_collection(&mut self, name: &str, target: ItemRef) -> bool {
        let refs = self.collections.entry(name.to_string()).or_default();
        if refs.contains(&target) {
            return false;
        }
        refs.push(target);
        true
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn reference(&self, name: &str) -> Option<&ItemRef> {
        self.references.get(name)
    }

    /// Members of a collection; empty when the collection was never populated
    pub fn collection(&self, name: &str) -> &[ItemRef] {
        self.collections.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_class(&self, class: &str) -> bool {
        self.class == class
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_collection_keeps_insertion_order() {
        let mut item = Item::new("Protein", ItemRef::new("1_1"));
        assert!(item.add_to_collection("pathways", ItemRef::new("1_9")));
        assert!(item.add_to_collection("pathways", ItemRef::new("1_2")));
        assert!(!item.add_to_collection("pathways", ItemRef::new("1_9")));

        let members: Vec<&str> = item.collection("pathways").iter().map(ItemRef::as_str).collect();
        assert_eq!(members, vec!["1_9", "1_2"]);
    }

    #[test]
    fn test_missing_collection_is_empty() {
        let item = Item::new("Gene", ItemRef::new("1_1"));
        assert!(item.collection("synonyms").is_empty());
        assert!(item.reference("organism").is_none());
    }

    #[test]
    fn test_serialization_skips_empty_maps() {
        let mut item = Item::new("Organism", ItemRef::new("1_0"));
        item.set_attribute("taxonId", "9606");

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["class"], "Organism");
        assert_eq!(json["identifier"], "1_0");
        assert_eq!(json["attributes"]["taxonId"], "9606");
        assert!(json.get("references").is_none());
        assert!(json.get("collections").is_none());

        let back: Item = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    proptest! {
        #[test]
        fn prop_collection_is_a_set(ids in proptest::collection::vec(0u8..10, 0..50)) {
            let mut item = Item::new("Interaction", ItemRef::new("1_1"));
            for id in &ids {
                item.add_to_collection("evidence", ItemRef::new(id.to_string()));
            }

            let mut distinct = ids.clone();
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert_eq!(item.collection("evidence").len(), distinct.len());
        }
    }
}
