//! Proposed change value objects.
//!
//! A case carries an ordered set of named change items. Mediation rounds
//! produce deltas that append new items or override existing ones by name;
//! applying a delta never mutates the set in place, so prior rounds'
//! snapshots stay intact on the aggregate.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One named change: an old/new value pair for a clause or field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeItem {
    /// Name of the clause or field being changed.
    pub name: String,
    /// Value before the amendment.
    pub old_value: JsonValue,
    /// Proposed value after the amendment.
    pub new_value: JsonValue,
}

impl ChangeItem {
    /// Creates a new change item.
    pub fn new(name: impl Into<String>, old_value: JsonValue, new_value: JsonValue) -> Self {
        Self {
            name: name.into(),
            old_value,
            new_value,
        }
    }
}

/// Ordered sequence of named change items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    items: Vec<ChangeItem>,
}

impl ChangeSet {
    /// Creates a change set from items, preserving order.
    pub fn from_items(items: Vec<ChangeItem>) -> Self {
        Self { items }
    }

    /// Returns the items in order.
    pub fn items(&self) -> &[ChangeItem] {
        &self.items
    }

    /// Returns the item with the given name, if present.
    pub fn get(&self, name: &str) -> Option<&ChangeItem> {
        self.items.iter().find(|item| item.name == name)
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the set has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Applies a compromise delta, returning the resulting set.
    ///
    /// Items whose names already exist are overridden in place (keeping
    /// their position); new names are appended in delta order.
    pub fn apply(&self, delta: &ChangeDelta) -> ChangeSet {
        let mut items = self.items.clone();
        for delta_item in &delta.items {
            match items.iter_mut().find(|item| item.name == delta_item.name) {
                Some(existing) => *existing = delta_item.clone(),
                None => items.push(delta_item.clone()),
            }
        }
        ChangeSet { items }
    }
}

/// Compromise change-set delta produced by the mediation capability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeDelta {
    /// Items to append or override by name.
    pub items: Vec<ChangeItem>,
}

impl ChangeDelta {
    /// Creates a delta from items.
    pub fn from_items(items: Vec<ChangeItem>) -> Self {
        Self { items }
    }

    /// Returns true if the delta carries no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
