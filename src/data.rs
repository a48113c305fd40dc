use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::GenerationError;
pub use crate::types::{ItemId, Marks, TagValue, TopicId};

fn default_active() -> bool {
    true
}

/// A single pre-authored question as seen by the selection engine.
///
/// Only `marks` and the categorical tags drive selection; `payload` is carried
/// through untouched for renderers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable question identifier.
    pub id: ItemId,
    /// Topic the question belongs to (used for pool scoping).
    pub topic: TopicId,
    /// Marks awarded for the whole question.
    pub marks: Marks,
    /// True for multi-part (nested) questions.
    #[serde(default)]
    pub nested: bool,
    /// Paper section label, e.g. `A` or `II`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<TagValue>,
    /// Question type, e.g. `map` or `cloze`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TagValue>,
    /// Free-form difficulty tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<TagValue>,
    /// Inactive questions are never loaded into a pool.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Opaque question content (text, answers, images).
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl Item {
    /// Build an active, standalone item with no tags.
    pub fn new(id: impl Into<ItemId>, topic: impl Into<TopicId>, marks: Marks) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            marks,
            nested: false,
            section: None,
            kind: None,
            difficulty: None,
            active: true,
            payload: serde_json::Value::Null,
        }
    }

    /// Mark the item as nested (or standalone).
    pub fn with_nested(mut self, nested: bool) -> Self {
        self.nested = nested;
        self
    }

    /// Attach a section label.
    pub fn with_section(mut self, section: impl Into<TagValue>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Attach a question type.
    pub fn with_kind(mut self, kind: impl Into<TagValue>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// Read-only question pool for one generation call.
#[derive(Clone, Debug, Default)]
pub struct Pool {
    topics: Vec<TopicId>,
    items: Vec<Item>,
}

impl Pool {
    /// Build a pool from source items, keeping active items in `topics`.
    ///
    /// An empty `topics` slice keeps every active item. Duplicate ids are a
    /// source inconsistency since uniqueness is tracked per pool index.
    pub fn new(topics: Vec<TopicId>, items: Vec<Item>) -> Result<Self, GenerationError> {
        let scope: HashSet<&str> = topics.iter().map(String::as_str).collect();
        let mut seen: HashSet<ItemId> = HashSet::new();
        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            if !item.active || (!scope.is_empty() && !scope.contains(item.topic.as_str())) {
                continue;
            }
            if !seen.insert(item.id.clone()) {
                return Err(GenerationError::duplicate_item("pool", &item.id));
            }
            kept.push(item);
        }
        Ok(Self {
            topics,
            items: kept,
        })
    }

    /// Topics this pool was scoped to.
    pub fn topics(&self) -> &[TopicId] {
        &self.topics
    }

    /// Items in source order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Item at pool index `idx`.
    pub fn get(&self, idx: usize) -> Option<&Item> {
        self.items.get(idx)
    }

    /// Marks of the item at `idx` (zero for out-of-range indices).
    pub fn marks_at(&self, idx: usize) -> Marks {
        self.items.get(idx).map(|item| item.marks).unwrap_or(0)
    }

    /// Number of items in the pool.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the pool holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
