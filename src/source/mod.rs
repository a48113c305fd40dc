//! Question sources that feed generation pools.
//!
//! Ownership model:
//! - `ItemSource` is the generator-facing interface that yields the active
//!   question set for a topic scope.
//! - The generator turns the returned items into a `Pool`, which applies
//!   topic scoping and id uniqueness regardless of what the source did.

use crate::data::Item;
use crate::errors::GenerationError;
use crate::types::TopicId;

/// Filesystem-backed JSON item source.
pub mod file_source;

pub use file_source::FileItemSource;

/// Generator-facing question source.
///
/// For a fixed store state, `load_items` should return items in a stable
/// order so that seeded generation is reproducible.
pub trait ItemSource {
    /// Stable source identifier used in errors and logs.
    fn id(&self) -> &str;

    /// Load candidate items for `topics`.
    ///
    /// Implementations may return items outside the scope or inactive items;
    /// the pool filters both.
    fn load_items(&self, topics: &[TopicId]) -> Result<Vec<Item>, GenerationError>;
}

/// Item source over an in-memory list.
#[derive(Clone, Debug, Default)]
pub struct InMemoryItemSource {
    id: String,
    items: Vec<Item>,
}

impl InMemoryItemSource {
    /// Create a source named `id` over `items`.
    pub fn new(id: impl Into<String>, items: Vec<Item>) -> Self {
        Self {
            id: id.into(),
            items,
        }
    }

    /// Append one item.
    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }
}

impl ItemSource for InMemoryItemSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn load_items(&self, topics: &[TopicId]) -> Result<Vec<Item>, GenerationError> {
        Ok(self
            .items
            .iter()
            .filter(|item| topics.is_empty() || topics.contains(&item.topic))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_source_filters_by_topic() {
        let mut source = InMemoryItemSource::new("mem", vec![Item::new("a", "t1", 2)]);
        source.push(Item::new("b", "t2", 3));
        let scoped = source.load_items(&["t2".to_string()]).unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].id, "b");
        assert_eq!(source.load_items(&[]).unwrap().len(), 2);
        assert_eq!(source.id(), "mem");
    }
}
