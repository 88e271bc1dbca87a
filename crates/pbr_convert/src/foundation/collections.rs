//! Specialized collection types

use std::collections::HashSet;
use std::hash::Hash;

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable handle to a texture owned by a [`Document`](crate::scene::Document)
    pub struct TextureKey;

    /// Stable handle to a material owned by a [`Document`](crate::scene::Document)
    pub struct MaterialKey;
}

/// Set that remembers insertion order
///
/// Used where iteration order must be deterministic but duplicates are
/// meaningless, e.g. textures shared between several materials.
#[derive(Debug, Clone)]
pub struct InsertionSet<T> {
    items: Vec<T>,
    seen: HashSet<T>,
}

impl<T: Copy + Eq + Hash> InsertionSet<T> {
    /// Create a new empty set
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Insert an item, returning `false` if it was already present
    pub fn insert(&mut self, item: T) -> bool {
        if self.seen.insert(item) {
            self.items.push(item);
            true
        } else {
            false
        }
    }

    /// Insert every present item of an iterator of optional values
    pub fn extend_present<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = Option<T>>,
    {
        for item in items.into_iter().flatten() {
            self.insert(item);
        }
    }

    /// Check membership
    pub fn contains(&self, item: &T) -> bool {
        self.seen.contains(item)
    }

    /// Number of distinct items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Copy + Eq + Hash> Default for InsertionSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IntoIterator for InsertionSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
