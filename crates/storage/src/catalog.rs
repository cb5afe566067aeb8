//! Item catalog
//!
//! The catalog is the authoritative enumeration of known items for backends
//! that cannot cheaply list their contents. It is persisted as a single JSON
//! array under the reserved identifier
//! [`CATALOG_ID`](savepoint_core::CATALOG_ID). Meta identifiers and the
//! catalog's own identifier are never catalog entries.

use serde::{Deserialize, Serialize};

/// Ordered, duplicate-free list of known item identifiers
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Catalog {
    entries: Vec<String>,
}

impl Catalog {
    /// Append an identifier if not already present. Returns whether the
    /// catalog changed.
    pub fn add(&mut self, identifier: &str) -> bool {
        if self.contains(identifier) {
            return false;
        }
        self.entries.push(identifier.to_string());
        true
    }

    /// Remove an identifier. Returns whether the catalog changed.
    pub fn remove(&mut self, identifier: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry != identifier);
        self.entries.len() != before
    }

    /// Replace one identifier with another, preserving uniqueness. Returns
    /// whether the catalog changed.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        let removed = self.remove(old);
        let added = self.add(new);
        removed || added
    }

    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.iter().any(|entry| entry == identifier)
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent() {
        let mut catalog = Catalog::default();
        assert!(catalog.add("player/save1"));
        assert!(!catalog.add("player/save1"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn persists_as_a_plain_json_array() {
        let mut catalog = Catalog::default();
        catalog.add("a");
        catalog.add("b");

        let json = serde_json::to_string(&catalog).unwrap();
        assert_eq!(json, r#"["a","b"]"#);

        let parsed: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, catalog);
    }

    #[test]
    fn rename_preserves_uniqueness() {
        let mut catalog = Catalog::default();
        catalog.add("old");
        catalog.add("new");
        catalog.rename("old", "new");
        assert_eq!(catalog.entries(), ["new"]);
    }
}
