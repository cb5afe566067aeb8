//! Typed outcome values for best-effort operations
//!
//! Bulk and backup operations do not fail fast; they report how far they
//! got. Move and copy additionally report the final identifier, which may
//! differ from the requested destination when the destination was an
//! existing directory.

/// Outcome of deleting one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    pub succeeded: bool,
}

impl DeleteResult {
    #[must_use]
    pub fn success() -> Self {
        Self { succeeded: true }
    }

    #[must_use]
    pub fn failure() -> Self {
        Self { succeeded: false }
    }
}

/// Outcome of moving an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    pub succeeded: bool,
    /// Final identifier of the moved item
    pub identifier: Option<String>,
}

impl MoveResult {
    #[must_use]
    pub fn success(identifier: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            identifier: Some(identifier.into()),
        }
    }
}

/// Outcome of copying an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyResult {
    pub succeeded: bool,
    /// Final identifier of the copy
    pub identifier: Option<String>,
}

impl CopyResult {
    #[must_use]
    pub fn success(identifier: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            identifier: Some(identifier.into()),
        }
    }
}

/// Aggregate outcome of a bulk deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearResult {
    /// Boolean AND across every attempted sub-operation
    pub succeeded: bool,
    /// Identifiers the operation attempted to delete
    pub identifiers: Vec<String>,
}
