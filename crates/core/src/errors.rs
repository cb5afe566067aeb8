/// Result type alias for savepoint operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for savepoint operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A read, delete, move or copy source does not exist
    #[error("storage item '{identifier}' was not found")]
    ItemNotFound { identifier: String },

    /// The identifier is structurally invalid for the backend
    #[error("identifier '{identifier}' is invalid: {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    /// Backend I/O failures that are neither "not found" nor "invalid
    /// identifier" are propagated unchanged inside this variant
    #[error("storage {operation} operation failed for '{identifier}': {source}")]
    Io {
        identifier: String,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization errors for catalogs, metadata and
    /// facade payloads
    #[error("failed to {operation} '{identifier}': {source}")]
    Serialization {
        identifier: String,
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

// Helper methods for creating errors with context
impl Error {
    /// Create an item-not-found error
    #[must_use]
    pub fn item_not_found(identifier: impl Into<String>) -> Self {
        Error::ItemNotFound {
            identifier: identifier.into(),
        }
    }

    /// Create an invalid-identifier error
    #[must_use]
    pub fn invalid_identifier(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidIdentifier {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    /// Create an I/O error with context
    #[must_use]
    pub fn io(
        identifier: impl Into<String>,
        operation: &'static str,
        source: std::io::Error,
    ) -> Self {
        Error::Io {
            identifier: identifier.into(),
            operation,
            source,
        }
    }

    /// Create a serialization error with context
    #[must_use]
    pub fn serialization(
        identifier: impl Into<String>,
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            identifier: identifier.into(),
            operation,
            source: source.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error means the addressed item does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ItemNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_predicate_matches_only_not_found() {
        assert!(Error::item_not_found("player/save1").is_not_found());
        assert!(!Error::configuration("bad settings").is_not_found());
    }

    #[test]
    fn io_error_display_includes_identifier_and_operation() {
        let err = Error::io(
            "player/save1",
            "read",
            std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"),
        );
        let rendered = err.to_string();
        assert!(rendered.contains("player/save1"));
        assert!(rendered.contains("read"));
    }
}
