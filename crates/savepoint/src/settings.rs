//! Facade composition settings
//!
//! Collaborators are injected explicitly: the storage, the serializer, the
//! optional encryption and the event bus all travel in one settings value.
//! There are no global singletons.

use crate::encryption::Encryption;
use crate::serializer::{JsonSerializer, Serializer};
use savepoint_core::EventBus;
use savepoint_storage::Storage;

/// Everything a [`SaveSystem`](crate::SaveSystem) needs to operate
pub struct SaveSystemSettings<S = JsonSerializer> {
    pub storage: Storage,
    pub serializer: S,
    pub encryption: Option<Box<dyn Encryption>>,
    /// Encrypt new saves. On load, an item's metadata overrides this flag
    /// when present.
    pub use_encryption: bool,
    pub events: EventBus,
}

impl SaveSystemSettings<JsonSerializer> {
    /// Settings over a storage with the default JSON serializer, no
    /// encryption and a fresh event bus
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            serializer: JsonSerializer,
            encryption: None,
            use_encryption: false,
            events: EventBus::default(),
        }
    }
}

impl<S: Serializer> SaveSystemSettings<S> {
    /// Swap the serializer
    pub fn with_serializer<S2: Serializer>(self, serializer: S2) -> SaveSystemSettings<S2> {
        SaveSystemSettings {
            storage: self.storage,
            serializer,
            encryption: self.encryption,
            use_encryption: self.use_encryption,
            events: self.events,
        }
    }

    /// Attach encryption and enable it for new saves
    #[must_use]
    pub fn with_encryption(mut self, encryption: Box<dyn Encryption>) -> Self {
        self.encryption = Some(encryption);
        self.use_encryption = true;
        self
    }

    /// Replace the event bus (e.g. to share one across systems)
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }
}
