//! Core domain types, errors, and constants for the `savepoint` workspace.
//!
//! This crate establishes the foundational building blocks shared by the
//! storage layer and the save/load facade.
//!
//! ## Key Components
//!
//! - **`errors`**: Defines the primary `Error` enum and `Result` type alias,
//!   centralizing all failure modes for predictable error handling.
//! - **`events`**: A broadcast-based event bus publishing save/load lifecycle
//!   events without coupling publishers to subscribers.
//! - **`constants`**: Reserved identifier suffixes and metadata key names
//!   shared by every backend.

pub mod constants;
pub mod errors;
pub mod events;

pub use self::{
    constants::*,
    errors::{Error, Result},
    events::{EventBus, StorageEvent},
};
