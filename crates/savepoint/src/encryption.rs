//! Encryption collaborator
//!
//! Encryption is an opaque capability: a reversible byte-buffer transform
//! applied after serialization and before the storage stream is written.
//! Implementations carry their own key material; no algorithm is provided
//! by this crate. Because the transform completes before the stream is
//! committed, ciphertext is always fully flushed by construction.

use savepoint_core::Result;

/// Reversible payload transform applied around serialization
pub trait Encryption: Send + Sync {
    fn encrypt(&self, identifier: &str, plaintext: &[u8]) -> Result<Vec<u8>>;

    fn decrypt(&self, identifier: &str, ciphertext: &[u8]) -> Result<Vec<u8>>;
}
