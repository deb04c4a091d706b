//! DualSync Storage
//!
//! The narrow object-store capability the replication engine consumes,
//! plus two backends:
//!
//! - [`LocalObjectStore`]: buckets as directories on a local filesystem
//! - [`MemoryObjectStore`]: process-local maps, for tests and dry runs

mod engine;
mod local;
mod memory;

pub use engine::ObjectStore;
pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;

use sha2::{Digest, Sha256};

/// Content checksum used by the bundled backends (SHA-256, hex)
pub fn content_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
