//! # Persistence Format
//!
//! Binary snapshots of a `MemStore`.
//!
//! Format: Header (5 bytes) + postcard-serialized facts.
//! - 4 bytes: Magic ("TAGS")
//! - 1 byte: Version
//!
//! Only the store's own facts are written. Imported stores are resolved by
//! whoever assembles the store and are not part of a snapshot.
//!
//! Size and header are validated before the payload is decoded. File I/O is
//! left to the caller.

use crate::primitives::{FORMAT_VERSION, MAGIC_BYTES, MAX_SNAPSHOT_PAYLOAD_SIZE};
use crate::store::MemStore;
use crate::{Fact, TagScopeError};
use serde::{Deserialize, Serialize};

/// Header length in bytes.
const HEADER_SIZE: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The snapshot header precedes all fact data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), TagScopeError> {
        if &self.magic != MAGIC_BYTES {
            return Err(TagScopeError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(TagScopeError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TagScopeError> {
        let Some(header) = bytes.get(..HEADER_SIZE) else {
            return Err(TagScopeError::DeserializationError(
                "Header too short".to_string(),
            ));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[0..4]);
        Ok(Self {
            magic,
            version: header[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

#[derive(Serialize, Deserialize)]
struct Snapshot {
    facts: Vec<Fact>,
}

/// Serialize a store's own facts (header + payload).
pub fn store_to_bytes(store: &MemStore) -> Result<Vec<u8>, TagScopeError> {
    let snapshot = Snapshot {
        facts: store.facts().collect(),
    };
    let payload = postcard::to_stdvec(&snapshot)
        .map_err(|e| TagScopeError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_SIZE + payload.len());
    result.extend_from_slice(&SnapshotHeader::new().to_bytes());
    result.extend_from_slice(&payload);

    tracing::debug!(facts = snapshot.facts.len(), bytes = result.len(), "encoded snapshot");
    Ok(result)
}

/// Deserialize a store from a snapshot.
pub fn store_from_bytes(bytes: &[u8]) -> Result<MemStore, TagScopeError> {
    if bytes.len() > MAX_SNAPSHOT_PAYLOAD_SIZE {
        return Err(TagScopeError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_PAYLOAD_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = bytes.get(HEADER_SIZE..).unwrap_or_default();
    let snapshot: Snapshot = postcard::from_bytes(payload).map_err(|e| {
        TagScopeError::DeserializationError(format!("Failed to decode snapshot: {}", e))
    })?;

    Ok(MemStore::from_facts(snapshot.facts))
}

// =============================================================================
// TESTS
// =============================================================================
