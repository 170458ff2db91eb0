//! # redb-backed Fact Storage
//!
//! A disk-backed fact store using the redb embedded database.
//!
//! One table maps the postcard encoding of a `FactKey` to the postcard
//! encoding of its tag set. Keys are therefore unique per variant, and
//! `replace` runs its remove and insert inside a single write transaction.

use crate::store::{FactStore, MemStore};
use crate::{Fact, FactKey, Tag, TagScopeError};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::collections::BTreeSet;
use std::path::Path;

/// Table for facts: postcard(FactKey) -> postcard(BTreeSet<Tag>)
const FACTS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("facts");

/// A disk-backed fact store.
///
/// Imported stores are held in memory; only the store's own facts persist.
pub struct RedbFactStore {
    db: Database,
    imports: Vec<MemStore>,
}

impl std::fmt::Debug for RedbFactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbFactStore")
            .field("imports", &self.imports.len())
            .finish_non_exhaustive()
    }
}

fn io_err(e: impl std::fmt::Display) -> TagScopeError {
    TagScopeError::IoError(e.to_string())
}

fn encode_key(key: &FactKey) -> Result<Vec<u8>, TagScopeError> {
    postcard::to_allocvec(key).map_err(|e| TagScopeError::SerializationError(e.to_string()))
}

fn encode_tags(tags: &BTreeSet<Tag>) -> Result<Vec<u8>, TagScopeError> {
    postcard::to_allocvec(tags).map_err(|e| TagScopeError::SerializationError(e.to_string()))
}

fn decode_tags(bytes: &[u8]) -> Result<BTreeSet<Tag>, TagScopeError> {
    postcard::from_bytes(bytes).map_err(|e| TagScopeError::DeserializationError(e.to_string()))
}

impl RedbFactStore {
    /// Open or create a fact database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TagScopeError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize the table if it doesn't exist
        let write_txn = db.begin_write().map_err(io_err)?;
        let _ = write_txn.open_table(FACTS).map_err(io_err)?;
        write_txn.commit().map_err(io_err)?;

        Ok(Self {
            db,
            imports: Vec::new(),
        })
    }

    /// Add an in-memory imported store.
    #[must_use]
    pub fn with_import(mut self, import: MemStore) -> Self {
        self.imports.push(import);
        self
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), TagScopeError> {
        self.db.compact().map_err(io_err)?;
        Ok(())
    }

    /// Copy every fact of `store` in one transaction.
    pub fn import_from(&mut self, store: &MemStore) -> Result<usize, TagScopeError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let mut written = 0;
        {
            let mut table = write_txn.open_table(FACTS).map_err(io_err)?;
            for fact in store.facts() {
                let key = encode_key(fact.key())?;
                let tags = encode_tags(fact.tags())?;
                table
                    .insert(key.as_slice(), tags.as_slice())
                    .map_err(io_err)?;
                written += 1;
            }
        }
        write_txn.commit().map_err(io_err)?;
        Ok(written)
    }

    /// Load the whole store into memory.
    pub fn to_mem_store(&self) -> Result<MemStore, TagScopeError> {
        Ok(MemStore::from_facts(self.all_facts(false)?))
    }

    fn own_facts(&self) -> Result<BTreeSet<Fact>, TagScopeError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(FACTS).map_err(io_err)?;

        let mut facts = BTreeSet::new();
        for entry in table.iter().map_err(io_err)? {
            let (key, tags) = entry.map_err(io_err)?;
            let key: FactKey = postcard::from_bytes(key.value())
                .map_err(|e| TagScopeError::DeserializationError(e.to_string()))?;
            facts.insert(Fact::from_parts(key, decode_tags(tags.value())?));
        }
        Ok(facts)
    }
}

impl FactStore for RedbFactStore {
    fn all_facts(&self, include_imports: bool) -> Result<BTreeSet<Fact>, TagScopeError> {
        let mut facts = self.own_facts()?;
        if include_imports {
            for import in &self.imports {
                facts.extend(import.all_facts(true)?);
            }
        }
        Ok(facts)
    }

    fn insert(&mut self, fact: Fact) -> Result<(), TagScopeError> {
        let key = encode_key(fact.key())?;
        let tags = encode_tags(fact.tags())?;

        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(FACTS).map_err(io_err)?;
            table
                .insert(key.as_slice(), tags.as_slice())
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn remove(&mut self, fact: &Fact) -> Result<bool, TagScopeError> {
        let key = encode_key(fact.key())?;

        let write_txn = self.db.begin_write().map_err(io_err)?;
        let removed = {
            let mut table = write_txn.open_table(FACTS).map_err(io_err)?;
            let held = match table.get(key.as_slice()).map_err(io_err)? {
                Some(bytes) => Some(decode_tags(bytes.value())?),
                None => None,
            };
            if held.as_ref() == Some(fact.tags()) {
                table.remove(key.as_slice()).map_err(io_err)?;
                true
            } else {
                false
            }
        };
        write_txn.commit().map_err(io_err)?;
        Ok(removed)
    }

    fn variant_of(&self, candidate: &Fact) -> Result<Option<Fact>, TagScopeError> {
        let key = encode_key(candidate.key())?;
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(FACTS).map_err(io_err)?;

        match table.get(key.as_slice()).map_err(io_err)? {
            Some(bytes) => Ok(Some(candidate.retagged(decode_tags(bytes.value())?))),
            None => Ok(None),
        }
    }

    fn replace(&mut self, old: &Fact, new: Fact) -> Result<(), TagScopeError> {
        let old_key = encode_key(old.key())?;
        let new_key = encode_key(new.key())?;
        let new_tags = encode_tags(new.tags())?;

        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(FACTS).map_err(io_err)?;
            table.remove(old_key.as_slice()).map_err(io_err)?;
            table
                .insert(new_key.as_slice(), new_tags.as_slice())
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn fact_count(&self) -> Result<usize, TagScopeError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(FACTS).map_err(io_err)?;
        let len = table.len().map_err(io_err)?;
        usize::try_from(len).map_err(io_err)
    }
}

// =============================================================================
// TESTS
// =============================================================================
