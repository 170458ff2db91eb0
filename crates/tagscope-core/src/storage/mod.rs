//! # Storage Backends
//!
//! Persistent implementations of `FactStore`.

pub mod redb_store;

pub use redb_store::RedbFactStore;
