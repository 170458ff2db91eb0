//! # Formats
//!
//! Byte-level encodings of fact stores. No file I/O happens here.

pub mod persistence;

pub use persistence::{SnapshotHeader, store_from_bytes, store_to_bytes};
