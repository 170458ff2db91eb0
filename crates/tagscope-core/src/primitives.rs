//! # Innate Primitives
//!
//! Hardcoded constants for the tagscope engines.
//!
//! These values are compiled into the binary and immutable at runtime.
//! Anything a deployment may want to change lives in `EngineConfig` instead.

/// Default annotation property marking an annotation as a tag.
///
/// An annotation `(TAG_MARKER_IRI, <tag-iri>)` on a fact means the fact
/// carries the tag `<tag-iri>`. Every other annotation is regular.
pub const TAG_MARKER_IRI: &str =
    "http://www.corporate-semantic-web.de/ontologies/aspect/owl#isPointcutOf";

/// Magic bytes for the store snapshot header.
///
/// - File Header = Magic Bytes ("TAGS") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"TAGS";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;

/// Upper bound on fixpoint rounds in the bundled module extractor.
///
/// Each round adds every fact touching the current signature, so a closure
/// that has not converged after this many rounds is cut off.
pub const MAX_CLOSURE_ROUNDS: usize = 64;

/// Maximum snapshot payload accepted before decoding (256 MB).
pub const MAX_SNAPSHOT_PAYLOAD_SIZE: usize = 256 * 1024 * 1024;
