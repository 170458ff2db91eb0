//! # tagscope-core
//!
//! Tag-qualified views over a shared fact store.
//!
//! Facts carry tags (aspects) layered on top of their content. This crate
//! evaluates DNF tag predicates and builds everything else on that one
//! evaluation:
//! - filtering of facts, entities, anonymous individuals and relation pairs,
//! - containment of a candidate fact modulo its tags,
//! - counting, always as the size of a filtering result,
//! - reconciliation of Add/Remove edits that merge and strip tags without
//!   ever deleting content.
//!
//! ## Architectural Constraints
//!
//! - Synchronous: every operation runs to completion on the calling thread
//! - Deterministic: `BTreeMap`/`BTreeSet` only
//! - Collaborators (predicate resolution, module extraction, query
//!   filtering) are traits; the engines never reach for global state

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
pub mod containment;
pub mod counting;
pub mod dispatch;
pub mod filter;
pub mod formats;
pub mod module;
pub mod predicate;
pub mod primitives;
pub mod reconcile;
pub mod relation;
pub mod storage;
pub mod store;
pub mod types;
pub mod vocabulary;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AnonId, Annotation, AnnotationValue, Assertion, EntityId, EntityKind, Fact, FactBody, FactKey,
    FactKind, Literal, Polarity, PropertyId, RelationKind, Tag, TagScopeError, Term,
};

// =============================================================================
// RE-EXPORTS: Predicates & Configuration
// =============================================================================

pub use config::EngineConfig;
pub use predicate::{Clause, PredicateForm, TagPredicate, evaluate};
pub use vocabulary::TagVocabulary;

// =============================================================================
// RE-EXPORTS: Engines
// =============================================================================

pub use containment::{ContainmentOptions, contains};
pub use counting::{CountEngine, count};
pub use filter::{
    FilterEngine, filter_anonymous, filter_entities, filter_entities_across_stores, filter_facts,
    filter_facts_across_stores,
};
pub use module::{ModuleExtractor, ReferencingClosure};
pub use reconcile::{Change, Edit, EditOutcome, EditReport, ReconcileEngine};
pub use relation::{
    RelationMap, RelationSelector, filter_relation, filter_relation_across_stores,
};

// =============================================================================
// RE-EXPORTS: Stores & Dispatch
// =============================================================================

pub use dispatch::{
    AspectView, Operation, OperationTable, PredicateResolver, PredicateSource, QueryFilter,
    ScopeGuard, ScopeStack,
};
pub use store::{FactStore, MemStore};
pub use storage::RedbFactStore;

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{SnapshotHeader, store_from_bytes, store_to_bytes};
