//! # Fact Store
//!
//! The `FactStore` trait is the narrow interface the engines compose. Each
//! primitive is assumed atomic on its own; the engines never rely on more.
//!
//! All fallible operations return `Result<T, TagScopeError>` to support both
//! in-memory and persistent storage backends uniformly.
//!
//! `MemStore` is the in-memory implementation. It keys facts by `FactKey`,
//! so a store can never hold two variants of the same fact.

use crate::{EntityId, Fact, FactKey, Tag, TagScopeError, Term};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// FACTSTORE TRAIT
// =============================================================================

/// Storage primitives for tagged facts.
pub trait FactStore {
    /// Every fact in the store, optionally with the imports closure.
    fn all_facts(&self, include_imports: bool) -> Result<BTreeSet<Fact>, TagScopeError>;

    /// Insert a fact. An existing fact with the same key is overwritten.
    fn insert(&mut self, fact: Fact) -> Result<(), TagScopeError>;

    /// Remove exactly this fact (key and tags). Returns whether it was present.
    fn remove(&mut self, fact: &Fact) -> Result<bool, TagScopeError>;

    /// Facts whose body equals `candidate`'s body, annotations and tags ignored.
    fn facts_with_same_base(
        &self,
        candidate: &Fact,
        include_imports: bool,
    ) -> Result<BTreeSet<Fact>, TagScopeError> {
        Ok(self
            .all_facts(include_imports)?
            .into_iter()
            .filter(|fact| fact.same_body(candidate))
            .collect())
    }

    /// The stored variant of `candidate`: same body and regular annotations.
    fn variant_of(&self, candidate: &Fact) -> Result<Option<Fact>, TagScopeError> {
        Ok(self
            .facts_with_same_base(candidate, false)?
            .into_iter()
            .find(|fact| fact.is_variant_of(candidate)))
    }

    /// Replace `old` with `new` as one step.
    ///
    /// The default runs `remove` then `insert`. Stores with transactions
    /// should override this so the pair commits together.
    fn replace(&mut self, old: &Fact, new: Fact) -> Result<(), TagScopeError> {
        self.remove(old)?;
        self.insert(new)
    }

    /// Declaration facts of `entity` in this store (imports excluded).
    fn declarations_of(&self, entity: &EntityId) -> Result<Vec<Fact>, TagScopeError> {
        Ok(self
            .all_facts(false)?
            .into_iter()
            .filter(|fact| fact.body().declared_entity() == Some(entity))
            .collect())
    }

    /// Property assertions whose subject is `subject` (imports excluded).
    fn assertions_about(&self, subject: &Term) -> Result<Vec<Fact>, TagScopeError> {
        Ok(self
            .all_facts(false)?
            .into_iter()
            .filter(|fact| {
                fact.body()
                    .as_assertion()
                    .is_some_and(|a| &a.subject == subject)
            })
            .collect())
    }

    /// Number of facts in this store (imports excluded).
    fn fact_count(&self) -> Result<usize, TagScopeError> {
        Ok(self.all_facts(false)?.len())
    }
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// In-memory fact store with an optional list of imported stores.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    /// FactKey -> tags
    facts: BTreeMap<FactKey, BTreeSet<Tag>>,

    /// Directly imported stores. The closure is taken transitively.
    imports: Vec<MemStore>,
}

impl MemStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from facts. Later facts overwrite earlier variants.
    #[must_use]
    pub fn from_facts(facts: impl IntoIterator<Item = Fact>) -> Self {
        let mut store = Self::new();
        for fact in facts {
            store.put(fact);
        }
        store
    }

    /// Add a directly imported store.
    #[must_use]
    pub fn with_import(mut self, import: MemStore) -> Self {
        self.imports.push(import);
        self
    }

    /// Directly imported stores.
    #[must_use]
    pub fn imports(&self) -> &[MemStore] {
        &self.imports
    }

    /// Iterate this store's own facts in key order.
    pub fn facts(&self) -> impl Iterator<Item = Fact> + '_ {
        self.facts
            .iter()
            .map(|(key, tags)| Fact::from_parts(key.clone(), tags.clone()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Tags currently held by the fact with this key.
    #[must_use]
    pub fn tags_of(&self, key: &FactKey) -> Option<&BTreeSet<Tag>> {
        self.facts.get(key)
    }

    fn put(&mut self, fact: Fact) {
        let tags = fact.tags().clone();
        self.facts.insert(fact.into_key(), tags);
    }

    fn collect_closure(&self, out: &mut BTreeSet<Fact>) {
        out.extend(self.facts());
        for import in &self.imports {
            import.collect_closure(out);
        }
    }
}

impl FactStore for MemStore {
    fn all_facts(&self, include_imports: bool) -> Result<BTreeSet<Fact>, TagScopeError> {
        let mut out = BTreeSet::new();
        if include_imports {
            self.collect_closure(&mut out);
        } else {
            out.extend(self.facts());
        }
        Ok(out)
    }

    fn insert(&mut self, fact: Fact) -> Result<(), TagScopeError> {
        self.put(fact);
        Ok(())
    }

    fn remove(&mut self, fact: &Fact) -> Result<bool, TagScopeError> {
        if self.facts.get(fact.key()) == Some(fact.tags()) {
            self.facts.remove(fact.key());
            return Ok(true);
        }
        Ok(false)
    }

    fn variant_of(&self, candidate: &Fact) -> Result<Option<Fact>, TagScopeError> {
        Ok(self
            .facts
            .get(candidate.key())
            .map(|tags| candidate.retagged(tags.clone())))
    }

    fn fact_count(&self) -> Result<usize, TagScopeError> {
        Ok(self.facts.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================
