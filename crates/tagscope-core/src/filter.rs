//! # Filtering Engine
//!
//! Restricts facts, entities and anonymous individuals to those admitted by a
//! tag predicate.
//!
//! The free functions are pure. `FilterEngine` adds the configured module
//! expansion on top of fact filtering: when `expand_modules` is set, the
//! filtered facts are unioned with the module the extractor builds from their
//! signature over the store.

use crate::module::{ModuleExtractor, ReferencingClosure};
use crate::predicate::TagPredicate;
use crate::store::FactStore;
use crate::{AnonId, EngineConfig, EntityId, Fact, TagScopeError};
use std::collections::BTreeSet;

// =============================================================================
// PURE FILTERS
// =============================================================================

/// Exactly the facts whose tags satisfy `predicate`.
pub fn filter_facts<'a>(
    facts: impl IntoIterator<Item = &'a Fact>,
    predicate: &TagPredicate,
) -> BTreeSet<Fact> {
    facts
        .into_iter()
        .filter(|fact| predicate.evaluate(fact.tags()))
        .cloned()
        .collect()
}

/// Union over `stores` of the per-store filtering of `facts`.
///
/// Candidates are judged by their own tags, so every store admits the same
/// subset of `facts` and the result never holds a fact outside `facts`. With
/// no stores the result is empty.
pub fn filter_facts_across_stores<'a, S: FactStore + 'a>(
    stores: impl IntoIterator<Item = &'a S>,
    facts: &BTreeSet<Fact>,
    predicate: &TagPredicate,
) -> BTreeSet<Fact> {
    if stores.into_iter().next().is_none() {
        return BTreeSet::new();
    }
    filter_facts(facts, predicate)
}

/// Entities with at least one declaration in `store` satisfying `predicate`.
///
/// The store is scanned once, whatever the number of entities.
pub fn filter_entities<S: FactStore>(
    store: &S,
    entities: &BTreeSet<EntityId>,
    predicate: &TagPredicate,
) -> Result<BTreeSet<EntityId>, TagScopeError> {
    let mut result = BTreeSet::new();
    if predicate.is_unsatisfiable() || entities.is_empty() {
        return Ok(result);
    }
    for fact in store.all_facts(false)? {
        let Some(entity) = fact.body().declared_entity() else {
            continue;
        };
        if entities.contains(entity)
            && !result.contains(entity)
            && predicate.evaluate(fact.tags())
        {
            result.insert(entity.clone());
        }
    }
    Ok(result)
}

/// Union of `filter_entities` over `stores`.
pub fn filter_entities_across_stores<'a, S: FactStore + 'a>(
    stores: impl IntoIterator<Item = &'a S>,
    entities: &BTreeSet<EntityId>,
    predicate: &TagPredicate,
) -> Result<BTreeSet<EntityId>, TagScopeError> {
    let mut result = BTreeSet::new();
    for store in stores {
        result.extend(filter_entities(store, entities, predicate)?);
    }
    Ok(result)
}

/// Anonymous individuals referenced by some fact in `store` that satisfies
/// `predicate`.
pub fn filter_anonymous<S: FactStore>(
    store: &S,
    anonymous: &BTreeSet<AnonId>,
    predicate: &TagPredicate,
) -> Result<BTreeSet<AnonId>, TagScopeError> {
    let mut remaining = anonymous.clone();
    let mut result = BTreeSet::new();
    for fact in store.all_facts(false)? {
        if remaining.is_empty() {
            break;
        }
        if !predicate.evaluate(fact.tags()) {
            continue;
        }
        for anon in fact.body().anonymous_individuals() {
            if remaining.remove(&anon) {
                result.insert(anon);
            }
        }
    }
    Ok(result)
}

// =============================================================================
// FILTER ENGINE
// =============================================================================

/// Fact filtering with optional module expansion.
pub struct FilterEngine {
    config: EngineConfig,
    extractor: Box<dyn ModuleExtractor>,
}

impl std::fmt::Debug for FilterEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FilterEngine {
    /// Engine using the bundled `ReferencingClosure` extractor.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            extractor: Box::new(ReferencingClosure::default()),
        }
    }

    /// Replace the module extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Box<dyn ModuleExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Filter `facts` by `predicate`, expanding over `store` when configured.
    pub fn filter_facts<S: FactStore>(
        &self,
        store: &S,
        facts: &BTreeSet<Fact>,
        predicate: &TagPredicate,
    ) -> Result<BTreeSet<Fact>, TagScopeError> {
        let filtered = filter_facts(facts, predicate);
        tracing::debug!(
            predicate = %predicate,
            candidates = facts.len(),
            passed = filtered.len(),
            "filtered facts"
        );
        self.expand(store, filtered)
    }

    /// Filter every fact of `store` (optionally with its imports closure).
    pub fn filter_store<S: FactStore>(
        &self,
        store: &S,
        include_imports: bool,
        predicate: &TagPredicate,
    ) -> Result<BTreeSet<Fact>, TagScopeError> {
        let facts = store.all_facts(include_imports)?;
        self.filter_facts(store, &facts, predicate)
    }

    /// Per-store filtering with expansion, unioned.
    ///
    /// Without expansion the result is a subset of `facts`. With it, each
    /// store contributes the module of the filtered signature over its own
    /// facts.
    pub fn filter_facts_across_stores<'a, S: FactStore + 'a>(
        &self,
        stores: impl IntoIterator<Item = &'a S>,
        facts: &BTreeSet<Fact>,
        predicate: &TagPredicate,
    ) -> Result<BTreeSet<Fact>, TagScopeError> {
        let filtered = filter_facts(facts, predicate);
        let mut result = BTreeSet::new();
        for store in stores {
            result.extend(self.expand(store, filtered.clone())?);
        }
        Ok(result)
    }

    pub fn filter_entities<S: FactStore>(
        &self,
        store: &S,
        entities: &BTreeSet<EntityId>,
        predicate: &TagPredicate,
    ) -> Result<BTreeSet<EntityId>, TagScopeError> {
        filter_entities(store, entities, predicate)
    }

    pub fn filter_anonymous<S: FactStore>(
        &self,
        store: &S,
        anonymous: &BTreeSet<AnonId>,
        predicate: &TagPredicate,
    ) -> Result<BTreeSet<AnonId>, TagScopeError> {
        filter_anonymous(store, anonymous, predicate)
    }

    fn expand<S: FactStore>(
        &self,
        store: &S,
        mut filtered: BTreeSet<Fact>,
    ) -> Result<BTreeSet<Fact>, TagScopeError> {
        if !self.config.expand_modules {
            return Ok(filtered);
        }

        let signature: BTreeSet<EntityId> = filtered
            .iter()
            .flat_map(|fact| fact.body().signature())
            .collect();
        let module = self
            .extractor
            .extract(&signature, &store.all_facts(false)?)?;

        tracing::debug!(
            signature = signature.len(),
            module = module.len(),
            "expanded filtered facts with module"
        );
        filtered.extend(module);
        Ok(filtered)
    }
}

// =============================================================================
// TESTS
// =============================================================================
