//! # Dispatch Layer
//!
//! Routes store operations through the active predicate.
//!
//! An `AspectView` wraps a store. For every logical operation it asks a
//! `PredicateResolver` for the active `PredicateSource` and then:
//!
//! - no source: the plain store operation runs unchanged,
//! - `Tags(predicate)`: the engines run under the predicate,
//! - `Query(text)`: the `QueryFilter` restricts the store to a sub-store and
//!   the plain operation runs against that.
//!
//! Writes under a query source are refused.
//!
//! Two resolvers are provided. `ScopeStack` is an explicit dynamic scope:
//! sources pushed by an outer caller stay active until popped. An
//! `OperationTable` maps each operation to its own source.

use crate::containment::{ContainmentOptions, contains};
use crate::counting::CountEngine;
use crate::filter::FilterEngine;
use crate::predicate::TagPredicate;
use crate::reconcile::{Edit, EditReport, ReconcileEngine};
use crate::relation::{RelationMap, RelationSelector, filter_relation};
use crate::store::{FactStore, MemStore};
use crate::{AnonId, EntityId, Fact, FactKind, TagScopeError, Term};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// OPERATIONS & SOURCES
// =============================================================================

/// Logical operations a view intercepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Facts,
    Entities,
    AnonymousIndividuals,
    Contains,
    Count,
    Relation,
    Modify,
}

/// Where the active restriction comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateSource {
    /// Restrict by tags.
    Tags(TagPredicate),
    /// Restrict by a query handed to the `QueryFilter`.
    Query(String),
}

/// Supplies the active predicate source for an operation.
pub trait PredicateResolver {
    /// `None` means no restriction is active.
    fn resolve(&self, operation: Operation) -> Option<PredicateSource>;
}

/// Query-based alternative to tag filtering.
pub trait QueryFilter {
    /// The sub-store of `facts` selected by `query`.
    fn restrict(&self, query: &str, facts: &BTreeSet<Fact>) -> Result<MemStore, TagScopeError>;
}

// =============================================================================
// SCOPE STACK
// =============================================================================

/// Dynamic scope of predicate sources. The innermost entry wins.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: RefCell<Vec<PredicateSource>>,
}

impl ScopeStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, source: PredicateSource) {
        self.frames.borrow_mut().push(source);
    }

    pub fn pop(&self) -> Option<PredicateSource> {
        self.frames.borrow_mut().pop()
    }

    /// Push `source` until the returned guard drops.
    #[must_use = "the scope ends when the guard is dropped"]
    pub fn enter(&self, source: PredicateSource) -> ScopeGuard<'_> {
        self.push(source);
        ScopeGuard { stack: self }
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    #[must_use]
    pub fn current(&self) -> Option<PredicateSource> {
        self.frames.borrow().last().cloned()
    }
}

impl PredicateResolver for ScopeStack {
    fn resolve(&self, _operation: Operation) -> Option<PredicateSource> {
        self.current()
    }
}

/// Pops its frame from the `ScopeStack` on drop.
#[derive(Debug)]
pub struct ScopeGuard<'a> {
    stack: &'a ScopeStack,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.stack.pop();
    }
}

// =============================================================================
// OPERATION TABLE
// =============================================================================

/// Per-operation predicate sources with an optional fallback.
#[derive(Debug, Clone, Default)]
pub struct OperationTable {
    entries: BTreeMap<Operation, PredicateSource>,
    fallback: Option<PredicateSource>,
}

impl OperationTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, operation: Operation, source: PredicateSource) -> Self {
        self.entries.insert(operation, source);
        self
    }

    /// Source for operations without their own entry.
    #[must_use]
    pub fn with_fallback(mut self, source: PredicateSource) -> Self {
        self.fallback = Some(source);
        self
    }

    pub fn set(&mut self, operation: Operation, source: PredicateSource) {
        self.entries.insert(operation, source);
    }

    pub fn clear(&mut self, operation: Operation) -> Option<PredicateSource> {
        self.entries.remove(&operation)
    }
}

impl PredicateResolver for OperationTable {
    fn resolve(&self, operation: Operation) -> Option<PredicateSource> {
        self.entries
            .get(&operation)
            .or(self.fallback.as_ref())
            .cloned()
    }
}

// =============================================================================
// ASPECT VIEW
// =============================================================================

/// A store seen through the active predicate.
pub struct AspectView<'r, S: FactStore, R: PredicateResolver + ?Sized> {
    store: S,
    resolver: &'r R,
    filter: FilterEngine,
    query: Option<Box<dyn QueryFilter>>,
}

impl<S: FactStore + std::fmt::Debug, R: PredicateResolver + ?Sized> std::fmt::Debug
    for AspectView<'_, S, R>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AspectView")
            .field("store", &self.store)
            .field("filter", &self.filter)
            .field("has_query_filter", &self.query.is_some())
            .finish_non_exhaustive()
    }
}

impl<'r, S: FactStore, R: PredicateResolver + ?Sized> AspectView<'r, S, R> {
    #[must_use]
    pub fn new(store: S, resolver: &'r R, filter: FilterEngine) -> Self {
        Self {
            store,
            resolver,
            filter,
            query: None,
        }
    }

    /// Install the collaborator that serves `PredicateSource::Query`.
    #[must_use]
    pub fn with_query_filter(mut self, query: Box<dyn QueryFilter>) -> Self {
        self.query = Some(query);
        self
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Facts of the store, optionally with the imports closure.
    pub fn facts(&self, include_imports: bool) -> Result<BTreeSet<Fact>, TagScopeError> {
        match self.resolve(Operation::Facts) {
            None => self.store.all_facts(include_imports),
            Some(PredicateSource::Tags(predicate)) => {
                self.filter.filter_store(&self.store, include_imports, &predicate)
            }
            Some(PredicateSource::Query(query)) => {
                self.restricted(&query, include_imports)?.all_facts(false)
            }
        }
    }

    /// The subset of `entities` visible in the view.
    pub fn entities(
        &self,
        entities: &BTreeSet<EntityId>,
    ) -> Result<BTreeSet<EntityId>, TagScopeError> {
        match self.resolve(Operation::Entities) {
            None => Ok(entities.clone()),
            Some(PredicateSource::Tags(predicate)) => {
                self.filter.filter_entities(&self.store, entities, &predicate)
            }
            Some(PredicateSource::Query(query)) => {
                let declared: BTreeSet<EntityId> = self
                    .restricted(&query, false)?
                    .facts()
                    .filter_map(|fact| fact.body().declared_entity().cloned())
                    .collect();
                Ok(entities.intersection(&declared).cloned().collect())
            }
        }
    }

    /// The subset of `anonymous` visible in the view.
    pub fn anonymous_individuals(
        &self,
        anonymous: &BTreeSet<AnonId>,
    ) -> Result<BTreeSet<AnonId>, TagScopeError> {
        match self.resolve(Operation::AnonymousIndividuals) {
            None => Ok(anonymous.clone()),
            Some(PredicateSource::Tags(predicate)) => {
                self.filter.filter_anonymous(&self.store, anonymous, &predicate)
            }
            Some(PredicateSource::Query(query)) => {
                let referenced: BTreeSet<AnonId> = self
                    .restricted(&query, false)?
                    .facts()
                    .flat_map(|fact| fact.body().anonymous_individuals())
                    .collect();
                Ok(anonymous.intersection(&referenced).cloned().collect())
            }
        }
    }

    /// Does the view hold `candidate` (tags ignored)?
    pub fn contains(
        &self,
        candidate: &Fact,
        options: ContainmentOptions,
    ) -> Result<bool, TagScopeError> {
        match self.resolve(Operation::Contains) {
            None => contains_any(&self.store, candidate, options),
            Some(PredicateSource::Tags(predicate)) => {
                contains(&self.store, candidate, &predicate, options)
            }
            Some(PredicateSource::Query(query)) => {
                let restricted = self.restricted(&query, options.include_imports)?;
                contains_any(
                    &restricted,
                    candidate,
                    ContainmentOptions::new(options.consider_annotations, false),
                )
            }
        }
    }

    /// Number of facts in the view.
    pub fn count(&self, include_imports: bool) -> Result<usize, TagScopeError> {
        self.count_with(
            include_imports,
            |counter, store, predicate| counter.count_all(store, include_imports, predicate),
            |_| true,
        )
    }

    /// Number of facts of `kind` in the view.
    pub fn count_kind(
        &self,
        kind: &FactKind,
        include_imports: bool,
    ) -> Result<usize, TagScopeError> {
        self.count_with(
            include_imports,
            |counter, store, predicate| counter.count_kind(store, kind, include_imports, predicate),
            |fact| &fact.body().kind() == kind,
        )
    }

    /// Number of logical facts in the view.
    pub fn count_logical(&self, include_imports: bool) -> Result<usize, TagScopeError> {
        self.count_with(
            include_imports,
            |counter, store, predicate| counter.count_logical(store, include_imports, predicate),
            |fact| fact.body().is_logical(),
        )
    }

    /// Relation map of `subject` in the view.
    pub fn relation(
        &self,
        subject: &Term,
        selector: RelationSelector,
    ) -> Result<RelationMap, TagScopeError> {
        match self.resolve(Operation::Relation) {
            None => relation_unfiltered(&self.store, subject, selector),
            Some(PredicateSource::Tags(predicate)) => {
                filter_relation(&self.store, subject, selector, &predicate)
            }
            Some(PredicateSource::Query(query)) => {
                relation_unfiltered(&self.restricted(&query, false)?, subject, selector)
            }
        }
    }

    /// Add `fact`. Without a predicate its own tags are merged in.
    pub fn add(&mut self, fact: &Fact) -> Result<EditReport, TagScopeError> {
        let predicate = self.write_predicate()?;
        let mut engine = ReconcileEngine::new(&mut self.store);
        Ok(match predicate {
            Some(predicate) => engine.add(fact, &predicate),
            None => engine.add(fact, &TagPredicate::from_single_clause(fact.tags().iter().cloned())),
        })
    }

    /// Remove `fact`. Without a predicate the variant is deleted outright.
    pub fn remove(&mut self, fact: &Fact) -> Result<EditReport, TagScopeError> {
        let predicate = self.write_predicate()?;
        let mut engine = ReconcileEngine::new(&mut self.store);
        Ok(match predicate {
            Some(predicate) => engine.remove(fact, &predicate),
            None => engine.delete(fact),
        })
    }

    /// Apply a batch of edits under one predicate resolution.
    pub fn apply_all(&mut self, edits: &[Edit]) -> Result<Vec<EditReport>, TagScopeError> {
        let predicate = self.write_predicate()?;
        let mut engine = ReconcileEngine::new(&mut self.store);
        Ok(match predicate {
            Some(predicate) => engine.apply_all(edits, &predicate),
            None => edits
                .iter()
                .map(|edit| match edit {
                    Edit::Add(fact) => engine.add(
                        fact,
                        &TagPredicate::from_single_clause(fact.tags().iter().cloned()),
                    ),
                    Edit::Remove(fact) => engine.delete(fact),
                })
                .collect(),
        })
    }

    fn resolve(&self, operation: Operation) -> Option<PredicateSource> {
        let source = self.resolver.resolve(operation);
        tracing::trace!(?operation, ?source, "resolved predicate source");
        source
    }

    fn write_predicate(&self) -> Result<Option<TagPredicate>, TagScopeError> {
        match self.resolve(Operation::Modify) {
            None => Ok(None),
            Some(PredicateSource::Tags(predicate)) => Ok(Some(predicate)),
            Some(PredicateSource::Query(_)) => Err(TagScopeError::QueryWriteUnsupported),
        }
    }

    fn restricted(&self, query: &str, include_imports: bool) -> Result<MemStore, TagScopeError> {
        let Some(filter) = &self.query else {
            return Err(TagScopeError::QueryFailed(
                "no query filter installed".to_string(),
            ));
        };
        let facts = self.store.all_facts(include_imports)?;
        let restricted = filter.restrict(query, &facts)?;
        tracing::debug!(
            candidates = facts.len(),
            kept = restricted.len(),
            "query restricted store"
        );
        Ok(restricted)
    }

    fn count_with(
        &self,
        include_imports: bool,
        tagged: impl FnOnce(CountEngine<'_>, &S, &TagPredicate) -> Result<usize, TagScopeError>,
        keep: impl Fn(&Fact) -> bool,
    ) -> Result<usize, TagScopeError> {
        match self.resolve(Operation::Count) {
            None => Ok(self
                .store
                .all_facts(include_imports)?
                .into_iter()
                .filter(|fact| keep(fact))
                .count()),
            Some(PredicateSource::Tags(predicate)) => {
                tagged(CountEngine::new(&self.filter), &self.store, &predicate)
            }
            Some(PredicateSource::Query(query)) => Ok(self
                .restricted(&query, include_imports)?
                .facts()
                .filter(|fact| keep(fact))
                .count()),
        }
    }
}

fn contains_any<S: FactStore>(
    store: &S,
    candidate: &Fact,
    options: ContainmentOptions,
) -> Result<bool, TagScopeError> {
    Ok(store
        .facts_with_same_base(candidate, options.include_imports)?
        .iter()
        .any(|fact| !options.consider_annotations || fact.is_variant_of(candidate)))
}

fn relation_unfiltered<S: FactStore>(
    store: &S,
    subject: &Term,
    selector: RelationSelector,
) -> Result<RelationMap, TagScopeError> {
    // The empty clause admits every tag set.
    filter_relation(store, subject, selector, &TagPredicate::from_single_clause(Vec::new()))
}

// =============================================================================
// TESTS
// =============================================================================
