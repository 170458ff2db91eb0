//! # Counting Engine
//!
//! Every count is the size of a filtering result. Nothing here inspects tags
//! directly, so counts and filters cannot disagree.

use crate::filter::{FilterEngine, filter_facts};
use crate::predicate::TagPredicate;
use crate::store::FactStore;
use crate::{Fact, FactKind, TagScopeError};
use std::collections::BTreeSet;

/// Number of facts in `facts` satisfying `predicate`.
#[must_use]
pub fn count<'a>(facts: impl IntoIterator<Item = &'a Fact>, predicate: &TagPredicate) -> usize {
    filter_facts(facts, predicate).len()
}

/// Store-level counts routed through a `FilterEngine`.
#[derive(Debug, Clone, Copy)]
pub struct CountEngine<'e> {
    filter: &'e FilterEngine,
}

impl<'e> CountEngine<'e> {
    #[must_use]
    pub fn new(filter: &'e FilterEngine) -> Self {
        Self { filter }
    }

    /// Count every fact of the store.
    pub fn count_all<S: FactStore>(
        &self,
        store: &S,
        include_imports: bool,
        predicate: &TagPredicate,
    ) -> Result<usize, TagScopeError> {
        Ok(self
            .filter
            .filter_store(store, include_imports, predicate)?
            .len())
    }

    /// Count facts of one kind.
    pub fn count_kind<S: FactStore>(
        &self,
        store: &S,
        kind: &FactKind,
        include_imports: bool,
        predicate: &TagPredicate,
    ) -> Result<usize, TagScopeError> {
        self.count_subset(store, include_imports, predicate, |fact| {
            &fact.body().kind() == kind
        })
    }

    /// Count logical facts only (no declarations or annotation assertions).
    pub fn count_logical<S: FactStore>(
        &self,
        store: &S,
        include_imports: bool,
        predicate: &TagPredicate,
    ) -> Result<usize, TagScopeError> {
        self.count_subset(store, include_imports, predicate, |fact| {
            fact.body().is_logical()
        })
    }

    fn count_subset<S: FactStore>(
        &self,
        store: &S,
        include_imports: bool,
        predicate: &TagPredicate,
        keep: impl Fn(&Fact) -> bool,
    ) -> Result<usize, TagScopeError> {
        let subset: BTreeSet<Fact> = store
            .all_facts(include_imports)?
            .into_iter()
            .filter(|fact| keep(fact))
            .collect();
        Ok(self.filter.filter_facts(store, &subset, predicate)?.len())
    }
}
