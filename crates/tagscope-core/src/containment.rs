//! # Containment Engine
//!
//! Does a store hold a candidate fact under a predicate?
//!
//! Matching is modulo tags: the candidate's own tags never matter, only the
//! tags of the stored facts sharing its body.

use crate::predicate::TagPredicate;
use crate::store::FactStore;
use crate::{Fact, TagScopeError};

/// How a candidate is matched against stored facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainmentOptions {
    /// Require equal regular annotations. When false, any fact with the same
    /// body matches.
    pub consider_annotations: bool,

    /// Search the imports closure as well.
    pub include_imports: bool,
}

impl Default for ContainmentOptions {
    fn default() -> Self {
        Self {
            consider_annotations: true,
            include_imports: false,
        }
    }
}

impl ContainmentOptions {
    #[must_use]
    pub fn new(consider_annotations: bool, include_imports: bool) -> Self {
        Self {
            consider_annotations,
            include_imports,
        }
    }
}

/// True iff some matching fact in `store` has tags satisfying `predicate`.
pub fn contains<S: FactStore>(
    store: &S,
    candidate: &Fact,
    predicate: &TagPredicate,
    options: ContainmentOptions,
) -> Result<bool, TagScopeError> {
    if predicate.is_unsatisfiable() {
        return Ok(false);
    }

    let found = store
        .facts_with_same_base(candidate, options.include_imports)?
        .iter()
        .filter(|fact| !options.consider_annotations || fact.is_variant_of(candidate))
        .any(|fact| predicate.evaluate(fact.tags()));

    tracing::trace!(
        fact = %candidate.body(),
        predicate = %predicate,
        found,
        "containment check"
    );
    Ok(found)
}
