//! # Relation-Pair Filtering
//!
//! Property/value maps for one subject, restricted to assertions whose tags
//! satisfy a predicate.
//!
//! A selector picks one of the four assertion families (object or data,
//! positive or negative). Families are never mixed in one map, and a property
//! appears only when at least one qualifying value exists.

use crate::predicate::TagPredicate;
use crate::store::FactStore;
use crate::{Polarity, PropertyId, RelationKind, TagScopeError, Term};
use std::collections::{BTreeMap, BTreeSet};

/// Property -> values, as produced by relation filtering.
pub type RelationMap = BTreeMap<PropertyId, BTreeSet<Term>>;

/// Which assertion family to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationSelector {
    pub relation: RelationKind,
    pub polarity: Polarity,
}

impl RelationSelector {
    pub const OBJECT: Self = Self::new(RelationKind::Object, Polarity::Positive);
    pub const NEGATIVE_OBJECT: Self = Self::new(RelationKind::Object, Polarity::Negative);
    pub const DATA: Self = Self::new(RelationKind::Data, Polarity::Positive);
    pub const NEGATIVE_DATA: Self = Self::new(RelationKind::Data, Polarity::Negative);

    #[must_use]
    pub const fn new(relation: RelationKind, polarity: Polarity) -> Self {
        Self { relation, polarity }
    }
}

/// Qualifying `(property, value)` pairs of `subject` in `store`.
pub fn filter_relation<S: FactStore>(
    store: &S,
    subject: &Term,
    selector: RelationSelector,
    predicate: &TagPredicate,
) -> Result<RelationMap, TagScopeError> {
    let mut result = RelationMap::new();
    collect_into(store, subject, selector, predicate, &mut result)?;

    tracing::trace!(
        subject = %subject,
        ?selector,
        properties = result.len(),
        "filtered relation"
    );
    Ok(result)
}

/// Per-store relation maps, unioned per property.
pub fn filter_relation_across_stores<'a, S: FactStore + 'a>(
    stores: impl IntoIterator<Item = &'a S>,
    subject: &Term,
    selector: RelationSelector,
    predicate: &TagPredicate,
) -> Result<RelationMap, TagScopeError> {
    let mut result = RelationMap::new();
    for store in stores {
        collect_into(store, subject, selector, predicate, &mut result)?;
    }
    Ok(result)
}

fn collect_into<S: FactStore>(
    store: &S,
    subject: &Term,
    selector: RelationSelector,
    predicate: &TagPredicate,
    result: &mut RelationMap,
) -> Result<(), TagScopeError> {
    for fact in store.assertions_about(subject)? {
        if !predicate.evaluate(fact.tags()) {
            continue;
        }
        let Some(assertion) = fact.body().as_assertion() else {
            continue;
        };
        if assertion.relation != selector.relation || assertion.polarity != selector.polarity {
            continue;
        }
        result
            .entry(assertion.property.clone())
            .or_default()
            .insert(assertion.object.clone());
    }
    Ok(())
}
