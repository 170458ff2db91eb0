//! # Tag Predicates
//!
//! Disjunctive normal form over tags: an ordered sequence of clauses, each
//! clause a set of tags that must all be present (AND), any clause sufficing
//! (OR).
//!
//! - A predicate with zero clauses is unsatisfiable, even by the empty tag set.
//! - A clause with zero tags is satisfied by every tag set.
//!
//! A predicate also remembers whether it was written as a single conjunction
//! or as an explicit disjunction. Evaluation ignores the form; tag removal
//! does not (see `reconcile`).

use crate::Tag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// CLAUSE
// =============================================================================

/// A conjunction of tags.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Clause(BTreeSet<Tag>);

impl Clause {
    #[must_use]
    pub fn new(tags: impl IntoIterator<Item = Tag>) -> Self {
        Self(tags.into_iter().collect())
    }

    /// Clause from tag IRIs.
    #[must_use]
    pub fn of<S: Into<String>>(iris: impl IntoIterator<Item = S>) -> Self {
        Self::new(iris.into_iter().map(Tag::new))
    }

    #[must_use]
    pub fn tags(&self) -> &BTreeSet<Tag> {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True iff every tag of the clause is in `tags`.
    #[must_use]
    pub fn is_satisfied_by(&self, tags: &BTreeSet<Tag>) -> bool {
        self.0.is_subset(tags)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AND[")?;
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", tag)?;
        }
        f.write_str("]")
    }
}

// =============================================================================
// PREDICATE
// =============================================================================

/// How a predicate was written by its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateForm {
    /// A single conjunction.
    And,
    /// An explicit disjunction of conjunctions.
    Or,
}

/// A DNF predicate over tag sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagPredicate {
    clauses: Vec<Clause>,
    form: PredicateForm,
}

impl TagPredicate {
    /// Pure conjunction: one clause holding `tags`.
    #[must_use]
    pub fn from_single_clause(tags: impl IntoIterator<Item = Tag>) -> Self {
        Self {
            clauses: vec![Clause::new(tags)],
            form: PredicateForm::And,
        }
    }

    /// General disjunction of `clauses`. Identical clauses are kept.
    #[must_use]
    pub fn from_clauses(clauses: impl IntoIterator<Item = Clause>) -> Self {
        Self {
            clauses: clauses.into_iter().collect(),
            form: PredicateForm::Or,
        }
    }

    /// Conjunction from tag IRIs.
    #[must_use]
    pub fn all_of<S: Into<String>>(iris: impl IntoIterator<Item = S>) -> Self {
        Self::from_single_clause(iris.into_iter().map(Tag::new))
    }

    /// The empty disjunction. Satisfied by nothing.
    #[must_use]
    pub fn never() -> Self {
        Self::from_clauses(Vec::new())
    }

    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    #[must_use]
    pub fn form(&self) -> PredicateForm {
        self.form
    }

    /// True iff the predicate has no clause at all.
    #[must_use]
    pub fn is_unsatisfiable(&self) -> bool {
        self.clauses.is_empty()
    }

    /// True iff some clause is a subset of `tags`.
    #[must_use]
    pub fn evaluate(&self, tags: &BTreeSet<Tag>) -> bool {
        self.clauses.iter().any(|clause| clause.is_satisfied_by(tags))
    }

    /// Union of every clause, regardless of form.
    #[must_use]
    pub fn all_tags(&self) -> BTreeSet<Tag> {
        self.clauses
            .iter()
            .flat_map(|clause| clause.tags().iter().cloned())
            .collect()
    }

    /// Union of the clauses that `tags` satisfies.
    #[must_use]
    pub fn satisfied_tags(&self, tags: &BTreeSet<Tag>) -> BTreeSet<Tag> {
        self.clauses
            .iter()
            .filter(|clause| clause.is_satisfied_by(tags))
            .flat_map(|clause| clause.tags().iter().cloned())
            .collect()
    }
}

impl fmt::Display for TagPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.form, self.clauses.as_slice()) {
            (PredicateForm::And, [clause]) => write!(f, "{}", clause),
            _ => {
                f.write_str("OR[")?;
                for (i, clause) in self.clauses.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", clause)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Evaluate `predicate` against `tags`.
#[must_use]
pub fn evaluate(tags: &BTreeSet<Tag>, predicate: &TagPredicate) -> bool {
    predicate.evaluate(tags)
}

// =============================================================================
// TESTS
// =============================================================================
