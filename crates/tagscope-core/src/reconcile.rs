//! # Reconciliation Engine
//!
//! Applies Add and Remove edits under a predicate by growing or shrinking the
//! tag set of the matching stored fact. Base content is never deleted: a fact
//! stripped of its last tag stays in the store untagged.
//!
//! ## Add
//!
//! The tags to add are every tag named by the predicate, whatever its form.
//! An existing variant of the candidate is replaced by its merge; otherwise
//! the candidate is inserted carrying exactly those tags.
//!
//! ## Remove
//!
//! - `And` form: the candidate's variant loses the clause, provided it holds
//!   all of it. Otherwise nothing happens.
//! - `Or` form: every stored fact with the candidate's body (regular
//!   annotations ignored) loses the union of the clauses it satisfies.
//!
//! Each step is one `FactStore::replace` call. The engine holds the store
//! mutably for the whole edit and never retries or rolls back.

use crate::predicate::{PredicateForm, TagPredicate};
use crate::store::FactStore;
use crate::{Fact, Tag, TagScopeError};
use std::collections::BTreeSet;

// =============================================================================
// EDITS & REPORTS
// =============================================================================

/// A requested modification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Add(Fact),
    Remove(Fact),
}

/// A primitive change the engine performed on the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A new fact was inserted.
    Inserted(Fact),
    /// A stored fact was swapped for a sibling with different tags.
    Replaced { before: Fact, after: Fact },
    /// A stored fact was deleted outright.
    Deleted(Fact),
}

/// What an edit amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// No variant existed; a new fact was inserted.
    Created,
    /// The variant gained at least one tag.
    Merged,
    /// The variant already held every tag to add.
    AlreadyTagged,
    /// At least one fact lost tags.
    Stripped,
    /// The variant was deleted from the store.
    Deleted,
    /// Nothing matched, or nothing was held to remove.
    NoChange,
    /// The store rejected a write. Earlier changes stay applied.
    Failed,
}

/// Result of one edit: the applied changes plus how it ended.
#[derive(Debug)]
pub struct EditReport {
    pub changes: Vec<Change>,
    pub outcome: EditOutcome,
    pub error: Option<TagScopeError>,
}

impl EditReport {
    fn done(changes: Vec<Change>, outcome: EditOutcome) -> Self {
        Self {
            changes,
            outcome,
            error: None,
        }
    }

    fn no_change() -> Self {
        Self::done(Vec::new(), EditOutcome::NoChange)
    }

    fn failed(changes: Vec<Change>, error: TagScopeError) -> Self {
        Self {
            changes,
            outcome: EditOutcome::Failed,
            error: Some(error),
        }
    }

    /// True iff at least one primitive change reached the store.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        !self.changes.is_empty()
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.outcome == EditOutcome::Failed
    }
}

// =============================================================================
// RECONCILIATION ENGINE
// =============================================================================

/// Applies tag edits to one store.
#[derive(Debug)]
pub struct ReconcileEngine<'s, S: FactStore> {
    store: &'s mut S,
}

impl<'s, S: FactStore> ReconcileEngine<'s, S> {
    #[must_use]
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Read access to the store being edited.
    #[must_use]
    pub fn store(&self) -> &S {
        &*self.store
    }

    /// Add `candidate` under `predicate`.
    pub fn add(&mut self, candidate: &Fact, predicate: &TagPredicate) -> EditReport {
        let tags_to_add = predicate.all_tags();

        let existing = match self.store.variant_of(candidate) {
            Ok(existing) => existing,
            Err(e) => return rejected(Vec::new(), e),
        };

        match existing {
            Some(before) => {
                let outcome = if tags_to_add.is_subset(before.tags()) {
                    EditOutcome::AlreadyTagged
                } else {
                    EditOutcome::Merged
                };
                let mut merged = before.tags().clone();
                merged.extend(tags_to_add);
                let after = before.retagged(merged);

                tracing::debug!(fact = %before.body(), ?outcome, "merging tags into variant");
                let mut changes = Vec::new();
                match self.swap(&before, after, &mut changes) {
                    Ok(()) => EditReport::done(changes, outcome),
                    Err(e) => rejected(changes, e),
                }
            }
            None => {
                let fact = candidate.retagged(tags_to_add);
                tracing::debug!(fact = %fact.body(), tags = fact.tags().len(), "inserting new fact");
                match self.store.insert(fact.clone()) {
                    Ok(()) => EditReport::done(vec![Change::Inserted(fact)], EditOutcome::Created),
                    Err(e) => rejected(Vec::new(), e),
                }
            }
        }
    }

    /// Remove `candidate` under `predicate` by stripping tags.
    pub fn remove(&mut self, candidate: &Fact, predicate: &TagPredicate) -> EditReport {
        match predicate.form() {
            PredicateForm::And => self.remove_clause(candidate, predicate),
            PredicateForm::Or => self.remove_satisfied_clauses(candidate, predicate),
        }
    }

    /// Delete the candidate's variant, tags and all.
    ///
    /// This is the store-level deletion used when no predicate is active;
    /// tag edits never reach it.
    pub fn delete(&mut self, candidate: &Fact) -> EditReport {
        let held = match self.store.variant_of(candidate) {
            Ok(Some(held)) => held,
            Ok(None) => return EditReport::no_change(),
            Err(e) => return rejected(Vec::new(), e),
        };

        tracing::debug!(fact = %held.body(), "deleting variant");
        match self.store.remove(&held) {
            Ok(true) => EditReport::done(vec![Change::Deleted(held)], EditOutcome::Deleted),
            Ok(false) => EditReport::no_change(),
            Err(e) => rejected(Vec::new(), e),
        }
    }

    /// Apply one edit.
    pub fn apply(&mut self, edit: &Edit, predicate: &TagPredicate) -> EditReport {
        match edit {
            Edit::Add(fact) => self.add(fact, predicate),
            Edit::Remove(fact) => self.remove(fact, predicate),
        }
    }

    /// Apply edits in order. A failed edit does not stop later ones.
    pub fn apply_all<'a>(
        &mut self,
        edits: impl IntoIterator<Item = &'a Edit>,
        predicate: &TagPredicate,
    ) -> Vec<EditReport> {
        edits
            .into_iter()
            .map(|edit| self.apply(edit, predicate))
            .collect()
    }

    /// Add every fact under `predicate`.
    pub fn add_all<'a>(
        &mut self,
        facts: impl IntoIterator<Item = &'a Fact>,
        predicate: &TagPredicate,
    ) -> Vec<EditReport> {
        facts
            .into_iter()
            .map(|fact| self.add(fact, predicate))
            .collect()
    }

    /// Remove every fact under `predicate`.
    pub fn remove_all<'a>(
        &mut self,
        facts: impl IntoIterator<Item = &'a Fact>,
        predicate: &TagPredicate,
    ) -> Vec<EditReport> {
        facts
            .into_iter()
            .map(|fact| self.remove(fact, predicate))
            .collect()
    }

    fn remove_clause(&mut self, candidate: &Fact, predicate: &TagPredicate) -> EditReport {
        let clause = predicate.all_tags();

        let held = match self.store.variant_of(candidate) {
            Ok(Some(held)) => held,
            Ok(None) => {
                tracing::debug!(fact = %candidate.body(), "no variant to strip");
                return EditReport::no_change();
            }
            Err(e) => return rejected(Vec::new(), e),
        };

        if clause.is_empty() || !clause.is_subset(held.tags()) {
            tracing::debug!(fact = %held.body(), predicate = %predicate, "variant lacks clause");
            return EditReport::no_change();
        }

        let mut changes = Vec::new();
        match self.strip(&held, &clause, &mut changes) {
            Ok(()) => EditReport::done(changes, EditOutcome::Stripped),
            Err(e) => rejected(changes, e),
        }
    }

    fn remove_satisfied_clauses(
        &mut self,
        candidate: &Fact,
        predicate: &TagPredicate,
    ) -> EditReport {
        let similar = match self.store.facts_with_same_base(candidate, false) {
            Ok(similar) => similar,
            Err(e) => return rejected(Vec::new(), e),
        };

        let mut changes = Vec::new();
        for held in similar {
            let to_strip = predicate.satisfied_tags(held.tags());
            if to_strip.is_empty() {
                continue;
            }
            if let Err(e) = self.strip(&held, &to_strip, &mut changes) {
                return rejected(changes, e);
            }
        }

        if changes.is_empty() {
            EditReport::no_change()
        } else {
            EditReport::done(changes, EditOutcome::Stripped)
        }
    }

    fn strip(
        &mut self,
        held: &Fact,
        to_strip: &BTreeSet<Tag>,
        changes: &mut Vec<Change>,
    ) -> Result<(), TagScopeError> {
        let remaining: BTreeSet<Tag> = held.tags().difference(to_strip).cloned().collect();
        let after = held.retagged(remaining);

        tracing::debug!(
            fact = %held.body(),
            stripped = to_strip.len(),
            remaining = after.tags().len(),
            "stripping tags"
        );
        self.swap(held, after, changes)
    }

    /// Replace `before` by `after`, recording what reached the store.
    ///
    /// A failed replace may have removed `before` without inserting `after`.
    /// When the variant is gone afterwards, the removal is recorded as
    /// `Change::Deleted` so the failed report shows it.
    fn swap(
        &mut self,
        before: &Fact,
        after: Fact,
        changes: &mut Vec<Change>,
    ) -> Result<(), TagScopeError> {
        if let Err(e) = self.store.replace(before, after.clone()) {
            if let Ok(None) = self.store.variant_of(before) {
                changes.push(Change::Deleted(before.clone()));
            }
            return Err(e);
        }
        changes.push(Change::Replaced {
            before: before.clone(),
            after,
        });
        Ok(())
    }
}

fn rejected(changes: Vec<Change>, error: TagScopeError) -> EditReport {
    tracing::warn!(applied = changes.len(), error = %error, "store operation failed mid-edit");
    EditReport::failed(changes, error)
}

// =============================================================================
// TESTS
// =============================================================================
