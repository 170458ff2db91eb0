//! # Module Extraction
//!
//! Expands a seed signature into a self-contained subset of a store's facts.
//!
//! The engines only depend on the `ModuleExtractor` trait. `ReferencingClosure`
//! is the bundled implementation: it follows references outward from the
//! seed until the signature stops growing.

use crate::primitives::MAX_CLOSURE_ROUNDS;
use crate::{EntityId, Fact, TagScopeError};
use std::collections::BTreeSet;

/// Collaborator that extracts a module for a signature.
pub trait ModuleExtractor {
    /// Facts of `facts` forming the module of `signature`.
    fn extract(
        &self,
        signature: &BTreeSet<EntityId>,
        facts: &BTreeSet<Fact>,
    ) -> Result<BTreeSet<Fact>, TagScopeError>;
}

/// Reference-closure extractor.
///
/// Round `n` adds every fact mentioning an entity of the current signature,
/// then widens the signature with the new facts' signatures. Stops at a
/// fixpoint or after `max_rounds` rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencingClosure {
    max_rounds: usize,
}

impl Default for ReferencingClosure {
    fn default() -> Self {
        Self {
            max_rounds: MAX_CLOSURE_ROUNDS,
        }
    }
}

impl ReferencingClosure {
    /// Extractor limited to `max_rounds` rounds (at least one).
    #[must_use]
    pub fn with_max_rounds(max_rounds: usize) -> Self {
        Self {
            max_rounds: max_rounds.max(1),
        }
    }

    #[must_use]
    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }
}

impl ModuleExtractor for ReferencingClosure {
    fn extract(
        &self,
        signature: &BTreeSet<EntityId>,
        facts: &BTreeSet<Fact>,
    ) -> Result<BTreeSet<Fact>, TagScopeError> {
        let mut current = signature.clone();
        let mut module = BTreeSet::new();

        for round in 0..self.max_rounds {
            let mut grown = false;
            for fact in facts {
                if module.contains(fact) {
                    continue;
                }
                let fact_signature = fact.body().signature();
                if fact_signature.is_disjoint(&current) {
                    continue;
                }
                for entity in fact_signature {
                    grown |= current.insert(entity);
                }
                module.insert(fact.clone());
            }

            if !grown {
                tracing::trace!(round, module = module.len(), "closure reached fixpoint");
                return Ok(module);
            }
        }

        tracing::debug!(
            rounds = self.max_rounds,
            module = module.len(),
            "closure cut off before fixpoint"
        );
        Ok(module)
    }
}
