//! # Tag Vocabulary
//!
//! Decides which annotations are tags.
//!
//! A store marks tags with a single well-known annotation property (the
//! marker). Vocabularies may register sub-properties of the marker; an
//! annotation using any of them also counts as a tag. Tags are keyed by their
//! IRI value only, so the same tag reached through different marker
//! properties is one tag.
//!
//! The vocabulary must be the same for every operation on a given store.

use crate::primitives::TAG_MARKER_IRI;
use crate::{Annotation, AnnotationValue, Fact, FactBody, FactKey, PropertyId, Tag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The marker property plus its registered sub-properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagVocabulary {
    marker: PropertyId,
    #[serde(default)]
    sub_markers: BTreeSet<PropertyId>,
}

impl Default for TagVocabulary {
    fn default() -> Self {
        Self::new(PropertyId::new(TAG_MARKER_IRI))
    }
}

impl TagVocabulary {
    /// Vocabulary with `marker` as its only tag property.
    #[must_use]
    pub fn new(marker: PropertyId) -> Self {
        Self {
            marker,
            sub_markers: BTreeSet::new(),
        }
    }

    /// Register a sub-property of the marker.
    #[must_use]
    pub fn with_sub_marker(mut self, property: PropertyId) -> Self {
        if property != self.marker {
            self.sub_markers.insert(property);
        }
        self
    }

    /// The root marker property.
    #[must_use]
    pub fn marker(&self) -> &PropertyId {
        &self.marker
    }

    #[must_use]
    pub fn is_marker(&self, property: &PropertyId) -> bool {
        property == &self.marker || self.sub_markers.contains(property)
    }

    /// The tag carried by `annotation`, if it is a tag annotation.
    ///
    /// Marker annotations with literal values are regular annotations.
    #[must_use]
    pub fn tag_of(&self, annotation: &Annotation) -> Option<Tag> {
        match &annotation.value {
            AnnotationValue::Iri(iri) if self.is_marker(&annotation.property) => {
                Some(Tag::new(iri.as_str()))
            }
            _ => None,
        }
    }

    /// The annotation that attaches `tag` through the root marker.
    #[must_use]
    pub fn annotation_for(&self, tag: &Tag) -> Annotation {
        Annotation::new(
            self.marker.clone(),
            AnnotationValue::Iri(tag.as_str().to_string()),
        )
    }

    /// Split raw annotations into tags and regular annotations.
    pub fn partition(
        &self,
        body: FactBody,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> Fact {
        let mut regular = BTreeSet::new();
        let mut tags = BTreeSet::new();
        for annotation in annotations {
            match self.tag_of(&annotation) {
                Some(tag) => {
                    tags.insert(tag);
                }
                None => {
                    regular.insert(annotation);
                }
            }
        }
        Fact::from_parts(
            FactKey {
                body,
                annotations: regular,
            },
            tags,
        )
    }

    /// All annotations of `fact`, tags rendered through the root marker.
    #[must_use]
    pub fn materialize(&self, fact: &Fact) -> BTreeSet<Annotation> {
        let mut annotations = fact.annotations().clone();
        annotations.extend(fact.tags().iter().map(|tag| self.annotation_for(tag)));
        annotations
    }
}
