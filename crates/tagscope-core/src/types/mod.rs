//! # Core Type Definitions
//!
//! This module contains the data model shared by every engine:
//! - Identifiers (`EntityId`, `AnonId`, `PropertyId`, `Tag`)
//! - Terms and literals (`Term`, `Literal`)
//! - Fact content (`FactBody`, `Assertion`, `FactKind`)
//! - Annotations and facts (`Annotation`, `FactKey`, `Fact`)
//! - Error types (`TagScopeError`)
//!
//! ## Identity
//!
//! A fact's identity is its `FactKey`: the body plus the regular (non-tag)
//! annotations. Tags sit next to the key and never take part in equality of
//! keys, so two facts that differ only in tags are *variants* of each other.
//!
//! All types implement `Ord` so they can live in `BTreeMap`/`BTreeSet` and
//! iterate deterministically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// A named entity (class, property, individual, datatype), identified by IRI.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    #[must_use]
    pub fn new(iri: impl Into<String>) -> Self {
        Self(iri.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An anonymous individual (blank node label), local to a store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnonId(pub String);

impl AnonId {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }
}

/// A property used in assertions and annotations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub String);

impl PropertyId {
    #[must_use]
    pub fn new(iri: impl Into<String>) -> Self {
        Self(iri.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A tag (aspect) attachable to a fact.
///
/// Tags are opaque keys. Two tags are equal iff their identifiers are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag(pub String);

impl Tag {
    #[must_use]
    pub fn new(iri: impl Into<String>) -> Self {
        Self(iri.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// TERMS
// =============================================================================

/// A literal value with an optional datatype IRI.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub lexical: String,
    pub datatype: Option<String>,
}

impl Literal {
    /// Plain literal without datatype.
    #[must_use]
    pub fn new(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
        }
    }

    /// Literal with an explicit datatype IRI.
    #[must_use]
    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Some(datatype.into()),
        }
    }
}

/// Anything that can appear in subject or object position of a fact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    Entity(EntityId),
    Anonymous(AnonId),
    Literal(Literal),
}

impl Term {
    #[must_use]
    pub fn entity(iri: impl Into<String>) -> Self {
        Self::Entity(EntityId::new(iri))
    }

    #[must_use]
    pub fn anonymous(label: impl Into<String>) -> Self {
        Self::Anonymous(AnonId::new(label))
    }

    #[must_use]
    pub fn literal(lexical: impl Into<String>) -> Self {
        Self::Literal(Literal::new(lexical))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity(e) => write!(f, "<{}>", e.0),
            Self::Anonymous(a) => write!(f, "_:{}", a.0),
            Self::Literal(l) => match &l.datatype {
                Some(dt) => write!(f, "\"{}\"^^<{}>", l.lexical, dt),
                None => write!(f, "\"{}\"", l.lexical),
            },
        }
    }
}

// =============================================================================
// FACT BODY
// =============================================================================

/// Kind of entity introduced by a declaration fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Class,
    ObjectProperty,
    DataProperty,
    AnnotationProperty,
    NamedIndividual,
    Datatype,
}

/// Whether an assertion relates two individuals or an individual and a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    Object,
    Data,
}

/// Positive or negative property assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
}

/// A property assertion: `subject property object`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Assertion {
    pub subject: Term,
    pub property: PropertyId,
    pub object: Term,
    pub relation: RelationKind,
    pub polarity: Polarity,
}

impl Assertion {
    /// Positive object property assertion between two individuals.
    #[must_use]
    pub fn object(subject: Term, property: PropertyId, object: Term) -> Self {
        Self {
            subject,
            property,
            object,
            relation: RelationKind::Object,
            polarity: Polarity::Positive,
        }
    }

    /// Positive data property assertion with a literal value.
    #[must_use]
    pub fn data(subject: Term, property: PropertyId, value: Literal) -> Self {
        Self {
            subject,
            property,
            object: Term::Literal(value),
            relation: RelationKind::Data,
            polarity: Polarity::Positive,
        }
    }

    /// The same assertion with negative polarity.
    #[must_use]
    pub fn negated(mut self) -> Self {
        self.polarity = Polarity::Negative;
        self
    }
}

/// The substantive content ("base") of a fact, without any annotations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FactBody {
    /// Introduces a named entity.
    Declaration { entity: EntityId, kind: EntityKind },

    /// Property assertion about an individual.
    Assertion(Assertion),

    /// Any other logical fact, e.g. `SubClassOf(A, B)`.
    Axiom { kind: String, terms: Vec<Term> },

    /// Non-logical annotation assertion on a subject.
    AnnotationAssertion {
        subject: Term,
        property: PropertyId,
        value: Term,
    },
}

/// Classification of fact bodies, used for per-kind counting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FactKind {
    Declaration,
    ObjectPropertyAssertion,
    NegativeObjectPropertyAssertion,
    DataPropertyAssertion,
    NegativeDataPropertyAssertion,
    AnnotationAssertion,
    Axiom(String),
}

impl FactBody {
    /// Declaration of `entity` with the given kind.
    #[must_use]
    pub fn declaration(kind: EntityKind, entity: EntityId) -> Self {
        Self::Declaration { entity, kind }
    }

    /// A named logical axiom over the given terms.
    #[must_use]
    pub fn axiom(kind: impl Into<String>, terms: Vec<Term>) -> Self {
        Self::Axiom {
            kind: kind.into(),
            terms,
        }
    }

    #[must_use]
    pub fn kind(&self) -> FactKind {
        match self {
            Self::Declaration { .. } => FactKind::Declaration,
            Self::Assertion(a) => match (a.relation, a.polarity) {
                (RelationKind::Object, Polarity::Positive) => FactKind::ObjectPropertyAssertion,
                (RelationKind::Object, Polarity::Negative) => {
                    FactKind::NegativeObjectPropertyAssertion
                }
                (RelationKind::Data, Polarity::Positive) => FactKind::DataPropertyAssertion,
                (RelationKind::Data, Polarity::Negative) => FactKind::NegativeDataPropertyAssertion,
            },
            Self::Axiom { kind, .. } => FactKind::Axiom(kind.clone()),
            Self::AnnotationAssertion { .. } => FactKind::AnnotationAssertion,
        }
    }

    /// Declarations and annotation assertions carry no logical content.
    #[must_use]
    pub fn is_logical(&self) -> bool {
        !matches!(
            self,
            Self::Declaration { .. } | Self::AnnotationAssertion { .. }
        )
    }

    /// The entity introduced by a declaration fact.
    #[must_use]
    pub fn declared_entity(&self) -> Option<&EntityId> {
        match self {
            Self::Declaration { entity, .. } => Some(entity),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_assertion(&self) -> Option<&Assertion> {
        match self {
            Self::Assertion(a) => Some(a),
            _ => None,
        }
    }

    fn terms(&self) -> Vec<&Term> {
        match self {
            Self::Declaration { .. } => Vec::new(),
            Self::Assertion(a) => vec![&a.subject, &a.object],
            Self::Axiom { terms, .. } => terms.iter().collect(),
            Self::AnnotationAssertion { subject, value, .. } => vec![subject, value],
        }
    }

    /// Named entities referenced by this fact, properties included.
    #[must_use]
    pub fn signature(&self) -> BTreeSet<EntityId> {
        let mut signature: BTreeSet<EntityId> = self
            .terms()
            .into_iter()
            .filter_map(|term| match term {
                Term::Entity(e) => Some(e.clone()),
                _ => None,
            })
            .collect();
        match self {
            Self::Declaration { entity, .. } => {
                signature.insert(entity.clone());
            }
            Self::Assertion(a) => {
                signature.insert(EntityId::new(a.property.as_str()));
            }
            Self::AnnotationAssertion { property, .. } => {
                signature.insert(EntityId::new(property.as_str()));
            }
            Self::Axiom { .. } => {}
        }
        signature
    }

    /// Anonymous individuals referenced by this fact.
    #[must_use]
    pub fn anonymous_individuals(&self) -> BTreeSet<AnonId> {
        self.terms()
            .into_iter()
            .filter_map(|term| match term {
                Term::Anonymous(a) => Some(a.clone()),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for FactBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declaration { entity, kind } => write!(f, "Declaration({:?} <{}>)", kind, entity.0),
            Self::Assertion(a) => write!(
                f,
                "{:?}({} <{}> {})",
                self.kind(),
                a.subject,
                a.property.0,
                a.object
            ),
            Self::Axiom { kind, terms } => {
                write!(f, "{}(", kind)?;
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", term)?;
                }
                f.write_str(")")
            }
            Self::AnnotationAssertion {
                subject,
                property,
                value,
            } => write!(f, "AnnotationAssertion({} <{}> {})", subject, property.0, value),
        }
    }
}

// =============================================================================
// ANNOTATIONS & FACTS
// =============================================================================

/// Value side of an annotation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnnotationValue {
    Iri(String),
    Literal(Literal),
}

/// A (property, value) annotation attached to a fact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Annotation {
    pub property: PropertyId,
    pub value: AnnotationValue,
}

impl Annotation {
    #[must_use]
    pub fn new(property: PropertyId, value: AnnotationValue) -> Self {
        Self { property, value }
    }

    /// Annotation with a plain literal value, e.g. an `rdfs:comment`.
    #[must_use]
    pub fn literal(property: impl Into<String>, lexical: impl Into<String>) -> Self {
        Self::new(
            PropertyId::new(property),
            AnnotationValue::Literal(Literal::new(lexical)),
        )
    }

    /// Annotation with an IRI value.
    #[must_use]
    pub fn iri(property: impl Into<String>, iri: impl Into<String>) -> Self {
        Self::new(PropertyId::new(property), AnnotationValue::Iri(iri.into()))
    }
}

/// Identity of a fact: body plus regular annotations, tags excluded.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactKey {
    pub body: FactBody,
    pub annotations: BTreeSet<Annotation>,
}

/// A fact: its identity plus the tags currently layered on it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fact {
    key: FactKey,
    tags: BTreeSet<Tag>,
}

impl Fact {
    /// Untagged fact without regular annotations.
    #[must_use]
    pub fn new(body: FactBody) -> Self {
        Self {
            key: FactKey {
                body,
                annotations: BTreeSet::new(),
            },
            tags: BTreeSet::new(),
        }
    }

    /// Build a fact from an identity and a tag set.
    #[must_use]
    pub fn from_parts(key: FactKey, tags: BTreeSet<Tag>) -> Self {
        Self { key, tags }
    }

    /// Add a regular annotation.
    #[must_use]
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.key.annotations.insert(annotation);
        self
    }

    /// Add a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Add several tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// The same identity carrying exactly `tags`.
    #[must_use]
    pub fn retagged(&self, tags: BTreeSet<Tag>) -> Self {
        Self {
            key: self.key.clone(),
            tags,
        }
    }

    #[must_use]
    pub fn key(&self) -> &FactKey {
        &self.key
    }

    #[must_use]
    pub fn body(&self) -> &FactBody {
        &self.key.body
    }

    #[must_use]
    pub fn annotations(&self) -> &BTreeSet<Annotation> {
        &self.key.annotations
    }

    #[must_use]
    pub fn tags(&self) -> &BTreeSet<Tag> {
        &self.tags
    }

    #[must_use]
    pub fn into_key(self) -> FactKey {
        self.key
    }

    /// True iff both facts share body and regular annotations.
    #[must_use]
    pub fn is_variant_of(&self, other: &Fact) -> bool {
        self.key == other.key
    }

    /// True iff both facts share the same body, annotations ignored.
    #[must_use]
    pub fn same_body(&self, other: &Fact) -> bool {
        self.key.body == other.key.body
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in tagscope.
///
/// - No silent failures
/// - Use `Result<T, TagScopeError>` for fallible operations
/// - Unsatisfiable predicates and no-op removals are NOT errors
#[derive(Debug, Error)]
pub enum TagScopeError {
    /// The fact store refused an insert or remove.
    #[error("Store rejected write: {0}")]
    WriteRejected(String),

    /// The module extraction collaborator failed.
    #[error("Module extraction failed: {0}")]
    ModuleExtraction(String),

    /// The query-based filter collaborator failed.
    #[error("Query filter failed: {0}")]
    QueryFailed(String),

    /// A write was attempted while the active predicate source is a query.
    #[error("Writes are not supported under a query predicate source")]
    QueryWriteUnsupported,

    /// Configuration could not be parsed or is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
