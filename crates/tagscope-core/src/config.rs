//! # Engine Configuration
//!
//! Runtime knobs shared by the engines, loaded from TOML.
//!
//! ```toml
//! expand_modules = true
//!
//! [vocabulary]
//! marker = "http://www.corporate-semantic-web.de/ontologies/aspect/owl#isPointcutOf"
//! sub_markers = ["http://example.org/hasProvenance"]
//! ```
//!
//! `expand_modules` has no default: a config file must state it.

use crate::{TagScopeError, TagVocabulary};
use serde::Deserialize;

/// Configuration consumed by `FilterEngine` and the views built on it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Union filtered facts with the module extracted from their signature.
    pub expand_modules: bool,

    /// Which annotation properties carry tags.
    #[serde(default)]
    pub vocabulary: TagVocabulary,
}

impl EngineConfig {
    /// Config with the default tag vocabulary.
    #[must_use]
    pub fn new(expand_modules: bool) -> Self {
        Self {
            expand_modules,
            vocabulary: TagVocabulary::default(),
        }
    }

    #[must_use]
    pub fn with_vocabulary(mut self, vocabulary: TagVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, TagScopeError> {
        toml::from_str(source).map_err(|e| TagScopeError::InvalidConfig(e.to_string()))
    }
}
