/*!
 * Collaborator interfaces and implementations.
 *
 * The core only sees two async traits:
 * - `VerseLookup`: canonical verse text for a reference
 * - `SimilarityScorer`: semantic similarity of two text fragments
 *
 * Implementations:
 * - `bible_api`: HTTP lookup against a bible-api.com style service
 * - `json_file`: verses from a local JSON map
 * - `cache`: in-memory cache in front of any lookup
 * - `lexical`: bag-of-words cosine similarity
 * - `mock`: deterministic stand-ins for tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::scripture::BibleReference;

/// A verse text request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseQuery {
    /// Reference without its source span
    pub reference: BibleReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

impl VerseQuery {
    pub fn new(reference: &BibleReference, translation: Option<&str>) -> Self {
        let mut reference = reference.clone();
        reference.span = None;
        Self {
            reference,
            translation: translation.map(str::to_string),
        }
    }
}

/// Source of canonical verse text.
#[async_trait]
pub trait VerseLookup: Send + Sync + Debug {
    /// Verse text for the query, ranges joined with single spaces
    async fn lookup(&self, query: &VerseQuery) -> Result<String, ProviderError>;
}

/// Semantic similarity between two fragments, in [0, 1].
#[async_trait]
pub trait SimilarityScorer: Send + Sync + Debug {
    async fn similarity(&self, a: &str, b: &str) -> Result<f32, ProviderError>;
}

pub mod bible_api;
pub mod cache;
pub mod json_file;
pub mod lexical;
pub mod mock;

pub use bible_api::BibleApiLookup;
pub use cache::CachedVerseLookup;
pub use json_file::JsonVerseLookup;
pub use lexical::LexicalSimilarity;
