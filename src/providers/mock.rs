/*!
 * Mock collaborators for testing.
 *
 * - `StaticVerseLookup`: verses from an in-memory table
 * - `ScriptedSimilarity`: fixed scores with scripted topic breaks
 *
 * Both share a `MockBehavior` that can make them fail or stall so timeout
 * and failure paths can be exercised deterministically.
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::{SimilarityScorer, VerseLookup, VerseQuery};
use crate::scripture::BibleReference;

/// Behavior mode for the mocks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Answers from the configured data
    Working,
    /// Always fails with an error
    Failing,
    /// Answers after a delay (for timeout testing)
    Slow { delay_ms: u64 },
}

impl MockBehavior {
    async fn apply(&self) -> Result<(), ProviderError> {
        match self {
            MockBehavior::Working => Ok(()),
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated collaborator failure".to_string(),
            }),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(*delay_ms)).await;
                Ok(())
            }
        }
    }
}

/// In-memory verse table.
#[derive(Debug, Clone)]
pub struct StaticVerseLookup {
    verses: HashMap<String, String>,
    behavior: MockBehavior,
    request_count: Arc<AtomicUsize>,
}

impl Default for StaticVerseLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticVerseLookup {
    pub fn new() -> Self {
        Self {
            verses: HashMap::new(),
            behavior: MockBehavior::Working,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self::new().with_behavior(MockBehavior::Failing)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new().with_behavior(MockBehavior::Slow { delay_ms })
    }

    pub fn with_behavior(mut self, behavior: MockBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Add a verse; the reference is stored canonically.
    ///
    /// Panics on an unparseable reference.
    pub fn with_verse(mut self, reference: &str, text: &str) -> Self {
        let canonical = BibleReference::parse(reference)
            .map(|r| r.canonical())
            .unwrap_or_else(|e| panic!("bad mock reference '{}': {}", reference, e));
        self.verses.insert(canonical, text.to_string());
        self
    }

    /// Requests served so far, clones included.
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VerseLookup for StaticVerseLookup {
    async fn lookup(&self, query: &VerseQuery) -> Result<String, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.behavior.apply().await?;
        let canonical = query.reference.canonical();
        self.verses
            .get(&canonical)
            .cloned()
            .ok_or(ProviderError::NotFound(canonical))
    }
}

/// Similarity scorer that returns `default_score` except where the second
/// fragment starts with a scripted break prefix.
#[derive(Debug, Clone)]
pub struct ScriptedSimilarity {
    default_score: f32,
    break_score: f32,
    breaks_before: Vec<String>,
    behavior: MockBehavior,
    request_count: Arc<AtomicUsize>,
}

impl ScriptedSimilarity {
    pub fn new(default_score: f32) -> Self {
        Self {
            default_score,
            break_score: 0.0,
            breaks_before: Vec::new(),
            behavior: MockBehavior::Working,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self::new(1.0).with_behavior(MockBehavior::Failing)
    }

    pub fn with_behavior(mut self, behavior: MockBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Score `break_score` whenever the following fragment starts with `prefix`.
    pub fn with_break_before(mut self, prefix: &str) -> Self {
        self.breaks_before.push(prefix.to_string());
        self
    }

    pub fn with_break_score(mut self, score: f32) -> Self {
        self.break_score = score;
        self
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SimilarityScorer for ScriptedSimilarity {
    async fn similarity(&self, _a: &str, b: &str) -> Result<f32, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.behavior.apply().await?;
        let b = b.trim_start();
        if self.breaks_before.iter().any(|prefix| b.starts_with(prefix.as_str())) {
            Ok(self.break_score)
        } else {
            Ok(self.default_score)
        }
    }
}
