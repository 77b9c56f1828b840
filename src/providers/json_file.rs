/*!
 * Verse lookup backed by a local JSON file.
 *
 * The file is a flat object mapping references to verse text:
 *
 * ```json
 * { "John 3:16": "For God so loved the world...", "Psalm 23:1": "The LORD is my shepherd..." }
 * ```
 *
 * Keys are parsed and stored in canonical form. A range missing from the
 * file is assembled from its individual verses when all are present.
 */

use async_trait::async_trait;
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::errors::{AppError, ProviderError};
use crate::providers::{VerseLookup, VerseQuery};
use crate::scripture::BibleReference;
use crate::scripture::books::collapse_whitespace;

#[derive(Debug, Clone, Default)]
pub struct JsonVerseLookup {
    verses: HashMap<String, String>,
}

impl JsonVerseLookup {
    /// Load verses from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::File(format!("Failed to read verses file {}: {}", path.display(), e)))?;
        let raw: HashMap<String, String> = serde_json::from_str(&content)?;
        let lookup = Self::from_map(raw);
        debug!("Loaded {} verses from {}", lookup.len(), path.display());
        Ok(lookup)
    }

    /// Build from reference → text pairs; unparseable keys are skipped.
    pub fn from_map(raw: HashMap<String, String>) -> Self {
        let mut verses = HashMap::with_capacity(raw.len());
        for (key, text) in raw {
            match BibleReference::parse(&key) {
                Ok(reference) => {
                    verses.insert(reference.canonical(), collapse_whitespace(&text));
                }
                Err(e) => warn!("Skipping verse entry '{}': {}", key, e),
            }
        }
        Self { verses }
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    fn assemble_range(&self, reference: &BibleReference) -> Option<String> {
        reference.verse_end?;
        let parts: Option<Vec<&str>> = reference
            .verses()
            .map(|verse| {
                let key = format!("{} {}:{}", reference.book, reference.chapter, verse);
                self.verses.get(&key).map(String::as_str)
            })
            .collect();
        parts.map(|p| p.join(" "))
    }
}

#[async_trait]
impl VerseLookup for JsonVerseLookup {
    async fn lookup(&self, query: &VerseQuery) -> Result<String, ProviderError> {
        let canonical = query.reference.canonical();
        self.verses
            .get(&canonical)
            .cloned()
            .or_else(|| self.assemble_range(&query.reference))
            .ok_or(ProviderError::NotFound(canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn query(text: &str) -> VerseQuery {
        VerseQuery::new(&BibleReference::parse(text).unwrap(), None)
    }

    #[tokio::test]
    async fn test_lookup_aliasKey_shouldResolveCanonically() {
        let mut raw = HashMap::new();
        raw.insert("Psalm 23:1".to_string(), "The LORD is my shepherd;\nI shall not want.".to_string());
        let lookup = JsonVerseLookup::from_map(raw);
        let text = lookup.lookup(&query("Psalms 23:1")).await.unwrap();
        assert_eq!(text, "The LORD is my shepherd; I shall not want.");
    }

    #[tokio::test]
    async fn test_lookup_range_shouldJoinVerses() {
        let mut raw = HashMap::new();
        raw.insert("Romans 12:1".to_string(), "First.".to_string());
        raw.insert("Romans 12:2".to_string(), "Second.".to_string());
        let lookup = JsonVerseLookup::from_map(raw);
        assert_eq!(lookup.lookup(&query("Romans 12:1-2")).await.unwrap(), "First. Second.");
        assert!(matches!(
            lookup.lookup(&query("Romans 12:1-3")).await,
            Err(ProviderError::NotFound(_))
        ));
    }

    #[test]
    fn test_fromFile_shouldSkipBadKeys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"John 3:16": "For God so loved the world", "Hezekiah 1:1": "nope"}}"#).unwrap();
        let lookup = JsonVerseLookup::from_file(file.path()).unwrap();
        assert_eq!(lookup.len(), 1);
    }
}
