//! Query → category classification.
//!
//! [`KeywordClassifier`] is deterministic and always available. [`TieredClassifier`]
//! puts an optional external [`TextClassifier`] in front of it and falls through
//! to the keyword table on any error.

use async_trait::async_trait;
use std::sync::Arc;

use crate::llm::TextClassifier;

/// Sentinel category: search every registered category and merge.
pub const COMPREHENSIVE: &str = "comprehensive";

pub const DEFAULT_CATEGORIES: &[&str] = &[
    "github",
    "notes",
    "values",
    "conversations",
    "tasks",
    "work",
    "media",
    "locations",
    "user_profile",
    "user_preference",
    "explicit_note",
    "appointments",
];

/// First match wins, so more specific banks come first.
const KEYWORD_TABLE: &[(&str, &[&str])] = &[
    (
        "github",
        &["github", "repository", "commit", "pull request", "issue"],
    ),
    ("notes", &["note", "wrote", "writing", "document", "obsidian"]),
    (
        "values",
        &["value", "preference", "important to me", "i like", "i dislike", "believe"],
    ),
    (
        "conversations",
        &["conversation", "discussed", "said", "told me", "chat", "meeting"],
    ),
    ("tasks", &["task", "todo", "to-do", "deadline", "milestone", "goal"]),
    ("work", &["work", "job", "career", "colleague", "project"]),
    (
        "media",
        &["movie", "film", "music", "song", "book", "podcast", "video", "photo"],
    ),
    ("locations", &["location", "place", "travel", "city", "visited", "home"]),
    ("user_profile", &["profile", "about me", "my name", "birthday"]),
    ("appointments", &["appointment", "calendar", "schedule"]),
];

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Never fails: the worst case is [`COMPREHENSIVE`].
    async fn classify(&self, query: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    table: Vec<(String, Vec<String>)>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self {
            table: KEYWORD_TABLE
                .iter()
                .map(|(cat, words)| {
                    (cat.to_string(), words.iter().map(|w| w.to_string()).collect())
                })
                .collect(),
        }
    }
}

impl KeywordClassifier {
    /// Keep only table rows for `categories`, preserving table order.
    pub fn for_categories(categories: &[String]) -> Self {
        let mut classifier = Self::default();
        classifier
            .table
            .retain(|(cat, _)| categories.iter().any(|c| c == cat));
        classifier
    }

    pub fn classify_sync(&self, query: &str) -> String {
        let query = query.to_lowercase();
        self.table
            .iter()
            .find(|(_, words)| words.iter().any(|w| query.contains(w.as_str())))
            .map(|(cat, _)| cat.clone())
            .unwrap_or_else(|| COMPREHENSIVE.to_string())
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, query: &str) -> String {
        self.classify_sync(query)
    }
}

/// External classifier first, keyword table on any failure.
pub struct TieredClassifier {
    external: Option<Arc<dyn TextClassifier>>,
    keywords: KeywordClassifier,
}

impl TieredClassifier {
    pub fn new(external: Option<Arc<dyn TextClassifier>>, keywords: KeywordClassifier) -> Self {
        Self { external, keywords }
    }

    pub fn keywords_only(keywords: KeywordClassifier) -> Self {
        Self::new(None, keywords)
    }
}

#[async_trait]
impl Classifier for TieredClassifier {
    async fn classify(&self, query: &str) -> String {
        if let Some(external) = &self.external {
            match external.classify(query).await {
                Ok(category) if !category.trim().is_empty() => return category,
                Ok(_) => tracing::warn!("external classifier returned nothing, using keywords"),
                Err(e) => tracing::warn!(error = %e, "external classifier failed, using keywords"),
            }
        }
        let category = self.keywords.classify_sync(query);
        tracing::debug!(category = %category, "keyword classification");
        category
    }
}
