//! Query routing: classify, retrieve, merge.
//!
//! A [`QueryRouter`] owns a [`Classifier`] and one [`CategoryAdapter`] per
//! registered category. A `comprehensive` classification fans out to every
//! adapter concurrently and merges whatever came back; [`QueryRouter::route_banks`]
//! does the same over a caller-chosen subset. Store failures are the only errors
//! that reach the caller.

pub mod adapter;

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::classifier::{Classifier, KeywordClassifier, TieredClassifier, COMPREHENSIVE};
use crate::config::JeanConfig;
use crate::error::StoreError;
use crate::llm::gemini::GeminiClient;
use crate::llm::{Summarizer, TextClassifier};
use crate::store::ContextStore;

pub use adapter::{CategoryAdapter, CategoryResult, StoreAdapter};

/// Separator between category sections in a merged answer.
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

const NO_CONTEXT_MESSAGE: &str = "No relevant context found.";

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("storage unavailable: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutedResult {
    /// One category answered.
    Category(CategoryResult),
    /// Merged answer from every fanned-out category that had entries.
    Comprehensive { content: String, sources: Vec<String> },
    /// Every attempted category was empty and none failed.
    NoContext { content: String },
    /// The resolved category has no registered adapter.
    UnhandledCategory { category: String, content: String },
}

impl RoutedResult {
    pub fn content(&self) -> &str {
        match self {
            RoutedResult::Category(result) => &result.content,
            RoutedResult::Comprehensive { content, .. }
            | RoutedResult::NoContext { content }
            | RoutedResult::UnhandledCategory { content, .. } => content,
        }
    }
}

pub struct QueryRouter {
    classifier: Arc<dyn Classifier>,
    adapters: Vec<Arc<dyn CategoryAdapter>>,
}

impl QueryRouter {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            adapters: Vec::new(),
        }
    }

    /// Register an adapter. A later adapter for the same category replaces the earlier one.
    pub fn register(&mut self, adapter: Arc<dyn CategoryAdapter>) {
        self.adapters.retain(|a| a.category() != adapter.category());
        self.adapters.push(adapter);
    }

    /// A router with one [`StoreAdapter`] per configured category. When the LLM
    /// is enabled and configured, Gemini classifies and summarizes.
    pub fn from_config(config: &JeanConfig, store: Arc<ContextStore>) -> Self {
        let categories = config.router.categories.clone();
        let gemini = if config.llm.enabled {
            match GeminiClient::new(&config.llm, categories.clone()) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    tracing::warn!(error = %e, "gemini unavailable, using keyword routing and raw context");
                    None
                }
            }
        } else {
            None
        };

        let external: Option<Arc<dyn TextClassifier>> =
            gemini.clone().map(|g| g as Arc<dyn TextClassifier>);
        let summarizer: Option<Arc<dyn Summarizer>> = gemini.map(|g| g as Arc<dyn Summarizer>);

        let classifier = TieredClassifier::new(external, KeywordClassifier::for_categories(&categories));
        let mut router = Self::new(Arc::new(classifier));
        for category in &categories {
            router.register(Arc::new(StoreAdapter::new(
                category.clone(),
                store.clone(),
                summarizer.clone(),
                config.router.search_limit,
                config.router.recent_limit,
            )));
        }
        router
    }

    pub fn categories(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.category()).collect()
    }

    fn adapter(&self, category: &str) -> Option<&Arc<dyn CategoryAdapter>> {
        self.adapters.iter().find(|a| a.category() == category)
    }

    /// Answer `query` for the tenant-scoped user. A non-blank `category_hint`
    /// skips classification.
    pub async fn route(
        &self,
        user_id: i64,
        tenant_id: &str,
        query: &str,
        category_hint: Option<&str>,
    ) -> Result<RoutedResult, RouteError> {
        let category = match category_hint.map(str::trim).filter(|h| !h.is_empty()) {
            Some(hint) => {
                tracing::debug!(category = %hint, "using caller-supplied category");
                hint.to_lowercase()
            }
            None => self.classifier.classify(query).await,
        };

        tracing::info!(user_id, tenant = %tenant_id, category = %category, "routing query");

        if category == COMPREHENSIVE {
            return self.route_comprehensive(user_id, tenant_id, query).await;
        }

        let Some(adapter) = self.adapter(&category) else {
            tracing::warn!(category = %category, "no adapter registered for category");
            return Ok(RoutedResult::UnhandledCategory {
                content: format!("No handler registered for category '{category}'."),
                category,
            });
        };

        let result = adapter.get_context(user_id, tenant_id, query).await?;
        if result.is_empty() {
            return Ok(no_context());
        }
        Ok(RoutedResult::Category(result))
    }

    /// Answer `query` from the named banks only, merged the same way as a
    /// comprehensive route. Unregistered names are skipped; an empty list
    /// falls back to classification.
    pub async fn route_banks(
        &self,
        user_id: i64,
        tenant_id: &str,
        query: &str,
        banks: &[&str],
    ) -> Result<RoutedResult, RouteError> {
        let wanted: Vec<String> = banks
            .iter()
            .map(|b| b.trim().to_lowercase())
            .filter(|b| !b.is_empty())
            .collect();
        if wanted.is_empty() {
            return self.route(user_id, tenant_id, query, None).await;
        }
        if wanted.iter().any(|b| b == COMPREHENSIVE) {
            return self.route_comprehensive(user_id, tenant_id, query).await;
        }

        let mut chosen: Vec<&Arc<dyn CategoryAdapter>> = Vec::new();
        for bank in &wanted {
            match self.adapter(bank) {
                Some(adapter) if !chosen.iter().any(|c| c.category() == bank.as_str()) => chosen.push(adapter),
                Some(_) => {}
                None => tracing::warn!(category = %bank, "no adapter registered for bank, skipping"),
            }
        }

        tracing::info!(user_id, tenant = %tenant_id, banks = ?wanted, "routing query to banks");

        if chosen.is_empty() {
            let category = wanted.join(",");
            return Ok(RoutedResult::UnhandledCategory {
                content: format!("No handler registered for categories '{category}'."),
                category,
            });
        }
        self.merge(&chosen, user_id, tenant_id, query).await
    }

    async fn route_comprehensive(
        &self,
        user_id: i64,
        tenant_id: &str,
        query: &str,
    ) -> Result<RoutedResult, RouteError> {
        let all: Vec<&Arc<dyn CategoryAdapter>> = self.adapters.iter().collect();
        self.merge(&all, user_id, tenant_id, query).await
    }

    /// Fan out to `adapters` concurrently. Failed branches are dropped when
    /// another branch found something; otherwise the first failure is returned.
    async fn merge(
        &self,
        adapters: &[&Arc<dyn CategoryAdapter>],
        user_id: i64,
        tenant_id: &str,
        query: &str,
    ) -> Result<RoutedResult, RouteError> {
        let outcomes = join_all(
            adapters
                .iter()
                .map(|adapter| adapter.get_context(user_id, tenant_id, query)),
        )
        .await;

        let mut first_error = None;
        let mut failed = 0;
        let mut found = Vec::new();

        for (adapter, outcome) in adapters.iter().zip(outcomes) {
            match outcome {
                Ok(result) if !result.is_empty() => found.push(result),
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(category = %adapter.category(), error = %e, "category retrieval failed");
                    failed += 1;
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if found.is_empty() {
            return match first_error {
                Some(e) => Err(RouteError::Store(e)),
                None => Ok(no_context()),
            };
        }

        let sources: Vec<String> = found.iter().map(|r| r.category.clone()).collect();
        let content = found
            .iter()
            .map(|r| format!("[{}]\n{}", r.category, r.content))
            .collect::<Vec<_>>()
            .join(SECTION_SEPARATOR);

        tracing::info!(sources = ?sources, failed, "merged context");
        Ok(RoutedResult::Comprehensive { content, sources })
    }
}

fn no_context() -> RoutedResult {
    RoutedResult::NoContext {
        content: NO_CONTEXT_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn routed_result_is_tagged() {
        let value = serde_json::to_value(RoutedResult::NoContext {
            content: "none".into(),
        })
        .unwrap();
        assert_eq!(value, json!({"type": "no_context", "content": "none"}));

        let value = serde_json::to_value(RoutedResult::Category(CategoryResult::empty("notes"))).unwrap();
        assert_eq!(value["type"], "category");
        assert_eq!(value["category"], "notes");
    }

    #[test]
    fn register_replaces_same_category() {
        let store = Arc::new(ContextStore::unopened());
        let mut router = QueryRouter::new(Arc::new(KeywordClassifier::default()));
        router.register(Arc::new(StoreAdapter::new("notes", store.clone(), None, 5, 3)));
        router.register(Arc::new(StoreAdapter::new("notes", store, None, 5, 3)));
        assert_eq!(router.categories(), vec!["notes"]);
    }
}
