//! Per-category retrieval.
//!
//! Each registered category is served by one [`CategoryAdapter`]. The stock
//! [`StoreAdapter`] reads from the [`ContextStore`] and optionally asks a
//! [`Summarizer`] to answer the query from what it found.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::error::StoreError;
use crate::llm::Summarizer;
use crate::memory::types::ContextEntry;
use crate::store::ContextStore;

/// What one category contributed to a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryResult {
    pub category: String,
    pub content: String,
    pub entry_count: usize,
    /// True when `content` came from the summarizer rather than raw entries.
    pub synthesized: bool,
}

impl CategoryResult {
    pub fn empty(category: &str) -> Self {
        Self {
            category: category.to_string(),
            content: String::new(),
            entry_count: 0,
            synthesized: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }
}

#[async_trait]
pub trait CategoryAdapter: Send + Sync {
    fn category(&self) -> &str;

    /// Store failures propagate; summarizer failures do not.
    async fn get_context(
        &self,
        user_id: i64,
        tenant_id: &str,
        query: &str,
    ) -> Result<CategoryResult, StoreError>;
}

pub struct StoreAdapter {
    category: String,
    store: Arc<ContextStore>,
    summarizer: Option<Arc<dyn Summarizer>>,
    search_limit: usize,
    recent_limit: usize,
}

impl StoreAdapter {
    pub fn new(
        category: impl Into<String>,
        store: Arc<ContextStore>,
        summarizer: Option<Arc<dyn Summarizer>>,
        search_limit: usize,
        recent_limit: usize,
    ) -> Self {
        Self {
            category: category.into(),
            store,
            summarizer,
            search_limit,
            recent_limit,
        }
    }

    /// Entries matching the query text, else the most recent ones.
    async fn retrieve(
        &self,
        user_id: i64,
        tenant_id: &str,
        query: &str,
    ) -> Result<Vec<ContextEntry>, StoreError> {
        let query = query.trim();
        if !query.is_empty() {
            let hits = self
                .store
                .search(user_id, tenant_id, &self.category, query, self.search_limit)
                .await?;
            if !hits.is_empty() {
                return Ok(hits);
            }
        }
        self.store
            .get(user_id, tenant_id, &self.category, None, Some(self.recent_limit))
            .await
    }
}

#[async_trait]
impl CategoryAdapter for StoreAdapter {
    fn category(&self) -> &str {
        &self.category
    }

    async fn get_context(
        &self,
        user_id: i64,
        tenant_id: &str,
        query: &str,
    ) -> Result<CategoryResult, StoreError> {
        let entries = self.retrieve(user_id, tenant_id, query).await?;
        if entries.is_empty() {
            return Ok(CategoryResult::empty(&self.category));
        }

        if let Some(summarizer) = &self.summarizer {
            match summarizer.summarize(&self.category, &entries, query).await {
                Ok(summary) if !summary.trim().is_empty() => {
                    return Ok(CategoryResult {
                        category: self.category.clone(),
                        content: summary,
                        entry_count: entries.len(),
                        synthesized: true,
                    });
                }
                Ok(_) => tracing::warn!(category = %self.category, "summarizer returned nothing, using raw entries"),
                Err(e) => tracing::warn!(category = %self.category, error = %e, "summarizer failed, using raw entries"),
            }
        }

        Ok(CategoryResult {
            category: self.category.clone(),
            content: render_entries(&entries)?,
            entry_count: entries.len(),
            synthesized: false,
        })
    }
}

/// Raw fallback body: the entries as pretty JSON.
pub fn render_entries(entries: &[ContextEntry]) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(entries)?)
}
