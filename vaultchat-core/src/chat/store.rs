//! Host document store collaborator

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by the host's document store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Io(String),

    #[error("Search failed: {0}")]
    Search(String),
}

/// One search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Note title, usually the file name without extension
    pub title: String,

    /// Vault-relative path
    pub path: String,

    /// Heading the match was found under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,

    /// Relevance; higher is better
    pub score: f32,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, path: impl Into<String>, score: f32) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            heading: None,
            score,
        }
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }
}

/// Read and search access to the user's notes, implemented by the host
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Full text of one note
    async fn read_document(&self, path: &str) -> Result<String, StoreError>;

    /// Best matches for `query`, most relevant first, at most `limit`
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, StoreError>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn read_document(&self, path: &str) -> Result<String, StoreError> {
        (**self).read_document(path).await
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, StoreError> {
        (**self).search(query, limit).await
    }
}
