//! The seam between content services and whatever serves content.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ContentResult;
use crate::domain::query::ContentQuery;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content backend is not configured: {0}")]
    Config(String),
    #[error("content request timed out")]
    Timeout,
    #[error("content backend answered HTTP {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to decode content response: {0}")]
    Decode(String),
}

impl ContentError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }
}

/// A source of normalized content.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Pre-flight reachability check; never fails, only answers.
    async fn is_available(&self) -> bool;

    /// Run a single query for the locale it carries. No retries.
    async fn fetch(&self, query: &ContentQuery) -> Result<ContentResult, ContentError>;
}
