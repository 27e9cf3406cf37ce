//! HTTP adapter for the headless CMS.

pub mod client;
pub mod normalize;
pub mod probe;

use async_trait::async_trait;

use crate::application::backend::{ContentBackend, ContentError};
use crate::domain::ContentResult;
use crate::domain::locale::LocaleSet;
use crate::domain::query::ContentQuery;

pub use client::{ClientConfig, ContentClient};

/// [`ContentBackend`] served by a live CMS over HTTP.
#[derive(Clone, Debug)]
pub struct HttpContentBackend {
    client: ContentClient,
    locales: LocaleSet,
}

impl HttpContentBackend {
    pub fn new(client: ContentClient, locales: LocaleSet) -> Self {
        Self { client, locales }
    }

    pub fn client(&self) -> &ContentClient {
        &self.client
    }
}

#[async_trait]
impl ContentBackend for HttpContentBackend {
    async fn is_available(&self) -> bool {
        probe::is_available(&self.client).await
    }

    async fn fetch(&self, query: &ContentQuery) -> Result<ContentResult, ContentError> {
        let body = self
            .client
            .get_json(query.operation().endpoint(), &query.to_query_pairs())
            .await?;
        let mut result = normalize::normalize(body, query, &self.locales)?;
        if let Some(base) = self.client.base_url() {
            normalize::resolve_media_urls(&mut result, base);
        }
        Ok(result)
    }
}
