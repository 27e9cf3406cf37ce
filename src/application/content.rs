//! Content access with locale fallback, availability short-circuit and result caching.
//!
//! Every public operation returns well-formed content: live data for the requested locale,
//! live data for the default locale, or built-in mock data. Backend failures are logged and
//! swallowed here.

use std::fmt;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::application::backend::{ContentBackend, ContentError};
use crate::application::mock;
use crate::cache::{CacheKey, ResultCache};
use crate::domain::locale::{Locale, LocaleSet};
use crate::domain::query::{ContentQuery, PageRequest, SocialChannel, Sort};
use crate::domain::{ContentItem, ContentResult, Envelope};

pub const METRIC_CONTENT_RESOLVED: &str = "newsdesk_content_resolved_total";

/// Where a resolved result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    /// The requested locale (or a locale-free document).
    Live,
    /// The default locale, after the requested one came back empty or failed.
    Fallback,
    Mock,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Cache => "cache",
            Source::Live => "live",
            Source::Fallback => "fallback",
            Source::Mock => "mock",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub result: ContentResult,
    pub source: Source,
}

impl Resolved {
    fn new(result: ContentResult, source: Source) -> Self {
        Self { result, source }
    }

    fn mock(query: &ContentQuery) -> Self {
        Self::new(mock::respond(query), Source::Mock)
    }

    pub fn into_first(self) -> Option<ContentItem> {
        self.result.into_first()
    }
}

#[derive(Clone)]
pub struct ContentService {
    backend: Arc<dyn ContentBackend>,
    cache: Arc<dyn ResultCache>,
    locales: LocaleSet,
}

impl ContentService {
    pub fn new(
        backend: Arc<dyn ContentBackend>,
        cache: Arc<dyn ResultCache>,
        locales: LocaleSet,
    ) -> Self {
        Self {
            backend,
            cache,
            locales,
        }
    }

    pub fn locales(&self) -> &LocaleSet {
        &self.locales
    }

    pub async fn is_available(&self) -> bool {
        self.backend.is_available().await
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Run `query` through cache, availability probe, requested locale and default locale.
    pub async fn fetch_with_fallback(&self, query: &ContentQuery) -> ContentResult {
        self.resolve(query).await.result
    }

    pub async fn resolve(&self, query: &ContentQuery) -> Resolved {
        let resolved = self.resolve_uncounted(query).await;
        counter!(
            METRIC_CONTENT_RESOLVED,
            "operation" => query.operation().name(),
            "source" => resolved.source.as_str()
        )
        .increment(1);
        resolved
    }

    async fn resolve_uncounted(&self, query: &ContentQuery) -> Resolved {
        let key = CacheKey::for_query(query);
        if let Some(result) = self.cache.get(&key) {
            debug!(operation = %query.operation(), key = %key, "content cache hit");
            return Resolved::new(result, Source::Cache);
        }

        let resolved = if self.backend.is_available().await {
            self.fetch_live(query).await
        } else {
            info!(
                operation = %query.operation(),
                locale = query.locale().map(Locale::as_str).unwrap_or_default(),
                "content backend unavailable; serving mock content"
            );
            Resolved::mock(query)
        };

        self.cache.set(key, resolved.result.clone());
        resolved
    }

    /// Requested locale first, then at most one attempt in the default locale.
    async fn fetch_live(&self, query: &ContentQuery) -> Resolved {
        let fallback = query
            .locale()
            .and_then(|locale| self.locales.fallback_for(locale))
            .map(|default| query.with_locale(default.clone()));

        match self.backend.fetch(query).await {
            Ok(result) if !result.is_empty() => Resolved::new(result, Source::Live),
            Ok(result) => match fallback {
                None => Resolved::new(result, Source::Live),
                Some(fallback) => {
                    debug!(
                        operation = %query.operation(),
                        locale = query.locale().map(Locale::as_str).unwrap_or_default(),
                        fallback_locale = self.locales.default_locale().as_str(),
                        "no content in requested locale; trying default locale"
                    );
                    self.fetch_fallback(&fallback).await
                }
            },
            Err(err) => {
                log_failure(query, &err);
                match fallback {
                    None => Resolved::mock(query),
                    Some(fallback) => self.fetch_fallback(&fallback).await,
                }
            }
        }
    }

    async fn fetch_fallback(&self, fallback: &ContentQuery) -> Resolved {
        match self.backend.fetch(fallback).await {
            Ok(result) => Resolved::new(result, Source::Fallback),
            Err(err) => {
                log_failure(fallback, &err);
                Resolved::mock(fallback)
            }
        }
    }

    pub async fn articles(&self, locale: &Locale, page: PageRequest, sort: Sort) -> ContentResult {
        let query = ContentQuery::articles(locale.clone())
            .with_page(page)
            .with_sort(sort);
        self.fetch_with_fallback(&query).await
    }

    /// The newest `limit` articles.
    pub async fn featured_articles(&self, locale: &Locale, limit: u32) -> ContentResult {
        self.fetch_with_fallback(&ContentQuery::featured_articles(locale.clone(), limit))
            .await
    }

    pub async fn article_by_slug(&self, locale: &Locale, slug: &str) -> Option<ContentItem> {
        let query = ContentQuery::article_by_slug(locale.clone(), slug);
        self.resolve(&query).await.into_first()
    }

    /// Blank text short-circuits to an empty result without touching the backend.
    pub async fn search_articles(&self, locale: &Locale, text: &str) -> ContentResult {
        let text = text.trim();
        if text.is_empty() {
            return Envelope::default();
        }
        let query = ContentQuery::search(locale.clone(), text);
        self.fetch_with_fallback(&query).await
    }

    pub async fn categories(&self, locale: &Locale) -> ContentResult {
        self.fetch_with_fallback(&ContentQuery::categories(locale.clone()))
            .await
    }

    pub async fn home(&self, locale: &Locale) -> Option<ContentItem> {
        self.resolve(&ContentQuery::home(locale.clone()))
            .await
            .into_first()
    }

    pub async fn contact(&self, locale: &Locale) -> Option<ContentItem> {
        self.resolve(&ContentQuery::contact(locale.clone()))
            .await
            .into_first()
    }

    /// Locale-free social link documents; absent when missing or unreachable.
    pub async fn social(&self, channel: SocialChannel) -> Option<ContentItem> {
        self.resolve(&ContentQuery::social(channel))
            .await
            .into_first()
    }
}

fn log_failure(query: &ContentQuery, err: &ContentError) {
    warn!(
        operation = %query.operation(),
        locale = query.locale().map(Locale::as_str).unwrap_or_default(),
        error = %err,
        "content fetch failed"
    );
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::cache::{CacheConfig, MemoryResultCache, NoopResultCache};

    #[derive(Clone, Copy)]
    enum Outcome {
        Items(u64),
        Empty,
        Fail,
    }

    struct ScriptedBackend {
        available: bool,
        by_locale: HashMap<&'static str, Outcome>,
        probes: AtomicUsize,
        fetched: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedBackend {
        fn new(available: bool, script: &[(&'static str, Outcome)]) -> Arc<Self> {
            Arc::new(Self {
                available,
                by_locale: script.iter().copied().collect(),
                probes: AtomicUsize::new(0),
                fetched: Mutex::new(Vec::new()),
            })
        }

        fn fetched_locales(&self) -> Vec<Option<String>> {
            self.fetched.lock().expect("fetched").clone()
        }
    }

    #[async_trait]
    impl ContentBackend for ScriptedBackend {
        async fn is_available(&self) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst);
            self.available
        }

        async fn fetch(&self, query: &ContentQuery) -> Result<ContentResult, ContentError> {
            let locale = query.locale().map(Locale::to_string);
            self.fetched.lock().expect("fetched").push(locale.clone());
            let outcome = locale
                .as_deref()
                .and_then(|code| self.by_locale.get(code).copied())
                .unwrap_or(Outcome::Empty);
            match outcome {
                Outcome::Items(count) => {
                    let code = locale.unwrap_or_else(|| "en".into());
                    Ok(Envelope::wrap(
                        (1..=count)
                            .map(|id| {
                                ContentItem::new(id, code.clone())
                                    .with_attribute("slug", json!(format!("item-{id}")))
                            })
                            .collect(),
                    ))
                }
                Outcome::Empty => Ok(Envelope::default()),
                Outcome::Fail => Err(ContentError::upstream(502, "bad gateway")),
            }
        }
    }

    fn locale(code: &str) -> Locale {
        Locale::new(code).expect("locale")
    }

    fn service(backend: Arc<ScriptedBackend>) -> ContentService {
        ContentService::new(backend, Arc::new(NoopResultCache), LocaleSet::default())
    }

    fn some(code: &str) -> Option<String> {
        Some(code.to_string())
    }

    #[tokio::test]
    async fn empty_requested_locale_falls_back_once() {
        let backend = ScriptedBackend::new(
            true,
            &[("th", Outcome::Empty), ("en", Outcome::Items(3))],
        );
        let resolved = service(backend.clone())
            .resolve(&ContentQuery::articles(locale("th")))
            .await;

        assert_eq!(resolved.source, Source::Fallback);
        assert_eq!(resolved.result.len(), 3);
        assert!(resolved.result.data.iter().all(|item| item.locale == "en"));
        assert_eq!(backend.fetched_locales(), vec![some("th"), some("en")]);
    }

    #[tokio::test]
    async fn empty_fallback_is_terminal() {
        let backend = ScriptedBackend::new(true, &[("th", Outcome::Empty), ("en", Outcome::Empty)]);
        let resolved = service(backend.clone())
            .resolve(&ContentQuery::categories(locale("th")))
            .await;

        assert_eq!(resolved.source, Source::Fallback);
        assert!(resolved.result.is_empty());
        assert_eq!(backend.fetched_locales().len(), 2);
    }

    #[tokio::test]
    async fn default_locale_never_retries() {
        for outcome in [Outcome::Empty, Outcome::Items(1)] {
            let backend = ScriptedBackend::new(true, &[("en", outcome)]);
            service(backend.clone())
                .resolve(&ContentQuery::articles(locale("en")))
                .await;
            assert_eq!(backend.fetched_locales(), vec![some("en")]);
        }
    }

    #[tokio::test]
    async fn default_locale_failure_serves_mock() {
        let backend = ScriptedBackend::new(true, &[("en", Outcome::Fail)]);
        let resolved = service(backend.clone())
            .resolve(&ContentQuery::articles(locale("en")))
            .await;

        assert_eq!(resolved.source, Source::Mock);
        assert_eq!(resolved.result.len(), mock::articles().len());
        assert_eq!(backend.fetched_locales().len(), 1);
    }

    #[tokio::test]
    async fn failed_requested_locale_tries_default() {
        let backend = ScriptedBackend::new(
            true,
            &[("th", Outcome::Fail), ("en", Outcome::Items(2))],
        );
        let resolved = service(backend.clone())
            .resolve(&ContentQuery::articles(locale("th")))
            .await;

        assert_eq!(resolved.source, Source::Fallback);
        assert_eq!(resolved.result.len(), 2);
    }

    #[tokio::test]
    async fn both_attempts_failing_serves_mock() {
        let backend = ScriptedBackend::new(true, &[("th", Outcome::Fail), ("en", Outcome::Fail)]);
        let resolved = service(backend.clone())
            .resolve(&ContentQuery::home(locale("th")))
            .await;

        assert_eq!(resolved.source, Source::Mock);
        assert_eq!(resolved.result.len(), 1);
        assert_eq!(backend.fetched_locales().len(), 2);
    }

    #[tokio::test]
    async fn unavailable_backend_is_never_queried() {
        let backend = ScriptedBackend::new(false, &[("th", Outcome::Items(5))]);
        let resolved = service(backend.clone())
            .resolve(&ContentQuery::articles(locale("th")))
            .await;

        assert_eq!(resolved.source, Source::Mock);
        assert!(backend.fetched_locales().is_empty());
        assert_eq!(backend.probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_hit_skips_probe_and_fetch() {
        let backend = ScriptedBackend::new(true, &[("en", Outcome::Items(2))]);
        let cache = Arc::new(MemoryResultCache::new(&CacheConfig::default()));
        let service = ContentService::new(backend.clone(), cache, LocaleSet::default());
        let query = ContentQuery::articles(locale("en"));

        let first = service.resolve(&query).await;
        let second = service.resolve(&query).await;

        assert_eq!(first.source, Source::Live);
        assert_eq!(second.source, Source::Cache);
        assert_eq!(first.result, second.result);
        assert_eq!(backend.probes.load(Ordering::SeqCst), 1);
        assert_eq!(backend.fetched_locales().len(), 1);
    }

    #[tokio::test]
    async fn mock_results_are_cached_under_the_requested_key() {
        let backend = ScriptedBackend::new(false, &[]);
        let cache = Arc::new(MemoryResultCache::new(&CacheConfig::default()));
        let service = ContentService::new(backend.clone(), cache.clone(), LocaleSet::default());
        let query = ContentQuery::articles(locale("th"));

        let first = service.resolve(&query).await;
        assert_eq!(first.source, Source::Mock);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&CacheKey::for_query(&query)), Some(first.result.clone()));

        let second = service.resolve(&query).await;
        assert_eq!(second.source, Source::Cache);
        assert_eq!(second.result, first.result);
        assert_eq!(backend.probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mock_after_failed_fallback_is_cached() {
        let backend = ScriptedBackend::new(true, &[("th", Outcome::Fail), ("en", Outcome::Fail)]);
        let cache = Arc::new(MemoryResultCache::new(&CacheConfig::default()));
        let service = ContentService::new(backend.clone(), cache.clone(), LocaleSet::default());
        let query = ContentQuery::categories(locale("th"));

        assert_eq!(service.resolve(&query).await.source, Source::Mock);
        assert_eq!(service.resolve(&query).await.source, Source::Cache);
        assert_eq!(backend.fetched_locales().len(), 2);
    }

    #[tokio::test]
    async fn blank_search_does_not_probe() {
        let backend = ScriptedBackend::new(true, &[("en", Outcome::Items(1))]);
        let result = service(backend.clone())
            .search_articles(&locale("en"), "   ")
            .await;

        assert!(result.is_empty());
        assert_eq!(backend.probes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn slug_lookup_returns_first_item() {
        let backend = ScriptedBackend::new(
            true,
            &[("th", Outcome::Empty), ("en", Outcome::Items(2))],
        );
        let article = service(backend)
            .article_by_slug(&locale("th"), "item-1")
            .await
            .expect("fallback article");
        assert_eq!(article.id, 1);
        assert_eq!(article.locale, "en");
    }

    #[tokio::test]
    async fn social_documents_do_not_fall_back() {
        let backend = ScriptedBackend::new(true, &[]);
        let facebook = service(backend.clone())
            .social(SocialChannel::Facebook)
            .await;
        assert!(facebook.is_none());
        assert_eq!(backend.fetched_locales(), vec![None]);
    }
}
