use std::sync::Arc;
use std::time::Duration;

use httpmock::MockServer;
use newsdesk::application::content::{ContentService, Source};
use newsdesk::application::mock;
use newsdesk::cache::{CacheConfig, ManualClock, MemoryResultCache, NoopResultCache};
use newsdesk::domain::locale::{Locale, LocaleSet};
use newsdesk::domain::query::{ContentQuery, PageRequest, Sort};
use newsdesk::infra::content::{ClientConfig, ContentClient, HttpContentBackend};
use serde_json::json;
use time::macros::datetime;
use url::Url;

fn locale(code: &str) -> Locale {
    Locale::new(code).expect("locale")
}

fn backend(base: Option<&str>) -> Arc<HttpContentBackend> {
    let client = ContentClient::new(&ClientConfig {
        base_url: base.map(|raw| Url::parse(raw).expect("url")),
        request_timeout: Duration::from_secs(2),
        probe_timeout: Duration::from_secs(1),
        ..ClientConfig::default()
    })
    .expect("client");
    Arc::new(HttpContentBackend::new(client, LocaleSet::default()))
}

fn english_articles() -> serde_json::Value {
    json!({
        "data": [
            { "id": 1, "documentId": "a", "locale": "en", "title": "One", "slug": "one" },
            { "id": 2, "documentId": "b", "locale": "en", "title": "Two", "slug": "two" },
            { "id": 3, "documentId": "c", "locale": "en", "title": "Three", "slug": "three" }
        ],
        "meta": { "pagination": { "page": 1, "pageSize": 10, "pageCount": 1, "total": 3 } }
    })
}

#[tokio::test]
async fn empty_thai_articles_fall_back_to_english_once() {
    let server = MockServer::start_async().await;
    let probe = server
        .mock_async(|when, then| {
            when.method("GET")
                .path("/api/articles")
                .query_param("pagination[pageSize]", "1");
            then.status(200).json_body(json!({ "data": [] }));
        })
        .await;
    let thai = server
        .mock_async(|when, then| {
            when.method("GET")
                .path("/api/articles")
                .query_param("locale", "th");
            then.status(200).json_body(json!({
                "data": [],
                "meta": { "pagination": { "page": 1, "pageSize": 10, "pageCount": 0, "total": 0 } }
            }));
        })
        .await;
    let english = server
        .mock_async(|when, then| {
            when.method("GET")
                .path("/api/articles")
                .query_param("locale", "en");
            then.status(200).json_body(english_articles());
        })
        .await;

    let service = ContentService::new(
        backend(Some(&server.base_url())),
        Arc::new(NoopResultCache),
        LocaleSet::default(),
    );
    let resolved = service
        .resolve(&ContentQuery::articles(locale("th")))
        .await;

    assert_eq!(resolved.source, Source::Fallback);
    assert_eq!(resolved.result.len(), 3);
    assert!(resolved.result.data.iter().all(|item| item.locale == "en"));
    probe.assert_async().await;
    thai.assert_async().await;
    english.assert_async().await;
}

#[tokio::test]
async fn unconfigured_backend_serves_wrapped_mock_articles() {
    let service = ContentService::new(
        backend(None),
        Arc::new(NoopResultCache),
        LocaleSet::default(),
    );
    let result = service
        .articles(&locale("th"), PageRequest::default(), Sort::newest_first())
        .await;

    assert_eq!(result.data, mock::articles().to_vec());
    let pagination = result.pagination();
    assert_eq!(pagination.page, 1);
    assert_eq!(pagination.page_size, 10);
    assert_eq!(pagination.page_count, 1);
    assert_eq!(pagination.total, mock::articles().len() as u64);
}

#[tokio::test]
async fn cached_articles_expire_after_the_freshness_window() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET")
                .path("/api/articles")
                .query_param("pagination[pageSize]", "1");
            then.status(200).json_body(json!({ "data": [] }));
        })
        .await;
    let english = server
        .mock_async(|when, then| {
            when.method("GET")
                .path("/api/articles")
                .query_param("locale", "en")
                .query_param("pagination[page]", "1");
            then.status(200).json_body(english_articles());
        })
        .await;

    let clock = Arc::new(ManualClock::new(datetime!(2024-06-01 12:00 UTC)));
    let cache = Arc::new(MemoryResultCache::with_clock(
        &CacheConfig::default(),
        clock.clone(),
    ));
    let service = ContentService::new(
        backend(Some(&server.base_url())),
        cache,
        LocaleSet::default(),
    );
    let query = ContentQuery::articles(locale("en")).with_page(PageRequest::new(1, 10));

    assert_eq!(service.resolve(&query).await.source, Source::Live);

    clock.advance(Duration::from_secs(4 * 60));
    assert_eq!(service.resolve(&query).await.source, Source::Cache);
    english.assert_calls_async(1).await;

    clock.advance(Duration::from_secs(2 * 60));
    assert_eq!(service.resolve(&query).await.source, Source::Live);
    english.assert_calls_async(2).await;
}

#[tokio::test]
async fn backend_errors_in_both_locales_degrade_to_mock() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET")
                .path("/api/articles")
                .query_param("pagination[pageSize]", "1");
            then.status(200).json_body(json!({ "data": [] }));
        })
        .await;
    let categories = server
        .mock_async(|when, then| {
            when.method("GET").path("/api/categories");
            then.status(500).body("boom");
        })
        .await;

    let service = ContentService::new(
        backend(Some(&server.base_url())),
        Arc::new(NoopResultCache),
        LocaleSet::default(),
    );
    let resolved = service
        .resolve(&ContentQuery::categories(locale("th")))
        .await;

    assert_eq!(resolved.source, Source::Mock);
    assert_eq!(resolved.result.data, mock::categories().to_vec());
    categories.assert_calls_async(2).await;
}
