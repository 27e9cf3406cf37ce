use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Method, Request, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION},
    },
    response::Response,
};
use newsdesk::application::backend::{ContentBackend, ContentError};
use newsdesk::application::content::ContentService;
use newsdesk::application::mock;
use newsdesk::cache::NoopResultCache;
use newsdesk::domain::ContentResult;
use newsdesk::domain::locale::LocaleSet;
use newsdesk::domain::query::ContentQuery;
use newsdesk::infra::http::{HttpOptions, HttpState, REQUEST_ID_HEADER, build_router};
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

/// Answers every query with the built-in content and remembers what was asked.
struct RecordingBackend {
    available: bool,
    queries: Mutex<Vec<Vec<(String, String)>>>,
}

impl RecordingBackend {
    fn new(available: bool) -> Arc<Self> {
        Arc::new(Self {
            available,
            queries: Mutex::new(Vec::new()),
        })
    }

    fn recorded(&self) -> Vec<Vec<(String, String)>> {
        self.queries.lock().expect("queries").clone()
    }
}

#[async_trait]
impl ContentBackend for RecordingBackend {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn fetch(&self, query: &ContentQuery) -> Result<ContentResult, ContentError> {
        self.queries
            .lock()
            .expect("queries")
            .push(query.to_query_pairs());
        Ok(mock::respond(query))
    }
}

fn state(backend: Arc<RecordingBackend>) -> HttpState {
    let content = ContentService::new(backend, Arc::new(NoopResultCache), LocaleSet::default());
    let options = HttpOptions {
        site_url: Some(Url::parse("https://news.example.com").expect("url")),
        ..HttpOptions::default()
    };
    HttpState::new(content, options)
}

fn router(backend: Arc<RecordingBackend>) -> Router {
    build_router(state(backend))
}

async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    app.clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn root_redirects_to_default_news_list() {
    let app = router(RecordingBackend::new(true));
    let response = get(&app, "/").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/en/newslist");
}

#[tokio::test]
async fn unsupported_locale_redirects_to_not_found() {
    let app = router(RecordingBackend::new(true));

    let response = get(&app, "/fr/contact").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/not-found");

    let response = get(&app, "/not-found").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn supported_locale_reaches_the_page() {
    let app = router(RecordingBackend::new(true));
    let response = get(&app, "/en/contact").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    let body = json_body(response).await;
    assert_eq!(body["locale"], "en");
    assert!(body["contact"].is_null());
    assert!(body["facebook"].is_null());
}

#[tokio::test]
async fn news_list_honours_sort_and_paging() {
    let backend = RecordingBackend::new(true);
    let app = router(backend.clone());
    let response = get(&app, "/th/newslist?sort=oldest&page=1&page_size=2").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CACHE_CONTROL).and_then(|v| v.to_str().ok()),
        Some("public, max-age=60")
    );
    let body = json_body(response).await;
    assert_eq!(body["sort"], "oldest");
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert!(body["meta"]["pagination"]["total"].is_u64());

    let first = backend.recorded().into_iter().next().expect("one request");
    assert!(first.contains(&("sort".to_string(), "publishedAt:asc".to_string())));
    assert!(first.contains(&("locale".to_string(), "th".to_string())));
    assert!(first.contains(&("pagination[pageSize]".to_string(), "2".to_string())));
}

#[tokio::test]
async fn unknown_sort_is_a_bad_request() {
    let app = router(RecordingBackend::new(true));
    let response = get(&app, "/en/newslist?sort=views").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn article_detail_found_and_missing() {
    let app = router(RecordingBackend::new(false));

    let response = get(&app, "/en/newsdesc/building-responsive-websites").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["title"], "Building Responsive Websites");

    let response = get(&app, "/th/newsdesc/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn home_page_bundles_featured_articles() {
    let app = router(RecordingBackend::new(false));
    let body = json_body(get(&app, "/th").await).await;

    assert_eq!(body["locale"], "th");
    assert_eq!(body["home"]["title"], "Welcome to Our Platform");
    assert_eq!(body["featured"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn healthz_reports_backend_availability() {
    for available in [true, false] {
        let app = router(RecordingBackend::new(available));
        let response = get(&app, "/healthz").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["cms_available"], available);
    }
}

#[tokio::test]
async fn sitemap_is_served_as_xml() {
    let app = router(RecordingBackend::new(false));
    let response = get(&app, "/sitemap.xml").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/xml"))
    );
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let xml = String::from_utf8(bytes.to_vec()).expect("utf8");
    assert!(xml.contains("https://news.example.com/en/newsdesc/welcome-to-our-news-platform"));
}

#[tokio::test]
async fn search_without_session_answers_immediately() {
    let app = router(RecordingBackend::new(false));

    let body = json_body(get(&app, "/en/search?q=responsive").await).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let body = json_body(get(&app, "/en/search?q=%20%20").await).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test(start_paused = true)]
async fn superseded_session_search_answers_no_content() {
    let backend = RecordingBackend::new(true);
    let app = router(backend.clone());

    let first = {
        let app = app.clone();
        tokio::spawn(async move { get(&app, "/en/search?q=w&session=tab-1").await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = {
        let app = app.clone();
        tokio::spawn(async move { get(&app, "/en/search?q=web&session=tab-1").await })
    };

    let first = first.await.expect("join");
    let second = second.await.expect("join");

    assert_eq!(first.status(), StatusCode::NO_CONTENT);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(backend.recorded().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn abandoned_session_search_is_evicted() {
    let backend = RecordingBackend::new(true);
    let state = state(backend.clone());
    let sessions = Arc::clone(&state.search_sessions);
    let app = build_router(state);

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        get(&app, "/en/search?q=web&session=tab-9"),
    )
    .await;

    assert!(abandoned.is_err());
    assert!(sessions.is_empty());
    assert!(backend.recorded().is_empty());

    let response = get(&app, "/en/search?q=web&session=tab-9").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(sessions.is_empty());
}
