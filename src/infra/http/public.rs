use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::{
    application::{
        content::ContentService,
        error::{AppError, HttpError},
        pages::{PageService, SortOption},
        search::{DEFAULT_DEBOUNCE, SearchDebouncer},
        sitemap::SitemapService,
    },
    domain::{ContentResult, locale::Locale, query::PageRequest},
};

use super::{
    guard::{GuardRoutes, LocaleGuard, locale_guard},
    middleware::{log_responses, set_request_context},
};

pub const DEFAULT_REVALIDATE: Duration = Duration::from_secs(60);
pub const MAX_PAGE_SIZE: u32 = 100;

/// Knobs for the public surface that are not part of content resolution.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// `max-age` advertised on page responses.
    pub revalidate: Duration,
    pub debounce: Duration,
    pub site_url: Option<Url>,
    pub routes: GuardRoutes,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            revalidate: DEFAULT_REVALIDATE,
            debounce: DEFAULT_DEBOUNCE,
            site_url: None,
            routes: GuardRoutes::default(),
        }
    }
}

#[derive(Clone)]
pub struct HttpState {
    pub content: ContentService,
    pub pages: Arc<PageService>,
    pub sitemap: Arc<SitemapService>,
    pub search_sessions: Arc<DashMap<String, Arc<SearchDebouncer>>>,
    pub guard: LocaleGuard,
    pub revalidate: Duration,
    pub debounce: Duration,
}

impl HttpState {
    pub fn new(content: ContentService, options: HttpOptions) -> Self {
        let guard = LocaleGuard::new(content.locales().clone(), options.routes);
        Self {
            pages: Arc::new(PageService::new(content.clone())),
            sitemap: Arc::new(SitemapService::new(content.clone(), options.site_url)),
            search_sessions: Arc::new(DashMap::new()),
            guard,
            revalidate: options.revalidate,
            debounce: options.debounce,
            content,
        }
    }

    fn locale(&self, code: &str) -> Result<Locale, AppError> {
        self.content
            .locales()
            .resolve(code)
            .cloned()
            .ok_or(AppError::NotFound)
    }
}

pub fn build_router(state: HttpState) -> Router {
    let not_found_path = state.guard.routes.not_found_path.clone();

    Router::new()
        .route("/healthz", get(healthz))
        .route("/sitemap.xml", get(sitemap))
        .route(&not_found_path, get(not_found))
        .route("/{locale}", get(home))
        .route("/{locale}/newslist", get(news_list))
        .route("/{locale}/newsdesc/{slug}", get(news_detail))
        .route("/{locale}/categories", get(categories))
        .route("/{locale}/search", get(search))
        .route("/{locale}/contact", get(contact))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.guard.clone(),
            locale_guard,
        ))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

fn page_response<T: Serialize>(state: &HttpState, body: T) -> Response {
    let mut response = Json(body).into_response();
    let max_age = format!("public, max-age={}", state.revalidate.as_secs());
    if let Ok(value) = HeaderValue::from_str(&max_age) {
        response.headers_mut().insert(CACHE_CONTROL, value);
    }
    response
}

async fn home(
    State(state): State<HttpState>,
    Path(locale): Path<String>,
) -> Result<Response, AppError> {
    let locale = state.locale(&locale)?;
    let page = state.pages.home(&locale).await;
    Ok(page_response(&state, page))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NewsListQuery {
    sort: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
}

async fn news_list(
    State(state): State<HttpState>,
    Path(locale): Path<String>,
    Query(query): Query<NewsListQuery>,
) -> Result<Response, AppError> {
    let locale = state.locale(&locale)?;
    let sort = match query.sort.as_deref() {
        Some(raw) => raw.parse::<SortOption>()?,
        None => SortOption::default(),
    };
    let defaults = PageRequest::default();
    let page = PageRequest::new(
        query.page.unwrap_or(defaults.page),
        query
            .page_size
            .unwrap_or(defaults.page_size)
            .min(MAX_PAGE_SIZE),
    );

    let list = state.pages.news_list(&locale, sort, page).await;
    Ok(page_response(&state, list))
}

async fn news_detail(
    State(state): State<HttpState>,
    Path((locale, slug)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let locale = state.locale(&locale)?;
    let article = state
        .content
        .article_by_slug(&locale, &slug)
        .await
        .ok_or(AppError::NotFound)?;
    Ok(page_response(&state, article))
}

async fn categories(
    State(state): State<HttpState>,
    Path(locale): Path<String>,
) -> Result<Response, AppError> {
    let locale = state.locale(&locale)?;
    let categories = state.content.categories(&locale).await;
    Ok(page_response(&state, categories))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchQuery {
    q: Option<String>,
    session: Option<String>,
}

/// With a `session`, searches are debounced per session and a superseded request answers
/// `204 No Content`.
async fn search(
    State(state): State<HttpState>,
    Path(locale): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, AppError> {
    let locale = state.locale(&locale)?;
    let text = query.q.unwrap_or_default();
    let session = query.session.filter(|session| !session.trim().is_empty());

    if text.trim().is_empty() {
        if let Some(debouncer) = session
            .as_ref()
            .and_then(|session| state.search_sessions.get(session))
        {
            debouncer.cancel();
        }
        return Ok(Json(ContentResult::default()).into_response());
    }

    let Some(session) = session else {
        let result = state.content.search_articles(&locale, &text).await;
        return Ok(Json(result).into_response());
    };

    let debouncer = state
        .search_sessions
        .entry(session.clone())
        .or_insert_with(|| Arc::new(SearchDebouncer::new(state.debounce)))
        .value()
        .clone();
    let _lease = SessionLease {
        sessions: &state.search_sessions,
        session,
    };
    let outcome = debouncer
        .run(|_token| state.content.search_articles(&locale, &text))
        .await;

    Ok(match outcome {
        Some(result) => Json(result).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Evicts an idle session once its request finishes or is dropped.
struct SessionLease<'a> {
    sessions: &'a DashMap<String, Arc<SearchDebouncer>>,
    session: String,
}

impl Drop for SessionLease<'_> {
    fn drop(&mut self) {
        self.sessions
            .remove_if(&self.session, |_, debouncer| debouncer.is_idle());
    }
}

async fn contact(
    State(state): State<HttpState>,
    Path(locale): Path<String>,
) -> Result<Response, AppError> {
    let locale = state.locale(&locale)?;
    let page = state.pages.contact(&locale).await;
    Ok(page_response(&state, page))
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "not found" })),
    )
        .into_response()
}

async fn healthz(State(state): State<HttpState>) -> Response {
    let available = state.content.is_available().await;
    Json(json!({ "cms_available": available })).into_response()
}

async fn sitemap(State(state): State<HttpState>) -> Result<Response, HttpError> {
    let body = state.sitemap.sitemap_xml().await?;
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/xml; charset=utf-8")
        .header(CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()))
}
