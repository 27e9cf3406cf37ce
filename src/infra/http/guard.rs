//! Locale routing guard.
//!
//! Every page path must start with a supported locale. The bare root goes to the default
//! landing page, anything else without a locale prefix goes to the not-found page.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::domain::locale::LocaleSet;

pub const DEFAULT_LANDING_PAGE: &str = "newslist";
pub const DEFAULT_NOT_FOUND_PATH: &str = "/not-found";

/// First segments the guard never inspects.
const UNGUARDED_PREFIXES: [&str; 5] = ["api", "trpc", "_next", "_vercel", "healthz"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRoutes {
    /// Page under `/{default locale}/` that the bare root redirects to.
    pub landing_page: String,
    pub not_found_path: String,
}

impl Default for GuardRoutes {
    fn default() -> Self {
        Self {
            landing_page: DEFAULT_LANDING_PAGE.to_string(),
            not_found_path: DEFAULT_NOT_FOUND_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Redirect(String),
    Passthrough,
}

pub fn evaluate(path: &str, locales: &LocaleSet, routes: &GuardRoutes) -> GuardDecision {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return GuardDecision::Redirect(format!(
            "/{}/{}",
            locales.default_locale(),
            routes.landing_page
        ));
    }

    if is_unguarded(trimmed, routes) {
        return GuardDecision::Passthrough;
    }

    let first = trimmed.split('/').next().unwrap_or_default();
    if locales.contains(first) {
        GuardDecision::Passthrough
    } else {
        GuardDecision::Redirect(routes.not_found_path.clone())
    }
}

fn is_unguarded(trimmed: &str, routes: &GuardRoutes) -> bool {
    let first = trimmed.split('/').next().unwrap_or_default();
    let last = trimmed.rsplit('/').next().unwrap_or_default();
    UNGUARDED_PREFIXES.contains(&first)
        || last.contains('.')
        || trimmed == routes.not_found_path.trim_matches('/')
}

#[derive(Debug, Clone)]
pub struct LocaleGuard {
    pub locales: LocaleSet,
    pub routes: GuardRoutes,
}

impl LocaleGuard {
    pub fn new(locales: LocaleSet, routes: GuardRoutes) -> Self {
        Self { locales, routes }
    }
}

/// Axum middleware answering guarded paths with `307 Temporary Redirect`.
pub async fn locale_guard(
    State(guard): State<LocaleGuard>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match evaluate(request.uri().path(), &guard.locales, &guard.routes) {
        GuardDecision::Passthrough => next.run(request).await,
        GuardDecision::Redirect(target) => {
            debug!(
                target = "newsdesk::http::guard",
                path = request.uri().path(),
                redirect = %target,
                "locale guard redirect"
            );
            Redirect::temporary(&target).into_response()
        }
    }
}
