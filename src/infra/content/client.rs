use std::time::Duration;

use reqwest::{Client, Response, Url, header::CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

use crate::application::backend::ContentError;
use crate::config::ContentSettings;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection details for the content backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Option<Url>,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl From<&ContentSettings> for ClientConfig {
    fn from(settings: &ContentSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            api_token: settings.api_token.clone(),
            request_timeout: settings.request_timeout,
            probe_timeout: settings.probe_timeout,
        }
    }
}

/// Thin JSON client for the content backend. Never retries.
#[derive(Clone, Debug)]
pub struct ContentClient {
    client: Client,
    base: Option<Url>,
    token: Option<String>,
    request_timeout: Duration,
    probe_timeout: Duration,
}

impl ContentClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ContentError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(|err| ContentError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            base: config.base_url.as_ref().map(with_trailing_slash),
            token: config
                .api_token
                .as_ref()
                .filter(|token| !token.trim().is_empty())
                .cloned(),
            request_timeout: config.request_timeout,
            probe_timeout: config.probe_timeout,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("newsdesk/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.base.is_some()
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    pub fn url(&self, path: &str, query: &[(String, String)]) -> Result<Url, ContentError> {
        let base = self
            .base
            .as_ref()
            .ok_or_else(|| ContentError::config("content base URL is not set"))?;
        let mut url = base
            .join(path.trim_start_matches('/'))
            .map_err(|err| ContentError::config(format!("invalid content path `{path}`: {err}")))?;
        url.set_query(None);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// GET `path` with the content-query deadline and decode the JSON body.
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value, ContentError> {
        self.request(path, query, self.request_timeout).await
    }

    pub async fn request(
        &self,
        path: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> Result<Value, ContentError> {
        let resp = self.send(path, query, timeout).await?;
        Self::handle(resp).await
    }

    pub(super) async fn send(
        &self,
        path: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> Result<Response, ContentError> {
        let url = self.url(path, query)?;
        debug!(target = "newsdesk::content::client", url = %url, "content request");

        let mut req = self
            .client
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .timeout(timeout);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        req.send().await.map_err(map_reqwest_error)
    }

    async fn handle(resp: Response) -> Result<Value, ContentError> {
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            return Err(ContentError::upstream(status.as_u16(), text));
        }
        serde_json::from_slice(&bytes).map_err(|err| ContentError::Decode(err.to_string()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ContentError {
    if err.is_timeout() {
        ContentError::Timeout
    } else {
        ContentError::Transport(err.to_string())
    }
}

fn with_trailing_slash(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
