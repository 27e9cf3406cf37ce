//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::domain::locale::{DEFAULT_LOCALE, DEFAULT_SUPPORTED_LOCALES, Locale, LocaleSet};
use crate::infra::http::guard::{DEFAULT_LANDING_PAGE, DEFAULT_NOT_FOUND_PATH};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "newsdesk";
const ENV_PREFIX: &str = "NEWSDESK";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_REVALIDATE_SECS: u64 = 60;
const DEFAULT_CACHE_FRESHNESS_SECS: u64 = 5 * 60;
const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

/// Command-line arguments for the newsdesk binary.
#[derive(Debug, Parser)]
#[command(
    name = "newsdesk",
    version,
    about = "Localized news content gateway over a headless CMS"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "NEWSDESK_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Check whether the content backend is reachable and exit.
    Probe(ProbeArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub content: ContentOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ContentOverrides {
    /// Base URL of the content backend.
    #[arg(long = "content-url", env = "NEWSDESK_CONTENT_URL", value_name = "URL")]
    pub content_url: Option<String>,

    /// Bearer token sent to the content backend.
    #[arg(
        long = "content-token",
        env = "NEWSDESK_CONTENT_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true
    )]
    pub content_token: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub content: ContentOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Toggle the result cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override how long cached results stay fresh.
    #[arg(long = "cache-freshness-seconds", value_name = "SECONDS")]
    pub cache_freshness_seconds: Option<u64>,

    /// Public URL of the site, used for sitemap locations.
    #[arg(long = "site-url", env = "NEWSDESK_SITE_URL", value_name = "URL")]
    pub site_url: Option<String>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub content: ContentSettings,
    pub locales: LocaleSettings,
    pub cache: CacheSettings,
    pub search: SearchSettings,
    pub site: SiteSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    /// `None` leaves the backend unconfigured; every request is then served from mock data.
    pub base_url: Option<Url>,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
    /// `max-age` advertised on page responses.
    pub revalidate: Duration,
}

#[derive(Debug, Clone)]
pub struct LocaleSettings {
    pub locales: LocaleSet,
    pub landing_page: String,
    pub not_found_path: String,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub freshness: Duration,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub debounce: Duration,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub base_url: Option<Url>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("locales.supported"),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Probe(args)) => raw.apply_content_overrides(&args.content),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    content: RawContentSettings,
    locales: RawLocaleSettings,
    cache: RawCacheSettings,
    search: RawSearchSettings,
    site: RawSiteSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(seconds) = overrides.cache_freshness_seconds {
            self.cache.freshness_seconds = Some(seconds);
        }
        if let Some(url) = overrides.site_url.as_ref() {
            self.site.url = Some(url.clone());
        }

        self.apply_content_overrides(&overrides.content);
    }

    fn apply_content_overrides(&mut self, overrides: &ContentOverrides) {
        if let Some(url) = overrides.content_url.as_ref() {
            self.content.url = Some(url.clone());
        }
        if let Some(token) = overrides.content_token.as_ref() {
            self.content.api_token = Some(token.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            content,
            locales,
            cache,
            search,
            site,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            content: build_content_settings(content)?,
            locales: build_locale_settings(locales)?,
            cache: build_cache_settings(cache)?,
            search: build_search_settings(search),
            site: build_site_settings(site)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_shutdown = positive_secs(
        server.graceful_shutdown_seconds,
        DEFAULT_GRACEFUL_SHUTDOWN_SECS,
        "server.graceful_shutdown_seconds",
    )?;

    Ok(ServerSettings {
        addr,
        graceful_shutdown,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let base_url = non_blank(content.url)
        .map(|raw| parse_http_url(&raw, "content.url"))
        .transpose()?;

    Ok(ContentSettings {
        base_url,
        api_token: non_blank(content.api_token),
        request_timeout: positive_secs(
            content.request_timeout_seconds,
            DEFAULT_REQUEST_TIMEOUT_SECS,
            "content.request_timeout_seconds",
        )?,
        probe_timeout: positive_secs(
            content.probe_timeout_seconds,
            DEFAULT_PROBE_TIMEOUT_SECS,
            "content.probe_timeout_seconds",
        )?,
        revalidate: Duration::from_secs(
            content.revalidate_seconds.unwrap_or(DEFAULT_REVALIDATE_SECS),
        ),
    })
}

fn build_locale_settings(locales: RawLocaleSettings) -> Result<LocaleSettings, LoadError> {
    let supported = match locales.supported {
        Some(codes) => codes
            .iter()
            .map(Locale::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| LoadError::invalid("locales.supported", err.to_string()))?,
        None => DEFAULT_SUPPORTED_LOCALES
            .iter()
            .map(Locale::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| LoadError::invalid("locales.supported", err.to_string()))?,
    };
    let default = Locale::new(locales.default.as_deref().unwrap_or(DEFAULT_LOCALE))
        .map_err(|err| LoadError::invalid("locales.default", err.to_string()))?;
    let set = LocaleSet::new(supported, default)
        .map_err(|err| LoadError::invalid("locales.default", err.to_string()))?;

    let landing_page = locales
        .landing_page
        .as_deref()
        .unwrap_or(DEFAULT_LANDING_PAGE)
        .trim_matches('/')
        .to_string();
    if landing_page.is_empty() {
        return Err(LoadError::invalid("locales.landing_page", "must not be empty"));
    }

    let not_found_path = locales
        .not_found_path
        .unwrap_or_else(|| DEFAULT_NOT_FOUND_PATH.to_string());
    let not_found_segment = not_found_path.trim_matches('/');
    if !not_found_path.starts_with('/') || not_found_segment.is_empty() {
        return Err(LoadError::invalid(
            "locales.not_found_path",
            "must be an absolute path other than `/`",
        ));
    }
    if set.contains(not_found_segment.split('/').next().unwrap_or_default()) {
        return Err(LoadError::invalid(
            "locales.not_found_path",
            "must not start with a locale segment",
        ));
    }

    Ok(LocaleSettings {
        locales: set,
        landing_page,
        not_found_path,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        freshness: positive_secs(
            cache.freshness_seconds,
            DEFAULT_CACHE_FRESHNESS_SECS,
            "cache.freshness_seconds",
        )?,
    })
}

fn build_search_settings(search: RawSearchSettings) -> SearchSettings {
    SearchSettings {
        debounce: Duration::from_millis(search.debounce_ms.unwrap_or(DEFAULT_SEARCH_DEBOUNCE_MS)),
    }
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let base_url = non_blank(site.url)
        .map(|raw| parse_http_url(&raw, "site.url"))
        .transpose()?;
    Ok(SiteSettings { base_url })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    url: Option<String>,
    api_token: Option<String>,
    request_timeout_seconds: Option<u64>,
    probe_timeout_seconds: Option<u64>,
    revalidate_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLocaleSettings {
    supported: Option<Vec<String>>,
    default: Option<String>,
    landing_page: Option<String>,
    not_found_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    freshness_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSearchSettings {
    debounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    url: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn positive_secs(
    value: Option<u64>,
    default: u64,
    key: &'static str,
) -> Result<Duration, LoadError> {
    match value.unwrap_or(default) {
        0 => Err(LoadError::invalid(key, "must be greater than zero")),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_http_url(raw: &str, key: &'static str) -> Result<Url, LoadError> {
    let url = Url::parse(raw)
        .map_err(|err| LoadError::invalid(key, format!("invalid url `{raw}`: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(LoadError::invalid(
            key,
            format!("unsupported scheme `{other}`"),
        )),
    }
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
