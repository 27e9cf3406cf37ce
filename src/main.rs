use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use newsdesk::{
    application::{content::ContentService, error::AppError},
    cache::{CacheConfig, SystemClock, build_result_cache},
    config,
    infra::{
        content::{ClientConfig, ContentClient, HttpContentBackend},
        error::InfraError,
        http::{self, GuardRoutes, HttpOptions, HttpState},
        telemetry,
    },
};
use tokio_util::sync::CancellationToken;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Probe(_) => run_probe(settings).await,
    }
}

fn build_content_service(settings: &config::Settings) -> Result<ContentService, AppError> {
    let client = ContentClient::new(&ClientConfig::from(&settings.content))
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    match client.base_url() {
        Some(url) => info!(content_url = %url, "content backend configured"),
        None => warn!("content backend url not configured; all pages will use mock content"),
    }

    let locales = settings.locales.locales.clone();
    let backend = Arc::new(HttpContentBackend::new(client, locales.clone()));
    let cache = build_result_cache(
        &CacheConfig::from(&settings.cache),
        Arc::new(SystemClock),
    );
    Ok(ContentService::new(backend, cache, locales))
}

async fn run_probe(settings: config::Settings) -> Result<(), AppError> {
    let content = build_content_service(&settings)?;
    if content.is_available().await {
        info!("content backend is available");
        Ok(())
    } else {
        Err(AppError::unexpected("content backend is unavailable"))
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let content = build_content_service(&settings)?;
    let options = HttpOptions {
        revalidate: settings.content.revalidate,
        debounce: settings.search.debounce,
        site_url: settings.site.base_url.clone(),
        routes: GuardRoutes {
            landing_page: settings.locales.landing_page.clone(),
            not_found_path: settings.locales.not_found_path.clone(),
        },
    };
    let router = http::build_router(HttpState::new(content, options));

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "listening");

    let shutdown = CancellationToken::new();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();
    let mut server = tokio::spawn(server);

    tokio::select! {
        result = &mut server => return flatten_server_result(result),
        _ = shutdown_signal() => {}
    }

    info!(
        grace_seconds = settings.server.graceful_shutdown.as_secs(),
        "shutting down"
    );
    shutdown.cancel();
    drain(server, settings.server.graceful_shutdown).await
}

async fn drain(
    server: tokio::task::JoinHandle<std::io::Result<()>>,
    grace: Duration,
) -> Result<(), AppError> {
    match tokio::time::timeout(grace, server).await {
        Ok(result) => flatten_server_result(result),
        Err(_) => {
            warn!("graceful shutdown timed out; dropping open connections");
            Ok(())
        }
    }
}

fn flatten_server_result(
    result: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(AppError::from(InfraError::from(err))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
