use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use spacetravelling::{
    application::{
        chrome::ChromeService, error::AppError, feed::FeedService,
        pagination::TracingDiagnostics,
    },
    config,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        prismic::{PrismicClient, PrismicContentSource},
        telemetry,
    },
    presentation::views::CommentsView,
};
use tokio::sync::oneshot;
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
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let http_state = build_http_state(&settings)?;
    serve_http(&settings, http_state).await
}

fn build_http_state(settings: &config::Settings) -> Result<HttpState, AppError> {
    let client = PrismicClient::new(&settings.prismic).map_err(|err| {
        AppError::from(InfraError::configuration(format!(
            "failed to build content client: {err}"
        )))
    })?;
    let source = PrismicContentSource::new(client, settings.prismic.document_type.clone());

    let comments = settings.comments.as_ref().map(|comments| CommentsView {
        repo: comments.repo.clone(),
        issue_term: comments.issue_term.clone(),
        theme: comments.theme.clone(),
    });

    let feed = FeedService::new(
        Arc::new(source),
        Arc::new(TracingDiagnostics),
        settings.prismic.api_endpoint.clone(),
        settings.prismic.page_size.get(),
        comments,
    );

    Ok(HttpState {
        feed: Arc::new(feed),
        chrome: Arc::new(ChromeService::new(&settings.site)),
    })
}

async fn serve_http(settings: &config::Settings, http_state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(http_state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "spacetravelling::serve",
        addr = %settings.server.addr,
        endpoint = %settings.prismic.api_endpoint,
        "listening"
    );

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        },
    );

    tokio::select! {
        result = server.into_future() => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
        }
        () = drain_deadline(signalled_rx, settings.server.graceful_shutdown) => {
            warn!(
                target = "spacetravelling::serve",
                "graceful shutdown timed out; dropping open connections"
            );
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            target = "spacetravelling::serve",
            error = %err,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
    info!(target = "spacetravelling::serve", "shutdown signal received");
}

/// Completes `grace` after shutdown began; never completes otherwise.
async fn drain_deadline(signalled: oneshot::Receiver<()>, grace: Duration) {
    if signalled.await.is_err() {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(grace).await;
}
