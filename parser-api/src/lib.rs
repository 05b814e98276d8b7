//! # parser-api: text extraction for remote documents
//!
//! `parser-api` is a small HTTP service that downloads a document by URL and returns its plain
//! text. It sits in front of retrieval and indexing pipelines that need the words in a PDF or a
//! spreadsheet without caring about the container format.
//!
//! ## Request Flow
//!
//! A `POST /extract_text` request carries a `file_url`. The handler resolves the [`FileType`]
//! from the extension of the URL path, downloads the file through the [`fetch::FetchFile`]
//! implementation in [`AppState`], and hands the bytes to [`extract`] on the blocking thread pool.
//! The response carries the text and the file size. Every failure along the way converts to an
//! HTTP status and a `{"error": ...}` body through [`errors::Error`].
//!
//! Spreadsheets (`xlsx`, `csv`) are rendered row by row, each cell labelled with its column header
//! so the text still reads sensibly once the grid is gone:
//!
//! ```text
//! (Name: Alice,	Age: 30)
//! (Name: Bob,	Age: )
//! ```
//!
//! Documents (`pdf`, `epub`, `txt`, `docx`) are returned as their text content.
//!
//! ## Configuration
//!
//! See [`config`] for the YAML file and `PARSER_API_*` environment overrides. The most relevant
//! knob is `limits.max_file_size`, compared against the upstream `Content-Length` before any of
//! the body is read.
//!
//! ## Running
//!
//! ```bash
//! parser-api -f config.yaml
//! ```
//!
//! OpenAPI documentation is served at `/docs`, and Prometheus metrics at `/internal/metrics` when
//! `enable_metrics` is set.
//!
//! ## Example
//!
//! ```no_run
//! use parser_api::{Application, Config};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::default();
//! Application::new(config)
//!     .await?
//!     .serve(async {
//!         tokio::signal::ctrl_c().await.ok();
//!     })
//!     .await
//! # }
//! ```

pub mod api;
pub mod config;
pub mod errors;
pub mod extract;
pub mod fetch;
pub mod file_type;
pub mod openapi;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;
pub use file_type::FileType;

use crate::{
    fetch::{FetchFile, ReqwestFetcher},
    openapi::ApiDoc,
};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .fetcher(Arc::new(fetcher))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    /// Downloads the files named in extraction requests
    pub fetcher: Arc<dyn FetchFile>,
}

/// Build the application router with all routes and middleware.
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let mut router = Router::new()
        .route("/", get(api::handlers::extract::root))
        .route("/extract_text", post(api::handlers::extract::extract_text))
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The assembled service: router plus the configuration it was built from.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] builds the HTTP client and the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests until the
///    shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting parser API with configuration: {:#?}", config);

        let fetcher = ReqwestFetcher::new(&config.fetch, &config.limits)
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        let state = AppState::builder().config(config.clone()).fetcher(Arc::new(fetcher)).build();
        let router = build_router(&state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Parser API listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM. Pass it to [`Application::serve`].
///
/// A signal whose handler cannot be installed is logged and never fires; the other still does.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down gracefully..."),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully..."),
    }
}
