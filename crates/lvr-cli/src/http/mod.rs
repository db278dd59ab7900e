//! HTTP API.

mod admin;
mod contact;
pub mod error;
mod events;
mod health;
mod projections;
mod tracking;
pub mod urls;

use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use lvr_core::Store;
use lvr_core::config::ServiceConfig;
use lvr_core::market::MarketCatalog;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::notify::{
    BestEffort, CrmClient, DisabledCrm, LogMailer, Mailer, RelayMailer, SalesforceClient,
};
use urls::PublicUrls;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub markets: Arc<MarketCatalog>,
    pub urls: PublicUrls,
    pub mailer: Arc<dyn Mailer>,
    pub mail_from: String,
    pub crm: Arc<dyn CrmClient>,
    pub tasks: BestEffort,
}

impl AppState {
    /// Wire the store, market bundles and notifiers described by `config`.
    ///
    /// Mail falls back to [`LogMailer`] without a relay URL and the CRM to
    /// [`DisabledCrm`] without credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the public base URL is invalid, the markets file
    /// cannot be loaded or the HTTP client cannot be built.
    pub fn from_config(config: &ServiceConfig, store: Store) -> anyhow::Result<Self> {
        let urls = PublicUrls::new(&config.server.public_base_url)?;
        let markets = match &config.markets.file {
            Some(path) => MarketCatalog::load(path)?,
            None => MarketCatalog::builtin(),
        };
        let timeout = Duration::from_secs(config.notify.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        let mailer: Arc<dyn Mailer> = match &config.mail.relay_url {
            Some(url) => Arc::new(RelayMailer::new(
                http.clone(),
                url.clone(),
                config.mail.relay_token.clone(),
            )),
            None => {
                tracing::warn!("no mail relay configured, agent emails will only be logged");
                Arc::new(LogMailer)
            }
        };
        let crm: Arc<dyn CrmClient> = match SalesforceClient::from_config(&config.salesforce, http)
        {
            Some(client) => Arc::new(client),
            None => {
                tracing::warn!("Salesforce credentials not configured, CRM updates disabled");
                Arc::new(DisabledCrm)
            }
        };

        Ok(Self {
            store,
            markets: Arc::new(markets),
            urls,
            mailer,
            mail_from: config.mail.from.clone(),
            crm,
            tasks: BestEffort::new(timeout),
        })
    }
}

pub fn router(state: AppState) -> Router {
    api_router(state)
        .layer(TraceLayer::new_for_http())
        .merge(health::router())
}

fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/projections", post(projections::create))
        .route("/api/projections/{slug}", get(projections::get_by_slug))
        .route(
            "/api/projections/{owner_slug}/{slug}",
            get(projections::get_by_owner_and_slug),
        )
        .route("/api/events", post(events::append).get(events::list_for_slug))
        .route("/api/report-error", post(events::report_error))
        .route("/api/contact", post(contact::submit))
        .route("/api/admin/runs", get(admin::list_runs))
        .route("/t", get(tracking::click))
        .with_state(state)
}

/// Bind `bind`, serve until ctrl-c/SIGTERM, then wait for in-flight
/// notifications.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn setup_and_serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let tasks = state.tasks.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind to address {bind}"))?;

    tracing::info!(bind, "lvr service is up and running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("error running axum server")?;

    tracing::info!("waiting for background notifications");
    tasks.drain().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
