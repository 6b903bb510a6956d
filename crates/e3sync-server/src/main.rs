mod api;
mod middleware;

use std::sync::Arc;

use e3sync_import::{CancelSignal, ImportReconciler};
use e3sync_shopify::ShopifyAdminClient;
use e3sync_upstream::Elektro3Client;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = e3sync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let upstream = match Elektro3Client::from_config(&config) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "upstream client disabled");
            None
        }
    };
    let destination = match ShopifyAdminClient::from_config(&config) {
        Ok(client) => {
            tracing::info!(shop = %client.shop(), mode = %client.mode(), "destination store configured");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "destination client disabled");
            None
        }
    };

    let cancel = CancelSignal::new();
    let state = AppState {
        upstream,
        destination,
        reconciler: ImportReconciler::with_concurrency(config.import_concurrency),
        page_limit: config.page_limit,
        cancel: cancel.clone(),
    };

    let auth = AuthState::from_keys(
        &config.api_keys,
        matches!(config.env, e3sync_core::Environment::Development),
    )?;
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "e3sync-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            cancel.cancel();
        })
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
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

    tracing::info!("shutdown signal received; cancelling running imports");
}
