//! # Storefront API
//!
//! HTTP server for the product catalog and sales workflows.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ApiConfig::load ─► init_tracing ─► Database::new (migrations)          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  NotificationDispatcher spawned ─► axum::serve(router)                  │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  Ctrl+C / SIGTERM ─► stop accepting ─► drain notifications ─► close db  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use storefront_api::config::ApiConfig;
use storefront_api::notifications::{AuditLogHandler, NotificationBus, NotificationDispatcher};
use storefront_api::{init_tracing, router, AppState};
use storefront_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::load(None).context("Failed to load configuration")?;
    init_tracing(&config.logging);

    info!("Starting Storefront API server...");
    info!(
        bind = %config.server.bind_address(),
        database = %config.database.path.display(),
        "Configuration loaded"
    );

    let db = Database::new(config.database.to_db_config())
        .await
        .context("Failed to open database")?;
    info!("Database ready");

    let (bus, dispatcher_task, dispatcher) = if config.notifications.enabled {
        let (bus, dispatcher, handle) =
            NotificationDispatcher::new(config.notifications.channel_capacity);
        let task = tokio::spawn(dispatcher.with_handler(Arc::new(AuditLogHandler)).run());
        (bus, Some(task), Some(handle))
    } else {
        info!("Notifications disabled");
        (NotificationBus::disabled(), None, None)
    };

    let app = router(AppState::new(db.clone(), bus));

    let listener = TcpListener::bind(config.server.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address()))?;
    info!(addr = %config.server.bind_address(), "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    if let Some(handle) = dispatcher {
        handle.shutdown().await;
    }
    if let Some(task) = dispatcher_task {
        let _ = task.await;
    }
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(?e, "Failed to install Ctrl+C handler");
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
                tracing::error!(?e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
