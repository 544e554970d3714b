use std::sync::Arc;

use axum::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod db;
mod error;
mod handler;
mod model;
mod route;
mod schema;

use config::Config;
use db::Database;
use route::{cors_layer, create_router};

// Struct representing the application state
pub struct AppState {
    db: Database,
}

// Entry point of the application
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_session_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Connect to the database and make sure both tables exist
    let db = match Database::connect(&config).await {
        Ok(db) => {
            tracing::info!(url = %config.database_url, "connected to the database");
            db
        }
        Err(err) => {
            tracing::error!(
                error = ?err,
                url = %config.database_url,
                "failed to connect to the database"
            );
            return Err(err.into());
        }
    };
    db.bootstrap().await?;

    let app_state = Arc::new(AppState { db: db.clone() });
    let app = create_router(app_state, cors_layer(config.cors_origin.as_deref())?);

    let addr = config.addr();
    tracing::info!(%addr, "server running");

    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?err, "failed to listen for ctrl-c");
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
                tracing::error!(error = ?err, "failed to listen for SIGTERM");
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

    tracing::info!("shutdown signal received");
}
