//! To-do list server: reads settings from the environment, connects to MongoDB once,
//! and serves the todo API under `/todos`.
//!
//! Run from repo root: `cargo run -p todo-server`

use std::sync::Arc;
use todo_backend::{app, AppState, MongoStore, Settings, TodoStore};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("todo_backend=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let store = MongoStore::connect(&settings).await?;
    match store.ping().await {
        Ok(()) => {
            tracing::info!(database = store.database_name(), "MongoDB connected");
            if let Err(e) = store.ensure_indexes().await {
                tracing::warn!(error = %e, "could not create the unique index on id");
            }
        }
        // Requests fail individually until the database is reachable.
        Err(e) => tracing::error!(error = %e, "MongoDB unreachable at startup"),
    }

    let state = AppState::new(Arc::new(store));
    let router = app(state, settings.body_limit);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
