use std::sync::Arc;

use anyhow::Context;
use pairchat::{
    AppState,
    config::Config,
    db::SqliteStore,
    logging,
    registry::ConnectionRegistry,
    services::ChatService,
};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let config = Config::from_env()?;

    let store = SqliteStore::connect(&config.database_url, config.db_max_connections)
        .await
        .context("opening database")?;
    store.migrate().await.context("running migrations")?;

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(config.session_inactivity));

    let registry = ConnectionRegistry::new();
    let chat = ChatService::builder(Arc::new(store), registry.clone())
        .room_create_attempts(config.room_create_attempts)
        .request_timeout(config.request_timeout)
        .build();

    let app_state = AppState {
        chat,
        registry,
        config: Arc::new(config.clone()),
    };

    let app = pairchat::router(app_state).layer(session_layer);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
