//! Trailpost - Content moderation for the hiking club back office

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trailpost::{
    api::{self, AppState},
    config::Config,
    hooks::{hook_names, HookManager, PRIORITY_LATE},
    identity::create_identity_provider,
    services::ModerationService,
    store::create_store,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trailpost=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting trailpost...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    let store = create_store(&config.content_store)?;
    tracing::info!("Content store initialized: {:?}", config.content_store.driver);

    let identity_provider = create_identity_provider(&config.identity)?;
    tracing::info!("Identity provider initialized: {:?}", config.identity.driver);

    let hook_manager = Arc::new(HookManager::new());
    hook_manager.register(
        hook_names::CONTENT_AFTER_TRANSITION,
        |data| {
            tracing::info!(target: "trailpost::audit", "Status changed: {}", data);
            None
        },
        PRIORITY_LATE,
    );
    hook_manager.register(
        hook_names::CONTENT_TRANSITION_REJECTED,
        |data| {
            tracing::info!(target: "trailpost::audit", "Transition refused: {}", data);
            None
        },
        PRIORITY_LATE,
    );

    let moderation_service = Arc::new(ModerationService::with_hooks(store, hook_manager));

    let state = AppState {
        moderation_service,
        identity_provider,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
