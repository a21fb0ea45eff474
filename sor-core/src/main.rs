use sor_core::api::{create_router, AppState};
use sor_core::config::Settings;
use sor_core::sync::PoolSyncer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sor_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting smart order router");

    let settings = Settings::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load settings, using defaults");
        Settings::default()
    });
    tracing::info!(
        max_hops = settings.routing.max_hops,
        top_k = settings.routing.top_k,
        "configuration loaded"
    );

    let state = AppState::new(settings.clone());

    tracing::info!("syncing pool data...");
    let syncer = PoolSyncer::new(state.dispatcher.clone());
    if let Err(e) = syncer.sync_pools().await {
        tracing::error!(error = %e, "failed to sync pools");
    } else {
        let stats = state.graph.stats();
        tracing::info!(
            tokens = stats.token_count,
            pools = stats.pool_count,
            "pool sync complete"
        );
    }

    let app = create_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!(%addr, "starting server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");

    tracing::info!("health check: http://{addr}/health");
    tracing::info!("quote api: http://{addr}/v1/quote");

    axum::serve(listener, app)
        .await
        .expect("server error");
}
