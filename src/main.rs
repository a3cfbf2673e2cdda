use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cinematch_api::{
    api::{create_router, AppState},
    config::Config,
    db::{self, PgStore},
    services::providers::omdb::OmdbProvider,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinematch_api=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    let redis_client = db::create_redis_client(&config.redis_url)?;

    let store = Arc::new(PgStore::new(pool));
    let provider = Arc::new(OmdbProvider::new(
        redis_client,
        config.omdb_api_key.clone(),
        config.omdb_api_url.clone(),
    ));

    let state = AppState::new(
        provider,
        store.clone(),
        store,
        config.recommendation_params(),
    );
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(host = %config.host, port = config.port, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
