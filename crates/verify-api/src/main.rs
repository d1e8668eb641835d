//! phiacta-verify API server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use verify_api::AppState;
use verify_api::routes;
use verify_config::Settings;
use verify_queue::JobQueue;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("connecting to queue backend...");
    let queue = JobQueue::connect(&settings.redis_url).await?;
    info!("queue connected");

    let bind_addr: SocketAddr = settings.bind_addr.parse()?;
    let cors_origins: Vec<HeaderValue> =
        settings.cors_allowed_origins.iter().filter_map(|origin| origin.parse().ok()).collect();

    let state = AppState::new(Arc::new(queue), Arc::new(settings));

    let app = routes::router(state).layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(cors_origins)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    );

    info!("starting server on {}", bind_addr);
    let listener = TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
