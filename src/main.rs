// Döner ranking server

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use doener_ranking::{api::create_router, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;

    let app = create_router(app_state).layer(CorsLayer::permissive());

    // Start server
    let addr = config.server_address();
    info!("Döner ranking server starting on http://{}", addr);
    info!("  GET  /api/ranking?q=&sort=&order=                  - Ranking table");
    info!("  GET  /api/vendors/{{vendor}}                         - Vendor detail");
    info!("  GET  /api/vendors/{{vendor}}/comments?limit=&after=  - Comment page");
    info!("  POST /api/vendors/{{vendor}}/comments                - Add comment");
    info!("  POST /api/vendors/{{vendor}}/comments/{{id}}/upvote    - Upvote");
    info!("  PUT  /api/vendors/{{vendor}}/ratings/{{user}}          - Rate");
    info!("  Static files from {}", config.site.static_dir);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
