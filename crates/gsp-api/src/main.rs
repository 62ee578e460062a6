//! GSP API server binary.

use gsp_api::{app, db, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gsp_api=info,tower_http=info".into()),
        )
        .init();

    let pool = db::init_pool().await?;
    let state = AppState::new(pool);

    let port: u16 = std::env::var("GSP_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "gsp-api listening");

    axum::serve(listener, app(state)).await?;
    Ok(())
}
