use anyhow::{Context, Result};
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn init_tracing() {
    tracing_subscriber::fmt().init();
}

pub fn init_env() {
    // Absence of a .env file is fine in deployed environments.
    let _ = dotenvy::dotenv();
}

/// Binds the listener and serves the router until the process is stopped.
pub async fn serve(service_name: &str, app: Router, listen_addr: &str) -> Result<()> {
    let app = app.layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;
    tracing::info!("{} listening on {}", service_name, listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
