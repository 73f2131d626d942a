//! Server binary. Binds the WebSocket listener and runs forever.
//!
//! The bind address comes from `MINDMELD_ADDR` (default
//! `0.0.0.0:8080`); log filtering from `RUST_LOG` as usual.

use mindmeld_server::{GameServer, ServerError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("MINDMELD_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let server = GameServer::builder().bind(&addr).build().await?;
    tracing::info!(%addr, "mindmeld listening");
    server.run().await
}
