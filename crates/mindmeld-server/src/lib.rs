//! # Mindmeld server
//!
//! WebSocket server for the Mindmeld word-matching game. Ties the
//! layers together: transport (WebSocket frames) → protocol
//! (`{event, payload}` JSON) → session (game rules and timers).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mindmeld_server::GameServer;
//!
//! # async fn run() -> Result<(), mindmeld_server::ServerError> {
//! let server = GameServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::ServerError;
pub use server::{GameServer, GameServerBuilder};
