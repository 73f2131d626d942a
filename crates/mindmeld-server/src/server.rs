//! `GameServer` builder and accept loop.
//!
//! This ties the layers together: transport → protocol → session.
//! Each accepted connection gets its own handler task; all handlers
//! share one [`SessionRegistry`].

use std::sync::Arc;

use mindmeld_protocol::JsonCodec;
use mindmeld_session::{GameConfig, SessionRegistry};
use mindmeld_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::ServerError;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) registry: SessionRegistry,
    pub(crate) game_config: GameConfig,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a game server.
///
/// # Example
///
/// ```rust,ignore
/// let server = GameServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct GameServerBuilder {
    bind_addr: String,
    game_config: GameConfig,
}

impl GameServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            game_config: GameConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the timing configuration new games are created with.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Binds the transport and builds the server.
    pub async fn build(self) -> Result<GameServer, ServerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: SessionRegistry::new(),
            game_config: self.game_config,
            codec: JsonCodec,
        });

        Ok(GameServer { transport, state })
    }
}

impl Default for GameServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GameServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl GameServer {
    /// Creates a new builder.
    pub fn builder() -> GameServerBuilder {
        GameServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("game server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
