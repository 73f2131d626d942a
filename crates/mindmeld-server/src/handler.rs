//! Per-connection handler: frame decoding and command dispatch.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler, plus a pump task that drains the connection's event
//! channel onto the socket. The flow is:
//!   1. Open the outbound event channel and start the pump.
//!   2. Loop: receive frames → decode → dispatch to the bound session
//!      (or the registry, for create/join).
//!   3. On close or error, the binding guard tells the session the
//!      player is gone.
//!
//! A connection is bound to at most one session at a time. Frames
//! naming a different game code than the bound one are answered with
//! `gameError` and never forwarded; a session can only ever be driven
//! by the two connections seated in it.

use std::sync::Arc;

use mindmeld_protocol::{ClientEvent, Codec, GameCode, ServerEvent};
use mindmeld_session::{EventSender, SessionError, SessionHandle, SlotId};
use mindmeld_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::ServerError;

/// The connection's seat in a session, released on drop.
///
/// Dropping the guard fires a leave for whatever session the
/// connection was last bound to, so the partner gets
/// `playerDisconnected` even if the handler exits on an error path.
/// Leaving an already-stopped session is a harmless no-op.
struct BindingGuard {
    binding: Option<(SessionHandle, SlotId)>,
}

impl BindingGuard {
    fn new() -> Self {
        Self { binding: None }
    }

    fn bind(&mut self, handle: SessionHandle, slot: SlotId) {
        self.binding = Some((handle, slot));
    }

    /// Whether the connection is currently seated in a live session.
    fn is_bound(&self) -> bool {
        match &self.binding {
            Some((handle, _)) => !handle.is_closed(),
            None => false,
        }
    }

    /// The live session this connection is seated in, if `game_id`
    /// names it. Clears the binding if the session has stopped.
    fn bound_for(&mut self, game_id: &str) -> BoundLookup {
        let code = GameCode::new(game_id);
        match &self.binding {
            Some((handle, slot)) if *handle.code() == code => {
                if handle.is_closed() {
                    self.binding = None;
                    BoundLookup::Gone
                } else {
                    BoundLookup::Bound(handle.clone(), *slot)
                }
            }
            _ => BoundLookup::NotYours,
        }
    }
}

impl Drop for BindingGuard {
    fn drop(&mut self) {
        if let Some((handle, slot)) = self.binding.take() {
            handle.leave(slot);
        }
    }
}

enum BoundLookup {
    /// Bound to this code and the session is live.
    Bound(SessionHandle, SlotId),
    /// Bound to this code but the session already stopped.
    Gone,
    /// Not bound, or bound to a different game.
    NotYours,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), ServerError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let conn = Arc::new(conn);

    // The outbound channel outlives any single session: the handler
    // keeps this sender for the connection's whole lifetime, and
    // sessions get clones. A finished session dropping its clone
    // therefore never closes the channel.
    let (events_tx, events_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let pump = tokio::spawn(pump_events(Arc::clone(&conn), Arc::clone(&state), events_rx, conn_id));

    let mut guard = BindingGuard::new();

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                // Malformed frames are dropped, not fatal: a buggy
                // client must not be able to kill its own game.
                tracing::debug!(%conn_id, error = %e, "undecodable frame dropped");
                continue;
            }
        };

        dispatch(event, &mut guard, &state, &events_tx, conn_id).await;
    }

    // Fires the leave before the pump is torn down, so the partner's
    // playerDisconnected can still flush through this handler's peer.
    drop(guard);
    drop(events_tx);
    let _ = pump.await;
    Ok(())
}

/// Drains the connection's event channel onto the socket, encoding
/// each event as one frame. Runs until every sender is dropped or a
/// send fails.
async fn pump_events(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState>,
    mut events_rx: mpsc::UnboundedReceiver<ServerEvent>,
    conn_id: ConnectionId,
) {
    while let Some(event) = events_rx.recv().await {
        let frame = match state.codec.encode(&event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(%conn_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&frame).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping pump");
            break;
        }
    }
}

/// Routes one decoded client event.
async fn dispatch(
    event: ClientEvent,
    guard: &mut BindingGuard,
    state: &Arc<ServerState>,
    events_tx: &EventSender,
    conn_id: ConnectionId,
) {
    match event {
        ClientEvent::CreateGame { username } => {
            if guard.is_bound() {
                send_error(events_tx, "already in a game");
                return;
            }
            let handle = state
                .registry
                .create(state.game_config.clone(), username, events_tx.clone())
                .await;
            tracing::info!(%conn_id, code = %handle.code(), "game created");
            guard.bind(handle, SlotId::A);
        }

        ClientEvent::JoinGame { game_id, username } => {
            if guard.is_bound() {
                send_error(events_tx, "already in a game");
                return;
            }
            let code = GameCode::new(&game_id);
            let handle = match state.registry.lookup(&code).await {
                Ok(handle) => handle,
                Err(_) => {
                    let _ = events_tx.send(ServerEvent::GameNotFound {});
                    return;
                }
            };
            match handle.join(username, events_tx.clone()).await {
                Ok(slot) => {
                    tracing::info!(%conn_id, code = %code, %slot, "joined game");
                    guard.bind(handle, slot);
                }
                Err(SessionError::GameFull(_)) => {
                    let _ = events_tx.send(ServerEvent::GameFull {});
                }
                Err(_) => {
                    // The actor stopped between lookup and join.
                    let _ = events_tx.send(ServerEvent::GameNotFound {});
                }
            }
        }

        ClientEvent::ReadyForRound { game_id } => match guard.bound_for(&game_id) {
            BoundLookup::Bound(handle, slot) => handle.ready(slot),
            BoundLookup::Gone => {
                let _ = events_tx.send(ServerEvent::GameNotFound {});
            }
            BoundLookup::NotYours => send_error(events_tx, "not your game"),
        },

        ClientEvent::SubmitWord { game_id, word } => match guard.bound_for(&game_id) {
            BoundLookup::Bound(handle, slot) => handle.submit_word(slot, word),
            BoundLookup::Gone => {
                let _ = events_tx.send(ServerEvent::GameNotFound {});
            }
            BoundLookup::NotYours => send_error(events_tx, "not your game"),
        },

        ClientEvent::PlayAgainChoice {
            game_id,
            play_again,
        } => match guard.bound_for(&game_id) {
            BoundLookup::Bound(handle, slot) => handle.play_again(slot, play_again),
            BoundLookup::Gone => {
                let _ = events_tx.send(ServerEvent::GameNotFound {});
            }
            BoundLookup::NotYours => send_error(events_tx, "not your game"),
        },

        ClientEvent::LeaveGame { game_id } => match guard.bound_for(&game_id) {
            BoundLookup::Bound(handle, slot) => {
                // Clear the binding so the drop guard doesn't leave twice.
                guard.binding = None;
                tracing::info!(%conn_id, code = %handle.code(), "left game");
                handle.leave(slot);
            }
            BoundLookup::Gone => {}
            BoundLookup::NotYours => send_error(events_tx, "not your game"),
        },
    }
}

fn send_error(events_tx: &EventSender, message: &str) {
    let _ = events_tx.send(ServerEvent::GameError {
        message: message.to_string(),
    });
}
