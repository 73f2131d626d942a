//! Error types for the session layer.

use mindmeld_protocol::GameCode;

/// Errors that can occur during session operations.
///
/// All of these are session-scoped and reported back to the requesting
/// player; none of them terminates another session or the process.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No live session for this code. Also the answer for codes whose
    /// session already terminated — a freed code no longer resolves.
    #[error("game {0} not found")]
    NotFound(GameCode),

    /// Both player slots are occupied.
    #[error("game {0} is full")]
    GameFull(GameCode),

    /// The session's command channel is gone (actor already stopped).
    /// Callers treat this the same as [`SessionError::NotFound`].
    #[error("game {0} is unavailable")]
    Unavailable(GameCode),
}
