//! Error types for the protocol layer.
//!
//! Each Mindmeld crate defines its own error enum; a `ProtocolError`
//! always means the problem is in framing or serialization, not in
//! networking or game state.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a frame into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, or an
    /// event name this protocol doesn't recognize.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded but violates a protocol rule.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
