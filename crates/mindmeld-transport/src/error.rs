//! Error types for the transport layer.
//!
//! Clean closes are not errors here: `Connection::recv` reports them
//! as `Ok(None)` so the handler can tell "peer hung up" apart from
//! "the wire broke".

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Sending a frame failed (peer gone, socket broken).
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving a frame failed mid-stream.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding the listener or accepting a connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}
