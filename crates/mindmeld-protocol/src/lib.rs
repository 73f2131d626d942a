//! Wire protocol for Mindmeld.
//!
//! This crate defines the language clients and server speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`GameCode`]) — the
//!   `{event, payload}` frames that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how frames are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing so.
//!
//! The protocol layer sits between transport (raw bytes) and the
//! session engine (game rules). It knows nothing about connections,
//! timers, or scores — only frame shapes.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientEvent, GameCode, ServerEvent};
