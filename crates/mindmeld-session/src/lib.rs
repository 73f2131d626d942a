//! Session engine for Mindmeld.
//!
//! Every live game is an actor: a spawned task owning the session's
//! state, fed by a single command channel. Player commands (via
//! [`SessionHandle`]) and timer deadlines land on the same queue, so
//! state transitions are serialized without locks.
//!
//! The [`SessionRegistry`] maps game codes to handles. An actor
//! removes itself from the registry when it reaches a terminal phase,
//! so a finished game's code stops resolving immediately.

mod config;
mod error;
mod normalize;
mod registry;
mod session;
mod slot;

pub use config::{GameConfig, Phase};
pub use error::SessionError;
pub use normalize::{normalize, Submission};
pub use registry::SessionRegistry;
pub use session::{spawn_session, SessionHandle};
pub use slot::{EventSender, PlayerSlot, SlotId};
