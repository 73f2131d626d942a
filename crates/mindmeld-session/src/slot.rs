//! Player slots: the per-player state a session owns.

use mindmeld_protocol::ServerEvent;
use tokio::sync::mpsc;

use crate::Submission;

/// Channel sender delivering outbound events to one player's
/// connection. Sessions hold clones; the connection handler keeps the
/// original alive for the connection's whole lifetime, so a finished
/// session never severs the client.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Identifies one of a session's two player slots.
///
/// Slot A is filled by `createGame`, slot B by `joinGame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotId {
    A,
    B,
}

impl SlotId {
    /// Index into the session's slot array.
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    /// The opposing slot.
    pub fn other(self) -> SlotId {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "slot-A"),
            Self::B => write!(f, "slot-B"),
        }
    }
}

/// One player's state inside a session.
///
/// Owned exclusively by the session actor; nothing outside the actor
/// ever reads or writes a slot.
#[derive(Debug)]
pub struct PlayerSlot {
    /// Display name, as given at create/join.
    pub name: String,
    /// Rounds won this game. Cooperative: both slots score on a match.
    pub score: u32,
    /// This round's word, if submitted. Cleared when input reopens.
    pub submission: Option<Submission>,
    /// Play-again answer, tri-state: `None` = undecided.
    pub play_again: Option<bool>,
    sender: EventSender,
}

impl PlayerSlot {
    /// Creates a fresh slot for a newly seated player.
    pub fn new(name: String, sender: EventSender) -> Self {
        Self {
            name,
            score: 0,
            submission: None,
            play_again: None,
            sender,
        }
    }

    /// Delivers an event to this player. Silently drops if the
    /// connection is gone — disconnects are detected by the transport
    /// read loop, not here.
    pub fn send(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }

    /// Resets everything a rematch resets: score, submission, answer.
    pub fn reset_for_new_game(&mut self) {
        self.score = 0;
        self.submission = None;
        self.play_again = None;
    }
}
