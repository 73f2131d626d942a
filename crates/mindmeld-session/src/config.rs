//! Game configuration and the session phase machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Timing and code-generation settings for a session.
///
/// The defaults mirror what the deployed client was built against:
/// a one-second countdown cadence, five seconds of input time, five
/// seconds showing results, two seconds before a rematch countdown.
/// Every deadline here is scheduled and enforced server-side; the
/// client's own timers are display only.
///
/// Tests compress all of these to milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Gap between countdown ticks ("Ready?", "3", "2", "1", "GO!").
    pub countdown_interval: Duration,

    /// Pause between "GO!" and input opening, so the label is seen.
    pub go_linger: Duration,

    /// How long input stays open each round.
    pub input_deadline: Duration,

    /// How long results stay on screen before the session advances.
    pub results_delay: Duration,

    /// Pause between "play again" agreement and the fresh countdown.
    pub restart_delay: Duration,

    /// Length of generated game codes.
    pub code_length: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            countdown_interval: Duration::from_secs(1),
            go_linger: Duration::from_millis(500),
            input_deadline: Duration::from_secs(5),
            results_delay: Duration::from_secs(5),
            restart_delay: Duration::from_secs(2),
            code_length: 6,
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a session.
///
/// ```text
/// WaitingForOpponent → Countdown → InputOpen → Resolving ─┬→ Countdown   (no match, next round)
///                          ↑                              └→ PlayAgainPending ─┬→ Countdown  (both yes)
///                          └──────────────────────────────────────────────────┘
///                                                          PlayAgainPending ──→ Terminated  (any no)
/// ```
///
/// `Abandoned` is reachable from every non-terminal phase on an
/// explicit leave or a lost connection. `Terminated` and `Abandoned`
/// are absorbing: the actor stops, the registry frees the code, and
/// late frames for that code get "not found" treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Slot A is waiting for someone to join with the code.
    WaitingForOpponent,
    /// Both slots filled; countdown ticks are streaming out.
    Countdown,
    /// Input window is open; the input deadline is armed.
    InputOpen,
    /// Words revealed; results are on screen for a fixed delay.
    Resolving,
    /// A round was won; waiting for both play-again answers.
    PlayAgainPending,
    /// A player declined to continue.
    Terminated,
    /// A player left or disconnected mid-game.
    Abandoned,
}

impl Phase {
    /// Whether the session is finished and the actor should stop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated | Self::Abandoned)
    }

    /// Whether a second player may still join.
    pub fn accepts_join(&self) -> bool {
        matches!(self, Self::WaitingForOpponent)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForOpponent => write!(f, "WaitingForOpponent"),
            Self::Countdown => write!(f, "Countdown"),
            Self::InputOpen => write!(f, "InputOpen"),
            Self::Resolving => write!(f, "Resolving"),
            Self::PlayAgainPending => write!(f, "PlayAgainPending"),
            Self::Terminated => write!(f, "Terminated"),
            Self::Abandoned => write!(f, "Abandoned"),
        }
    }
}
