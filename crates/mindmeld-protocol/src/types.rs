//! Wire types for the Mindmeld protocol.
//!
//! Every frame on the wire is a JSON object of the form
//! `{ "event": string, "payload": object }`. The two enums in this
//! module — [`ClientEvent`] and [`ServerEvent`] — model exactly that
//! shape via serde's adjacently-tagged representation, so encoding a
//! variant produces the frame directly, with no extra envelope.
//!
//! Payload field names are camelCase on the wire (`gameId`,
//! `playAgain`, `player1Word`, ...) to match the browser client.

use serde::{Deserialize, Deserializer, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// GameCode
// ---------------------------------------------------------------------------

/// A short, human-shareable code identifying one live game.
///
/// Codes are compared case-insensitively: players retype them from a
/// friend's screen, so `ab12cd` must resolve the same game as `AB12CD`.
/// Rather than folding case at every comparison site, the code is
/// normalized (trimmed, uppercased) at construction and the inner
/// string is canonical from then on. This makes `Eq` and `Hash` safe
/// to derive and the type safe to use as a registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct GameCode(String);

impl GameCode {
    /// Builds a code from client-supplied text, normalizing it.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    /// The canonical (uppercase) code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deserialization goes through [`GameCode::new`] so a code arriving
/// on the wire is normalized before it can reach a lookup.
impl<'de> Deserialize<'de> for GameCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(GameCode::new(&raw))
    }
}

// ---------------------------------------------------------------------------
// Client → server events
// ---------------------------------------------------------------------------

/// Frames a client may send.
///
/// `gameId` is carried as a raw string here and normalized into a
/// [`GameCode`] by the dispatcher; keeping the wire type loose means a
/// frame with a sloppily-typed code still decodes and gets the proper
/// "not found" / "not your game" treatment instead of a decode error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Open a new game; the sender becomes slot A.
    CreateGame { username: String },

    /// Join an existing game as slot B.
    JoinGame { game_id: String, username: String },

    /// Legacy readiness signal. Accepted for compatibility with older
    /// clients; the server schedules the countdown itself.
    ReadyForRound { game_id: String },

    /// Submit this round's word. First submission per round wins;
    /// repeats are ignored.
    SubmitWord { game_id: String, word: String },

    /// Answer the post-match "play again?" prompt.
    PlayAgainChoice { game_id: String, play_again: bool },

    /// Leave the game explicitly. Terminal for the whole session.
    LeaveGame { game_id: String },
}

// ---------------------------------------------------------------------------
// Server → client events
// ---------------------------------------------------------------------------

/// Frames the server may send.
///
/// Variants with no data use empty braces so they serialize with a
/// `"payload": {}` object, which is what the client expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Sent to the creator only, with the shareable code.
    GameCreated { game_id: GameCode },

    /// Both slots are occupied; the round cycle is about to begin.
    PlayerJoined { player1: String, player2: String },

    /// The referenced code resolves to no live game.
    GameNotFound {},

    /// The game already has two players.
    GameFull {},

    /// Cosmetic countdown tick ("Ready?", "3", "2", "1", "GO!").
    /// Display only — the authoritative deadline is server-side.
    Countdown { count: String },

    /// Input is open; the input deadline clock has started.
    RoundStart {},

    /// Both words revealed, with the match verdict and running scores.
    RoundResults {
        player1_word: String,
        player2_word: String,
        is_match: bool,
        player1_score: u32,
        player2_score: u32,
    },

    /// The other player hasn't answered the play-again prompt yet.
    WaitingForOtherPlayer {},

    /// Both players opted in; scores and round were reset.
    NewGameStarting {
        player1_score: u32,
        player2_score: u32,
    },

    /// The session ended (a player declined to continue).
    GameEnded { message: String },

    /// The other player left or lost their connection. Terminal.
    PlayerDisconnected {},

    /// The request was valid JSON but not valid for the sender
    /// (wrong game code, not in a game, ...).
    GameError { message: String },
}

// =========================================================================
// Tests
// =========================================================================
