//! The session actor.
//!
//! Each game runs as one spawned task owning all of its state. Player
//! commands and timer firings arrive on the same unbounded channel, so
//! everything the session does is serialized: no locks, no torn reads,
//! and a deadline that raced a phase change is detected by its stale
//! generation stamp and dropped.

use std::time::Duration;

use mindmeld_protocol::{GameCode, ServerEvent};
use mindmeld_timer::DeadlineQueue;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::{GameConfig, Phase};
use crate::error::SessionError;
use crate::normalize::Submission;
use crate::registry::SessionRegistry;
use crate::slot::{EventSender, PlayerSlot, SlotId};

/// Labels streamed to clients during the pre-round countdown, in
/// firing order. The last one is followed by `roundStart` after a
/// short linger.
const COUNTDOWN_LABELS: [&str; 5] = ["Ready?", "3", "2", "1", "GO!"];

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Everything a session actor can be asked to do.
///
/// Player-originated variants come from the connection handler; the
/// `Deadline` variant comes from the session's own timer queue.
#[derive(Debug)]
pub enum SessionCommand {
    /// Seat a second player.
    Join {
        username: String,
        sender: EventSender,
        reply: oneshot::Sender<Result<SlotId, SessionError>>,
    },
    /// Client signalled it finished rendering the lobby. Kept for
    /// older clients; the server drives the countdown itself.
    Ready { slot: SlotId },
    /// A word for the current round.
    SubmitWord { slot: SlotId, word: String },
    /// A play-again answer after a won round.
    PlayAgain { slot: SlotId, choice: bool },
    /// Explicit leave or connection loss.
    Leave { slot: SlotId },
    /// A scheduled deadline fired. Ignored unless `generation` still
    /// matches the queue.
    Deadline { generation: u64, kind: DeadlineKind },
}

/// What a fired deadline means.
#[derive(Debug, Clone, Copy)]
pub enum DeadlineKind {
    /// Emit one countdown label.
    CountdownTick { label: &'static str },
    /// The countdown finished; open input.
    CountdownOver,
    /// The input window closed; resolve the round with whatever was
    /// submitted.
    InputExpired,
    /// Results were displayed long enough; start the next round.
    NextRound,
    /// Results were displayed long enough; ask about a rematch.
    PlayAgainOpen,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// A cheap, cloneable handle to a running session actor.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    code: GameCode,
    tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// The session's game code.
    pub fn code(&self) -> &GameCode {
        &self.code
    }

    /// Whether the actor has stopped. Registry entries for stopped
    /// actors are stale and treated as not found.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Seats a second player, waiting for the actor's verdict.
    pub async fn join(
        &self,
        username: String,
        sender: EventSender,
    ) -> Result<SlotId, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Join {
                username,
                sender,
                reply,
            })
            .map_err(|_| SessionError::Unavailable(self.code.clone()))?;
        rx.await
            .map_err(|_| SessionError::Unavailable(self.code.clone()))?
    }

    /// Fire-and-forget ready signal.
    pub fn ready(&self, slot: SlotId) {
        let _ = self.tx.send(SessionCommand::Ready { slot });
    }

    /// Fire-and-forget word submission.
    pub fn submit_word(&self, slot: SlotId, word: String) {
        let _ = self.tx.send(SessionCommand::SubmitWord { slot, word });
    }

    /// Fire-and-forget play-again answer.
    pub fn play_again(&self, slot: SlotId, choice: bool) {
        let _ = self.tx.send(SessionCommand::PlayAgain { slot, choice });
    }

    /// Fire-and-forget leave. Also used when a connection drops.
    pub fn leave(&self, slot: SlotId) {
        let _ = self.tx.send(SessionCommand::Leave { slot });
    }
}

/// Spawns a session actor for a freshly created game and returns its
/// handle. The creator is seated in slot A and receives `gameCreated`
/// as the actor's first act.
pub fn spawn_session(
    code: GameCode,
    config: GameConfig,
    registry: SessionRegistry,
    creator_name: String,
    creator_sender: EventSender,
) -> SessionHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = SessionHandle {
        code: code.clone(),
        tx: tx.clone(),
    };
    let actor = SessionActor::new(code, config, registry, creator_name, creator_sender, tx, rx);
    tokio::spawn(actor.run());
    handle
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct SessionActor {
    code: GameCode,
    config: GameConfig,
    phase: Phase,
    round: u32,
    slots: [Option<PlayerSlot>; 2],
    deadlines: DeadlineQueue<SessionCommand>,
    registry: SessionRegistry,
    rx: mpsc::UnboundedReceiver<SessionCommand>,
}

impl SessionActor {
    fn new(
        code: GameCode,
        config: GameConfig,
        registry: SessionRegistry,
        creator_name: String,
        creator_sender: EventSender,
        tx: mpsc::UnboundedSender<SessionCommand>,
        rx: mpsc::UnboundedReceiver<SessionCommand>,
    ) -> Self {
        let creator = PlayerSlot::new(creator_name, creator_sender);
        Self {
            code,
            config,
            phase: Phase::WaitingForOpponent,
            round: 1,
            slots: [Some(creator), None],
            deadlines: DeadlineQueue::new(tx),
            registry,
            rx,
        }
    }

    async fn run(mut self) {
        info!(code = %self.code, "session started");
        self.send_to(
            SlotId::A,
            ServerEvent::GameCreated {
                game_id: self.code.clone(),
            },
        );

        while let Some(command) = self.rx.recv().await {
            self.handle(command);
            if self.phase.is_terminal() {
                break;
            }
        }

        info!(code = %self.code, phase = %self.phase, "session stopped");
        self.registry.remove(&self.code).await;
    }

    fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Join {
                username,
                sender,
                reply,
            } => {
                let _ = reply.send(self.join(username, sender));
            }
            SessionCommand::Ready { slot } => {
                // The server paces the countdown itself; this is just
                // acknowledged for clients that still send it.
                debug!(code = %self.code, %slot, "ready signal (no-op)");
            }
            SessionCommand::SubmitWord { slot, word } => self.submit_word(slot, &word),
            SessionCommand::PlayAgain { slot, choice } => self.play_again(slot, choice),
            SessionCommand::Leave { slot } => self.leave(slot),
            SessionCommand::Deadline { generation, kind } => self.deadline(generation, kind),
        }
    }

    // -- joining ------------------------------------------------------------

    fn join(&mut self, username: String, sender: EventSender) -> Result<SlotId, SessionError> {
        if !self.phase.accepts_join() {
            return Err(SessionError::GameFull(self.code.clone()));
        }
        self.slots[SlotId::B.index()] = Some(PlayerSlot::new(username, sender));
        info!(code = %self.code, "second player joined");

        let (p1, p2) = self.names();
        self.broadcast(ServerEvent::PlayerJoined {
            player1: p1,
            player2: p2,
        });
        self.begin_countdown(Duration::ZERO);
        Ok(SlotId::B)
    }

    // -- countdown ----------------------------------------------------------

    /// Enters `Countdown` and schedules the label ticks plus the
    /// handoff into the input phase.
    fn begin_countdown(&mut self, initial_delay: Duration) {
        self.phase = Phase::Countdown;
        self.deadlines.invalidate();

        let interval = self.config.countdown_interval;
        for (i, label) in COUNTDOWN_LABELS.iter().enumerate() {
            self.deadlines
                .schedule(initial_delay + interval * i as u32, move |generation| {
                    SessionCommand::Deadline {
                        generation,
                        kind: DeadlineKind::CountdownTick { label },
                    }
                });
        }
        let over_at =
            initial_delay + interval * (COUNTDOWN_LABELS.len() - 1) as u32 + self.config.go_linger;
        self.deadlines.schedule(over_at, |generation| {
            SessionCommand::Deadline {
                generation,
                kind: DeadlineKind::CountdownOver,
            }
        });
        debug!(code = %self.code, round = self.round, "countdown scheduled");
    }

    // -- input --------------------------------------------------------------

    /// Enters `InputOpen`: clears submissions, announces the round,
    /// arms the input deadline.
    fn open_input(&mut self) {
        self.phase = Phase::InputOpen;
        self.deadlines.invalidate();
        for slot in self.slots.iter_mut().flatten() {
            slot.submission = None;
        }
        self.broadcast(ServerEvent::RoundStart {});
        self.deadlines
            .schedule(self.config.input_deadline, |generation| {
                SessionCommand::Deadline {
                    generation,
                    kind: DeadlineKind::InputExpired,
                }
            });
        info!(code = %self.code, round = self.round, "input open");
    }

    fn submit_word(&mut self, slot: SlotId, word: &str) {
        if self.phase != Phase::InputOpen {
            debug!(code = %self.code, %slot, phase = %self.phase, "word outside input window, ignored");
            return;
        }
        let Some(player) = self.slots[slot.index()].as_mut() else {
            return;
        };
        if player.submission.is_some() {
            // First submission wins; later ones are ignored.
            debug!(code = %self.code, %slot, "duplicate submission ignored");
            return;
        }
        player.submission = Some(Submission::new(word));

        if self.slots.iter().flatten().all(|s| s.submission.is_some()) {
            self.resolve();
        }
    }

    // -- resolution ---------------------------------------------------------

    /// Enters `Resolving`: fills missing submissions with the
    /// placeholder, scores, reveals, and schedules the next step.
    fn resolve(&mut self) {
        self.phase = Phase::Resolving;
        self.deadlines.invalidate();

        for slot in self.slots.iter_mut().flatten() {
            if slot.submission.is_none() {
                slot.submission = Some(Submission::placeholder());
            }
        }

        let sub_a = self.submission_of(SlotId::A);
        let sub_b = self.submission_of(SlotId::B);
        let is_match = sub_a.matches(&sub_b);
        if is_match {
            // Cooperative scoring: a match is a win for both.
            for slot in self.slots.iter_mut().flatten() {
                slot.score += 1;
            }
        }

        let (score_a, score_b) = self.scores();
        info!(code = %self.code, round = self.round, is_match, "round resolved");
        self.broadcast(ServerEvent::RoundResults {
            player1_word: sub_a.raw,
            player2_word: sub_b.raw,
            is_match,
            player1_score: score_a,
            player2_score: score_b,
        });

        let kind = if is_match {
            DeadlineKind::PlayAgainOpen
        } else {
            DeadlineKind::NextRound
        };
        self.deadlines.schedule(self.config.results_delay, move |generation| {
            SessionCommand::Deadline { generation, kind }
        });
    }

    // -- play again ---------------------------------------------------------

    fn play_again(&mut self, slot: SlotId, choice: bool) {
        if self.phase != Phase::PlayAgainPending {
            debug!(code = %self.code, %slot, phase = %self.phase, "play-again outside prompt, ignored");
            return;
        }
        let Some(player) = self.slots[slot.index()].as_mut() else {
            return;
        };
        if player.play_again.is_some() {
            return;
        }
        player.play_again = Some(choice);

        if !choice {
            self.broadcast(ServerEvent::GameEnded {
                message: "Game ended - a player chose not to continue".to_string(),
            });
            self.phase = Phase::Terminated;
            self.deadlines.invalidate();
            return;
        }

        match self.play_again_of(slot.other()) {
            None => {
                // Tell whoever has not answered that their partner is
                // waiting on them.
                self.send_to(slot.other(), ServerEvent::WaitingForOtherPlayer {});
            }
            Some(true) => self.restart_game(),
            // Some(false) cannot be reached: a decline terminates the
            // session immediately above.
            Some(false) => {}
        }
    }

    /// Both players said yes: reset scores and rounds and count down
    /// into a fresh game.
    fn restart_game(&mut self) {
        self.round = 1;
        for slot in self.slots.iter_mut().flatten() {
            slot.reset_for_new_game();
        }
        self.broadcast(ServerEvent::NewGameStarting {
            player1_score: 0,
            player2_score: 0,
        });
        info!(code = %self.code, "rematch starting");
        self.begin_countdown(self.config.restart_delay);
    }

    // -- leaving ------------------------------------------------------------

    fn leave(&mut self, slot: SlotId) {
        if self.phase.is_terminal() {
            return;
        }
        info!(code = %self.code, %slot, "player left");
        self.slots[slot.index()] = None;
        if self.slots[slot.other().index()].is_some() {
            self.send_to(slot.other(), ServerEvent::PlayerDisconnected {});
        }
        self.phase = Phase::Abandoned;
        self.deadlines.invalidate();
    }

    // -- deadlines ----------------------------------------------------------

    fn deadline(&mut self, generation: u64, kind: DeadlineKind) {
        if !self.deadlines.is_current(generation) {
            debug!(code = %self.code, ?kind, "stale deadline dropped");
            return;
        }
        match kind {
            DeadlineKind::CountdownTick { label } => {
                self.broadcast(ServerEvent::Countdown {
                    count: label.to_string(),
                });
            }
            DeadlineKind::CountdownOver => self.open_input(),
            DeadlineKind::InputExpired => {
                info!(code = %self.code, round = self.round, "input window expired");
                self.resolve();
            }
            DeadlineKind::NextRound => {
                self.round += 1;
                self.begin_countdown(Duration::ZERO);
            }
            DeadlineKind::PlayAgainOpen => {
                self.phase = Phase::PlayAgainPending;
                self.deadlines.invalidate();
            }
        }
    }

    // -- helpers ------------------------------------------------------------

    fn broadcast(&self, event: ServerEvent) {
        for slot in self.slots.iter().flatten() {
            slot.send(event.clone());
        }
    }

    fn send_to(&self, slot: SlotId, event: ServerEvent) {
        if let Some(player) = &self.slots[slot.index()] {
            player.send(event);
        } else {
            warn!(code = %self.code, %slot, "send to empty slot");
        }
    }

    fn names(&self) -> (String, String) {
        let name = |id: SlotId| {
            self.slots[id.index()]
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_default()
        };
        (name(SlotId::A), name(SlotId::B))
    }

    fn scores(&self) -> (u32, u32) {
        let score = |id: SlotId| self.slots[id.index()].as_ref().map_or(0, |s| s.score);
        (score(SlotId::A), score(SlotId::B))
    }

    /// The slot's submission, or the placeholder if the slot is empty.
    /// Only meaningful during resolution, after placeholders are
    /// filled in.
    fn submission_of(&self, id: SlotId) -> Submission {
        self.slots[id.index()]
            .as_ref()
            .and_then(|s| s.submission.clone())
            .unwrap_or_else(Submission::placeholder)
    }

    fn play_again_of(&self, id: SlotId) -> Option<bool> {
        self.slots[id.index()].as_ref().and_then(|s| s.play_again)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn test_config() -> GameConfig {
        GameConfig {
            countdown_interval: Duration::from_millis(10),
            go_linger: Duration::from_millis(5),
            input_deadline: Duration::from_millis(50),
            results_delay: Duration::from_millis(20),
            restart_delay: Duration::from_millis(10),
            code_length: 6,
        }
    }

    /// Builds an actor with both slots seated, skipping the countdown,
    /// so tests can drive handlers directly.
    fn seated_actor() -> (
        SessionActor,
        UnboundedReceiver<ServerEvent>,
        UnboundedReceiver<ServerEvent>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (tx_a, rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();
        let registry = SessionRegistry::new();
        let mut actor = SessionActor::new(
            GameCode::new("ABC123"),
            test_config(),
            registry,
            "alice".into(),
            tx_a,
            cmd_tx,
            cmd_rx,
        );
        actor.slots[SlotId::B.index()] = Some(PlayerSlot::new("bob".into(), tx_b));
        actor.phase = Phase::InputOpen;
        (actor, rx_a, rx_b)
    }

    fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn test_matching_words_score_both_players() {
        let (mut actor, mut rx_a, mut rx_b) = seated_actor();

        actor.submit_word(SlotId::A, "cat");
        actor.submit_word(SlotId::B, "  CAT ");

        assert_eq!(actor.phase, Phase::Resolving);
        let events = drain(&mut rx_a);
        let results = events
            .iter()
            .find_map(|e| match e {
                ServerEvent::RoundResults {
                    is_match,
                    player1_score,
                    player2_score,
                    ..
                } => Some((*is_match, *player1_score, *player2_score)),
                _ => None,
            })
            .expect("results sent");
        assert_eq!(results, (true, 1, 1));
        assert!(drain(&mut rx_b)
            .iter()
            .any(|e| matches!(e, ServerEvent::RoundResults { .. })));
    }

    #[tokio::test]
    async fn test_first_submission_wins() {
        let (mut actor, _rx_a, mut rx_b) = seated_actor();

        actor.submit_word(SlotId::A, "cat");
        actor.submit_word(SlotId::A, "dog");
        actor.submit_word(SlotId::B, "cat");

        let results = drain(&mut rx_b)
            .into_iter()
            .find_map(|e| match e {
                ServerEvent::RoundResults {
                    player1_word,
                    is_match,
                    ..
                } => Some((player1_word, is_match)),
                _ => None,
            })
            .expect("results sent");
        assert_eq!(results, ("cat".to_string(), true));
    }

    #[tokio::test]
    async fn test_deadline_resolution_uses_placeholder() {
        let (mut actor, mut rx_a, _rx_b) = seated_actor();

        actor.submit_word(SlotId::A, "cat");
        // Simulate the input deadline firing for the current generation.
        let generation = actor.deadlines.generation();
        actor.deadline(generation, DeadlineKind::InputExpired);

        let results = drain(&mut rx_a)
            .into_iter()
            .find_map(|e| match e {
                ServerEvent::RoundResults {
                    player2_word,
                    is_match,
                    player1_score,
                    ..
                } => Some((player2_word, is_match, player1_score)),
                _ => None,
            })
            .expect("results sent");
        assert_eq!(results, ("".to_string(), false, 0));
        assert_eq!(actor.phase, Phase::Resolving);
    }

    #[tokio::test]
    async fn test_stale_deadline_is_ignored() {
        let (mut actor, mut rx_a, _rx_b) = seated_actor();

        let stale = actor.deadlines.generation();
        actor.deadlines.invalidate();
        actor.deadline(stale, DeadlineKind::InputExpired);

        assert_eq!(actor.phase, Phase::InputOpen);
        assert!(drain(&mut rx_a).is_empty());
    }

    #[tokio::test]
    async fn test_word_outside_input_window_is_ignored() {
        let (mut actor, mut rx_a, _rx_b) = seated_actor();
        actor.phase = Phase::Countdown;

        actor.submit_word(SlotId::A, "early");

        assert!(actor.slots[0].as_ref().unwrap().submission.is_none());
        assert!(drain(&mut rx_a).is_empty());
    }

    #[tokio::test]
    async fn test_no_match_advances_to_next_round() {
        let (mut actor, mut rx_a, _rx_b) = seated_actor();

        actor.submit_word(SlotId::A, "cat");
        actor.submit_word(SlotId::B, "dog");
        assert_eq!(actor.phase, Phase::Resolving);

        let generation = actor.deadlines.generation();
        actor.deadline(generation, DeadlineKind::NextRound);

        assert_eq!(actor.round, 2);
        assert_eq!(actor.phase, Phase::Countdown);
        drain(&mut rx_a);
    }

    #[tokio::test]
    async fn test_first_play_again_yes_prompts_the_other_player() {
        let (mut actor, mut rx_a, mut rx_b) = seated_actor();
        actor.phase = Phase::PlayAgainPending;

        actor.play_again(SlotId::A, true);

        // The waiting notice goes to the player who has not answered.
        assert!(drain(&mut rx_b)
            .iter()
            .any(|e| matches!(e, ServerEvent::WaitingForOtherPlayer {})));
        assert!(drain(&mut rx_a).is_empty());
        assert_eq!(actor.phase, Phase::PlayAgainPending);
    }

    #[tokio::test]
    async fn test_both_yes_resets_scores_and_restarts() {
        let (mut actor, mut rx_a, _rx_b) = seated_actor();
        actor.phase = Phase::PlayAgainPending;
        for slot in actor.slots.iter_mut().flatten() {
            slot.score = 2;
        }

        actor.play_again(SlotId::A, true);
        actor.play_again(SlotId::B, true);

        assert_eq!(actor.phase, Phase::Countdown);
        assert_eq!(actor.round, 1);
        assert_eq!(actor.scores(), (0, 0));
        let events = drain(&mut rx_a);
        assert!(events.iter().any(|e| matches!(
            e,
            ServerEvent::NewGameStarting {
                player1_score: 0,
                player2_score: 0,
            }
        )));
    }

    #[tokio::test]
    async fn test_any_no_terminates_the_session() {
        let (mut actor, mut rx_a, mut rx_b) = seated_actor();
        actor.phase = Phase::PlayAgainPending;

        actor.play_again(SlotId::A, true);
        actor.play_again(SlotId::B, false);

        assert_eq!(actor.phase, Phase::Terminated);
        for rx in [&mut rx_a, &mut rx_b] {
            assert!(drain(rx).iter().any(|e| matches!(
                e,
                ServerEvent::GameEnded { message }
                    if message == "Game ended - a player chose not to continue"
            )));
        }
    }

    #[tokio::test]
    async fn test_leave_notifies_partner_and_abandons() {
        let (mut actor, _rx_a, mut rx_b) = seated_actor();

        actor.leave(SlotId::A);

        assert_eq!(actor.phase, Phase::Abandoned);
        assert!(drain(&mut rx_b)
            .iter()
            .any(|e| matches!(e, ServerEvent::PlayerDisconnected {})));
    }

    #[tokio::test]
    async fn test_join_after_both_seated_is_full() {
        let (mut actor, _rx_a, _rx_b) = seated_actor();
        let (tx_c, _rx_c) = mpsc::unbounded_channel();

        let result = actor.join("carol".into(), tx_c);

        assert!(matches!(result, Err(SessionError::GameFull(_))));
    }

    #[tokio::test]
    async fn test_join_announces_both_usernames() {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let mut actor = SessionActor::new(
            GameCode::new("ABC123"),
            test_config(),
            SessionRegistry::new(),
            "alice".into(),
            tx_a,
            cmd_tx,
            cmd_rx,
        );
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();

        let slot = actor.join("bob".into(), tx_b).expect("join accepted");

        assert_eq!(slot, SlotId::B);
        assert_eq!(actor.phase, Phase::Countdown);
        for rx in [&mut rx_a, &mut rx_b] {
            assert!(drain(rx).iter().any(|e| matches!(
                e,
                ServerEvent::PlayerJoined { player1, player2 }
                    if player1 == "alice" && player2 == "bob"
            )));
        }
    }
}
