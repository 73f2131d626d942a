//! The session registry: live games keyed by their codes.

use std::collections::HashMap;
use std::sync::Arc;

use mindmeld_protocol::GameCode;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::error::SessionError;
use crate::session::{spawn_session, SessionHandle};
use crate::slot::EventSender;

/// Alphabet for generated game codes. Uppercase letters and digits,
/// minus the lookalikes (I, L, O, 0, 1) people misread over a shoulder.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Shared map of live sessions.
///
/// Cloning is cheap; every connection handler holds one. Sessions
/// remove themselves when their actor stops, so a code is free for
/// reuse the moment its game ends.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    games: Arc<Mutex<HashMap<GameCode, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new game: picks an unused code, spawns its actor
    /// with the creator in slot A, and registers the handle.
    pub async fn create(
        &self,
        config: GameConfig,
        creator_name: String,
        creator_sender: EventSender,
    ) -> SessionHandle {
        let mut games = self.games.lock().await;
        let code = loop {
            let candidate = generate_code(config.code_length);
            if !games.contains_key(&candidate) {
                break candidate;
            }
            debug!(code = %candidate, "code collision, regenerating");
        };
        let handle = spawn_session(
            code.clone(),
            config,
            self.clone(),
            creator_name,
            creator_sender,
        );
        games.insert(code.clone(), handle.clone());
        info!(code = %code, active = games.len(), "game registered");
        handle
    }

    /// Looks up a live session. A registered handle whose actor has
    /// already stopped counts as not found and is evicted on the spot.
    pub async fn lookup(&self, code: &GameCode) -> Result<SessionHandle, SessionError> {
        let mut games = self.games.lock().await;
        match games.get(code) {
            Some(handle) if !handle.is_closed() => Ok(handle.clone()),
            Some(_) => {
                games.remove(code);
                Err(SessionError::NotFound(code.clone()))
            }
            None => Err(SessionError::NotFound(code.clone())),
        }
    }

    /// Frees a code. Called by the session actor as its last act.
    pub async fn remove(&self, code: &GameCode) {
        let mut games = self.games.lock().await;
        if games.remove(code).is_some() {
            info!(code = %code, active = games.len(), "game code freed");
        }
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.games.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.games.lock().await.is_empty()
    }
}

fn generate_code(length: usize) -> GameCode {
    let mut rng = rand::rng();
    let raw: String = (0..length)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    GameCode::new(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_generated_codes_use_the_alphabet() {
        for _ in 0..50 {
            let code = generate_code(6);
            assert_eq!(code.as_str().len(), 6);
            for b in code.as_str().bytes() {
                assert!(
                    CODE_ALPHABET.contains(&b),
                    "unexpected byte {b} in {code}"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_create_registers_and_lookup_finds() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let handle = registry
            .create(GameConfig::default(), "alice".into(), tx)
            .await;

        assert_eq!(registry.len().await, 1);
        let found = registry.lookup(handle.code()).await.expect("registered");
        assert_eq!(found.code(), handle.code());
    }

    #[tokio::test]
    async fn test_lookup_unknown_code_is_not_found() {
        let registry = SessionRegistry::new();
        let missing = GameCode::new("ZZZZZZ");

        let result = registry.lookup(&missing).await;

        assert!(matches!(result, Err(SessionError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_frees_the_code() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = registry
            .create(GameConfig::default(), "alice".into(), tx)
            .await;

        registry.remove(handle.code()).await;

        assert!(registry.is_empty().await);
        assert!(registry.lookup(handle.code()).await.is_err());
    }
}
