//! Deadline scheduling for Mindmeld session actors.
//!
//! A session actor owns a single serialized command queue; player
//! messages and timer firings both arrive through it, so the state
//! machine never sees two events interleave. [`DeadlineQueue`] is the
//! timer half of that contract: it schedules one-shot events into the
//! owner's channel and stamps each with the *generation* current at
//! scheduling time.
//!
//! The generation is the cancellation mechanism. Timer tasks are never
//! aborted; instead the owner calls [`DeadlineQueue::invalidate`] on
//! every state transition, and a firing whose stamp no longer matches
//! is a benign no-op. This closes the race where an input deadline
//! fires one tick after both submissions already resolved the round:
//! whichever event is admitted to the queue first wins, and the
//! loser's firing fails the [`DeadlineQueue::is_current`] check.
//!
//! # Integration
//!
//! ```ignore
//! enum Command { Submit(Word), Deadline { generation: u64, kind: Kind } }
//!
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! let mut deadlines = DeadlineQueue::new(tx.clone());
//! deadlines.schedule(Duration::from_secs(5), |generation| Command::Deadline {
//!     generation,
//!     kind: Kind::InputExpired,
//! });
//! // ... later, in the actor loop:
//! // Command::Deadline { generation, .. } if !deadlines.is_current(generation)
//! //     => stale, ignore
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::trace;

/// Schedules generation-stamped one-shot events into an owner's
/// command channel.
///
/// One `DeadlineQueue` per session actor. Not `Clone`: only the owning
/// actor may invalidate or schedule, which is what makes the
/// generation check race-free.
pub struct DeadlineQueue<E> {
    tx: mpsc::UnboundedSender<E>,
    generation: u64,
}

impl<E: Send + 'static> DeadlineQueue<E> {
    /// Creates a queue that delivers into `tx`.
    ///
    /// The sender should be a clone of the owner's own command-channel
    /// sender, so deadline events and external commands share one
    /// serialized queue.
    pub fn new(tx: mpsc::UnboundedSender<E>) -> Self {
        Self { tx, generation: 0 }
    }

    /// The current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Invalidates every deadline scheduled so far.
    ///
    /// Call on each state transition. In-flight firings still arrive
    /// in the channel but carry a stale stamp.
    pub fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        trace!(generation = self.generation, "deadlines invalidated");
    }

    /// Whether a firing stamped with `generation` is still live.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Schedules an event to fire after `after`.
    ///
    /// `make` receives the generation current right now and builds the
    /// event to deliver; the event should carry that stamp so the
    /// owner can check [`is_current`](Self::is_current) on receipt.
    /// If the owner's channel is gone by firing time (actor stopped),
    /// the event is silently dropped.
    pub fn schedule<F>(&self, after: Duration, make: F)
    where
        F: FnOnce(u64) -> E + Send + 'static,
    {
        let tx = self.tx.clone();
        let generation = self.generation;
        trace!(generation, delay_ms = after.as_millis() as u64, "deadline scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(make(generation));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Fired {
        generation: u64,
        tag: &'static str,
    }

    fn queue() -> (DeadlineQueue<Fired>, mpsc::UnboundedReceiver<Fired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (DeadlineQueue::new(tx), rx)
    }

    #[test]
    fn test_invalidate_bumps_generation() {
        let (mut q, _rx) = queue();
        assert_eq!(q.generation(), 0);
        q.invalidate();
        assert_eq!(q.generation(), 1);
        assert!(q.is_current(1));
        assert!(!q.is_current(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_event_fires_with_current_stamp() {
        let (q, mut rx) = queue();
        q.schedule(Duration::from_secs(5), |generation| Fired {
            generation,
            tag: "input",
        });

        let fired = rx.recv().await.expect("event should fire");
        assert_eq!(fired.tag, "input");
        assert!(q.is_current(fired.generation));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidated_firing_is_stale() {
        let (mut q, mut rx) = queue();
        q.schedule(Duration::from_secs(5), |generation| Fired {
            generation,
            tag: "stale",
        });

        // Owner transitions state before the deadline fires.
        q.invalidate();

        let fired = rx.recv().await.expect("event still arrives");
        assert!(
            !q.is_current(fired.generation),
            "a firing scheduled before invalidate must be stale"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadlines_fire_in_delay_order() {
        let (q, mut rx) = queue();
        q.schedule(Duration::from_secs(3), |generation| Fired {
            generation,
            tag: "third",
        });
        q.schedule(Duration::from_secs(1), |generation| Fired {
            generation,
            tag: "first",
        });
        q.schedule(Duration::from_secs(2), |generation| Fired {
            generation,
            tag: "second",
        });

        assert_eq!(rx.recv().await.unwrap().tag, "first");
        assert_eq!(rx.recv().await.unwrap().tag, "second");
        assert_eq!(rx.recv().await.unwrap().tag, "third");
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_after_invalidate_is_live() {
        let (mut q, mut rx) = queue();
        q.invalidate();
        q.schedule(Duration::from_millis(100), |generation| Fired {
            generation,
            tag: "fresh",
        });

        let fired = rx.recv().await.unwrap();
        assert!(q.is_current(fired.generation));
    }

    #[tokio::test(start_paused = true)]
    async fn test_firing_into_dropped_channel_is_silent() {
        let (q, rx) = queue();
        q.schedule(Duration::from_millis(10), |generation| Fired {
            generation,
            tag: "dropped",
        });
        drop(rx);
        // Nothing to assert beyond "no panic": the send result is
        // discarded when the owner is gone.
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
