//! Fixed-tick driver shared by every session actor.

use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};

use crate::{Checkpoint, Lifeline, Signal};

/// Whether an actor wants further ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActorStatus {
    /// Keep ticking.
    Active,
    /// The actor is done; its task ends.
    Finished,
}

/// Synchronous per-tick behaviour of a concurrent entity.
pub trait Actor {
    /// Advances the actor by `dt` of simulated time.
    fn step(&mut self, dt: Duration) -> ActorStatus;
}

/// Runs `actor` on a fixed tick until it finishes, its lifeline is retired
/// or the session terminates.
///
/// Each tick advances the actor by exactly `tick`, regardless of wall-clock
/// jitter, and a paused session freezes the actor between ticks.
pub async fn drive<A: Actor>(mut actor: A, mut signal: Signal, lifeline: Lifeline, tick: Duration) {
    let mut ticker = time::interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        let _ = ticker.tick().await;
        match signal.checkpoint(&lifeline).await {
            Checkpoint::Exit => break,
            Checkpoint::Resumed => {
                ticker.reset();
                continue;
            }
            Checkpoint::Proceed => {}
        }
        if actor.step(tick) == ActorStatus::Finished {
            break;
        }
    }
}
