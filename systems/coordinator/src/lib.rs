#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session-wide run state shared by every concurrent actor.
//!
//! A [`Coordinator`] owns the single authoritative [`RunState`]. Actors hold a
//! [`Signal`] subscribed to it and call [`Signal::checkpoint`] once per tick:
//! a running session lets them proceed, a paused one parks them without
//! spinning until the state changes, and a terminated one tells them to
//! exit. Individual actors can additionally be retired through their
//! [`Lifeline`] without disturbing anybody else. [`drive`] wraps that
//! protocol around any [`Actor`] on a fixed tick.

mod actor;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::watch;
use tracing::debug;

pub use actor::{drive, Actor, ActorStatus};

/// Lifecycle state broadcast to every actor of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Actors advance their timers and act.
    Running,
    /// Actors are parked; timers and cooldowns are frozen.
    Paused,
    /// The session is over and actors must exit.
    Terminated,
}

/// Verdict returned by [`Signal::checkpoint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Checkpoint {
    /// The session is running; perform the next step.
    Proceed,
    /// The actor was parked by a pause and has just been released.
    ///
    /// Callers should restart their tick timer rather than replaying the
    /// paused interval.
    Resumed,
    /// The actor must stop.
    Exit,
}

/// Owner of the run state for one session.
#[derive(Debug)]
pub struct Coordinator {
    state: watch::Sender<RunState>,
}

impl Coordinator {
    /// Creates a coordinator in the [`RunState::Running`] state.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(RunState::Running);
        Self { state }
    }

    /// Subscribes a new actor to the run state.
    #[must_use]
    pub fn signal(&self) -> Signal {
        Signal {
            state: self.state.subscribe(),
        }
    }

    /// Current run state.
    #[must_use]
    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Reports whether the session is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state() == RunState::Paused
    }

    /// Reports whether the session has been terminated.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.state() == RunState::Terminated
    }

    /// Moves a running session into the paused state.
    ///
    /// Returns `false` when the session was not running, in which case
    /// nothing changes.
    pub fn pause(&self) -> bool {
        let changed = self.transition(RunState::Running, RunState::Paused);
        if changed {
            debug!("session paused");
        }
        changed
    }

    /// Releases a paused session.
    ///
    /// Returns `false` when the session was not paused.
    pub fn resume(&self) -> bool {
        let changed = self.transition(RunState::Paused, RunState::Running);
        if changed {
            debug!("session resumed");
        }
        changed
    }

    /// Terminates the session. Termination cannot be undone.
    ///
    /// Returns `false` when the session had already been terminated.
    pub fn terminate(&self) -> bool {
        let changed = self.state.send_if_modified(|state| {
            if *state == RunState::Terminated {
                return false;
            }
            *state = RunState::Terminated;
            true
        });
        if changed {
            debug!("session terminated");
        }
        changed
    }

    fn transition(&self, from: RunState, to: RunState) -> bool {
        self.state.send_if_modified(|state| {
            if *state != from {
                return false;
            }
            *state = to;
            true
        })
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Actor-side subscription to the session run state.
#[derive(Clone, Debug)]
pub struct Signal {
    state: watch::Receiver<RunState>,
}

impl Signal {
    /// Decides whether the actor owning `lifeline` may take its next step.
    ///
    /// Paused sessions park the caller until the coordinator publishes a
    /// new state. A dropped coordinator counts as termination.
    pub async fn checkpoint(&mut self, lifeline: &Lifeline) -> Checkpoint {
        let mut parked = false;
        loop {
            if lifeline.is_retired() {
                return Checkpoint::Exit;
            }
            let state = *self.state.borrow_and_update();
            match state {
                RunState::Running if parked => return Checkpoint::Resumed,
                RunState::Running => return Checkpoint::Proceed,
                RunState::Terminated => return Checkpoint::Exit,
                RunState::Paused => {
                    parked = true;
                    if self.state.changed().await.is_err() {
                        return Checkpoint::Exit;
                    }
                }
            }
        }
    }
}

/// Per-actor retirement flag.
///
/// Clones share the flag, so the record that owns an actor can retire it
/// while the actor task observes the change at its next checkpoint.
#[derive(Clone, Debug, Default)]
pub struct Lifeline {
    retired: Arc<AtomicBool>,
}

impl Lifeline {
    /// Creates a lifeline for a live actor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Retires the actor. Returns `true` only for the call that retired it.
    pub fn retire(&self) -> bool {
        !self.retired.swap(true, Ordering::AcqRel)
    }

    /// Reports whether the actor has been retired.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifeline_retires_once_across_clones() {
        let lifeline = Lifeline::new();
        let shared = lifeline.clone();
        assert!(!shared.is_retired());
        assert!(lifeline.retire());
        assert!(!shared.retire());
        assert!(shared.is_retired());
    }

    #[test]
    fn transitions_only_fire_from_expected_state() {
        let coordinator = Coordinator::new();
        assert!(!coordinator.resume());
        assert!(coordinator.pause());
        assert!(!coordinator.pause());
        assert!(coordinator.is_paused());
        assert!(coordinator.resume());
        assert!(!coordinator.resume());
        assert_eq!(coordinator.state(), RunState::Running);
    }

    #[test]
    fn termination_is_final() {
        let coordinator = Coordinator::new();
        assert!(coordinator.pause());
        assert!(coordinator.terminate());
        assert!(!coordinator.terminate());
        assert!(!coordinator.resume());
        assert!(!coordinator.pause());
        assert!(coordinator.is_terminated());
    }
}
