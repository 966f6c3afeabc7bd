use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::kill_switch::KillSwitch;
use crate::mailbox::Mailbox;
use crate::{Actor, ActorExitStatus};

/// Coarse health classification used by supervisors (§4.6's Coordinator
/// watching its Fetchers, for instance).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Health {
    /// Still running, no observed failure.
    Healthy,
    /// Exited because of an error or was killed.
    FailureOrUnhealthy,
    /// Exited cleanly.
    Success,
}

/// Anything a supervisor can poll for liveness without owning the actor's
/// concrete type.
pub trait Supervisable {
    fn name(&self) -> &str;
    fn health(&self) -> Health;
}

/// A handle to a spawned actor: its mailbox, its last observed state, and
/// its terminal status once it has exited.
pub struct ActorHandle<A: Actor> {
    pub(crate) name: String,
    pub(crate) mailbox: Mailbox<A>,
    pub(crate) kill_switch: KillSwitch,
    pub(crate) state_rx: watch::Receiver<A::ObservableState>,
    pub(crate) exit_status: Arc<Mutex<Option<ActorExitStatus>>>,
    pub(crate) join_handle: JoinHandle<ActorExitStatus>,
}

impl<A: Actor> ActorHandle<A> {
    pub fn mailbox(&self) -> &Mailbox<A> {
        &self.mailbox
    }

    /// The most recent `observable_state()` snapshot pushed by the dispatch
    /// loop after each processed message.
    pub fn last_observation(&self) -> A::ObservableState {
        self.state_rx.borrow().clone()
    }

    pub fn exit_status(&self) -> Option<ActorExitStatus> {
        self.exit_status.lock().unwrap().clone()
    }

    /// Kill the actor and wait for its dispatch loop to finish draining.
    pub async fn quit(self) -> ActorExitStatus {
        self.kill_switch.kill();
        self.join().await
    }

    pub async fn join(self) -> ActorExitStatus {
        self.join_handle
            .await
            .unwrap_or(ActorExitStatus::Panicked)
    }
}

impl<A: Actor> Supervisable for ActorHandle<A> {
    fn name(&self) -> &str {
        &self.name
    }

    fn health(&self) -> Health {
        match self.exit_status() {
            None => Health::Healthy,
            Some(status) if status.is_success() => Health::Success,
            Some(_) => Health::FailureOrUnhealthy,
        }
    }
}
