use std::sync::Arc;

/// The terminal state of an actor's dispatch loop.
///
/// An actor always ends in exactly one of these states; `finalize` is called
/// with the value before the actor's task returns.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ActorExitStatus {
    /// The actor's mailbox was drained and no more senders hold a clone of it.
    #[error("success")]
    Success,
    /// The actor asked to quit on its own (e.g. a source reached its end).
    #[error("quit")]
    Quit,
    /// A downstream mailbox the actor was sending into was closed.
    #[error("downstream actor closed its mailbox")]
    DownstreamClosed,
    /// The actor was killed through its `KillSwitch`.
    #[error("killed")]
    Killed,
    /// A handler returned an unrecoverable error.
    #[error("failure: {0}")]
    Failure(Arc<anyhow::Error>),
    /// A handler panicked.
    #[error("panicked")]
    Panicked,
}

impl ActorExitStatus {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ActorExitStatus::Success | ActorExitStatus::Quit | ActorExitStatus::DownstreamClosed
        )
    }

    pub fn from_anyhow(err: anyhow::Error) -> Self {
        ActorExitStatus::Failure(Arc::new(err))
    }
}

impl From<anyhow::Error> for ActorExitStatus {
    fn from(err: anyhow::Error) -> Self {
        ActorExitStatus::Failure(Arc::new(err))
    }
}
