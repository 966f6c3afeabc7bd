use async_trait::async_trait;
use tokio::runtime::Handle;

use crate::exit_status::ActorExitStatus;
use crate::ActorContext;

/// Number of messages a mailbox can hold before `send_message` starts
/// suspending the sender.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueueCapacity {
    Bounded(usize),
    Unbounded,
}

/// A unit encapsulating private state plus a single-consumer mailbox.
///
/// The dispatcher reads one message at a time and invokes the matching
/// [`Handler`](crate::Handler) impl; handlers run to completion before the
/// next message begins (§4.1). Actors never share mutable state directly;
/// all coordination flows through messages.
#[async_trait]
pub trait Actor: Sized + Send + 'static {
    /// A cheap snapshot of the actor's state, exposed through `ActorHandle`.
    type ObservableState: Send + Sync + Clone + 'static;

    fn observable_state(&self) -> Self::ObservableState;

    /// Human-readable actor name, used in logs and `Supervisable::name`.
    fn name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    /// Mailbox capacity. Defaults to unbounded; actors that must apply
    /// backpressure on their senders (e.g. to bound memory) override this.
    fn queue_capacity(&self) -> QueueCapacity {
        QueueCapacity::Unbounded
    }

    /// The tokio runtime this actor's dispatch loop is spawned onto.
    fn runtime_handle(&self) -> Handle {
        Handle::current()
    }

    /// Whether the dispatcher yields back to the scheduler after every
    /// message. Actors with tight hot loops (e.g. `SourceActor`-style
    /// pollers) may turn this off; most actors leave it on.
    fn yield_after_each_message(&self) -> bool {
        true
    }

    /// Called once before the first message is processed.
    async fn initialize(&mut self, _ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus> {
        Ok(())
    }

    /// Called exactly once after the dispatch loop exits, successfully or
    /// not.
    async fn finalize(
        &mut self,
        _exit_status: &ActorExitStatus,
        _ctx: &ActorContext<Self>,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}
