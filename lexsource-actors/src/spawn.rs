use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info_span, Instrument};

use crate::context::ActorContext;
use crate::kill_switch::KillSwitch;
use crate::mailbox::{create_mailbox, Inbox, Mailbox};
use crate::{Actor, ActorExitStatus, ActorHandle};

/// How long the dispatch loop keeps draining its mailbox after the kill
/// switch has been triggered, before giving up on in-flight `ask`s (§4.1
/// Lifecycle: "drain pending messages up to a deadline").
pub const STOP_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Builder returned by `ActorContext::spawn_actor` / the free `spawn_actor`
/// function: `spawn_actor(x).set_kill_switch(..).spawn()`.
pub struct SpawnBuilder<A: Actor> {
    actor: A,
    kill_switch: KillSwitch,
    mailboxes: Option<(Mailbox<A>, Inbox<A>)>,
}

impl<A: Actor> SpawnBuilder<A> {
    pub fn new(actor: A) -> Self {
        SpawnBuilder {
            actor,
            kill_switch: KillSwitch::default(),
            mailboxes: None,
        }
    }

    pub fn set_kill_switch(mut self, kill_switch: KillSwitch) -> Self {
        self.kill_switch = kill_switch;
        self
    }

    /// Use a pre-created mailbox/inbox pair instead of minting a fresh one.
    /// Useful when another actor already holds a clone of this actor's
    /// `Mailbox` before it is spawned (e.g. the Coordinator wiring up
    /// Fetchers that reference each other).
    pub fn set_mailboxes(mut self, mailbox: Mailbox<A>, inbox: Inbox<A>) -> Self {
        self.mailboxes = Some((mailbox, inbox));
        self
    }

    pub fn spawn(self) -> (Mailbox<A>, ActorHandle<A>) {
        let (mailbox, inbox) = self
            .mailboxes
            .unwrap_or_else(|| create_mailbox(self.actor.name(), self.actor.queue_capacity()));
        let handle = spawn_actor_loop(self.actor, mailbox.clone(), inbox, self.kill_switch);
        (mailbox, handle)
    }
}

/// Spawn a top-level actor with a fresh kill switch (no parent context).
pub fn spawn_actor<A: Actor>(actor: A) -> SpawnBuilder<A> {
    SpawnBuilder::new(actor)
}

fn spawn_actor_loop<A: Actor>(
    mut actor: A,
    mailbox: Mailbox<A>,
    inbox: Inbox<A>,
    kill_switch: KillSwitch,
) -> ActorHandle<A> {
    let name = actor.name();
    let runtime_handle = actor.runtime_handle();
    let (state_tx, state_rx) = watch::channel(actor.observable_state());
    let exit_status: Arc<Mutex<Option<ActorExitStatus>>> = Arc::new(Mutex::new(None));
    let exit_status_writer = exit_status.clone();
    let ctx = ActorContext::new(mailbox.clone(), kill_switch.clone());
    let span = info_span!("actor", name = %name);

    let join_handle = runtime_handle.spawn(
        async move {
            let final_status = run_dispatch_loop(&mut actor, &ctx, inbox, &state_tx).await;
            if let Err(err) = actor.finalize(&final_status, &ctx).await {
                error!(actor = %actor.name(), error = %err, "actor finalize returned an error");
            }
            *exit_status_writer.lock().unwrap() = Some(final_status.clone());
            final_status
        }
        .instrument(span),
    );

    ActorHandle {
        name,
        mailbox,
        kill_switch,
        state_rx,
        exit_status,
        join_handle,
    }
}

async fn run_dispatch_loop<A: Actor>(
    actor: &mut A,
    ctx: &ActorContext<A>,
    inbox: Inbox<A>,
    state_tx: &watch::Sender<A::ObservableState>,
) -> ActorExitStatus {
    if let Err(exit_status) = actor.initialize(ctx).await {
        debug!(actor = %actor.name(), status = %exit_status, "actor exited during initialize");
        return exit_status;
    }
    let _ = state_tx.send(actor.observable_state());

    loop {
        let envelope = if ctx.kill_switch().is_dead() {
            match tokio::time::timeout(STOP_GRACE_PERIOD, inbox.receiver.recv_async()).await {
                Ok(Ok(envelope)) => envelope,
                _ => return ActorExitStatus::Killed,
            }
        } else {
            match inbox.receiver.recv_async().await {
                Ok(envelope) => envelope,
                Err(_) => return ActorExitStatus::Success,
            }
        };

        if let Err(exit_status) = envelope.handle(actor, ctx).await {
            return exit_status;
        }
        let _ = state_tx.send(actor.observable_state());

        if actor.yield_after_each_message() {
            tokio::task::yield_now().await;
        }
    }
}
