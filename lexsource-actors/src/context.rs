use std::time::Duration;

use crate::kill_switch::KillSwitch;
use crate::mailbox::{AskError, Mailbox, SendError};
use crate::spawn::SpawnBuilder;
use crate::{Actor, Handler};

/// Handed to every `Handler::handle` / `Actor::initialize` / `Actor::finalize`
/// call. It exposes the actor's own mailbox (for `tell`ing itself a follow-up
/// message), the shared kill switch, and the ability to spawn child actors.
pub struct ActorContext<A: Actor> {
    self_mailbox: Mailbox<A>,
    kill_switch: KillSwitch,
}

impl<A: Actor> ActorContext<A> {
    pub(crate) fn new(self_mailbox: Mailbox<A>, kill_switch: KillSwitch) -> Self {
        ActorContext {
            self_mailbox,
            kill_switch,
        }
    }

    pub fn mailbox(&self) -> &Mailbox<A> {
        &self.self_mailbox
    }

    pub fn kill_switch(&self) -> &KillSwitch {
        &self.kill_switch
    }

    /// Tell a message to self; used by loop-style actors (e.g. Discovery's
    /// pagination loop) to schedule their own next step.
    pub async fn send_self_message<M>(&self, message: M) -> Result<(), SendError>
    where
        A: Handler<M>,
        M: Send + 'static,
    {
        self.self_mailbox.send_message(message).await
    }

    /// Tell self a message after `after` elapses, without blocking the
    /// current handler.
    pub fn schedule_self_msg<M>(&self, after: Duration, message: M)
    where
        A: Handler<M>,
        M: Send + 'static,
    {
        let mailbox = self.self_mailbox.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = mailbox.send_message(message).await;
        });
    }

    /// Ask another actor, using that actor's default ask timeout.
    pub async fn ask<B, M>(&self, mailbox: &Mailbox<B>, message: M) -> Result<B::Reply, AskError>
    where
        B: Actor + Handler<M>,
        M: Send + 'static,
    {
        mailbox.ask(message).await
    }

    /// Begin spawning a child actor sharing this actor's kill switch by
    /// default (override with `.set_kill_switch`).
    pub fn spawn_actor<B: Actor>(&self, actor: B) -> SpawnBuilder<B> {
        SpawnBuilder::new(actor).set_kill_switch(self.kill_switch.clone())
    }
}
