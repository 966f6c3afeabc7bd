use async_trait::async_trait;

use crate::{Actor, ActorContext, ActorExitStatus};

/// Binds a message type `M` to the actor's response for it.
///
/// An actor implements `Handler<M>` once per message variant it accepts;
/// there is no dynamic/string-keyed dispatch — the set of `impl Handler<M>
/// for MyActor` blocks *is* the closed message protocol for `MyActor`
/// (§9 "Dynamic message dispatch").
#[async_trait]
pub trait Handler<M>: Actor
where
    M: Send + 'static,
{
    type Reply: Send + 'static;

    async fn handle(
        &mut self,
        message: M,
        ctx: &ActorContext<Self>,
    ) -> Result<Self::Reply, ActorExitStatus>;
}
