use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::actor::QueueCapacity;
use crate::{Actor, ActorContext, ActorExitStatus, Handler};

/// Default per-`ask` timeout (§4.1, §5 Timeouts).
pub const DEFAULT_ASK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
#[error("the actor's mailbox is closed")]
pub struct SendError;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AskError {
    #[error("ask timed out waiting for a reply")]
    Timeout,
    #[error("the actor stopped before producing a reply")]
    ActorStopped,
    #[error("the actor's mailbox is closed")]
    MailboxClosed,
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased, already-bound (message, optional reply channel) pair.
///
/// This is what actually travels through the flume channel backing a
/// [`Mailbox`]; it is what lets one mailbox carry every message type the
/// actor implements a `Handler` for.
pub(crate) trait Envelope<A: Actor>: Send {
    fn handle<'a>(
        self: Box<Self>,
        actor: &'a mut A,
        ctx: &'a ActorContext<A>,
    ) -> BoxFuture<'a, Result<(), ActorExitStatus>>;
}

struct Dispatch<A, M>
where
    A: Handler<M>,
    M: Send + 'static,
{
    message: Option<M>,
    reply_tx: Option<oneshot::Sender<A::Reply>>,
}

impl<A, M> Envelope<A> for Dispatch<A, M>
where
    A: Handler<M>,
    M: Send + 'static,
{
    fn handle<'a>(
        mut self: Box<Self>,
        actor: &'a mut A,
        ctx: &'a ActorContext<A>,
    ) -> BoxFuture<'a, Result<(), ActorExitStatus>> {
        Box::pin(async move {
            let message = self.message.take().expect("message is consumed exactly once");
            let reply = actor.handle(message, ctx).await?;
            if let Some(reply_tx) = self.reply_tx.take() {
                // The receiver may already be gone (caller timed out); a
                // dropped reply is not an error for the actor.
                let _ = reply_tx.send(reply);
            }
            Ok(())
        })
    }
}

/// The sending half of an actor's mailbox.
///
/// Cloning a `Mailbox` is cheap; every clone feeds the same single-consumer
/// queue. Messages from one sender to one recipient are delivered in send
/// order; there is no ordering guarantee across distinct senders (§4.1
/// Ordering).
pub struct Mailbox<A: Actor> {
    sender: flume::Sender<Box<dyn Envelope<A>>>,
    name: Arc<str>,
}

impl<A: Actor> Clone for Mailbox<A> {
    fn clone(&self) -> Self {
        Mailbox {
            sender: self.sender.clone(),
            name: self.name.clone(),
        }
    }
}

impl<A: Actor> fmt::Debug for Mailbox<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox").field("name", &self.name).finish()
    }
}

impl<A: Actor> Mailbox<A> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_disconnected()
    }

    /// Fire-and-forget send. Suspends the caller only if the mailbox is
    /// bounded and full.
    pub async fn send_message<M>(&self, message: M) -> Result<(), SendError>
    where
        A: Handler<M>,
        M: Send + 'static,
    {
        let envelope: Box<dyn Envelope<A>> = Box::new(Dispatch::<A, M> {
            message: Some(message),
            reply_tx: None,
        });
        self.sender.send_async(envelope).await.map_err(|_| SendError)
    }

    /// Non-suspending fire-and-forget send; fails if the mailbox is full or
    /// closed.
    pub fn try_send_message<M>(&self, message: M) -> Result<(), SendError>
    where
        A: Handler<M>,
        M: Send + 'static,
    {
        let envelope: Box<dyn Envelope<A>> = Box::new(Dispatch::<A, M> {
            message: Some(message),
            reply_tx: None,
        });
        self.sender.try_send(envelope).map_err(|_| SendError)
    }

    /// Request-response send with the default ask timeout.
    pub async fn ask<M>(&self, message: M) -> Result<A::Reply, AskError>
    where
        A: Handler<M>,
        M: Send + 'static,
    {
        self.ask_with_timeout(message, DEFAULT_ASK_TIMEOUT).await
    }

    pub async fn ask_with_timeout<M>(
        &self,
        message: M,
        timeout: Duration,
    ) -> Result<A::Reply, AskError>
    where
        A: Handler<M>,
        M: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let envelope: Box<dyn Envelope<A>> = Box::new(Dispatch::<A, M> {
            message: Some(message),
            reply_tx: Some(reply_tx),
        });
        self.sender
            .send_async(envelope)
            .await
            .map_err(|_| AskError::MailboxClosed)?;
        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(AskError::ActorStopped),
            Err(_) => Err(AskError::Timeout),
        }
    }
}

/// The receiving half of an actor's mailbox, held by the dispatch loop only.
pub struct Inbox<A: Actor> {
    pub(crate) receiver: flume::Receiver<Box<dyn Envelope<A>>>,
}

pub fn create_mailbox<A: Actor>(name: String, capacity: QueueCapacity) -> (Mailbox<A>, Inbox<A>) {
    let (sender, receiver) = match capacity {
        QueueCapacity::Bounded(n) => flume::bounded(n),
        QueueCapacity::Unbounded => flume::unbounded(),
    };
    (
        Mailbox {
            sender,
            name: Arc::from(name),
        },
        Inbox { receiver },
    )
}
