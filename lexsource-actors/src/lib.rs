//! Mailbox-based actor runtime (§4.1).
//!
//! Actors are units of private state plus a single-consumer mailbox. A
//! dispatcher reads one message at a time and runs it to completion before
//! the next begins; actors never share mutable state, only message
//! payloads. Two primitives are exposed on [`Mailbox`]: `send_message`
//! (fire-and-forget `tell`) and `ask` (request-response with a timeout).

mod actor;
mod context;
mod exit_status;
mod handle;
mod handler;
mod kill_switch;
mod mailbox;
mod spawn;

pub use actor::{Actor, QueueCapacity};
pub use context::ActorContext;
pub use exit_status::ActorExitStatus;
pub use handle::{ActorHandle, Health, Supervisable};
pub use handler::Handler;
pub use kill_switch::KillSwitch;
pub use mailbox::{create_mailbox, AskError, Inbox, Mailbox, SendError, DEFAULT_ASK_TIMEOUT};
pub use spawn::{spawn_actor, SpawnBuilder, STOP_GRACE_PERIOD};
