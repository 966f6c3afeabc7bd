//! Ambient stack shared by every lexsource crate: structured logging, the
//! bounded log ring backing the `Logs` control operation, and the full-jitter
//! backoff helper shared by the Fetch Worker and Persistence actor retries.

mod backoff;
mod log_ring;
mod logging;

pub use backoff::BackoffPolicy;
pub use log_ring::{LogEntry, LogRing, LogRingLayer};
pub use logging::init as init_logging;
