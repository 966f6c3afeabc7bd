mod checkpoint;
mod coordinator;
mod discovery_actor;
mod error;
mod fetch_worker;
mod messages;
mod model;
mod persistence_actor;
mod rate_limiter;
mod source_registry;

pub mod collaborators;

#[cfg(any(test, feature = "testsuite"))]
pub mod testutil;

pub use checkpoint::Checkpoint;
pub use coordinator::{Coordinator, PipelineDependencies};
pub use discovery_actor::{DiscoveryActor, DiscoveryCounters};
pub use error::{CollaboratorError, PipelineError};
pub use fetch_worker::{FetchWorker, FetchWorkerCounters};
pub use messages::{
    Cancel, ComponentError, DiscoveryFailed, DiscoveryFinished, EnqueueReference, Fetch,
    FetchFailed, FetchedOk, Filters, Flush, GetLogs, GetStatus, IsSeen, Pause, PersistFailed,
    Resume, SaveDocument, Start,
};
pub use model::{Document, PipelineState, Progress, Reference, StatusSnapshot};
pub use persistence_actor::{PersistenceActor, PersistenceCounters};
pub use rate_limiter::RateLimiter;
pub use source_registry::IndexAdapterFactory;
