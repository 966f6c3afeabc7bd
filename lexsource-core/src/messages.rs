//! Cross-actor message types (§4, §6).
//!
//! Each actor implements `Handler<M>` once per message it accepts; there is
//! no string- or tag-keyed dispatch (§9). Grouping the cross-actor messages
//! here (rather than scattering them across each actor's module) keeps the
//! protocol between Discovery / Fetchers / Persistence / Coordinator in one
//! place, since several of them are produced by one actor and consumed by
//! another.

use std::collections::BTreeMap;

use lexsource_config::JobConfig;

use crate::model::{Reference, StatusSnapshot};

/// Begin a pipeline run (§4.6, §6). Precondition: `Idle`.
#[derive(Debug)]
pub struct Start(pub JobConfig);

/// Precondition: `Fetching`. Freezes dispatch; in-flight fetches complete.
#[derive(Debug)]
pub struct Pause;

/// Precondition: `Paused`. Drains the buffered queue back into the Fetcher
/// pool.
#[derive(Debug)]
pub struct Resume;

/// Precondition: a job is running (not `Idle`, not terminal). Aborts the
/// run cooperatively.
#[derive(Debug)]
pub struct Cancel;

/// Ask. Returns a `StatusSnapshot` from any state.
#[derive(Debug)]
pub struct GetStatus;

/// Ask. Returns the most-recent `limit` `LogEntry` values.
#[derive(Debug)]
pub struct GetLogs(pub usize);

/// Discovery -> Coordinator: a newly canonicalized reference is ready to be
/// dispatched (or buffered) for fetching.
#[derive(Debug)]
pub struct EnqueueReference(pub Reference);

/// Discovery -> Coordinator (ask, read-only): is `external_id` already in
/// the job's seen-set? Consulted before `EnqueueReference` is sent (§4.5
/// step b) so Discovery doesn't have to wait for the Coordinator to drop a
/// duplicate after the fact.
#[derive(Debug)]
pub struct IsSeen(pub String);

/// Discovery -> Coordinator: pagination reached its natural end, hit
/// `max_results`, or was cancelled cleanly.
#[derive(Debug)]
pub struct DiscoveryFinished;

/// Discovery -> Coordinator: the index could not be paginated after
/// exhausting retries (§4.5, §7 job-fatal).
#[derive(Debug)]
pub struct DiscoveryFailed(pub String);

/// Fetcher -> Coordinator.
#[derive(Debug)]
pub struct FetchedOk(pub String);

/// Fetcher -> Coordinator: HTTP 4xx, a parse error, or exhausted retries
/// (§7 per-item terminal).
#[derive(Debug)]
pub struct FetchFailed {
    pub external_id: String,
    pub reason: String,
}

/// Persistence -> Coordinator: storage retries were exhausted (§4.3).
#[derive(Debug)]
pub struct PersistFailed {
    pub external_id: String,
    pub reason: String,
}

/// Any actor -> Coordinator: a handler raised an error that the dispatch
/// loop caught (§4.1 Failure, §7 "System" severity). Never fatal on its own.
#[derive(Debug)]
pub struct ComponentError {
    pub component: String,
    pub message: String,
}

/// Fetch bytes for a single reference (§4.4).
#[derive(Debug)]
pub struct Fetch(pub Reference);

/// Save a parsed document, plus the raw bytes to archive if
/// `download_payloads` requested it (§4.3, §4.4 step 5).
#[derive(Debug)]
pub struct SaveDocument {
    pub document: crate::model::Document,
    pub raw_blob: Option<(String, bytes::Bytes)>,
}

/// Ask; resolves once every `SaveDocument` enqueued before it on the same
/// sender has succeeded or failed terminally (§4.3). Because an actor's
/// mailbox is processed one message at a time to completion, this holds
/// automatically: by the time `Flush` is dequeued, nothing is left running.
#[derive(Debug)]
pub struct Flush;

pub type Filters = BTreeMap<String, String>;

pub(crate) fn status_snapshot(
    job_id: String,
    state: crate::model::PipelineState,
    progress: crate::model::Progress,
    cancelled: bool,
) -> StatusSnapshot {
    StatusSnapshot {
        job_id,
        state,
        progress,
        cancelled,
    }
}
