use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lexsource_config::SourceId;

/// A unit of work discovered but not yet fetched (§3 `Reference`).
///
/// Created by Discovery, consumed by a Fetcher, never mutated afterwards.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reference {
    pub source_id: SourceId,
    /// Unique within `source_id`; the Discovery/Coordinator dedup key.
    pub external_id: String,
    pub url: String,
    pub title: Option<String>,
    #[serde(default)]
    pub opaque_metadata: BTreeMap<String, String>,
}

/// A fetched-and-parsed record (§3 `Document`).
///
/// Produced by a source's parser collaborator, persisted exactly once,
/// immutable thereafter. Field order here is the canonical on-disk order
/// (§6 `documents/<external_id>.json`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub source_id: SourceId,
    pub external_id: String,
    pub title: String,
    pub publication_date: Option<String>,
    pub category: Option<String>,
    pub scope: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub articles: Vec<String>,
    #[serde(default)]
    pub reforms: Vec<String>,
    pub raw_blob_ref: Option<String>,
}

/// The Coordinator's finite state (§3 `PipelineState`, §4.6 state machine).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Discovering,
    Fetching,
    Paused,
    Cancelling,
    Completed,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Failed)
    }
}

/// Monotonic counters snapshot (§3 `Progress`), updated atomically on every
/// actor transition and never read without the accompanying state tag
/// (§3 invariant: "PipelineState is authoritative").
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub discovered: u64,
    pub downloaded: u64,
    pub pending: u64,
    pub active: u64,
    pub errors: u64,
}

impl Progress {
    /// §3 invariant: `pending = discovered - downloaded - errors` at every
    /// quiescent point (no fetch currently in flight).
    pub fn is_consistent_at_quiescence(&self) -> bool {
        self.discovered == self.downloaded + self.errors + self.pending
    }
}

/// A full status snapshot returned by the `Status` ask (§6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub job_id: String,
    pub state: PipelineState,
    pub progress: Progress,
    pub cancelled: bool,
}
