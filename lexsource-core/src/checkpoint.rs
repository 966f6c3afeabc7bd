use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A durable resume point (§3 `Checkpoint`), written by the Coordinator every
/// `checkpoint_interval` completions or on `Pause`/`Cancel` (§4.6), and read
/// back on `Start(config.checkpoint_id)`.
///
/// `Checkpoint` written at time T replays to an equivalent job state at time
/// T (§3 invariant); `BTreeSet` (rather than `HashSet`) keeps
/// serialization order stable so two checkpoints covering the same ids
/// compare equal byte-for-byte, which the round-trip property in §8 relies
/// on.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Checkpoint {
    pub session_id: String,
    pub last_processed_external_id: Option<String>,
    pub pending_ids: BTreeSet<String>,
    pub failed_ids: BTreeSet<String>,
    /// Ids successfully downloaded before this checkpoint was written; part
    /// of the seen-set (§4.6) so a resumed run skips them instead of
    /// re-discovering and re-fetching them.
    pub downloaded_ids: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(session_id: String, created_at: DateTime<Utc>) -> Self {
        Checkpoint {
            session_id,
            last_processed_external_id: None,
            pending_ids: BTreeSet::new(),
            failed_ids: BTreeSet::new(),
            downloaded_ids: BTreeSet::new(),
            created_at,
        }
    }
}
