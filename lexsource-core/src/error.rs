/// Errors surfaced by the HTTP, storage, and object-store collaborators
/// (§6), pre-classified into the severities of §7.
#[derive(Clone, Debug, thiserror::Error)]
pub enum CollaboratorError {
    /// Network timeout/DNS/connection-reset/HTTP 5xx/storage I/O failure —
    /// retried with exponential backoff up to `max_attempts`.
    #[error("transient error: {0}")]
    Transient(String),
    /// HTTP 4xx, parse error, malformed reference — per-item terminal,
    /// recorded and the job continues.
    #[error("terminal error (status {status:?}): {reason}")]
    Terminal { status: Option<u16>, reason: String },
}

impl CollaboratorError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CollaboratorError::Transient(_))
    }
}

/// Job-fatal errors (§7): discovery index unreachable after retries,
/// checkpoint load corruption, configuration validation failure. Exactly one
/// of these drives a `PipelineState::Failed` transition; the job then drops
/// all further messages.
#[derive(Clone, Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration is invalid: {0}")]
    InvalidConfig(String),
    #[error("discovery failed: {0}")]
    DiscoveryFailed(String),
    #[error("checkpoint is corrupt: {0}")]
    CorruptCheckpoint(String),
}
