use async_trait::async_trait;

use crate::error::CollaboratorError;
use crate::model::Reference;

/// One page of an index listing, paginated by an [`IndexAdapter`] (§4.5).
pub struct IndexPage {
    pub candidates: Vec<Reference>,
}

/// Per-source, per-run pagination over a discovery index (gazette issue
/// list, court docket search, library catalogue, tribunal register). One
/// `IndexAdapter` instance is constructed per `Start` from the job's
/// `DiscoveryMode` and owns its own cursor/page-number state; the Discovery
/// actor only knows how to drive it to exhaustion, never how any particular
/// source's index is shaped.
///
/// This mirrors how a source's `Source` implementation is the only
/// source-specific code wrapped by a generic polling actor: replacing one
/// source never touches the Discovery actor or the Coordinator.
#[async_trait]
pub trait IndexAdapter: Send {
    /// Returns the next page of candidates, or `None` once the index is
    /// exhausted (§4.5: "Stops when... the adapter signals no more pages").
    async fn next_page(&mut self) -> Result<Option<IndexPage>, CollaboratorError>;
}
