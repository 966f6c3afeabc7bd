//! Maps a job's `SourceId`/`DiscoveryMode` to the concrete collaborators
//! that know how to drive that particular source (§1 "source-agnostic
//! runtime wrapping source-specific collaborators").
//!
//! The runtime (actors, Coordinator state machine) never inspects
//! `SourceId`; only this registry does, at job start, to build the
//! `IndexAdapter` Discovery will drive. Concrete adapters (the actual HTML
//! scraping / API calls for a gazette, a court portal, a library, a
//! tribunal) are out of scope (§1) and live outside this crate.

use lexsource_config::JobConfig;

use crate::collaborators::IndexAdapter;

/// Constructs a fresh `IndexAdapter` for one job run. Implementations are
/// expected to be cheap and stateless; all per-run pagination state lives
/// in the returned adapter, not in the factory.
pub trait IndexAdapterFactory: Send + Sync {
    fn create(&self, config: &JobConfig) -> Box<dyn IndexAdapter>;
}

impl<F> IndexAdapterFactory for F
where
    F: Fn(&JobConfig) -> Box<dyn IndexAdapter> + Send + Sync,
{
    fn create(&self, config: &JobConfig) -> Box<dyn IndexAdapter> {
        self(config)
    }
}
