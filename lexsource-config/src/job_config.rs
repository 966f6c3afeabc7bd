use std::path::PathBuf;

use lexsource_common::BackoffPolicy;

use crate::error::ConfigError;
use crate::mode::DiscoveryMode;
use crate::source_id::SourceId;

/// Full jitter exponential backoff knobs shared by the Fetch Worker and the
/// Persistence actor (§4.4, §9). Re-exported under a job-facing name.
pub type RetryPolicy = BackoffPolicy;

/// Default size of the fetcher pool (§4.4 Concurrency).
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Default checkpoint interval, in completions (§4.6 Checkpointing).
pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = 10;

/// Parameters for a single pipeline run (§3 `JobConfig`). Created at `Start`,
/// read-only for the lifetime of the job.
#[derive(Clone, Debug)]
pub struct JobConfig {
    pub source_id: SourceId,
    pub mode: DiscoveryMode,
    pub max_results: Option<usize>,
    pub output_directory: PathBuf,
    pub rate_limit_rps: f64,
    pub concurrency: usize,
    pub download_payloads: bool,
    pub checkpoint_id: Option<String>,
    pub checkpoint_interval: u64,
    pub retry_policy: RetryPolicy,
}

impl JobConfig {
    pub fn new(source_id: SourceId, mode: DiscoveryMode, output_directory: PathBuf) -> Self {
        JobConfig {
            source_id,
            mode,
            max_results: None,
            output_directory,
            rate_limit_rps: 5.0,
            concurrency: DEFAULT_CONCURRENCY,
            download_payloads: false,
            checkpoint_id: None,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Validates everything that can be checked statically, before any
    /// actor is started. A failure here is job-fatal (§7) and the job never
    /// leaves `Idle`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_directory.as_os_str().is_empty() {
            return Err(ConfigError::EmptyOutputDirectory);
        }
        if self.rate_limit_rps < 0.0 {
            return Err(ConfigError::NegativeRateLimit(self.rate_limit_rps));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency(self.concurrency));
        }
        match &self.mode {
            DiscoveryMode::Range(start, end) => {
                if start > end {
                    return Err(ConfigError::InvalidDateRange {
                        start: start.to_string(),
                        end: end.to_string(),
                    });
                }
            }
            DiscoveryMode::Category { category, .. } => {
                if category.trim().is_empty() {
                    return Err(ConfigError::EmptyCategory);
                }
            }
            DiscoveryMode::Search { query, .. } => {
                if query.trim().is_empty() {
                    return Err(ConfigError::EmptySearchQuery);
                }
            }
            DiscoveryMode::Today | DiscoveryMode::Date(_) => {}
        }
        Ok(())
    }
}
