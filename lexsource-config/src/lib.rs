//! `JobConfig` (§3) and the closed registry of concrete sources (§1).

mod error;
mod job_config;
mod mode;
mod source_id;

pub use error::ConfigError;
pub use job_config::{JobConfig, RetryPolicy, DEFAULT_CHECKPOINT_INTERVAL, DEFAULT_CONCURRENCY};
pub use mode::DiscoveryMode;
pub use source_id::SourceId;
