/// Configuration validation failures (§7 "configuration validation
/// failure" is job-fatal and prevents `Start` from ever reaching
/// `Discovering`).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("output_directory must not be empty")]
    EmptyOutputDirectory,
    #[error("rate_limit_rps must be >= 0, got {0}")]
    NegativeRateLimit(f64),
    #[error("concurrency must be >= 1, got {0}")]
    ZeroConcurrency(usize),
    #[error("range mode requires start <= end, got {start} > {end}")]
    InvalidDateRange { start: String, end: String },
    #[error("search mode requires a non-empty query")]
    EmptySearchQuery,
    #[error("category mode requires a non-empty category")]
    EmptyCategory,
    #[error("max_results must be provided for search mode")]
    MissingMaxResultsForSearch,
}
