use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::log_ring::LogRingLayer;

/// Installs a `tracing-subscriber` `fmt` subscriber filtered by `RUST_LOG`
/// (default `info`), and wires in the bounded `LogEntry` ring buffer so the
/// control surface's `Logs(limit)` operation (§6) can serve recent entries
/// without re-reading log output.
///
/// One `EnvFilter`, one process-wide subscriber, installed once at startup.
pub fn init(ring: LogRingLayer) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(ring)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
