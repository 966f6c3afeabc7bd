//! Local command-line driver for the lexsource pipeline: enough wiring to
//! start a job against a flat-file index and the local filesystem and watch
//! it run to completion. The REST surface this would normally sit behind
//! lives outside this crate.

mod filesystem;
mod http_client;
mod index;
mod parser;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser as ClapParser, Subcommand};
use colored::Colorize;
use tracing::{error, info};

use lexsource_actors::spawn_actor;
use lexsource_common::{LogRing, LogRingLayer};
use lexsource_config::{DiscoveryMode, JobConfig, SourceId};
use lexsource_core::{Cancel, Coordinator, GetStatus, PipelineDependencies, PipelineState, Start};

use filesystem::FsStorage;
use http_client::ReqwestHttpClient;
use index::StaticReferenceIndexFactory;
use parser::PassthroughParser;

#[derive(ClapParser)]
#[command(name = "lexsource", about = "Legal-document acquisition pipeline driver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a job and block until it reaches a terminal state.
    Run(RunArgs),
    /// Print the most recent checkpoint written for a session.
    Status(StatusArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    #[arg(long, value_enum)]
    source: CliSourceId,
    /// One of today|date:<YYYY-MM-DD>|range:<start>,<end>|category:<name>|search:<query>
    #[arg(long)]
    mode: String,
    #[arg(long)]
    output_dir: PathBuf,
    /// A JSON array of `{external_id, url, title?}` objects to discover;
    /// stands in for the (out-of-scope) concrete source adapter.
    #[arg(long)]
    references_file: PathBuf,
    #[arg(long, default_value_t = 5.0)]
    rate_limit_rps: f64,
    #[arg(long, default_value_t = 3)]
    concurrency: usize,
    #[arg(long)]
    download_payloads: bool,
    #[arg(long)]
    checkpoint_id: Option<String>,
    #[arg(long, default_value_t = 10)]
    checkpoint_interval: u64,
    #[arg(long)]
    max_results: Option<usize>,
    /// Completes with exit code 0 as long as the error count stays at or
    /// below this threshold (§6 "success, possibly with partial errors").
    #[arg(long, default_value_t = 0)]
    max_errors: u64,
}

#[derive(clap::Args)]
struct StatusArgs {
    #[arg(long)]
    output_dir: PathBuf,
    #[arg(long)]
    checkpoint_id: String,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliSourceId {
    NationalGazette,
    SupremeCourtPortal,
    AcademicLibrary,
    ArbitrationTribunal,
}

impl From<CliSourceId> for SourceId {
    fn from(value: CliSourceId) -> Self {
        match value {
            CliSourceId::NationalGazette => SourceId::NationalGazette,
            CliSourceId::SupremeCourtPortal => SourceId::SupremeCourtPortal,
            CliSourceId::AcademicLibrary => SourceId::AcademicLibrary,
            CliSourceId::ArbitrationTribunal => SourceId::ArbitrationTribunal,
        }
    }
}

fn parse_mode(raw: &str) -> anyhow::Result<DiscoveryMode> {
    let (kind, rest) = raw.split_once(':').unwrap_or((raw, ""));
    match kind {
        "today" => Ok(DiscoveryMode::Today),
        "date" => {
            let date = chrono::NaiveDate::parse_from_str(rest, "%Y-%m-%d")?;
            Ok(DiscoveryMode::Date(date))
        }
        "range" => {
            let (start, end) = rest
                .split_once(',')
                .ok_or_else(|| anyhow::anyhow!("range mode expects start,end"))?;
            Ok(DiscoveryMode::Range(
                chrono::NaiveDate::parse_from_str(start, "%Y-%m-%d")?,
                chrono::NaiveDate::parse_from_str(end, "%Y-%m-%d")?,
            ))
        }
        "category" => Ok(DiscoveryMode::Category {
            category: rest.to_string(),
            scope: None,
            status: None,
        }),
        "search" => Ok(DiscoveryMode::Search {
            query: rest.to_string(),
            filters: Default::default(),
        }),
        other => anyhow::bail!("unknown mode kind: {other}"),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to start the tokio runtime");
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> ExitCode {
    let ring = LogRing::new(256);
    if let Err(err) = lexsource_common::init_logging(LogRingLayer::new(ring.clone())) {
        eprintln!("failed to initialize logging: {err:?}");
        return ExitCode::from(1);
    }

    match cli.command {
        Command::Run(args) => run_job(args, ring).await,
        Command::Status(args) => print_status(args).await,
    }
}

async fn run_job(args: RunArgs, log_ring: LogRing) -> ExitCode {
    let mode = match parse_mode(&args.mode) {
        Ok(mode) => mode,
        Err(err) => {
            eprintln!("{} invalid --mode: {err}", "✘".red());
            return ExitCode::from(1);
        }
    };

    let mut config = JobConfig::new(SourceId::from(args.source), mode, args.output_dir.clone());
    config.rate_limit_rps = args.rate_limit_rps;
    config.concurrency = args.concurrency;
    config.download_payloads = args.download_payloads;
    config.checkpoint_id = args.checkpoint_id.clone();
    config.checkpoint_interval = args.checkpoint_interval;
    config.max_results = args.max_results;

    if let Err(err) = config.validate() {
        eprintln!("{} invalid job configuration: {err}", "✘".red());
        return ExitCode::from(1);
    }

    let references = match index::load_references(&args.references_file).await {
        Ok(references) => references,
        Err(err) => {
            eprintln!("{} failed to read --references-file: {err}", "✘".red());
            return ExitCode::from(1);
        }
    };

    let storage = match FsStorage::new(args.output_dir.clone()).await {
        Ok(storage) => Arc::new(storage),
        Err(err) => {
            eprintln!("{} failed to prepare --output-dir: {err}", "✘".red());
            return ExitCode::from(1);
        }
    };

    let deps = PipelineDependencies {
        http_client: Arc::new(ReqwestHttpClient::new()),
        parser: Arc::new(PassthroughParser),
        storage: storage.clone(),
        object_store: Some(storage),
        index_adapter_factory: Arc::new(StaticReferenceIndexFactory::new(references)),
    };

    let job_id = ulid::Ulid::new().to_string();
    let coordinator = Coordinator::new(job_id.clone(), deps, log_ring);
    let (mailbox, handle) = spawn_actor(coordinator).spawn();

    match mailbox.ask(Start(config)).await {
        Ok(Ok(())) => {}
        Ok(Err(reason)) => {
            eprintln!("{} could not start job: {reason}", "✘".red());
            handle.quit().await;
            return ExitCode::from(1);
        }
        Err(err) => {
            eprintln!("{} coordinator did not accept Start: {err}", "✘".red());
            handle.quit().await;
            return ExitCode::from(2);
        }
    }
    info!(job_id = %job_id, "job started");

    let mut interrupted = false;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                eprintln!("\n{} cancelling…", "!".yellow());
                let _ = mailbox.ask(Cancel).await;
            }
            _ = tokio::time::sleep(std::time::Duration::from_millis(250)) => {}
        }

        let status = match mailbox.ask(GetStatus).await {
            Ok(status) => status,
            Err(err) => {
                error!(error = %err, "lost contact with the coordinator");
                return ExitCode::from(2);
            }
        };
        println!(
            "{:?} discovered={} downloaded={} pending={} active={} errors={}",
            status.state,
            status.progress.discovered,
            status.progress.downloaded,
            status.progress.pending,
            status.progress.active,
            status.progress.errors,
        );
        if status.state.is_terminal() {
            handle.quit().await;
            if interrupted || status.cancelled {
                return ExitCode::from(130);
            }
            return match status.state {
                PipelineState::Completed if status.progress.errors <= args.max_errors => {
                    ExitCode::from(0)
                }
                PipelineState::Completed => ExitCode::from(2),
                _ => ExitCode::from(2),
            };
        }
    }
}

async fn print_status(args: StatusArgs) -> ExitCode {
    match filesystem::read_checkpoint(&args.output_dir, &args.checkpoint_id).await {
        Ok(Some(checkpoint)) => {
            println!("{}", serde_json::to_string_pretty(&checkpoint).unwrap());
            ExitCode::from(0)
        }
        Ok(None) => {
            eprintln!("no checkpoint found for session {}", args.checkpoint_id);
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("{} failed to read checkpoint: {err}", "✘".red());
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_today() {
        assert!(matches!(parse_mode("today").unwrap(), DiscoveryMode::Today));
    }

    #[test]
    fn parses_date() {
        match parse_mode("date:2026-07-31").unwrap() {
            DiscoveryMode::Date(date) => assert_eq!(date.to_string(), "2026-07-31"),
            other => panic!("expected Date, got {other:?}"),
        }
    }

    #[test]
    fn parses_range() {
        match parse_mode("range:2026-01-01,2026-01-31").unwrap() {
            DiscoveryMode::Range(start, end) => {
                assert_eq!(start.to_string(), "2026-01-01");
                assert_eq!(end.to_string(), "2026-01-31");
            }
            other => panic!("expected Range, got {other:?}"),
        }
    }

    #[test]
    fn parses_category_and_search() {
        match parse_mode("category:labor-law").unwrap() {
            DiscoveryMode::Category { category, .. } => assert_eq!(category, "labor-law"),
            other => panic!("expected Category, got {other:?}"),
        }
        match parse_mode("search:minimum wage").unwrap() {
            DiscoveryMode::Search { query, .. } => assert_eq!(query, "minimum wage"),
            other => panic!("expected Search, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_mode_kind() {
        assert!(parse_mode("bogus:whatever").is_err());
    }

    #[test]
    fn rejects_malformed_range() {
        assert!(parse_mode("range:2026-01-01").is_err());
    }
}
