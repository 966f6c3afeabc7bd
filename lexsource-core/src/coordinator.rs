//! Coordinator actor (§4.6): owns the job's state machine, work queue, and
//! seen-set, and supervises the Discovery/Fetcher/Persistence actors it
//! spawns at `Start`.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use lexsource_actors::{Actor, ActorContext, ActorExitStatus, Handler, KillSwitch, Mailbox};
use lexsource_common::{LogEntry, LogRing};
use lexsource_config::JobConfig;

use crate::checkpoint::Checkpoint;
use crate::collaborators::{HttpClient, ObjectStore, Parser, Storage};
use crate::discovery_actor::DiscoveryActor;
use crate::fetch_worker::FetchWorker;
use crate::messages::{
    Cancel, ComponentError, DiscoveryFailed, DiscoveryFinished, EnqueueReference, Fetch,
    FetchFailed, FetchedOk, Flush, GetLogs, GetStatus, IsSeen, Pause, PersistFailed, Resume,
    Start,
};
use crate::model::{PipelineState, Progress, Reference, StatusSnapshot};
use crate::persistence_actor::PersistenceActor;
use crate::rate_limiter::RateLimiter;
use crate::source_registry::IndexAdapterFactory;

/// External collaborators injected once, reused across every job this
/// Coordinator ever runs (§6).
pub struct PipelineDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub parser: Arc<dyn Parser>,
    pub storage: Arc<dyn Storage>,
    pub object_store: Option<Arc<dyn ObjectStore>>,
    pub index_adapter_factory: Arc<dyn IndexAdapterFactory>,
}

struct RunningJob {
    job_kill_switch: KillSwitch,
    persistence: Mailbox<PersistenceActor>,
    fetchers: Vec<Mailbox<FetchWorker>>,
    idle_fetchers: VecDeque<usize>,
    in_flight: HashMap<String, usize>,
    pending_queue: VecDeque<Reference>,
    checkpoint_interval: u64,
    completions_since_checkpoint: u64,
    failed_ids: BTreeSet<String>,
    downloaded_ids: BTreeSet<String>,
    last_resolved_external_id: Option<String>,
}

pub struct Coordinator {
    job_id: String,
    deps: Option<PipelineDependencies>,
    log_ring: LogRing,
    state: PipelineState,
    progress: Progress,
    cancelled: bool,
    seen: HashSet<String>,
    discovery_finished: bool,
    failure_reason: Option<String>,
    job: Option<RunningJob>,
    session_id: Option<String>,
}

impl Coordinator {
    pub fn new(job_id: String, deps: PipelineDependencies, log_ring: LogRing) -> Self {
        Coordinator {
            job_id,
            deps: Some(deps),
            log_ring,
            state: PipelineState::Idle,
            progress: Progress::default(),
            cancelled: false,
            seen: HashSet::new(),
            discovery_finished: false,
            failure_reason: None,
            job: None,
            session_id: None,
        }
    }

    /// A Coordinator with no collaborators wired in, for tests that only
    /// exercise another actor's interaction with the Coordinator's mailbox
    /// (e.g. `PersistenceActor`'s `PersistFailed` notifications) and never
    /// call `Start`.
    #[cfg(any(test, feature = "testsuite"))]
    pub fn new_for_test() -> Self {
        Coordinator {
            job_id: "test-job".to_string(),
            deps: None,
            log_ring: LogRing::new(64),
            state: PipelineState::Idle,
            progress: Progress::default(),
            cancelled: false,
            seen: HashSet::new(),
            discovery_finished: false,
            failure_reason: None,
            job: None,
            session_id: None,
        }
    }

    fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            job_id: self.job_id.clone(),
            state: self.state,
            progress: self.progress,
            cancelled: self.cancelled,
        }
    }

    fn transition_to_failed(&mut self, reason: String) {
        error!(job_id = %self.job_id, reason = %reason, "job failed");
        self.failure_reason = Some(reason);
        self.state = PipelineState::Failed;
        self.kill_job();
    }

    fn kill_job(&mut self) {
        if let Some(job) = &self.job {
            job.job_kill_switch.kill();
        }
    }

    fn maybe_finish(&mut self) {
        let Some(job) = &self.job else { return };
        match self.state {
            PipelineState::Cancelling => {
                if self.progress.active == 0 {
                    info!(job_id = %self.job_id, "job cancelled");
                    self.cancelled = true;
                    self.state = PipelineState::Completed;
                    self.kill_job();
                }
            }
            PipelineState::Discovering | PipelineState::Fetching => {
                if self.discovery_finished && self.progress.pending == 0 && self.progress.active == 0 {
                    info!(job_id = %self.job_id, "job completed");
                    self.state = PipelineState::Completed;
                    self.kill_job();
                }
            }
            _ => {
                let _ = job;
            }
        }
    }

    async fn dispatch_or_buffer(&mut self, reference: Reference) {
        let Some(job) = &mut self.job else { return };
        if self.state == PipelineState::Paused {
            job.pending_queue.push_back(reference);
            self.progress.pending += 1;
            return;
        }
        match job.idle_fetchers.pop_front() {
            Some(idx) => {
                let external_id = reference.external_id.clone();
                let fetcher = job.fetchers[idx].clone();
                job.in_flight.insert(external_id, idx);
                self.progress.active += 1;
                let _ = fetcher.send_message(Fetch(reference)).await;
            }
            None => {
                job.pending_queue.push_back(reference);
                self.progress.pending += 1;
            }
        }
    }

    /// Called whenever a Fetcher becomes idle (it resolved `external_id`).
    /// Either immediately hands it the next buffered reference, or marks it
    /// idle for the next `EnqueueReference`/`Resume`.
    async fn redispatch_or_idle(&mut self, external_id: &str) {
        let Some(job) = &mut self.job else { return };
        let Some(idx) = job.in_flight.remove(external_id) else {
            return;
        };
        self.progress.active -= 1;

        if self.state != PipelineState::Paused {
            if let Some(next) = job.pending_queue.pop_front() {
                self.progress.pending -= 1;
                let next_external_id = next.external_id.clone();
                let fetcher = job.fetchers[idx].clone();
                job.in_flight.insert(next_external_id, idx);
                self.progress.active += 1;
                let _ = fetcher.send_message(Fetch(next)).await;
                return;
            }
        }
        job.idle_fetchers.push_back(idx);
    }

    async fn maybe_checkpoint(&mut self, last_resolved_external_id: String) {
        let Some(deps) = &self.deps else { return };
        let Some(job) = &mut self.job else { return };
        job.completions_since_checkpoint += 1;
        job.last_resolved_external_id = Some(last_resolved_external_id);
        if job.completions_since_checkpoint < job.checkpoint_interval {
            return;
        }
        job.completions_since_checkpoint = 0;

        let mut pending_ids: BTreeSet<String> = job
            .pending_queue
            .iter()
            .map(|r| r.external_id.clone())
            .collect();
        pending_ids.extend(job.in_flight.keys().cloned());

        let Some(session_id) = &self.session_id else { return };
        let checkpoint = Checkpoint {
            session_id: session_id.clone(),
            last_processed_external_id: job.last_resolved_external_id.clone(),
            pending_ids,
            failed_ids: job.failed_ids.clone(),
            downloaded_ids: job.downloaded_ids.clone(),
            created_at: Utc::now(),
        };
        if let Err(err) = deps.storage.save_checkpoint(&checkpoint).await {
            warn!(job_id = %self.job_id, error = %err, "failed to persist checkpoint");
        } else {
            debug!(job_id = %self.job_id, session_id = %checkpoint.session_id, "checkpoint saved");
        }
    }
}

#[async_trait]
impl Actor for Coordinator {
    type ObservableState = StatusSnapshot;

    fn observable_state(&self) -> StatusSnapshot {
        self.snapshot()
    }

    fn name(&self) -> String {
        format!("Coordinator[{}]", self.job_id)
    }
}

#[async_trait]
impl Handler<Start> for Coordinator {
    type Reply = Result<(), String>;

    async fn handle(&mut self, message: Start, ctx: &ActorContext<Self>) -> Result<Result<(), String>, ActorExitStatus> {
        if self.state != PipelineState::Idle {
            return Ok(Err("job already started".to_string()));
        }
        let config = message.0;
        if let Err(err) = config.validate() {
            return Ok(Err(err.to_string()));
        }
        let Some(deps) = &self.deps else {
            return Ok(Err("no collaborators configured for this coordinator".to_string()));
        };
        let storage = deps.storage.clone();
        let http_client = deps.http_client.clone();
        let parser = deps.parser.clone();
        let object_store = deps.object_store.clone();
        let index_adapter_factory = deps.index_adapter_factory.clone();

        let session_id = config
            .checkpoint_id
            .clone()
            .unwrap_or_else(|| ulid::Ulid::new().to_string());

        let mut seeded_failed_ids = BTreeSet::new();
        let mut seeded_downloaded_ids = BTreeSet::new();
        if let Some(checkpoint_id) = &config.checkpoint_id {
            match storage.load_checkpoint(checkpoint_id).await {
                Ok(Some(checkpoint)) => {
                    self.seen.extend(checkpoint.failed_ids.iter().cloned());
                    self.seen.extend(checkpoint.downloaded_ids.iter().cloned());
                    self.progress.errors = checkpoint.failed_ids.len() as u64;
                    self.progress.downloaded = checkpoint.downloaded_ids.len() as u64;
                    self.progress.discovered =
                        (checkpoint.failed_ids.len() + checkpoint.downloaded_ids.len()) as u64;
                    seeded_failed_ids = checkpoint.failed_ids;
                    seeded_downloaded_ids = checkpoint.downloaded_ids;
                }
                Ok(None) => {}
                Err(err) => {
                    self.transition_to_failed(format!("checkpoint load failed: {err}"));
                    return Ok(Err(format!("checkpoint is corrupt: {err}")));
                }
            }
        }

        let job_kill_switch = KillSwitch::default();
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit_rps));

        let (persistence_mailbox, _persistence_handle) = ctx
            .spawn_actor(PersistenceActor::new(
                storage.clone(),
                object_store.clone(),
                ctx.mailbox().clone(),
                config.retry_policy,
            ))
            .set_kill_switch(job_kill_switch.clone())
            .spawn();

        let mut fetchers = Vec::with_capacity(config.concurrency);
        for _ in 0..config.concurrency {
            let (mailbox, _handle) = ctx
                .spawn_actor(FetchWorker::new(
                    http_client.clone(),
                    parser.clone(),
                    rate_limiter.clone(),
                    persistence_mailbox.clone(),
                    ctx.mailbox().clone(),
                    config.retry_policy,
                    config.download_payloads,
                ))
                .set_kill_switch(job_kill_switch.clone())
                .spawn();
            fetchers.push(mailbox);
        }

        let adapter = index_adapter_factory.create(&config);
        let (_discovery_mailbox, _discovery_handle) = ctx
            .spawn_actor(DiscoveryActor::new(
                adapter,
                ctx.mailbox().clone(),
                rate_limiter,
                config.retry_policy,
                config.max_results,
            ))
            .set_kill_switch(job_kill_switch.clone())
            .spawn();

        let idle_fetchers = (0..fetchers.len()).collect();
        self.job = Some(RunningJob {
            job_kill_switch,
            persistence: persistence_mailbox,
            fetchers,
            idle_fetchers,
            in_flight: HashMap::new(),
            pending_queue: VecDeque::new(),
            checkpoint_interval: config.checkpoint_interval.max(1),
            completions_since_checkpoint: 0,
            failed_ids: seeded_failed_ids,
            downloaded_ids: seeded_downloaded_ids,
            last_resolved_external_id: None,
        });
        self.session_id = Some(session_id);
        self.discovery_finished = false;
        self.cancelled = false;
        self.state = PipelineState::Discovering;
        info!(job_id = %self.job_id, source = %config.source_id, mode = config.mode.name(), "job started");
        Ok(Ok(()))
    }
}

#[async_trait]
impl Handler<EnqueueReference> for Coordinator {
    type Reply = ();

    async fn handle(&mut self, message: EnqueueReference, _ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus> {
        if !matches!(self.state, PipelineState::Discovering | PipelineState::Fetching | PipelineState::Paused) {
            return Ok(());
        }
        let reference = message.0;
        if !self.seen.insert(reference.external_id.clone()) {
            return Ok(());
        }
        self.progress.discovered += 1;
        if self.state == PipelineState::Discovering {
            self.state = PipelineState::Fetching;
        }
        self.dispatch_or_buffer(reference).await;
        Ok(())
    }
}

#[async_trait]
impl Handler<IsSeen> for Coordinator {
    type Reply = bool;

    async fn handle(&mut self, message: IsSeen, _ctx: &ActorContext<Self>) -> Result<bool, ActorExitStatus> {
        Ok(self.seen.contains(&message.0))
    }
}

#[async_trait]
impl Handler<DiscoveryFinished> for Coordinator {
    type Reply = ();

    async fn handle(&mut self, _message: DiscoveryFinished, _ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus> {
        self.discovery_finished = true;
        self.maybe_finish();
        Ok(())
    }
}

#[async_trait]
impl Handler<DiscoveryFailed> for Coordinator {
    type Reply = ();

    async fn handle(&mut self, message: DiscoveryFailed, _ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus> {
        self.transition_to_failed(format!("discovery failed: {}", message.0));
        Ok(())
    }
}

#[async_trait]
impl Handler<FetchedOk> for Coordinator {
    type Reply = ();

    async fn handle(&mut self, message: FetchedOk, _ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus> {
        let external_id = message.0;
        self.progress.downloaded += 1;
        if let Some(job) = &mut self.job {
            job.downloaded_ids.insert(external_id.clone());
        }
        self.redispatch_or_idle(&external_id).await;
        self.maybe_checkpoint(external_id).await;
        self.maybe_finish();
        Ok(())
    }
}

#[async_trait]
impl Handler<FetchFailed> for Coordinator {
    type Reply = ();

    async fn handle(&mut self, message: FetchFailed, _ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus> {
        let FetchFailed { external_id, reason } = message;
        warn!(job_id = %self.job_id, external_id = %external_id, reason = %reason, "fetch failed");
        self.progress.errors += 1;
        if let Some(job) = &mut self.job {
            job.failed_ids.insert(external_id.clone());
        }
        self.redispatch_or_idle(&external_id).await;
        self.maybe_checkpoint(external_id).await;
        self.maybe_finish();
        Ok(())
    }
}

#[async_trait]
impl Handler<PersistFailed> for Coordinator {
    type Reply = ();

    async fn handle(&mut self, message: PersistFailed, _ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus> {
        warn!(job_id = %self.job_id, external_id = %message.external_id, reason = %message.reason, "persistence failed");
        Ok(())
    }
}

#[async_trait]
impl Handler<ComponentError> for Coordinator {
    type Reply = ();

    async fn handle(&mut self, message: ComponentError, _ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus> {
        warn!(job_id = %self.job_id, component = %message.component, error = %message.message, "component reported an error");
        Ok(())
    }
}

#[async_trait]
impl Handler<Pause> for Coordinator {
    type Reply = Result<(), String>;

    async fn handle(&mut self, _message: Pause, _ctx: &ActorContext<Self>) -> Result<Result<(), String>, ActorExitStatus> {
        if self.state != PipelineState::Fetching {
            return Ok(Err(format!("cannot pause from state {:?}", self.state)));
        }
        self.state = PipelineState::Paused;
        info!(job_id = %self.job_id, "job paused");
        Ok(Ok(()))
    }
}

#[async_trait]
impl Handler<Resume> for Coordinator {
    type Reply = Result<(), String>;

    async fn handle(&mut self, _message: Resume, _ctx: &ActorContext<Self>) -> Result<Result<(), String>, ActorExitStatus> {
        if self.state != PipelineState::Paused {
            return Ok(Err(format!("cannot resume from state {:?}", self.state)));
        }
        self.state = PipelineState::Fetching;
        info!(job_id = %self.job_id, "job resumed");
        loop {
            let dispatched = {
                let Some(job) = &mut self.job else { break };
                let Some(idx) = job.idle_fetchers.pop_front() else { break };
                let Some(reference) = job.pending_queue.pop_front() else {
                    job.idle_fetchers.push_front(idx);
                    break;
                };
                let external_id = reference.external_id.clone();
                let fetcher = job.fetchers[idx].clone();
                job.in_flight.insert(external_id, idx);
                Some((fetcher, reference))
            };
            let Some((fetcher, reference)) = dispatched else { break };
            self.progress.pending -= 1;
            self.progress.active += 1;
            let _ = fetcher.send_message(Fetch(reference)).await;
        }
        Ok(Ok(()))
    }
}

#[async_trait]
impl Handler<Cancel> for Coordinator {
    type Reply = Result<(), String>;

    async fn handle(&mut self, _message: Cancel, _ctx: &ActorContext<Self>) -> Result<Result<(), String>, ActorExitStatus> {
        if self.state.is_terminal() || self.state == PipelineState::Idle {
            return Ok(Err(format!("cannot cancel from state {:?}", self.state)));
        }
        info!(job_id = %self.job_id, "cancellation requested");
        self.state = PipelineState::Cancelling;
        if let Some(job) = &mut self.job {
            job.job_kill_switch.kill();
            let dropped = job.pending_queue.drain(..).count() as u64;
            self.progress.pending = 0;
            self.progress.errors += dropped;
        }
        self.maybe_finish();
        Ok(Ok(()))
    }
}

#[async_trait]
impl Handler<GetStatus> for Coordinator {
    type Reply = StatusSnapshot;

    async fn handle(&mut self, _message: GetStatus, _ctx: &ActorContext<Self>) -> Result<StatusSnapshot, ActorExitStatus> {
        Ok(self.snapshot())
    }
}

#[async_trait]
impl Handler<GetLogs> for Coordinator {
    type Reply = Vec<LogEntry>;

    async fn handle(&mut self, message: GetLogs, _ctx: &ActorContext<Self>) -> Result<Vec<LogEntry>, ActorExitStatus> {
        Ok(self.log_ring.recent(message.0))
    }
}

// Allows a future caller holding the Coordinator's own mailbox to flush the
// Persistence actor directly (used by the CLI's `status --wait-for-flush`,
// §6).
#[async_trait]
impl Handler<Flush> for Coordinator {
    type Reply = ();

    async fn handle(&mut self, _message: Flush, _ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus> {
        if let Some(job) = &self.job {
            let _ = job.persistence.ask(Flush).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use bytes::Bytes;
    use lexsource_actors::spawn_actor;
    use lexsource_config::{DiscoveryMode, SourceId};

    use crate::collaborators::{HttpResponse, HttpTimeouts, IndexPage, NetworkError, ParseResult};
    use crate::error::CollaboratorError;
    use crate::model::Document;

    struct FixedPages {
        pages: Mutex<Vec<Vec<Reference>>>,
    }

    #[async_trait]
    impl crate::collaborators::IndexAdapter for FixedPages {
        async fn next_page(&mut self) -> Result<Option<IndexPage>, CollaboratorError> {
            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() {
                return Ok(None);
            }
            Ok(Some(IndexPage {
                candidates: pages.remove(0),
            }))
        }
    }

    struct FixedPagesFactory(Vec<Vec<Reference>>);

    impl IndexAdapterFactory for FixedPagesFactory {
        fn create(&self, _config: &JobConfig) -> Box<dyn crate::collaborators::IndexAdapter> {
            Box::new(FixedPages {
                pages: Mutex::new(self.0.clone()),
            })
        }
    }

    struct EchoHttpClient;

    #[async_trait]
    impl HttpClient for EchoHttpClient {
        async fn get(
            &self,
            _url: &str,
            _headers: &BTreeMap<String, String>,
            _timeouts: HttpTimeouts,
            _kill_switch: &KillSwitch,
        ) -> Result<HttpResponse, NetworkError> {
            Ok(HttpResponse {
                status: 200,
                headers: BTreeMap::new(),
                body: Bytes::from_static(b"stub"),
            })
        }
    }

    struct StubParser;

    #[async_trait]
    impl Parser for StubParser {
        async fn parse(&self, _bytes: Bytes, _content_type: &str, url: &str) -> ParseResult {
            ParseResult {
                document: Some(Document {
                    id: url.to_string(),
                    source_id: SourceId::NationalGazette,
                    external_id: url.to_string(),
                    title: "t".to_string(),
                    publication_date: None,
                    category: None,
                    scope: None,
                    status: None,
                    articles: vec![],
                    reforms: vec![],
                    raw_blob_ref: None,
                }),
                extra_refs: vec![],
                errors: vec![],
            }
        }
    }

    #[derive(Default)]
    struct InMemoryStorage {
        saved: Mutex<BTreeMap<String, Document>>,
        checkpoints: Mutex<BTreeMap<String, Checkpoint>>,
    }

    #[async_trait]
    impl Storage for InMemoryStorage {
        async fn save(&self, key: &crate::collaborators::StorageKey, record: &Document) -> Result<(), CollaboratorError> {
            self.saved.lock().unwrap().insert(key.external_id.clone(), record.clone());
            Ok(())
        }

        async fn exists(&self, key: &crate::collaborators::StorageKey) -> Result<bool, CollaboratorError> {
            Ok(self.saved.lock().unwrap().contains_key(&key.external_id))
        }

        async fn load_checkpoint(&self, session_id: &str) -> Result<Option<Checkpoint>, CollaboratorError> {
            Ok(self.checkpoints.lock().unwrap().get(session_id).cloned())
        }

        async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), CollaboratorError> {
            self.checkpoints
                .lock()
                .unwrap()
                .insert(checkpoint.session_id.clone(), checkpoint.clone());
            Ok(())
        }
    }

    fn make_reference(id: &str) -> Reference {
        Reference {
            source_id: SourceId::NationalGazette,
            external_id: id.to_string(),
            url: format!("https://example.test/{id}"),
            title: None,
            opaque_metadata: BTreeMap::new(),
        }
    }

    fn deps(pages: Vec<Vec<Reference>>) -> PipelineDependencies {
        PipelineDependencies {
            http_client: Arc::new(EchoHttpClient),
            parser: Arc::new(StubParser),
            storage: Arc::new(InMemoryStorage::default()),
            object_store: None,
            index_adapter_factory: Arc::new(FixedPagesFactory(pages)),
        }
    }

    #[tokio::test]
    async fn happy_path_discovers_fetches_and_completes() {
        let references = vec![make_reference("a"), make_reference("b")];
        let coordinator = Coordinator::new(
            "job-1".to_string(),
            deps(vec![references]),
            LogRing::new(64),
        );
        let (mailbox, handle) = spawn_actor(coordinator).spawn();

        let config = JobConfig::new(SourceId::NationalGazette, DiscoveryMode::Today, "/tmp/out".into());
        mailbox.ask(Start(config)).await.unwrap().unwrap();

        let mut status = mailbox.ask(GetStatus).await.unwrap();
        for _ in 0..200 {
            if status.state.is_terminal() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            status = mailbox.ask(GetStatus).await.unwrap();
        }

        assert_eq!(status.state, PipelineState::Completed);
        assert_eq!(status.progress.downloaded, 2);
        assert_eq!(status.progress.errors, 0);
        drop(mailbox);
        handle.quit().await;
    }

    #[tokio::test]
    async fn max_results_zero_completes_with_nothing_discovered() {
        let coordinator = Coordinator::new(
            "job-2".to_string(),
            deps(vec![vec![make_reference("a")]]),
            LogRing::new(64),
        );
        let (mailbox, handle) = spawn_actor(coordinator).spawn();

        let mut config = JobConfig::new(SourceId::NationalGazette, DiscoveryMode::Today, "/tmp/out".into());
        config.max_results = Some(0);
        mailbox.ask(Start(config)).await.unwrap().unwrap();

        let mut status = mailbox.ask(GetStatus).await.unwrap();
        for _ in 0..200 {
            if status.state.is_terminal() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            status = mailbox.ask(GetStatus).await.unwrap();
        }
        assert_eq!(status.state, PipelineState::Completed);
        assert_eq!(status.progress.discovered, 0);
        drop(mailbox);
        handle.quit().await;
    }

    #[tokio::test]
    async fn cancel_mid_flight_transitions_to_completed_with_cancelled_flag() {
        let coordinator = Coordinator::new(
            "job-3".to_string(),
            deps(vec![vec![make_reference("a"), make_reference("b"), make_reference("c")]]),
            LogRing::new(64),
        );
        let (mailbox, handle) = spawn_actor(coordinator).spawn();

        let config = JobConfig::new(SourceId::NationalGazette, DiscoveryMode::Today, "/tmp/out".into());
        mailbox.ask(Start(config)).await.unwrap().unwrap();
        mailbox.ask(Cancel).await.unwrap().unwrap();

        let mut status = mailbox.ask(GetStatus).await.unwrap();
        for _ in 0..200 {
            if status.state.is_terminal() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            status = mailbox.ask(GetStatus).await.unwrap();
        }
        assert_eq!(status.state, PipelineState::Completed);
        assert!(status.cancelled);
        drop(mailbox);
        handle.quit().await;
    }

    #[tokio::test]
    async fn pause_then_resume_drains_the_buffered_queue() {
        let coordinator = Coordinator::new(
            "job-4".to_string(),
            deps(vec![vec![make_reference("a")]]),
            LogRing::new(64),
        );
        let (mailbox, handle) = spawn_actor(coordinator).spawn();

        let mut config = JobConfig::new(SourceId::NationalGazette, DiscoveryMode::Today, "/tmp/out".into());
        config.concurrency = 1;
        mailbox.ask(Start(config)).await.unwrap().unwrap();

        // Give discovery a moment to transition out of `Discovering`.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let _ = mailbox.ask(Pause).await;
        let _ = mailbox.ask(Resume).await;

        let mut status = mailbox.ask(GetStatus).await.unwrap();
        for _ in 0..200 {
            if status.state.is_terminal() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            status = mailbox.ask(GetStatus).await.unwrap();
        }
        assert_eq!(status.state, PipelineState::Completed);
        drop(mailbox);
        handle.quit().await;
    }
}
