//! End-to-end scenarios driving a full `Coordinator` through its actors
//! against in-memory collaborators: no network, no filesystem.

use std::sync::Arc;
use std::time::Duration;

use lexsource_actors::spawn_actor;
use lexsource_config::{DiscoveryMode, JobConfig, SourceId};
use lexsource_core::testutil::{
    make_reference, EchoHttpClient, FailingIndexFactory, FixedPagesFactory, FlakyHttpClient,
    FlakyStatusHttpClient, InMemoryStorage, NotFoundHttpClient, StubParser,
};
use lexsource_core::{CollaboratorError, Coordinator, GetStatus, PipelineDependencies, PipelineState, Start};

async fn poll_until_terminal(
    mailbox: &lexsource_actors::Mailbox<Coordinator>,
) -> lexsource_core::StatusSnapshot {
    let mut status = mailbox.ask(GetStatus).await.unwrap();
    for _ in 0..500 {
        if status.state.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        status = mailbox.ask(GetStatus).await.unwrap();
    }
    status
}

#[tokio::test]
async fn happy_path_downloads_every_discovered_reference() {
    let references = vec![make_reference("a"), make_reference("b"), make_reference("c")];
    let storage = Arc::new(InMemoryStorage::default());
    let deps = PipelineDependencies {
        http_client: Arc::new(EchoHttpClient),
        parser: Arc::new(StubParser),
        storage: storage.clone(),
        object_store: None,
        index_adapter_factory: Arc::new(FixedPagesFactory(vec![references])),
    };
    let coordinator = Coordinator::new("job-happy".to_string(), deps, lexsource_common::LogRing::new(64));
    let (mailbox, handle) = spawn_actor(coordinator).spawn();

    let config = JobConfig::new(SourceId::NationalGazette, DiscoveryMode::Today, "/tmp/out".into());
    mailbox.ask(Start(config)).await.unwrap().unwrap();

    let status = poll_until_terminal(&mailbox).await;
    assert_eq!(status.state, PipelineState::Completed);
    assert_eq!(status.progress.downloaded, 3);
    assert_eq!(status.progress.errors, 0);
    assert_eq!(storage.saved_ids().len(), 3);

    handle.quit().await;
}

#[tokio::test]
async fn transient_network_failures_are_retried_until_they_succeed() {
    let reference = make_reference("flaky");
    let storage = Arc::new(InMemoryStorage::default());
    let deps = PipelineDependencies {
        http_client: Arc::new(FlakyHttpClient::new(2, vec![reference.url.clone()])),
        parser: Arc::new(StubParser),
        storage: storage.clone(),
        object_store: None,
        index_adapter_factory: Arc::new(FixedPagesFactory(vec![vec![reference]])),
    };
    let coordinator = Coordinator::new("job-flaky".to_string(), deps, lexsource_common::LogRing::new(64));
    let (mailbox, handle) = spawn_actor(coordinator).spawn();

    let mut config = JobConfig::new(SourceId::NationalGazette, DiscoveryMode::Today, "/tmp/out".into());
    config.retry_policy.base = Duration::ZERO;
    config.retry_policy.max_attempts = 5;
    mailbox.ask(Start(config)).await.unwrap().unwrap();

    let status = poll_until_terminal(&mailbox).await;
    assert_eq!(status.state, PipelineState::Completed);
    assert_eq!(status.progress.downloaded, 1);
    assert_eq!(status.progress.errors, 0);

    handle.quit().await;
}

#[tokio::test]
async fn per_item_terminal_errors_are_recorded_without_failing_the_job() {
    let references = vec![make_reference("good"), make_reference("missing")];
    let storage = Arc::new(InMemoryStorage::default());
    let deps = PipelineDependencies {
        http_client: Arc::new(NotFoundHttpClient),
        parser: Arc::new(StubParser),
        storage: storage.clone(),
        object_store: None,
        index_adapter_factory: Arc::new(FixedPagesFactory(vec![references])),
    };
    let coordinator = Coordinator::new("job-404".to_string(), deps, lexsource_common::LogRing::new(64));
    let (mailbox, handle) = spawn_actor(coordinator).spawn();

    let mut config = JobConfig::new(SourceId::NationalGazette, DiscoveryMode::Today, "/tmp/out".into());
    config.retry_policy.max_attempts = 1;
    mailbox.ask(Start(config)).await.unwrap().unwrap();

    let status = poll_until_terminal(&mailbox).await;
    assert_eq!(status.state, PipelineState::Completed);
    assert_eq!(status.progress.downloaded, 0);
    assert_eq!(status.progress.errors, 2);
    assert_eq!(status.progress.discovered, 2);

    handle.quit().await;
}

#[tokio::test]
async fn a_503_twice_then_200_retries_as_transient_and_still_downloads() {
    let references: Vec<_> = (1..=5).map(|n| make_reference(&format!("r{n}"))).collect();
    let flaky_url = references[2].url.clone();
    let http_client = Arc::new(FlakyStatusHttpClient::new(503, 2, vec![flaky_url]));
    let storage = Arc::new(InMemoryStorage::default());
    let deps = PipelineDependencies {
        http_client: http_client.clone(),
        parser: Arc::new(StubParser),
        storage: storage.clone(),
        object_store: None,
        index_adapter_factory: Arc::new(FixedPagesFactory(vec![references])),
    };
    let coordinator = Coordinator::new("job-503".to_string(), deps, lexsource_common::LogRing::new(64));
    let (mailbox, handle) = spawn_actor(coordinator).spawn();

    let mut config = JobConfig::new(SourceId::NationalGazette, DiscoveryMode::Today, "/tmp/out".into());
    config.retry_policy.base = Duration::ZERO;
    mailbox.ask(Start(config)).await.unwrap().unwrap();

    let status = poll_until_terminal(&mailbox).await;
    assert_eq!(status.state, PipelineState::Completed);
    assert_eq!(status.progress.downloaded, 5);
    assert_eq!(status.progress.errors, 0);
    // 4 references succeed on the first attempt, the flaky one takes 3.
    assert_eq!(http_client.total_calls(), 7);

    handle.quit().await;
}

#[tokio::test]
async fn resuming_from_a_checkpoint_skips_previously_downloaded_ids() {
    let storage = Arc::new(InMemoryStorage::default());
    let mut checkpoint = lexsource_core::Checkpoint::new("resume-downloaded".to_string(), chrono::Utc::now());
    for id in ["a", "b", "c", "d"] {
        checkpoint.downloaded_ids.insert(id.to_string());
    }
    storage.seed_checkpoint(checkpoint);

    // Discovery re-scans the full 10-reference source on resume; only the
    // 6 ids missing from the checkpoint's downloaded set should be fetched.
    let references: Vec<_> = (1..=10)
        .map(|n| make_reference(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"][n - 1]))
        .collect();
    let deps = PipelineDependencies {
        http_client: Arc::new(EchoHttpClient),
        parser: Arc::new(StubParser),
        storage: storage.clone(),
        object_store: None,
        index_adapter_factory: Arc::new(FixedPagesFactory(vec![references])),
    };
    let coordinator = Coordinator::new("job-resume-downloaded".to_string(), deps, lexsource_common::LogRing::new(64));
    let (mailbox, handle) = spawn_actor(coordinator).spawn();

    let mut config = JobConfig::new(SourceId::NationalGazette, DiscoveryMode::Today, "/tmp/out".into());
    config.checkpoint_id = Some("resume-downloaded".to_string());
    mailbox.ask(Start(config)).await.unwrap().unwrap();

    let status = poll_until_terminal(&mailbox).await;
    assert_eq!(status.state, PipelineState::Completed);
    assert_eq!(status.progress.downloaded, 4 + 6);
    assert_eq!(status.progress.errors, 0);
    // Only the 6 ids absent from the checkpoint are ever fetched/saved.
    let mut saved = storage.saved_ids();
    saved.sort();
    assert_eq!(saved, vec!["e", "f", "g", "h", "i", "j"]);

    handle.quit().await;
}

#[tokio::test]
async fn an_unreachable_index_fails_the_job() {
    let deps = PipelineDependencies {
        http_client: Arc::new(EchoHttpClient),
        parser: Arc::new(StubParser),
        storage: Arc::new(InMemoryStorage::default()),
        object_store: None,
        index_adapter_factory: Arc::new(FailingIndexFactory(CollaboratorError::Transient(
            "index host unreachable".to_string(),
        ))),
    };
    let mut config = JobConfig::new(SourceId::NationalGazette, DiscoveryMode::Today, "/tmp/out".into());
    config.retry_policy.base = Duration::ZERO;
    config.retry_policy.max_attempts = 1;

    let coordinator = Coordinator::new("job-unreachable".to_string(), deps, lexsource_common::LogRing::new(64));
    let (mailbox, handle) = spawn_actor(coordinator).spawn();
    mailbox.ask(Start(config)).await.unwrap().unwrap();

    let status = poll_until_terminal(&mailbox).await;
    assert_eq!(status.state, PipelineState::Failed);

    handle.quit().await;
}

#[tokio::test]
async fn resuming_from_a_checkpoint_skips_previously_failed_ids() {
    let storage = Arc::new(InMemoryStorage::default());
    let mut checkpoint = lexsource_core::Checkpoint::new("resume-session".to_string(), chrono::Utc::now());
    checkpoint.failed_ids.insert("already-failed".to_string());
    storage.seed_checkpoint(checkpoint);

    let references = vec![make_reference("already-failed"), make_reference("new-one")];
    let deps = PipelineDependencies {
        http_client: Arc::new(EchoHttpClient),
        parser: Arc::new(StubParser),
        storage: storage.clone(),
        object_store: None,
        index_adapter_factory: Arc::new(FixedPagesFactory(vec![references])),
    };
    let coordinator = Coordinator::new("job-resume".to_string(), deps, lexsource_common::LogRing::new(64));
    let (mailbox, handle) = spawn_actor(coordinator).spawn();

    let mut config = JobConfig::new(SourceId::NationalGazette, DiscoveryMode::Today, "/tmp/out".into());
    config.checkpoint_id = Some("resume-session".to_string());
    mailbox.ask(Start(config)).await.unwrap().unwrap();

    let status = poll_until_terminal(&mailbox).await;
    assert_eq!(status.state, PipelineState::Completed);
    // "already-failed" is skipped as already-seen; only "new-one" is fetched.
    assert_eq!(status.progress.downloaded, 1);
    assert_eq!(storage.saved_ids(), vec!["new-one".to_string()]);

    handle.quit().await;
}
