//! Discovery actor (§4.5): paginates a source's index into `Reference`s,
//! deduplicating against the job's seen-set before handing work to the
//! Coordinator.

use async_trait::async_trait;
use tracing::warn;

use lexsource_actors::{Actor, ActorContext, ActorExitStatus, Handler, Mailbox};
use lexsource_common::BackoffPolicy;

use crate::collaborators::IndexAdapter;
use crate::error::CollaboratorError;
use crate::messages::{DiscoveryFailed, DiscoveryFinished, EnqueueReference, IsSeen};
use crate::rate_limiter::RateLimiter;
use crate::Coordinator;

#[derive(Clone, Copy, Debug, Default)]
pub struct DiscoveryCounters {
    pub discovered: u64,
    pub duplicates_dropped: u64,
}

#[derive(Debug)]
struct PollPage;

pub struct DiscoveryActor {
    adapter: Box<dyn IndexAdapter>,
    coordinator: Mailbox<Coordinator>,
    rate_limiter: std::sync::Arc<RateLimiter>,
    retry_policy: BackoffPolicy,
    max_results: Option<usize>,
    counters: DiscoveryCounters,
}

impl DiscoveryActor {
    pub fn new(
        adapter: Box<dyn IndexAdapter>,
        coordinator: Mailbox<Coordinator>,
        rate_limiter: std::sync::Arc<RateLimiter>,
        retry_policy: BackoffPolicy,
        max_results: Option<usize>,
    ) -> Self {
        DiscoveryActor {
            adapter,
            coordinator,
            rate_limiter,
            retry_policy,
            max_results,
            counters: DiscoveryCounters::default(),
        }
    }

    fn hit_max_results(&self) -> bool {
        matches!(self.max_results, Some(max) if self.counters.discovered as usize >= max)
    }

    async fn poll_page(&mut self, ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus> {
        if ctx.kill_switch().is_dead() {
            let _ = self.coordinator.send_message(DiscoveryFinished).await;
            return Err(ActorExitStatus::Killed);
        }
        if self.hit_max_results() {
            let _ = self.coordinator.send_message(DiscoveryFinished).await;
            return Err(ActorExitStatus::Quit);
        }
        if self.rate_limiter.acquire(ctx.kill_switch()).await.is_err() {
            let _ = self.coordinator.send_message(DiscoveryFinished).await;
            return Err(ActorExitStatus::Killed);
        }

        let mut page = None;
        for attempt in 0..self.retry_policy.max_attempts {
            match self.adapter.next_page().await {
                Ok(result) => {
                    page = Some(result);
                    break;
                }
                Err(CollaboratorError::Terminal { reason, .. }) => {
                    let _ = self.coordinator.send_message(DiscoveryFailed(reason)).await;
                    return Err(ActorExitStatus::Failure(std::sync::Arc::new(anyhow::anyhow!(
                        "discovery index unreachable"
                    ))));
                }
                Err(CollaboratorError::Transient(reason)) => {
                    if attempt + 1 == self.retry_policy.max_attempts {
                        let _ = self.coordinator.send_message(DiscoveryFailed(reason)).await;
                        return Err(ActorExitStatus::Failure(std::sync::Arc::new(anyhow::anyhow!(
                            "discovery index unreachable after retries"
                        ))));
                    }
                    warn!(attempt, reason = %reason, "discovery page fetch failed, retrying");
                    tokio::time::sleep(self.retry_policy.delay_for_attempt(attempt)).await;
                }
            }
        }

        match page.expect("loop always assigns or returns") {
            None => {
                let _ = self.coordinator.send_message(DiscoveryFinished).await;
                Err(ActorExitStatus::Quit)
            }
            Some(index_page) => {
                for candidate in index_page.candidates {
                    if self.hit_max_results() {
                        break;
                    }
                    let already_seen = ctx
                        .ask(&self.coordinator, IsSeen(candidate.external_id.clone()))
                        .await
                        .unwrap_or(true);
                    if already_seen {
                        self.counters.duplicates_dropped += 1;
                        continue;
                    }
                    if self
                        .coordinator
                        .send_message(EnqueueReference(candidate))
                        .await
                        .is_err()
                    {
                        return Err(ActorExitStatus::DownstreamClosed);
                    }
                    self.counters.discovered += 1;
                }
                ctx.send_self_message(PollPage)
                    .await
                    .map_err(|_| ActorExitStatus::DownstreamClosed)?;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Actor for DiscoveryActor {
    type ObservableState = DiscoveryCounters;

    fn observable_state(&self) -> DiscoveryCounters {
        self.counters
    }

    fn name(&self) -> String {
        "Discovery".to_string()
    }

    async fn initialize(&mut self, ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus> {
        self.poll_page(ctx).await
    }
}

#[async_trait]
impl Handler<PollPage> for DiscoveryActor {
    type Reply = ();

    async fn handle(&mut self, _message: PollPage, ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus> {
        self.poll_page(ctx).await
    }
}
