//! Fetch Worker actor (§4.4): downloads one reference's bytes, hands the
//! parsed result to Persistence, and reports the outcome to the Coordinator.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use lexsource_actors::{Actor, ActorContext, ActorExitStatus, Handler, Mailbox};
use lexsource_common::BackoffPolicy;

use crate::collaborators::{HttpClient, HttpTimeouts, NetworkError, Parser};
use crate::messages::{EnqueueReference, Fetch, FetchedOk, FetchFailed, SaveDocument};
use crate::rate_limiter::RateLimiter;
use crate::Coordinator;
use crate::PersistenceActor;

/// Rotated across requests so a source doesn't see identical consecutive
/// User-Agent headers (§4.4 "applies ... user-agent rotation").
const USER_AGENTS: &[&str] = &[
    "lexsource/0.1 (+fetch-worker; variant a)",
    "lexsource/0.1 (+fetch-worker; variant b)",
    "lexsource/0.1 (+fetch-worker; variant c)",
];

#[derive(Clone, Copy, Debug, Default)]
pub struct FetchWorkerCounters {
    pub fetched: u64,
    pub failed: u64,
}

pub struct FetchWorker {
    http_client: Arc<dyn HttpClient>,
    parser: Arc<dyn Parser>,
    rate_limiter: Arc<RateLimiter>,
    persistence: Mailbox<PersistenceActor>,
    coordinator: Mailbox<Coordinator>,
    retry_policy: BackoffPolicy,
    download_payloads: bool,
    request_count: u64,
    counters: FetchWorkerCounters,
}

impl FetchWorker {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        parser: Arc<dyn Parser>,
        rate_limiter: Arc<RateLimiter>,
        persistence: Mailbox<PersistenceActor>,
        coordinator: Mailbox<Coordinator>,
        retry_policy: BackoffPolicy,
        download_payloads: bool,
    ) -> Self {
        FetchWorker {
            http_client,
            parser,
            rate_limiter,
            persistence,
            coordinator,
            retry_policy,
            download_payloads,
            request_count: 0,
            counters: FetchWorkerCounters::default(),
        }
    }

    fn next_user_agent(&mut self) -> &'static str {
        let agent = USER_AGENTS[(self.request_count as usize) % USER_AGENTS.len()];
        self.request_count += 1;
        agent
    }

    async fn fetch(&mut self, reference: crate::model::Reference, ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus> {
        for attempt in 0..self.retry_policy.max_attempts {
            if ctx.kill_switch().is_dead() {
                return self.report_failure(reference.external_id, "cancelled".to_string()).await;
            }
            if self.rate_limiter.acquire(ctx.kill_switch()).await.is_err() {
                return self.report_failure(reference.external_id, "cancelled".to_string()).await;
            }

            let mut headers = BTreeMap::new();
            headers.insert("User-Agent".to_string(), self.next_user_agent().to_string());

            let response = self
                .http_client
                .get(&reference.url, &headers, HttpTimeouts::default(), ctx.kill_switch())
                .await;

            match response {
                Ok(response) if response.status / 100 == 2 => {
                    let content_type = response
                        .headers
                        .get("content-type")
                        .cloned()
                        .unwrap_or_else(|| "application/octet-stream".to_string());
                    let raw_body = response.body.clone();
                    let parsed = self.parser.parse(response.body, &content_type, &reference.url).await;

                    if !parsed.errors.is_empty() {
                        debug!(external_id = %reference.external_id, errors = ?parsed.errors, "parser reported non-fatal issues");
                    }

                    let Some(document) = parsed.document else {
                        return self
                            .report_failure(
                                reference.external_id,
                                format!("parser produced no document: {:?}", parsed.errors),
                            )
                            .await;
                    };

                    let raw_blob = if self.download_payloads {
                        Some((format!("{}/{}", reference.source_id.as_str(), reference.external_id), raw_body))
                    } else {
                        None
                    };

                    if self
                        .persistence
                        .send_message(SaveDocument { document, raw_blob })
                        .await
                        .is_err()
                    {
                        return Err(ActorExitStatus::DownstreamClosed);
                    }

                    if self.download_payloads {
                        for extra in parsed.extra_refs {
                            let _ = self.coordinator.send_message(EnqueueReference(extra)).await;
                        }
                    }

                    self.counters.fetched += 1;
                    let _ = self
                        .coordinator
                        .send_message(FetchedOk(reference.external_id))
                        .await;
                    return Ok(());
                }
                Ok(response) if response.status / 100 == 5 => {
                    // 5xx: transient, retried with backoff like a network error (§4.4, §7).
                    if attempt + 1 == self.retry_policy.max_attempts {
                        return self
                            .report_failure(reference.external_id, format!("http status {}", response.status))
                            .await;
                    }
                    warn!(external_id = %reference.external_id, attempt, status = response.status, "fetch got a server error, retrying");
                    tokio::time::sleep(self.retry_policy.delay_for_attempt(attempt)).await;
                }
                Ok(response) => {
                    // 3xx/4xx: per-item terminal, no retry (§7).
                    return self
                        .report_failure(reference.external_id, format!("http status {}", response.status))
                        .await;
                }
                Err(NetworkError::Cancelled) => {
                    return self.report_failure(reference.external_id, "cancelled".to_string()).await;
                }
                Err(err) => {
                    if attempt + 1 == self.retry_policy.max_attempts {
                        return self.report_failure(reference.external_id, err.to_string()).await;
                    }
                    warn!(external_id = %reference.external_id, attempt, error = %err, "fetch failed, retrying");
                    tokio::time::sleep(self.retry_policy.delay_for_attempt(attempt)).await;
                }
            }
        }
        self.report_failure(reference.external_id, "retries exhausted".to_string()).await
    }

    async fn report_failure(&mut self, external_id: String, reason: String) -> Result<(), ActorExitStatus> {
        self.counters.failed += 1;
        if self
            .coordinator
            .send_message(FetchFailed { external_id, reason })
            .await
            .is_err()
        {
            return Err(ActorExitStatus::DownstreamClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl Actor for FetchWorker {
    type ObservableState = FetchWorkerCounters;

    fn observable_state(&self) -> FetchWorkerCounters {
        self.counters
    }

    fn name(&self) -> String {
        "FetchWorker".to_string()
    }
}

#[async_trait]
impl Handler<Fetch> for FetchWorker {
    type Reply = ();

    async fn handle(&mut self, message: Fetch, ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus> {
        self.fetch(message.0, ctx).await
    }
}
