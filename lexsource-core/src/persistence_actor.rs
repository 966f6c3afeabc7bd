//! Persistence actor (§4.3): writes each parsed document exactly once,
//! optionally archiving the raw fetched bytes to an object store first.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use lexsource_actors::{Actor, ActorContext, ActorExitStatus, Handler};
use lexsource_common::BackoffPolicy;

use crate::collaborators::{ObjectStore, Storage, StorageKey};
use crate::error::CollaboratorError;
use crate::messages::{Flush, PersistFailed, SaveDocument};
use crate::model::Document;
use crate::Coordinator;

#[derive(Clone, Copy, Debug, Default)]
pub struct PersistenceCounters {
    pub saved: u64,
    pub skipped_duplicate: u64,
    pub failed: u64,
}

pub struct PersistenceActor {
    storage: Arc<dyn Storage>,
    object_store: Option<Arc<dyn ObjectStore>>,
    coordinator: lexsource_actors::Mailbox<Coordinator>,
    retry_policy: BackoffPolicy,
    counters: PersistenceCounters,
}

impl PersistenceActor {
    pub fn new(
        storage: Arc<dyn Storage>,
        object_store: Option<Arc<dyn ObjectStore>>,
        coordinator: lexsource_actors::Mailbox<Coordinator>,
        retry_policy: BackoffPolicy,
    ) -> Self {
        PersistenceActor {
            storage,
            object_store,
            coordinator,
            retry_policy,
            counters: PersistenceCounters::default(),
        }
    }

    async fn persist(&mut self, mut document: Document, raw_blob: Option<(String, bytes::Bytes)>) {
        let key = StorageKey::new(document.source_id.as_str(), document.external_id.clone());

        match self.storage.exists(&key).await {
            Ok(true) => {
                debug!(external_id = %key.external_id, "document already persisted, skipping");
                self.counters.skipped_duplicate += 1;
                return;
            }
            Ok(false) => {}
            Err(err) => {
                warn!(external_id = %key.external_id, error = %err, "exists() check failed, attempting save anyway");
            }
        }

        if let (Some(object_store), Some((path, bytes))) = (&self.object_store, raw_blob) {
            match object_store.put(&path, bytes).await {
                Ok(blob_ref) => document.raw_blob_ref = Some(blob_ref),
                Err(err) => {
                    warn!(external_id = %key.external_id, error = %err, "raw blob archival failed, persisting record without it");
                }
            }
        }

        for attempt in 0..self.retry_policy.max_attempts {
            match self.storage.save(&key, &document).await {
                Ok(()) => {
                    self.counters.saved += 1;
                    return;
                }
                Err(CollaboratorError::Terminal { reason, .. }) => {
                    self.fail(&key.external_id, reason).await;
                    return;
                }
                Err(CollaboratorError::Transient(reason)) => {
                    if attempt + 1 == self.retry_policy.max_attempts {
                        self.fail(&key.external_id, reason).await;
                        return;
                    }
                    tokio::time::sleep(self.retry_policy.delay_for_attempt(attempt)).await;
                }
            }
        }
    }

    async fn fail(&mut self, external_id: &str, reason: String) {
        self.counters.failed += 1;
        let _ = self
            .coordinator
            .send_message(PersistFailed {
                external_id: external_id.to_string(),
                reason,
            })
            .await;
    }
}

#[async_trait]
impl Actor for PersistenceActor {
    type ObservableState = PersistenceCounters;

    fn observable_state(&self) -> PersistenceCounters {
        self.counters
    }

    fn name(&self) -> String {
        "Persistence".to_string()
    }
}

#[async_trait]
impl Handler<SaveDocument> for PersistenceActor {
    type Reply = ();

    async fn handle(
        &mut self,
        message: SaveDocument,
        _ctx: &ActorContext<Self>,
    ) -> Result<(), ActorExitStatus> {
        self.persist(message.document, message.raw_blob).await;
        Ok(())
    }
}

#[async_trait]
impl Handler<Flush> for PersistenceActor {
    type Reply = ();

    /// A no-op by construction: the actor processes `SaveDocument` messages
    /// one at a time to completion, so anything sent before this `Flush`
    /// (by the same sender) has already resolved by the time it is handled.
    async fn handle(&mut self, _message: Flush, _ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use lexsource_actors::spawn_actor;
    use lexsource_config::SourceId;

    use crate::checkpoint::Checkpoint;

    #[derive(Default)]
    struct FakeStorage {
        saved: Mutex<BTreeMap<String, Document>>,
        always_transient: bool,
    }

    #[async_trait]
    impl Storage for FakeStorage {
        async fn save(&self, key: &StorageKey, record: &Document) -> Result<(), CollaboratorError> {
            if self.always_transient {
                return Err(CollaboratorError::Transient("storage unavailable".into()));
            }
            self.saved
                .lock()
                .unwrap()
                .insert(key.external_id.clone(), record.clone());
            Ok(())
        }

        async fn exists(&self, key: &StorageKey) -> Result<bool, CollaboratorError> {
            Ok(self.saved.lock().unwrap().contains_key(&key.external_id))
        }

        async fn load_checkpoint(&self, _session_id: &str) -> Result<Option<Checkpoint>, CollaboratorError> {
            Ok(None)
        }

        async fn save_checkpoint(&self, _checkpoint: &Checkpoint) -> Result<(), CollaboratorError> {
            Ok(())
        }
    }

    fn sample_document(external_id: &str) -> Document {
        Document {
            id: format!("doc-{external_id}"),
            source_id: SourceId::NationalGazette,
            external_id: external_id.to_string(),
            title: "Title".to_string(),
            publication_date: None,
            category: None,
            scope: None,
            status: None,
            articles: vec![],
            reforms: vec![],
            raw_blob_ref: None,
        }
    }

    #[tokio::test]
    async fn second_save_of_the_same_key_is_a_no_op() {
        let storage = Arc::new(FakeStorage::default());
        let (coordinator_mailbox, coordinator_handle) = spawn_actor(crate::Coordinator::new_for_test()).spawn();
        let actor = PersistenceActor::new(storage.clone(), None, coordinator_mailbox.clone(), BackoffPolicy::default());
        let (mailbox, handle) = spawn_actor(actor).spawn();

        mailbox
            .send_message(SaveDocument {
                document: sample_document("doc-1"),
                raw_blob: None,
            })
            .await
            .unwrap();
        mailbox.ask(Flush).await.unwrap();
        mailbox
            .send_message(SaveDocument {
                document: sample_document("doc-1"),
                raw_blob: None,
            })
            .await
            .unwrap();
        mailbox.ask(Flush).await.unwrap();

        let exit_status = handle.quit().await;
        assert!(exit_status.is_success());
        drop(mailbox);
        drop(coordinator_mailbox);
        coordinator_handle.quit().await;
        assert_eq!(storage.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn transient_storage_errors_are_retried_then_reported() {
        let storage = Arc::new(FakeStorage {
            always_transient: true,
            ..Default::default()
        });
        let (coordinator_mailbox, coordinator_handle) = spawn_actor(crate::Coordinator::new_for_test()).spawn();
        let retry_policy = BackoffPolicy {
            base: std::time::Duration::ZERO,
            max_attempts: 2,
            ..Default::default()
        };
        let actor = PersistenceActor::new(storage, None, coordinator_mailbox.clone(), retry_policy);
        let (mailbox, handle) = spawn_actor(actor).spawn();

        mailbox
            .send_message(SaveDocument {
                document: sample_document("doc-2"),
                raw_blob: None,
            })
            .await
            .unwrap();
        mailbox.ask(Flush).await.unwrap();

        let exit_status = handle.quit().await;
        assert!(exit_status.is_success());
        drop(mailbox);
        drop(coordinator_mailbox);
        coordinator_handle.quit().await;
    }
}
