//! Fakes shared by this crate's unit tests and by `tests/pipeline.rs`.
//! Gated behind `cfg(test)` for in-crate use and the `testsuite` feature so
//! the integration test binary can depend on them too.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use lexsource_actors::KillSwitch;
use lexsource_config::SourceId;

use crate::checkpoint::Checkpoint;
use crate::collaborators::{
    HttpClient, HttpResponse, HttpTimeouts, IndexAdapter, IndexPage, NetworkError, ObjectStore,
    ParseResult, Parser, Storage, StorageKey,
};
use crate::error::CollaboratorError;
use crate::model::{Document, Reference};
use crate::source_registry::IndexAdapterFactory;

pub fn make_reference(id: &str) -> Reference {
    Reference {
        source_id: SourceId::NationalGazette,
        external_id: id.to_string(),
        url: format!("https://example.test/{id}"),
        title: None,
        opaque_metadata: BTreeMap::new(),
    }
}

/// Serves a fixed sequence of pages, one per call, then `None` forever.
pub struct FixedPages {
    pages: Mutex<VecDeque<Vec<Reference>>>,
}

#[async_trait]
impl IndexAdapter for FixedPages {
    async fn next_page(&mut self) -> Result<Option<IndexPage>, CollaboratorError> {
        let mut pages = self.pages.lock().unwrap();
        match pages.pop_front() {
            Some(candidates) => Ok(Some(IndexPage { candidates })),
            None => Ok(None),
        }
    }
}

pub struct FixedPagesFactory(pub Vec<Vec<Reference>>);

impl IndexAdapterFactory for FixedPagesFactory {
    fn create(&self, _config: &lexsource_config::JobConfig) -> Box<dyn IndexAdapter> {
        Box::new(FixedPages {
            pages: Mutex::new(self.0.clone().into()),
        })
    }
}

/// An adapter whose single `next_page` call always fails, simulating an
/// index that is unreachable from the very first page.
pub struct FailingIndex(pub CollaboratorError);

#[async_trait]
impl IndexAdapter for FailingIndex {
    async fn next_page(&mut self) -> Result<Option<IndexPage>, CollaboratorError> {
        Err(self.0.clone())
    }
}

pub struct FailingIndexFactory(pub CollaboratorError);

impl IndexAdapterFactory for FailingIndexFactory {
    fn create(&self, _config: &lexsource_config::JobConfig) -> Box<dyn IndexAdapter> {
        Box::new(FailingIndex(self.0.clone()))
    }
}

/// Always returns a fixed 200 response with a constant body.
pub struct EchoHttpClient;

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

/// Fails the first `fails_remaining` calls for a given URL with a transient
/// network error, then succeeds; used to exercise the Fetch Worker's
/// backoff-and-retry path without sleeping through a real timeout.
pub struct FlakyHttpClient {
    fails_remaining: Mutex<BTreeMap<String, u32>>,
}

impl FlakyHttpClient {
    pub fn new(fails_per_url: u32, urls: impl IntoIterator<Item = String>) -> Self {
        let counts = urls.into_iter().map(|u| (u, fails_per_url)).collect();
        FlakyHttpClient {
            fails_remaining: Mutex::new(counts),
        }
    }
}

#[async_trait]
impl HttpClient for FlakyHttpClient {
    async fn get(
        &self,
        url: &str,
        _headers: &BTreeMap<String, String>,
        _timeouts: HttpTimeouts,
        _kill_switch: &KillSwitch,
    ) -> Result<HttpResponse, NetworkError> {
        let mut remaining = self.fails_remaining.lock().unwrap();
        if let Some(count) = remaining.get_mut(url) {
            if *count > 0 {
                *count -= 1;
                return Err(NetworkError::Connection("simulated outage".to_string()));
            }
        }
        Ok(HttpResponse {
            status: 200,
            headers: BTreeMap::new(),
            body: Bytes::from_static(b"stub"),
        })
    }
}

/// Returns a fixed HTTP status (e.g. 503) for the first `fails_remaining`
/// calls to a given URL, then 200; unlike [`FlakyHttpClient`] the failure
/// is a status code, not a transport error, for exercising the 5xx
/// transient-retry path literally.
pub struct FlakyStatusHttpClient {
    status: u16,
    fails_remaining: Mutex<BTreeMap<String, u32>>,
    total_calls: AtomicU64,
}

impl FlakyStatusHttpClient {
    pub fn new(status: u16, fails_per_url: u32, urls: impl IntoIterator<Item = String>) -> Self {
        let counts = urls.into_iter().map(|u| (u, fails_per_url)).collect();
        FlakyStatusHttpClient {
            status,
            fails_remaining: Mutex::new(counts),
            total_calls: AtomicU64::new(0),
        }
    }

    /// Total number of `get` calls observed across all URLs, including
    /// retries — lets a test assert on total request count, not just the
    /// final outcome.
    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpClient for FlakyStatusHttpClient {
    async fn get(
        &self,
        url: &str,
        _headers: &BTreeMap<String, String>,
        _timeouts: HttpTimeouts,
        _kill_switch: &KillSwitch,
    ) -> Result<HttpResponse, NetworkError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        let mut remaining = self.fails_remaining.lock().unwrap();
        if let Some(count) = remaining.get_mut(url) {
            if *count > 0 {
                *count -= 1;
                return Ok(HttpResponse {
                    status: self.status,
                    headers: BTreeMap::new(),
                    body: Bytes::new(),
                });
            }
        }
        Ok(HttpResponse {
            status: 200,
            headers: BTreeMap::new(),
            body: Bytes::from_static(b"stub"),
        })
    }
}

/// Always reports a 404-shaped client error, for exercising the per-item
/// terminal-error path.
pub struct NotFoundHttpClient;

#[async_trait]
impl HttpClient for NotFoundHttpClient {
    async fn get(
        &self,
        _url: &str,
        _headers: &BTreeMap<String, String>,
        _timeouts: HttpTimeouts,
        _kill_switch: &KillSwitch,
    ) -> Result<HttpResponse, NetworkError> {
        Ok(HttpResponse {
            status: 404,
            headers: BTreeMap::new(),
            body: Bytes::new(),
        })
    }
}

pub struct StubParser;

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
pub struct InMemoryStorage {
    saved: Mutex<BTreeMap<String, Document>>,
    checkpoints: Mutex<BTreeMap<String, Checkpoint>>,
}

impl InMemoryStorage {
    pub fn saved_ids(&self) -> Vec<String> {
        self.saved.lock().unwrap().keys().cloned().collect()
    }

    pub fn checkpoint(&self, session_id: &str) -> Option<Checkpoint> {
        self.checkpoints.lock().unwrap().get(session_id).cloned()
    }

    pub fn seed_checkpoint(&self, checkpoint: Checkpoint) {
        self.checkpoints
            .lock()
            .unwrap()
            .insert(checkpoint.session_id.clone(), checkpoint);
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn save(&self, key: &StorageKey, record: &Document) -> Result<(), CollaboratorError> {
        self.saved
            .lock()
            .unwrap()
            .insert(key.external_id.clone(), record.clone());
        Ok(())
    }

    async fn exists(&self, key: &StorageKey) -> Result<bool, CollaboratorError> {
        Ok(self.saved.lock().unwrap().contains_key(&key.external_id))
    }

    async fn load_checkpoint(
        &self,
        session_id: &str,
    ) -> Result<Option<Checkpoint>, CollaboratorError> {
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

#[async_trait]
impl ObjectStore for InMemoryStorage {
    async fn put(&self, path: &str, _bytes: Bytes) -> Result<String, CollaboratorError> {
        Ok(path.to_string())
    }
}
