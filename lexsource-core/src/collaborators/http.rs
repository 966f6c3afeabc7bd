use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use lexsource_actors::KillSwitch;

/// Total request timeout and connect timeout (§5), each with a conservative
/// default.
#[derive(Clone, Copy, Debug)]
pub struct HttpTimeouts {
    pub total: Duration,
    pub connect: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        HttpTimeouts {
            total: Duration::from_secs(30),
            connect: Duration::from_secs(10),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("request timed out")]
    Timeout,
    #[error("dns or connection error: {0}")]
    Connection(String),
    #[error("request was cancelled")]
    Cancelled,
}

/// §6 HTTP collaborator. Implementations live outside this crate (a
/// `reqwest`-backed client in production, an in-memory fake in tests); the
/// Fetch Worker and Discovery actor depend only on this trait.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        timeouts: HttpTimeouts,
        kill_switch: &KillSwitch,
    ) -> Result<HttpResponse, NetworkError>;
}
