//! `reqwest`-backed `HttpClient`, a concrete implementation behind the
//! `HttpClient` trait; the production client is out of scope for the core
//! crate.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;

use lexsource_actors::KillSwitch;
use lexsource_core::collaborators::{HttpClient, HttpResponse, HttpTimeouts, NetworkError};

pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        ReqwestHttpClient { client: Client::new() }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        timeouts: HttpTimeouts,
        kill_switch: &KillSwitch,
    ) -> Result<HttpResponse, NetworkError> {
        let mut request = self.client.get(url).timeout(timeouts.total);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = tokio::select! {
            biased;
            _ = kill_switch.wait() => return Err(NetworkError::Cancelled),
            result = request.send() => result,
        };

        let response = response.map_err(|err| {
            if err.is_timeout() {
                NetworkError::Timeout
            } else {
                NetworkError::Connection(err.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|err| NetworkError::Connection(err.to_string()))?;

        Ok(HttpResponse { status, headers, body })
    }
}
