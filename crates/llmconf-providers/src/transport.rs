//! HTTP transport seam
//!
//! The catalog and probe only need JSON GET/POST with headers and an optional
//! deadline. [`ReqwestTransport`] is the production implementation; tests swap
//! in scripted transports through the same trait.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::redaction::redact;

/// JSON-over-HTTP transport used by every network step
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET `url`, returning the parsed JSON body of a 2xx response
    async fn get(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        timeout: Option<Duration>,
    ) -> Result<Value, ProviderError>;

    /// POST `body` as JSON to `url`, returning the parsed JSON body of a 2xx response
    async fn post(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<Value, ProviderError>;
}

/// Transport backed by a shared `reqwest` client
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Arc<Client>,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Arc::new(Client::new()),
        }
    }

    /// Use an existing client (proxy settings, custom TLS roots)
    pub fn with_client(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<Value, ProviderError> {
        let call = async {
            let response = request.send().await.map_err(ProviderError::from)?;
            let status = response.status();
            let text = response.text().await.map_err(ProviderError::from)?;

            if !status.is_success() {
                warn!(url = %url, status = status.as_u16(), "request failed");
                return Err(ProviderError::Http {
                    status: status.as_u16(),
                    body: redact(&text),
                });
            }

            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            let value = serde_json::from_str::<Value>(&text)?;
            Ok::<Value, ProviderError>(value)
        };

        match timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(url = %url, timeout = ?limit, "request timed out");
                    Err(ProviderError::Timeout(limit))
                }
            },
            None => call.await,
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_headers(mut request: RequestBuilder, headers: &HashMap<String, String>) -> RequestBuilder {
    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }
    request
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        timeout: Option<Duration>,
    ) -> Result<Value, ProviderError> {
        debug!(url = %url, "GET");
        let request = apply_headers(self.client.get(url), headers);
        self.execute(request, url, timeout).await
    }

    async fn post(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<Value, ProviderError> {
        debug!(url = %url, "POST");
        let request = apply_headers(self.client.post(url), headers).json(body);
        self.execute(request, url, timeout).await
    }
}
