//! Shared JSON-over-HTTP plumbing for the adapters.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use ugci_core::Platform;

use crate::adapter::AdapterSettings;
use crate::error::IngestError;
use crate::rate_limit::{retry_with_backoff, Pacer};

const USER_AGENT: &str = concat!("ugci/", env!("CARGO_PKG_VERSION"));

/// `{"data": [...]}`; a missing or null `data` reads as empty.
#[derive(Debug, Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    data: Option<Vec<serde_json::Value>>,
}

/// `{"data": {...}}`; a missing or null `data` means not found.
#[derive(Debug, Deserialize)]
struct ItemEnvelope {
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug)]
pub(crate) struct ApiClient {
    client: Client,
    platform: Platform,
    base_url: String,
    bearer_token: Option<String>,
    max_retries: u32,
    backoff_base_ms: u64,
    pacer: Pacer,
}

impl ApiClient {
    pub(crate) fn new(
        platform: Platform,
        settings: &AdapterSettings,
        bearer_token: Option<String>,
    ) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(settings.timeout_secs.min(10)))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            platform,
            base_url: settings.base_url.trim_end_matches('/').to_owned(),
            bearer_token,
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
            pacer: Pacer::per_minute(settings.requests_per_minute),
        })
    }

    pub(crate) fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// GET a list endpoint and return its raw items.
    pub(crate) async fn get_list(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<serde_json::Value>, IngestError> {
        let body = self.get_body(endpoint, query).await?;
        let envelope: ListEnvelope =
            serde_json::from_str(&body).map_err(|source| IngestError::Deserialize {
                context: format!("{} {endpoint}", self.platform),
                source,
            })?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// GET a single-item endpoint; `None` when the response carries no item.
    pub(crate) async fn get_item(
        &self,
        endpoint: &str,
    ) -> Result<Option<serde_json::Value>, IngestError> {
        let body = self.get_body(endpoint, &[]).await?;
        let envelope: ItemEnvelope =
            serde_json::from_str(&body).map_err(|source| IngestError::Deserialize {
                context: format!("{} {endpoint}", self.platform),
                source,
            })?;
        Ok(envelope
            .data
            .filter(|data| data.as_object().is_some_and(|object| !object.is_empty())))
    }

    async fn get_body(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<String, IngestError> {
        let url = self.endpoint_url(endpoint);
        let platform = self.platform;

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                self.pacer.wait().await;

                let mut request = self
                    .client
                    .get(&url)
                    .query(query)
                    .header(reqwest::header::ACCEPT, "application/json");
                if let Some(token) = &self.bearer_token {
                    request = request.bearer_auth(token);
                }

                let response = request.send().await?;
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok());
                    return Err(IngestError::RateLimited {
                        platform,
                        retry_after_secs,
                    });
                }

                if !status.is_success() {
                    return Err(IngestError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                Ok(response.text().await?)
            }
        })
        .await
    }
}
