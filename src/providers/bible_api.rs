/*!
 * HTTP verse lookup against a bible-api.com style service.
 *
 * Requests look like `GET {endpoint}/John%203:16?translation=kjv` and the
 * JSON answer carries the passage in a `text` field. Server and network
 * errors are retried with exponential backoff; client errors are not.
 */

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::{VerseLookup, VerseQuery};
use crate::scripture::books::collapse_whitespace;

/// Default public endpoint
pub const DEFAULT_ENDPOINT: &str = "https://bible-api.com";

#[derive(Debug, Deserialize)]
struct PassageResponse {
    text: String,
    #[serde(default)]
    translation_id: Option<String>,
}

/// Verse lookup over HTTP.
#[derive(Debug)]
pub struct BibleApiLookup {
    base_url: Url,
    client: Client,
    /// Used when the query names no translation
    default_translation: Option<String>,
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
    /// Optional rate limit in requests per minute
    rate_limit: Option<u32>,
    last_request: Mutex<Option<Instant>>,
}

impl BibleApiLookup {
    pub fn new(endpoint: &str) -> Result<Self, ProviderError> {
        Self::new_with_config(endpoint, 30, 3, 1000, None)
    }

    pub fn new_with_config(
        endpoint: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
        rate_limit: Option<u32>,
    ) -> Result<Self, ProviderError> {
        let base_url = Url::parse(endpoint)
            .map_err(|e| ProviderError::ConnectionError(format!("Invalid endpoint '{}': {}", endpoint, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderError::ConnectionError(format!("Endpoint '{}' cannot take a path", endpoint)));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            client,
            default_translation: None,
            max_retries,
            backoff_base_ms,
            rate_limit: rate_limit.filter(|r| *r > 0),
            last_request: Mutex::new(None),
        })
    }

    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.default_translation = Some(translation.into());
        self
    }

    /// URL for one query.
    pub fn request_url(&self, query: &VerseQuery) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::ConnectionError(format!("Endpoint '{}' cannot take a path", self.base_url)))?
            .pop_if_empty()
            .push(&query.reference.canonical());

        let translation = query.translation.as_ref().or(self.default_translation.as_ref());
        if let Some(translation) = translation {
            url.query_pairs_mut().append_pair("translation", &translation.to_lowercase());
        }
        Ok(url)
    }

    /// Space requests according to the configured rate limit.
    async fn wait_for_rate_limit(&self) {
        let Some(rate_limit) = self.rate_limit else {
            return;
        };
        let interval = Duration::from_millis(60_000 / rate_limit as u64);
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < interval {
                tokio::time::sleep(interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl VerseLookup for BibleApiLookup {
    async fn lookup(&self, query: &VerseQuery) -> Result<String, ProviderError> {
        let url = self.request_url(query)?;
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= self.max_retries {
            self.wait_for_rate_limit().await;

            match self.client.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let passage: PassageResponse = response
                            .json()
                            .await
                            .map_err(|e| ProviderError::ParseError(format!("Invalid passage response: {}", e)))?;
                        let text = collapse_whitespace(passage.text.trim());
                        if text.is_empty() {
                            return Err(ProviderError::NotFound(query.reference.canonical()));
                        }
                        debug!(
                            "Fetched {} ({})",
                            query.reference,
                            passage.translation_id.as_deref().unwrap_or("default")
                        );
                        return Ok(text);
                    }

                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());
                    if status == StatusCode::NOT_FOUND {
                        return Err(ProviderError::NotFound(query.reference.canonical()));
                    } else if status == StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ProviderError::RateLimitExceeded(body));
                        warn!("Verse API rate limited - attempt {}/{}", attempt + 1, self.max_retries + 1);
                    } else if status.is_server_error() {
                        warn!(
                            "Verse API error ({}): {} - attempt {}/{}",
                            status,
                            body,
                            attempt + 1,
                            self.max_retries + 1
                        );
                        last_error = Some(ProviderError::ApiError {
                            status_code: status.as_u16(),
                            message: body,
                        });
                    } else {
                        error!("Verse API error ({}): {}", status, body);
                        return Err(ProviderError::ApiError {
                            status_code: status.as_u16(),
                            message: body,
                        });
                    }
                }
                Err(e) => {
                    warn!("Verse API network error: {} - attempt {}/{}", e, attempt + 1, self.max_retries + 1);
                    last_error = Some(if e.is_timeout() {
                        ProviderError::RequestFailed(format!("Request timed out: {}", e))
                    } else {
                        ProviderError::ConnectionError(e.to_string())
                    });
                }
            }

            attempt += 1;
            if attempt <= self.max_retries {
                let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1));
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!("Verse lookup failed after {} attempts", self.max_retries + 1))
        }))
    }
}
