//! HTTP client for the Graph API.
//!
//! Provides low-level request helpers with retry logic and rate-limit
//! awareness. Page access tokens travel as the `access_token` query
//! parameter.

use crate::messenger::error::{MessengerError, MessengerErrorCode, MessengerResult};
use crate::messenger::types::MessengerConfig;
use log::{debug, warn};
use std::time::Duration;

/// Upper bound of a single retry delay, before jitter.
const MAX_BACKOFF_MS: u64 = 60_000;

/// Body of a Graph request, kept owned so retries can resend it.
#[derive(Debug, Clone)]
enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// Low-level HTTP client for the Graph API.
#[derive(Debug, Clone)]
pub struct GraphClient {
    client: reqwest::Client,
    config: MessengerConfig,
}

impl GraphClient {
    /// Create a new client from configuration.
    pub fn new(config: &MessengerConfig) -> MessengerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec as u64))
            .connect_timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| MessengerError::network(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Get current config reference.
    pub fn config(&self) -> &MessengerConfig {
        &self.config
    }

    // ─── URL helpers ─────────────────────────────────────────────────

    /// Build a Graph API URL: `{base}/{version}/{path}`.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version,
            path.trim_start_matches('/')
        )
    }

    // ─── HTTP primitives ─────────────────────────────────────────────

    /// GET with query parameters.
    pub async fn get_with_params(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> MessengerResult<serde_json::Value> {
        let full_url = reqwest::Url::parse_with_params(&self.url(path), params)
            .map_err(|e| MessengerError::internal(format!("Invalid URL: {}", e)))?;
        self.request_with_retry(reqwest::Method::GET, full_url.as_str(), RequestBody::Empty)
            .await
    }

    /// POST a JSON body.
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> MessengerResult<serde_json::Value> {
        self.request_with_retry(
            reqwest::Method::POST,
            &self.url(path),
            RequestBody::Json(body.clone()),
        )
        .await
    }

    /// POST named parameters as an urlencoded form.
    pub async fn post_form(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> MessengerResult<serde_json::Value> {
        let form = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self.request_with_retry(reqwest::Method::POST, &self.url(path), RequestBody::Form(form))
            .await
    }

    /// DELETE with a JSON body (thread-settings removals take one).
    pub async fn delete_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> MessengerResult<serde_json::Value> {
        self.request_with_retry(
            reqwest::Method::DELETE,
            &self.url(path),
            RequestBody::Json(body.clone()),
        )
        .await
    }

    // ─── Core request method with retry ──────────────────────────────

    async fn request_with_retry(
        &self,
        method: reqwest::Method,
        url: &str,
        body: RequestBody,
    ) -> MessengerResult<serde_json::Value> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!("{} {} (attempt {})", method, url, attempt);

            let mut req = self
                .client
                .request(method.clone(), url)
                .query(&[("access_token", self.config.access_token.as_str())]);

            req = match &body {
                RequestBody::Empty => req,
                RequestBody::Json(b) => req.json(b),
                RequestBody::Form(f) => req.form(f),
            };

            match req.send().await {
                Ok(r) => {
                    let status = r.status().as_u16();
                    let resp_body = r.text().await.unwrap_or_default();

                    if (200..300).contains(&status) {
                        if resp_body.is_empty() {
                            return Ok(serde_json::json!({ "success": true }));
                        }
                        return serde_json::from_str(&resp_body).map_err(|e| {
                            MessengerError::serialization(format!("JSON parse error: {}", e))
                        });
                    }

                    let err = MessengerError::from_api_response(status, &resp_body);
                    if Self::is_retryable(&err) && attempt <= self.config.max_retries {
                        let delay = Self::backoff_delay(attempt);
                        warn!("Retryable error (attempt {}): {}", attempt, err);
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    let reason = Self::describe_network_error(e);
                    if attempt <= self.config.max_retries {
                        let delay = Self::backoff_delay(attempt);
                        warn!("Network error (attempt {}): {}", attempt, reason);
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(MessengerError::network(reason));
                }
            }
        }
    }

    /// Check if an error is retryable.
    fn is_retryable(err: &MessengerError) -> bool {
        matches!(
            err.code,
            MessengerErrorCode::RateLimited | MessengerErrorCode::NetworkError
        ) || matches!(err.http_status, Some(500) | Some(502) | Some(503))
    }

    /// Text of a transport error with the request URL removed; the URL
    /// carries the `access_token` query parameter.
    fn describe_network_error(e: reqwest::Error) -> String {
        e.without_url().to_string()
    }

    /// Exponential backoff with jitter, capped at [`MAX_BACKOFF_MS`].
    fn backoff_delay(attempt: u32) -> Duration {
        let base_ms = 2u64
            .checked_pow(attempt.saturating_sub(1))
            .map_or(MAX_BACKOFF_MS, |f| f.saturating_mul(1000))
            .min(MAX_BACKOFF_MS);
        let jitter = rand::random::<u64>() % 500;
        Duration::from_millis(base_ms + jitter)
    }
}
