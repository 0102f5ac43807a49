use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::types::{CreatePipeRequest, CreatePipeResponse, PipeRequest, PipeResponse};
use crate::config::{LangbaseConfig, RequestConfig};
use crate::error::{LangbaseError, LangbaseResult};

/// HTTP client for the Langbase Pipes API.
///
/// Only two endpoints are used: `POST /v1/pipes/run` to obtain a completion and
/// `POST /v1/pipes` to upsert the pipe definition at startup.
#[derive(Clone)]
pub struct LangbaseClient {
    client: Client,
    base_url: String,
    api_key: String,
    request_config: RequestConfig,
}

impl LangbaseClient {
    /// Create a new Langbase client
    pub fn new(config: &LangbaseConfig, request_config: RequestConfig) -> LangbaseResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(LangbaseError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_config,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run a pipe and return its completion.
    ///
    /// Failed attempts are retried `max_retries` times with exponential backoff.
    /// Timeouts are never retried: the caller owns the time budget.
    pub async fn call_pipe(&self, request: PipeRequest) -> LangbaseResult<PipeResponse> {
        let url = format!("{}/v1/pipes/run", self.base_url);
        let mut attempt: u32 = 0;

        loop {
            let start = Instant::now();
            debug!(
                pipe = %request.name,
                messages = request.messages.len(),
                attempt,
                "Calling Langbase pipe"
            );

            let outcome: LangbaseResult<PipeResponse> = self.post_json(&url, &request).await;
            let latency_ms = start.elapsed().as_millis();

            let err = match outcome {
                Ok(response) => {
                    info!(pipe = %request.name, latency_ms, "Langbase pipe call succeeded");
                    return Ok(response);
                }
                Err(e) => e,
            };

            error!(
                pipe = %request.name,
                error = %err,
                latency_ms,
                attempt,
                "Langbase pipe call failed"
            );

            if matches!(err, LangbaseError::Timeout { .. }) {
                return Err(err);
            }
            if attempt >= self.request_config.max_retries {
                return Err(LangbaseError::Unavailable {
                    message: err.to_string(),
                    retries: attempt,
                });
            }

            attempt += 1;
            let delay =
                Duration::from_millis(self.request_config.retry_delay_ms * 2_u64.pow(attempt - 1));
            warn!(
                pipe = %request.name,
                retry = attempt,
                delay_ms = delay.as_millis(),
                "Retrying Langbase request"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Create (or upsert) a pipe definition.
    pub async fn create_pipe(
        &self,
        request: CreatePipeRequest,
    ) -> LangbaseResult<CreatePipeResponse> {
        let url = format!("{}/v1/pipes", self.base_url);
        info!(pipe = %request.name, "Creating Langbase pipe");

        let created: CreatePipeResponse = self.post_json(&url, &request).await?;
        info!(pipe = %created.name, url = %created.url, "Pipe created successfully");
        Ok(created)
    }

    /// Ensure a pipe exists, treating `409 Conflict` as success.
    pub async fn ensure_pipe(&self, request: CreatePipeRequest) -> LangbaseResult<()> {
        let pipe_name = request.name.clone();
        match self.create_pipe(request).await {
            Ok(_) => Ok(()),
            Err(LangbaseError::Api { status: 409, .. }) => {
                info!(pipe = %pipe_name, "Pipe already exists");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn post_json<B, R>(&self, url: &str, body: &B) -> LangbaseResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify_transport_error(e))?;

        let response = ensure_success(response).await?;

        response
            .json()
            .await
            .map_err(|e| LangbaseError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }

    fn classify_transport_error(&self, err: reqwest::Error) -> LangbaseError {
        if err.is_timeout() {
            LangbaseError::Timeout {
                timeout_ms: self.request_config.timeout_ms,
            }
        } else {
            LangbaseError::Http(err)
        }
    }
}

async fn ensure_success(response: Response) -> LangbaseResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(LangbaseError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = LangbaseConfig {
            api_key: "test_key".to_string(),
            base_url: "https://api.langbase.com/".to_string(),
        };

        let client = LangbaseClient::new(&config, RequestConfig::default());
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url(), "https://api.langbase.com");
    }
}
