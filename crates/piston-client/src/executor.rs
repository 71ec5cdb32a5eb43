//! Request execution against the service base URL
//!
//! Each call is a bounded loop: a 200 response is parsed as JSON and returned,
//! a 429 sleeps `base * 2^attempt` and tries again, and any other status fails
//! immediately with the raw response body. Running out of attempts while still
//! rate limited yields [`PistonError::RateLimitExhausted`].

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::errors::PistonError;

/// HTTP methods used against the execution service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delay slept after the rate-limited attempt `attempt` (0-indexed)
pub(crate) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Issues requests against the service base URL, retrying only on 429
#[derive(Debug, Clone)]
pub(crate) struct RequestExecutor {
    client: Client,
    base_url: String,
    retries: u32,
    backoff_base: Duration,
}

impl RequestExecutor {
    pub(crate) fn new(client: Client, config: &ClientConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retries: config.retries,
            backoff_base: config.backoff_base(),
        }
    }

    pub(crate) async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, PistonError> {
        let url = format!("{}{}", self.base_url, path);

        for attempt in 0..self.retries {
            log::debug!(
                "Piston request {} {} (attempt {}/{})",
                method,
                url,
                attempt + 1,
                self.retries
            );

            let response = self.build(method, &url, body).send().await?;
            let status = response.status();
            let response_text = response.text().await?;

            if status == StatusCode::OK {
                return serde_json::from_str(&response_text).map_err(|e| {
                    PistonError::Decode(format!(
                        "response is not valid JSON: {}. Response: {}",
                        e, response_text
                    ))
                });
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let delay = backoff_delay(self.backoff_base, attempt);
                log::warn!(
                    "Piston rate limit hit on {} {}, retrying in {:?}",
                    method,
                    url,
                    delay
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            log::error!("Piston API error response ({}): {}", status, response_text);
            return Err(PistonError::Transport {
                status: status.as_u16(),
                body: response_text,
            });
        }

        Err(PistonError::RateLimitExhausted {
            attempts: self.retries,
        })
    }

    fn build(&self, method: HttpMethod, url: &str, body: Option<&Value>) -> RequestBuilder {
        let request = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };

        match body {
            Some(body) => request.header(CONTENT_TYPE, "application/json").json(body),
            None => request,
        }
    }
}
