//! Blocking HTTP transport built from a validated `ClientConfig`.
//!
//! Building a `Transport` allocates a `ureq::Agent` and nothing else;
//! connections are dialed lazily on the first `send`. Status codes are
//! returned as data so that non-2xx handling stays with the `ErrorBuilder`.

use std::fmt;
use std::time::Duration;

use ureq::RequestBuilder;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Idle age after which a pooled connection is dropped instead of reused.
/// Applied through the agent's `max_idle_age`; it does not set the socket
/// keep-alive interval.
pub const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Timeouts applied to the underlying agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    pub dial_timeout: Duration,
    pub keep_alive: Duration,
    pub response_header_timeout: Duration,
}

impl TransportSettings {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            dial_timeout: config.dial_timeout,
            keep_alive: KEEP_ALIVE,
            response_header_timeout: config.response_timeout,
        }
    }
}

/// Sends `HttpRequest`s over a shared, pooled `ureq::Agent`.
///
/// Clones share the same connection pool.
#[derive(Clone)]
pub struct Transport {
    settings: TransportSettings,
    agent: ureq::Agent,
}

impl Transport {
    pub fn new(settings: TransportSettings) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_connect(Some(settings.dial_timeout))
            .timeout_recv_response(Some(settings.response_header_timeout))
            .max_idle_age(settings.keep_alive)
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { settings, agent }
    }

    pub fn settings(&self) -> TransportSettings {
        self.settings
    }

    /// Perform one round trip. No retries.
    pub fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url.as_str();
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => apply_headers(self.agent.get(url), request).call(),
            (HttpMethod::Delete, _) => apply_headers(self.agent.delete(url), request).call(),
            (HttpMethod::Post, Some(body)) => {
                apply_headers(self.agent.post(url), request).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => apply_headers(self.agent.post(url), request).send_empty(),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn apply_headers<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
