//! Error types for the TSDB client core.
//!
//! # Design
//! Configuration and request assembly fail fast with `ConfigError` and
//! `BuildError`. Failed HTTP responses become `ApiError` values through an
//! `ErrorBuilder`, which the `Client` carries as an injected `Arc` and threads
//! into every `RequestDescriptor` it assembles.

use serde::Deserialize;
use thiserror::Error;

use crate::http::HttpResponse;

/// Header carrying the server-assigned request id.
pub const REQUEST_ID_HEADER: &str = "X-Reqid";

/// Errors returned while validating or loading a `ClientConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("endpoint should start with 'http://' or 'https://'")]
    InvalidEndpointScheme,

    #[error("endpoint should not end with '/'")]
    InvalidEndpointTrailingSlash,

    /// The configuration source did not provide an endpoint at all.
    #[error("endpoint is not configured (set {0})")]
    MissingEndpoint(&'static str),

    #[error("invalid timeout in {var}: {value:?} is not a whole number of milliseconds")]
    InvalidTimeout { var: &'static str, value: String },
}

/// Errors returned while assembling a `RequestDescriptor`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// The number of path arguments does not match the operation's parameter slots.
    #[error("{operation} expects {expected} path argument(s), got {actual}")]
    PathArity {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Errors surfaced while executing or decoding a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found: {message}")]
    NotFound {
        message: String,
        request_id: Option<String>,
    },

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        request_id: Option<String>,
    },

    /// The response body could not be decoded into the response target.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The round trip itself failed (connect, timeout, I/O).
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            ApiError::NotFound { request_id, .. } | ApiError::Http { request_id, .. } => {
                request_id.as_deref()
            }
            _ => None,
        }
    }
}

/// Turns a failed HTTP response into a structured `ApiError`.
///
/// Only called with non-2xx responses.
pub trait ErrorBuilder: Send + Sync {
    fn build(&self, response: &HttpResponse) -> ApiError;
}

/// Reads the service's `{"error": "..."}` envelope and the `X-Reqid` header.
/// Bodies that are not an envelope are reported verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorBuilder;

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

impl ErrorBuilder for DefaultErrorBuilder {
    fn build(&self, response: &HttpResponse) -> ApiError {
        let message = serde_json::from_str::<ErrorEnvelope>(&response.body)
            .map(|envelope| envelope.error)
            .unwrap_or_else(|_| response.body.trim().to_string());
        let request_id = response.header(REQUEST_ID_HEADER).map(str::to_string);

        if response.status == 404 {
            return ApiError::NotFound {
                message,
                request_id,
            };
        }
        ApiError::Http {
            status: response.status,
            message,
            request_id,
        }
    }
}
