//! Fully resolved, ready-to-execute API calls.
//!
//! # Design
//! A `RequestDescriptor<T>` is produced by `Client::build` and owns
//! everything an executor needs: the resolved operation and path, the auth
//! token, an optional body, and the error builder to apply to a failed
//! response. `T` is the response target; `parse` decodes a successful body
//! into it. The descriptor performs no I/O.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, BuildError, ErrorBuilder};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::operation::Operation;

/// A request body together with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Json(String),
    Text(String),
}

impl Body {
    pub fn content_type(&self) -> &'static str {
        match self {
            Body::Json(_) => "application/json",
            Body::Text(_) => "text/plain",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Body::Json(text) | Body::Text(text) => text,
        }
    }
}

/// One assembled API call, ready to hand to an executor.
///
/// `path` holds the arguments exactly as the caller passed them; the escaped
/// form used on the wire only appears in `to_http`.
pub struct RequestDescriptor<T> {
    pub operation: Operation,
    pub method: HttpMethod,
    /// Path with every parameter slot filled, e.g. `/v4/repos/repoA/query`.
    pub path: String,
    pub auth_token: String,
    pub body: Option<Body>,
    pub error_builder: Arc<dyn ErrorBuilder>,
    url_path: String,
    target: PhantomData<fn() -> T>,
}

impl<T> RequestDescriptor<T> {
    pub(crate) fn new(
        operation: Operation,
        path: String,
        url_path: String,
        auth_token: &str,
        error_builder: Arc<dyn ErrorBuilder>,
    ) -> Self {
        Self {
            operation,
            method: operation.spec().method,
            path,
            auth_token: auth_token.to_string(),
            body: None,
            error_builder,
            url_path,
            target: PhantomData,
        }
    }

    /// Attach `payload` serialized as JSON.
    pub fn with_json<P: Serialize + ?Sized>(mut self, payload: &P) -> Result<Self, BuildError> {
        let json =
            serde_json::to_string(payload).map_err(|e| BuildError::Serialization(e.to_string()))?;
        self.body = Some(Body::Json(json));
        Ok(self)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.body = Some(Body::Text(text.into()));
        self
    }

    /// Render as plain HTTP data against `endpoint`. Path arguments are
    /// percent-escaped here.
    pub fn to_http(&self, endpoint: &str) -> HttpRequest {
        let mut headers = Vec::new();
        if !self.auth_token.is_empty() {
            headers.push(("authorization".to_string(), self.auth_token.clone()));
        }
        if let Some(body) = &self.body {
            headers.push(("content-type".to_string(), body.content_type().to_string()));
        }
        HttpRequest {
            method: self.method,
            url: format!("{endpoint}{}", self.url_path),
            headers,
            body: self.body.as_ref().map(|body| body.as_str().to_string()),
        }
    }
}

impl<T: DeserializeOwned> RequestDescriptor<T> {
    /// Decode a response into the target type.
    ///
    /// Non-2xx responses go through the error builder. An empty 2xx body is
    /// read as JSON `null`, which is what `()` targets expect.
    pub fn parse(&self, response: HttpResponse) -> Result<T, ApiError> {
        if !response.is_success() {
            return Err(self.error_builder.build(&response));
        }
        let body = response.body.trim();
        let body = if body.is_empty() { "null" } else { body };
        serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }
}

impl<T> Clone for RequestDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            operation: self.operation,
            method: self.method,
            path: self.path.clone(),
            auth_token: self.auth_token.clone(),
            body: self.body.clone(),
            error_builder: Arc::clone(&self.error_builder),
            url_path: self.url_path.clone(),
            target: PhantomData,
        }
    }
}

impl<T> fmt::Debug for RequestDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("operation", &self.operation)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("auth_token", &"<redacted>")
            .field("body", &self.body)
            .field("target", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}
