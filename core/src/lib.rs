//! Request-construction core for the TSDB `/v4` REST API.
//!
//! # Overview
//! Turns an operation identifier plus path arguments into a fully specified
//! request: method, resolved path, auth token, body, and the type the
//! response decodes into. Building never touches the network; `Client::execute`
//! runs the round trip through a blocking transport configured from
//! `ClientConfig`.
//!
//! # Design
//! - `operation` is a static table from `Operation` to method and path
//!   segments. Lookup is exact; argument counts are checked when rendering.
//! - `Client` is immutable after `configure` and carries its error builder
//!   and diagnostic sink as injected values.
//! - Request and response types are plain owned data so a host can execute
//!   requests with its own HTTP stack.

pub mod client;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod http;
pub mod operation;
pub mod request;
pub mod transport;
pub mod types;

pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use diagnostic::{DiagnosticSink, TracingSink};
pub use error::{ApiError, BuildError, ConfigError, DefaultErrorBuilder, ErrorBuilder};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use operation::{resolve, Operation, OperationSpec, Segment, OPERATIONS};
pub use request::{Body, RequestDescriptor};
pub use transport::{Transport, TransportSettings, KEEP_ALIVE};
pub use types::*;
