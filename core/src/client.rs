//! TSDB client: configuration, request assembly, and execution.
//!
//! # Design
//! `Client` is built once from a validated `ClientConfig` and never mutated
//! afterwards, so it can be cloned and shared across threads freely. Each
//! API call is split into a `build_*` step that produces a
//! `RequestDescriptor` and an `execute` step that performs the round trip
//! and decodes the response. Hosts that own their own HTTP stack can stop
//! after `build_*` and use `RequestDescriptor::to_http` / `parse` directly.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::diagnostic::{DiagnosticSink, TracingSink};
use crate::error::{ApiError, BuildError, ConfigError, DefaultErrorBuilder, ErrorBuilder};
use crate::operation::{self, Operation};
use crate::request::RequestDescriptor;
use crate::transport::{Transport, TransportSettings};
use crate::types::{
    CreateRepoInput, CreateSeriesInput, CreateViewInput, ListReposOutput, QueryInput, QueryOutput,
    RepoDesc, SeriesDesc, UpdateRepoMetadataInput, UpdateSeriesMetadataInput, ViewDesc,
};

/// Collaborators injected into a `Client` before it is configured.
pub struct ClientBuilder {
    config: ClientConfig,
    error_builder: Arc<dyn ErrorBuilder>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl ClientBuilder {
    pub fn error_builder(mut self, error_builder: Arc<dyn ErrorBuilder>) -> Self {
        self.error_builder = error_builder;
        self
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Validate the endpoint and allocate the transport. No network I/O.
    pub fn configure(self) -> Result<Client, ConfigError> {
        self.config.validate()?;
        let transport = Transport::new(TransportSettings::from_config(&self.config));
        debug!(endpoint = %self.config.endpoint, "configured tsdb client");
        Ok(Client {
            config: self.config,
            transport,
            error_builder: self.error_builder,
            diagnostics: self.diagnostics,
        })
    }
}

/// Configured TSDB client.
///
/// Holds the validated config, the transport, and the injected error
/// builder and diagnostic sink. Read-only after `configure`; clones share
/// the same connection pool.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    transport: Transport,
    error_builder: Arc<dyn ErrorBuilder>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl Client {
    /// Configure a client with the default error builder and tracing diagnostics.
    pub fn configure(config: ClientConfig) -> Result<Self, ConfigError> {
        Self::builder(config).configure()
    }

    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder {
            config,
            error_builder: Arc::new(DefaultErrorBuilder),
            diagnostics: Arc::new(TracingSink),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Assemble a request for the operation named `name`.
    ///
    /// An unknown name is reported to the diagnostic sink and returned as
    /// `BuildError::UnknownOperation`.
    pub fn build<T>(
        &self,
        name: &str,
        args: &[&str],
        token: &str,
    ) -> Result<RequestDescriptor<T>, BuildError> {
        let Some(spec) = operation::resolve(name) else {
            self.diagnostics.unknown_operation(name);
            return Err(BuildError::UnknownOperation(name.to_string()));
        };
        self.build_op(spec.operation, args, token)
    }

    pub fn build_op<T>(
        &self,
        operation: Operation,
        args: &[&str],
        token: &str,
    ) -> Result<RequestDescriptor<T>, BuildError> {
        let spec = operation.spec();
        let path = spec.render(args)?;
        let url_path = spec.render_encoded(args)?;
        debug!(operation = operation.name(), method = %spec.method, %path, "assembled request");
        Ok(RequestDescriptor::new(
            operation,
            path,
            url_path,
            token,
            Arc::clone(&self.error_builder),
        ))
    }

    /// Send `request` and decode the response into its target type.
    pub fn execute<T: DeserializeOwned>(&self, request: RequestDescriptor<T>) -> Result<T, ApiError> {
        let http = request.to_http(&self.config.endpoint);
        let response = self.transport.send(&http)?;
        debug!(
            operation = request.operation.name(),
            method = %request.method,
            path = %request.path,
            status = response.status,
            "request completed"
        );
        request.parse(response)
    }

    // -----------------------------------------------------------------------
    // Repos
    // -----------------------------------------------------------------------

    pub fn build_create_repo(
        &self,
        input: &CreateRepoInput,
        token: &str,
    ) -> Result<RequestDescriptor<()>, BuildError> {
        self.build_op(Operation::CreateRepo, &[input.repo_name.as_str()], token)?
            .with_json(input)
    }

    pub fn build_list_repos(&self, token: &str) -> Result<RequestDescriptor<ListReposOutput>, BuildError> {
        self.build_op(Operation::ListRepos, &[], token)
    }

    pub fn build_get_repo(&self, repo: &str, token: &str) -> Result<RequestDescriptor<RepoDesc>, BuildError> {
        self.build_op(Operation::GetRepo, &[repo], token)
    }

    pub fn build_delete_repo(&self, repo: &str, token: &str) -> Result<RequestDescriptor<()>, BuildError> {
        self.build_op(Operation::DeleteRepo, &[repo], token)
    }

    pub fn build_update_repo_metadata(
        &self,
        input: &UpdateRepoMetadataInput,
        token: &str,
    ) -> Result<RequestDescriptor<()>, BuildError> {
        self.build_op(Operation::UpdateRepoMetadata, &[input.repo_name.as_str()], token)?
            .with_json(input)
    }

    pub fn build_delete_repo_metadata(
        &self,
        repo: &str,
        token: &str,
    ) -> Result<RequestDescriptor<()>, BuildError> {
        self.build_op(Operation::DeleteRepoMetadata, &[repo], token)
    }

    // -----------------------------------------------------------------------
    // Series
    // -----------------------------------------------------------------------

    pub fn build_create_series(
        &self,
        input: &CreateSeriesInput,
        token: &str,
    ) -> Result<RequestDescriptor<()>, BuildError> {
        self.build_op(
            Operation::CreateSeries,
            &[input.repo_name.as_str(), input.series_name.as_str()],
            token,
        )?
        .with_json(input)
    }

    pub fn build_update_series_metadata(
        &self,
        input: &UpdateSeriesMetadataInput,
        token: &str,
    ) -> Result<RequestDescriptor<()>, BuildError> {
        self.build_op(
            Operation::UpdateSeriesMetadata,
            &[input.repo_name.as_str(), input.series_name.as_str()],
            token,
        )?
        .with_json(input)
    }

    pub fn build_delete_series_metadata(
        &self,
        repo: &str,
        series: &str,
        token: &str,
    ) -> Result<RequestDescriptor<()>, BuildError> {
        self.build_op(Operation::DeleteSeriesMetadata, &[repo, series], token)
    }

    pub fn build_list_series(
        &self,
        repo: &str,
        token: &str,
    ) -> Result<RequestDescriptor<Vec<SeriesDesc>>, BuildError> {
        self.build_op(Operation::ListSeries, &[repo], token)
    }

    pub fn build_delete_series(
        &self,
        repo: &str,
        series: &str,
        token: &str,
    ) -> Result<RequestDescriptor<()>, BuildError> {
        self.build_op(Operation::DeleteSeries, &[repo, series], token)
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn build_create_view(
        &self,
        input: &CreateViewInput,
        token: &str,
    ) -> Result<RequestDescriptor<()>, BuildError> {
        self.build_op(
            Operation::CreateView,
            &[input.repo_name.as_str(), input.view_name.as_str()],
            token,
        )?
        .with_json(input)
    }

    pub fn build_list_view(
        &self,
        repo: &str,
        token: &str,
    ) -> Result<RequestDescriptor<Vec<ViewDesc>>, BuildError> {
        self.build_op(Operation::ListView, &[repo], token)
    }

    pub fn build_delete_view(
        &self,
        repo: &str,
        view: &str,
        token: &str,
    ) -> Result<RequestDescriptor<()>, BuildError> {
        self.build_op(Operation::DeleteView, &[repo, view], token)
    }

    pub fn build_get_view(
        &self,
        repo: &str,
        view: &str,
        token: &str,
    ) -> Result<RequestDescriptor<ViewDesc>, BuildError> {
        self.build_op(Operation::GetView, &[repo, view], token)
    }

    // -----------------------------------------------------------------------
    // Points
    // -----------------------------------------------------------------------

    pub fn build_query_points(
        &self,
        input: &QueryInput,
        token: &str,
    ) -> Result<RequestDescriptor<QueryOutput>, BuildError> {
        self.build_op(Operation::QueryPoints, &[input.repo_name.as_str()], token)?
            .with_json(input)
    }

    /// `points` is sent as-is; encoding it is the caller's job.
    pub fn build_write_points(
        &self,
        repo: &str,
        points: impl Into<String>,
        token: &str,
    ) -> Result<RequestDescriptor<()>, BuildError> {
        Ok(self
            .build_op(Operation::WritePoints, &[repo], token)?
            .with_text(points))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::http::{HttpMethod, HttpResponse};
    use crate::types::Metadata;

    const TOKEN: &str = "test-token";

    fn client() -> Client {
        Client::configure(ClientConfig::new("https://tsdb.example.com")).unwrap()
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<String>>);

    impl DiagnosticSink for RecordingSink {
        fn unknown_operation(&self, name: &str) {
            self.0.lock().unwrap().push(name.to_string());
        }
    }

    struct TeapotErrors;

    impl ErrorBuilder for TeapotErrors {
        fn build(&self, response: &HttpResponse) -> ApiError {
            ApiError::Http {
                status: 418,
                message: format!("was {}", response.status),
                request_id: None,
            }
        }
    }

    #[test]
    fn configure_applies_timeouts() {
        let config = ClientConfig::new("https://tsdb.example.com")
            .with_dial_timeout(Duration::from_secs(5))
            .with_response_timeout(Duration::from_secs(10));
        let client = Client::configure(config).unwrap();
        let settings = client.transport().settings();
        assert_eq!(settings.dial_timeout, Duration::from_secs(5));
        assert_eq!(settings.response_header_timeout, Duration::from_secs(10));
        assert_eq!(settings.keep_alive, Duration::from_secs(30));
    }

    #[test]
    fn configure_rejects_missing_scheme() {
        let err = Client::configure(ClientConfig::new("tsdb.example.com")).unwrap_err();
        assert_eq!(err, ConfigError::InvalidEndpointScheme);
    }

    #[test]
    fn configure_rejects_trailing_slash() {
        let err = Client::configure(ClientConfig::new("https://tsdb.example.com/")).unwrap_err();
        assert_eq!(err, ConfigError::InvalidEndpointTrailingSlash);
    }

    #[test]
    fn build_create_series_by_name() {
        let req = client()
            .build::<()>("CreateSeries", &["repoA", "seriesB"], TOKEN)
            .unwrap();
        assert_eq!(req.operation, Operation::CreateSeries);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "/v4/repos/repoA/series/seriesB");
        assert_eq!(req.auth_token, TOKEN);
    }

    #[test]
    fn build_unknown_operation_fails_and_reports() {
        let sink = Arc::new(RecordingSink::default());
        let client = Client::builder(ClientConfig::new("http://h"))
            .diagnostics(sink.clone())
            .configure()
            .unwrap();
        let err = client.build::<()>("Nonexistent", &[], TOKEN).unwrap_err();
        assert_eq!(err, BuildError::UnknownOperation("Nonexistent".to_string()));
        assert_eq!(*sink.0.lock().unwrap(), vec!["Nonexistent".to_string()]);
    }

    #[test]
    fn build_keeps_path_literal_and_escapes_url() {
        let req = client()
            .build::<()>("CreateSeries", &["repo A", "cpu/load"], TOKEN)
            .unwrap();
        assert_eq!(req.path, "/v4/repos/repo A/series/cpu/load");
        let http = req.to_http(&client().config().endpoint);
        assert_eq!(
            http.url,
            "https://tsdb.example.com/v4/repos/repo%20A/series/cpu%2Fload"
        );
    }

    #[test]
    fn build_rejects_argument_mismatch() {
        let err = client().build::<()>("GetView", &["repoA"], TOKEN).unwrap_err();
        assert!(matches!(err, BuildError::PathArity { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn injected_error_builder_reaches_descriptor() {
        let client = Client::builder(ClientConfig::new("http://h"))
            .error_builder(Arc::new(TeapotErrors))
            .configure()
            .unwrap();
        let req = client.build_get_repo("a", TOKEN).unwrap();
        let err = req
            .parse(HttpResponse {
                status: 500,
                headers: Vec::new(),
                body: String::new(),
            })
            .unwrap_err();
        assert_eq!(err.status(), Some(418));
    }

    #[test]
    fn create_repo_body_omits_repo_name() {
        let input = CreateRepoInput {
            repo_name: "repoA".to_string(),
            region: "nb".to_string(),
            metadata: Metadata::from([("team".to_string(), "ops".to_string())]),
        };
        let req = client().build_create_repo(&input, TOKEN).unwrap();
        assert_eq!(req.path, "/v4/repos/repoA");
        let http = req.to_http(&client().config().endpoint);
        let body: serde_json::Value = serde_json::from_str(http.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({ "region": "nb", "metadata": { "team": "ops" } }));
    }

    #[test]
    fn query_points_posts_sql() {
        let input = QueryInput {
            repo_name: "repoA".to_string(),
            sql: "select * from cpu".to_string(),
        };
        let req = client().build_query_points(&input, TOKEN).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "/v4/repos/repoA/query");
        let http = req.to_http("http://h");
        assert_eq!(http.body.as_deref(), Some(r#"{"sql":"select * from cpu"}"#));
    }

    #[test]
    fn write_points_sends_text() {
        let req = client()
            .build_write_points("repoA", "cpu,host=a value=1 1500000000000000000", TOKEN)
            .unwrap();
        assert_eq!(req.path, "/v4/repos/repoA/points");
        let http = req.to_http("http://h");
        assert_eq!(http.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn typed_builders_match_registry() {
        let c = client();
        let cases = [
            (c.build_list_repos(TOKEN).unwrap().path, "/v4/repos"),
            (c.build_delete_repo("r", TOKEN).unwrap().path, "/v4/repos/r"),
            (c.build_delete_repo_metadata("r", TOKEN).unwrap().path, "/v4/repos/r/meta"),
            (c.build_list_series("r", TOKEN).unwrap().path, "/v4/repos/r/series"),
            (c.build_delete_series("r", "s", TOKEN).unwrap().path, "/v4/repos/r/series/s"),
            (
                c.build_delete_series_metadata("r", "s", TOKEN).unwrap().path,
                "/v4/repos/r/series/s/meta",
            ),
            (c.build_list_view("r", TOKEN).unwrap().path, "/v4/repos/r/views"),
            (c.build_get_view("r", "v", TOKEN).unwrap().path, "/v4/repos/r/views/v"),
            (c.build_delete_view("r", "v", TOKEN).unwrap().path, "/v4/repos/r/views/v"),
        ];
        for (actual, expected) in cases {
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn client_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Client>();
    }
}
