//! Where the client reports conditions it does not turn into a hard error.

/// Receives diagnostics from `Client::build`. Fire-and-forget.
pub trait DiagnosticSink: Send + Sync {
    fn unknown_operation(&self, name: &str);
}

/// Forwards diagnostics to `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn unknown_operation(&self, name: &str) {
        tracing::error!(operation = name, "unmatched operation name: {name}");
    }
}
