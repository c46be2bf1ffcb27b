use async_trait::async_trait;
use serde_json::Value;

/// Audit sink for dispatched invocations. Must never fail the invocation.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    async fn log(&self, entry: Value);
}

/// Writes audit entries as tracing events on the `hubgate::audit` target.
#[derive(Debug, Default, Clone)]
pub struct TracingAuditLogger;

#[async_trait]
impl AuditLogger for TracingAuditLogger {
    async fn log(&self, entry: Value) {
        tracing::info!(target: "hubgate::audit", "{}", entry);
    }
}
