use crate::descriptor::ToolHandler;
use crate::error::{HandlerFailure, ToolError};
use crate::execution_context::ExecutionContext;
use crate::registry::ToolRegistry;
use crate::schema::Arguments;
use crate::traits::AuditLogger;
use crate::wire::{CatalogEntry, InvocationRequest, InvocationResponse};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{timeout, timeout_at};
use tracing::{error, info, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CANCEL_GRACE: Duration = Duration::from_millis(500);

/// Routes calls through the registry to the owning handler.
///
/// Each `invoke` runs the handler at most once. Nothing is retried here.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    audit: Arc<dyn AuditLogger>,
    timeout: Duration,
    cancel_grace: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, audit: Arc<dyn AuditLogger>) -> Self {
        Self {
            registry,
            audit,
            timeout: DEFAULT_TIMEOUT,
            cancel_grace: DEFAULT_CANCEL_GRACE,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// How long a cancelled handler gets to report its progress.
    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn catalog(&self) -> Vec<CatalogEntry> {
        self.registry.list_tools()
    }

    pub async fn invoke(&self, qualified_name: &str, arguments: Value) -> Result<Value, ToolError> {
        info!("Dispatching tool: {}", qualified_name);
        let started = Instant::now();
        let ctx = ExecutionContext::new(self.timeout);
        let call_id = ctx.call_id.clone();

        let result = self.run(qualified_name, &arguments, ctx).await;

        if let Err(err) = &result {
            warn!("Tool {} failed: {}", qualified_name, err);
        }
        self.log_audit_isolated(&call_id, qualified_name, &arguments, &result, started.elapsed());
        result
    }

    /// Wire-level entry point: never fails, errors become `{errorKind, message}`.
    pub async fn handle(&self, request: InvocationRequest) -> InvocationResponse {
        self.invoke(&request.qualified_name, request.arguments)
            .await
            .into()
    }

    async fn run(
        &self,
        qualified_name: &str,
        arguments: &Value,
        ctx: ExecutionContext,
    ) -> Result<Value, ToolError> {
        // 1. Lookup tool
        let descriptor = self.registry.resolve(qualified_name)?;

        // 2. Validate before anything reaches the platform
        let args = descriptor
            .schema()
            .validate(arguments)
            .map_err(|e| ToolError::Validation(format!("{qualified_name}: {e}")))?;

        // 3. Execute once
        let outcome = self
            .execute_with_protection(qualified_name, descriptor.handler(), ctx, args)
            .await?;

        outcome.map_err(|failure| self.classify(qualified_name, arguments, failure))
    }

    async fn execute_with_protection(
        &self,
        qualified_name: &str,
        handler: Arc<dyn ToolHandler>,
        ctx: ExecutionContext,
        args: Arguments,
    ) -> Result<Result<Value, HandlerFailure>, ToolError> {
        let deadline = ctx.deadline;
        let cancel = ctx.cancellation();

        // Spawn task to isolate panics
        let mut handle = tokio::spawn(async move { handler.call(ctx, args).await });

        let joined = match timeout_at(deadline, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(
                    "Tool {} exceeded {}ms, cancelling",
                    qualified_name,
                    self.timeout.as_millis()
                );
                cancel.cancel();
                match timeout(self.cancel_grace, &mut handle).await {
                    Ok(Ok(Ok(value))) => return Ok(Ok(value)),
                    Ok(Ok(Err(HandlerFailure::Interrupted(progress))))
                    | Ok(Ok(Err(HandlerFailure::Partial(progress)))) => {
                        return Err(self.timed_out(qualified_name, Some(progress)));
                    }
                    Ok(Ok(Err(_))) => return Err(self.timed_out(qualified_name, None)),
                    Ok(Err(join_err)) => Err(join_err),
                    Err(_) => {
                        handle.abort();
                        return Err(self.timed_out(qualified_name, None));
                    }
                }
            }
        };

        joined.map_err(|join_err| {
            let message = if join_err.is_panic() {
                error!("Tool {} panicked", qualified_name);
                "handler panicked"
            } else {
                error!("Tool {} was cancelled", qualified_name);
                "handler cancelled"
            };
            ToolError::Internal {
                tool: qualified_name.to_string(),
                message: message.into(),
            }
        })
    }

    fn timed_out(&self, qualified_name: &str, progress: Option<crate::error::BulkProgress>) -> ToolError {
        ToolError::Timeout {
            tool: qualified_name.to_string(),
            timeout_ms: self.timeout.as_millis() as u64,
            progress,
        }
    }

    fn classify(&self, qualified_name: &str, arguments: &Value, failure: HandlerFailure) -> ToolError {
        match failure {
            HandlerFailure::Remote(remote) => ToolError::Handler {
                tool: qualified_name.to_string(),
                arguments: arguments.clone(),
                kind: remote.kind,
                status: remote.status,
                message: remote.message,
            },
            HandlerFailure::Partial(progress) => ToolError::PartialCompletion {
                tool: qualified_name.to_string(),
                progress,
            },
            HandlerFailure::Interrupted(progress) => self.timed_out(qualified_name, Some(progress)),
            HandlerFailure::InvalidWindow(message) => ToolError::InvalidWindow(message),
            HandlerFailure::Invalid(message) => {
                ToolError::Validation(format!("{qualified_name}: {message}"))
            }
        }
    }

    fn log_audit_isolated(
        &self,
        call_id: &str,
        qualified_name: &str,
        arguments: &Value,
        result: &Result<Value, ToolError>,
        elapsed: Duration,
    ) {
        let log_entry = json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "call_id": call_id,
            "tool": qualified_name,
            "arguments": arguments,
            "outcome": match result {
                Ok(_) => "ok",
                Err(e) => e.error_kind(),
            },
            "elapsed_ms": elapsed.as_millis() as u64,
        });

        // Fire and forget
        let audit = self.audit.clone();
        tokio::spawn(async move {
            audit.log(log_entry).await;
        });
    }
}
