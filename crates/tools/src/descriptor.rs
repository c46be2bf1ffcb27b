use crate::error::HandlerFailure;
use crate::execution_context::ExecutionContext;
use crate::schema::{Arguments, ParameterSchema};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// The callable behind a tool. Handlers talk to the remote platform and may
/// mutate remote state.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure>;
}

/// Static metadata for one invocable operation.
#[derive(Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    schema: ParameterSchema,
    handler: Arc<dyn ToolHandler>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ParameterSchema,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler,
        }
    }

    /// Unqualified name, unique within the owning provider.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    pub fn handler(&self) -> Arc<dyn ToolHandler> {
        self.handler.clone()
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("params", &self.schema.params().len())
            .finish()
    }
}
