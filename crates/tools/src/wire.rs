//! JSON shapes exchanged with the agent.

use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub qualified_name: String,
    pub description: String,
    pub parameter_schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationRequest {
    pub qualified_name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// `{result}` on success, `{errorKind, message}` on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InvocationResponse {
    Success { result: Value },
    Failure(ErrorBody),
}

impl InvocationResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationResponse::Success { .. })
    }
}

impl From<Result<Value, ToolError>> for InvocationResponse {
    fn from(outcome: Result<Value, ToolError>) -> Self {
        match outcome {
            Ok(result) => InvocationResponse::Success { result },
            Err(err) => InvocationResponse::Failure(ErrorBody::from(&err)),
        }
    }
}

impl From<&ToolError> for ErrorBody {
    fn from(err: &ToolError) -> Self {
        ErrorBody {
            error_kind: err.error_kind().to_string(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}
