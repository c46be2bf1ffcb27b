use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failure reported by the remote platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteKind {
    NotFound,
    Unauthorized,
    Forbidden,
    RateLimited,
    Conflict,
    Unavailable,
    InvalidResponse,
    Cancelled,
    Other,
}

impl RemoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteKind::NotFound => "not_found",
            RemoteKind::Unauthorized => "unauthorized",
            RemoteKind::Forbidden => "forbidden",
            RemoteKind::RateLimited => "rate_limited",
            RemoteKind::Conflict => "conflict",
            RemoteKind::Unavailable => "unavailable",
            RemoteKind::InvalidResponse => "invalid_response",
            RemoteKind::Cancelled => "cancelled",
            RemoteKind::Other => "other",
        }
    }
}

impl std::fmt::Display for RemoteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote-platform failure as seen by a tool handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFailure {
    pub kind: RemoteKind,
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteFailure {
    pub fn new(kind: RemoteKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }
}

/// One item a bulk operation could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkFailure {
    pub item: String,
    pub reason: String,
}

/// Progress of a non-atomic bulk operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkProgress {
    pub processed: usize,
    pub total: usize,
    pub failures: Vec<BulkFailure>,
}

impl BulkProgress {
    pub fn new(total: usize) -> Self {
        Self {
            processed: 0,
            total,
            failures: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, item: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(BulkFailure {
            item: item.into(),
            reason: reason.into(),
        });
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.processed == self.total
    }
}

/// What a handler returns when it cannot produce a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerFailure {
    Remote(RemoteFailure),
    /// Bulk run finished but some items failed.
    Partial(BulkProgress),
    /// Bulk run stopped early because the call was cancelled.
    Interrupted(BulkProgress),
    InvalidWindow(String),
    Invalid(String),
}

#[derive(Error, Debug, Clone)]
pub enum ToolError {
    #[error("Tool name collision: {name}")]
    Collision { name: String },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Tool {tool} failed ({kind}): {message}")]
    Handler {
        tool: String,
        arguments: serde_json::Value,
        kind: RemoteKind,
        status: Option<u16>,
        message: String,
    },

    #[error(
        "Tool {tool} partially completed: {} of {} processed",
        progress.processed,
        progress.total
    )]
    PartialCompletion { tool: String, progress: BulkProgress },

    #[error("Tool {tool} timed out after {timeout_ms}ms")]
    Timeout {
        tool: String,
        timeout_ms: u64,
        progress: Option<BulkProgress>,
    },

    #[error("Invalid time window: {0}")]
    InvalidWindow(String),

    #[error("Internal error in {tool}: {message}")]
    Internal { tool: String, message: String },
}

impl ToolError {
    /// Stable identifier used in wire responses.
    pub fn error_kind(&self) -> &'static str {
        match self {
            ToolError::Collision { .. } => "collision",
            ToolError::UnknownTool { .. } => "unknown_tool",
            ToolError::Validation(_) => "validation",
            ToolError::Handler { .. } => "handler",
            ToolError::PartialCompletion { .. } => "partial_completion",
            ToolError::Timeout { .. } => "timeout",
            ToolError::InvalidWindow(_) => "invalid_window",
            ToolError::Internal { .. } => "internal",
        }
    }

    /// Structured context beyond the message, if any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ToolError::Handler {
                tool,
                arguments,
                kind,
                status,
                ..
            } => Some(serde_json::json!({
                "tool": tool,
                "arguments": arguments,
                "remoteKind": kind,
                "status": status,
            })),
            ToolError::PartialCompletion { progress, .. } => serde_json::to_value(progress).ok(),
            ToolError::Timeout {
                progress: Some(progress),
                ..
            } => serde_json::to_value(progress).ok(),
            ToolError::Collision { name } | ToolError::UnknownTool { name } => {
                Some(serde_json::json!({ "name": name }))
            }
            _ => None,
        }
    }
}
