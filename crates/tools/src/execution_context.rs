use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Per-invocation context handed to a tool handler.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub call_id: String,
    pub deadline: Instant,
    cancel: CancellationToken,
}

impl ExecutionContext {
    pub fn new(timeout: Duration) -> Self {
        Self {
            call_id: uuid::Uuid::new_v4().to_string(),
            deadline: Instant::now() + timeout,
            cancel: CancellationToken::new(),
        }
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the invocation has been cancelled.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}
