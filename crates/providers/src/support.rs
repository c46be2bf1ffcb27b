//! Plumbing shared by every provider: the injected platform handle, error
//! classification, and the bulk-operation loop.

use hubgate_platform::{PageCursor, PlatformClient, PlatformError, RepoRef};
use hubgate_tools::{
    Arguments, BulkProgress, ExecutionContext, HandlerFailure, RemoteFailure, RemoteKind,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_PER_PAGE: u8 = 100;

pub const REPO_NAME_DOC: &str = "Repository as owner/name, or a bare name for the default owner";

/// Platform client plus listing settings, injected into every handler.
#[derive(Clone)]
pub struct ProviderContext {
    pub client: Arc<dyn PlatformClient>,
    pub per_page: u8,
}

impl ProviderContext {
    pub fn new(client: Arc<dyn PlatformClient>) -> Self {
        Self {
            client,
            per_page: DEFAULT_PER_PAGE,
        }
    }

    pub fn with_per_page(mut self, per_page: u8) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn first_page(&self) -> PageCursor {
        PageCursor::first(self.per_page)
    }
}

pub fn platform_failure(err: PlatformError) -> HandlerFailure {
    let status = err.status();
    let kind = match &err {
        PlatformError::NotFound(_) => RemoteKind::NotFound,
        PlatformError::Unauthorized(_) => RemoteKind::Unauthorized,
        PlatformError::Forbidden(_) => RemoteKind::Forbidden,
        PlatformError::RateLimited { .. } => RemoteKind::RateLimited,
        PlatformError::Conflict(_) => RemoteKind::Conflict,
        PlatformError::Status { status, .. } if *status >= 500 => RemoteKind::Unavailable,
        PlatformError::Status { .. } => RemoteKind::Other,
        PlatformError::Transport(_) => RemoteKind::Unavailable,
        PlatformError::Decode(_) => RemoteKind::InvalidResponse,
        PlatformError::Cancelled => RemoteKind::Cancelled,
        PlatformError::InvalidRepo(_) => return HandlerFailure::Invalid(err.to_string()),
    };
    HandlerFailure::Remote(RemoteFailure::new(kind, status, err.to_string()))
}

pub trait RemoteResultExt<T> {
    fn remote(self) -> Result<T, HandlerFailure>;
}

impl<T> RemoteResultExt<T> for Result<T, PlatformError> {
    fn remote(self) -> Result<T, HandlerFailure> {
        self.map_err(platform_failure)
    }
}

pub trait ArgsExt {
    fn repo(&self, name: &str) -> Result<RepoRef, HandlerFailure>;
    fn text(&self, name: &str) -> Result<&str, HandlerFailure>;
    fn number(&self, name: &str) -> Result<u64, HandlerFailure>;
    fn flag(&self, name: &str) -> Result<bool, HandlerFailure>;
}

impl ArgsExt for Arguments {
    fn repo(&self, name: &str) -> Result<RepoRef, HandlerFailure> {
        RepoRef::parse(self.text(name)?).remote()
    }

    fn text(&self, name: &str) -> Result<&str, HandlerFailure> {
        self.str(name).map_err(HandlerFailure::Invalid)
    }

    fn number(&self, name: &str) -> Result<u64, HandlerFailure> {
        self.u64(name).map_err(HandlerFailure::Invalid)
    }

    fn flag(&self, name: &str) -> Result<bool, HandlerFailure> {
        self.bool(name).map_err(HandlerFailure::Invalid)
    }
}

/// Apply `op` to each item in turn, continuing past per-item failures.
///
/// Not atomic: when cancelled, items already processed stay processed and
/// the progress so far is reported.
pub async fn run_bulk<T, R, F, Fut>(
    ctx: &ExecutionContext,
    operation: &str,
    items: Vec<T>,
    label: impl Fn(&T) -> String,
    mut op: F,
) -> Result<Vec<R>, HandlerFailure>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R, PlatformError>>,
{
    let mut progress = BulkProgress::new(items.len());
    let mut completed = Vec::with_capacity(items.len());

    for item in items {
        if ctx.is_cancelled() {
            return Err(HandlerFailure::Interrupted(progress));
        }
        let item_label = label(&item);
        let outcome = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(HandlerFailure::Interrupted(progress)),
            outcome = op(item) => outcome,
        };
        match outcome {
            Ok(result) => {
                progress.processed += 1;
                completed.push(result);
            }
            Err(err) => {
                warn!("{}: {} failed: {}", operation, item_label, err);
                progress.record_failure(item_label, err.to_string());
            }
        }
    }

    info!(
        "{}: processed {} of {}",
        operation, progress.processed, progress.total
    );
    if progress.failures.is_empty() {
        Ok(completed)
    } else {
        Err(HandlerFailure::Partial(progress))
    }
}

/// Truncate to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 200), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_platform_failure_mapping() {
        match platform_failure(PlatformError::RateLimited {
            status: 429,
            reset_at: None,
        }) {
            HandlerFailure::Remote(remote) => {
                assert_eq!(remote.kind, RemoteKind::RateLimited);
                assert_eq!(remote.status, Some(429));
            }
            other => panic!("unexpected {other:?}"),
        }
        match platform_failure(PlatformError::Status {
            status: 503,
            message: "down".into(),
        }) {
            HandlerFailure::Remote(remote) => {
                assert_eq!(remote.kind, RemoteKind::Unavailable);
                assert_eq!(remote.status, Some(503));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            platform_failure(PlatformError::InvalidRepo("a b".into())),
            HandlerFailure::Invalid(_)
        ));
    }

    #[tokio::test]
    async fn test_run_bulk_continues_past_failures() {
        let ctx = ExecutionContext::new(Duration::from_secs(5));
        let result = run_bulk(
            &ctx,
            "close",
            vec![1u64, 2, 3, 4, 5],
            |n| format!("#{n}"),
            |n| async move {
                if n == 3 {
                    Err(PlatformError::Conflict("already closed".into()))
                } else {
                    Ok(n)
                }
            },
        )
        .await;

        match result {
            Err(HandlerFailure::Partial(progress)) => {
                assert_eq!(progress.processed, 4);
                assert_eq!(progress.total, 5);
                assert_eq!(progress.failures.len(), 1);
                assert_eq!(progress.failures[0].item, "#3");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_bulk_stops_when_cancelled() {
        let ctx = ExecutionContext::new(Duration::from_secs(5));
        let cancel = ctx.cancellation();
        let result = run_bulk(&ctx, "close", vec![1u64, 2, 3], |n| n.to_string(), |n| {
            if n == 2 {
                cancel.cancel();
            }
            async move { Ok::<_, PlatformError>(n) }
        })
        .await;

        match result {
            Err(HandlerFailure::Interrupted(progress)) => {
                assert_eq!(progress.total, 3);
                assert_eq!(progress.processed, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
