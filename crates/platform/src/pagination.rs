//! Cursor-driven page walking.
//!
//! Listings are fetched one page at a time. The walker checks for
//! cancellation before every page and lets the visitor stop early, so a
//! listing is never materialized unless the caller asks for it.

use crate::error::PlatformError;
use std::future::Future;
use std::ops::ControlFlow;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const MAX_PER_PAGE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub per_page: u8,
}

impl PageCursor {
    pub fn first(per_page: u8) -> Self {
        Self {
            page: 1,
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page + 1,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Where to resume; `None` on the last page.
    pub next: Option<PageCursor>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub pages: usize,
    pub items_seen: usize,
    pub stopped_early: bool,
}

/// Visit every item of a paginated listing in order.
pub async fn for_each_item<T, F, Fut, V>(
    cancel: &CancellationToken,
    first: PageCursor,
    mut fetch: F,
    mut visit: V,
) -> Result<WalkSummary, PlatformError>
where
    F: FnMut(PageCursor) -> Fut,
    Fut: Future<Output = Result<Page<T>, PlatformError>>,
    V: FnMut(T) -> ControlFlow<()>,
{
    let mut summary = WalkSummary::default();
    let mut cursor = Some(first);

    while let Some(current) = cursor {
        if cancel.is_cancelled() {
            return Err(PlatformError::Cancelled);
        }
        let page = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PlatformError::Cancelled),
            page = fetch(current) => page?,
        };
        summary.pages += 1;

        for item in page.items {
            summary.items_seen += 1;
            if visit(item).is_break() {
                summary.stopped_early = true;
                debug!("Stopped paging early at page {}", current.page);
                return Ok(summary);
            }
        }

        // a cursor that does not advance would loop forever
        cursor = page.next.filter(|next| next.page > current.page);
    }

    Ok(summary)
}

/// Fetch every page and return all items.
pub async fn collect_all<T, F, Fut>(
    cancel: &CancellationToken,
    first: PageCursor,
    fetch: F,
) -> Result<Vec<T>, PlatformError>
where
    F: FnMut(PageCursor) -> Fut,
    Fut: Future<Output = Result<Page<T>, PlatformError>>,
{
    let mut items = Vec::new();
    for_each_item(cancel, first, fetch, |item| {
        items.push(item);
        ControlFlow::Continue(())
    })
    .await?;
    Ok(items)
}
