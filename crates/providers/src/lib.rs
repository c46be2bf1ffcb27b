//! GitHub tool providers.
//!
//! Each provider is authored on its own and may reuse generic tool names;
//! the registry prefixes them at mount time.

pub mod analytics;
pub mod branches;
pub mod issues;
pub mod pull_requests;
pub mod repositories;
pub mod support;

pub use analytics::{
    analytics_provider, top_contributors, Author, ContributorRecord, ContributorTally, TimeWindow,
    WindowError, UNKNOWN_AUTHOR_KEY,
};
pub use branches::branches_provider;
pub use issues::issues_provider;
pub use pull_requests::pull_requests_provider;
pub use repositories::repositories_provider;
pub use support::{platform_failure, ProviderContext, DEFAULT_PER_PAGE};

use hubgate_platform::PlatformClient;
use hubgate_tools::{ToolError, ToolProvider};
use std::sync::Arc;

/// Every provider in mount order: repositories, issues, pull requests,
/// branches, analytics.
pub fn default_providers(
    client: Arc<dyn PlatformClient>,
    per_page: u8,
) -> Result<Vec<ToolProvider>, ToolError> {
    let ctx = ProviderContext::new(client).with_per_page(per_page);
    Ok(vec![
        repositories_provider(ctx.clone())?,
        issues_provider(ctx.clone())?,
        pull_requests_provider(ctx.clone())?,
        branches_provider(ctx.clone())?,
        analytics_provider(ctx)?,
    ])
}
