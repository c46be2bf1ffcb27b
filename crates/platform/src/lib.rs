//! Boundary to the remote code-hosting platform.

pub mod error;
pub mod github;
pub mod pagination;
pub mod traits;
pub mod types;

pub use error::PlatformError;
pub use github::{GithubClient, GithubConfig};
pub use pagination::{collect_all, for_each_item, Page, PageCursor, WalkSummary, MAX_PER_PAGE};
pub use traits::PlatformClient;
pub use types::*;
