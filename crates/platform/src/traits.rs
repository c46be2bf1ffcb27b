use crate::error::PlatformError;
use crate::pagination::{Page, PageCursor};
use crate::types::*;
use async_trait::async_trait;

/// Remote code-hosting platform operations consumed by the tool providers.
///
/// Every method is a single remote call. Implementations do not retry.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn create_repository(&self, repo: &NewRepository) -> Result<Repository, PlatformError>;

    async fn delete_repository(&self, repo: &RepoRef) -> Result<(), PlatformError>;

    /// Repositories of the authenticated user.
    async fn list_repositories(&self, cursor: PageCursor) -> Result<Page<Repository>, PlatformError>;

    async fn get_repository(&self, repo: &RepoRef) -> Result<Repository, PlatformError>;

    async fn create_issue(&self, repo: &RepoRef, issue: &NewIssue) -> Result<Issue, PlatformError>;

    async fn create_milestone(&self, repo: &RepoRef, title: &str) -> Result<Milestone, PlatformError>;

    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<Issue, PlatformError>;

    async fn set_issue_state(
        &self,
        repo: &RepoRef,
        number: u64,
        state: ItemState,
    ) -> Result<Issue, PlatformError>;

    async fn list_issues(
        &self,
        repo: &RepoRef,
        filter: &IssueFilter,
        cursor: PageCursor,
    ) -> Result<Page<Issue>, PlatformError>;

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        pull: &NewPullRequest,
    ) -> Result<PullRequest, PlatformError>;

    async fn get_pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest, PlatformError>;

    async fn set_pull_request_state(
        &self,
        repo: &RepoRef,
        number: u64,
        state: ItemState,
    ) -> Result<PullRequest, PlatformError>;

    async fn list_pull_requests(
        &self,
        repo: &RepoRef,
        filter: &PullFilter,
        cursor: PageCursor,
    ) -> Result<Page<PullRequest>, PlatformError>;

    async fn list_review_comments(
        &self,
        repo: &RepoRef,
        number: u64,
        cursor: PageCursor,
    ) -> Result<Page<ReviewComment>, PlatformError>;

    async fn list_branches(&self, repo: &RepoRef, cursor: PageCursor) -> Result<Page<Branch>, PlatformError>;

    async fn get_branch(&self, repo: &RepoRef, name: &str) -> Result<Branch, PlatformError>;

    async fn list_commits(
        &self,
        repo: &RepoRef,
        filter: &CommitFilter,
        cursor: PageCursor,
    ) -> Result<Page<Commit>, PlatformError>;
}
