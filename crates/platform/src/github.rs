//! GitHub REST v3 implementation of [`PlatformClient`].

use crate::error::PlatformError;
use crate::pagination::{Page, PageCursor};
use crate::traits::PlatformClient;
use crate::types::*;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, LINK};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub api_url: String,
    pub token: String,
    /// Owner used for bare repository names. When unset, the authenticated
    /// user's login is looked up once.
    pub owner: Option<String>,
    pub user_agent: String,
}

impl GithubConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            owner: None,
            user_agent: "hubgate".to_string(),
        }
    }
}

pub struct GithubClient {
    client: Client,
    base_url: String,
    token: String,
    owner: Option<String>,
    login: OnceCell<String>,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> Result<Self, PlatformError> {
        let client = Client::builder()
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| PlatformError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token,
            owner: config.owner,
            login: OnceCell::new(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn authenticated_login(&self) -> Result<&str, PlatformError> {
        let login = self
            .login
            .get_or_try_init(|| async {
                let user: User = self.send(self.request(Method::GET, "/user")).await?;
                debug!("Resolved authenticated user: {}", user.login);
                Ok::<_, PlatformError>(user.login)
            })
            .await?;
        Ok(login.as_str())
    }

    async fn repo_path(&self, repo: &RepoRef) -> Result<String, PlatformError> {
        let owner = match (&repo.owner, &self.owner) {
            (Some(owner), _) | (None, Some(owner)) => owner.clone(),
            (None, None) => self.authenticated_login().await?.to_string(),
        };
        Ok(format!("/repos/{}/{}", owner, repo.name))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, PlatformError> {
        let response = checked(builder.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), PlatformError> {
        checked(builder.send().await?).await?;
        Ok(())
    }

    async fn send_page<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        cursor: PageCursor,
    ) -> Result<Page<T>, PlatformError> {
        let builder = builder.query(&[
            ("per_page", cursor.per_page.to_string()),
            ("page", cursor.page.to_string()),
        ]);
        let response = checked(builder.send().await?).await?;
        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(|link| next_page(link, cursor));
        let items = response.json::<Vec<T>>().await?;
        Ok(Page { items, next })
    }
}

/// Turn a non-success response into a classified error.
async fn checked(response: Response) -> Result<Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let (remaining, reset) = rate_limit_headers(response.headers());
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|body| body["message"].as_str().map(str::to_string))
        .unwrap_or(text);
    Err(PlatformError::from_response(status.as_u16(), remaining, reset, message))
}

fn rate_limit_headers(headers: &HeaderMap) -> (Option<u64>, Option<i64>) {
    (
        header_value(headers, "x-ratelimit-remaining"),
        header_value(headers, "x-ratelimit-reset"),
    )
}

fn header_value<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Extract the `rel="next"` page from a `Link` header.
pub fn next_page(link: &str, current: PageCursor) -> Option<PageCursor> {
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        if !params.split(';').any(|p| p.trim() == r#"rel="next""#) {
            return None;
        }
        let url = Url::parse(target.trim().trim_start_matches('<').trim_end_matches('>')).ok()?;
        let page = url
            .query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())?;
        Some(PageCursor {
            page,
            per_page: current.per_page,
        })
    })
}

fn sort_param(sort: PullSort) -> &'static str {
    match sort {
        PullSort::Created => "created",
        PullSort::Updated => "updated",
    }
}

fn direction_param(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "asc",
        SortDirection::Desc => "desc",
    }
}

#[async_trait]
impl PlatformClient for GithubClient {
    async fn create_repository(&self, repo: &NewRepository) -> Result<Repository, PlatformError> {
        self.send(self.request(Method::POST, "/user/repos").json(repo)).await
    }

    async fn delete_repository(&self, repo: &RepoRef) -> Result<(), PlatformError> {
        let path = self.repo_path(repo).await?;
        self.send_empty(self.request(Method::DELETE, &path)).await
    }

    async fn list_repositories(&self, cursor: PageCursor) -> Result<Page<Repository>, PlatformError> {
        self.send_page(self.request(Method::GET, "/user/repos"), cursor).await
    }

    async fn get_repository(&self, repo: &RepoRef) -> Result<Repository, PlatformError> {
        let path = self.repo_path(repo).await?;
        self.send(self.request(Method::GET, &path)).await
    }

    async fn create_issue(&self, repo: &RepoRef, issue: &NewIssue) -> Result<Issue, PlatformError> {
        let path = format!("{}/issues", self.repo_path(repo).await?);
        self.send(self.request(Method::POST, &path).json(issue)).await
    }

    async fn create_milestone(&self, repo: &RepoRef, title: &str) -> Result<Milestone, PlatformError> {
        let path = format!("{}/milestones", self.repo_path(repo).await?);
        self.send(self.request(Method::POST, &path).json(&json!({ "title": title })))
            .await
    }

    async fn get_issue(&self, repo: &RepoRef, number: u64) -> Result<Issue, PlatformError> {
        let path = format!("{}/issues/{}", self.repo_path(repo).await?, number);
        self.send(self.request(Method::GET, &path)).await
    }

    async fn set_issue_state(
        &self,
        repo: &RepoRef,
        number: u64,
        state: ItemState,
    ) -> Result<Issue, PlatformError> {
        let path = format!("{}/issues/{}", self.repo_path(repo).await?, number);
        self.send(
            self.request(Method::PATCH, &path)
                .json(&json!({ "state": state.as_str() })),
        )
        .await
    }

    async fn list_issues(
        &self,
        repo: &RepoRef,
        filter: &IssueFilter,
        cursor: PageCursor,
    ) -> Result<Page<Issue>, PlatformError> {
        let path = format!("{}/issues", self.repo_path(repo).await?);
        let mut builder = self
            .request(Method::GET, &path)
            .query(&[("state", filter.state.as_str())]);
        if let Some(since) = filter.since {
            builder = builder.query(&[("since", since.to_rfc3339())]);
        }
        self.send_page(builder, cursor).await
    }

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        pull: &NewPullRequest,
    ) -> Result<PullRequest, PlatformError> {
        let path = format!("{}/pulls", self.repo_path(repo).await?);
        self.send(self.request(Method::POST, &path).json(pull)).await
    }

    async fn get_pull_request(&self, repo: &RepoRef, number: u64) -> Result<PullRequest, PlatformError> {
        let path = format!("{}/pulls/{}", self.repo_path(repo).await?, number);
        self.send(self.request(Method::GET, &path)).await
    }

    async fn set_pull_request_state(
        &self,
        repo: &RepoRef,
        number: u64,
        state: ItemState,
    ) -> Result<PullRequest, PlatformError> {
        let path = format!("{}/pulls/{}", self.repo_path(repo).await?, number);
        self.send(
            self.request(Method::PATCH, &path)
                .json(&json!({ "state": state.as_str() })),
        )
        .await
    }

    async fn list_pull_requests(
        &self,
        repo: &RepoRef,
        filter: &PullFilter,
        cursor: PageCursor,
    ) -> Result<Page<PullRequest>, PlatformError> {
        let path = format!("{}/pulls", self.repo_path(repo).await?);
        let builder = self.request(Method::GET, &path).query(&[
            ("state", filter.state.as_str()),
            ("sort", sort_param(filter.sort)),
            ("direction", direction_param(filter.direction)),
        ]);
        self.send_page(builder, cursor).await
    }

    async fn list_review_comments(
        &self,
        repo: &RepoRef,
        number: u64,
        cursor: PageCursor,
    ) -> Result<Page<ReviewComment>, PlatformError> {
        let path = format!("{}/pulls/{}/comments", self.repo_path(repo).await?, number);
        self.send_page(self.request(Method::GET, &path), cursor).await
    }

    async fn list_branches(&self, repo: &RepoRef, cursor: PageCursor) -> Result<Page<Branch>, PlatformError> {
        let path = format!("{}/branches", self.repo_path(repo).await?);
        self.send_page(self.request(Method::GET, &path), cursor).await
    }

    async fn get_branch(&self, repo: &RepoRef, name: &str) -> Result<Branch, PlatformError> {
        let path = format!("{}/branches/{}", self.repo_path(repo).await?, name);
        self.send(self.request(Method::GET, &path)).await
    }

    async fn list_commits(
        &self,
        repo: &RepoRef,
        filter: &CommitFilter,
        cursor: PageCursor,
    ) -> Result<Page<Commit>, PlatformError> {
        let path = format!("{}/commits", self.repo_path(repo).await?);
        let mut builder = self.request(Method::GET, &path);
        if let Some(since) = filter.since {
            builder = builder.query(&[("since", since.to_rfc3339())]);
        }
        if let Some(until) = filter.until {
            builder = builder.query(&[("until", until.to_rfc3339())]);
        }
        self.send_page(builder, cursor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_page_from_link_header() {
        let link = r#"<https://api.github.com/repositories/1/issues?state=all&per_page=50&page=3>; rel="next", <https://api.github.com/repositories/1/issues?state=all&per_page=50&page=9>; rel="last""#;
        let next = next_page(link, PageCursor::first(50)).unwrap();
        assert_eq!(next.page, 3);
        assert_eq!(next.per_page, 50);
    }

    #[test]
    fn test_no_next_on_last_page() {
        let link = r#"<https://api.github.com/x?page=1>; rel="first", <https://api.github.com/x?page=4>; rel="prev""#;
        assert!(next_page(link, PageCursor::first(30)).is_none());
    }

    #[test]
    fn test_per_page_param_is_not_mistaken_for_page() {
        let link = r#"<https://api.github.com/x?per_page=7&page=2>; rel="next""#;
        assert_eq!(next_page(link, PageCursor::first(7)).unwrap().page, 2);
    }
}
