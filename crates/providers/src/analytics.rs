//! Repository analytics: key metrics and per-author contribution counts.
//!
//! Contribution counts merge three independently paginated streams
//! (commits, pull requests, issues) keyed by author. Every in-window event
//! lands in some bucket. Commits are bounded by the platform alone, so the
//! commit total equals the number of commits it returned.

use crate::support::{ArgsExt, ProviderContext, RemoteResultExt, REPO_NAME_DOC};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use hubgate_platform::{
    for_each_item, Commit, CommitFilter, Issue, IssueFilter, ItemState, PageCursor,
    PlatformClient, PlatformError, PullFilter, PullRequest, PullSort, RepoRef, SortDirection,
    User,
};
use hubgate_tools::{
    Arguments, ExecutionContext, HandlerFailure, ParamType, ParameterSchema, ToolDescriptor,
    ToolError, ToolHandler, ToolProvider,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const BASE_NAME: &str = "analytics";

/// Key under which events with no attributable author are reported.
pub const UNKNOWN_AUTHOR_KEY: &str = "<unknown>";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("Window start {start} is after end {end}")]
    Inverted {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("Cannot parse {field} '{value}' as a date or timestamp")]
    Unparseable { field: &'static str, value: String },
}

/// Closed interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, WindowError> {
        Self::new(
            parse_timestamp("start_date", start)?,
            parse_timestamp("end_date", end)?,
        )
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Accepts RFC 3339, naive ISO 8601 (taken as UTC) and plain dates (start of day).
fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, WindowError> {
    let trimmed = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| WindowError::Unparseable {
            field,
            value: value.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Author {
    Login(String),
    Unknown,
}

impl Author {
    fn from_user(user: Option<&User>) -> Self {
        match user {
            Some(user) if !user.login.is_empty() => Author::Login(user.login.clone()),
            _ => Author::Unknown,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Author::Login(login) => login,
            Author::Unknown => UNKNOWN_AUTHOR_KEY,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContributorRecord {
    pub commits: u64,
    pub pull_requests: u64,
    pub issues: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributorTally {
    pub records: HashMap<Author, ContributorRecord>,
}

impl ContributorTally {
    pub fn get(&self, author: &Author) -> Option<&ContributorRecord> {
        self.records.get(author)
    }

    /// Sum across all authors.
    pub fn totals(&self) -> ContributorRecord {
        self.records
            .values()
            .fold(ContributorRecord::default(), |acc, r| ContributorRecord {
                commits: acc.commits + r.commits,
                pull_requests: acc.pull_requests + r.pull_requests,
                issues: acc.issues + r.issues,
            })
    }

    pub fn to_json(&self) -> Value {
        let mut authors: Vec<_> = self.records.iter().collect();
        authors.sort_by(|a, b| a.0.cmp(b.0));
        let map: Map<String, Value> = authors
            .into_iter()
            .map(|(author, record)| (author.key().to_string(), json!(record)))
            .collect();
        Value::Object(map)
    }

    fn merge(
        &mut self,
        counts: HashMap<Author, u64>,
        field: impl Fn(&mut ContributorRecord) -> &mut u64,
    ) {
        for (author, count) in counts {
            *field(self.records.entry(author).or_default()) += count;
        }
    }
}

/// Count commits, pull requests and issues per author inside `window`.
pub async fn top_contributors(
    client: &dyn PlatformClient,
    repo: &RepoRef,
    window: &TimeWindow,
    per_page: u8,
    cancel: &CancellationToken,
) -> Result<ContributorTally, PlatformError> {
    let first = PageCursor::first(per_page);
    let (commits, pulls, issues) = tokio::try_join!(
        count_commits(client, repo, window, first, cancel),
        count_pull_requests(client, repo, window, first, cancel),
        count_issues(client, repo, window, first, cancel),
    )?;

    let mut tally = ContributorTally::default();
    tally.merge(commits, |r| &mut r.commits);
    tally.merge(pulls, |r| &mut r.pull_requests);
    tally.merge(issues, |r| &mut r.issues);
    debug!("Tallied {} authors for {}", tally.records.len(), repo);
    Ok(tally)
}

async fn count_commits(
    client: &dyn PlatformClient,
    repo: &RepoRef,
    window: &TimeWindow,
    first: PageCursor,
    cancel: &CancellationToken,
) -> Result<HashMap<Author, u64>, PlatformError> {
    let filter = CommitFilter {
        since: Some(window.start),
        until: Some(window.end),
    };
    let mut counts = HashMap::new();
    let summary = for_each_item(
        cancel,
        first,
        |cursor| client.list_commits(repo, &filter, cursor),
        |commit: Commit| {
            // `since`/`until` already bound the stream by committer date.
            *counts.entry(Author::from_user(commit.author.as_ref())).or_insert(0) += 1;
            ControlFlow::Continue(())
        },
    )
    .await?;
    debug!("Walked {} commit pages", summary.pages);
    Ok(counts)
}

async fn count_pull_requests(
    client: &dyn PlatformClient,
    repo: &RepoRef,
    window: &TimeWindow,
    first: PageCursor,
    cancel: &CancellationToken,
) -> Result<HashMap<Author, u64>, PlatformError> {
    let filter = PullFilter {
        state: ItemState::All,
        sort: PullSort::Created,
        direction: SortDirection::Asc,
    };
    let mut counts = HashMap::new();
    let summary = for_each_item(
        cancel,
        first,
        |cursor| client.list_pull_requests(repo, &filter, cursor),
        |pull: PullRequest| {
            if pull.created_at > window.end {
                return ControlFlow::Break(());
            }
            if pull.created_at >= window.start {
                *counts.entry(Author::from_user(pull.user.as_ref())).or_insert(0) += 1;
            }
            ControlFlow::Continue(())
        },
    )
    .await?;
    debug!(
        "Walked {} pull request pages (stopped early: {})",
        summary.pages, summary.stopped_early
    );
    Ok(counts)
}

async fn count_issues(
    client: &dyn PlatformClient,
    repo: &RepoRef,
    window: &TimeWindow,
    first: PageCursor,
    cancel: &CancellationToken,
) -> Result<HashMap<Author, u64>, PlatformError> {
    // `since` bounds update time, so creation time is checked on both ends.
    let filter = IssueFilter {
        state: ItemState::All,
        since: Some(window.start),
    };
    let mut counts = HashMap::new();
    for_each_item(
        cancel,
        first,
        |cursor| client.list_issues(repo, &filter, cursor),
        |issue: Issue| {
            if !issue.is_pull_request() && window.contains(issue.created_at) {
                *counts.entry(Author::from_user(issue.user.as_ref())).or_insert(0) += 1;
            }
            ControlFlow::Continue(())
        },
    )
    .await?;
    Ok(counts)
}

pub fn analytics_provider(ctx: ProviderContext) -> Result<ToolProvider, ToolError> {
    let mut provider = ToolProvider::new(BASE_NAME);
    provider
        .register(ToolDescriptor::new(
            "get_repo_key_metrics",
            "Stars, forks, watchers and other headline repository metrics",
            ParameterSchema::new().required("repo_name", ParamType::String, REPO_NAME_DOC),
            Arc::new(KeyMetrics(ctx.clone())),
        ))?
        .register(ToolDescriptor::new(
            "top_contributors",
            "Commits, pull requests and issues per author within a date range",
            ParameterSchema::new()
                .required("repo_name", ParamType::String, REPO_NAME_DOC)
                .required("start_date", ParamType::String, "Window start, ISO 8601 date or timestamp")
                .required("end_date", ParamType::String, "Window end, ISO 8601 date or timestamp"),
            Arc::new(TopContributors(ctx)),
        ))?;
    Ok(provider)
}

struct KeyMetrics(ProviderContext);

#[async_trait]
impl ToolHandler for KeyMetrics {
    async fn call(&self, _ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure> {
        let repo = args.repo("repo_name")?;
        let r = self.0.client.get_repository(&repo).await.remote()?;
        Ok(json!({
            "name": r.full_name,
            "description": r.description,
            "stars": r.stargazers_count,
            "forks": r.forks_count,
            "watchers": r.watchers_count,
            "subscribers": r.subscribers_count,
            "open_issues": r.open_issues_count,
            "size_kb": r.size,
            "language": r.language,
            "created_at": r.created_at.to_rfc3339(),
            "updated_at": r.updated_at.to_rfc3339(),
            "default_branch": r.default_branch,
        }))
    }
}

struct TopContributors(ProviderContext);

#[async_trait]
impl ToolHandler for TopContributors {
    async fn call(&self, ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure> {
        let window = TimeWindow::parse(args.text("start_date")?, args.text("end_date")?)
            .map_err(|e| HandlerFailure::InvalidWindow(e.to_string()))?;
        let repo = args.repo("repo_name")?;

        let tally = top_contributors(
            self.0.client.as_ref(),
            &repo,
            &window,
            self.0.per_page,
            &ctx.cancellation(),
        )
        .await
        .remote()?;

        let totals = tally.totals();
        info!(
            "{}: {} authors, {} commits, {} pull requests, {} issues",
            repo,
            tally.records.len(),
            totals.commits,
            totals.pull_requests,
            totals.issues
        );
        Ok(tally.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_accepts_common_formats() {
        let window = TimeWindow::parse("2024-01-01", "2024-06-30T12:00:00").unwrap();
        assert_eq!(window.start(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(window.end(), Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap());

        let offset = TimeWindow::parse("2024-01-01T02:00:00+02:00", "2024-01-02T00:00:00Z").unwrap();
        assert_eq!(offset.start(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_inverted_window_rejected() {
        let err = TimeWindow::parse("2024-12-31", "2024-01-01").unwrap_err();
        assert!(matches!(err, WindowError::Inverted { .. }));
    }

    #[test]
    fn test_garbage_date_rejected() {
        let err = TimeWindow::parse("last tuesday", "2024-01-01").unwrap_err();
        assert_eq!(
            err,
            WindowError::Unparseable {
                field: "start_date",
                value: "last tuesday".into()
            }
        );
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let window = TimeWindow::new(start, end).unwrap();
        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(end + chrono::Duration::seconds(1)));
        assert!(TimeWindow::new(start, start).is_ok());
    }

    #[test]
    fn test_unknown_author_key_and_json() {
        let mut tally = ContributorTally::default();
        tally.records.insert(
            Author::Unknown,
            ContributorRecord {
                commits: 1,
                ..Default::default()
            },
        );
        tally.records.insert(
            Author::Login("alice".into()),
            ContributorRecord {
                commits: 2,
                pull_requests: 1,
                issues: 0,
            },
        );
        let rendered = tally.to_json();
        assert_eq!(rendered["<unknown>"]["commits"], 1);
        assert_eq!(rendered["alice"]["pull_requests"], 1);
        assert_eq!(tally.totals().commits, 3);
    }

    #[test]
    fn test_empty_login_is_unknown() {
        let blank = User { login: String::new() };
        assert_eq!(Author::from_user(Some(&blank)), Author::Unknown);
        assert_eq!(Author::from_user(None), Author::Unknown);
    }
}
