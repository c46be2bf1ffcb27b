//! In-memory platform used by the provider tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hubgate_platform::*;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeState {
    pub repositories: Vec<Repository>,
    pub issues: Vec<Issue>,
    pub pulls: Vec<PullRequest>,
    pub commits: Vec<Commit>,
    pub branches: Vec<Branch>,
    pub comments: Vec<ReviewComment>,
    pub milestones: Vec<Milestone>,
    pub created_issues: Vec<NewIssue>,
    pub deleted: Vec<String>,
    /// Issue or pull request numbers whose close request fails.
    pub fail_close: HashSet<u64>,
    /// Every remote call in order, by method name.
    pub calls: Vec<String>,
}

#[derive(Default)]
pub struct FakePlatform {
    pub state: Mutex<FakeState>,
}

pub fn ts(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .unwrap()
        .with_timezone(&Utc)
}

fn user(login: Option<&str>) -> Option<User> {
    login.map(|login| User {
        login: login.to_string(),
    })
}

pub fn issue(number: u64, login: Option<&str>, created: &str) -> Issue {
    Issue {
        number,
        title: format!("Issue {number}"),
        state: "open".into(),
        body: None,
        labels: Vec::new(),
        html_url: format!("https://github.test/octo/hub/issues/{number}"),
        user: user(login),
        created_at: ts(created),
        pull_request: None,
    }
}

pub fn pull(number: u64, login: Option<&str>, created: &str) -> PullRequest {
    PullRequest {
        number,
        title: format!("PR {number}"),
        state: "open".into(),
        html_url: format!("https://github.test/octo/hub/pull/{number}"),
        user: user(login),
        created_at: ts(created),
        updated_at: ts(created),
        base: BranchRef {
            ref_name: "main".into(),
        },
        head: BranchRef {
            ref_name: format!("feature-{number}"),
        },
        body: None,
        merged: None,
        mergeable_state: None,
    }
}

pub fn commit(sha: &str, login: Option<&str>, authored: &str) -> Commit {
    rebased_commit(sha, login, authored, authored)
}

/// A commit whose committer date differs from its author date.
pub fn rebased_commit(sha: &str, login: Option<&str>, authored: &str, committed: &str) -> Commit {
    Commit {
        sha: sha.into(),
        author: user(login),
        commit: CommitDetail {
            author: Some(GitActor {
                name: login.map(str::to_string),
                date: ts(authored),
            }),
            committer: Some(GitActor {
                name: Some("merger".into()),
                date: ts(committed),
            }),
        },
    }
}

pub fn repository(name: &str) -> Repository {
    Repository {
        name: name.into(),
        full_name: format!("octo/{name}"),
        description: Some("Gateway".into()),
        html_url: format!("https://github.test/octo/{name}"),
        private: false,
        stargazers_count: 42,
        forks_count: 7,
        watchers_count: 42,
        subscribers_count: Some(5),
        open_issues_count: 3,
        size: 1024,
        language: Some("Rust".into()),
        created_at: ts("2023-01-01T00:00:00Z"),
        updated_at: ts("2024-06-01T00:00:00Z"),
        default_branch: "main".into(),
    }
}

fn paginate<T: Clone>(items: &[T], cursor: PageCursor) -> Page<T> {
    let per_page = cursor.per_page as usize;
    let start = (cursor.page as usize - 1) * per_page;
    let end = (start + per_page).min(items.len());
    let slice = if start < items.len() {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };
    let next = (end < items.len()).then(|| cursor.next());
    Page { items: slice, next }
}

fn state_matches(state: &str, filter: ItemState) -> bool {
    filter == ItemState::All || state == filter.as_str()
}

impl FakePlatform {
    pub fn new(state: FakeState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, method: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == method).count()
    }

    fn record(&self, method: &str) -> std::sync::MutexGuard<'_, FakeState> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(method.to_string());
        state
    }
}

fn not_found(what: &str) -> PlatformError {
    PlatformError::NotFound(format!("{what} not found"))
}

#[async_trait]
impl PlatformClient for FakePlatform {
    async fn create_repository(&self, repo: &NewRepository) -> Result<Repository, PlatformError> {
        let mut state = self.record("create_repository");
        let mut created = repository(&repo.name);
        created.description = repo.description.clone();
        created.private = repo.private;
        state.repositories.push(created.clone());
        Ok(created)
    }

    async fn delete_repository(&self, repo: &RepoRef) -> Result<(), PlatformError> {
        let mut state = self.record("delete_repository");
        state.deleted.push(repo.to_string());
        Ok(())
    }

    async fn list_repositories(&self, cursor: PageCursor) -> Result<Page<Repository>, PlatformError> {
        let state = self.record("list_repositories");
        Ok(paginate(&state.repositories, cursor))
    }

    async fn get_repository(&self, repo: &RepoRef) -> Result<Repository, PlatformError> {
        let state = self.record("get_repository");
        state
            .repositories
            .iter()
            .find(|r| r.name == repo.name)
            .cloned()
            .ok_or_else(|| not_found("repository"))
    }

    async fn create_issue(&self, _repo: &RepoRef, issue: &NewIssue) -> Result<Issue, PlatformError> {
        let mut state = self.record("create_issue");
        let number = state.issues.len() as u64 + 1;
        let mut created = self::issue(number, Some("me"), "2024-06-01T00:00:00Z");
        created.title = issue.title.clone();
        created.body = issue.body.clone();
        state.created_issues.push(issue.clone());
        state.issues.push(created.clone());
        Ok(created)
    }

    async fn create_milestone(&self, _repo: &RepoRef, title: &str) -> Result<Milestone, PlatformError> {
        let mut state = self.record("create_milestone");
        let milestone = Milestone {
            number: state.milestones.len() as u64 + 1,
            title: title.to_string(),
        };
        state.milestones.push(milestone.clone());
        Ok(milestone)
    }

    async fn get_issue(&self, _repo: &RepoRef, number: u64) -> Result<Issue, PlatformError> {
        let state = self.record("get_issue");
        state
            .issues
            .iter()
            .find(|i| i.number == number)
            .cloned()
            .ok_or_else(|| not_found("issue"))
    }

    async fn set_issue_state(
        &self,
        _repo: &RepoRef,
        number: u64,
        new_state: ItemState,
    ) -> Result<Issue, PlatformError> {
        let mut state = self.record("set_issue_state");
        if state.fail_close.contains(&number) {
            return Err(PlatformError::Status {
                status: 500,
                message: format!("could not close #{number}"),
            });
        }
        let issue = state
            .issues
            .iter_mut()
            .find(|i| i.number == number)
            .ok_or_else(|| not_found("issue"))?;
        issue.state = new_state.as_str().to_string();
        Ok(issue.clone())
    }

    async fn list_issues(
        &self,
        _repo: &RepoRef,
        filter: &IssueFilter,
        cursor: PageCursor,
    ) -> Result<Page<Issue>, PlatformError> {
        // `since` is an update-time bound; the fake keeps no update times and
        // returns everything, like a repository where every issue was touched.
        let state = self.record("list_issues");
        let matching: Vec<Issue> = state
            .issues
            .iter()
            .filter(|i| state_matches(&i.state, filter.state))
            .cloned()
            .collect();
        Ok(paginate(&matching, cursor))
    }

    async fn create_pull_request(
        &self,
        _repo: &RepoRef,
        request: &NewPullRequest,
    ) -> Result<PullRequest, PlatformError> {
        let mut state = self.record("create_pull_request");
        let mut created = pull(state.pulls.len() as u64 + 100, Some("me"), "2024-06-01T00:00:00Z");
        created.title = request.title.clone();
        created.base.ref_name = request.base.clone();
        created.head.ref_name = request.head.clone();
        state.pulls.push(created.clone());
        Ok(created)
    }

    async fn get_pull_request(&self, _repo: &RepoRef, number: u64) -> Result<PullRequest, PlatformError> {
        let state = self.record("get_pull_request");
        state
            .pulls
            .iter()
            .find(|p| p.number == number)
            .cloned()
            .ok_or_else(|| not_found("pull request"))
    }

    async fn set_pull_request_state(
        &self,
        _repo: &RepoRef,
        number: u64,
        new_state: ItemState,
    ) -> Result<PullRequest, PlatformError> {
        let mut state = self.record("set_pull_request_state");
        if state.fail_close.contains(&number) {
            return Err(PlatformError::Conflict(format!("#{number} is locked")));
        }
        let pull = state
            .pulls
            .iter_mut()
            .find(|p| p.number == number)
            .ok_or_else(|| not_found("pull request"))?;
        pull.state = new_state.as_str().to_string();
        Ok(pull.clone())
    }

    async fn list_pull_requests(
        &self,
        _repo: &RepoRef,
        filter: &PullFilter,
        cursor: PageCursor,
    ) -> Result<Page<PullRequest>, PlatformError> {
        let state = self.record("list_pull_requests");
        let mut matching: Vec<PullRequest> = state
            .pulls
            .iter()
            .filter(|p| state_matches(&p.state, filter.state))
            .cloned()
            .collect();
        matching.sort_by_key(|p| match filter.sort {
            PullSort::Created => p.created_at,
            PullSort::Updated => p.updated_at,
        });
        if filter.direction == SortDirection::Desc {
            matching.reverse();
        }
        Ok(paginate(&matching, cursor))
    }

    async fn list_review_comments(
        &self,
        _repo: &RepoRef,
        _number: u64,
        cursor: PageCursor,
    ) -> Result<Page<ReviewComment>, PlatformError> {
        let state = self.record("list_review_comments");
        Ok(paginate(&state.comments, cursor))
    }

    async fn list_branches(&self, _repo: &RepoRef, cursor: PageCursor) -> Result<Page<Branch>, PlatformError> {
        let state = self.record("list_branches");
        Ok(paginate(&state.branches, cursor))
    }

    async fn get_branch(&self, _repo: &RepoRef, name: &str) -> Result<Branch, PlatformError> {
        let state = self.record("get_branch");
        state
            .branches
            .iter()
            .find(|b| b.name == name)
            .cloned()
            .ok_or_else(|| not_found("branch"))
    }

    async fn list_commits(
        &self,
        _repo: &RepoRef,
        filter: &CommitFilter,
        cursor: PageCursor,
    ) -> Result<Page<Commit>, PlatformError> {
        let state = self.record("list_commits");
        let matching: Vec<Commit> = state
            .commits
            .iter()
            .filter(|c| {
                // The platform bounds commits by committer date.
                let at = c.committed_at();
                filter.since.map_or(true, |since| at.map_or(true, |at| at >= since))
                    && filter.until.map_or(true, |until| at.map_or(true, |at| at <= until))
            })
            .cloned()
            .collect();
        Ok(paginate(&matching, cursor))
    }
}
