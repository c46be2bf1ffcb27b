//! Issue tracking tools.

use crate::support::{
    run_bulk, truncate_chars, ArgsExt, ProviderContext, RemoteResultExt, REPO_NAME_DOC,
};
use async_trait::async_trait;
use hubgate_platform::{collect_all, IssueFilter, ItemState, NewIssue};
use hubgate_tools::{
    Arguments, ExecutionContext, HandlerFailure, ParamType, ParameterSchema, ToolDescriptor,
    ToolError, ToolHandler, ToolProvider,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

pub const BASE_NAME: &str = "issue_tracking";

const BODY_PREVIEW_CHARS: usize = 200;

pub fn issues_provider(ctx: ProviderContext) -> Result<ToolProvider, ToolError> {
    let mut provider = ToolProvider::new(BASE_NAME);
    provider
        .register(ToolDescriptor::new(
            "create_issue",
            "Open an issue, optionally labelled, assigned and attached to a new milestone",
            ParameterSchema::new()
                .required("repo_name", ParamType::String, REPO_NAME_DOC)
                .required("issue_title", ParamType::String, "Issue title")
                .with_default("issue_body", ParamType::String, "Issue body", json!(""))
                .optional("label_name", ParamType::String, "Label to apply")
                .optional("assignee_username", ParamType::String, "User to assign")
                .optional(
                    "milestone_title",
                    ParamType::String,
                    "Title of a milestone to create and attach",
                ),
            Arc::new(CreateIssue(ctx.clone())),
        ))?
        .register(ToolDescriptor::new(
            "get_issue_from_repo",
            "Fetch one issue with a shortened body",
            ParameterSchema::new()
                .required("repo_name", ParamType::String, REPO_NAME_DOC)
                .required("issue_number", ParamType::Integer, "Issue number"),
            Arc::new(GetIssue(ctx.clone())),
        ))?
        .register(ToolDescriptor::new(
            "close_issue",
            "Close one issue",
            ParameterSchema::new()
                .required("repo_name", ParamType::String, REPO_NAME_DOC)
                .required("issue_number", ParamType::Integer, "Issue number"),
            Arc::new(CloseIssue(ctx.clone())),
        ))?
        .register(ToolDescriptor::new(
            "close_all_open_issues",
            "Close every open issue in the repository. Pull requests are left alone",
            ParameterSchema::new().required("repo_name", ParamType::String, REPO_NAME_DOC),
            Arc::new(CloseAllIssues(ctx)),
        ))?;
    Ok(provider)
}

struct CreateIssue(ProviderContext);

#[async_trait]
impl ToolHandler for CreateIssue {
    async fn call(&self, _ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure> {
        let repo = args.repo("repo_name")?;
        let client = &self.0.client;

        let milestone = match args.non_empty_str("milestone_title") {
            Some(title) => Some(client.create_milestone(&repo, title).await.remote()?.number),
            None => None,
        };
        let request = NewIssue {
            title: args.text("issue_title")?.to_string(),
            body: args.non_empty_str("issue_body").map(str::to_string),
            labels: args.non_empty_str("label_name").map(str::to_string).into_iter().collect(),
            assignees: args
                .non_empty_str("assignee_username")
                .map(str::to_string)
                .into_iter()
                .collect(),
            milestone,
        };

        let issue = client.create_issue(&repo, &request).await.remote()?;
        info!("Created issue #{} in {}", issue.number, repo);
        Ok(json!({ "number": issue.number, "title": issue.title }))
    }
}

struct GetIssue(ProviderContext);

#[async_trait]
impl ToolHandler for GetIssue {
    async fn call(&self, _ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure> {
        let repo = args.repo("repo_name")?;
        let issue = self
            .0
            .client
            .get_issue(&repo, args.number("issue_number")?)
            .await
            .remote()?;
        let labels: Vec<&str> = issue.labels.iter().map(|l| l.name.as_str()).collect();
        Ok(json!({
            "title": issue.title,
            "number": issue.number,
            "state": issue.state,
            "labels": labels,
            "body": truncate_chars(issue.body.as_deref().unwrap_or(""), BODY_PREVIEW_CHARS),
            "url": issue.html_url,
        }))
    }
}

struct CloseIssue(ProviderContext);

#[async_trait]
impl ToolHandler for CloseIssue {
    async fn call(&self, _ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure> {
        let repo = args.repo("repo_name")?;
        let number = args.number("issue_number")?;
        let issue = self
            .0
            .client
            .set_issue_state(&repo, number, ItemState::Closed)
            .await
            .remote()?;
        Ok(json!({
            "message": format!("Issue #{} closed", issue.number),
            "title": issue.title,
        }))
    }
}

struct CloseAllIssues(ProviderContext);

#[async_trait]
impl ToolHandler for CloseAllIssues {
    async fn call(&self, ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure> {
        let repo = args.repo("repo_name")?;
        let client = &self.0.client;
        let filter = IssueFilter {
            state: ItemState::Open,
            since: None,
        };

        let open: Vec<_> = collect_all(&ctx.cancellation(), self.0.first_page(), |cursor| {
            client.list_issues(&repo, &filter, cursor)
        })
        .await
        .remote()?
        .into_iter()
        .filter(|issue| !issue.is_pull_request())
        .collect();
        let total = open.len();

        let closed = run_bulk(
            &ctx,
            "close_all_open_issues",
            open,
            |issue| format!("#{}", issue.number),
            |issue| {
                let repo = &repo;
                async move { client.set_issue_state(repo, issue.number, ItemState::Closed).await }
            },
        )
        .await?;

        Ok(json!({ "closed": closed.len(), "total": total }))
    }
}
