//! Pull request tools.

use crate::support::{run_bulk, ArgsExt, ProviderContext, RemoteResultExt, REPO_NAME_DOC};
use async_trait::async_trait;
use hubgate_platform::{
    collect_all, ItemState, NewPullRequest, PullFilter, PullRequest, PullSort, SortDirection,
};
use hubgate_tools::{
    Arguments, ExecutionContext, HandlerFailure, ParamType, ParameterSchema, ToolDescriptor,
    ToolError, ToolHandler, ToolProvider,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

pub const BASE_NAME: &str = "pull_requests";

pub fn pull_requests_provider(ctx: ProviderContext) -> Result<ToolProvider, ToolError> {
    let repo_only = || ParameterSchema::new().required("repo_name", ParamType::String, REPO_NAME_DOC);
    let with_number = || repo_only().required("pr_number", ParamType::Integer, "Pull request number");

    let mut provider = ToolProvider::new(BASE_NAME);
    provider
        .register(ToolDescriptor::new(
            "create_pull_request",
            "Open a pull request from head_branch into base_branch",
            repo_only()
                .required("base_branch", ParamType::String, "Branch to merge into")
                .required("head_branch", ParamType::String, "Branch with the changes")
                .required("pr_title", ParamType::String, "Pull request title")
                .optional("pr_body", ParamType::String, "Pull request description"),
            Arc::new(CreatePull(ctx.clone())),
        ))?
        .register(ToolDescriptor::new(
            "get_pull_request_details",
            "Fetch one pull request",
            with_number(),
            Arc::new(GetPull(ctx.clone())),
        ))?
        .register(ToolDescriptor::new(
            "list_open_pull_requests",
            "List open pull requests",
            repo_only(),
            Arc::new(ListOpenPulls(ctx.clone())),
        ))?
        .register(ToolDescriptor::new(
            "list_recently_updated_prs",
            "List open pull requests, most recently updated first",
            repo_only(),
            Arc::new(ListRecentPulls(ctx.clone())),
        ))?
        .register(ToolDescriptor::new(
            "list_pr_comments",
            "List review comment bodies on a pull request",
            with_number(),
            Arc::new(ListPullComments(ctx.clone())),
        ))?
        .register(ToolDescriptor::new(
            "close_all_pull_requests",
            "Close every open pull request in the repository",
            repo_only(),
            Arc::new(CloseAllPulls(ctx)),
        ))?;
    Ok(provider)
}

fn open_filter(sort: PullSort, direction: SortDirection) -> PullFilter {
    PullFilter {
        state: ItemState::Open,
        sort,
        direction,
    }
}

async fn collect_open(
    ctx: &ExecutionContext,
    provider: &ProviderContext,
    args: &Arguments,
    filter: PullFilter,
) -> Result<Vec<PullRequest>, HandlerFailure> {
    let repo = args.repo("repo_name")?;
    let client = &provider.client;
    collect_all(&ctx.cancellation(), provider.first_page(), |cursor| {
        client.list_pull_requests(&repo, &filter, cursor)
    })
    .await
    .remote()
}

struct CreatePull(ProviderContext);

#[async_trait]
impl ToolHandler for CreatePull {
    async fn call(&self, _ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure> {
        let repo = args.repo("repo_name")?;
        let request = NewPullRequest {
            title: args.text("pr_title")?.to_string(),
            head: args.text("head_branch")?.to_string(),
            base: args.text("base_branch")?.to_string(),
            body: args.non_empty_str("pr_body").map(str::to_string),
        };
        let pull = self.0.client.create_pull_request(&repo, &request).await.remote()?;
        info!("Opened pull request #{} in {}", pull.number, repo);
        Ok(json!({
            "title": pull.title,
            "number": pull.number,
            "state": pull.state,
            "url": pull.html_url,
        }))
    }
}

struct GetPull(ProviderContext);

#[async_trait]
impl ToolHandler for GetPull {
    async fn call(&self, _ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure> {
        let repo = args.repo("repo_name")?;
        let pull = self
            .0
            .client
            .get_pull_request(&repo, args.number("pr_number")?)
            .await
            .remote()?;
        Ok(json!({
            "title": pull.title,
            "number": pull.number,
            "state": pull.state,
            "user": pull.user.map(|u| u.login),
            "created_at": pull.created_at.to_rfc3339(),
            "updated_at": pull.updated_at.to_rfc3339(),
            "base_branch": pull.base.ref_name,
            "head_branch": pull.head.ref_name,
            "body": pull.body,
            "merged": pull.merged,
            "mergeable_state": pull.mergeable_state,
            "url": pull.html_url,
        }))
    }
}

struct ListOpenPulls(ProviderContext);

#[async_trait]
impl ToolHandler for ListOpenPulls {
    async fn call(&self, ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure> {
        let filter = open_filter(PullSort::Created, SortDirection::Desc);
        let pulls = collect_open(&ctx, &self.0, &args, filter).await?;
        let listed: Vec<Value> = pulls
            .into_iter()
            .map(|p| json!({ "title": p.title, "number": p.number, "url": p.html_url }))
            .collect();
        Ok(Value::Array(listed))
    }
}

struct ListRecentPulls(ProviderContext);

#[async_trait]
impl ToolHandler for ListRecentPulls {
    async fn call(&self, ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure> {
        let filter = open_filter(PullSort::Updated, SortDirection::Desc);
        let mut pulls = collect_open(&ctx, &self.0, &args, filter).await?;
        // Pages may shift while walking; keep the order exact.
        pulls.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        let listed: Vec<Value> = pulls
            .into_iter()
            .map(|p| {
                json!({
                    "title": p.title,
                    "number": p.number,
                    "updated_at": p.updated_at.to_rfc3339(),
                    "url": p.html_url,
                })
            })
            .collect();
        Ok(Value::Array(listed))
    }
}

struct ListPullComments(ProviderContext);

#[async_trait]
impl ToolHandler for ListPullComments {
    async fn call(&self, ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure> {
        let repo = args.repo("repo_name")?;
        let number = args.number("pr_number")?;
        let client = &self.0.client;
        let comments = collect_all(&ctx.cancellation(), self.0.first_page(), |cursor| {
            client.list_review_comments(&repo, number, cursor)
        })
        .await
        .remote()?;
        let bodies: Vec<String> = comments.into_iter().map(|c| c.body).collect();
        Ok(json!(bodies))
    }
}

struct CloseAllPulls(ProviderContext);

#[async_trait]
impl ToolHandler for CloseAllPulls {
    async fn call(&self, ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure> {
        let repo = args.repo("repo_name")?;
        let filter = open_filter(PullSort::Created, SortDirection::Asc);
        let open = collect_open(&ctx, &self.0, &args, filter).await?;
        let total = open.len();
        let client = &self.0.client;

        let closed = run_bulk(
            &ctx,
            "close_all_pull_requests",
            open,
            |pull| format!("#{}", pull.number),
            |pull| {
                let repo = &repo;
                async move {
                    client
                        .set_pull_request_state(repo, pull.number, ItemState::Closed)
                        .await
                }
            },
        )
        .await?;

        let confirmations: Vec<Value> = closed
            .into_iter()
            .map(|p| json!({ "number": p.number, "title": p.title, "closed": true }))
            .collect();
        Ok(json!({ "closed": confirmations, "total": total }))
    }
}
