//! Branch tools.

use crate::support::{ArgsExt, ProviderContext, RemoteResultExt, REPO_NAME_DOC};
use async_trait::async_trait;
use hubgate_platform::collect_all;
use hubgate_tools::{
    Arguments, ExecutionContext, HandlerFailure, ParamType, ParameterSchema, ToolDescriptor,
    ToolError, ToolHandler, ToolProvider,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub const BASE_NAME: &str = "branches";

const SHORT_SHA_LEN: usize = 7;

pub fn branches_provider(ctx: ProviderContext) -> Result<ToolProvider, ToolError> {
    let mut provider = ToolProvider::new(BASE_NAME);
    provider
        .register(ToolDescriptor::new(
            "list_branches_in_repo",
            "List branch names",
            ParameterSchema::new().required("repo_name", ParamType::String, REPO_NAME_DOC),
            Arc::new(ListBranches(ctx.clone())),
        ))?
        .register(ToolDescriptor::new(
            "get_default_branch",
            "Default branch name and its latest commit",
            ParameterSchema::new().required("repo_name", ParamType::String, REPO_NAME_DOC),
            Arc::new(DefaultBranch(ctx)),
        ))?;
    Ok(provider)
}

struct ListBranches(ProviderContext);

#[async_trait]
impl ToolHandler for ListBranches {
    async fn call(&self, ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure> {
        let repo = args.repo("repo_name")?;
        let client = &self.0.client;
        let branches = collect_all(&ctx.cancellation(), self.0.first_page(), |cursor| {
            client.list_branches(&repo, cursor)
        })
        .await
        .remote()?;
        let names: Vec<String> = branches.into_iter().map(|b| b.name).collect();
        Ok(json!(names))
    }
}

struct DefaultBranch(ProviderContext);

#[async_trait]
impl ToolHandler for DefaultBranch {
    async fn call(&self, _ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure> {
        let repo = args.repo("repo_name")?;
        let client = &self.0.client;
        let repository = client.get_repository(&repo).await.remote()?;
        let branch = client
            .get_branch(&repo, &repository.default_branch)
            .await
            .remote()?;
        let short: String = branch.commit.sha.chars().take(SHORT_SHA_LEN).collect();
        Ok(json!({ "name": branch.name, "latest_commit_sha": short }))
    }
}
