//! Repository management tools.

use crate::support::{ArgsExt, ProviderContext, RemoteResultExt, REPO_NAME_DOC};
use async_trait::async_trait;
use hubgate_platform::{collect_all, NewRepository};
use hubgate_tools::{
    Arguments, ExecutionContext, HandlerFailure, ParamType, ParameterSchema, ToolDescriptor,
    ToolError, ToolHandler, ToolProvider,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

pub const BASE_NAME: &str = "repo_management";

pub fn repositories_provider(ctx: ProviderContext) -> Result<ToolProvider, ToolError> {
    let mut provider = ToolProvider::new(BASE_NAME);
    provider
        .register(ToolDescriptor::new(
            "create_github_repo",
            "Create a repository for the authenticated user",
            ParameterSchema::new()
                .required("name", ParamType::String, "Repository name")
                .with_default("description", ParamType::String, "Short description", json!(""))
                .with_default("private", ParamType::Boolean, "Create as private", json!(false))
                .with_default(
                    "auto_init",
                    ParamType::Boolean,
                    "Initialize with a README",
                    json!(true),
                ),
            Arc::new(CreateRepo(ctx.clone())),
        ))?
        .register(ToolDescriptor::new(
            "delete_github_repo",
            "Delete a repository. Nothing is deleted unless confirm is true",
            ParameterSchema::new()
                .required("repo_name", ParamType::String, REPO_NAME_DOC)
                .required("confirm", ParamType::Boolean, "Must be true to delete"),
            Arc::new(DeleteRepo(ctx.clone())),
        ))?
        .register(ToolDescriptor::new(
            "list_github_repos",
            "List repository names of the authenticated user",
            ParameterSchema::new(),
            Arc::new(ListRepos(ctx)),
        ))?;
    Ok(provider)
}

struct CreateRepo(ProviderContext);

#[async_trait]
impl ToolHandler for CreateRepo {
    async fn call(&self, _ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure> {
        let mut request = NewRepository::new(args.text("name")?);
        request.description = args.non_empty_str("description").map(str::to_string);
        request.private = args.flag("private")?;
        request.auto_init = args.flag("auto_init")?;

        let repo = self.0.client.create_repository(&request).await.remote()?;
        info!("Created repository {}", repo.full_name);
        Ok(json!({ "name": repo.full_name, "url": repo.html_url }))
    }
}

struct DeleteRepo(ProviderContext);

#[async_trait]
impl ToolHandler for DeleteRepo {
    async fn call(&self, _ctx: ExecutionContext, args: Arguments) -> Result<Value, HandlerFailure> {
        let repo = args.repo("repo_name")?;
        if !args.flag("confirm")? {
            return Ok(json!({
                "deleted": false,
                "repository": repo.to_string(),
                "message": "Deletion not confirmed",
            }));
        }
        self.0.client.delete_repository(&repo).await.remote()?;
        info!("Deleted repository {}", repo);
        Ok(json!({ "deleted": true, "repository": repo.to_string() }))
    }
}

struct ListRepos(ProviderContext);

#[async_trait]
impl ToolHandler for ListRepos {
    async fn call(&self, ctx: ExecutionContext, _args: Arguments) -> Result<Value, HandlerFailure> {
        let client = &self.0.client;
        let repos = collect_all(&ctx.cancellation(), self.0.first_page(), |cursor| {
            client.list_repositories(cursor)
        })
        .await
        .remote()?;
        let names: Vec<String> = repos.into_iter().map(|r| r.name).collect();
        Ok(json!(names))
    }
}
