use crate::config::Config;
use anyhow::{Context, Result};
use hubgate_platform::{GithubClient, GithubConfig, PlatformClient};
use hubgate_providers::default_providers;
use hubgate_tools::{Dispatcher, ToolRegistry, TracingAuditLogger};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub fn build_client(config: &Config) -> Result<Arc<dyn PlatformClient>> {
    let mut github = GithubConfig::new(config.github_token()?);
    github.api_url = config.github.api_url.clone();
    github.owner = config.github.owner.clone();
    github.user_agent = config.github.user_agent.clone();
    let client = GithubClient::new(github).context("Failed to build GitHub client")?;
    Ok(Arc::new(client))
}

/// Mount every provider under its configured prefix. Any collision aborts.
pub fn build_registry(config: &Config, client: Arc<dyn PlatformClient>) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    let providers = default_providers(client, config.github.per_page)?;
    for (provider, prefix) in providers.into_iter().zip(config.mounts.in_mount_order()) {
        let base = provider.base_name().to_string();
        registry
            .mount(provider, prefix)
            .with_context(|| format!("Failed to mount provider {base}"))?;
    }
    for mount in registry.mounts() {
        info!(
            "Mounted {} ({} tools) under {}",
            mount.base_name,
            mount.tools,
            mount.prefix.as_deref().unwrap_or("<root>")
        );
    }
    Ok(registry)
}

pub fn build_dispatcher(config: &Config, registry: ToolRegistry) -> Dispatcher {
    Dispatcher::new(Arc::new(registry), Arc::new(TracingAuditLogger))
        .with_timeout(Duration::from_millis(config.dispatcher.timeout_ms))
        .with_cancel_grace(Duration::from_millis(config.dispatcher.cancel_grace_ms))
}

pub fn build_gateway(config: &Config) -> Result<Dispatcher> {
    let client = build_client(config)?;
    let registry = build_registry(config, client)?;
    info!("Gateway ready with {} tools", registry.len());
    Ok(build_dispatcher(config, registry))
}
