use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "hubgate.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub github: GithubSection,
    pub dispatcher: DispatcherSection,
    pub mounts: MountsSection,
    pub llm: LlmSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            github: GithubSection::default(),
            dispatcher: DispatcherSection::default(),
            mounts: MountsSection::default(),
            llm: LlmSection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubSection {
    pub api_url: String,
    pub owner: Option<String>,
    pub per_page: u8,
    pub user_agent: String,
    pub token_env: String,
}

impl Default for GithubSection {
    fn default() -> Self {
        Self {
            api_url: hubgate_platform::github::DEFAULT_API_URL.to_string(),
            owner: None,
            per_page: hubgate_platform::MAX_PER_PAGE,
            user_agent: "hubgate".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherSection {
    pub timeout_ms: u64,
    pub cancel_grace_ms: u64,
}

impl Default for DispatcherSection {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            cancel_grace_ms: 500,
        }
    }
}

/// Mount prefix per provider. Inside a `[mounts]` table a missing key
/// mounts that provider unprefixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountsSection {
    #[serde(default)]
    pub repositories: Option<String>,
    #[serde(default)]
    pub issues: Option<String>,
    #[serde(default)]
    pub pull_requests: Option<String>,
    #[serde(default)]
    pub branches: Option<String>,
    #[serde(default)]
    pub analytics: Option<String>,
}

impl Default for MountsSection {
    fn default() -> Self {
        Self {
            repositories: Some("repos".to_string()),
            issues: Some("issues".to_string()),
            pull_requests: Some("pulls".to_string()),
            branches: Some("branches".to_string()),
            analytics: Some("analytics".to_string()),
        }
    }
}

impl MountsSection {
    /// Prefixes in provider mount order.
    pub fn in_mount_order(&self) -> [Option<&str>; 5] {
        [
            self.repositories.as_deref(),
            self.issues.as_deref(),
            self.pull_requests.as_deref(),
            self.branches.as_deref(),
            self.analytics.as_deref(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub max_steps: usize,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_steps: 8,
        }
    }
}

impl Config {
    /// Load from `path`. A missing file at the default location yields the
    /// defaults; an explicitly named file must exist.
    pub fn load(path: &Path, explicit: bool) -> Result<Self> {
        if !path.exists() && !explicit {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.github.per_page == 0 || self.github.per_page > hubgate_platform::MAX_PER_PAGE {
            bail!(
                "github.per_page must be between 1 and {}",
                hubgate_platform::MAX_PER_PAGE
            );
        }
        if self.dispatcher.timeout_ms == 0 {
            bail!("dispatcher.timeout_ms must be positive");
        }
        if self.llm.max_steps == 0 {
            bail!("llm.max_steps must be positive");
        }
        for prefix in self.mounts.in_mount_order().into_iter().flatten() {
            if prefix.trim().is_empty() {
                bail!("mount prefixes must not be blank; omit the key to mount unprefixed");
            }
        }
        Ok(())
    }

    pub fn github_token(&self) -> Result<String> {
        read_env(&self.github.token_env)
            .with_context(|| format!("Set {} to a GitHub access token", self.github.token_env))
    }

    pub fn llm_api_key(&self) -> Option<String> {
        read_env(&self.llm.api_key_env).ok()
    }
}

fn read_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => bail!("Environment variable {} is not set", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.mounts.issues.as_deref(), Some("issues"));
        assert_eq!(config.dispatcher.timeout_ms, 30_000);
    }

    #[test]
    fn test_mounts_table_missing_key_is_unprefixed() {
        let config: Config = toml::from_str(
            r#"
            [mounts]
            issues = "tickets"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.mounts.in_mount_order(),
            [None, Some("tickets"), None, None, None]
        );
    }

    #[test]
    fn test_blank_prefix_rejected() {
        let mut config = Config::default();
        config.mounts.branches = Some("  ".into());
        assert!(config.validate().is_err());
    }
}
