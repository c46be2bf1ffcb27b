use crate::descriptor::ToolDescriptor;
use crate::error::ToolError;
use crate::provider::ToolProvider;
use crate::wire::CatalogEntry;
use std::collections::HashMap;
use tracing::{debug, info};

/// Separator between a mount prefix and a tool's unqualified name.
pub const PREFIX_SEPARATOR: char = '.';

/// Build the qualified name for `name` mounted under `prefix`.
pub fn qualify(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}{PREFIX_SEPARATOR}{name}"),
        None => name.to_string(),
    }
}

/// Function-calling APIs only accept `[a-zA-Z0-9_-]` in names.
pub fn function_name(qualified_name: &str) -> String {
    qualified_name.replace(PREFIX_SEPARATOR, "__")
}

#[derive(Debug)]
struct Mount {
    provider: ToolProvider,
    prefix: Option<String>,
}

/// Base name and prefix of one mounted provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    pub base_name: String,
    pub prefix: Option<String>,
    pub tools: usize,
}

/// Collision-free namespace over every mounted provider.
///
/// Providers are mounted during startup; afterwards the registry is shared
/// behind an `Arc` and never changes. There is no way to unmount.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    mounts: Vec<Mount>,
    // qualified name -> (mount index, descriptor index)
    index: HashMap<String, (usize, usize)>,
    // function name -> qualified name
    functions: HashMap<String, String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every descriptor of `provider`, optionally under `prefix`.
    ///
    /// All-or-nothing: on error the registry is unchanged. Function names
    /// must be unique too, so `a.b` and `a__b` cannot both be mounted.
    pub fn mount(&mut self, provider: ToolProvider, prefix: Option<&str>) -> Result<(), ToolError> {
        if let Some(prefix) = prefix {
            if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
                return Err(ToolError::Validation(format!(
                    "invalid mount prefix '{prefix}' for provider '{}'",
                    provider.base_name()
                )));
            }
        }

        let mut staged: Vec<String> = Vec::with_capacity(provider.len());
        for descriptor in provider.descriptors() {
            let qualified = qualify(prefix, descriptor.name());
            if self.index.contains_key(&qualified) || staged.contains(&qualified) {
                debug!(
                    "Rejecting mount of '{}': {} already registered",
                    provider.base_name(),
                    qualified
                );
                return Err(ToolError::Collision { name: qualified });
            }
            let function = function_name(&qualified);
            if self.functions.contains_key(&function)
                || staged.iter().any(|q| function_name(q) == function)
            {
                debug!(
                    "Rejecting mount of '{}': function name {} already advertised",
                    provider.base_name(),
                    function
                );
                return Err(ToolError::Collision { name: qualified });
            }
            staged.push(qualified);
        }

        let mount_idx = self.mounts.len();
        for (descriptor_idx, qualified) in staged.into_iter().enumerate() {
            self.functions.insert(function_name(&qualified), qualified.clone());
            self.index.insert(qualified, (mount_idx, descriptor_idx));
        }

        info!(
            "Mounted provider '{}' ({} tools) with prefix {:?}",
            provider.base_name(),
            provider.len(),
            prefix
        );
        self.mounts.push(Mount {
            provider,
            prefix: prefix.map(str::to_string),
        });
        Ok(())
    }

    pub fn resolve(&self, qualified_name: &str) -> Result<&ToolDescriptor, ToolError> {
        self.index
            .get(qualified_name)
            .and_then(|(m, d)| self.mounts.get(*m)?.provider.descriptors().get(*d))
            .ok_or_else(|| ToolError::UnknownTool {
                name: qualified_name.to_string(),
            })
    }

    fn entries(&self) -> impl Iterator<Item = (String, &ToolDescriptor)> + '_ {
        self.mounts.iter().flat_map(|mount| {
            mount
                .provider
                .descriptors()
                .iter()
                .map(move |d| (qualify(mount.prefix.as_deref(), d.name()), d))
        })
    }

    /// Catalog in mount order, then provider registration order.
    pub fn list_tools(&self) -> Vec<CatalogEntry> {
        self.entries()
            .map(|(qualified_name, d)| CatalogEntry {
                qualified_name,
                description: d.description().to_string(),
                parameter_schema: d.schema().to_json_schema(),
            })
            .collect()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.entries().map(|(name, _)| name).collect()
    }

    pub fn mounts(&self) -> Vec<MountInfo> {
        self.mounts
            .iter()
            .map(|m| MountInfo {
                base_name: m.provider.base_name().to_string(),
                prefix: m.prefix.clone(),
                tools: m.provider.len(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// OpenAI-style function declarations for every tool.
    pub fn function_schemas(&self) -> Vec<serde_json::Value> {
        self.entries()
            .map(|(qualified, d)| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": function_name(&qualified),
                        "description": d.description(),
                        "parameters": d.schema().to_json_schema()
                    }
                })
            })
            .collect()
    }

    /// Map a function name produced by [`function_name`] back to its tool.
    pub fn resolve_function_name(&self, name: &str) -> Option<String> {
        if self.index.contains_key(name) {
            return Some(name.to_string());
        }
        self.functions.get(name).cloned()
    }
}
