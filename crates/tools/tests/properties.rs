use async_trait::async_trait;
use hubgate_tools::*;
use proptest::prelude::*;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

struct NoopHandler;

#[async_trait]
impl ToolHandler for NoopHandler {
    async fn call(&self, _ctx: ExecutionContext, _args: Arguments) -> Result<Value, HandlerFailure> {
        Ok(Value::Null)
    }
}

fn build_provider(base: &str, names: &BTreeSet<String>) -> ToolProvider {
    let mut provider = ToolProvider::new(base);
    for name in names {
        provider
            .register(ToolDescriptor::new(
                name.as_str(),
                "",
                ParameterSchema::new(),
                Arc::new(NoopHandler),
            ))
            .unwrap();
    }
    provider
}

fn tool_names() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-z]{1,6}", 1..6)
}

proptest! {
    #[test]
    fn distinct_prefixes_yield_exact_union(
        providers in prop::collection::vec(tool_names(), 1..5)
    ) {
        let mut registry = ToolRegistry::new();
        let mut expected = BTreeSet::new();

        for (i, names) in providers.iter().enumerate() {
            let prefix = format!("p{i}");
            registry.mount(build_provider("gen", names), Some(&prefix)).unwrap();
            expected.extend(names.iter().map(|n| qualify(Some(&prefix), n)));
        }

        let listed: BTreeSet<String> = registry
            .list_tools()
            .into_iter()
            .map(|entry| entry.qualified_name)
            .collect();
        prop_assert_eq!(&listed, &expected);
        prop_assert_eq!(registry.len(), expected.len());

        for name in &listed {
            prop_assert!(registry.resolve(name).is_ok());
        }
    }

    #[test]
    fn overlapping_unprefixed_mount_is_rejected_atomically(
        first in tool_names(),
        extra in tool_names(),
    ) {
        let mut registry = ToolRegistry::new();
        registry.mount(build_provider("first", &first), None).unwrap();
        let before = registry.tool_names();

        // share at least one name with the first provider
        let mut second = extra.clone();
        second.insert(first.iter().next().cloned().unwrap());

        let result = registry.mount(build_provider("second", &second), None);
        let is_collision = matches!(result, Err(ToolError::Collision { .. }));
        prop_assert!(is_collision);
        prop_assert_eq!(registry.tool_names(), before);
    }
}
