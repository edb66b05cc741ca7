//! Tool-schema-backed dynamic source.

use std::sync::Arc;

use async_trait::async_trait;
use moka::sync::Cache;
use serde_json::Value;

use crate::command::{boxed_outcome, CommandExecute, CommandOutcome, CommandSpec};
use crate::error::ShellResult;
use crate::schema::{command_from_tool, ToolDescriptor};

use super::DynamicCommandSource;

const TOOLS_KEY: &str = "tools";

/// Collaborator owning the tool transport: listing declared tools and
/// invoking them by their original name.
#[async_trait]
pub trait ToolCatalog: Send + Sync {
    async fn tools(&self) -> ShellResult<Vec<ToolDescriptor>>;

    async fn call(&self, tool_name: &str, args: Value) -> ShellResult<Value>;
}

/// Dynamic source that turns a tool catalog into commands.
pub struct ToolCommandSource {
    namespace: String,
    catalog: Arc<dyn ToolCatalog>,
    cache: Cache<String, Arc<Vec<ToolDescriptor>>>,
}

impl ToolCommandSource {
    pub fn new(namespace: impl Into<String>, catalog: Arc<dyn ToolCatalog>) -> Self {
        Self {
            namespace: namespace.into(),
            catalog,
            cache: Cache::new(1),
        }
    }

    async fn tools(&self) -> ShellResult<Arc<Vec<ToolDescriptor>>> {
        if let Some(tools) = self.cache.get(TOOLS_KEY) {
            return Ok(tools);
        }
        let tools = Arc::new(self.catalog.tools().await?);
        self.cache.insert(TOOLS_KEY.to_string(), Arc::clone(&tools));
        Ok(tools)
    }

    /// Handler bound to the tool's original (unstripped) name, which is what
    /// the catalog dispatches on.
    fn handler_for(&self, tool: &ToolDescriptor) -> CommandExecute {
        let catalog = Arc::clone(&self.catalog);
        let tool_name = tool.name.clone();
        Arc::new(move |args, _ctx| {
            let catalog = Arc::clone(&catalog);
            let tool_name = tool_name.clone();
            boxed_outcome(async move {
                let data = catalog.call(&tool_name, args).await?;
                Ok(CommandOutcome::ok(data))
            })
        })
    }
}

#[async_trait]
impl DynamicCommandSource for ToolCommandSource {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn discover(&self) -> ShellResult<Vec<CommandSpec>> {
        let tools = self.tools().await?;
        let commands: Vec<CommandSpec> = tools
            .iter()
            .map(|tool| command_from_tool(&self.namespace, tool, self.handler_for(tool)))
            .collect();
        tracing::debug!(
            namespace = %self.namespace,
            tools = tools.len(),
            "tool source discovery complete"
        );
        Ok(commands)
    }

    async fn refresh(&self) -> ShellResult<()> {
        self.cache.invalidate(TOOLS_KEY);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::make_context;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeCatalog {
        reads: AtomicUsize,
        calls: Mutex<Vec<String>>,
    }

    impl FakeCatalog {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                reads: AtomicUsize::new(0),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ToolCatalog for FakeCatalog {
        async fn tools(&self) -> ShellResult<Vec<ToolDescriptor>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ToolDescriptor {
                name: "mcp_store_memory".to_string(),
                description: Some("Persist a memory entry".to_string()),
                category: Some("memory".to_string()),
                input_schema: json!({
                    "type": "object",
                    "required": ["content"],
                    "properties": {
                        "content": {"type": "string"},
                        "tags": {"type": "array"}
                    }
                }),
            }])
        }

        async fn call(&self, tool_name: &str, args: Value) -> ShellResult<Value> {
            self.calls.lock().unwrap().push(tool_name.to_string());
            Ok(json!({"tool": tool_name, "args": args}))
        }
    }

    #[tokio::test]
    async fn discover_maps_tools_into_commands() {
        let source = ToolCommandSource::new("tools", FakeCatalog::new());
        let commands = source.discover().await.unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].name, "store-memory");
        assert_eq!(commands[0].category, "memory");
        assert!(commands[0].examples[0].contains("store-memory --content"));
    }

    #[tokio::test]
    async fn handler_calls_the_original_tool_name() {
        let catalog = FakeCatalog::new();
        let source = ToolCommandSource::new("tools", catalog.clone());
        let command = source.discover().await.unwrap().remove(0);

        let outcome = (command.handler)(json!({"content": "note"}), make_context())
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(
            catalog.calls.lock().unwrap().as_slice(),
            ["mcp_store_memory"]
        );
    }

    #[tokio::test]
    async fn discovered_tool_is_invocable_through_the_repl_path() {
        use crate::command::{evaluate, parse_input};
        use crate::registry::CommandRegistry;
        use crate::router::CommandRouter;

        let catalog = FakeCatalog::new();
        let mut registry = CommandRegistry::new();
        registry.register_source(Arc::new(ToolCommandSource::new("tools", catalog.clone())));
        let report = registry.discover_commands().await;
        assert!(report.is_clean());

        let parsed = parse_input(r#"tools.store-memory --content "standup notes""#, None).unwrap();
        let outcome = evaluate(
            parsed,
            &registry,
            &CommandRouter::new(),
            make_context(),
            None,
        )
        .await;

        assert!(outcome.success);
        let data = outcome.data.unwrap();
        assert_eq!(data["tool"], "mcp_store_memory");
        assert_eq!(data["args"]["content"], "standup notes");
        assert_eq!(
            outcome.metadata.unwrap().get("namespace"),
            Some(&json!("tools"))
        );
    }

    #[tokio::test]
    async fn catalog_is_cached_until_refresh() {
        let catalog = FakeCatalog::new();
        let source = ToolCommandSource::new("tools", catalog.clone());

        source.discover().await.unwrap();
        source.discover().await.unwrap();
        assert_eq!(catalog.reads.load(Ordering::SeqCst), 1);

        source.refresh().await.unwrap();
        source.discover().await.unwrap();
        assert_eq!(catalog.reads.load(Ordering::SeqCst), 2);
    }
}
