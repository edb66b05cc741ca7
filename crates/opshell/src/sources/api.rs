//! HTTP-schema-backed dynamic source.

use std::sync::Arc;

use async_trait::async_trait;
use moka::sync::Cache;
use serde_json::Value;

use crate::command::{boxed_outcome, CommandExecute, CommandOutcome, CommandSpec};
use crate::error::ShellResult;
use crate::schema::{command_from_operation, HttpOperation};

use super::DynamicCommandSource;

const OPERATIONS_KEY: &str = "operations";

/// Collaborator owning the actual HTTP plumbing: reading the service's API
/// description and executing operations against it.
#[async_trait]
pub trait ApiDescriptor: Send + Sync {
    async fn operations(&self) -> ShellResult<Vec<HttpOperation>>;

    async fn invoke(&self, method: &str, path: &str, args: Value) -> ShellResult<Value>;
}

/// Dynamic source that turns a service's HTTP operations into commands.
///
/// The operation list is cached between discoveries; `refresh` drops the
/// cache so the next `discover` re-reads the description.
pub struct ApiCommandSource {
    namespace: String,
    descriptor: Arc<dyn ApiDescriptor>,
    cache: Cache<String, Arc<Vec<HttpOperation>>>,
}

impl ApiCommandSource {
    pub fn new(namespace: impl Into<String>, descriptor: Arc<dyn ApiDescriptor>) -> Self {
        Self {
            namespace: namespace.into(),
            descriptor,
            cache: Cache::new(1),
        }
    }

    async fn operations(&self) -> ShellResult<Arc<Vec<HttpOperation>>> {
        if let Some(operations) = self.cache.get(OPERATIONS_KEY) {
            return Ok(operations);
        }
        let operations = Arc::new(self.descriptor.operations().await?);
        self.cache
            .insert(OPERATIONS_KEY.to_string(), Arc::clone(&operations));
        Ok(operations)
    }

    fn handler_for(&self, operation: &HttpOperation) -> CommandExecute {
        let descriptor = Arc::clone(&self.descriptor);
        let method = operation.method.clone();
        let path = operation.path.clone();
        Arc::new(move |args, _ctx| {
            let descriptor = Arc::clone(&descriptor);
            let method = method.clone();
            let path = path.clone();
            boxed_outcome(async move {
                let data = descriptor.invoke(&method, &path, args).await?;
                Ok(CommandOutcome::ok(data))
            })
        })
    }
}

#[async_trait]
impl DynamicCommandSource for ApiCommandSource {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn discover(&self) -> ShellResult<Vec<CommandSpec>> {
        let operations = self.operations().await?;
        let commands: Vec<CommandSpec> = operations
            .iter()
            .filter_map(|operation| {
                command_from_operation(&self.namespace, operation, self.handler_for(operation))
            })
            .collect();
        tracing::debug!(
            namespace = %self.namespace,
            operations = operations.len(),
            commands = commands.len(),
            "api source discovery complete"
        );
        Ok(commands)
    }

    async fn refresh(&self) -> ShellResult<()> {
        self.cache.invalidate(OPERATIONS_KEY);
        Ok(())
    }
}
