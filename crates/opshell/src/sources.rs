//! Dynamic command sources: providers that discover commands from external
//! capability descriptions at runtime.

pub mod api;
pub mod toolkit;

pub use api::{ApiCommandSource, ApiDescriptor};
pub use toolkit::{ToolCatalog, ToolCommandSource};

use async_trait::async_trait;

use crate::command::CommandSpec;
use crate::error::ShellResult;

/// Capability interface every schema-backed provider implements.
///
/// The registry treats all sources uniformly regardless of the schema format
/// they read. `discover` must be idempotent (no side effects beyond reading
/// the remote description); `refresh` invalidates any internal cache so the
/// next `discover` is fresh.
#[async_trait]
pub trait DynamicCommandSource: Send + Sync {
    /// Namespace this source's commands are registered under. Unique among
    /// registered sources.
    fn namespace(&self) -> &str;

    async fn discover(&self) -> ShellResult<Vec<CommandSpec>>;

    async fn refresh(&self) -> ShellResult<()>;
}
