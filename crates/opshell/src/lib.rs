pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod registry;
pub mod router;
pub mod schema;
pub mod sources;

pub use crate::command::{
    evaluate, parse_input, tokenize, CommandOutcome, CommandSpec, InputKind, ParsedInput,
};
pub use crate::config::ShellConfig;
pub use crate::context::{CommandContext, WorkspaceRef};
pub use crate::error::{ShellError, ShellResult};
pub use crate::registry::{CommandRegistry, DiscoveryReport};
pub use crate::router::CommandRouter;
pub use crate::sources::DynamicCommandSource;
