//! Middleware pipeline stages run before a command's handler.

use async_trait::async_trait;
use serde_json::Value;

use crate::command::{CommandOutcome, CommandSpec};
use crate::context::CommandContext;
use crate::error::ShellResult;

/// One pipeline stage. A stage inspects the pending invocation and either
/// passes it through (`Ok(None)`) or short-circuits with a terminal outcome
/// (`Ok(Some(_))`). An `Err` is normalized into a failed outcome by the
/// router and also terminates the chain.
#[async_trait]
pub trait Middleware: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(
        &self,
        command: &CommandSpec,
        args: &Value,
        ctx: &CommandContext,
    ) -> ShellResult<Option<CommandOutcome>>;
}

/// Logs every invocation entering the pipeline. Never short-circuits.
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    fn name(&self) -> &str {
        "logging"
    }

    async fn handle(
        &self,
        command: &CommandSpec,
        args: &Value,
        _ctx: &CommandContext,
    ) -> ShellResult<Option<CommandOutcome>> {
        tracing::info!(
            command = %command.key(),
            options = args.as_object().map(|o| o.len()).unwrap_or(0),
            "dispatching command"
        );
        Ok(None)
    }
}

/// Short-circuits every invocation when the config's dry-run flag is set.
pub struct DryRunMiddleware;

#[async_trait]
impl Middleware for DryRunMiddleware {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn handle(
        &self,
        command: &CommandSpec,
        args: &Value,
        ctx: &CommandContext,
    ) -> ShellResult<Option<CommandOutcome>> {
        if !ctx.config.dry_run {
            return Ok(None);
        }
        Ok(Some(CommandOutcome::ok_with_message(
            serde_json::json!({"command": command.key(), "args": args}),
            format!("dry run: '{}' not executed", command.key()),
        )))
    }
}

/// Requires an authenticated session for service (namespaced) commands.
/// Global commands pass through so sign-in itself stays reachable.
pub struct AuthGuard;

#[async_trait]
impl Middleware for AuthGuard {
    fn name(&self) -> &str {
        "auth"
    }

    async fn handle(
        &self,
        command: &CommandSpec,
        _args: &Value,
        ctx: &CommandContext,
    ) -> ShellResult<Option<CommandOutcome>> {
        if command.namespace.is_none() || ctx.session.is_authenticated() {
            return Ok(None);
        }
        Ok(Some(CommandOutcome::failure(
            "auth_required",
            format!("command '{}' requires an authenticated session", command.key()),
        )))
    }
}
