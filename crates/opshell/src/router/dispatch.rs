//! Command router: middleware chain, handler invocation, normalization.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::SystemTime;

use futures_util::FutureExt;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::command::{CommandOutcome, CommandSpec};
use crate::context::CommandContext;
use crate::error::ShellError;
use crate::registry::CommandRegistry;

use super::invocation::{InvocationRecord, InvocationStatus};
use super::middleware::Middleware;

/// Runs the ordered middleware chain and the resolved command's handler,
/// normalizing every outcome (success, failure, returned error, or panic)
/// into one [`CommandOutcome`]. Nothing thrown by a handler crosses the
/// dispatch boundary.
///
/// The router enforces no timeout; interruption is the cooperative
/// [`crate::context::CancelToken`] carried in the context.
#[derive(Default)]
pub struct CommandRouter {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style middleware registration; stages run in push order.
    pub fn with(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// Dispatch a resolved command with pre-built arguments.
    pub async fn dispatch(
        &self,
        command: Arc<CommandSpec>,
        args: Value,
        ctx: CommandContext,
    ) -> CommandOutcome {
        let id = Uuid::new_v4();
        let key = command.key();
        let started_at = SystemTime::now();
        tracing::debug!(command = %key, invocation = %id, "entering middleware chain");

        for middleware in &self.middlewares {
            match middleware.handle(&command, &args, &ctx).await {
                Ok(None) => {}
                Ok(Some(outcome)) => {
                    let status = InvocationStatus::ShortCircuited;
                    let record = self.finish(id, &key, started_at, status, &outcome);
                    return outcome
                        .with_metadata("invocation_id", json!(record.id.to_string()))
                        .with_metadata("duration_ms", json!(record.duration_ms))
                        .with_metadata("short_circuited_by", json!(middleware.name()));
                }
                Err(err) => {
                    let outcome = CommandOutcome::from(err);
                    let record =
                        self.finish(id, &key, started_at, InvocationStatus::Failed, &outcome);
                    return outcome
                        .with_metadata("invocation_id", json!(record.id.to_string()))
                        .with_metadata("duration_ms", json!(record.duration_ms))
                        .with_metadata("short_circuited_by", json!(middleware.name()));
                }
            }
        }

        tracing::debug!(command = %key, invocation = %id, "executing handler");
        let future = (command.handler)(args, ctx);
        let outcome = match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => CommandOutcome::from(err),
            Err(_) => CommandOutcome::from(ShellError::handler(format!(
                "handler for '{key}' panicked"
            ))),
        };

        let status = if outcome.success {
            InvocationStatus::Completed
        } else {
            InvocationStatus::Failed
        };
        let record = self.finish(id, &key, started_at, status, &outcome);
        outcome
            .with_metadata("invocation_id", json!(record.id.to_string()))
            .with_metadata("duration_ms", json!(record.duration_ms))
    }

    /// Pre-parsed argv entry point: resolve `"ns:name"`, a bare name, or an
    /// alias, then dispatch.
    pub async fn resolve_and_dispatch(
        &self,
        registry: &CommandRegistry,
        full_name: &str,
        args: Value,
        ctx: CommandContext,
    ) -> CommandOutcome {
        let resolved = registry
            .resolve(full_name)
            .or_else(|| registry.resolve_alias(full_name));
        match resolved {
            Some(command) => self.dispatch(command, args, ctx).await,
            None => ShellError::Resolution(format!("unknown command '{full_name}'")).into(),
        }
    }

    fn finish(
        &self,
        id: Uuid,
        key: &str,
        started_at: SystemTime,
        status: InvocationStatus,
        outcome: &CommandOutcome,
    ) -> InvocationRecord {
        let mut record = InvocationRecord::new(
            id,
            key.to_string(),
            started_at,
            SystemTime::now(),
            status,
        );
        record.error_code = outcome.error.clone();
        match status {
            InvocationStatus::Failed => {
                tracing::warn!(command = %key, invocation = %id, error = ?record.error_code, "dispatch failed")
            }
            _ => tracing::debug!(command = %key, invocation = %id, status = ?status, "dispatch finished"),
        }
        record
    }
}
