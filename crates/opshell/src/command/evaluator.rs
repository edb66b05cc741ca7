//! Evaluation of parsed input lines: builtin delegation, namespace switches,
//! and service command dispatch.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};

use crate::context::CommandContext;
use crate::error::{ShellError, ShellResult};
use crate::registry::CommandRegistry;
use crate::router::CommandRouter;

use super::outcome::CommandOutcome;
use super::parser::{InputKind, ParsedInput};
use super::spec::CommandSpec;

/// Positional arguments are delivered to handlers under this key, next to
/// the parsed options.
pub const ARGS_KEY: &str = "_args";

/// Externally supplied handler for builtin REPL commands.
pub type BuiltinExecute = Arc<
    dyn Fn(
            ParsedInput,
            CommandContext,
        ) -> Pin<Box<dyn Future<Output = ShellResult<CommandOutcome>> + Send>>
        + Send
        + Sync,
>;

/// Evaluate one parsed input line.
///
/// Never returns an error and never panics outward: every path, including a
/// throwing handler, is normalized into a [`CommandOutcome`]. Timing and the
/// resolved namespace are merged into the outcome's metadata.
pub async fn evaluate(
    parsed: ParsedInput,
    registry: &CommandRegistry,
    router: &CommandRouter,
    ctx: CommandContext,
    builtin: Option<&BuiltinExecute>,
) -> CommandOutcome {
    let started = Instant::now();
    match parsed.kind {
        InputKind::Builtin => {
            let name = parsed.name.clone();
            let outcome = match builtin {
                Some(handler) => handler(parsed, ctx)
                    .await
                    .unwrap_or_else(CommandOutcome::from),
                None => ShellError::Internal(format!(
                    "no builtin handler installed; cannot run '{name}'"
                ))
                .into(),
            };
            finish(outcome, &name, None, started)
        }
        InputKind::NamespaceSwitch => {
            let outcome = switch_namespace(&parsed, registry);
            finish(outcome, "use", None, started)
        }
        InputKind::Service => match resolve_service(&parsed, registry, &ctx) {
            Ok(command) => {
                let name = command.name.clone();
                let namespace = command.namespace.clone();
                let args = build_args(&parsed);
                let outcome = router.dispatch(command, args, ctx).await;
                finish(outcome, &name, namespace.as_deref(), started)
            }
            Err(err) => finish(err.into(), &parsed.name, None, started),
        },
    }
}

fn finish(
    outcome: CommandOutcome,
    command: &str,
    namespace: Option<&str>,
    started: Instant,
) -> CommandOutcome {
    let outcome = outcome
        .with_metadata("command", json!(command))
        .with_metadata("duration_ms", json!(started.elapsed().as_millis() as u64));
    match namespace {
        Some(ns) => outcome.with_metadata("namespace", json!(ns)),
        None => outcome,
    }
}

fn switch_namespace(parsed: &ParsedInput, registry: &CommandRegistry) -> CommandOutcome {
    let Some(target) = parsed.args.first() else {
        return ShellError::Parse("usage: use <namespace>".to_string()).into();
    };
    if registry.list_namespaces().iter().any(|ns| ns == target) {
        CommandOutcome::ok_with_message(
            json!({"namespace": target}),
            format!("switched to namespace '{target}'"),
        )
    } else {
        ShellError::Resolution(format!("unknown namespace '{target}'")).into()
    }
}

/// Resolution ladder: explicit/contextual namespace, then the global space,
/// then the alias index, then a scan of all namespaces. A scoped miss falls
/// back to the global space only when the scope came from the REPL context,
/// so global commands stay reachable inside a namespace; a bare-name match
/// in several namespaces is reported as ambiguous rather than guessed.
fn resolve_service(
    parsed: &ParsedInput,
    registry: &CommandRegistry,
    ctx: &CommandContext,
) -> ShellResult<Arc<CommandSpec>> {
    if let Some(namespace) = &parsed.namespace {
        if let Some(command) = registry.get(&parsed.name, Some(namespace)) {
            return Ok(command);
        }
        let context_derived = ctx.current_namespace.as_deref() == Some(namespace.as_str());
        if context_derived {
            if let Some(command) = registry
                .get(&parsed.name, None)
                .or_else(|| registry.resolve_alias(&parsed.name))
            {
                return Ok(command);
            }
        }
        return Err(ShellError::Resolution(format!(
            "unknown command '{}' in namespace '{namespace}'",
            parsed.name
        )));
    }

    if let Some(command) = registry.get(&parsed.name, None) {
        return Ok(command);
    }
    if let Some(command) = registry.resolve_alias(&parsed.name) {
        return Ok(command);
    }

    let mut matches = registry.find_by_name(&parsed.name);
    match matches.len() {
        0 => Err(ShellError::Resolution(format!(
            "unknown command '{}'",
            parsed.name
        ))),
        1 => Ok(matches.remove(0)),
        _ => {
            let namespaces: Vec<String> = matches
                .iter()
                .filter_map(|command| command.namespace.clone())
                .collect();
            Err(ShellError::Resolution(format!(
                "'{}' is ambiguous; qualify it with one of: {}",
                parsed.name,
                namespaces.join(", ")
            )))
        }
    }
}

fn build_args(parsed: &ParsedInput) -> Value {
    let mut map = parsed.options.clone();
    map.insert(ARGS_KEY.to_string(), json!(parsed.args));
    Value::Object(map)
}
