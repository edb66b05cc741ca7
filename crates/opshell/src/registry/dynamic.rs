//! Dynamic source lifecycle: registration, concurrent discovery, refresh.

use std::sync::Arc;

use futures_util::future::join_all;

use crate::command::CommandSpec;
use crate::error::{ShellError, ShellResult};
use crate::sources::DynamicCommandSource;

use super::store::CommandRegistry;

/// Summary of one discovery or refresh pass across all sources.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Commands registered during this pass.
    pub discovered: usize,
    /// Sources that failed, with the isolating error. Partial success is the
    /// expected steady state.
    pub failures: Vec<(String, ShellError)>,
}

impl DiscoveryReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl CommandRegistry {
    /// Register a dynamic source, replacing any source already registered
    /// under the same namespace.
    pub fn register_source(
        &mut self,
        source: Arc<dyn DynamicCommandSource>,
    ) -> Option<Arc<dyn DynamicCommandSource>> {
        let namespace = source.namespace().to_string();
        let replaced = self.sources.insert(namespace.clone(), source);
        if replaced.is_some() {
            tracing::warn!(namespace = %namespace, "dynamic source replaced");
        }
        replaced
    }

    /// Remove a source and unregister every command in its namespace.
    pub fn unregister_source(&mut self, namespace: &str) -> bool {
        match self.sources.remove(namespace) {
            Some(_) => {
                let removed = self.clear_namespace(namespace);
                tracing::debug!(namespace = %namespace, commands = removed, "dynamic source unregistered");
                true
            }
            None => false,
        }
    }

    pub fn source_namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<String> = self.sources.keys().cloned().collect();
        namespaces.sort();
        namespaces
    }

    /// Run `discover()` on every registered source concurrently and register
    /// the results. One source failing does not prevent the others'
    /// commands from landing; failures are logged and reported.
    pub async fn discover_commands(&mut self) -> DiscoveryReport {
        let sources = self.snapshot_sources();
        let results = join_all(sources.into_iter().map(|(namespace, source)| async move {
            let result = source.discover().await;
            (namespace, result)
        }))
        .await;

        let mut report = DiscoveryReport::default();
        for (namespace, result) in results {
            match result {
                Ok(commands) => {
                    report.discovered += self.adopt(&namespace, commands);
                }
                Err(err) => self.record_failure(&mut report, namespace, err),
            }
        }
        report
    }

    /// Refresh one source: invalidate its cache, rediscover, and replace the
    /// namespace's command set. The namespace is cleared only after a
    /// successful discovery, but callers reading mid-refresh may still
    /// observe the gap between clear and fill.
    pub async fn refresh_source(&mut self, namespace: &str) -> ShellResult<usize> {
        let source = self.sources.get(namespace).cloned().ok_or_else(|| {
            ShellError::Source {
                namespace: namespace.to_string(),
                message: "no dynamic source registered for this namespace".to_string(),
            }
        })?;

        source.refresh().await.map_err(|e| wrap(namespace, e))?;
        let commands = source.discover().await.map_err(|e| wrap(namespace, e))?;

        self.clear_namespace(namespace);
        Ok(self.adopt(namespace, commands))
    }

    /// Refresh every source: `refresh()` then `discover()` per source, run
    /// concurrently, then clear-then-fill each namespace that succeeded.
    /// A failing source keeps its previously registered commands.
    pub async fn refresh_all(&mut self) -> DiscoveryReport {
        let sources = self.snapshot_sources();
        let results = join_all(sources.into_iter().map(|(namespace, source)| async move {
            let result = match source.refresh().await {
                Ok(()) => source.discover().await,
                Err(err) => Err(err),
            };
            (namespace, result)
        }))
        .await;

        let mut report = DiscoveryReport::default();
        for (namespace, result) in results {
            match result {
                Ok(commands) => {
                    self.clear_namespace(&namespace);
                    report.discovered += self.adopt(&namespace, commands);
                }
                Err(err) => self.record_failure(&mut report, namespace, err),
            }
        }
        report
    }

    /// Sorted snapshot of registered sources, so discovery order (and with
    /// it failure reporting) is deterministic.
    fn snapshot_sources(&self) -> Vec<(String, Arc<dyn DynamicCommandSource>)> {
        let mut sources: Vec<(String, Arc<dyn DynamicCommandSource>)> = self
            .sources
            .iter()
            .map(|(ns, source)| (ns.clone(), Arc::clone(source)))
            .collect();
        sources.sort_by(|a, b| a.0.cmp(&b.0));
        sources
    }

    /// Register discovered commands under the source's namespace. A command
    /// claiming a different namespace is corrected to keep the
    /// namespace-per-source invariant.
    fn adopt(&mut self, namespace: &str, commands: Vec<CommandSpec>) -> usize {
        let mut count = 0;
        for mut command in commands {
            if command.namespace.as_deref() != Some(namespace) {
                if command.namespace.is_some() {
                    tracing::warn!(
                        command = %command.name,
                        claimed = ?command.namespace,
                        namespace = %namespace,
                        "discovered command reassigned to its source namespace"
                    );
                }
                command.namespace = Some(namespace.to_string());
            }
            self.register(command);
            count += 1;
        }
        count
    }

    fn record_failure(&self, report: &mut DiscoveryReport, namespace: String, err: ShellError) {
        let err = wrap(&namespace, err);
        tracing::warn!(namespace = %namespace, error = %err, "dynamic source failed; continuing");
        report.failures.push((namespace, err));
    }
}

fn wrap(namespace: &str, err: ShellError) -> ShellError {
    match err {
        already @ ShellError::Source { .. } => already,
        other => ShellError::Source {
            namespace: namespace.to_string(),
            message: other.to_string(),
        },
    }
}
