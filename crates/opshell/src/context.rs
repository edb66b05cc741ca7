//! Execution context passed by reference into every command handler.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ShellConfig;

/// Descriptor of the workspace the shell operates in.
#[derive(Debug, Clone)]
pub struct WorkspaceRef {
    pub name: String,
    pub root: PathBuf,
}

/// A remote service known to the shell, whether or not it has been discovered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub name: String,
    pub base_url: String,
    pub description: Option<String>,
}

/// Accessor for the active auth session. Credential storage lives elsewhere.
pub trait AuthSession: Send + Sync {
    fn is_authenticated(&self) -> bool;
    fn account(&self) -> Option<String>;
}

/// Session accessor used when no one has signed in.
pub struct AnonymousSession;

impl AuthSession for AnonymousSession {
    fn is_authenticated(&self) -> bool {
        false
    }

    fn account(&self) -> Option<String> {
        None
    }
}

/// Cooperative cancellation flag threaded through the context.
///
/// The router never enforces timeouts; handlers and transports check this
/// voluntarily at their own suspension points.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Context handed to handlers and middleware on every invocation.
///
/// Cloning is cheap: collaborators are behind `Arc`. The current namespace is
/// plain data; the REPL loop owning the context applies namespace switches
/// reported back by the evaluator.
#[derive(Clone)]
pub struct CommandContext {
    pub workspace: Arc<WorkspaceRef>,
    pub session: Arc<dyn AuthSession>,
    pub config: Arc<ShellConfig>,
    pub services: Arc<HashMap<String, ServiceEndpoint>>,
    pub current_namespace: Option<String>,
    pub cancel: CancelToken,
}

impl CommandContext {
    pub fn new(workspace: WorkspaceRef, config: ShellConfig) -> Self {
        Self {
            workspace: Arc::new(workspace),
            session: Arc::new(AnonymousSession),
            config: Arc::new(config),
            services: Arc::new(HashMap::new()),
            current_namespace: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_session(mut self, session: Arc<dyn AuthSession>) -> Self {
        self.session = session;
        self
    }

    pub fn with_services(mut self, services: HashMap<String, ServiceEndpoint>) -> Self {
        self.services = Arc::new(services);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.current_namespace = Some(namespace.into());
        self
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CommandContext")
            .field("workspace", &self.workspace)
            .field("current_namespace", &self.current_namespace)
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Session accessor with a fixed account, for tests.
    pub struct FixedSession(pub Option<String>);

    impl AuthSession for FixedSession {
        fn is_authenticated(&self) -> bool {
            self.0.is_some()
        }

        fn account(&self) -> Option<String> {
            self.0.clone()
        }
    }

    pub fn make_context() -> CommandContext {
        CommandContext::new(
            WorkspaceRef {
                name: "test".to_string(),
                root: PathBuf::from("/tmp/test"),
            },
            ShellConfig::default_new(),
        )
    }
}
