//! The uniform command shape every static and discovered command maps into.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::CommandContext;
use crate::error::ShellResult;

use super::outcome::CommandOutcome;

/// Semantic value type of an argument or option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    File,
    Directory,
    Url,
}

/// Positional argument definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgSpec {
    pub name: String,
    pub value_type: ValueType,
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

/// Named option definition. `name` is the long flag without the `--` prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    pub name: String,
    pub short: Option<char>,
    pub value_type: ValueType,
    pub required: bool,
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl OptionSpec {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            short: None,
            value_type,
            required: false,
            default: None,
            choices: Vec::new(),
            description: String::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The long flag form, e.g. `--content`.
    pub fn flag(&self) -> String {
        format!("--{}", self.name)
    }
}

/// Handler capability: async function from (arguments, context) to an outcome.
pub type CommandExecute = Arc<
    dyn Fn(
            serde_json::Value,
            CommandContext,
        ) -> Pin<Box<dyn Future<Output = ShellResult<CommandOutcome>> + Send>>
        + Send
        + Sync,
>;

pub fn boxed_outcome<F>(
    future: F,
) -> Pin<Box<dyn Future<Output = ShellResult<CommandOutcome>> + Send>>
where
    F: Future<Output = ShellResult<CommandOutcome>> + Send + 'static,
{
    Box::pin(future)
}

/// A registered command: identity, definitions, and the handler capability.
#[derive(Clone)]
pub struct CommandSpec {
    pub name: String,
    pub namespace: Option<String>,
    pub description: String,
    pub category: String,
    pub aliases: Vec<String>,
    pub args: Vec<ArgSpec>,
    pub options: Vec<OptionSpec>,
    pub usage: String,
    pub examples: Vec<String>,
    pub streaming: bool,
    pub handler: CommandExecute,
}

/// Everything about a command except its handler. Serializable and
/// comparable, used for catalogs and for structural-identity checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    pub name: String,
    pub namespace: Option<String>,
    pub description: String,
    pub category: String,
    pub aliases: Vec<String>,
    pub args: Vec<ArgSpec>,
    pub options: Vec<OptionSpec>,
    pub usage: String,
    pub examples: Vec<String>,
    pub streaming: bool,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, handler: CommandExecute) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            description: String::new(),
            category: "General".to_string(),
            aliases: Vec::new(),
            args: Vec::new(),
            options: Vec::new(),
            usage: String::new(),
            examples: Vec::new(),
            streaming: false,
            handler,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Primary registry key: `namespace:name`, or the bare name when global.
    pub fn key(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}:{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Options that must be present for an invocation to make sense.
    pub fn required_options(&self) -> impl Iterator<Item = &OptionSpec> {
        self.options.iter().filter(|o| o.required)
    }

    pub fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            aliases: self.aliases.clone(),
            args: self.args.clone(),
            options: self.options.clone(),
            usage: self.usage.clone(),
            examples: self.examples.clone(),
            streaming: self.streaming,
        }
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("category", &self.category)
            .field("aliases", &self.aliases)
            .field("options", &self.options.len())
            .field("streaming", &self.streaming)
            .finish()
    }
}
