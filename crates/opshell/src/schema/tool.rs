//! Tool-schema mapper: JSON-Schema-described tools become commands.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::{CommandExecute, CommandSpec, OptionSpec, ValueType};

use super::{invocation_prefix, usage_for, value_type_from_schema};

/// Naming prefixes stripped when deriving the CLI name.
const KNOWN_TOOL_PREFIXES: [&str; 2] = ["mcp_", "tool_"];

/// Option names that earn a single-letter short flag.
const SHORT_FLAG_ALLOWLIST: [&str; 4] = ["query", "file", "path", "id"];

/// Per-category example templates, keyed on a substring of the CLI name.
/// `{cmd}` expands to `<program> <namespace> <name>`.
const EXAMPLE_TEMPLATES: [(&str, &str, &str); 7] = [
    ("memory", "store", "{cmd} --content \"meeting notes\" --tags '[\"work\"]'"),
    ("memory", "recall", "{cmd} --query \"meeting\" --limit 5"),
    ("search", "search", "{cmd} --query \"error handling\""),
    ("files", "read", "{cmd} --path ./notes.txt"),
    ("files", "write", "{cmd} --path ./notes.txt --content \"draft\""),
    ("web", "fetch", "{cmd} --url https://example.com"),
    ("jobs", "submit", "{cmd} --file ./job.yaml"),
];

/// A tool as declared by its provider: a name, a category bucket, and a
/// JSON-Schema input description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default, alias = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Parse one tool description from a JSON document.
    pub fn from_json(value: &Value) -> crate::error::ShellResult<Self> {
        serde_json::from_value(value.clone()).map_err(|e| {
            crate::error::ShellError::Mapping(format!("invalid tool description: {e}"))
        })
    }
}

/// Map one tool description to a command under `namespace`.
///
/// The original tool name is kept as an alias so either spelling resolves.
pub fn command_from_tool(
    namespace: &str,
    tool: &ToolDescriptor,
    handler: CommandExecute,
) -> CommandSpec {
    let name = cli_name(&tool.name);
    let options = collect_options(&tool.input_schema);
    let category = tool
        .category
        .clone()
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "General".to_string());

    let usage = usage_for(namespace, &name, &options);
    let examples = vec![example_for(namespace, &name, &category)];

    let mut spec = CommandSpec::new(name.clone(), handler).with_namespace(namespace);
    spec.description = tool
        .description
        .clone()
        .unwrap_or_else(|| format!("Invoke the {} tool", tool.name));
    spec.category = category;
    if name != tool.name {
        spec.aliases = vec![tool.name.clone()];
    }
    spec.options = options;
    spec.usage = usage;
    spec.examples = examples;
    spec
}

/// Strip a known prefix and convert underscores to hyphens.
fn cli_name(tool_name: &str) -> String {
    let stripped = KNOWN_TOOL_PREFIXES
        .iter()
        .find_map(|prefix| tool_name.strip_prefix(prefix))
        .unwrap_or(tool_name);
    stripped.replace('_', "-")
}

fn collect_options(input_schema: &Value) -> Vec<OptionSpec> {
    let Some(properties) = input_schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };
    let required_names: Vec<&str> = input_schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    properties
        .iter()
        .map(|(name, property)| {
            let description = property
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let declared = property.get("type").and_then(Value::as_str).unwrap_or("string");

            let mut option = OptionSpec::new(name.clone(), value_type_for(declared, description));
            option.required = required_names.contains(&name.as_str());
            option.description = description.to_string();
            option.default = property.get("default").cloned();
            if let Some(choices) = property.get("enum").and_then(Value::as_array) {
                option.choices = choices
                    .iter()
                    .map(|choice| match choice.as_str() {
                        Some(text) => text.to_string(),
                        None => choice.to_string(),
                    })
                    .collect();
            }
            option.short = short_flag(name);
            option
        })
        .collect()
}

/// Declared type, overridden for strings whose description names a more
/// specific shape.
fn value_type_for(declared: &str, description: &str) -> ValueType {
    let base = value_type_from_schema(declared);
    if base != ValueType::String {
        return base;
    }
    let lower = description.to_lowercase();
    if lower.contains("file") {
        ValueType::File
    } else if lower.contains("directory") {
        ValueType::Directory
    } else if lower.contains("url") {
        ValueType::Url
    } else {
        ValueType::String
    }
}

fn short_flag(name: &str) -> Option<char> {
    if name.len() == 1 || SHORT_FLAG_ALLOWLIST.contains(&name) {
        name.chars().next()
    } else {
        None
    }
}

/// Example from the category template table; generic fallback when no
/// template matches.
fn example_for(namespace: &str, name: &str, category: &str) -> String {
    let prefix = invocation_prefix(namespace, name);
    for (template_category, substring, template) in EXAMPLE_TEMPLATES {
        if template_category == category && name.contains(substring) {
            return template.replace("{cmd}", &prefix);
        }
    }
    format!("{prefix} [options]")
}
