//! Pure mappers from external capability schemas into the uniform command
//! shape. Nothing here performs I/O or depends on clocks; identical inputs
//! always produce structurally identical commands.

pub mod http;
pub mod tool;

pub use http::{command_from_operation, HttpOperation, HttpParameter, ParameterLocation};
pub use tool::{command_from_tool, ToolDescriptor};

use crate::command::{OptionSpec, ValueType};

/// Program name used in generated usage and example strings.
pub const PROGRAM_NAME: &str = "opshell";

/// Convert an identifier (camelCase, snake_case, or mixed) to kebab-case.
pub fn kebab_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch == '_' || ch == ' ' {
            if !out.ends_with('-') {
                out.push('-');
            }
        } else if ch.is_ascii_uppercase() {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out.trim_matches('-').to_string()
}

/// Map a declared JSON-Schema type name to a semantic value type.
pub fn value_type_from_schema(type_name: &str) -> ValueType {
    match type_name {
        "number" | "integer" => ValueType::Number,
        "boolean" => ValueType::Boolean,
        "array" => ValueType::Array,
        "object" => ValueType::Object,
        _ => ValueType::String,
    }
}

/// Placeholder value used when synthesizing example invocations.
pub fn placeholder(option: &OptionSpec) -> String {
    match option.value_type {
        ValueType::String => format!("<{}>", option.name),
        ValueType::Number => "<n>".to_string(),
        ValueType::Boolean => "true".to_string(),
        ValueType::Array => "'[\"...\"]'".to_string(),
        ValueType::Object => "'{...}'".to_string(),
        ValueType::File => "<path>".to_string(),
        ValueType::Directory => "<dir>".to_string(),
        ValueType::Url => "<url>".to_string(),
    }
}

/// `opshell <namespace> <name>` prefix shared by usage and example strings.
pub fn invocation_prefix(namespace: &str, name: &str) -> String {
    format!("{PROGRAM_NAME} {namespace} {name}")
}

/// Usage string spelling out required options.
pub fn usage_for(namespace: &str, name: &str, options: &[OptionSpec]) -> String {
    let mut usage = invocation_prefix(namespace, name);
    for option in options.iter().filter(|o| o.required) {
        usage.push_str(&format!(" {} {}", option.flag(), placeholder(option)));
    }
    if options.iter().any(|o| !o.required) {
        usage.push_str(" [options]");
    }
    usage
}
