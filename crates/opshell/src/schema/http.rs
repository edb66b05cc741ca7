//! HTTP-operation schema mapper.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::{CommandExecute, CommandSpec, OptionSpec};

use super::{invocation_prefix, kebab_case, placeholder, usage_for, value_type_from_schema};

/// Where a declared parameter is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Path,
    Header,
}

/// One declared operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpParameter {
    pub name: String,
    #[serde(alias = "in")]
    pub location: ParameterLocation,
    /// Declared JSON-Schema type name, when the description carries one.
    pub schema_type: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub description: Option<String>,
}

/// An HTTP operation as read from a service's API description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpOperation {
    pub path: String,
    pub method: String,
    #[serde(alias = "operationId")]
    pub operation_id: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<HttpParameter>,
    /// JSON Schema of the request body, when the operation takes one.
    #[serde(alias = "requestBody")]
    pub request_body: Option<Value>,
    /// Explicit streaming annotation.
    #[serde(default)]
    pub streaming: bool,
}

impl HttpOperation {
    /// Parse one operation from a JSON description document.
    pub fn from_json(value: &Value) -> crate::error::ShellResult<Self> {
        serde_json::from_value(value.clone()).map_err(|e| {
            crate::error::ShellError::Mapping(format!("invalid operation description: {e}"))
        })
    }
}

/// Map one HTTP operation to a command under `namespace`.
///
/// Returns `None` for operational paths (`/health`, `/internal`) that should
/// not surface as commands. The handler is supplied by the caller so the
/// mapping itself stays pure.
pub fn command_from_operation(
    namespace: &str,
    operation: &HttpOperation,
    handler: CommandExecute,
) -> Option<CommandSpec> {
    if operation.path.contains("/health") || operation.path.contains("/internal") {
        return None;
    }

    let name = command_name(operation);
    let options = collect_options(operation);
    let streaming = operation.streaming
        || operation
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains("stream"));

    let usage = usage_for(namespace, &name, &options);
    let examples = build_examples(namespace, &name, &options);

    let mut spec = CommandSpec::new(name, handler).with_namespace(namespace);
    spec.description = operation
        .description
        .clone()
        .unwrap_or_else(|| format!("{} {}", operation.method.to_uppercase(), operation.path));
    spec.category = namespace.to_string();
    spec.options = options;
    spec.usage = usage;
    spec.examples = examples;
    spec.streaming = streaming;
    Some(spec)
}

/// Explicit operation id kebab-cased, else `<verb>-<resource>`.
fn command_name(operation: &HttpOperation) -> String {
    if let Some(id) = operation.operation_id.as_deref().filter(|id| !id.is_empty()) {
        return kebab_case(id);
    }
    let verb = match operation.method.to_uppercase().as_str() {
        "GET" => "get",
        "POST" => "create",
        "PUT" | "PATCH" => "update",
        "DELETE" => "delete",
        _ => "execute",
    };
    let resource = operation
        .path
        .split('/')
        .filter(|segment| !segment.is_empty() && !segment.starts_with('{'))
        .next_back()
        .unwrap_or("resource");
    format!("{verb}-{}", kebab_case(resource))
}

/// Declared parameters first, then request-body properties, deduplicated by
/// name with the declared parameter winning.
fn collect_options(operation: &HttpOperation) -> Vec<OptionSpec> {
    let mut options: Vec<OptionSpec> = operation
        .parameters
        .iter()
        .map(|parameter| {
            let mut option = OptionSpec::new(
                parameter.name.clone(),
                value_type_from_schema(parameter.schema_type.as_deref().unwrap_or("string")),
            );
            option.required = parameter.required;
            option.description = parameter.description.clone().unwrap_or_default();
            option
        })
        .collect();

    if let Some(body) = &operation.request_body {
        options.extend(body_options(body, &options));
    }
    options
}

/// Decompose an object-typed body schema into one option per top-level
/// property. A `$ref`-only or non-object schema cannot be decomposed and
/// degrades to a single generic `body` option.
fn body_options(body: &Value, existing: &[OptionSpec]) -> Vec<OptionSpec> {
    let properties = body
        .as_object()
        .filter(|schema| !schema.contains_key("$ref"))
        .and_then(|schema| schema.get("properties"))
        .and_then(Value::as_object);

    let Some(properties) = properties else {
        tracing::debug!("opaque request body collapsed to a generic body option");
        let mut option = OptionSpec::new("body", crate::command::ValueType::Object);
        option.required = true;
        option.description = "Request body (JSON)".to_string();
        return vec![option];
    };

    let required_names: Vec<&str> = body
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    properties
        .iter()
        .filter(|(name, _)| !existing.iter().any(|option| &option.name == *name))
        .map(|(name, property)| {
            let type_name = property.get("type").and_then(Value::as_str).unwrap_or("string");
            let mut option = OptionSpec::new(name.clone(), value_type_from_schema(type_name));
            option.required = required_names.contains(&name.as_str());
            option.description = property
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            option.default = property.get("default").cloned();
            if let Some(choices) = property.get("enum").and_then(Value::as_array) {
                option.choices = choices
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
            }
            option
        })
        .collect()
}

/// Up to three examples: required-only, extended with up to two optional
/// options, and a JSON-output variant of the first.
fn build_examples(namespace: &str, name: &str, options: &[OptionSpec]) -> Vec<String> {
    let mut minimal = invocation_prefix(namespace, name);
    for option in options.iter().filter(|o| o.required) {
        minimal.push_str(&format!(" {} {}", option.flag(), placeholder(option)));
    }

    let mut examples = vec![minimal.clone()];

    let optional: Vec<&OptionSpec> = options.iter().filter(|o| !o.required).take(2).collect();
    if !optional.is_empty() {
        let mut extended = minimal.clone();
        for option in optional {
            extended.push_str(&format!(" {} {}", option.flag(), placeholder(option)));
        }
        examples.push(extended);
    }

    examples.push(format!("{minimal} --output json"));
    examples.truncate(3);
    examples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::spec::test_support::echo_handler;
    use serde_json::json;

    fn post_documents() -> HttpOperation {
        HttpOperation {
            path: "/documents".to_string(),
            method: "post".to_string(),
            operation_id: Some("storeDocument".to_string()),
            description: Some("Store a document in the graph".to_string()),
            parameters: vec![],
            request_body: Some(json!({
                "type": "object",
                "required": ["content"],
                "properties": {
                    "content": {"type": "string", "description": "Document text"},
                    "tags": {"type": "array"},
                    "weight": {"type": "number", "default": 1.0}
                }
            })),
            streaming: false,
        }
    }

    #[test]
    fn operation_id_becomes_kebab_case_name() {
        let spec = command_from_operation("graphrag", &post_documents(), echo_handler()).unwrap();
        assert_eq!(spec.name, "store-document");
        assert_eq!(spec.namespace.as_deref(), Some("graphrag"));
    }

    #[test]
    fn example_begins_with_program_namespace_name() {
        let spec = command_from_operation("graphrag", &post_documents(), echo_handler()).unwrap();
        assert!(spec.examples[0].starts_with("opshell graphrag store-document"));
    }

    #[test]
    fn body_properties_become_options_with_required_carried() {
        let spec = command_from_operation("graphrag", &post_documents(), echo_handler()).unwrap();
        let content = spec.options.iter().find(|o| o.name == "content").unwrap();
        assert!(content.required);
        let tags = spec.options.iter().find(|o| o.name == "tags").unwrap();
        assert!(!tags.required);
        assert_eq!(tags.value_type, crate::command::ValueType::Array);
        let weight = spec.options.iter().find(|o| o.name == "weight").unwrap();
        assert_eq!(weight.default, Some(json!(1.0)));
    }

    #[test]
    fn health_and_internal_paths_are_skipped() {
        let mut op = post_documents();
        op.path = "/health".to_string();
        assert!(command_from_operation("svc", &op, echo_handler()).is_none());
        op.path = "/internal/reset".to_string();
        assert!(command_from_operation("svc", &op, echo_handler()).is_none());
    }

    #[test]
    fn verb_resource_naming_without_operation_id() {
        let cases = [
            ("get", "/jobs/{id}", "get-jobs"),
            ("post", "/jobs", "create-jobs"),
            ("put", "/jobs/{id}", "update-jobs"),
            ("patch", "/jobs/{id}", "update-jobs"),
            ("delete", "/jobs/{id}", "delete-jobs"),
            ("options", "/jobs", "execute-jobs"),
        ];
        for (method, path, expected) in cases {
            let op = HttpOperation {
                path: path.to_string(),
                method: method.to_string(),
                operation_id: None,
                description: None,
                parameters: vec![],
                request_body: None,
                streaming: false,
            };
            let spec = command_from_operation("svc", &op, echo_handler()).unwrap();
            assert_eq!(spec.name, expected, "{method} {path}");
        }
    }

    #[test]
    fn declared_parameters_merge_before_body() {
        let mut op = post_documents();
        op.parameters = vec![HttpParameter {
            name: "workspace".to_string(),
            location: ParameterLocation::Query,
            schema_type: Some("string".to_string()),
            required: true,
            description: None,
        }];
        let spec = command_from_operation("graphrag", &op, echo_handler()).unwrap();
        assert_eq!(spec.options[0].name, "workspace");
        assert!(spec.options.iter().any(|o| o.name == "content"));
    }

    #[test]
    fn ref_only_body_collapses_to_generic_body_option() {
        let mut op = post_documents();
        op.request_body = Some(json!({"$ref": "#/components/schemas/Document"}));
        let spec = command_from_operation("graphrag", &op, echo_handler()).unwrap();
        assert_eq!(spec.options.len(), 1);
        assert_eq!(spec.options[0].name, "body");
        assert!(spec.options[0].required);
        assert_eq!(spec.options[0].value_type, crate::command::ValueType::Object);
    }

    #[test]
    fn non_object_body_collapses_too() {
        let mut op = post_documents();
        op.request_body = Some(json!({"type": "string"}));
        let spec = command_from_operation("graphrag", &op, echo_handler()).unwrap();
        assert_eq!(spec.options.len(), 1);
        assert_eq!(spec.options[0].name, "body");
    }

    #[test]
    fn streaming_from_annotation_or_description() {
        let mut op = post_documents();
        op.streaming = true;
        assert!(command_from_operation("svc", &op, echo_handler()).unwrap().streaming);

        op.streaming = false;
        op.description = Some("Streams results as they arrive".to_string());
        assert!(command_from_operation("svc", &op, echo_handler()).unwrap().streaming);

        op.description = Some("Plain response".to_string());
        assert!(!command_from_operation("svc", &op, echo_handler()).unwrap().streaming);
    }

    #[test]
    fn generates_at_most_three_examples() {
        let spec = command_from_operation("graphrag", &post_documents(), echo_handler()).unwrap();
        assert_eq!(spec.examples.len(), 3);
        assert!(spec.examples[2].ends_with("--output json"));

        // Required-only command: extended form collapses away.
        let mut op = post_documents();
        op.request_body = Some(json!({
            "type": "object",
            "required": ["content"],
            "properties": {"content": {"type": "string"}}
        }));
        let spec = command_from_operation("graphrag", &op, echo_handler()).unwrap();
        assert_eq!(spec.examples.len(), 2);
    }

    #[test]
    fn from_json_accepts_camel_case_documents() {
        let op = HttpOperation::from_json(&json!({
            "path": "/documents",
            "method": "post",
            "operationId": "storeDocument",
            "requestBody": {"type": "object", "properties": {"content": {"type": "string"}}}
        }))
        .unwrap();
        assert_eq!(op.operation_id.as_deref(), Some("storeDocument"));
        assert!(op.request_body.is_some());
    }

    #[test]
    fn from_json_rejects_malformed_documents() {
        let err = HttpOperation::from_json(&json!({"method": "get"})).unwrap_err();
        assert!(matches!(err, crate::error::ShellError::Mapping(_)));
    }

    #[test]
    fn mapping_is_deterministic() {
        let op = post_documents();
        let a = command_from_operation("graphrag", &op, echo_handler()).unwrap();
        let b = command_from_operation("graphrag", &op, echo_handler()).unwrap();
        assert_eq!(a.descriptor(), b.descriptor());
    }
}
