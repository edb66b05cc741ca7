use serde_json::{Map, Value};

/// Builtin commands handled by the embedding REPL, not the registry.
pub const BUILTIN_COMMANDS: [&str; 10] = [
    "help", "services", "history", "clear", "save", "load", "sessions", "config", "exit", "quit",
];

/// How an input line should be dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Builtin,
    NamespaceSwitch,
    Service,
}

/// Structured form of one input line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInput {
    pub kind: InputKind,
    pub name: String,
    pub args: Vec<String>,
    pub options: Map<String, Value>,
    pub namespace: Option<String>,
}

/// Split a line into tokens.
///
/// Whitespace delimits tokens outside quotes. `'` and `"` each open a span
/// closed only by the matching character; the other quote character is taken
/// literally inside. A backslash escapes the next character (`\n`, `\t`,
/// `\r`, `\\`, `\"`, `\'` are recognized; any other escape stays as the
/// literal two-character sequence). An unterminated quote is closed at end
/// of input.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut started = false;
    let mut in_quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => current.push('\n'),
                Some('t') => current.push('\t'),
                Some('r') => current.push('\r'),
                Some('\\') => current.push('\\'),
                Some('"') => current.push('"'),
                Some('\'') => current.push('\''),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            }
            started = true;
        } else if let Some(quote) = in_quote {
            if ch == quote {
                in_quote = None;
            } else {
                current.push(ch);
            }
        } else if ch == '"' || ch == '\'' {
            in_quote = Some(ch);
            started = true;
        } else if ch.is_whitespace() {
            if started {
                tokens.push(std::mem::take(&mut current));
                started = false;
            }
        } else {
            current.push(ch);
            started = true;
        }
    }

    if in_quote.is_some() {
        tracing::debug!("unterminated quote closed at end of input");
    }
    if started {
        tokens.push(current);
    }
    tokens
}

/// Coerce a raw option value: boolean, then number, then JSON, then string.
pub fn coerce_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Ok(float) = raw.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    if raw.starts_with('{') || raw.starts_with('[') {
        if let Ok(value) = serde_json::from_str::<Value>(raw) {
            return value;
        }
    }
    Value::String(raw.to_string())
}

/// Parse one input line into a [`ParsedInput`].
///
/// Returns `None` for an empty or all-whitespace line. `current_namespace`
/// is the REPL's active namespace, if one has been selected with `use`.
pub fn parse_input(line: &str, current_namespace: Option<&str>) -> Option<ParsedInput> {
    let tokens = tokenize(line);
    let (first, rest) = tokens.split_first()?;

    if BUILTIN_COMMANDS.contains(&first.as_str()) {
        let (args, options) = parse_options(rest);
        return Some(ParsedInput {
            kind: InputKind::Builtin,
            name: first.clone(),
            args,
            options,
            namespace: None,
        });
    }

    if first == "use" {
        return Some(ParsedInput {
            kind: InputKind::NamespaceSwitch,
            name: first.clone(),
            args: rest.to_vec(),
            options: Map::new(),
            namespace: None,
        });
    }

    let (name, namespace) = if let Some(active) = current_namespace {
        (first.clone(), Some(active.to_string()))
    } else if let Some((ns, cmd)) = first.split_once('.') {
        if ns.is_empty() || cmd.is_empty() {
            (first.clone(), None)
        } else {
            (cmd.to_string(), Some(ns.to_string()))
        }
    } else {
        (first.clone(), None)
    };

    let (args, options) = parse_options(rest);
    Some(ParsedInput {
        kind: InputKind::Service,
        name,
        args,
        options,
        namespace,
    })
}

/// Separate option flags from positional arguments.
fn parse_options(tokens: &[String]) -> (Vec<String>, Map<String, Value>) {
    let mut args = Vec::new();
    let mut options = Map::new();
    let mut index = 0;

    while index < tokens.len() {
        let token = &tokens[index];
        if let Some(key) = long_flag(token) {
            if let Some((name, value)) = key.split_once('=') {
                options.insert(name.to_string(), coerce_value(value));
            } else if let Some(next) = value_token(tokens, index) {
                options.insert(key.to_string(), coerce_value(next));
                index += 1;
            } else {
                options.insert(key.to_string(), Value::Bool(true));
            }
        } else if let Some(key) = short_flag(token) {
            if let Some(next) = value_token(tokens, index) {
                options.insert(key.to_string(), coerce_value(next));
                index += 1;
            } else {
                options.insert(key.to_string(), Value::Bool(true));
            }
        } else {
            args.push(token.clone());
        }
        index += 1;
    }

    (args, options)
}

fn long_flag(token: &str) -> Option<&str> {
    let body = token.strip_prefix("--")?;
    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

fn short_flag(token: &str) -> Option<&str> {
    let body = token.strip_prefix('-')?;
    let mut chars = body.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if ch.is_ascii_alphabetic() => Some(body),
        _ => None,
    }
}

/// The token after `index`, when it should be consumed as a flag value.
fn value_token(tokens: &[String], index: usize) -> Option<&str> {
    let next = tokens.get(index + 1)?;
    if next.starts_with('-') {
        None
    } else {
        Some(next.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whitespace_splits_tokens() {
        assert_eq!(tokenize("list jobs  --all"), vec!["list", "jobs", "--all"]);
    }

    #[test]
    fn empty_line_yields_no_parse() {
        assert!(parse_input("", None).is_none());
        assert!(parse_input("   \t ", None).is_none());
    }

    #[test]
    fn double_quotes_group_one_token() {
        assert_eq!(tokenize(r#"echo "hello world""#), vec!["echo", "hello world"]);
    }

    #[test]
    fn other_quote_kind_is_literal_inside_span() {
        // Single-quoted span with an escaped apostrophe and literal double quotes.
        let tokens = tokenize(r#"'It\'s "quoted"'"#);
        assert_eq!(tokens, vec![r#"It's "quoted""#]);
    }

    #[test]
    fn recognized_escapes_substitute() {
        assert_eq!(tokenize(r"a\tb"), vec!["a\tb"]);
        assert_eq!(tokenize(r"a\nb"), vec!["a\nb"]);
        assert_eq!(tokenize(r"a\\b"), vec![r"a\b"]);
    }

    #[test]
    fn unknown_escape_is_preserved_literally() {
        assert_eq!(tokenize(r"a\zb"), vec![r"a\zb"]);
    }

    #[test]
    fn unterminated_quote_closes_at_end() {
        assert_eq!(tokenize(r#"say "unfinished thought"#), vec!["say", "unfinished thought"]);
    }

    #[test]
    fn quoted_empty_string_is_a_token() {
        assert_eq!(tokenize(r#"set --note """#), vec!["set", "--note", ""]);
    }

    #[test]
    fn builtin_names_classify_first() {
        let parsed = parse_input("help deploy", None).unwrap();
        assert_eq!(parsed.kind, InputKind::Builtin);
        assert_eq!(parsed.name, "help");
        assert_eq!(parsed.args, vec!["deploy"]);
    }

    #[test]
    fn use_is_a_namespace_switch() {
        let parsed = parse_input("use compute", None).unwrap();
        assert_eq!(parsed.kind, InputKind::NamespaceSwitch);
        assert_eq!(parsed.args, vec!["compute"]);
        assert!(parsed.options.is_empty());
    }

    #[test]
    fn active_namespace_scopes_service_commands() {
        let parsed = parse_input("list --all", Some("compute")).unwrap();
        assert_eq!(parsed.kind, InputKind::Service);
        assert_eq!(parsed.name, "list");
        assert_eq!(parsed.namespace.as_deref(), Some("compute"));
    }

    #[test]
    fn active_namespace_wins_over_dotted_form() {
        let parsed = parse_input("billing.list", Some("compute")).unwrap();
        assert_eq!(parsed.name, "billing.list");
        assert_eq!(parsed.namespace.as_deref(), Some("compute"));
    }

    #[test]
    fn dotted_form_selects_explicit_namespace() {
        let parsed = parse_input("compute.submit job.tar", None).unwrap();
        assert_eq!(parsed.kind, InputKind::Service);
        assert_eq!(parsed.name, "submit");
        assert_eq!(parsed.namespace.as_deref(), Some("compute"));
        assert_eq!(parsed.args, vec!["job.tar"]);
    }

    #[test]
    fn bare_name_is_globally_scoped() {
        let parsed = parse_input("login", None).unwrap();
        assert_eq!(parsed.kind, InputKind::Service);
        assert!(parsed.namespace.is_none());
    }

    #[test]
    fn key_equals_value_splits_on_first_equals() {
        let parsed = parse_input("run --env=KEY=VALUE", None).unwrap();
        assert_eq!(parsed.options.get("env"), Some(&json!("KEY=VALUE")));
    }

    #[test]
    fn separated_value_is_consumed() {
        let parsed = parse_input("run --name worker-1", None).unwrap();
        assert_eq!(parsed.options.get("name"), Some(&json!("worker-1")));
        assert!(parsed.args.is_empty());
    }

    #[test]
    fn flag_followed_by_flag_is_boolean() {
        let parsed = parse_input("run --force --name worker", None).unwrap();
        assert_eq!(parsed.options.get("force"), Some(&json!(true)));
        assert_eq!(parsed.options.get("name"), Some(&json!("worker")));
    }

    #[test]
    fn trailing_flag_is_boolean() {
        let parsed = parse_input("run --verbose", None).unwrap();
        assert_eq!(parsed.options.get("verbose"), Some(&json!(true)));
    }

    #[test]
    fn short_flag_takes_a_value() {
        let parsed = parse_input("search -q database", None).unwrap();
        assert_eq!(parsed.options.get("q"), Some(&json!("database")));
    }

    #[test]
    fn short_flag_without_value_is_boolean() {
        let parsed = parse_input("list -a -q term", None).unwrap();
        assert_eq!(parsed.options.get("a"), Some(&json!(true)));
        assert_eq!(parsed.options.get("q"), Some(&json!("term")));
    }

    #[test]
    fn coercion_precedence_boolean_number_json_string() {
        assert_eq!(coerce_value("true"), json!(true));
        assert_eq!(coerce_value("false"), json!(false));
        assert_eq!(coerce_value("42"), json!(42));
        assert_eq!(coerce_value("-3"), json!(-3));
        assert_eq!(coerce_value("2.5"), json!(2.5));
        assert_eq!(coerce_value(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(coerce_value(r#"["x","y"]"#), json!(["x", "y"]));
        assert_eq!(coerce_value("{not json"), json!("{not json"));
        assert_eq!(coerce_value("plain"), json!("plain"));
    }

    #[test]
    fn quoted_option_values_survive_with_spaces() {
        let parsed = parse_input(r#"note add --content "a b c""#, None).unwrap();
        assert_eq!(parsed.options.get("content"), Some(&json!("a b c")));
        assert_eq!(parsed.args, vec!["add"]);
    }

    #[test]
    fn negative_number_after_flag_reads_as_boolean_flag() {
        // The next token starts with '-', so --offset becomes a boolean and
        // "-5" is not consumed as its value.
        let parsed = parse_input("scroll --offset -5", None).unwrap();
        assert_eq!(parsed.options.get("offset"), Some(&json!(true)));
    }

    #[test]
    fn double_dash_alone_is_positional() {
        let parsed = parse_input("run -- raw", None).unwrap();
        assert!(parsed.args.contains(&"--".to_string()));
    }
}
