// Author: Dustin Pilgrim
// License: MIT

//! Turning an evaluated tree back into text.

use std::fmt::Write;

use crate::error::{ConfigError, Result};
use crate::selector::{Selector, SelectorRegistry};
use crate::value::{ConfigTree, Value};

const KEYWORDS: &[&str] = &[
    "true", "false", "null", "as", "in", "instanceof", "def", "if", "else", "return", "includeConfig",
];

const INDENT: &str = "    ";

/// Render a tree and its selectors as configuration source.
///
/// Maps become blocks, closures are written verbatim and selectors are emitted
/// inside the block they were declared in. Parsing the output again gives back an
/// equal tree and registry.
///
/// # Examples
/// ```
/// use flow_cfg::{ConfigParser, ParseOptions, export};
///
/// let parsed = ConfigParser::new(ParseOptions::default())
///     .parse_str("process { cpus = 2 }")
///     .unwrap();
/// let text = export::render_config(&parsed.tree, &parsed.selectors);
/// assert_eq!(text, "process {\n    cpus = 2\n}\n");
/// ```
pub fn render_config(tree: &ConfigTree, selectors: &SelectorRegistry) -> String {
    let mut out = String::new();
    let mut emitted = vec![false; selectors.len()];
    render_block(&mut out, tree, &[], 0, selectors, &mut emitted);

    // selectors whose scope no longer exists as a block
    for (i, selector) in selectors.iter().enumerate() {
        if emitted[i] {
            continue;
        }
        if selector.scope().is_empty() {
            render_selector(&mut out, selector, 0);
        } else {
            let name: Vec<String> = selector.scope().iter().map(|s| render_key(s)).collect();
            let _ = writeln!(out, "{} {{", name.join("."));
            render_selector(&mut out, selector, 1);
            out.push_str("}\n");
        }
    }
    out
}

fn render_block(
    out: &mut String,
    tree: &ConfigTree,
    scope: &[String],
    depth: usize,
    selectors: &SelectorRegistry,
    emitted: &mut [bool],
) {
    let pad = INDENT.repeat(depth);
    for (key, value) in tree {
        match value {
            // a top-level `plugins { }` block has its own grammar
            Value::Map(nested) if !(depth == 0 && key == "plugins") => {
                let _ = writeln!(out, "{}{} {{", pad, render_key(key));
                let mut path = scope.to_vec();
                path.push(key.clone());
                render_block(out, nested, &path, depth + 1, selectors, emitted);
                let _ = writeln!(out, "{}}}", pad);
            }
            _ => {
                let _ = writeln!(out, "{}{} = {}", pad, render_key(key), render_value(value));
            }
        }
    }

    for (i, selector) in selectors.iter().enumerate() {
        if !emitted[i] && selector.scope() == scope {
            render_selector(out, selector, depth);
            emitted[i] = true;
        }
    }
}

fn render_selector(out: &mut String, selector: &Selector, depth: usize) {
    let pad = INDENT.repeat(depth);
    let _ = writeln!(
        out,
        "{}{}: {} {{",
        pad,
        selector.key.kind,
        quote(&selector.key.target)
    );
    for (path, value) in &selector.assignments {
        let path: Vec<String> = path.iter().map(|key| render_key(key)).collect();
        let _ = writeln!(out, "{}{}{} = {}", pad, INDENT, path.join("."), render_value(value));
    }
    let _ = writeln!(out, "{}}}", pad);
}

fn is_plain_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.contains(&key)
}

fn render_key(key: &str) -> String {
    if is_plain_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Single-quoted, so `$` is never interpolated.
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// A value as an expression that evaluates back to it.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i64::MIN) => format!("({} - 1)", i64::MIN + 1),
        Value::Int(n) => n.to_string(),
        Value::Float(x) if x.is_nan() => "('NaN' as Double)".into(),
        Value::Float(x) if x.is_infinite() => {
            if *x > 0.0 {
                "('inf' as Double)".into()
            } else {
                "('-inf' as Double)".into()
            }
        }
        Value::Float(x) => format!("{:?}", x),
        Value::String(s) => quote(s),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Map(map) if map.is_empty() => "[:]".into(),
        Value::Map(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", render_key(k), render_value(v)))
                .collect();
            format!("[{}]", entries.join(", "))
        }
        Value::Closure(closure) => closure.source().to_string(),
    }
}

/// Leaves of the tree as `(dotted.key, value)` pairs in declaration order.
/// Lists and empty maps are leaves.
pub fn flatten(tree: &ConfigTree) -> Vec<(String, Value)> {
    fn walk(tree: &ConfigTree, prefix: &str, out: &mut Vec<(String, Value)>) {
        for (key, value) in tree {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };
            match value {
                Value::Map(nested) if !nested.is_empty() => walk(nested, &path, out),
                other => out.push((path, other.clone())),
            }
        }
    }

    let mut out = Vec::new();
    walk(tree, "", &mut out);
    out
}

/// Pretty-printed JSON. Closures appear as their source text.
pub fn to_json(tree: &ConfigTree) -> Result<String> {
    serde_json::to_string_pretty(tree).map_err(|e| ConfigError::Conversion {
        message: format!("Failed to serialize configuration: {}", e),
        path: String::new(),
        hint: None,
        code: Some(408),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigParser, ParseOptions};

    fn parse(source: &str) -> crate::config::ParsedConfig {
        ConfigParser::new(ParseOptions::default()).parse_str(source).unwrap()
    }

    #[test]
    fn test_round_trip_tree_and_selectors() {
        let source = r#"
            title = "it's a \"test\""
            process {
                executor = 'slurm'
                memory = { 4.GB * task.attempt }
                ext.args = ['--fast', 2, 1.5, null, true]
                withLabel: 'big mem' {
                    cpus = 16
                    queue = 'long'
                }
            }
            env { 'PATH-EXTRA' = '/opt/bin' }
            withName: FOO { time = '1h'; 'a.b' = 1 }
            executor { withName: FOO { queueSize = 2 } }
            limits = [cpus: 8, 'odd key': -3]
            empty = [:]
        "#;
        let first = parse(source);
        let text = render_config(&first.tree, &first.selectors);
        let second = parse(&text);
        assert_eq!(first.tree, second.tree, "rendered:\n{}", text);
        assert_eq!(first.selectors, second.selectors, "rendered:\n{}", text);
    }

    #[test]
    fn test_round_trip_in_text_mode() {
        let options = ParseOptions::default().with_render_closures_as_text(true);
        let parser = ConfigParser::new(options);
        let first = parser.parse_str("memory = { 2 * task.attempt }\nx.y = 1e20").unwrap();
        assert_eq!(
            first.tree.get("memory"),
            Some(&Value::String("{ 2 * task.attempt }".into()))
        );
        let text = render_config(&first.tree, &first.selectors);
        let second = parser.parse_str(&text).unwrap();
        assert_eq!(first.tree, second.tree);
    }

    #[test]
    fn test_render_value_forms() {
        assert_eq!(render_value(&Value::Float(2.0)), "2.0");
        assert_eq!(render_value(&Value::String("a$b".into())), "'a$b'");
        assert_eq!(render_value(&Value::Map(ConfigTree::new())), "[:]");
        assert_eq!(render_value(&Value::List(vec![])), "[]");
        assert_eq!(render_key("if"), "'if'");
        assert_eq!(render_key("cpus_2"), "cpus_2");
    }

    #[test]
    fn test_flatten() {
        let parsed = parse("a { b = 1; c { d = 'x' } }\ne = [1, 2]\nf = [:]");
        let flat = flatten(&parsed.tree);
        let keys: Vec<&str> = flat.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a.b", "a.c.d", "e", "f"]);
        assert_eq!(flat[1].1, Value::String("x".into()));
    }

    #[test]
    fn test_to_json_keeps_order_and_closure_source() {
        let parsed = parse("z = 1\na { f = { it } }");
        let json = to_json(&parsed.tree).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["a"]["f"], serde_json::json!("{ it }"));
        assert!(json.find("\"z\"").unwrap() < json.find("\"a\"").unwrap());
    }
}
