// Author: Dustin Pilgrim
// License: MIT

use super::*;
use std::cell::Cell;
use std::fs;
use std::rc::Rc;

use indexmap::IndexMap;
use tempfile::TempDir;

use crate::error::{ConfigError, ErrorKind};
use crate::merge::deep_merge;

fn parse(source: &str) -> ParsedConfig {
    ConfigParser::default().parse_str(source).expect("config should parse")
}

/// Filesystem resolver that counts reads per parse.
#[derive(Clone)]
struct CountingResolver {
    reads: Rc<Cell<usize>>,
}

impl PathResolver for CountingResolver {
    fn resolve(&self, raw: &str, base_dir: Option<&Path>) -> Result<PathBuf> {
        FsResolver.resolve(raw, base_dir)
    }

    fn read(&self, path: &Path) -> Result<String> {
        self.reads.set(self.reads.get() + 1);
        FsResolver.read(path)
    }
}

#[test]
fn test_end_to_end_example() {
    let parsed = parse("a { b = 1 }\nc = 2\nproc:bar { tag = 'x' }");

    let mut expected = ConfigTree::new();
    let mut a = ConfigTree::new();
    a.insert("b".into(), Value::Int(1));
    expected.insert("a".into(), Value::Map(a));
    expected.insert("c".into(), Value::Int(2));
    assert_eq!(parsed.tree, expected);

    assert_eq!(parsed.selectors.len(), 1);
    let selector = parsed.selectors.get("proc", "bar").unwrap();
    assert_eq!(selector.assignments, vec![(vec!["tag".to_string()], Value::String("x".into()))]);
}

#[test]
fn test_plain_assignment_overwrites() {
    let parsed = parse("a.b = 1\na.b = 2");
    assert_eq!(parsed.get::<i64>("a.b").unwrap(), 2);
}

#[test]
fn test_blocks_deep_merge() {
    let parsed = parse("x { k = 1 }\nx { j = 2 }");
    assert_eq!(parsed.get::<i64>("x.k").unwrap(), 1);
    assert_eq!(parsed.get::<i64>("x.j").unwrap(), 2);
    assert_eq!(parsed.get_keys("x").unwrap(), vec!["k", "j"]);
}

#[test]
fn test_block_after_scalar_replaces_it() {
    let parsed = parse("x = 5\nx { k = 1 }");
    assert_eq!(parsed.get::<i64>("x.k").unwrap(), 1);
}

#[test]
fn test_merge_with_itself_is_identity() {
    let parsed = parse("a { b = 1; c { d = [1, 2] } }\ne = 'x'");
    assert_eq!(deep_merge(&parsed.tree, &parsed.tree), parsed.tree);
}

#[test]
fn test_selector_accumulation() {
    let parsed = parse("proc:foo { a = 1 }\nproc:foo { b = 2 }");
    assert_eq!(parsed.selectors.len(), 1);
    let selector = parsed.selectors.get("proc", "foo").unwrap();
    assert_eq!(
        selector.assignments,
        vec![(vec!["a".to_string()], Value::Int(1)), (vec!["b".to_string()], Value::Int(2))]
    );
    assert!(parsed.tree.is_empty());
}

#[test]
fn test_selectors_in_different_blocks_stay_apart() {
    let parsed = parse("process { withName: foo { cpus = 1 } }
executor { withName: foo { queueSize = 2 } }");
    assert_eq!(parsed.selectors.len(), 2);

    let process = parsed.selectors.get_in(&["process".to_string()], "withName", "foo").unwrap();
    assert_eq!(process.get("cpus"), Some(&Value::Int(1)));
    assert_eq!(process.get("queueSize"), None);

    let executor = parsed.selectors.get_in(&["executor".to_string()], "withName", "foo").unwrap();
    assert_eq!(executor.get("queueSize"), Some(&Value::Int(2)));
    assert_eq!(executor.get("cpus"), None);
}

#[test]
fn test_quoted_selector_key_is_one_segment() {
    let parsed = parse("withLabel: big { 'a.b' = 1; c.d = 2 }");
    let selector = parsed.selectors.get("withLabel", "big").unwrap();
    assert_eq!(selector.assignments[0].0, vec!["a.b".to_string()]);
    assert_eq!(selector.assignments[1].0, vec!["c".to_string(), "d".to_string()]);
}

#[test]
fn test_strict_vs_lenient() {
    let source = "process { queue = defaultQueue }";
    let lenient = ConfigParser::default().parse_str(source).unwrap();
    assert_eq!(lenient.get_value("process.queue").unwrap(), &Value::Null);

    let err = ConfigParser::new(ParseOptions::new().with_strict(true))
        .parse_str(source)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StrictProperty);
}

#[test]
fn test_plugins_top_level_only() {
    let parsed = parse("plugins { id 'nf-foo' }");
    assert_eq!(parsed.plugins[0].id, "nf-foo");
    assert_eq!(parsed.plugins[0].to_string(), "nf-foo");

    let err = ConfigParser::default()
        .parse_str("outer { plugins { id 'nf-foo' } }")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigParse);
}

#[test]
fn test_plugin_spec_parse() {
    assert_eq!(
        PluginSpec::parse("nf-amazon@2.1.0"),
        PluginSpec {
            id: "nf-amazon".into(),
            version: Some("2.1.0".into())
        }
    );
    assert_eq!(PluginSpec::parse("nf-x@").version, None);
    assert_eq!(PluginSpec::parse("nf-amazon@2.1.0").to_string(), "nf-amazon@2.1.0");
}

#[test]
fn test_include_merges_into_current_scope() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("base.config"), "cpus = 2\nqueue = 'short'").unwrap();
    fs::write(
        dir.path().join("main.config"),
        "process {\n    includeConfig 'base.config'\n    queue = 'long'\n}\ntop = process.cpus",
    )
    .unwrap();

    let parsed = ConfigParser::default()
        .parse_file(dir.path().join("main.config"))
        .unwrap();
    assert_eq!(parsed.get::<i64>("process.cpus").unwrap(), 2);
    assert_eq!(parsed.get::<String>("process.queue").unwrap(), "long");
    assert_eq!(parsed.get::<i64>("top").unwrap(), 2);
    assert_eq!(
        parsed.includes,
        vec![dir.path().join("base.config").canonicalize().unwrap()]
    );
}

#[test]
fn test_nested_includes_resolve_relative_to_including_file() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("conf")).unwrap();
    fs::write(dir.path().join("conf/a.config"), "includeConfig 'b.config'\na = 1").unwrap();
    fs::write(dir.path().join("conf/b.config"), "b = params.name").unwrap();
    fs::write(dir.path().join("main.config"), "includeConfig 'conf/a.config'").unwrap();

    let options = ParseOptions::new().with_param("name", "sample");
    let parsed = ConfigParser::new(options)
        .parse_file(dir.path().join("main.config"))
        .unwrap();
    assert_eq!(parsed.get::<i64>("a").unwrap(), 1);
    assert_eq!(parsed.get::<String>("b").unwrap(), "sample");
    assert_eq!(parsed.includes.len(), 2);
}

#[test]
fn test_include_is_read_once_per_parse() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("shared.config"), "shared = true").unwrap();
    fs::write(
        dir.path().join("main.config"),
        "a { includeConfig 'shared.config' }\nb { includeConfig 'shared.config' }",
    )
    .unwrap();

    let reads = Rc::new(Cell::new(0));
    let parser = ConfigParser::default().with_resolver(CountingResolver { reads: reads.clone() });
    let parsed = parser.parse_file(dir.path().join("main.config")).unwrap();

    // main.config plus one read of the shared file
    assert_eq!(reads.get(), 2);
    assert!(parsed.get::<bool>("a.shared").unwrap());
    assert!(parsed.get::<bool>("b.shared").unwrap());
    assert_eq!(parsed.includes.len(), 1);

    // a second parse starts with an empty cache
    parser.parse_file(dir.path().join("main.config")).unwrap();
    assert_eq!(reads.get(), 4);
}

#[test]
fn test_include_cycle_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.config"), "includeConfig 'b.config'").unwrap();
    fs::write(dir.path().join("b.config"), "includeConfig 'a.config'").unwrap();

    let err = ConfigParser::default()
        .parse_file(dir.path().join("a.config"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncludeCycle);
    match err {
        ConfigError::IncludeCycle { chain, .. } => {
            assert_eq!(chain.len(), 3);
            assert_eq!(chain.first(), chain.last());
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_missing_include() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.config"), "includeConfig 'nope.config'").unwrap();
    let err = ConfigParser::default()
        .parse_file(dir.path().join("main.config"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncludeNotFound);
}

#[test]
fn test_ignore_includes() {
    let parsed = ConfigParser::new(ParseOptions::new().with_ignore_includes(true))
        .parse_str("includeConfig 'definitely/missing.config'\nx = 1")
        .unwrap();
    assert_eq!(parsed.get::<i64>("x").unwrap(), 1);
    assert!(parsed.includes.is_empty());
}

#[test]
fn test_include_path_must_be_a_string() {
    let err = ConfigParser::default().parse_str("includeConfig 42").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Eval);
    assert_eq!(err.code(), Some(510));
}

#[test]
fn test_typed_access() {
    let parsed = parse(
        "server { host = 'localhost'; port = 8080; debug = true; ratio = 0.5 }\n\
         tags = ['a', 'b']\n\
         limits = [cpus: 4]",
    );

    assert_eq!(parsed.get::<String>("server.host").unwrap(), "localhost");
    assert_eq!(parsed.get::<u16>("server.port").unwrap(), 8080);
    assert_eq!(parsed.get::<u64>("server.port").unwrap(), 8080);
    assert!(parsed.get::<bool>("server.debug").unwrap());
    assert_eq!(parsed.get::<f64>("server.ratio").unwrap(), 0.5);
    assert_eq!(parsed.get::<f64>("server.port").unwrap(), 8080.0);
    assert_eq!(parsed.get::<Vec<String>>("tags").unwrap(), vec!["a", "b"]);

    let limits: IndexMap<String, Value> = parsed.get("limits").unwrap();
    assert_eq!(limits["cpus"], Value::Int(4));

    assert!(parsed.has("server.host"));
    assert!(!parsed.has("server.nope"));
    assert_eq!(parsed.get_keys("").unwrap(), vec!["server", "tags", "limits"]);
    assert_eq!(parsed.get_or("server.timeout", 30i64), 30);
    assert_eq!(parsed.get_optional::<String>("server.nope").unwrap(), None);
}

#[test]
fn test_typed_access_errors() {
    let parsed = parse("port = 'eighty'\nneg = -1");

    let missing = parsed.get::<i64>("nope").unwrap_err();
    assert_eq!(missing.code(), Some(404));

    match parsed.get::<i64>("port").unwrap_err() {
        ConfigError::Conversion { path, code, .. } => {
            assert_eq!(path, "port");
            assert_eq!(code, Some(402));
        }
        other => panic!("unexpected error {:?}", other),
    }

    assert_eq!(parsed.get::<u64>("neg").unwrap_err().code(), Some(407));
    assert_eq!(parsed.get_keys("port").unwrap_err().code(), Some(406));
    assert!(parsed.get_optional::<i64>("port").is_err());
}

#[test]
fn test_options_deserialize_from_json() {
    let options: ParseOptions = serde_json::from_str(
        r#"{"strict": true, "profiles": ["test"], "params": {"reads": "*.fq", "n": 3}}"#,
    )
    .unwrap();
    assert!(options.strict);
    assert!(!options.ignore_includes);
    assert_eq!(options.profiles, Some(vec!["test".to_string()]));
    assert_eq!(options.params["n"], Value::Int(3));
}

#[test]
fn test_parse_errors_abort_the_unit() {
    let err = ConfigParser::default().parse_str("a = 1\nb = )\nc = 3").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);

    let err = ConfigParser::default().parse_str("a = 'open").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lex);
}
