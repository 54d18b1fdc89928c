#[cfg(test)]
use super::*;
use crate::ast::{Argument, BinaryOp, ConfigStmt, Literal, PathElement, Stmt, UnaryOp};
use crate::error::ErrorKind;

fn expr(source: &str) -> Expr {
    parse_expression(source).expect("expression should parse")
}

fn int(expr: &Expr) -> i64 {
    match expr {
        Expr::Literal(Literal::Int(n), _) => *n,
        other => panic!("expected int literal, got {:?}", other),
    }
}

#[test]
fn test_assignments_and_blocks() {
    let unit = parse(
        r#"
params.input = 'data/*.fq'
process {
    cpus = 4
    memory = '2 GB'
}
"#,
    )
    .unwrap();

    assert_eq!(unit.statements.len(), 2);
    match &unit.statements[0] {
        ConfigStmt::Assign { path, value, .. } => {
            assert_eq!(path, &vec!["params".to_string(), "input".to_string()]);
            assert!(matches!(value, Expr::Literal(Literal::Str(s), _) if s == "data/*.fq"));
        }
        other => panic!("unexpected statement {:?}", other),
    }
    match &unit.statements[1] {
        ConfigStmt::Block { name, body, .. } => {
            assert_eq!(name, &vec!["process".to_string()]);
            assert_eq!(body.len(), 2);
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_semicolons_and_closing_brace_on_same_line() {
    let unit = parse("a { x = 1; y = 2 }; b = 3").unwrap();
    assert_eq!(unit.statements.len(), 2);
}

#[test]
fn test_missing_separator_is_error() {
    let err = parse("a = 1 b = 2").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn test_quoted_block_name() {
    let unit = parse("env { 'MY_VAR' = 'x' }\n'docker' { enabled = true }").unwrap();
    match &unit.statements[1] {
        ConfigStmt::Block { name, .. } => assert_eq!(name, &vec!["docker".to_string()]),
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_selector_statement() {
    let unit = parse("process {\n withLabel: 'big_mem' {\n memory = '64 GB'\n cpus = 8\n }\n}").unwrap();
    let ConfigStmt::Block { body, .. } = &unit.statements[0] else {
        panic!("expected block");
    };
    match &body[0] {
        ConfigStmt::Selector { kind, target, body, .. } => {
            assert_eq!(kind, "withLabel");
            assert_eq!(target, "big_mem");
            assert_eq!(body.len(), 2);
            assert_eq!(body[0].path, vec!["memory".to_string()]);
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_dotted_selector_nests_in_block() {
    let unit = parse("process.withName: FOO { cpus = 2 }").unwrap();
    match &unit.statements[0] {
        ConfigStmt::Block { name, body, .. } => {
            assert_eq!(name, &vec!["process".to_string()]);
            assert!(matches!(&body[0], ConfigStmt::Selector { kind, target, .. } if kind == "withName" && target == "FOO"));
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_selector_body_restrictions() {
    let nested_block = parse("withLabel: a { foo { x = 1 } }").unwrap_err();
    assert_eq!(nested_block.kind(), ErrorKind::ConfigParse);
    assert_eq!(nested_block.code(), Some(251));

    let nested_selector = parse("withLabel: a { withName: b { x = 1 } }").unwrap_err();
    assert_eq!(nested_selector.code(), Some(252));

    let include = parse("withLabel: a { includeConfig 'x.config' }").unwrap_err();
    assert_eq!(include.code(), Some(253));
}

#[test]
fn test_include_statement() {
    let unit = parse("includeConfig 'base.config'\nincludeConfig \"${projectDir}/extra.config\"").unwrap();
    assert!(matches!(&unit.statements[0], ConfigStmt::Include { path: Expr::Literal(Literal::Str(s), _), .. } if s == "base.config"));
    assert!(matches!(&unit.statements[1], ConfigStmt::Include { path: Expr::GString(..), .. }));
}

#[test]
fn test_plugins_block() {
    let unit = parse("plugins {\n id 'nf-amazon@2.1.0'\n id('nf-schema')\n}").unwrap();
    match &unit.statements[0] {
        ConfigStmt::Plugins { plugins, .. } => {
            assert_eq!(plugins.len(), 2);
            assert!(matches!(&plugins[0].id, Expr::Literal(Literal::Str(s), _) if s == "nf-amazon@2.1.0"));
            assert!(matches!(&plugins[1].id, Expr::Literal(Literal::Str(s), _) if s == "nf-schema"));
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_plugins_must_be_top_level() {
    let err = parse("profiles { dev { plugins { id 'nf-x' } } }").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigParse);
    assert_eq!(err.code(), Some(250));

    let err = parse("a.plugins { id 'nf-x' }").unwrap_err();
    assert_eq!(err.code(), Some(250));
}

#[test]
fn test_plugins_rejects_other_statements() {
    let err = parse("plugins { foo = 1 }").unwrap_err();
    assert_eq!(err.code(), Some(254));
    let err = parse("plugins { name 'nf-x' }").unwrap_err();
    assert_eq!(err.code(), Some(254));
}

#[test]
fn test_multiplicative_binds_tighter_than_additive() {
    match expr("1 + 2 * 3") {
        Expr::Binary { op: BinaryOp::Add, left, right, .. } => {
            assert_eq!(int(&left), 1);
            assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_power_is_left_associative_and_above_unary_minus() {
    match expr("2 ** 3 ** 2") {
        Expr::Binary { op: BinaryOp::Pow, left, right, .. } => {
            assert!(matches!(*left, Expr::Binary { op: BinaryOp::Pow, .. }));
            assert_eq!(int(&right), 2);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(expr("-2 ** 2"), Expr::Unary { op: UnaryOp::Neg, .. }));
}

#[test]
fn test_negative_literal_is_folded() {
    assert_eq!(int(&expr("-5")), -5);
}

#[test]
fn test_logical_and_binds_tighter_than_or() {
    match expr("a || b && c") {
        Expr::Binary { op: BinaryOp::Or, right, .. } => {
            assert!(matches!(*right, Expr::Binary { op: BinaryOp::And, .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_ternary_and_elvis() {
    assert!(matches!(expr("a ? 1 : 2"), Expr::Ternary { .. }));
    assert!(matches!(expr("a ?: 'default'"), Expr::Elvis { .. }));
    // right associative
    match expr("a ? 1 : b ? 2 : 3") {
        Expr::Ternary { otherwise, .. } => assert!(matches!(*otherwise, Expr::Ternary { .. })),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_range_in_and_regex_operators() {
    assert!(matches!(expr("1..10"), Expr::Binary { op: BinaryOp::Range, .. }));
    assert!(matches!(expr("1..<10"), Expr::Binary { op: BinaryOp::RangeExclusive, .. }));
    assert!(matches!(expr("x in [1, 2]"), Expr::Binary { op: BinaryOp::In, .. }));
    assert!(matches!(expr("name ==~ /fo+/"), Expr::Binary { op: BinaryOp::RegexMatch, .. }));
}

#[test]
fn test_casts() {
    assert!(matches!(expr("x as Integer"), Expr::Cast { ty, .. } if ty == "Integer"));
    assert!(matches!(expr("(int) -x"), Expr::Cast { ty, .. } if ty == "int"));
    assert!(matches!(expr("x instanceof String"), Expr::InstanceOf { ty, .. } if ty == "String"));
    // a lowercase name in parentheses is a grouping
    assert!(matches!(expr("(a) - b"), Expr::Binary { op: BinaryOp::Sub, .. }));
}

#[test]
fn test_path_navigation() {
    match expr("params.list?.first()*.name[0]") {
        Expr::Path { head, elements } => {
            assert!(matches!(*head, Expr::Ident(ref n, _) if n == "params"));
            assert_eq!(elements.len(), 5);
            assert!(matches!(&elements[1], PathElement::Property { safe: true, .. }));
            assert!(matches!(&elements[2], PathElement::Call { .. }));
            assert!(matches!(&elements[3], PathElement::Property { spread: true, .. }));
            assert!(matches!(&elements[4], PathElement::Index { .. }));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_named_arguments() {
    match expr("foo(a: 1, 2)") {
        Expr::Path { elements, .. } => match &elements[0] {
            PathElement::Call { args, .. } => {
                assert!(matches!(&args[0], Argument::Named(n, _) if n == "a"));
                assert!(matches!(&args[1], Argument::Positional(_)));
            }
            other => panic!("unexpected {:?}", other),
        },
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_lists_and_maps() {
    assert!(matches!(expr("[1, 2, 3]"), Expr::List(items, _) if items.len() == 3));
    assert!(matches!(expr("[]"), Expr::List(items, _) if items.is_empty()));
    assert!(matches!(expr("[:]"), Expr::Map(entries, _) if entries.is_empty()));
    assert!(matches!(expr("[a: 1, 'b': 2, (k): 3]"), Expr::Map(entries, _) if entries.len() == 3));

    let err = parse_expression("[1, a: 2]").unwrap_err();
    assert_eq!(err.code(), Some(210));
}

#[test]
fn test_closure_params_and_source() {
    match expr("{ a, int b -> a + b }") {
        Expr::Closure(closure) => {
            assert_eq!(closure.params, vec!["a".to_string(), "b".to_string()]);
            assert_eq!(closure.source, "{ a, int b -> a + b }");
            assert_eq!(closure.body.len(), 1);
        }
        other => panic!("unexpected {:?}", other),
    }

    match expr("{ -> 42 }") {
        Expr::Closure(closure) => assert!(closure.params.is_empty()),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_closure_body_statements() {
    let closure = match expr("{ x ->\n def y = x * 2\n if (y > 4) { return y }\n else return 0\n}") {
        Expr::Closure(closure) => closure,
        other => panic!("unexpected {:?}", other),
    };
    assert!(matches!(&closure.body[0], Stmt::Def { name, .. } if name == "y"));
    assert!(matches!(&closure.body[1], Stmt::If { otherwise: Some(_), .. }));
}

#[test]
fn test_gstring_placeholder_is_parsed() {
    match expr(r#""cpus: ${task.cpus + 1}""#) {
        Expr::GString(parts, _) => {
            assert_eq!(parts.len(), 2);
            assert!(matches!(&parts[1], crate::ast::StringPart::Expr(Expr::Binary { op: BinaryOp::Add, .. })));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_command_call_without_parentheses() {
    let closure = match expr("{ println 'hello', 2 }") {
        Expr::Closure(closure) => closure,
        other => panic!("unexpected {:?}", other),
    };
    match &closure.body[0] {
        Stmt::Expr(Expr::Command { callee, args, .. }) => {
            assert!(matches!(callee.as_ref(), Expr::Ident(n, _) if n == "println"));
            assert_eq!(args.len(), 2);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_call_followed_by_argument_starts_new_statement() {
    // `foo() bar` is two statements, not a call of `foo()` with argument `bar`
    let closure = match expr("{ foo() bar }") {
        Expr::Closure(closure) => closure,
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(closure.body.len(), 2);
    assert!(matches!(&closure.body[1], Stmt::Expr(Expr::Ident(n, _)) if n == "bar"));
}

#[test]
fn test_command_shape_classification() {
    assert_eq!(command_shape(&expr("foo")).unwrap(), CommandShape::AcceptsArguments);
    assert_eq!(command_shape(&expr("a.b")).unwrap(), CommandShape::AcceptsArguments);
    assert_eq!(command_shape(&expr("a[0]")).unwrap(), CommandShape::AcceptsArguments);
    assert_eq!(command_shape(&expr("foo()")).unwrap(), CommandShape::FollowsArgumentsOrClosure);
    assert_eq!(command_shape(&expr("list.each { it }")).unwrap(), CommandShape::FollowsArgumentsOrClosure);
    assert_eq!(command_shape(&expr("1 + 2")).unwrap(), CommandShape::NotCallable);

    let empty = Expr::Path {
        head: Box::new(expr("foo")),
        elements: Vec::new(),
    };
    let err = command_shape(&empty).unwrap_err();
    assert_eq!(err.code(), Some(299));
}

#[test]
fn test_newline_continuation_rules() {
    // a trailing binary operator continues onto the next line
    assert!(parse("x = 1 +\n 2").is_ok());
    // a leading dot continues a path
    let unit = parse("x = 'abc'\n    .toUpperCase()").unwrap();
    assert_eq!(unit.statements.len(), 1);
    // newlines inside brackets are insignificant
    assert!(parse("x = [\n 1,\n 2\n]").is_ok());
    assert!(parse("x = foo(\n 1,\n 2\n)").is_ok());
}

#[test]
fn test_invalid_assignment_target() {
    let err = parse_expression("{ 1 = 2 }").unwrap_err();
    assert_eq!(err.code(), Some(206));
}

#[test]
fn test_multiple_assignment() {
    let closure = match expr("{ def (a, b) = [1, 2]; (a, b) = [b, a] }") {
        Expr::Closure(closure) => closure,
        other => panic!("unexpected {:?}", other),
    };
    assert!(matches!(&closure.body[0], Stmt::Expr(Expr::MultiAssign { targets, .. }) if targets.len() == 2));
    assert!(matches!(&closure.body[1], Stmt::Expr(Expr::MultiAssign { .. })));
}

#[test]
fn test_unexpected_token_reports_position() {
    let err = parse("a = 1\nb = )").unwrap_err();
    let span = err.span().unwrap();
    assert_eq!(span.line, 2);
    assert_eq!(span.column, 5);
}
