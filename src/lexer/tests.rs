#[cfg(test)]
use super::*;

fn kinds(input: &str) -> Vec<TokenKind> {
    tokenize(input)
        .expect("tokenize failed")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Ident(name.into())
}

#[test]
fn test_block_and_assignment_tokens() {
    let input = r#"
process {
    cpus = 2
    withLabel: big { memory = '8 GB' }
}
"#;
    let expected = vec![
        TokenKind::Newline,
        ident("process"),
        TokenKind::LBrace,
        TokenKind::Newline,
        ident("cpus"),
        TokenKind::Assign,
        TokenKind::Int(2),
        TokenKind::Newline,
        ident("withLabel"),
        TokenKind::Colon,
        ident("big"),
        TokenKind::LBrace,
        ident("memory"),
        TokenKind::Assign,
        TokenKind::Str("8 GB".into()),
        TokenKind::RBrace,
        TokenKind::Newline,
        TokenKind::RBrace,
        TokenKind::Newline,
        TokenKind::Eof,
    ];
    assert_eq!(kinds(input), expected);
}

#[test]
fn test_keywords() {
    assert_eq!(
        kinds("includeConfig true false null def if else return in as instanceof"),
        vec![
            TokenKind::IncludeConfig,
            TokenKind::True,
            TokenKind::False,
            TokenKind::Null,
            TokenKind::Def,
            TokenKind::If,
            TokenKind::Else,
            TokenKind::Return,
            TokenKind::In,
            TokenKind::As,
            TokenKind::Instanceof,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_comments_are_skipped() {
    let input = "#!/usr/bin/env nextflow\na = 1 // trailing\n/* block\n comment */ b = 2";
    assert_eq!(
        kinds(input),
        vec![
            TokenKind::Newline,
            ident("a"),
            TokenKind::Assign,
            TokenKind::Int(1),
            TokenKind::Newline,
            ident("b"),
            TokenKind::Assign,
            TokenKind::Int(2),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_unterminated_block_comment() {
    let err = tokenize("a = 1 /* never closed").unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::Lex);
    assert_eq!(err.code(), Some(105));
}

#[test]
fn test_line_continuation() {
    assert_eq!(
        kinds("a = 1 + \\\n 2"),
        vec![ident("a"), TokenKind::Assign, TokenKind::Int(1), TokenKind::Plus, TokenKind::Int(2), TokenKind::Eof]
    );
}

#[test]
fn test_number_literals() {
    assert_eq!(
        kinds("42 0x1F 0b101 017 1_000 10L 3.5 1e3 2.5f 7d"),
        vec![
            TokenKind::Int(42),
            TokenKind::Int(31),
            TokenKind::Int(5),
            TokenKind::Int(15),
            TokenKind::Int(1000),
            TokenKind::Int(10),
            TokenKind::Float(3.5),
            TokenKind::Float(1000.0),
            TokenKind::Float(2.5),
            TokenKind::Float(7.0),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_number_followed_by_range_and_method() {
    assert_eq!(
        kinds("1..3 2.toString()"),
        vec![
            TokenKind::Int(1),
            TokenKind::Range,
            TokenKind::Int(3),
            TokenKind::Int(2),
            TokenKind::Dot,
            ident("toString"),
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_invalid_number() {
    let err = tokenize("x = 12abc").unwrap_err();
    assert_eq!(err.code(), Some(102));
}

#[test]
fn test_string_forms() {
    assert_eq!(
        kinds(r#"'single' "double" '''triple
line''' """x""""#),
        vec![
            TokenKind::Str("single".into()),
            TokenKind::Str("double".into()),
            TokenKind::Str("triple\nline".into()),
            TokenKind::Str("x".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_single_quotes_do_not_interpolate() {
    assert_eq!(kinds("'${x}'"), vec![TokenKind::Str("${x}".into()), TokenKind::Eof]);
}

#[test]
fn test_escapes() {
    assert_eq!(
        kinds(r#""a\tb\nA\$""#),
        vec![TokenKind::Str("a\tb\nA$".into()), TokenKind::Eof]
    );
    let err = tokenize(r#""\q""#).unwrap_err();
    assert_eq!(err.code(), Some(106));
}

#[test]
fn test_unterminated_string() {
    let err = tokenize("x = 'abc\ny = 1").unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::Lex);
    assert_eq!(err.code(), Some(103));
}

#[test]
fn test_gstring_placeholders() {
    let tokens = tokenize(r#""run ${task.cpus * 2} on $params.host now""#).unwrap();
    match &tokens[0].kind {
        TokenKind::GString(parts) => {
            assert_eq!(parts.len(), 5);
            assert_eq!(parts[0], StrPart::Text("run ".into()));
            assert!(matches!(&parts[1], StrPart::Expr { source, .. } if source == "task.cpus * 2"));
            assert_eq!(parts[2], StrPart::Text(" on ".into()));
            assert!(matches!(&parts[3], StrPart::Expr { source, .. } if source == "params.host"));
            assert_eq!(parts[4], StrPart::Text(" now".into()));
        }
        other => panic!("expected GString, got {:?}", other),
    }
}

#[test]
fn test_lone_dollar_is_text() {
    assert_eq!(kinds(r#""cost: $ 5""#), vec![TokenKind::Str("cost: $ 5".into()), TokenKind::Eof]);
}

#[test]
fn test_slashy_string_versus_division() {
    assert_eq!(
        kinds(r"x = /a\/b\d/"),
        vec![ident("x"), TokenKind::Assign, TokenKind::Str(r"a/b\d".into()), TokenKind::Eof]
    );
    assert_eq!(
        kinds("a / b"),
        vec![ident("a"), TokenKind::Slash, ident("b"), TokenKind::Eof]
    );
}

#[test]
fn test_maximal_munch_operators() {
    assert_eq!(
        kinds("a ?. b *. c ?: d ==~ e <=> f >>>= g ..< h"),
        vec![
            ident("a"),
            TokenKind::SafeDot,
            ident("b"),
            TokenKind::SpreadDot,
            ident("c"),
            TokenKind::Elvis,
            ident("d"),
            TokenKind::RegexMatch,
            ident("e"),
            TokenKind::Spaceship,
            ident("f"),
            TokenKind::UShrAssign,
            ident("g"),
            TokenKind::RangeExclusive,
            ident("h"),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_unexpected_character() {
    let err = tokenize("a = 1 @").unwrap_err();
    assert_eq!(err.code(), Some(104));
}

#[test]
fn test_spans_track_lines_and_columns() {
    let tokens = tokenize("a = 1\n  bb = 2").unwrap();
    let bb = tokens.iter().find(|t| t.kind == ident("bb")).unwrap();
    assert_eq!(bb.span.line, 2);
    assert_eq!(bb.span.column, 3);
    assert_eq!(bb.text, "bb");
}
