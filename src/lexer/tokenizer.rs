use super::*;
use super::scanner::{bump, peek_nth, skip_whitespace_and_comments};

use once_cell::sync::Lazy;
use std::collections::HashMap;

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ("true", TokenKind::True),
        ("false", TokenKind::False),
        ("null", TokenKind::Null),
        ("as", TokenKind::As),
        ("in", TokenKind::In),
        ("instanceof", TokenKind::Instanceof),
        ("def", TokenKind::Def),
        ("if", TokenKind::If),
        ("else", TokenKind::Else),
        ("return", TokenKind::Return),
        ("includeConfig", TokenKind::IncludeConfig),
    ])
});

/// Operators ordered longest first so that maximal munch falls out of a linear scan.
const OPERATORS: &[(&str, TokenKind)] = &[
    (">>>=", TokenKind::UShrAssign),
    ("**=", TokenKind::PowerAssign),
    ("<<=", TokenKind::ShlAssign),
    (">>=", TokenKind::ShrAssign),
    (">>>", TokenKind::UShr),
    ("<=>", TokenKind::Spaceship),
    ("==~", TokenKind::RegexMatch),
    ("..<", TokenKind::RangeExclusive),
    ("?:", TokenKind::Elvis),
    ("?.", TokenKind::SafeDot),
    ("*.", TokenKind::SpreadDot),
    ("?=", TokenKind::ElvisAssign),
    ("->", TokenKind::Arrow),
    ("++", TokenKind::Inc),
    ("--", TokenKind::Dec),
    ("**", TokenKind::Power),
    ("<<", TokenKind::Shl),
    (">>", TokenKind::Shr),
    ("..", TokenKind::Range),
    ("<=", TokenKind::Le),
    (">=", TokenKind::Ge),
    ("==", TokenKind::Eq),
    ("!=", TokenKind::Ne),
    ("=~", TokenKind::RegexFind),
    ("&&", TokenKind::AndAnd),
    ("||", TokenKind::OrOr),
    ("+=", TokenKind::PlusAssign),
    ("-=", TokenKind::MinusAssign),
    ("*=", TokenKind::StarAssign),
    ("/=", TokenKind::SlashAssign),
    ("%=", TokenKind::PercentAssign),
    ("&=", TokenKind::AmpAssign),
    ("^=", TokenKind::CaretAssign),
    ("|=", TokenKind::PipeAssign),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    (",", TokenKind::Comma),
    (":", TokenKind::Colon),
    ("?", TokenKind::Question),
    (".", TokenKind::Dot),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("!", TokenKind::Not),
    ("~", TokenKind::Tilde),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("=", TokenKind::Assign),
    ("&", TokenKind::Amp),
    ("^", TokenKind::Caret),
    ("|", TokenKind::Pipe),
    (";", TokenKind::Semi),
];

pub(super) fn next_token(lexer: &mut Lexer) -> Result<Token> {
    skip_whitespace_and_comments(lexer)?;

    let span = lexer.span();
    let start = lexer.offset;

    let kind = match lexer.peek {
        None => TokenKind::Eof,
        Some('\n') => {
            bump(lexer);
            TokenKind::Newline
        }
        Some('\'') | Some('"') => strings::tokenize_quoted(lexer, span)?,
        Some('/') if !lexer.prev_ends_operand => strings::tokenize_slashy(lexer, span)?,
        Some(c) if c.is_ascii_digit() => tokenize_number(lexer, span)?,
        Some(c) if is_ident_start(c) => tokenize_identifier_or_keyword(lexer),
        Some(_) => tokenize_operator(lexer, span)?,
    };

    Ok(Token {
        kind,
        text: lexer.slice(start).to_string(),
        span,
    })
}

pub(super) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub(super) fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn tokenize_identifier_or_keyword(lexer: &mut Lexer) -> TokenKind {
    let mut ident = String::new();
    while let Some(ch) = lexer.peek {
        if is_ident_part(ch) {
            ident.push(ch);
            bump(lexer);
        } else {
            break;
        }
    }

    KEYWORDS
        .get(ident.as_str())
        .cloned()
        .unwrap_or(TokenKind::Ident(ident))
}

fn tokenize_operator(lexer: &mut Lexer, span: Span) -> Result<TokenKind> {
    let rest = &lexer.source[lexer.offset..];
    for (text, kind) in OPERATORS {
        if rest.starts_with(text) {
            for _ in 0..text.chars().count() {
                bump(lexer);
            }
            return Ok(kind.clone());
        }
    }

    let ch = lexer.peek.unwrap_or('\0');
    bump(lexer);
    Err(lexer.error(
        format!("Unexpected character '{}'", ch),
        span,
        Some("Unexpected character in input"),
        104,
    ))
}

fn tokenize_number(lexer: &mut Lexer, span: Span) -> Result<TokenKind> {
    if lexer.peek == Some('0') {
        let radix = match peek_nth(lexer, 1) {
            Some('x') | Some('X') => Some(16),
            Some('b') | Some('B') => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            bump(lexer);
            bump(lexer);
            let digits = take_digits(lexer, |c| c.is_digit(radix));
            skip_integer_suffix(lexer);
            return parse_integer(lexer, &digits, radix, span);
        }
    }

    let mut digits = take_digits(lexer, |c| c.is_ascii_digit());
    let mut is_float = false;

    // fraction only when a digit follows the dot, so `1..3` and `2.toString()` stay intact
    if lexer.peek == Some('.') && peek_nth(lexer, 1).is_some_and(|c| c.is_ascii_digit()) {
        bump(lexer);
        digits.push('.');
        digits.push_str(&take_digits(lexer, |c| c.is_ascii_digit()));
        is_float = true;
    }

    if matches!(lexer.peek, Some('e') | Some('E')) {
        let sign = peek_nth(lexer, 1);
        let exponent_follows = match sign {
            Some('+') | Some('-') => peek_nth(lexer, 2).is_some_and(|c| c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        };
        if exponent_follows {
            digits.push('e');
            bump(lexer);
            if let Some(s @ ('+' | '-')) = lexer.peek {
                digits.push(s);
                bump(lexer);
            }
            digits.push_str(&take_digits(lexer, |c| c.is_ascii_digit()));
            is_float = true;
        }
    }

    match lexer.peek {
        Some('f' | 'F' | 'd' | 'D') => {
            bump(lexer);
            is_float = true;
        }
        Some('g' | 'G') if is_float => {
            bump(lexer);
        }
        _ if !is_float => skip_integer_suffix(lexer),
        _ => {}
    }

    if let Some(c) = lexer.peek {
        if is_ident_part(c) {
            return Err(lexer.error(
                format!("Invalid number literal '{}{}'", digits, c),
                span,
                None,
                102,
            ));
        }
    }

    if is_float {
        return digits.parse::<f64>().map(TokenKind::Float).map_err(|_| {
            lexer.error(format!("Invalid number '{}'", digits), span, None, 102)
        });
    }

    // a leading zero means octal, as in `017`
    if digits.len() > 1 && digits.starts_with('0') {
        return parse_integer(lexer, &digits[1..], 8, span);
    }
    parse_integer(lexer, &digits, 10, span)
}

fn take_digits(lexer: &mut Lexer, accept: impl Fn(char) -> bool) -> String {
    let mut out = String::new();
    while let Some(c) = lexer.peek {
        if accept(c) {
            out.push(c);
            bump(lexer);
        } else if c == '_' && peek_nth(lexer, 1).is_some_and(&accept) {
            bump(lexer);
        } else {
            break;
        }
    }
    out
}

fn skip_integer_suffix(lexer: &mut Lexer) {
    if let Some('l' | 'L' | 'i' | 'I' | 'g' | 'G') = lexer.peek {
        bump(lexer);
    }
}

fn parse_integer(lexer: &Lexer, digits: &str, radix: u32, span: Span) -> Result<TokenKind> {
    if digits.is_empty() {
        return Err(lexer.error("Missing digits in number literal", span, None, 102));
    }
    i64::from_str_radix(digits, radix).map(TokenKind::Int).map_err(|_| {
        lexer.error(
            format!("Invalid number '{}'", digits),
            span,
            Some("Integer literals must fit in 64 bits"),
            102,
        )
    })
}
