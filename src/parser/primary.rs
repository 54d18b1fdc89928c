use std::sync::Arc;

use super::*;
use super::expression::{parse_type_name, parse_unary_add, parse_unary_not};
use crate::ast::{Argument, ClosureExpr, Literal, MapKey, PathElement, StringPart};
use crate::lexer::StrPart;

const PRIMITIVE_TYPES: &[&str] = &["int", "long", "short", "byte", "char", "float", "double", "boolean"];

pub(super) fn parse_cast_or_path(p: &mut Parser) -> Result<Expr> {
    if let Some(primitive) = cast_lookahead(p) {
        let span = p.bump().span;
        let ty = p.with_newlines_ignored(|p| {
            let ty = parse_type_name(p)?;
            p.expect(TokenKind::RParen, "')' after cast type")?;
            Ok(ty)
        })?;
        let operand = match p.peek_kind() {
            TokenKind::Plus | TokenKind::Minus if primitive => parse_unary_add(p)?,
            TokenKind::Inc | TokenKind::Dec => parse_unary_add(p)?,
            _ => parse_unary_not(p)?,
        };
        return Ok(Expr::Cast { ty, expr: Box::new(operand), span });
    }
    parse_path(p)
}

/// `(Type) operand`: returns `Some(is_primitive)` when the upcoming tokens form a cast.
///
/// Only primitive names and capitalised class names count as types, so `(a) - b`
/// stays a subtraction; a sign may follow only a primitive cast.
fn cast_lookahead(p: &Parser) -> Option<bool> {
    if !p.check(&TokenKind::LParen) {
        return None;
    }
    let mut n = 1;
    let mut last = match p.peek_nth(n) {
        TokenKind::Ident(name) => name.clone(),
        _ => return None,
    };
    let first = last.clone();
    n += 1;
    while p.peek_nth(n) == &TokenKind::Dot {
        match p.peek_nth(n + 1) {
            TokenKind::Ident(name) => last = name.clone(),
            _ => return None,
        }
        n += 2;
    }
    while p.peek_nth(n) == &TokenKind::LBracket && p.peek_nth(n + 1) == &TokenKind::RBracket {
        n += 2;
    }
    if p.peek_nth(n) != &TokenKind::RParen {
        return None;
    }

    let primitive = n == 2 && PRIMITIVE_TYPES.contains(&first.as_str());
    if !primitive && !last.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }

    let follows_operand = match p.peek_nth(n + 1) {
        TokenKind::Ident(_)
        | TokenKind::Int(_)
        | TokenKind::Float(_)
        | TokenKind::Str(_)
        | TokenKind::GString(_)
        | TokenKind::True
        | TokenKind::False
        | TokenKind::Null
        | TokenKind::LParen
        | TokenKind::LBracket
        | TokenKind::Not
        | TokenKind::Tilde
        | TokenKind::Inc
        | TokenKind::Dec => true,
        TokenKind::Plus | TokenKind::Minus => primitive,
        _ => false,
    };
    follows_operand.then_some(primitive)
}

fn parse_path(p: &mut Parser) -> Result<Expr> {
    let head = parse_primary(p)?;
    let mut elements = Vec::new();

    loop {
        // navigation may continue on the next line: `foo\n    .bar()`
        if p.continues_with(&[TokenKind::Dot, TokenKind::SafeDot, TokenKind::SpreadDot]) {
            let op = p.bump();
            p.skip_newlines();
            let name_token = p.bump();
            let name = property_name(&name_token).ok_or_else(|| {
                ConfigError::parse(
                    format!("Expected property name after '{}', got {}", op.text, describe(&name_token)),
                    name_token.span,
                    None,
                    209,
                )
            })?;
            elements.push(PathElement::Property {
                name,
                safe: op.kind == TokenKind::SafeDot,
                spread: op.kind == TokenKind::SpreadDot,
                span: name_token.span,
            });
            continue;
        }

        if p.at_raw_newline() && !p.ignoring_newlines() {
            break;
        }

        match p.peek_kind() {
            TokenKind::LParen => {
                let span = p.span();
                let args = parse_arguments(p)?;
                elements.push(PathElement::Call { args, span });
            }
            TokenKind::LBracket => {
                let span = p.bump().span;
                let index = p.with_newlines_ignored(|p| {
                    let index = parse_expression_list(p, &TokenKind::RBracket)?;
                    p.expect(TokenKind::RBracket, "']'")?;
                    Ok(index)
                })?;
                elements.push(PathElement::Index { index, safe: false, span });
            }
            TokenKind::LBrace => {
                let closure = parse_closure(p)?;
                elements.push(PathElement::Closure(closure));
            }
            _ => break,
        }
    }

    if elements.is_empty() {
        Ok(head)
    } else {
        Ok(Expr::Path { head: Box::new(head), elements })
    }
}

/// Names usable after a dot, including keywords such as `in` or `as`.
pub(super) fn property_name(token: &Token) -> Option<String> {
    match &token.kind {
        TokenKind::Ident(name) | TokenKind::Str(name) => Some(name.clone()),
        TokenKind::In
        | TokenKind::As
        | TokenKind::Def
        | TokenKind::If
        | TokenKind::Else
        | TokenKind::Return
        | TokenKind::Instanceof
        | TokenKind::True
        | TokenKind::False
        | TokenKind::Null
        | TokenKind::IncludeConfig => Some(token.text.clone()),
        _ => None,
    }
}

fn parse_primary(p: &mut Parser) -> Result<Expr> {
    let span = p.span();
    match p.peek_kind().clone() {
        TokenKind::Int(n) => {
            p.bump();
            Ok(Expr::Literal(Literal::Int(n), span))
        }
        TokenKind::Float(f) => {
            p.bump();
            Ok(Expr::Literal(Literal::Float(f), span))
        }
        TokenKind::Str(s) => {
            p.bump();
            Ok(Expr::Literal(Literal::Str(s), span))
        }
        TokenKind::True => {
            p.bump();
            Ok(Expr::Literal(Literal::Bool(true), span))
        }
        TokenKind::False => {
            p.bump();
            Ok(Expr::Literal(Literal::Bool(false), span))
        }
        TokenKind::Null => {
            p.bump();
            Ok(Expr::Literal(Literal::Null, span))
        }
        TokenKind::GString(parts) => {
            p.bump();
            Ok(Expr::GString(parse_string_parts(parts)?, span))
        }
        TokenKind::Ident(name) => {
            p.bump();
            Ok(Expr::Ident(name, span))
        }
        TokenKind::LParen => {
            p.bump();
            p.with_newlines_ignored(|p| {
                let expr = p.parse_expression()?;
                p.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            })
        }
        TokenKind::LBracket => parse_list_or_map(p),
        TokenKind::LBrace => Ok(Expr::Closure(parse_closure(p)?)),
        _ => Err(p.unexpected("in expression")),
    }
}

fn parse_string_parts(parts: Vec<StrPart>) -> Result<Vec<StringPart>> {
    let mut out = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            StrPart::Text(text) => out.push(StringPart::Text(text)),
            StrPart::Expr { source, span } => {
                if source.trim().is_empty() {
                    out.push(StringPart::Expr(Expr::Literal(Literal::Null, span)));
                    continue;
                }
                let mut sub = Parser::with_base(&source, span)?;
                sub.skip_separators();
                let expr = sub.parse_expression()?;
                sub.skip_separators();
                sub.expect_eof()?;
                out.push(StringPart::Expr(expr));
            }
        }
    }
    Ok(out)
}

fn parse_expression_list(p: &mut Parser, terminator: &TokenKind) -> Result<Vec<Expr>> {
    let mut items = Vec::new();
    while !p.check(terminator) {
        items.push(p.parse_expression()?);
        if !p.eat(&TokenKind::Comma) {
            break;
        }
    }
    Ok(items)
}

/// `( args )` with positional and `name: value` arguments.
pub(super) fn parse_arguments(p: &mut Parser) -> Result<Vec<Argument>> {
    p.bump();
    p.with_newlines_ignored(|p| {
        let mut args = Vec::new();
        while !p.check(&TokenKind::RParen) {
            args.push(parse_argument(p)?);
            if !p.eat(&TokenKind::Comma) {
                break;
            }
        }
        p.expect(TokenKind::RParen, "')' after arguments")?;
        Ok(args)
    })
}

pub(super) fn parse_argument(p: &mut Parser) -> Result<Argument> {
    if p.peek_nth(1) == &TokenKind::Colon {
        if let Some(name) = property_name(p.peek()) {
            p.bump();
            p.bump();
            p.skip_newlines();
            return Ok(Argument::Named(name, p.parse_expression()?));
        }
    }
    Ok(Argument::Positional(p.parse_expression()?))
}

fn parse_list_or_map(p: &mut Parser) -> Result<Expr> {
    let span = p.bump().span;
    p.with_newlines_ignored(|p| {
        // [:]
        if p.check(&TokenKind::Colon) && p.peek_nth(1) == &TokenKind::RBracket {
            p.bump();
            p.bump();
            return Ok(Expr::Map(Vec::new(), span));
        }

        let mut items = Vec::new();
        let mut entries = Vec::new();
        while !p.check(&TokenKind::RBracket) {
            let computed = p.check(&TokenKind::LParen);
            let key_token = p.peek().clone();
            let expr = p.parse_expression()?;

            if p.eat(&TokenKind::Colon) {
                if !items.is_empty() {
                    return Err(ConfigError::parse("Cannot mix list items and map entries", key_token.span, None, 210));
                }
                let key = if computed {
                    MapKey::Computed(expr)
                } else {
                    map_key(expr, &key_token)
                };
                entries.push((key, p.parse_expression()?));
            } else {
                if !entries.is_empty() {
                    return Err(ConfigError::parse("Cannot mix list items and map entries", key_token.span, None, 210));
                }
                items.push(expr);
            }

            if !p.eat(&TokenKind::Comma) {
                break;
            }
        }
        p.expect(TokenKind::RBracket, "']'")?;

        if entries.is_empty() {
            Ok(Expr::List(items, span))
        } else {
            Ok(Expr::Map(entries, span))
        }
    })
}

/// Unparenthesised keys are taken literally: `[cpus: 2]` has the key "cpus".
fn map_key(expr: Expr, token: &Token) -> MapKey {
    match expr {
        Expr::Ident(name, _) => MapKey::Name(name),
        Expr::Literal(Literal::Str(s), _) => MapKey::Name(s),
        Expr::Literal(_, _) => MapKey::Name(token.text.clone()),
        other => MapKey::Computed(other),
    }
}

/// `{ a, b -> body }` or `{ body }`.
pub(super) fn parse_closure(p: &mut Parser) -> Result<Arc<ClosureExpr>> {
    let open = p.bump();
    p.with_newlines_significant(|p| {
        p.skip_newlines();
        let params = parse_closure_params(p)?;
        let body = statement::parse_statement_list(p, &TokenKind::RBrace)?;
        let close = p.expect(TokenKind::RBrace, "'}' to close closure")?;
        Ok(Arc::new(ClosureExpr {
            params,
            body,
            source: p.text_between(open.span, &close),
            span: open.span,
        }))
    })
}

fn parse_closure_params(p: &mut Parser) -> Result<Vec<String>> {
    // `{ -> ... }` declares zero parameters
    if p.eat(&TokenKind::Arrow) {
        return Ok(Vec::new());
    }

    // lookahead for `[Type] name (, [Type] name)* ->`
    let mut n = 0;
    let mut names = Vec::new();
    loop {
        let TokenKind::Ident(first) = p.peek_nth(n) else {
            return Ok(Vec::new());
        };
        match p.peek_nth(n + 1) {
            TokenKind::Ident(second) => {
                names.push(second.clone());
                n += 2;
            }
            _ => {
                names.push(first.clone());
                n += 1;
            }
        }
        match p.peek_nth(n) {
            TokenKind::Comma => n += 1,
            TokenKind::Arrow => break,
            _ => return Ok(Vec::new()),
        }
    }

    for _ in 0..=n {
        p.bump();
    }
    Ok(names)
}
