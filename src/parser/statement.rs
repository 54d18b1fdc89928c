use super::*;
use super::command::parse_command_expression;
use super::expression::parse_name_tuple_rest;
use crate::ast::Stmt;

/// Statements up to (not including) `terminator`, separated by newlines or `;`.
pub(super) fn parse_statement_list(p: &mut Parser, terminator: &TokenKind) -> Result<Vec<Stmt>> {
    let mut statements = Vec::new();
    p.skip_separators();

    while !p.check(terminator) && !p.check(&TokenKind::Eof) {
        statements.push(parse_statement(p)?);

        if p.check(terminator) {
            break;
        }
        let separated = p.skip_separators();
        let pending = std::mem::take(&mut p.pending_statement);
        if !separated && !pending {
            return Err(p.unexpected("after statement, expected newline or ';'"));
        }
    }
    Ok(statements)
}

pub(super) fn parse_statement(p: &mut Parser) -> Result<Stmt> {
    p.pending_statement = false;
    match p.peek_kind() {
        TokenKind::Def => parse_def(p),
        TokenKind::If => parse_if(p),
        TokenKind::Return => {
            let span = p.bump().span;
            if p.at_raw_newline() || matches!(p.peek_kind(), TokenKind::Semi | TokenKind::RBrace | TokenKind::Eof) {
                return Ok(Stmt::Return(None, span));
            }
            Ok(Stmt::Return(Some(p.parse_expression()?), span))
        }
        _ => Ok(Stmt::Expr(parse_command_expression(p)?)),
    }
}

fn parse_def(p: &mut Parser) -> Result<Stmt> {
    let span = p.bump().span;

    if p.eat(&TokenKind::LParen) {
        let targets = parse_name_tuple_rest(p)?;
        p.expect(TokenKind::Assign, "'=' after multiple assignment targets")?;
        p.skip_newlines();
        let value = p.parse_expression()?;
        return Ok(Stmt::Expr(Expr::MultiAssign {
            targets,
            value: Box::new(value),
            span,
        }));
    }

    // optional declared type: `def String name`
    if matches!(p.peek_kind(), TokenKind::Ident(_)) && matches!(p.peek_nth(1), TokenKind::Ident(_)) {
        p.bump();
    }

    let name = match p.bump() {
        Token { kind: TokenKind::Ident(name), .. } => name,
        other => {
            return Err(ConfigError::parse(
                format!("Expected variable name after 'def', got {}", describe(&other)),
                other.span,
                None,
                211,
            ));
        }
    };

    let value = if p.eat(&TokenKind::Assign) {
        p.skip_newlines();
        Some(p.parse_expression()?)
    } else {
        None
    };
    Ok(Stmt::Def { name, value, span })
}

fn parse_if(p: &mut Parser) -> Result<Stmt> {
    let span = p.bump().span;
    p.expect(TokenKind::LParen, "'(' after 'if'")?;
    let cond = p.with_newlines_ignored(|p| {
        let cond = p.parse_expression()?;
        p.expect(TokenKind::RParen, "')' after condition")?;
        Ok(cond)
    })?;
    p.skip_newlines();
    let then = parse_block_or_statement(p)?;

    let otherwise = if p.continues_with(&[TokenKind::Else]) {
        p.bump();
        p.skip_newlines();
        if p.check(&TokenKind::If) {
            Some(vec![parse_if(p)?])
        } else {
            Some(parse_block_or_statement(p)?)
        }
    } else {
        None
    };

    Ok(Stmt::If { cond, then, otherwise, span })
}

fn parse_block_or_statement(p: &mut Parser) -> Result<Vec<Stmt>> {
    if !p.check(&TokenKind::LBrace) {
        return Ok(vec![parse_statement(p)?]);
    }
    p.bump();
    p.with_newlines_significant(|p| {
        let body = parse_statement_list(p, &TokenKind::RBrace)?;
        p.expect(TokenKind::RBrace, "'}'")?;
        Ok(body)
    })
}
