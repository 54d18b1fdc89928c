//! Operator precedence ladder, lowest binding first:
//!
//! assignment → multiple assignment → ternary/elvis → `||` → `&&` → `|` → `^` → `&`
//! → `=~ ==~` → `== != <=>` → `< <= > >= in as instanceof` → `<< >> >>> .. ..<`
//! → `+ -` → `* / %` → unary `+ -` → prefix `++ --` → `**` → `! ~`
//! → postfix `++ --` → path → cast.

use super::*;
use crate::ast::{AssignOp, BinaryOp, IncDec, Literal, PathElement, UnaryOp};

pub(super) fn parse_expression(p: &mut Parser) -> Result<Expr> {
    parse_assignment(p)
}

fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Assign => AssignOp::Assign,
        TokenKind::ElvisAssign => AssignOp::Elvis,
        TokenKind::PlusAssign => AssignOp::Compound(BinaryOp::Add),
        TokenKind::MinusAssign => AssignOp::Compound(BinaryOp::Sub),
        TokenKind::StarAssign => AssignOp::Compound(BinaryOp::Mul),
        TokenKind::SlashAssign => AssignOp::Compound(BinaryOp::Div),
        TokenKind::PercentAssign => AssignOp::Compound(BinaryOp::Rem),
        TokenKind::PowerAssign => AssignOp::Compound(BinaryOp::Pow),
        TokenKind::ShlAssign => AssignOp::Compound(BinaryOp::Shl),
        TokenKind::ShrAssign => AssignOp::Compound(BinaryOp::Shr),
        TokenKind::UShrAssign => AssignOp::Compound(BinaryOp::UShr),
        TokenKind::AmpAssign => AssignOp::Compound(BinaryOp::BitAnd),
        TokenKind::CaretAssign => AssignOp::Compound(BinaryOp::BitXor),
        TokenKind::PipeAssign => AssignOp::Compound(BinaryOp::BitOr),
        _ => return None,
    };
    Some(op)
}

fn is_assignable(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(..) => true,
        Expr::Path { elements, .. } => matches!(
            elements.last(),
            Some(PathElement::Property { spread: false, .. }) | Some(PathElement::Index { .. })
        ),
        _ => false,
    }
}

fn parse_assignment(p: &mut Parser) -> Result<Expr> {
    if let Some(expr) = parse_multiple_assignment(p)? {
        return Ok(expr);
    }

    let target = parse_ternary(p)?;
    let Some(op) = assign_op(p.peek_kind()) else {
        return Ok(target);
    };

    let token = p.bump();
    if !is_assignable(&target) {
        return Err(ConfigError::parse(
            "Invalid assignment target",
            token.span,
            Some("Only variables, properties and index expressions can be assigned"),
            206,
        ));
    }
    p.skip_newlines();
    let value = parse_assignment(p)?;
    Ok(Expr::Assign {
        op,
        target: Box::new(target),
        value: Box::new(value),
        span: token.span,
    })
}

/// `(a, b) = expr`, recognised by lookahead so grouping parentheses are unaffected.
fn parse_multiple_assignment(p: &mut Parser) -> Result<Option<Expr>> {
    if !p.check(&TokenKind::LParen) {
        return Ok(None);
    }
    let mut n = 1;
    let mut names = 0;
    loop {
        if !matches!(p.peek_nth(n), TokenKind::Ident(_)) {
            return Ok(None);
        }
        names += 1;
        match p.peek_nth(n + 1) {
            TokenKind::Comma => n += 2,
            TokenKind::RParen if names > 1 && p.peek_nth(n + 2) == &TokenKind::Assign => break,
            _ => return Ok(None),
        }
    }

    let span = p.bump().span;
    let targets = parse_name_tuple_rest(p)?;
    p.expect(TokenKind::Assign, "'='")?;
    p.skip_newlines();
    let value = parse_assignment(p)?;
    Ok(Some(Expr::MultiAssign {
        targets,
        value: Box::new(value),
        span,
    }))
}

/// Names after an already consumed `(`, through the closing `)`.
pub(super) fn parse_name_tuple_rest(p: &mut Parser) -> Result<Vec<String>> {
    p.with_newlines_ignored(|p| {
        let mut names = Vec::new();
        loop {
            match p.bump() {
                Token { kind: TokenKind::Ident(name), .. } => names.push(name),
                other => {
                    return Err(ConfigError::parse(
                        format!("Expected variable name, got {}", describe(&other)),
                        other.span,
                        None,
                        207,
                    ));
                }
            }
            if !p.eat(&TokenKind::Comma) {
                break;
            }
        }
        p.expect(TokenKind::RParen, "')'")?;
        Ok(names)
    })
}

fn parse_ternary(p: &mut Parser) -> Result<Expr> {
    let cond = parse_logical_or(p)?;

    if p.continues_with(&[TokenKind::Question]) {
        let span = p.bump().span;
        p.skip_newlines();
        let then = parse_ternary(p)?;
        p.continues_with(&[TokenKind::Colon]);
        p.expect(TokenKind::Colon, "':' in ternary expression")?;
        p.skip_newlines();
        let otherwise = parse_ternary(p)?;
        return Ok(Expr::Ternary {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
            span,
        });
    }

    if p.continues_with(&[TokenKind::Elvis]) {
        let span = p.bump().span;
        p.skip_newlines();
        let fallback = parse_ternary(p)?;
        return Ok(Expr::Elvis {
            value: Box::new(cond),
            fallback: Box::new(fallback),
            span,
        });
    }

    Ok(cond)
}

fn parse_binary_level(
    p: &mut Parser,
    next: fn(&mut Parser) -> Result<Expr>,
    ops: &[(TokenKind, BinaryOp)],
) -> Result<Expr> {
    let mut left = next(p)?;
    loop {
        let Some(op) = ops.iter().find(|(kind, _)| p.check(kind)).map(|(_, op)| *op) else {
            break;
        };
        let span = p.bump().span;
        p.skip_newlines();
        let right = next(p)?;
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        };
    }
    Ok(left)
}

fn parse_logical_or(p: &mut Parser) -> Result<Expr> {
    parse_binary_level(p, parse_logical_and, &[(TokenKind::OrOr, BinaryOp::Or)])
}

fn parse_logical_and(p: &mut Parser) -> Result<Expr> {
    parse_binary_level(p, parse_bit_or, &[(TokenKind::AndAnd, BinaryOp::And)])
}

fn parse_bit_or(p: &mut Parser) -> Result<Expr> {
    parse_binary_level(p, parse_bit_xor, &[(TokenKind::Pipe, BinaryOp::BitOr)])
}

fn parse_bit_xor(p: &mut Parser) -> Result<Expr> {
    parse_binary_level(p, parse_bit_and, &[(TokenKind::Caret, BinaryOp::BitXor)])
}

fn parse_bit_and(p: &mut Parser) -> Result<Expr> {
    parse_binary_level(p, parse_regex, &[(TokenKind::Amp, BinaryOp::BitAnd)])
}

fn parse_regex(p: &mut Parser) -> Result<Expr> {
    parse_binary_level(
        p,
        parse_equality,
        &[
            (TokenKind::RegexFind, BinaryOp::RegexFind),
            (TokenKind::RegexMatch, BinaryOp::RegexMatch),
        ],
    )
}

fn parse_equality(p: &mut Parser) -> Result<Expr> {
    parse_binary_level(
        p,
        parse_relational,
        &[
            (TokenKind::Eq, BinaryOp::Eq),
            (TokenKind::Ne, BinaryOp::Ne),
            (TokenKind::Spaceship, BinaryOp::Compare),
        ],
    )
}

fn parse_relational(p: &mut Parser) -> Result<Expr> {
    let mut left = parse_shift(p)?;
    loop {
        let op = match p.peek_kind() {
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Ge => BinaryOp::Ge,
            TokenKind::In => BinaryOp::In,
            TokenKind::As => {
                let span = p.bump().span;
                let ty = parse_type_name(p)?;
                left = Expr::Cast { ty, expr: Box::new(left), span };
                continue;
            }
            TokenKind::Instanceof => {
                let span = p.bump().span;
                let ty = parse_type_name(p)?;
                left = Expr::InstanceOf { expr: Box::new(left), ty, span };
                continue;
            }
            _ => break,
        };
        let span = p.bump().span;
        p.skip_newlines();
        let right = parse_shift(p)?;
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        };
    }
    Ok(left)
}

/// A possibly qualified class name, e.g. `Integer` or `java.lang.String`, with optional `[]`.
pub(super) fn parse_type_name(p: &mut Parser) -> Result<String> {
    let mut name = match p.bump() {
        Token { kind: TokenKind::Ident(name), .. } => name,
        other => {
            return Err(ConfigError::parse(
                format!("Expected type name, got {}", describe(&other)),
                other.span,
                None,
                208,
            ));
        }
    };
    while p.check(&TokenKind::Dot) && matches!(p.peek_nth(1), TokenKind::Ident(_)) {
        p.bump();
        if let TokenKind::Ident(part) = p.bump().kind {
            name.push('.');
            name.push_str(&part);
        }
    }
    while p.check(&TokenKind::LBracket) && p.peek_nth(1) == &TokenKind::RBracket {
        p.bump();
        p.bump();
        name.push_str("[]");
    }
    Ok(name)
}

fn parse_shift(p: &mut Parser) -> Result<Expr> {
    parse_binary_level(
        p,
        parse_additive,
        &[
            (TokenKind::Shl, BinaryOp::Shl),
            (TokenKind::Shr, BinaryOp::Shr),
            (TokenKind::UShr, BinaryOp::UShr),
            (TokenKind::Range, BinaryOp::Range),
            (TokenKind::RangeExclusive, BinaryOp::RangeExclusive),
        ],
    )
}

fn parse_additive(p: &mut Parser) -> Result<Expr> {
    parse_binary_level(
        p,
        parse_multiplicative,
        &[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)],
    )
}

fn parse_multiplicative(p: &mut Parser) -> Result<Expr> {
    parse_binary_level(
        p,
        parse_unary_add,
        &[
            (TokenKind::Star, BinaryOp::Mul),
            (TokenKind::Slash, BinaryOp::Div),
            (TokenKind::Percent, BinaryOp::Rem),
        ],
    )
}

pub(super) fn parse_unary_add(p: &mut Parser) -> Result<Expr> {
    let op = match p.peek_kind() {
        TokenKind::Minus => UnaryOp::Neg,
        TokenKind::Plus => UnaryOp::Plus,
        _ => return parse_prefix(p),
    };
    let span = p.bump().span;
    let operand = parse_unary_add(p)?;

    // fold `-1` into a literal so that negative numbers render back unchanged
    if op == UnaryOp::Neg {
        match &operand {
            Expr::Literal(Literal::Int(n), _) => {
                return Ok(Expr::Literal(Literal::Int(n.wrapping_neg()), span));
            }
            Expr::Literal(Literal::Float(f), _) => {
                return Ok(Expr::Literal(Literal::Float(-f), span));
            }
            _ => {}
        }
    }
    Ok(Expr::Unary { op, operand: Box::new(operand), span })
}

fn parse_prefix(p: &mut Parser) -> Result<Expr> {
    let op = match p.peek_kind() {
        TokenKind::Inc => IncDec::Inc,
        TokenKind::Dec => IncDec::Dec,
        _ => return parse_power(p),
    };
    let span = p.bump().span;
    let target = parse_prefix(p)?;
    Ok(Expr::Prefix { op, target: Box::new(target), span })
}

/// Left associative, as `2 ** 3 ** 2` is `(2 ** 3) ** 2`.
fn parse_power(p: &mut Parser) -> Result<Expr> {
    let mut left = parse_unary_not(p)?;
    while p.check(&TokenKind::Power) {
        let span = p.bump().span;
        p.skip_newlines();
        let right = parse_operand_with_sign(p)?;
        left = Expr::Binary {
            op: BinaryOp::Pow,
            left: Box::new(left),
            right: Box::new(right),
            span,
        };
    }
    Ok(left)
}

fn parse_operand_with_sign(p: &mut Parser) -> Result<Expr> {
    match p.peek_kind() {
        TokenKind::Minus | TokenKind::Plus | TokenKind::Inc | TokenKind::Dec => parse_unary_add(p),
        _ => parse_unary_not(p),
    }
}

pub(super) fn parse_unary_not(p: &mut Parser) -> Result<Expr> {
    let op = match p.peek_kind() {
        TokenKind::Not => UnaryOp::Not,
        TokenKind::Tilde => UnaryOp::BitNot,
        _ => return parse_postfix(p),
    };
    let span = p.bump().span;
    p.skip_newlines();
    let operand = parse_operand_with_sign(p)?;
    Ok(Expr::Unary { op, operand: Box::new(operand), span })
}

fn parse_postfix(p: &mut Parser) -> Result<Expr> {
    let expr = primary::parse_cast_or_path(p)?;
    // a newline ends the statement before a trailing `++`
    if p.at_raw_newline() && !p.ignoring_newlines() {
        return Ok(expr);
    }
    let op = match p.peek_kind() {
        TokenKind::Inc => IncDec::Inc,
        TokenKind::Dec => IncDec::Dec,
        _ => return Ok(expr),
    };
    let span = p.bump().span;
    Ok(Expr::Postfix { op, target: Box::new(expr), span })
}

impl Parser<'_> {
    /// When the next significant token (looking across newlines) is one of `kinds`,
    /// consume the newlines in front of it and return true.
    pub(crate) fn continues_with(&mut self, kinds: &[TokenKind]) -> bool {
        let mut index = self.pos;
        while self.tokens[index].kind == TokenKind::Newline {
            index += 1;
        }
        if kinds.contains(&self.tokens[index].kind) {
            self.pos = index;
            true
        } else {
            false
        }
    }
}
