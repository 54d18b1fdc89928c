use super::*;
use crate::ast::PathElement;

/// What the parser may do with bare arguments following an expression statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandShape {
    /// A name or property path: `foo 'x'` becomes the call `foo('x')`.
    AcceptsArguments,
    /// The path already ends in `(...)` or `{ ... }`; what follows is a new statement.
    FollowsArgumentsOrClosure,
    /// Any other expression never takes bare arguments.
    NotCallable,
}

/// Classify `expr` at the point where bare command arguments could start.
///
/// Only the trailing element of a path decides; a path with no elements cannot be
/// produced by this parser, so meeting one is reported as an invariant violation.
pub(crate) fn command_shape(expr: &Expr) -> Result<CommandShape> {
    match expr {
        Expr::Ident(..) => Ok(CommandShape::AcceptsArguments),
        Expr::Path { head, elements } => match elements.last() {
            Some(last) if last.is_arguments_or_closure() => Ok(CommandShape::FollowsArgumentsOrClosure),
            Some(PathElement::Property { .. }) | Some(PathElement::Index { .. }) => Ok(CommandShape::AcceptsArguments),
            _ => Err(ConfigError::parse(
                "Unexpected expression shape: path expression without elements",
                head.span(),
                Some("This is a parser bug; please report the input that triggered it"),
                299,
            )),
        },
        _ => Ok(CommandShape::NotCallable),
    }
}

/// Tokens that can open a bare command argument on the same line.
fn starts_command_argument(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident(_)
            | TokenKind::Int(_)
            | TokenKind::Float(_)
            | TokenKind::Str(_)
            | TokenKind::GString(_)
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
    )
}

/// Expression statement, possibly a parenthesis-free call such as `id 'nf-foo'`.
pub(super) fn parse_command_expression(p: &mut Parser) -> Result<Expr> {
    let expr = p.parse_expression()?;

    if p.at_raw_newline() || !starts_command_argument(p.peek_kind()) {
        return Ok(expr);
    }

    match command_shape(&expr)? {
        CommandShape::AcceptsArguments => {}
        CommandShape::FollowsArgumentsOrClosure => {
            p.pending_statement = true;
            return Ok(expr);
        }
        CommandShape::NotCallable => return Ok(expr),
    }

    let span = expr.span();
    let mut args = vec![primary::parse_argument(p)?];
    while p.eat(&TokenKind::Comma) {
        p.skip_newlines();
        args.push(primary::parse_argument(p)?);
    }
    Ok(Expr::Command { callee: Box::new(expr), args, span })
}
