use super::*;
use super::primary::property_name;
use crate::ast::{Argument, ConfigStmt, PathElement, PluginDecl, SelectorAssign, Stmt};

pub(super) fn parse_unit(p: &mut Parser) -> Result<ConfigUnit> {
    let statements = parse_config_body(p, 0, &TokenKind::Eof)?;
    p.expect_eof()?;
    Ok(ConfigUnit { statements })
}

/// Statements of the top level (depth 0) or of a block body.
fn parse_config_body(p: &mut Parser, depth: usize, terminator: &TokenKind) -> Result<Vec<ConfigStmt>> {
    let mut statements = Vec::new();
    p.skip_separators();

    while !p.check(terminator) && !p.check(&TokenKind::Eof) {
        statements.push(parse_config_statement(p, depth)?);

        if p.check(terminator) {
            break;
        }
        if !p.skip_separators() {
            return Err(p.unexpected("after configuration statement, expected newline or ';'"));
        }
    }
    Ok(statements)
}

fn parse_config_statement(p: &mut Parser, depth: usize) -> Result<ConfigStmt> {
    if p.check(&TokenKind::IncludeConfig) {
        let span = p.bump().span;
        let path = p.parse_expression()?;
        return Ok(ConfigStmt::Include { path, span });
    }

    let span = p.span();
    let path = parse_config_path(p)?;

    match p.peek_kind() {
        TokenKind::Assign => {
            p.bump();
            p.skip_newlines();
            let value = p.parse_expression()?;
            Ok(ConfigStmt::Assign { path, value, span })
        }
        TokenKind::LBrace if path.last().is_some_and(|name| name == "plugins") => {
            if depth > 0 || path.len() > 1 {
                return Err(ConfigError::config(
                    "The `plugins` block is only allowed at the top level",
                    span,
                    Some("Move the plugins declaration out of the enclosing block"),
                    250,
                ));
            }
            parse_plugins_block(p, span)
        }
        TokenKind::LBrace => {
            p.bump();
            let body = p.with_newlines_significant(|p| {
                let body = parse_config_body(p, depth + path.len(), &TokenKind::RBrace)?;
                p.expect(TokenKind::RBrace, "'}' to close block")?;
                Ok(body)
            })?;
            Ok(ConfigStmt::Block { name: path, body, span })
        }
        TokenKind::Colon => parse_selector(p, path, span),
        _ => Err(p.unexpected(&format!("after '{}', expected '=' or '{{'", path.join(".")))),
    }
}

/// `name`, `"quoted name"` or `a.b.c`.
fn parse_config_path(p: &mut Parser) -> Result<Vec<String>> {
    let mut path = vec![parse_config_name(p)?];
    while p.check(&TokenKind::Dot) {
        p.bump();
        path.push(parse_config_name(p)?);
    }
    Ok(path)
}

fn parse_config_name(p: &mut Parser) -> Result<String> {
    let token = p.peek().clone();
    match property_name(&token) {
        Some(name) => {
            p.bump();
            Ok(name)
        }
        None => Err(ConfigError::parse(
            format!("Expected configuration name, got {}", describe(&token)),
            token.span,
            Some("Statements are `name = value`, `name { ... }`, `selector: target { ... }` or `includeConfig path`"),
            212,
        )),
    }
}

/// `kind: target { assignments }`, optionally prefixed by a scope path as in
/// `process.withLabel: big { ... }`.
fn parse_selector(p: &mut Parser, mut path: Vec<String>, span: Span) -> Result<ConfigStmt> {
    p.bump(); // consume ':'
    let kind = path.pop().unwrap_or_default();

    let target_token = p.bump();
    let target = match target_token.kind {
        TokenKind::Ident(name) | TokenKind::Str(name) => name,
        _ => {
            return Err(ConfigError::parse(
                format!("Expected selector target after '{}:', got {}", kind, describe(&target_token)),
                target_token.span,
                Some("Quote targets that contain special characters, e.g. withName: 'FOO|BAR'"),
                213,
            ));
        }
    };

    p.expect(TokenKind::LBrace, "'{' after selector target")?;
    let body = p.with_newlines_significant(|p| {
        let body = parse_selector_body(p)?;
        p.expect(TokenKind::RBrace, "'}' to close selector")?;
        Ok(body)
    })?;

    let selector = ConfigStmt::Selector { kind, target, body, span };
    if path.is_empty() {
        Ok(selector)
    } else {
        Ok(ConfigStmt::Block { name: path, body: vec![selector], span })
    }
}

fn parse_selector_body(p: &mut Parser) -> Result<Vec<SelectorAssign>> {
    let mut assignments = Vec::new();
    p.skip_separators();

    while !p.check(&TokenKind::RBrace) && !p.check(&TokenKind::Eof) {
        let span = p.span();
        if p.check(&TokenKind::IncludeConfig) {
            return Err(ConfigError::config(
                "`includeConfig` is not allowed inside a selector",
                span,
                None,
                253,
            ));
        }

        let path = parse_config_path(p)?;
        match p.peek_kind() {
            TokenKind::Assign => {
                p.bump();
                p.skip_newlines();
                let value = p.parse_expression()?;
                assignments.push(SelectorAssign { path, value, span });
            }
            TokenKind::LBrace => {
                return Err(ConfigError::config(
                    format!("Block `{}` is not allowed inside a selector", path.join(".")),
                    span,
                    Some("A selector body may contain only plain assignments"),
                    251,
                ));
            }
            TokenKind::Colon => {
                return Err(ConfigError::config(
                    "Selectors cannot be nested",
                    span,
                    Some("A selector body may contain only plain assignments"),
                    252,
                ));
            }
            _ => return Err(p.unexpected(&format!("after '{}', expected '='", path.join(".")))),
        }

        if p.check(&TokenKind::RBrace) {
            break;
        }
        if !p.skip_separators() {
            return Err(p.unexpected("after assignment, expected newline or ';'"));
        }
    }
    Ok(assignments)
}

fn parse_plugins_block(p: &mut Parser, span: Span) -> Result<ConfigStmt> {
    p.bump(); // consume '{'
    let statements = p.with_newlines_significant(|p| {
        let statements = statement::parse_statement_list(p, &TokenKind::RBrace)?;
        p.expect(TokenKind::RBrace, "'}' to close plugins block")?;
        Ok(statements)
    })?;

    let plugins = statements
        .into_iter()
        .map(plugin_declaration)
        .collect::<Result<Vec<_>>>()?;
    Ok(ConfigStmt::Plugins { plugins, span })
}

/// Accepts `id 'name@version'` and `id('name@version')`.
fn plugin_declaration(statement: Stmt) -> Result<PluginDecl> {
    let span = statement_span(&statement);
    let args = match statement {
        Stmt::Expr(Expr::Command { callee, args, .. }) if is_id(&callee) => Some(args),
        Stmt::Expr(Expr::Path { head, mut elements }) if is_id(&head) && elements.len() == 1 => {
            match elements.pop() {
                Some(PathElement::Call { args, .. }) => Some(args),
                _ => None,
            }
        }
        _ => None,
    };

    match args.as_deref() {
        Some([Argument::Positional(id)]) => Ok(PluginDecl { id: id.clone(), span }),
        _ => Err(ConfigError::config(
            "Invalid plugin declaration",
            span,
            Some("Declare plugins as `id 'plugin-name'` or `id 'plugin-name@version'`"),
            254,
        )),
    }
}

fn is_id(expr: &Expr) -> bool {
    matches!(expr, Expr::Ident(name, _) if name == "id")
}

fn statement_span(statement: &Stmt) -> Span {
    match statement {
        Stmt::Expr(expr) => expr.span(),
        Stmt::Def { span, .. } | Stmt::If { span, .. } | Stmt::Return(_, span) => *span,
    }
}
