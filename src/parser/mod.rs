use crate::ast::{ConfigUnit, Expr};
use crate::error::{ConfigError, Result, Span};
use crate::lexer::{self, Token, TokenKind};

mod command;
mod document;
mod expression;
mod primary;
mod statement;

pub(crate) use command::{CommandShape, command_shape};

/// Parse one configuration unit.
pub fn parse(source: &str) -> Result<ConfigUnit> {
    Parser::new(source)?.parse_unit()
}

/// Parse a standalone expression, e.g. a value passed on the command line.
pub fn parse_expression(source: &str) -> Result<Expr> {
    let mut parser = Parser::new(source)?;
    parser.skip_separators();
    let expr = parser.parse_expression()?;
    parser.skip_separators();
    parser.expect_eof()?;
    Ok(expr)
}

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
    /// Offset of `source` inside the enclosing unit.
    base_offset: usize,
    /// One entry per open delimiter; `true` where newlines are insignificant.
    newline_mode: Vec<bool>,
    /// Set when a statement ended without a separator because bare arguments were refused.
    pending_statement: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self> {
        Self::with_base(source, Span::new(0, 1, 1))
    }

    pub(crate) fn with_base(source: &'a str, base: Span) -> Result<Self> {
        let tokens = lexer::tokenize_at(source, base)?;
        Ok(Self {
            tokens,
            pos: 0,
            source,
            base_offset: base.offset,
            newline_mode: Vec::new(),
            pending_statement: false,
        })
    }

    pub fn parse_unit(&mut self) -> Result<ConfigUnit> {
        document::parse_unit(self)
    }

    pub fn parse_expression(&mut self) -> Result<Expr> {
        expression::parse_expression(self)
    }

    fn ignoring_newlines(&self) -> bool {
        self.newline_mode.last().copied().unwrap_or(false)
    }

    fn significant_index(&self, mut index: usize) -> usize {
        if self.ignoring_newlines() {
            while self.tokens[index].kind == TokenKind::Newline {
                index += 1;
            }
        }
        index
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.significant_index(self.pos)]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Kind of the `n`-th significant token ahead (0 is the current one).
    pub(crate) fn peek_nth(&self, n: usize) -> &TokenKind {
        let mut index = self.significant_index(self.pos);
        for _ in 0..n {
            if self.tokens[index].kind == TokenKind::Eof {
                break;
            }
            index = self.significant_index(index + 1);
        }
        &self.tokens[index].kind
    }

    pub(crate) fn bump(&mut self) -> Token {
        let index = self.significant_index(self.pos);
        let token = self.tokens[index].clone();
        if token.kind != TokenKind::Eof {
            self.pos = index + 1;
        } else {
            self.pos = index;
        }
        token
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, expected: TokenKind, what: &str) -> Result<Token> {
        if self.check(&expected) {
            return Ok(self.bump());
        }
        let found = self.peek().clone();
        Err(ConfigError::parse(
            format!("Expected {}, got {}", what, describe(&found)),
            found.span,
            Some("Check your syntax"),
            202,
        ))
    }

    pub(crate) fn expect_eof(&mut self) -> Result<()> {
        if self.check(&TokenKind::Eof) {
            return Ok(());
        }
        let found = self.peek().clone();
        Err(ConfigError::parse(
            format!("Unexpected {}", describe(&found)),
            found.span,
            Some("Expected end of input"),
            203,
        ))
    }

    pub(crate) fn span(&self) -> Span {
        self.peek().span
    }

    pub(crate) fn unexpected(&self, context: &str) -> ConfigError {
        let found = self.peek();
        ConfigError::parse(
            format!("Unexpected {} {}", describe(found), context),
            found.span,
            None,
            205,
        )
    }

    /// Consume newlines only, the `nls` of the grammar.
    pub(crate) fn skip_newlines(&mut self) {
        while self.tokens[self.pos].kind == TokenKind::Newline {
            self.pos += 1;
        }
    }

    /// Consume any run of newline and semicolon separators. Returns whether one was seen.
    pub(crate) fn skip_separators(&mut self) -> bool {
        let mut seen = false;
        while self.tokens[self.pos].kind.is_separator() {
            self.pos += 1;
            seen = true;
        }
        seen
    }

    /// True when the raw next token is a newline, ignoring the current newline mode.
    pub(crate) fn at_raw_newline(&self) -> bool {
        self.tokens[self.pos].kind == TokenKind::Newline
    }

    pub(crate) fn with_newlines_ignored<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.newline_mode.push(true);
        let out = f(self);
        self.newline_mode.pop();
        out
    }

    pub(crate) fn with_newlines_significant<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.newline_mode.push(false);
        let out = f(self);
        self.newline_mode.pop();
        out
    }

    /// Verbatim text between two spans of this source, `end` inclusive of its token.
    pub(crate) fn text_between(&self, start: Span, end: &Token) -> String {
        let from = start.offset.saturating_sub(self.base_offset);
        let to = (end.span.offset - self.base_offset + end.text.len()).min(self.source.len());
        self.source.get(from..to).unwrap_or_default().to_string()
    }
}

pub(crate) fn describe(token: &Token) -> String {
    match &token.kind {
        TokenKind::Eof => "end of input".into(),
        TokenKind::Newline => "newline".into(),
        TokenKind::Ident(name) => format!("identifier '{}'", name),
        TokenKind::Str(_) | TokenKind::GString(_) => "string literal".into(),
        TokenKind::Int(_) | TokenKind::Float(_) => format!("number '{}'", token.text),
        _ => format!("'{}'", token.text),
    }
}

#[cfg(test)]
mod tests;
