// Author: Dustin Pilgrim
// License: MIT

use std::str::Chars;

use crate::error::{ConfigError, Result, Span};

mod scanner;
mod strings;
mod tokenizer;

/// One segment of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum StrPart {
    Text(String),
    /// Source of a `${...}` or `$name.path` placeholder, lexed again by the parser.
    Expr { source: String, span: Span },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // --- literals ---
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    GString(Vec<StrPart>),

    // --- keywords ---
    True,
    False,
    Null,
    As,
    In,
    Instanceof,
    Def,
    If,
    Else,
    Return,
    IncludeConfig,

    // --- structure ---
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Question,
    Arrow,

    // --- navigation ---
    Dot,
    SafeDot,
    SpreadDot,

    // --- arithmetic ---
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Power,
    Inc,
    Dec,
    Not,
    Tilde,
    Shl,
    Shr,
    UShr,
    Range,
    RangeExclusive,

    // --- comparison ---
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Spaceship,
    RegexFind,
    RegexMatch,

    // --- bitwise / logical ---
    Amp,
    Caret,
    Pipe,
    AndAnd,
    OrOr,
    Elvis,

    // --- assignment ---
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    PowerAssign,
    ShlAssign,
    ShrAssign,
    UShrAssign,
    AmpAssign,
    CaretAssign,
    PipeAssign,
    ElvisAssign,

    // --- layout ---
    Newline,
    Semi,
    Eof,
}

impl TokenKind {
    /// Tokens after which a `/` is a division operator rather than a slashy string.
    pub(crate) fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Ident(_)
                | TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Str(_)
                | TokenKind::GString(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::Inc
                | TokenKind::Dec
        )
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Semi)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Verbatim source text of the token.
    pub text: String,
    pub span: Span,
}

pub struct Lexer<'a> {
    source: &'a str,
    input: Chars<'a>,
    peek: Option<char>,
    offset: usize,
    line: usize,
    column: usize,
    /// Position added to every span, for sources lexed out of a string placeholder.
    base: Span,
    prev_ends_operand: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_base(source, Span::new(0, 1, 1))
    }

    /// Lexer whose spans are reported relative to `base`.
    pub fn with_base(source: &'a str, base: Span) -> Self {
        let mut lexer = Lexer {
            source,
            input: source.chars(),
            peek: None,
            offset: 0,
            line: 1,
            column: 1,
            base,
            prev_ends_operand: false,
        };
        lexer.peek = lexer.input.next();
        lexer
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub(crate) fn span(&self) -> Span {
        if self.line == 1 {
            Span::new(
                self.base.offset + self.offset,
                self.base.line,
                self.base.column + self.column - 1,
            )
        } else {
            Span::new(self.base.offset + self.offset, self.base.line + self.line - 1, self.column)
        }
    }

    pub(crate) fn slice(&self, from: usize) -> &'a str {
        &self.source[from..self.offset]
    }

    pub(crate) fn error(&self, message: impl Into<String>, span: Span, hint: Option<&str>, code: u32) -> ConfigError {
        ConfigError::Lex {
            message: message.into(),
            span,
            hint: hint.map(String::from),
            code: Some(code),
        }
    }

    pub fn next_token(&mut self) -> Result<Token> {
        let token = tokenizer::next_token(self)?;
        if !token.kind.is_separator() {
            self.prev_ends_operand = token.kind.ends_operand();
        } else {
            self.prev_ends_operand = false;
        }
        Ok(token)
    }
}

/// Lex a whole unit. The returned stream always ends with [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    tokenize_at(source, Span::new(0, 1, 1))
}

pub(crate) fn tokenize_at(source: &str, base: Span) -> Result<Vec<Token>> {
    let mut lexer = Lexer::with_base(source, base);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests;
