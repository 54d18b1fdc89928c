use std::path::PathBuf;

use thiserror::Error;

/// Position of a token or node inside one configuration unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self { offset, line, column }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref().map_or(String::new(), |h| format!(" Hint: {}", h))
}

fn code_suffix(code: &Option<u32>) -> String {
    code.map_or(String::new(), |c| format!(" Code: {}", c))
}

/// The error type for lexing, parsing and evaluating configuration sources.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Bad character, unterminated literal or comment, invalid escape.
    #[error("[CONFIG] Lex Error at {span}: {message}{}{}", hint_suffix(.hint), code_suffix(.code))]
    Lex {
        message: String,
        span: Span,
        hint: Option<String>,
        code: Option<u32>,
    },

    /// Unexpected token or grammar violation.
    #[error("[CONFIG] Parse Error at {span}: {message}{}{}", hint_suffix(.hint), code_suffix(.code))]
    Parse {
        message: String,
        span: Span,
        hint: Option<String>,
        code: Option<u32>,
    },

    /// Structurally valid syntax used where the configuration rules forbid it.
    #[error("[CONFIG] Config Error at {span}: {message}{}{}", hint_suffix(.hint), code_suffix(.code))]
    ConfigParse {
        message: String,
        span: Span,
        hint: Option<String>,
        code: Option<u32>,
    },

    #[error("[CONFIG] Include not found '{}'{}{}", .path.display(), hint_suffix(.hint), code_suffix(.code))]
    IncludeNotFound {
        path: PathBuf,
        hint: Option<String>,
        code: Option<u32>,
    },

    #[error("[CONFIG] Include read failure '{}': {message}{}{}", .path.display(), hint_suffix(.hint), code_suffix(.code))]
    IncludeRead {
        message: String,
        path: PathBuf,
        hint: Option<String>,
        code: Option<u32>,
    },

    #[error("[CONFIG] Include cycle: {}{}", .chain.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(" -> "), code_suffix(.code))]
    IncludeCycle {
        chain: Vec<PathBuf>,
        code: Option<u32>,
    },

    /// Raised in strict mode for an identifier that resolves to nothing.
    #[error("[CONFIG] Unknown config attribute `{name}` at {span}{}{}", hint_suffix(.hint), code_suffix(.code))]
    StrictProperty {
        name: String,
        span: Span,
        hint: Option<String>,
        code: Option<u32>,
    },

    /// Runtime failure while evaluating an expression.
    #[error("[CONFIG] Evaluation Error at {span}: {message}{}{}", hint_suffix(.hint), code_suffix(.code))]
    Eval {
        message: String,
        span: Span,
        hint: Option<String>,
        code: Option<u32>,
    },

    /// A typed lookup on a parsed tree failed.
    #[error("[CONFIG] Conversion Error for `{path}`: {message}{}{}", hint_suffix(.hint), code_suffix(.code))]
    Conversion {
        message: String,
        path: String,
        hint: Option<String>,
        code: Option<u32>,
    },
}

/// Discriminant of [`ConfigError`] for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Parse,
    ConfigParse,
    IncludeNotFound,
    IncludeRead,
    IncludeCycle,
    StrictProperty,
    Eval,
    Conversion,
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::Lex { .. } => ErrorKind::Lex,
            ConfigError::Parse { .. } => ErrorKind::Parse,
            ConfigError::ConfigParse { .. } => ErrorKind::ConfigParse,
            ConfigError::IncludeNotFound { .. } => ErrorKind::IncludeNotFound,
            ConfigError::IncludeRead { .. } => ErrorKind::IncludeRead,
            ConfigError::IncludeCycle { .. } => ErrorKind::IncludeCycle,
            ConfigError::StrictProperty { .. } => ErrorKind::StrictProperty,
            ConfigError::Eval { .. } => ErrorKind::Eval,
            ConfigError::Conversion { .. } => ErrorKind::Conversion,
        }
    }

    pub fn code(&self) -> Option<u32> {
        match self {
            ConfigError::Lex { code, .. }
            | ConfigError::Parse { code, .. }
            | ConfigError::ConfigParse { code, .. }
            | ConfigError::IncludeNotFound { code, .. }
            | ConfigError::IncludeRead { code, .. }
            | ConfigError::IncludeCycle { code, .. }
            | ConfigError::StrictProperty { code, .. }
            | ConfigError::Eval { code, .. }
            | ConfigError::Conversion { code, .. } => *code,
        }
    }

    /// Source position, for the variants that point into a unit.
    pub fn span(&self) -> Option<Span> {
        match self {
            ConfigError::Lex { span, .. }
            | ConfigError::Parse { span, .. }
            | ConfigError::ConfigParse { span, .. }
            | ConfigError::StrictProperty { span, .. }
            | ConfigError::Eval { span, .. } => Some(*span),
            _ => None,
        }
    }

    pub(crate) fn eval(message: impl Into<String>, span: Span, code: u32) -> Self {
        ConfigError::Eval {
            message: message.into(),
            span,
            hint: None,
            code: Some(code),
        }
    }

    pub(crate) fn parse(message: impl Into<String>, span: Span, hint: Option<&str>, code: u32) -> Self {
        ConfigError::Parse {
            message: message.into(),
            span,
            hint: hint.map(String::from),
            code: Some(code),
        }
    }

    pub(crate) fn config(message: impl Into<String>, span: Span, hint: Option<&str>, code: u32) -> Self {
        ConfigError::ConfigParse {
            message: message.into(),
            span,
            hint: hint.map(String::from),
            code: Some(code),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
