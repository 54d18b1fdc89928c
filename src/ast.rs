use std::sync::Arc;

use crate::error::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Shl,
    Shr,
    UShr,
    Range,
    RangeExclusive,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Eq,
    Ne,
    Compare,
    RegexFind,
    RegexMatch,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Range => "..",
            BinaryOp::RangeExclusive => "..<",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "in",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Compare => "<=>",
            BinaryOp::RegexFind => "=~",
            BinaryOp::RegexMatch => "==~",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDec {
    Inc,
    Dec,
}

/// `=` or one of the compound assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Compound(BinaryOp),
    /// `?=`: assign only when the target is currently null
    Elvis,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StringPart {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// One suffix in a path expression such as `a.b(1)[0] { }`.
#[derive(Debug, Clone, PartialEq)]
pub enum PathElement {
    Property { name: String, safe: bool, spread: bool, span: Span },
    Call { args: Vec<Argument>, span: Span },
    Index { index: Vec<Expr>, safe: bool, span: Span },
    /// A closure attached after a call or a property, as in `list.each { }`.
    Closure(Arc<ClosureExpr>),
}

impl PathElement {
    /// True for elements that already supply arguments to the path.
    pub fn is_arguments_or_closure(&self) -> bool {
        matches!(self, PathElement::Call { .. } | PathElement::Closure(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Positional(Expr),
    Named(String, Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosureExpr {
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    /// Verbatim source text including the braces.
    pub source: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal, Span),
    GString(Vec<StringPart>, Span),
    Ident(String, Span),
    Path {
        head: Box<Expr>,
        elements: Vec<PathElement>,
    },
    List(Vec<Expr>, Span),
    Map(Vec<(MapKey, Expr)>, Span),
    Closure(Arc<ClosureExpr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Prefix {
        op: IncDec,
        target: Box<Expr>,
        span: Span,
    },
    Postfix {
        op: IncDec,
        target: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    /// `(Type) expr` or `expr as Type`
    Cast {
        ty: String,
        expr: Box<Expr>,
        span: Span,
    },
    InstanceOf {
        expr: Box<Expr>,
        ty: String,
        span: Span,
    },
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
        span: Span,
    },
    Elvis {
        value: Box<Expr>,
        fallback: Box<Expr>,
        span: Span,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    /// `(a, b) = expr`
    MultiAssign {
        targets: Vec<String>,
        value: Box<Expr>,
        span: Span,
    },
    /// A call written without parentheses: `id 'nf-foo'`.
    Command {
        callee: Box<Expr>,
        args: Vec<Argument>,
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapKey {
    Name(String),
    /// `(expr): value` computes the key at evaluation time
    Computed(Expr),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(_, span)
            | Expr::GString(_, span)
            | Expr::Ident(_, span)
            | Expr::List(_, span)
            | Expr::Map(_, span) => *span,
            Expr::Path { head, .. } => head.span(),
            Expr::Closure(closure) => closure.span,
            Expr::Unary { span, .. }
            | Expr::Prefix { span, .. }
            | Expr::Postfix { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Cast { span, .. }
            | Expr::InstanceOf { span, .. }
            | Expr::Ternary { span, .. }
            | Expr::Elvis { span, .. }
            | Expr::Assign { span, .. }
            | Expr::MultiAssign { span, .. }
            | Expr::Command { span, .. } => *span,
        }
    }
}

/// Statements of closure bodies and `plugins` blocks.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    Def {
        name: String,
        value: Option<Expr>,
        span: Span,
    },
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Option<Vec<Stmt>>,
        span: Span,
    },
    Return(Option<Expr>, Span),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PluginDecl {
    /// Expression following `id`, evaluated to `name` or `name@version`.
    pub id: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorAssign {
    pub path: Vec<String>,
    pub value: Expr,
    pub span: Span,
}

/// Statements of the configuration grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigStmt {
    Include {
        path: Expr,
        span: Span,
    },
    Assign {
        path: Vec<String>,
        value: Expr,
        span: Span,
    },
    Block {
        name: Vec<String>,
        body: Vec<ConfigStmt>,
        span: Span,
    },
    Selector {
        kind: String,
        target: String,
        body: Vec<SelectorAssign>,
        span: Span,
    },
    Plugins {
        plugins: Vec<PluginDecl>,
        span: Span,
    },
}

/// One parsed configuration source: a top-level file or an included file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigUnit {
    pub statements: Vec<ConfigStmt>,
}

impl ConfigStmt {
    pub fn span(&self) -> Span {
        match self {
            ConfigStmt::Include { span, .. }
            | ConfigStmt::Assign { span, .. }
            | ConfigStmt::Block { span, .. }
            | ConfigStmt::Selector { span, .. }
            | ConfigStmt::Plugins { span, .. } => *span,
        }
    }
}
