use std::fmt;
use std::sync::Arc;

use crate::ast::ClosureExpr;
use crate::error::Result;
use crate::eval;
use crate::value::{ConfigTree, Value};

/// A closure literal kept as a value: its syntax tree, verbatim source and the
/// bindings that were visible when it was defined.
///
/// Cloning is cheap and a closure can be bound and called any number of times.
#[derive(Clone)]
pub struct ClosureValue {
    expr: Arc<ClosureExpr>,
    captured: Arc<ConfigTree>,
}

impl ClosureValue {
    pub(crate) fn new(expr: Arc<ClosureExpr>, captured: ConfigTree) -> Self {
        Self {
            expr,
            captured: Arc::new(captured),
        }
    }

    /// Verbatim source text, braces included.
    pub fn source(&self) -> &str {
        &self.expr.source
    }

    pub fn params(&self) -> &[String] {
        &self.expr.params
    }

    /// Snapshot of the definition-time bindings the body refers to.
    pub fn captured(&self) -> &ConfigTree {
        &self.captured
    }

    pub(crate) fn expr(&self) -> &ClosureExpr {
        &self.expr
    }

    pub fn render_as_text(&self) -> String {
        self.expr.source.clone()
    }

    /// Attach a delegate context, producing something that can be called.
    pub fn bind(&self, context: ClosureContext) -> BoundClosure {
        BoundClosure {
            closure: self.clone(),
            context,
        }
    }
}

/// Closures compare by source text.
impl PartialEq for ClosureValue {
    fn eq(&self, other: &Self) -> bool {
        self.expr.source == other.expr.source
    }
}

impl fmt::Debug for ClosureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureValue")
            .field("source", &self.expr.source)
            .field("captured", &self.captured.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Caller-supplied environment for one invocation, e.g. the `task` properties of
/// a single process instance.
#[derive(Debug, Clone, Default)]
pub struct ClosureContext {
    /// Names resolved after locals and captured bindings.
    pub delegate: ConfigTree,
    pub strict: bool,
}

impl ClosureContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delegate(mut self, delegate: ConfigTree) -> Self {
        self.delegate = delegate;
        self
    }

    /// Insert a single delegate property.
    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.delegate.insert(name.into(), value);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// A closure paired with its delegate, ready to be invoked.
#[derive(Debug, Clone)]
pub struct BoundClosure {
    closure: ClosureValue,
    context: ClosureContext,
}

impl BoundClosure {
    pub fn call(&self, args: Vec<Value>) -> Result<Value> {
        eval::call_closure(&self.closure, &self.context, args)
    }

    pub fn closure(&self) -> &ClosureValue {
        &self.closure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigParser, ParseOptions};
    use crate::error::ErrorKind;

    fn closure_at(source: &str, key: &str) -> ClosureValue {
        let parsed = ConfigParser::new(ParseOptions::default()).parse_str(source).unwrap();
        match parsed.tree.get(key) {
            Some(Value::Closure(closure)) => closure.clone(),
            other => panic!("expected closure under {}, got {:?}", key, other),
        }
    }

    #[test]
    fn test_source_is_verbatim() {
        let closure = closure_at("memory = { 2 * task.attempt }", "memory");
        assert_eq!(closure.source(), "{ 2 * task.attempt }");
        assert_eq!(closure.render_as_text(), "{ 2 * task.attempt }");
    }

    #[test]
    fn test_rebinding_delegate_between_calls() {
        let closure = closure_at("memory = { 2 * task.attempt }", "memory");
        for attempt in 1..=3 {
            let mut task = ConfigTree::new();
            task.insert("attempt".into(), Value::Int(attempt));
            let bound = closure.bind(ClosureContext::new().with_property("task", Value::Map(task)));
            assert_eq!(bound.call(vec![]).unwrap(), Value::Int(2 * attempt));
        }
    }

    #[test]
    fn test_captures_definition_time_bindings() {
        let closure = closure_at("base = 10\nf = { x -> x + base }\nbase = 99", "f");
        assert_eq!(closure.captured().get("base"), Some(&Value::Int(10)));
        let bound = closure.bind(ClosureContext::new());
        assert_eq!(bound.call(vec![Value::Int(1)]).unwrap(), Value::Int(11));
    }

    #[test]
    fn test_implicit_it_parameter() {
        let closure = closure_at("f = { it * 3 }", "f");
        let bound = closure.bind(ClosureContext::new());
        assert_eq!(bound.call(vec![Value::Int(4)]).unwrap(), Value::Int(12));
        assert_eq!(bound.call(vec![]).unwrap_err().kind(), ErrorKind::Eval);
    }

    #[test]
    fn test_strict_delegate_lookup() {
        let closure = closure_at("f = { missing }", "f");
        assert_eq!(closure.bind(ClosureContext::new()).call(vec![]).unwrap(), Value::Null);
        let err = closure.bind(ClosureContext::new().strict(true)).call(vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StrictProperty);
    }

    #[test]
    fn test_equality_by_source() {
        let a = closure_at("f = { it }", "f");
        let b = closure_at("x = 1\nf = { it }", "f");
        assert_eq!(a, b);
    }
}
