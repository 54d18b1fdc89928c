use std::sync::Arc;

use indexmap::IndexSet;

use super::{methods, ops};
use crate::ast::{
    Argument, AssignOp, BinaryOp, ClosureExpr, Expr, IncDec, Literal, MapKey, PathElement, Stmt, StringPart,
};
use crate::closure::{ClosureContext, ClosureValue};
use crate::error::{ConfigError, Result, Span};
use crate::value::{ConfigTree, Value};

/// Names visible to an expression beyond closure-local variables.
pub(crate) trait Scope {
    fn resolve(&self, name: &str) -> Option<Value>;
    fn strict(&self) -> bool;
}

/// Result of running a statement: `return` unwinds to the closure boundary.
pub(crate) enum Flow {
    Normal(Value),
    Return(Value),
}

/// One step of an assignment target such as `m.a[0]`.
enum Step {
    Key(String),
    Index(Value),
}

/// Expression interpreter. `locals` is empty for configuration values and holds
/// one frame per active closure body otherwise.
pub(crate) struct Interp<'s> {
    scope: &'s dyn Scope,
    locals: Vec<ConfigTree>,
}

impl<'s> Interp<'s> {
    pub(crate) fn new(scope: &'s dyn Scope) -> Self {
        Self {
            scope,
            locals: Vec::new(),
        }
    }

    pub(crate) fn with_frame(scope: &'s dyn Scope, frame: ConfigTree) -> Self {
        Self {
            scope,
            locals: vec![frame],
        }
    }

    pub(crate) fn strict(&self) -> bool {
        self.scope.strict()
    }

    fn try_lookup(&self, name: &str) -> Option<Value> {
        for frame in self.locals.iter().rev() {
            if let Some(value) = frame.get(name) {
                return Some(value.clone());
            }
        }
        self.scope.resolve(name)
    }

    fn lookup(&self, name: &str, span: Span) -> Result<Value> {
        match self.try_lookup(name) {
            Some(value) => Ok(value),
            None if self.strict() => Err(ConfigError::StrictProperty {
                name: name.to_string(),
                span,
                hint: Some("Define it before use, or disable strict mode".into()),
                code: Some(501),
            }),
            None => Ok(Value::Null),
        }
    }

    pub(crate) fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal, _) => Ok(literal_value(literal)),
            Expr::GString(parts, _) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        StringPart::Text(text) => out.push_str(text),
                        StringPart::Expr(expr) => out.push_str(&self.eval(expr)?.to_string()),
                    }
                }
                Ok(Value::String(out))
            }
            Expr::Ident(name, span) => self.lookup(name, *span),
            Expr::Path { head, elements } => self.eval_path(head, elements),
            Expr::List(items, _) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            Expr::Map(entries, _) => {
                let mut map = ConfigTree::new();
                for (key, value) in entries {
                    let key = match key {
                        MapKey::Name(name) => name.clone(),
                        MapKey::Computed(expr) => self.eval(expr)?.to_string(),
                    };
                    let value = self.eval(value)?;
                    map.insert(key, value);
                }
                Ok(Value::Map(map))
            }
            Expr::Closure(closure) => Ok(self.make_closure(closure)),
            Expr::Unary { op, operand, span } => {
                let value = self.eval(operand)?;
                ops::unary(*op, value, *span)
            }
            Expr::Prefix { op, target, span } => {
                let current = self.eval(target)?;
                let updated = step(*op, current, *span)?;
                self.assign_to(target, updated.clone(), *span)?;
                Ok(updated)
            }
            Expr::Postfix { op, target, span } => {
                let current = self.eval(target)?;
                let updated = step(*op, current.clone(), *span)?;
                self.assign_to(target, updated, *span)?;
                Ok(current)
            }
            Expr::Binary { op: BinaryOp::And, left, right, .. } => {
                if !self.eval(left)?.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.eval(right)?.is_truthy()))
            }
            Expr::Binary { op: BinaryOp::Or, left, right, .. } => {
                if self.eval(left)?.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.eval(right)?.is_truthy()))
            }
            Expr::Binary { op, left, right, span } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                ops::binary(*op, left, right, *span)
            }
            Expr::Cast { ty, expr, span } => {
                let value = self.eval(expr)?;
                ops::cast(value, ty, *span)
            }
            Expr::InstanceOf { expr, ty, .. } => Ok(Value::Bool(ops::instance_of(&self.eval(expr)?, ty))),
            Expr::Ternary { cond, then, otherwise, .. } => {
                if self.eval(cond)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Elvis { value, fallback, .. } => {
                let value = self.eval(value)?;
                if value.is_truthy() {
                    Ok(value)
                } else {
                    self.eval(fallback)
                }
            }
            Expr::Assign { op, target, value, span } => self.eval_assign(*op, target, value, *span),
            Expr::MultiAssign { targets, value, span } => {
                self.require_locals(*span)?;
                let Value::List(items) = self.eval(value)? else {
                    return Err(ConfigError::eval(
                        "Multiple assignment needs a list on the right-hand side",
                        *span,
                        513,
                    ));
                };
                for (i, target) in targets.iter().enumerate() {
                    self.set_local(target, items.get(i).cloned().unwrap_or(Value::Null));
                }
                Ok(Value::List(items))
            }
            Expr::Command { callee, args, span } => self.eval_command(callee, args, *span),
        }
    }

    // --- statements ---

    pub(crate) fn exec_block(&mut self, statements: &[Stmt]) -> Result<Flow> {
        let mut last = Value::Null;
        for statement in statements {
            match self.exec(statement)? {
                Flow::Normal(value) => last = value,
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal(last))
    }

    fn exec(&mut self, statement: &Stmt) -> Result<Flow> {
        match statement {
            Stmt::Expr(expr) => Ok(Flow::Normal(self.eval(expr)?)),
            Stmt::Def { name, value, .. } => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Null,
                };
                self.define(name, value.clone());
                Ok(Flow::Normal(value))
            }
            Stmt::If { cond, then, otherwise, .. } => {
                if self.eval(cond)?.is_truthy() {
                    self.exec_block(then)
                } else if let Some(otherwise) = otherwise {
                    self.exec_block(otherwise)
                } else {
                    Ok(Flow::Normal(Value::Null))
                }
            }
            Stmt::Return(expr, _) => {
                let value = match expr {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
        }
    }

    // --- variables and assignment ---

    fn define(&mut self, name: &str, value: Value) {
        if self.locals.is_empty() {
            self.locals.push(ConfigTree::new());
        }
        if let Some(frame) = self.locals.last_mut() {
            frame.insert(name.to_string(), value);
        }
    }

    fn set_local(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.locals.iter_mut().rev().find_map(|frame| frame.get_mut(name)) {
            *slot = value;
            return;
        }
        self.define(name, value);
    }

    fn require_locals(&self, span: Span) -> Result<()> {
        if self.locals.is_empty() {
            return Err(ConfigError::eval(
                "Assignment expressions are only allowed inside closures",
                span,
                511,
            ));
        }
        Ok(())
    }

    fn eval_assign(&mut self, op: AssignOp, target: &Expr, value: &Expr, span: Span) -> Result<Value> {
        self.require_locals(span)?;
        let updated = match op {
            AssignOp::Assign => self.eval(value)?,
            AssignOp::Compound(binary) => {
                let current = self.eval(target)?;
                let rhs = self.eval(value)?;
                ops::binary(binary, current, rhs, span)?
            }
            AssignOp::Elvis => {
                let current = self.eval(target)?;
                if current.is_truthy() {
                    current
                } else {
                    self.eval(value)?
                }
            }
        };
        self.assign_to(target, updated.clone(), span)?;
        Ok(updated)
    }

    fn assign_to(&mut self, target: &Expr, value: Value, span: Span) -> Result<()> {
        self.require_locals(span)?;
        let invalid = || ConfigError::eval("Invalid assignment target", span, 512);

        let (name, elements) = match target {
            Expr::Ident(name, _) => {
                self.set_local(name, value);
                return Ok(());
            }
            Expr::Path { head, elements } => match head.as_ref() {
                Expr::Ident(name, _) => (name, elements),
                _ => return Err(invalid()),
            },
            _ => return Err(invalid()),
        };

        let mut steps = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                PathElement::Property { name, spread: false, .. } => steps.push(Step::Key(name.clone())),
                PathElement::Index { index, .. } if index.len() == 1 => steps.push(Step::Index(self.eval(&index[0])?)),
                _ => return Err(invalid()),
            }
        }

        // mutate a local copy of captured or outer values
        if !self.locals.iter().any(|frame| frame.contains_key(name)) {
            let current = self.scope.resolve(name).ok_or_else(|| {
                ConfigError::eval(format!("Cannot assign through undefined variable `{}`", name), span, 512)
            })?;
            self.define(name, current);
        }
        let Some(mut slot) = self.locals.iter_mut().rev().find_map(|frame| frame.get_mut(name.as_str())) else {
            return Err(invalid());
        };

        let Some((last, init)) = steps.split_last() else {
            *slot = value;
            return Ok(());
        };
        for step in init {
            slot = child_slot(slot, step, span)?;
        }
        set_slot(slot, last, value, span)
    }

    // --- paths and calls ---

    fn eval_path(&mut self, head: &Expr, elements: &[PathElement]) -> Result<Value> {
        let mut pos = 0;
        let mut current = match head {
            Expr::Ident(name, span) if elements.first().is_some_and(PathElement::is_arguments_or_closure) => {
                let (args, used) = self.call_arguments(elements)?;
                pos = used;
                self.call_function(name, args, *span)?
            }
            _ => self.eval(head)?,
        };

        while pos < elements.len() {
            match &elements[pos] {
                PathElement::Property { name, safe, spread, span } => {
                    let has_args = elements.get(pos + 1).is_some_and(PathElement::is_arguments_or_closure);
                    let (args, used) = if has_args {
                        self.call_arguments(&elements[pos + 1..])?
                    } else {
                        (Vec::new(), 0)
                    };
                    pos += 1 + used;

                    if current.is_null() && *safe {
                        continue;
                    }
                    current = if *spread {
                        self.spread(current, name, has_args.then_some(args), *span)?
                    } else if has_args {
                        methods::call_method(self, current, name, args, *span)?
                    } else {
                        self.get_property(current, name, *span)?
                    };
                }
                PathElement::Index { index, safe, span } => {
                    pos += 1;
                    if current.is_null() && *safe {
                        continue;
                    }
                    let keys = index.iter().map(|key| self.eval(key)).collect::<Result<Vec<_>>>()?;
                    current = self.index_value(current, keys, *span)?;
                }
                element @ (PathElement::Call { .. } | PathElement::Closure(_)) => {
                    let span = element_span(element);
                    let (args, used) = self.call_arguments(&elements[pos..])?;
                    pos += used;
                    current = self.call_value(current, args, span)?;
                }
            }
        }
        Ok(current)
    }

    /// Arguments of one call: an optional `( ... )` followed by trailing closures.
    /// Named arguments are gathered into a map passed first.
    fn call_arguments(&mut self, elements: &[PathElement]) -> Result<(Vec<Value>, usize)> {
        let mut args = Vec::new();
        let mut used = 0;
        if let Some(PathElement::Call { args: call_args, .. }) = elements.first() {
            args = self.eval_arguments(call_args)?;
            used = 1;
        }
        while let Some(PathElement::Closure(closure)) = elements.get(used) {
            args.push(self.make_closure(closure));
            used += 1;
        }
        Ok((args, used))
    }

    fn eval_arguments(&mut self, args: &[Argument]) -> Result<Vec<Value>> {
        let mut named = ConfigTree::new();
        let mut positional = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Argument::Positional(expr) => positional.push(self.eval(expr)?),
                Argument::Named(name, expr) => {
                    let value = self.eval(expr)?;
                    named.insert(name.clone(), value);
                }
            }
        }
        if !named.is_empty() {
            positional.insert(0, Value::Map(named));
        }
        Ok(positional)
    }

    fn eval_command(&mut self, callee: &Expr, args: &[Argument], span: Span) -> Result<Value> {
        let args = self.eval_arguments(args)?;
        match callee {
            Expr::Ident(name, span) => self.call_function(name, args, *span),
            Expr::Path { head, elements } => match elements.split_last() {
                Some((PathElement::Property { name, safe, span, .. }, init)) => {
                    let receiver = if init.is_empty() {
                        self.eval(head)?
                    } else {
                        self.eval_path(head, init)?
                    };
                    if receiver.is_null() && *safe {
                        return Ok(Value::Null);
                    }
                    methods::call_method(self, receiver, name, args, *span)
                }
                _ => {
                    let target = self.eval(callee)?;
                    self.call_value(target, args, span)
                }
            },
            _ => {
                let target = self.eval(callee)?;
                self.call_value(target, args, span)
            }
        }
    }

    /// `name(args)`: only closures held in variables are callable by name.
    fn call_function(&mut self, name: &str, args: Vec<Value>, span: Span) -> Result<Value> {
        match self.try_lookup(name) {
            Some(Value::Closure(closure)) => self.invoke(&closure, args),
            _ => Err(ConfigError::eval(format!("Unknown method `{}`", name), span, 520)),
        }
    }

    fn call_value(&mut self, target: Value, args: Vec<Value>, span: Span) -> Result<Value> {
        match target {
            Value::Closure(closure) => self.invoke(&closure, args),
            other => Err(ConfigError::eval(
                format!("Cannot call a value of type {}", other.type_name()),
                span,
                520,
            )),
        }
    }

    /// Run a closure with no delegate, inheriting the strict flag.
    pub(crate) fn invoke(&self, closure: &ClosureValue, args: Vec<Value>) -> Result<Value> {
        let context = ClosureContext::new().strict(self.strict());
        super::call_closure(closure, &context, args)
    }

    fn spread(&mut self, receiver: Value, name: &str, args: Option<Vec<Value>>, span: Span) -> Result<Value> {
        let items = match receiver {
            Value::Null => return Ok(Value::Null),
            Value::List(items) => items,
            other => vec![other],
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(match &args {
                Some(args) => methods::call_method(self, item, name, args.clone(), span)?,
                None => self.get_property(item, name, span)?,
            });
        }
        Ok(Value::List(out))
    }

    fn get_property(&mut self, receiver: Value, name: &str, span: Span) -> Result<Value> {
        match receiver {
            Value::Map(mut map) => Ok(map.swap_remove(name).unwrap_or(Value::Null)),
            Value::Null if self.strict() => Err(ConfigError::eval(
                format!("Cannot get property '{}' on null object", name),
                span,
                521,
            )),
            Value::Null => Ok(Value::Null),
            Value::List(items) => items
                .into_iter()
                .map(|item| self.get_property(item, name, span))
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            other => Err(ConfigError::eval(
                format!("No such property `{}` for {}", name, other.type_name()),
                span,
                522,
            )),
        }
    }

    fn index_value(&mut self, receiver: Value, mut keys: Vec<Value>, span: Span) -> Result<Value> {
        if keys.len() != 1 {
            return match receiver {
                Value::List(_) | Value::String(_) => {
                    let mut out = Vec::with_capacity(keys.len());
                    for key in keys {
                        match self.index_value(receiver.clone(), vec![key], span)? {
                            Value::List(items) => out.extend(items),
                            value => out.push(value),
                        }
                    }
                    Ok(Value::List(out))
                }
                other => Err(index_error(&other, span)),
            };
        }
        let key = keys.remove(0);

        match (receiver, key) {
            (Value::Map(mut map), key) => Ok(map.swap_remove(&key.to_string()).unwrap_or(Value::Null)),
            (Value::List(items), Value::Int(i)) => {
                Ok(normalize_index(i, items.len()).and_then(|i| items.into_iter().nth(i)).unwrap_or(Value::Null))
            }
            (Value::List(items), Value::List(indices)) => indices
                .iter()
                .map(|index| match index {
                    Value::Int(i) => normalize_index(*i, items.len())
                        .map(|i| items[i].clone())
                        .ok_or_else(|| ConfigError::eval(format!("Index {} out of range", i), span, 524)),
                    other => Err(index_error(other, span)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            (Value::String(s), Value::Int(i)) => {
                let chars: Vec<char> = s.chars().collect();
                normalize_index(i, chars.len())
                    .map(|i| Value::String(chars[i].to_string()))
                    .ok_or_else(|| ConfigError::eval(format!("Index {} out of range", i), span, 524))
            }
            (Value::String(s), Value::List(indices)) => {
                let chars: Vec<char> = s.chars().collect();
                let mut out = String::new();
                for index in &indices {
                    match index {
                        Value::Int(i) => match normalize_index(*i, chars.len()) {
                            Some(i) => out.push(chars[i]),
                            None => return Err(ConfigError::eval(format!("Index {} out of range", i), span, 524)),
                        },
                        other => return Err(index_error(other, span)),
                    }
                }
                Ok(Value::String(out))
            }
            (Value::Null, _) if self.strict() => Err(ConfigError::eval("Cannot index a null object", span, 521)),
            (Value::Null, _) => Ok(Value::Null),
            (other, _) => Err(index_error(&other, span)),
        }
    }

    // --- closures ---

    fn make_closure(&self, expr: &Arc<ClosureExpr>) -> Value {
        let mut captured = ConfigTree::new();
        for name in free_identifiers(expr) {
            if let Some(value) = self.try_lookup(&name) {
                captured.insert(name, value);
            }
        }
        Value::Closure(ClosureValue::new(Arc::clone(expr), captured))
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(f) => Value::Float(*f),
        Literal::Str(s) => Value::String(s.clone()),
    }
}

fn step(op: IncDec, value: Value, span: Span) -> Result<Value> {
    let delta = if op == IncDec::Inc { 1 } else { -1 };
    match value {
        Value::Int(n) => n
            .checked_add(delta)
            .map(Value::Int)
            .ok_or_else(|| ConfigError::eval("Integer overflow", span, 503)),
        Value::Float(f) => Ok(Value::Float(f + delta as f64)),
        other => Err(ConfigError::eval(
            format!("Cannot increment or decrement {}", other.type_name()),
            span,
            502,
        )),
    }
}

fn element_span(element: &PathElement) -> Span {
    match element {
        PathElement::Property { span, .. } | PathElement::Call { span, .. } | PathElement::Index { span, .. } => *span,
        PathElement::Closure(closure) => closure.span,
    }
}

/// Python-style negative indices count from the end.
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let index = if index < 0 { index + len } else { index };
    (0..len).contains(&index).then_some(index as usize)
}

fn index_error(value: &Value, span: Span) -> ConfigError {
    ConfigError::eval(format!("Cannot index {} with this key", value.type_name()), span, 525)
}

fn child_slot<'v>(slot: &'v mut Value, step: &Step, span: Span) -> Result<&'v mut Value> {
    let missing = || ConfigError::eval("Cannot assign below a missing element", span, 512);
    match (slot, step) {
        (Value::Map(map), Step::Key(key)) => map.get_mut(key).ok_or_else(missing),
        (Value::Map(map), Step::Index(key)) => map.get_mut(&key.to_string()).ok_or_else(missing),
        (Value::List(items), Step::Index(Value::Int(i))) => {
            let len = items.len();
            normalize_index(*i, len).and_then(|i| items.get_mut(i)).ok_or_else(missing)
        }
        _ => Err(missing()),
    }
}

fn set_slot(slot: &mut Value, step: &Step, value: Value, span: Span) -> Result<()> {
    match (slot, step) {
        (Value::Map(map), Step::Key(key)) => {
            map.insert(key.clone(), value);
        }
        (Value::Map(map), Step::Index(key)) => {
            map.insert(key.to_string(), value);
        }
        (Value::List(items), Step::Index(Value::Int(i))) if *i >= 0 => {
            let i = usize::try_from(*i).unwrap_or(usize::MAX);
            if i >= items.len() {
                let len = ops::checked_len(i.checked_add(1), "Growing the list", span)?;
                items.resize(len, Value::Null);
            }
            items[i] = value;
        }
        (Value::List(items), Step::Index(Value::Int(i))) => {
            let len = items.len();
            let Some(i) = normalize_index(*i, len) else {
                return Err(ConfigError::eval(format!("Index {} out of range", i), span, 524));
            };
            items[i] = value;
        }
        (slot, _) => {
            return Err(ConfigError::eval(
                format!("Cannot assign into {}", slot.type_name()),
                span,
                512,
            ));
        }
    }
    Ok(())
}

/// Identifiers a closure body refers to, minus its own parameters.
fn free_identifiers(closure: &ClosureExpr) -> IndexSet<String> {
    let mut names = IndexSet::new();
    for statement in &closure.body {
        collect_statement(statement, &mut names);
    }
    for param in &closure.params {
        names.shift_remove(param);
    }
    names.shift_remove("it");
    names
}

fn collect_statement(statement: &Stmt, names: &mut IndexSet<String>) {
    match statement {
        Stmt::Expr(expr) => collect_expr(expr, names),
        Stmt::Def { value, .. } => {
            if let Some(value) = value {
                collect_expr(value, names);
            }
        }
        Stmt::If { cond, then, otherwise, .. } => {
            collect_expr(cond, names);
            then.iter().for_each(|s| collect_statement(s, names));
            if let Some(otherwise) = otherwise {
                otherwise.iter().for_each(|s| collect_statement(s, names));
            }
        }
        Stmt::Return(value, _) => {
            if let Some(value) = value {
                collect_expr(value, names);
            }
        }
    }
}

fn collect_arguments(args: &[Argument], names: &mut IndexSet<String>) {
    for arg in args {
        match arg {
            Argument::Positional(expr) | Argument::Named(_, expr) => collect_expr(expr, names),
        }
    }
}

fn collect_expr(expr: &Expr, names: &mut IndexSet<String>) {
    match expr {
        Expr::Literal(..) => {}
        Expr::Ident(name, _) => {
            names.insert(name.clone());
        }
        Expr::GString(parts, _) => {
            for part in parts {
                if let StringPart::Expr(expr) = part {
                    collect_expr(expr, names);
                }
            }
        }
        Expr::Path { head, elements } => {
            collect_expr(head, names);
            for element in elements {
                match element {
                    PathElement::Property { .. } => {}
                    PathElement::Call { args, .. } => collect_arguments(args, names),
                    PathElement::Index { index, .. } => index.iter().for_each(|e| collect_expr(e, names)),
                    PathElement::Closure(closure) => names.extend(free_identifiers(closure)),
                }
            }
        }
        Expr::List(items, _) => items.iter().for_each(|e| collect_expr(e, names)),
        Expr::Map(entries, _) => {
            for (key, value) in entries {
                if let MapKey::Computed(key) = key {
                    collect_expr(key, names);
                }
                collect_expr(value, names);
            }
        }
        Expr::Closure(closure) => names.extend(free_identifiers(closure)),
        Expr::Unary { operand: inner, .. }
        | Expr::Prefix { target: inner, .. }
        | Expr::Postfix { target: inner, .. }
        | Expr::Cast { expr: inner, .. }
        | Expr::InstanceOf { expr: inner, .. } => collect_expr(inner, names),
        Expr::Binary { left, right, .. }
        | Expr::Elvis { value: left, fallback: right, .. }
        | Expr::Assign { target: left, value: right, .. } => {
            collect_expr(left, names);
            collect_expr(right, names);
        }
        Expr::Ternary { cond, then, otherwise, .. } => {
            collect_expr(cond, names);
            collect_expr(then, names);
            collect_expr(otherwise, names);
        }
        Expr::MultiAssign { value, .. } => collect_expr(value, names),
        Expr::Command { callee, args, .. } => {
            collect_expr(callee, names);
            collect_arguments(args, names);
        }
    }
}
