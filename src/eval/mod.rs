// Author: Dustin Pilgrim
// License: MIT

//! Evaluation of parsed configuration units into a [`ConfigTree`].
//!
//! Blocks open a frame named after the block path. Identifiers resolve from the
//! innermost frame outwards, with `params` always answering from the params
//! overlay. Included files run in an unnamed frame that is merged into the
//! including frame once the file is done.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;

use crate::ast::{ConfigStmt, ConfigUnit, Expr, PluginDecl, SelectorAssign};
use crate::closure::{ClosureContext, ClosureValue};
use crate::config::{ParseOptions, ParsedConfig, PluginSpec};
use crate::error::{ConfigError, Result, Span};
use crate::merge::{merge_into, merge_value};
use crate::resolver::{IncludeCache, PathResolver};
use crate::selector::{SelectorKey, SelectorRegistry};
use crate::value::{ConfigTree, Value};

mod expr;
mod methods;
mod ops;


pub(crate) use expr::{Flow, Interp, Scope};

/// Bindings seen by a closure body: its definition-time snapshot, then the delegate.
struct ClosureScope<'c> {
    captured: &'c ConfigTree,
    delegate: &'c ConfigTree,
    strict: bool,
}

impl Scope for ClosureScope<'_> {
    fn resolve(&self, name: &str) -> Option<Value> {
        self.captured.get(name).or_else(|| self.delegate.get(name)).cloned()
    }

    fn strict(&self) -> bool {
        self.strict
    }
}

/// Run a closure body with `args` bound to its parameters.
///
/// A closure without declared parameters sees its first argument as `it`. A
/// closure with several parameters called with one list spreads the list.
pub(crate) fn call_closure(closure: &ClosureValue, context: &ClosureContext, args: Vec<Value>) -> Result<Value> {
    let params = closure.params();
    let mut args = args;
    if params.len() > 1 && matches!(args.as_slice(), [Value::List(_)]) {
        if let Some(Value::List(items)) = args.pop() {
            args = items;
        }
    }

    let mut frame = ConfigTree::new();
    let mut args = args.into_iter();
    if params.is_empty() {
        frame.insert("it".into(), args.next().unwrap_or(Value::Null));
    } else {
        for param in params {
            frame.insert(param.clone(), args.next().unwrap_or(Value::Null));
        }
    }

    let scope = ClosureScope {
        captured: closure.captured(),
        delegate: &context.delegate,
        strict: context.strict,
    };
    let mut interp = Interp::with_frame(&scope, frame);
    match interp.exec_block(&closure.expr().body)? {
        Flow::Normal(value) | Flow::Return(value) => Ok(value),
    }
}

struct Frame {
    /// Path segments this frame adds to the scope; empty for included files.
    name: Vec<String>,
    tree: ConfigTree,
}

pub(crate) struct Evaluator<'a> {
    options: &'a ParseOptions,
    resolver: &'a dyn PathResolver,
    cache: IncludeCache,
    frames: Vec<Frame>,
    /// Files currently being evaluated, outermost first.
    files: Vec<PathBuf>,
    selectors: SelectorRegistry,
    includes: IndexSet<PathBuf>,
    plugins: Vec<PluginSpec>,
    declared_profiles: IndexSet<String>,
}

impl Scope for Evaluator<'_> {
    fn resolve(&self, name: &str) -> Option<Value> {
        if name == "params" {
            return Some(Value::Map(self.params_overlay()));
        }
        self.frames.iter().rev().find_map(|frame| frame.tree.get(name).cloned())
    }

    fn strict(&self) -> bool {
        self.options.strict
    }
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(options: &'a ParseOptions, resolver: &'a dyn PathResolver) -> Self {
        Self {
            options,
            resolver,
            cache: IncludeCache::new(),
            frames: vec![Frame {
                name: Vec::new(),
                tree: ConfigTree::new(),
            }],
            files: Vec::new(),
            selectors: SelectorRegistry::new(),
            includes: IndexSet::new(),
            plugins: Vec::new(),
            declared_profiles: IndexSet::new(),
        }
    }

    /// Evaluate a top-level unit. `origin` is the file it was read from, used as
    /// the base for relative includes.
    pub(crate) fn run(mut self, unit: &ConfigUnit, origin: Option<&Path>) -> Result<ParsedConfig> {
        if let Some(origin) = origin {
            self.files.push(origin.to_path_buf());
        }
        self.eval_statements(&unit.statements)?;
        self.finish()
    }

    fn finish(self) -> Result<ParsedConfig> {
        if let Some(selected) = &self.options.profiles {
            for profile in selected {
                if self.declared_profiles.contains(profile) {
                    continue;
                }
                if self.options.strict {
                    return Err(ConfigError::config(
                        format!("Unknown configuration profile: '{}'", profile),
                        Span::default(),
                        Some("Declare it inside the top-level `profiles` block"),
                        255,
                    ));
                }
                tracing::warn!(profile = %profile, "selected profile is not declared");
            }
        }

        let params = self.params_overlay();
        let mut tree = self.frames.into_iter().next().map(|frame| frame.tree).unwrap_or_default();
        if !params.is_empty() {
            tree.insert("params".into(), Value::Map(params));
        }

        Ok(ParsedConfig {
            tree,
            selectors: self.selectors,
            includes: self.includes.into_iter().collect(),
            plugins: self.plugins,
            declared_profiles: self.declared_profiles.into_iter().collect(),
        })
    }

    /// Config-assigned params with the caller's params on top.
    fn params_overlay(&self) -> ConfigTree {
        let mut overlay = ConfigTree::new();
        let mut path: Vec<&str> = Vec::new();
        for frame in &self.frames {
            path.extend(frame.name.iter().map(String::as_str));
            match path.as_slice() {
                [] => {
                    if let Some(Value::Map(params)) = frame.tree.get("params") {
                        merge_into(&mut overlay, params.clone());
                    }
                }
                ["params"] => merge_into(&mut overlay, frame.tree.clone()),
                _ => {}
            }
        }
        merge_into(&mut overlay, self.options.params.clone());
        overlay
    }

    fn scope_path(&self) -> Vec<String> {
        self.frames.iter().flat_map(|frame| frame.name.iter().cloned()).collect()
    }

    fn eval_expr(&self, expr: &Expr) -> Result<Value> {
        let value = Interp::new(self).eval(expr)?;
        Ok(self.store_form(value))
    }

    /// Closures become their source text when rendering as text.
    fn store_form(&self, value: Value) -> Value {
        if !self.options.render_closures_as_text {
            return value;
        }
        match value {
            Value::Closure(closure) => Value::String(closure.render_as_text()),
            Value::List(items) => Value::List(items.into_iter().map(|item| self.store_form(item)).collect()),
            Value::Map(map) => Value::Map(map.into_iter().map(|(k, v)| (k, self.store_form(v))).collect()),
            other => other,
        }
    }

    fn current_tree(&mut self) -> Option<&mut ConfigTree> {
        self.frames.last_mut().map(|frame| &mut frame.tree)
    }

    fn eval_statements(&mut self, statements: &[ConfigStmt]) -> Result<()> {
        for statement in statements {
            self.eval_statement(statement)?;
        }
        Ok(())
    }

    fn eval_statement(&mut self, statement: &ConfigStmt) -> Result<()> {
        tracing::trace!(span = %statement.span(), depth = self.frames.len(), "evaluating statement");
        match statement {
            ConfigStmt::Assign { path, value, .. } => {
                let value = self.eval_expr(value)?;
                self.assign(path, value);
                Ok(())
            }
            ConfigStmt::Block { name, body, .. } => {
                let options = self.options;
                match &options.profiles {
                    Some(selected) if is_profiles_block(name) && self.scope_path().is_empty() => {
                        self.eval_profiles(body, selected)
                    }
                    _ => self.eval_block(name, body),
                }
            }
            ConfigStmt::Selector { kind, target, body, .. } => self.eval_selector(kind, target, body),
            ConfigStmt::Include { path, span } => self.eval_include(path, *span),
            ConfigStmt::Plugins { plugins, .. } => self.eval_plugins(plugins),
        }
    }

    /// Plain assignment: intermediate segments become maps, the last one is overwritten.
    fn assign(&mut self, path: &[String], value: Value) {
        let Some((last, init)) = path.split_last() else {
            return;
        };
        if let Some(target) = self.current_tree().and_then(|tree| descend(tree, init)) {
            target.insert(last.clone(), value);
        }
    }

    fn eval_block(&mut self, name: &[String], body: &[ConfigStmt]) -> Result<()> {
        let seed = self.existing_block(name).unwrap_or_default();
        self.frames.push(Frame {
            name: name.to_vec(),
            tree: seed,
        });
        let result = self.eval_statements(body);
        let frame = self.frames.pop();
        result?;

        let (Some(frame), Some((last, init))) = (frame, name.split_last()) else {
            return Ok(());
        };
        if let Some(target) = self.current_tree().and_then(|tree| descend(tree, init)) {
            merge_value(target, last, Value::Map(frame.tree));
        }
        Ok(())
    }

    /// Content already stored at `name`, looking through enclosing include frames.
    fn existing_block(&self, name: &[String]) -> Option<ConfigTree> {
        for frame in self.frames.iter().rev() {
            let mut node = frame.tree.get(name.first()?.as_str());
            for key in name.iter().skip(1) {
                node = node.and_then(Value::as_map).and_then(|map| map.get(key.as_str()));
            }
            if let Some(Value::Map(existing)) = node {
                return Some(existing.clone());
            }
            if !frame.name.is_empty() {
                break;
            }
        }
        None
    }

    fn eval_selector(&mut self, kind: &str, target: &str, body: &[SelectorAssign]) -> Result<()> {
        let mut assignments: Vec<(Vec<String>, Value)> = Vec::with_capacity(body.len());
        for assign in body {
            if assignments.iter().any(|(existing, _)| *existing == assign.path) {
                tracing::warn!(selector = %format!("{}:{}", kind, target), key = %assign.path.join("."), "selector key assigned more than once");
            }
            let value = self.eval_expr(&assign.value)?;
            assignments.push((assign.path.clone(), value));
        }
        let scope = self.scope_path();
        self.selectors.record(SelectorKey::scoped(&scope, kind, target), assignments);
        Ok(())
    }

    fn eval_include(&mut self, expr: &Expr, span: Span) -> Result<()> {
        if self.options.ignore_includes {
            tracing::debug!(span = %span, "include ignored");
            return Ok(());
        }

        let raw = match self.eval_expr(expr)? {
            Value::String(raw) => raw,
            other => {
                return Err(ConfigError::eval(
                    format!("Include path must be a string, got {}", other.type_name()),
                    span,
                    510,
                ));
            }
        };

        let base_dir = self.files.last().and_then(|file| file.parent()).map(Path::to_path_buf);
        let path = self.resolver.resolve(&raw, base_dir.as_deref())?;
        tracing::debug!(include = %raw, path = %path.display(), "resolved include");

        if let Some(start) = self.files.iter().position(|file| *file == path) {
            let mut chain = self.files[start..].to_vec();
            chain.push(path);
            return Err(ConfigError::IncludeCycle { chain, code: Some(304) });
        }

        let record = self.cache.load(self.resolver, &path)?;
        self.includes.insert(path.clone());

        self.files.push(path);
        self.frames.push(Frame {
            name: Vec::new(),
            tree: ConfigTree::new(),
        });
        let result = self.eval_statements(&record.unit.statements);
        let frame = self.frames.pop();
        self.files.pop();
        result?;

        if let (Some(frame), Some(target)) = (frame, self.current_tree()) {
            merge_into(target, frame.tree);
        }
        Ok(())
    }

    fn eval_plugins(&mut self, plugins: &[PluginDecl]) -> Result<()> {
        for decl in plugins {
            match self.eval_expr(&decl.id)? {
                Value::String(raw) => self.plugins.push(PluginSpec::parse(&raw)),
                other => {
                    return Err(ConfigError::eval(
                        format!("Plugin id must be a string, got {}", other.type_name()),
                        decl.span,
                        513,
                    ));
                }
            }
        }

        let list = self.plugins.iter().map(PluginSpec::to_value).collect();
        if let Some(root) = self.frames.first_mut() {
            root.tree.insert("plugins".into(), Value::List(list));
        }
        Ok(())
    }

    fn eval_profiles(&mut self, body: &[ConfigStmt], selected: &[String]) -> Result<()> {
        for statement in body {
            let ConfigStmt::Block { name, body, .. } = statement else {
                return Err(ConfigError::config(
                    "Only profile blocks are allowed inside `profiles`",
                    statement.span(),
                    Some("Write each profile as `name { ... }`"),
                    256,
                ));
            };
            let [profile] = name.as_slice() else {
                return Err(ConfigError::config(
                    format!("Invalid profile name '{}'", name.join(".")),
                    statement.span(),
                    Some("Profile names cannot be dotted paths"),
                    256,
                ));
            };

            self.declared_profiles.insert(profile.clone());
            if selected.contains(profile) {
                tracing::debug!(profile = %profile, "activating profile");
                self.eval_statements(body)?;
            }
        }
        Ok(())
    }
}

fn is_profiles_block(name: &[String]) -> bool {
    matches!(name, [only] if only == "profiles")
}

/// Map at `path` below `tree`, replacing any missing or non-map segment with a map.
fn descend<'t>(tree: &'t mut ConfigTree, path: &[String]) -> Option<&'t mut ConfigTree> {
    path.iter().try_fold(tree, |tree, key| {
        let slot = tree
            .entry(key.clone())
            .or_insert_with(|| Value::Map(ConfigTree::new()));
        if !matches!(slot, Value::Map(_)) {
            tracing::warn!(key = %key, previous = slot.type_name(), "overwriting value with a nested map");
            *slot = Value::Map(ConfigTree::new());
        }
        slot.as_map_mut()
    })
}
