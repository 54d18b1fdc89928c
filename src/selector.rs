use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::value::Value;

/// What a selector matches against. Target patterns are stored verbatim; matching
/// them against labels or names is left to the consumer of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum SelectorKind {
    /// `withLabel`
    Label,
    /// `withName`
    Name,
    Other(String),
}

impl SelectorKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "withLabel" => SelectorKind::Label,
            "withName" => SelectorKind::Name,
            other => SelectorKind::Other(other.to_string()),
        }
    }

    /// The identifier used in configuration source.
    pub fn as_str(&self) -> &str {
        match self {
            SelectorKind::Label => "withLabel",
            SelectorKind::Name => "withName",
            SelectorKind::Other(name) => name,
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SelectorKind> for String {
    fn from(kind: SelectorKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Identity of a registry entry. Two selectors with the same kind and target
/// declared under different blocks are separate entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SelectorKey {
    /// Block path the selector is declared under, e.g. `["process"]`.
    pub scope: Vec<String>,
    pub kind: SelectorKind,
    pub target: String,
}

impl SelectorKey {
    /// A key declared at the top level.
    pub fn new(kind: &str, target: impl Into<String>) -> Self {
        Self::scoped(&[], kind, target)
    }

    pub fn scoped(scope: &[String], kind: &str, target: impl Into<String>) -> Self {
        Self {
            scope: scope.to_vec(),
            kind: SelectorKind::from_name(kind),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selector {
    pub key: SelectorKey,
    /// Evaluated assignments in declaration order. Each key is kept as its
    /// path segments so quoted keys containing `.` stay a single segment.
    pub assignments: Vec<(Vec<String>, Value)>,
}

impl Selector {
    /// Last value assigned to the dotted `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.assignments
            .iter()
            .rev()
            .find(|(path, _)| path.join(".") == key)
            .map(|(_, v)| v)
    }

    pub fn scope(&self) -> &[String] {
        &self.key.scope
    }
}

/// Selectors keyed by (scope, kind, target). Repeated declarations of the same
/// key append to the existing entry instead of replacing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectorRegistry {
    entries: IndexMap<SelectorKey, Selector>,
}

impl SelectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: SelectorKey, assignments: Vec<(Vec<String>, Value)>) {
        let entry = self.entries.entry(key.clone()).or_insert_with(|| Selector {
            key,
            assignments: Vec::new(),
        });
        entry.assignments.extend(assignments);
    }

    /// First entry with this kind and target, in any scope.
    pub fn get(&self, kind: &str, target: &str) -> Option<&Selector> {
        let kind = SelectorKind::from_name(kind);
        self.entries
            .values()
            .find(|selector| selector.key.kind == kind && selector.key.target == target)
    }

    /// The entry declared under exactly `scope`.
    pub fn get_in(&self, scope: &[String], kind: &str, target: &str) -> Option<&Selector> {
        self.entries.get(&SelectorKey::scoped(scope, kind, target))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Selector> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append every entry of `other`, in its order.
    pub fn extend(&mut self, other: SelectorRegistry) {
        for (key, selector) in other.entries {
            self.record(key, selector.assignments);
        }
    }
}

/// Serialized as a list of selectors, since keys are not strings.
impl Serialize for SelectorRegistry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}
