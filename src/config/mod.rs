// Author: Dustin Pilgrim
// License: MIT

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::eval::Evaluator;
use crate::parser;
use crate::resolver::{FsResolver, PathResolver};
use crate::selector::SelectorRegistry;
use crate::value::{ConfigTree, Value};

mod access;
mod conversion;

/// Flags and inputs for one parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Fail on undefined identifiers instead of reading them as null.
    pub strict: bool,
    /// Store closures as their source text instead of callable values.
    pub render_closures_as_text: bool,
    /// Skip every `includeConfig` without touching the filesystem.
    pub ignore_includes: bool,
    /// Profiles to activate. `None` keeps `profiles { }` as a plain block.
    pub profiles: Option<Vec<String>>,
    /// Initial `params`; these win over params assigned by the configuration.
    pub params: ConfigTree,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_render_closures_as_text(mut self, render: bool) -> Self {
        self.render_closures_as_text = render;
        self
    }

    pub fn with_ignore_includes(mut self, ignore: bool) -> Self {
        self.ignore_includes = ignore;
        self
    }

    pub fn with_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profiles = Some(profiles.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_params(mut self, params: ConfigTree) -> Self {
        self.params = params;
        self
    }
}

/// A plugin declared in the top-level `plugins` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl PluginSpec {
    /// Split `name@version` at the last `@`.
    pub fn parse(raw: &str) -> Self {
        match raw.rsplit_once('@') {
            Some((id, version)) if !id.is_empty() && !version.is_empty() => Self {
                id: id.to_string(),
                version: Some(version.to_string()),
            },
            _ => Self {
                id: raw.to_string(),
                version: None,
            },
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        let mut record = ConfigTree::new();
        record.insert("id".into(), Value::String(self.id.clone()));
        if let Some(version) = &self.version {
            record.insert("version".into(), Value::String(version.clone()));
        }
        Value::Map(record)
    }
}

impl fmt::Display for PluginSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.id, version),
            None => f.write_str(&self.id),
        }
    }
}

/// Everything one parse produces. The caller owns it outright.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedConfig {
    pub tree: ConfigTree,
    pub selectors: SelectorRegistry,
    /// Absolute paths of every file included, first inclusion order.
    pub includes: Vec<PathBuf>,
    pub plugins: Vec<PluginSpec>,
    pub declared_profiles: Vec<String>,
}

/// Entry point: parses configuration text or files with a fixed set of options.
///
/// # Example
/// ```no_run
/// use flow_cfg::{ConfigParser, ParseOptions};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let parser = ConfigParser::new(ParseOptions::new().with_profiles(["test"]));
/// let config = parser.parse_file("nextflow.config")?;
/// let cpus: i64 = config.get("process.cpus")?;
/// # Ok(())
/// # }
/// ```
pub struct ConfigParser {
    options: ParseOptions,
    resolver: Box<dyn PathResolver>,
}

impl ConfigParser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            resolver: Box::new(FsResolver),
        }
    }

    /// Replace the filesystem resolver, e.g. to serve includes from memory or URLs.
    pub fn with_resolver(mut self, resolver: impl PathResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse configuration text. Relative includes resolve against the working directory.
    pub fn parse_str(&self, source: &str) -> Result<ParsedConfig> {
        let unit = parser::parse(source)?;
        Evaluator::new(&self.options, self.resolver.as_ref()).run(&unit, None)
    }

    /// Parse a file. Relative includes resolve against the file's directory.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<ParsedConfig> {
        let path = self.resolver.resolve(&path.as_ref().to_string_lossy(), None)?;
        tracing::debug!(path = %path.display(), "parsing configuration file");
        let source = self.resolver.read(&path)?;
        let unit = parser::parse(&source)?;
        Evaluator::new(&self.options, self.resolver.as_ref()).run(&unit, Some(&path))
    }
}

impl Default for ConfigParser {
    fn default() -> Self {
        Self::new(ParseOptions::default())
    }
}

#[cfg(test)]
mod tests;
