// Author: Dustin Pilgrim
// License: MIT

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ast::ConfigUnit;
use crate::error::{ConfigError, Result};

/// Turns an include string into an absolute location and reads its content.
///
/// The default [`FsResolver`] handles local files; hosts that support remote
/// configuration plug in their own implementation.
pub trait PathResolver {
    fn resolve(&self, raw: &str, base_dir: Option<&Path>) -> Result<PathBuf>;
    fn read(&self, path: &Path) -> Result<String>;
}

/// Local filesystem resolver: `~/` expands to the home directory and relative
/// paths are joined onto the including file's directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsResolver;

pub(crate) fn is_url(raw: &str) -> bool {
    raw.split_once("://")
        .is_some_and(|(scheme, _)| !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+'))
}

impl PathResolver for FsResolver {
    fn resolve(&self, raw: &str, base_dir: Option<&Path>) -> Result<PathBuf> {
        if is_url(raw) {
            return Err(ConfigError::IncludeRead {
                message: "Remote includes are not supported by the filesystem resolver".into(),
                path: PathBuf::from(raw),
                hint: Some("Provide a PathResolver that can fetch URLs".into()),
                code: Some(303),
            });
        }

        let path = if let Some(rest) = raw.strip_prefix("~/") {
            let home = dirs::home_dir().ok_or_else(|| ConfigError::IncludeRead {
                message: "Could not determine home directory for ~ expansion".into(),
                path: PathBuf::from(raw),
                hint: Some("Set HOME or use an absolute include path".into()),
                code: Some(300),
            })?;
            home.join(rest)
        } else {
            let path = PathBuf::from(raw);
            match base_dir {
                Some(base) if path.is_relative() => base.join(path),
                _ => path,
            }
        };

        Ok(absolutize(path))
    }

    fn read(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(ConfigError::IncludeNotFound {
                path: path.to_path_buf(),
                hint: Some("Check that the included file exists".into()),
                code: Some(301),
            });
        }
        fs::read_to_string(path).map_err(|e| ConfigError::IncludeRead {
            message: format!("Failed to read file: {}", e),
            path: path.to_path_buf(),
            hint: Some("Check that the file is readable".into()),
            code: Some(302),
        })
    }
}

/// Canonical form when the file exists, otherwise the lexically joined path made
/// absolute against the working directory.
fn absolutize(path: PathBuf) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir().map(|cwd| cwd.join(&path)).unwrap_or(path)
}

/// A parsed include, shared by every statement that names the same file.
#[derive(Debug, Clone)]
pub struct IncludeRecord {
    pub path: PathBuf,
    pub unit: Arc<ConfigUnit>,
}

/// Per-parse cache of included units keyed by absolute path.
#[derive(Debug, Default)]
pub struct IncludeCache {
    records: HashMap<PathBuf, IncludeRecord>,
}

impl IncludeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&IncludeRecord> {
        self.records.get(path)
    }

    /// Return the cached unit for `path`, reading and parsing it on first use.
    pub fn load(&mut self, resolver: &dyn PathResolver, path: &Path) -> Result<IncludeRecord> {
        if let Some(record) = self.records.get(path) {
            tracing::debug!(path = %path.display(), "include cache hit");
            return Ok(record.clone());
        }

        tracing::debug!(path = %path.display(), "reading include");
        let content = resolver.read(path)?;
        let unit = crate::parser::parse(&content)?;
        let record = IncludeRecord {
            path: path.to_path_buf(),
            unit: Arc::new(unit),
        };
        self.records.insert(path.to_path_buf(), record.clone());
        Ok(record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
