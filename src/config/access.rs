use super::*;
use crate::error::ConfigError;

fn missing(path: &str) -> ConfigError {
    ConfigError::Conversion {
        message: format!("Path '{}' not found in configuration", path),
        path: path.to_string(),
        hint: Some("Check that the path exists in your config file".into()),
        code: Some(404),
    }
}

/// Attach the looked-up path to a conversion failure.
fn with_path(err: ConfigError, path: &str) -> ConfigError {
    match err {
        ConfigError::Conversion { message, hint, code, .. } => ConfigError::Conversion {
            message,
            path: path.to_string(),
            hint,
            code,
        },
        other => other,
    }
}

impl ParsedConfig {
    /// Get a typed value using dot notation.
    ///
    /// # Examples
    /// ```no_run
    /// # use flow_cfg::{ConfigParser, ParseOptions};
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let config = ConfigParser::new(ParseOptions::default()).parse_file("nextflow.config")?;
    /// let executor: String = config.get("process.executor")?;
    /// let cpus: u64 = config.get("process.cpus")?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// A `Conversion` error if the path doesn't exist (code 404) or the value
    /// can't be converted to `T`.
    pub fn get<T>(&self, path: &str) -> Result<T>
    where
        T: TryFrom<Value, Error = ConfigError>,
    {
        let value = self.get_value(path)?.clone();
        T::try_from(value).map_err(|e| with_path(e, path))
    }

    /// Like [`get`](Self::get), but a missing path is `Ok(None)`.
    pub fn get_optional<T>(&self, path: &str) -> Result<Option<T>>
    where
        T: TryFrom<Value, Error = ConfigError>,
    {
        match self.get_value(path) {
            Ok(value) => T::try_from(value.clone()).map(Some).map_err(|e| with_path(e, path)),
            Err(ConfigError::Conversion { code: Some(404), .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Get a value with a fallback default for missing or mistyped entries.
    pub fn get_or<T>(&self, path: &str, default: T) -> T
    where
        T: TryFrom<Value, Error = ConfigError>,
    {
        self.get(path).unwrap_or(default)
    }

    /// Raw value at a dotted path. The empty path is the whole tree.
    pub fn get_value(&self, path: &str) -> Result<&Value> {
        let mut segments = path.split('.').filter(|s| !s.is_empty());
        let first = segments.next().ok_or_else(|| missing(path))?;
        let mut current = self.tree.get(first).ok_or_else(|| missing(path))?;
        for segment in segments {
            current = current
                .as_map()
                .and_then(|map| map.get(segment))
                .ok_or_else(|| missing(path))?;
        }
        Ok(current)
    }

    pub fn has(&self, path: &str) -> bool {
        self.get_value(path).is_ok()
    }

    /// Keys of the map at `path`, in declaration order. The empty path lists top-level keys.
    pub fn get_keys(&self, path: &str) -> Result<Vec<String>> {
        if path.trim().is_empty() {
            return Ok(self.tree.keys().cloned().collect());
        }
        match self.get_value(path)? {
            Value::Map(map) => Ok(map.keys().cloned().collect()),
            other => Err(ConfigError::Conversion {
                message: format!("Expected a block, got {}", other.type_name()),
                path: path.to_string(),
                hint: Some("Only blocks and maps have keys".into()),
                code: Some(406),
            }),
        }
    }

    /// Whether the top-level `profiles` block declares `name`.
    pub fn has_profile(&self, name: &str) -> bool {
        self.declared_profiles.iter().any(|p| p == name)
    }
}
