use crate::error::{ChangeError, Result};
use declmap_declarations::ParserConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for change detection over a set of patches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Declaration parser settings
    pub parser: ParserConfig,

    /// File extensions that are analysed, with their leading dot
    pub extensions: Vec<String>,

    /// Directory prefixes stripped when inferring a unit name from a path,
    /// tried in order
    pub source_roots: Vec<String>,

    /// Process the patches of a batch on the rayon pool
    pub parallel: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            extensions: vec![".java".to_string()],
            source_roots: vec![
                "src/main/java/".to_string(),
                "src/test/java/".to_string(),
                "src/main/".to_string(),
                "src/".to_string(),
            ],
            parallel: true,
        }
    }
}

impl DetectorConfig {
    /// Sequential preset, handy for deterministic logs
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Default::default()
        }
    }

    /// Parse TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|err| ChangeError::config(format!("TOML: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|err| ChangeError::config(format!("JSON: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse JSON, falling back to TOML
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let value: serde_json::Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(json_err) => {
                let utf8 = std::str::from_utf8(bytes)
                    .map_err(|err| ChangeError::config(format!("{json_err}; {err}")))?;
                let toml_value: toml::Value = toml::from_str(utf8).map_err(|toml_err| {
                    ChangeError::config(format!(
                        "not valid JSON or TOML ({json_err}); TOML parse error: {toml_err}"
                    ))
                })?;
                serde_json::to_value(toml_value)
                    .map_err(|err| ChangeError::config(format!("TOML to JSON: {err}")))?
            }
        };

        let config: Self = serde_json::from_value(value)
            .map_err(|err| ChangeError::config(format!("{err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON or TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        log::debug!("Loading detector config from {}", path.display());
        Self::from_bytes(&bytes)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.parser.validate()?;

        if self.extensions.is_empty() {
            return Err(ChangeError::invalid_config(
                "extensions must list at least one extension",
            ));
        }
        if let Some(bad) = self.extensions.iter().find(|e| !e.starts_with('.') || e.len() < 2) {
            return Err(ChangeError::invalid_config(format!(
                "extension {bad:?} must start with '.'"
            )));
        }
        if let Some(bad) = self.source_roots.iter().find(|r| !r.ends_with('/')) {
            return Err(ChangeError::invalid_config(format!(
                "source root {bad:?} must end with '/'"
            )));
        }
        Ok(())
    }

    /// Whether `path` has one of the analysed extensions
    #[must_use]
    pub fn is_analyzed(&self, path: &str) -> bool {
        self.extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }

    /// Unit name implied by a file's location below a source root, e.g.
    /// `core/src/main/java/com/acme/A.java` gives `com.acme`
    #[must_use]
    pub fn infer_unit_name(&self, path: &str) -> Option<String> {
        let path = path.replace('\\', "/");
        let relative = self.source_roots.iter().find_map(|root| {
            if let Some(rest) = path.strip_prefix(root.as_str()) {
                return Some(rest.to_string());
            }
            let nested = format!("/{root}");
            path.rfind(&nested)
                .map(|at| path[at + nested.len()..].to_string())
        })?;

        let (dir, _file) = relative.rsplit_once('/')?;
        let name = dir
            .split('/')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(".");
        (!name.is_empty()).then_some(name)
    }
}
