use crate::error::{DeclarationError, Result};
use serde::{Deserialize, Serialize};

/// Unit name used when a file declares no package and none can be inferred
pub const DEFAULT_UNIT_NAME: &str = "<default>";

/// Configuration for declaration parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Placeholder unit name for files without a package declaration
    pub default_unit_name: String,

    /// How same-named methods of one type are told apart
    pub overloads: OverloadPolicy,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            default_unit_name: DEFAULT_UNIT_NAME.to_string(),
            overloads: OverloadPolicy::Merge,
        }
    }
}

impl ParserConfig {
    /// Config that suffixes repeated method names with a per-scope ordinal
    pub fn with_ordinals() -> Self {
        Self {
            overloads: OverloadPolicy::Ordinal,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_unit_name.trim().is_empty() {
            return Err(DeclarationError::invalid_config(
                "default_unit_name must not be empty",
            ));
        }
        Ok(())
    }
}

/// Strategy for overloaded members, which otherwise share one identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverloadPolicy {
    /// All overloads collapse into a single identifier
    #[default]
    Merge,

    /// The second and later same-named methods in one scope become
    /// `name#2`, `name#3`, ... in declaration order
    Ordinal,
}
