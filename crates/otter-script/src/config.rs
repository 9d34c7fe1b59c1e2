//! Compiler configuration.
//!
//! Settings that apply to every request a [`Compiler`](crate::Compiler)
//! handles. Individual requests may still override the compatibility mode and
//! strictness through [`CompileRequest`](crate::CompileRequest).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::compat::CompatibilityMode;
use crate::error::ConfigError;
use crate::transform::{LowerOptions, TargetDialect};

/// Compiler configuration.
///
/// Loaded from JSON with camelCase keys; missing keys take their defaults:
///
/// ```json
/// { "compatibilityMode": "auto", "strict": true, "target": "es5", "sourceMaps": false }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerConfig {
    /// Default compatibility mode for requests.
    /// Default: Modern
    pub compatibility_mode: CompatibilityMode,

    /// Request strict parsing from the engine by default.
    /// Default: true
    pub strict: bool,

    /// Dialect lowered code is emitted in.
    /// Default: ES5
    pub target: TargetDialect,

    /// Produce a Source Map v3 document alongside lowered code.
    /// Default: false
    pub source_maps: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            compatibility_mode: CompatibilityMode::Modern,
            strict: true,
            target: TargetDialect::Es5,
            source_maps: false,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default compatibility mode.
    pub fn mode(mut self, mode: CompatibilityMode) -> Self {
        self.compatibility_mode = mode;
        self
    }

    /// Enable or disable strict parsing.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the lowering target.
    pub fn target(mut self, target: TargetDialect) -> Self {
        self.target = target;
        self
    }

    /// Enable or disable source map generation.
    pub fn source_maps(mut self, enabled: bool) -> Self {
        self.source_maps = enabled;
        self
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content)?;
        tracing::debug!(path = %path.display(), mode = %config.compatibility_mode, "loaded compiler config");
        Ok(config)
    }

    pub(crate) fn lower_options(&self) -> LowerOptions {
        LowerOptions {
            target: self.target,
            source_map: self.source_maps,
        }
    }
}
