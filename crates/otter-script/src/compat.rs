//! Compatibility mode selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::dialect::{self, Dialect};
use crate::error::ConfigError;

/// How much syntax the caller expects the pipeline to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatibilityMode {
    /// Source is already in the engine's dialect. Nothing is lowered.
    #[serde(alias = "base", alias = "es5")]
    Legacy,
    /// Source may use ES2015+ syntax. Always lowered.
    #[default]
    #[serde(alias = "extended", alias = "es6")]
    Modern,
    /// Lowered only when ES2015+ syntax is detected.
    Auto,
}

impl CompatibilityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Modern => "modern",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for CompatibilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompatibilityMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "base" | "es5" | "es51" => Ok(Self::Legacy),
            "modern" | "extended" | "es6" | "es2015" => Ok(Self::Modern),
            "auto" => Ok(Self::Auto),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

/// Outcome of [`select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub will_transform: bool,
    /// Detected dialect, only known in [`CompatibilityMode::Auto`] when the
    /// script could be scanned.
    pub dialect: Option<Dialect>,
}

/// Decide whether `source` goes through the lowering transform.
///
/// In `Auto` mode a script that fails to scan is sent to the transform so the
/// syntax error is reported against the original text.
pub fn select(mode: CompatibilityMode, source: &str, source_name: &str) -> Selection {
    let selection = match mode {
        CompatibilityMode::Legacy => Selection {
            will_transform: false,
            dialect: None,
        },
        CompatibilityMode::Modern => Selection {
            will_transform: true,
            dialect: None,
        },
        CompatibilityMode::Auto => match dialect::detect(source, source_name) {
            Ok(report) => Selection {
                will_transform: report.dialect != Dialect::Es5,
                dialect: Some(report.dialect),
            },
            Err(_) => Selection {
                will_transform: true,
                dialect: None,
            },
        },
    };

    tracing::debug!(
        source_name,
        %mode,
        will_transform = selection.will_transform,
        dialect = ?selection.dialect,
        "selected compatibility path"
    );
    selection
}
