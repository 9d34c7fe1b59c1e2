//! Error types for the compilation pipeline.
//!
//! Engine and transform failures are translated into [`CompileError`] at the
//! normalization boundary; their raw shapes ([`EngineError`], [`LowerError`])
//! never reach callers of [`crate::Compiler`].

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::position::Position;

/// Which stage of the pipeline produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The user's source does not parse, before any transform ran.
    OriginalSyntax,
    /// The lowering capability itself failed.
    TransformFailure,
    /// The final wrapped text does not parse.
    WrappedSyntax,
    /// Evaluating the injected helper program failed.
    PreprogramRuntime,
    /// Evaluating the main program threw.
    Runtime,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OriginalSyntax | Self::WrappedSyntax => "SyntaxError",
            Self::TransformFailure => "TransformError",
            Self::PreprogramRuntime => "PreprogramError",
            Self::Runtime => "RuntimeError",
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::OriginalSyntax | Self::WrappedSyntax)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a reported position points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// A location in the text the user wrote.
    Source,
    /// A location in code the pipeline or the caller injected: the strict-mode
    /// literal, lowered constructs without a mapping, prologue, epilogue or the
    /// helper preprogram. Line and column refer to that generated text.
    Synthetic,
    /// The engine did not report a position. Line and column are 0.
    Unknown,
}

/// Normalized error returned by every pipeline operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    pub source_name: String,
    /// 1-based line, 0 only when `origin` is [`Origin::Unknown`].
    pub line: u32,
    /// 1-based column, 0 only when `origin` is [`Origin::Unknown`].
    pub column: u32,
    /// The offending line followed by a caret line.
    pub excerpt: String,
    pub origin: Origin,
}

impl CompileError {
    /// Error without position information.
    pub fn unpositioned(
        kind: ErrorKind,
        message: impl Into<String>,
        source_name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source_name: source_name.into(),
            line: 0,
            column: 0,
            excerpt: String::new(),
            origin: Origin::Unknown,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self.origin {
            Origin::Unknown => None,
            _ => Some(Position::new(self.line, self.column)),
        }
    }

    /// True when the position points into the user's own source.
    pub fn is_in_source(&self) -> bool {
        self.origin == Origin::Source
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.kind, self.source_name, self.message)?;
        if self.origin != Origin::Unknown {
            write!(f, " ({}:{})", self.line, self.column)?;
            if self.origin == Origin::Synthetic {
                f.write_str(" [generated code]")?;
            }
        }
        if !self.excerpt.is_empty() {
            write!(f, "\n{}", self.excerpt)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

/// Result type for pipeline operations
pub type CompileResult<T> = Result<T, CompileError>;

/// Raw error reported by an execution engine.
///
/// `position` is relative to the exact text handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
    pub position: Option<Position>,
}

impl EngineError {
    pub fn new(message: impl Into<String>, position: Option<Position>) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Raw error reported by a lowering transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LowerError {
    /// The input does not parse. Position is in the input text.
    #[error("{message} ({position})")]
    Syntax { message: String, position: Position },

    /// The transform failed for reasons unrelated to the input's syntax.
    #[error("Transform error: {0}")]
    Internal(String),
}

/// Errors loading compiler configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown compatibility mode: {0}")]
    UnknownMode(String),
}
