//! Error normalization.
//!
//! Engines report positions against the exact text they were handed. This
//! module moves those positions back: first out of the prologue, then through
//! the transform's position map, and renders an excerpt from whichever text
//! the final position refers to.

use crate::error::{CompileError, EngineError, ErrorKind, Origin};
use crate::position::Position;
use crate::transform::TransformResult;
use crate::wrapper::{Region, WrappedSource};

/// Everything known about the request an engine error came from.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    pub source_name: &'a str,
    /// The text the user wrote.
    pub source_text: &'a str,
    /// Present when the body was lowered.
    pub transform: Option<&'a TransformResult>,
    pub wrapped: &'a WrappedSource,
}

/// Convert an engine error raised while parsing or running `ctx.wrapped`.
///
/// A syntax error reported as [`ErrorKind::OriginalSyntax`] that falls into
/// the prologue or epilogue is reclassified as [`ErrorKind::WrappedSyntax`].
/// Syntax errors without a position (truncated input) are placed at the end
/// of the final text.
pub fn normalize(raw: &EngineError, kind: ErrorKind, ctx: &NormalizeContext<'_>) -> CompileError {
    let position = match raw.position {
        Some(position) => position,
        None if kind.is_syntax() => ctx.wrapped.end(),
        None => return CompileError::unpositioned(kind, raw.message.clone(), ctx.source_name),
    };

    let located = |kind, position: Position, text: &str, origin| CompileError {
        kind,
        message: raw.message.clone(),
        source_name: ctx.source_name.to_string(),
        line: position.line,
        column: position.column,
        excerpt: excerpt(text, position),
        origin,
    };

    let error = match ctx.wrapped.locate(position) {
        Region::Body(body) => match ctx.transform {
            Some(transform) => match transform.position_map.lookup(body) {
                Some(original) => located(kind, original, ctx.source_text, Origin::Source),
                None => located(
                    kind,
                    body,
                    &transform.transformed_text,
                    Origin::Synthetic,
                ),
            },
            None => located(kind, body, ctx.source_text, Origin::Source),
        },
        Region::Prologue | Region::Epilogue => {
            let kind = match kind {
                ErrorKind::OriginalSyntax => ErrorKind::WrappedSyntax,
                other => other,
            };
            located(kind, position, &ctx.wrapped.final_text, Origin::Synthetic)
        }
    };

    tracing::debug!(
        source_name = ctx.source_name,
        reported = %position,
        normalized_line = error.line,
        normalized_column = error.column,
        origin = ?error.origin,
        "normalized engine error"
    );
    error
}

/// Convert an engine error raised by code the pipeline generated on its own,
/// such as the helper preprogram. Positions stay relative to `text`.
pub fn normalize_synthetic(
    raw: &EngineError,
    kind: ErrorKind,
    source_name: &str,
    text: &str,
) -> CompileError {
    match raw.position {
        Some(position) => CompileError {
            kind,
            message: raw.message.clone(),
            source_name: source_name.to_string(),
            line: position.line,
            column: position.column,
            excerpt: excerpt(text, position),
            origin: Origin::Synthetic,
        },
        None => CompileError::unpositioned(kind, raw.message.clone(), source_name),
    }
}

/// Render line `position.line` of `text` with a caret under `position.column`.
///
/// ```text
/// > 1 | 1+(=>2)()
///     |    ^
/// ```
pub fn excerpt(text: &str, position: Position) -> String {
    let line = text
        .split('\n')
        .nth(position.line.saturating_sub(1) as usize)
        .unwrap_or_default();
    let line = line.strip_suffix('\r').unwrap_or(line);

    let number = position.line.to_string();
    let gutter = " ".repeat(number.len());

    // Keep tabs so the caret lines up in terminals.
    let mut pad: String = line
        .chars()
        .take(position.column.saturating_sub(1) as usize)
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    let missing = position.column.saturating_sub(1) as usize - pad.chars().count();
    pad.extend(std::iter::repeat_n(' ', missing));

    format!("> {number} | {line}\n  {gutter} | {pad}^")
}
