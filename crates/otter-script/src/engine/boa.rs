//! [`Engine`] backed by the Boa interpreter.

use std::path::Path;
use std::sync::LazyLock;

use boa_engine::{Context, JsError, JsValue, Script, Source};
use regex::Regex;

use super::Engine;
use crate::error::EngineError;
use crate::position::Position;

/// Position suffix Boa's parser appends to syntax error messages.
static PARSE_POSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+at line (\d+), col (\d+)").expect("valid regex")
});

/// Trailing `(path:line:col)` Boa appends to errors thrown by bytecode.
static RUNTIME_POSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s\(([^()]*):(\d+):(\d+)\)$").expect("valid regex")
});

/// Trailing `(native ...)` frame, which carries no script position.
static NATIVE_FRAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s\(native[^()]*\)$").expect("valid regex"));

/// A Boa context holding one global scope.
///
/// Programs parsed by this engine share the context, so a preprogram run
/// before the main program leaves its declarations visible to it.
///
/// Positions come from the text of Boa's errors. Syntax errors and values
/// thrown by script code carry one. Errors Boa raises natively at runtime
/// (`ReferenceError`, `TypeError` and the like) do not, so they are reported
/// with no position.
pub struct BoaEngine {
    context: Context,
}

impl Default for BoaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BoaEngine {
    pub fn new() -> Self {
        Self {
            context: Context::default(),
        }
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Call `function` with `undefined` as receiver.
    pub fn call(&mut self, function: &JsValue, args: &[JsValue]) -> Result<JsValue, EngineError> {
        let callable = function
            .as_callable()
            .ok_or_else(|| EngineError::new("TypeError: value is not callable", None))?;
        callable
            .call(&JsValue::undefined(), args, &mut self.context)
            .map_err(|e| engine_error(e, &mut self.context))
    }
}

impl Engine for BoaEngine {
    type Program = Script;
    type Value = JsValue;

    fn parse(
        &mut self,
        source: &str,
        source_name: &str,
        strict: bool,
    ) -> Result<Script, EngineError> {
        self.context.strict(strict);
        let path = Path::new(source_name);
        let src = Source::from_bytes(source).with_path(path);
        Script::parse(src, None, &mut self.context).map_err(|e| engine_error(e, &mut self.context))
    }

    fn run(&mut self, program: &Script) -> Result<JsValue, EngineError> {
        program
            .evaluate(&mut self.context)
            .map_err(|e| engine_error(e, &mut self.context))
    }
}

fn engine_error(err: JsError, context: &mut Context) -> EngineError {
    let rendered = match err.try_native(context) {
        Ok(native) => native.to_string(),
        Err(_) => err.to_string(),
    };
    let first_line = rendered.lines().next().unwrap_or_default();
    split_position(first_line)
}

/// Separate the position Boa embeds in an error message from the message.
fn split_position(rendered: &str) -> EngineError {
    let message = NATIVE_FRAME.replace(rendered, "");

    if let Some(caps) = PARSE_POSITION.captures(&message) {
        let position = position_from(&caps[1], &caps[2]);
        let message = PARSE_POSITION.replace(&message, "");
        return EngineError::new(message.trim_end(), position);
    }

    if let Some(caps) = RUNTIME_POSITION.captures(&message) {
        let position = position_from(&caps[2], &caps[3]);
        let message = RUNTIME_POSITION.replace(&message, "");
        return EngineError::new(message.trim_end(), position);
    }

    EngineError::new(message.trim_end(), None)
}

fn position_from(line: &str, column: &str) -> Option<Position> {
    let line = line.parse().ok()?;
    let column = column.parse().ok()?;
    Some(Position::new(line, column))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_parse_position() {
        let err = split_position("SyntaxError: unexpected token '=>', primary expression at line 1, col 4");
        assert_eq!(err.position, Some(Position::new(1, 4)));
        assert_eq!(err.message, "SyntaxError: unexpected token '=>', primary expression");
    }

    #[test]
    fn test_split_runtime_position() {
        let err = split_position("Error: boom (script.js:3:7)");
        assert_eq!(err.position, Some(Position::new(3, 7)));
        assert_eq!(err.message, "Error: boom");
    }

    #[test]
    fn test_split_native_frame() {
        let err = split_position("TypeError: not a function (native at src/lib.rs:10:5)");
        assert_eq!(err.position, None);
        assert_eq!(err.message, "TypeError: not a function");
    }

    #[test]
    fn test_split_without_position() {
        let err = split_position("42");
        assert_eq!(err, EngineError::new("42", None));
    }

    #[test]
    fn test_eval_returns_completion_value() {
        let mut engine = BoaEngine::new();
        let value = engine.eval("1 + 2", "test.js", false).unwrap();
        assert_eq!(value.as_number(), Some(3.0));
    }

    #[test]
    fn test_programs_share_global_scope() {
        let mut engine = BoaEngine::new();
        engine.eval("var shared = 40;", "a.js", false).unwrap();
        let value = engine.eval("shared + 2", "b.js", false).unwrap();
        assert_eq!(value.as_number(), Some(42.0));
    }

    #[test]
    fn test_parse_error_has_position() {
        let mut engine = BoaEngine::new();
        let err = engine.parse("var a = 1;\nvar b = ;", "test.js", false).unwrap_err();
        assert!(err.message.starts_with("SyntaxError"));
        assert_eq!(err.position.map(|p| p.line), Some(2));
    }

    #[test]
    fn test_strict_parse() {
        let mut engine = BoaEngine::new();
        assert!(engine.parse("with ({}) {}", "test.js", false).is_ok());
        assert!(engine.parse("with ({}) {}", "test.js", true).is_err());
    }

    #[test]
    fn test_thrown_error_message() {
        let mut engine = BoaEngine::new();
        let err = engine
            .eval("var a = 1;\nthrow new Error('boom');", "test.js", false)
            .unwrap_err();
        assert!(err.message.contains("boom"));
        assert_eq!(err.position.map(|p| p.line), Some(2));
    }

    #[test]
    fn test_native_runtime_error_has_no_position() {
        let mut engine = BoaEngine::new();
        let err = engine.eval("undefinedFn();", "test.js", false).unwrap_err();
        assert!(err.message.starts_with("ReferenceError"));
        assert_eq!(err.position, None);
    }

    #[test]
    fn test_truncated_input_has_no_position() {
        let mut engine = BoaEngine::new();
        let err = engine.parse("function f() {", "test.js", false).unwrap_err();
        assert!(err.message.starts_with("SyntaxError"));
        assert_eq!(err.position, None);
    }

    #[test]
    fn test_call_function_value() {
        let mut engine = BoaEngine::new();
        let double = engine.eval("(function (x) { return x * 2; })", "test.js", false).unwrap();
        let value = engine.call(&double, &[JsValue::from(21)]).unwrap();
        assert_eq!(value.as_number(), Some(42.0));
        assert!(engine.call(&JsValue::undefined(), &[]).is_err());
    }
}
