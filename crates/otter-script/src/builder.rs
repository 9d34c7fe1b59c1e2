//! Program building.

use crate::engine::Engine;
use crate::error::EngineError;

/// Ask `engine` to parse `final_text` into a program.
///
/// Errors are returned raw; positions still refer to `final_text`.
pub fn build<E: Engine + ?Sized>(
    engine: &mut E,
    final_text: &str,
    source_name: &str,
    strict: bool,
) -> Result<E::Program, EngineError> {
    let program = engine.parse(final_text, source_name, strict);
    match &program {
        Ok(_) => tracing::debug!(source_name, strict, len = final_text.len(), "built program"),
        Err(e) => tracing::debug!(source_name, strict, error = %e, "engine rejected program"),
    }
    program
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BoaEngine;
    use crate::position::Position;

    #[test]
    fn test_build_valid_program() {
        let mut engine = BoaEngine::new();
        let program = build(&mut engine, "1 + 1", "test.js", true).unwrap();
        let value = engine.run(&program).unwrap();
        assert_eq!(value.as_number(), Some(2.0));
    }

    #[test]
    fn test_build_reports_final_text_position() {
        let mut engine = BoaEngine::new();
        let err = build(&mut engine, "\n\nvar = 1;", "test.js", false).unwrap_err();
        assert_eq!(err.position.map(|p: Position| p.line), Some(3));
    }
}
