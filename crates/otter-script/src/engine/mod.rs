//! Execution engine seam.
//!
//! The pipeline never runs JavaScript itself. It hands final text to an
//! [`Engine`], which parses it into a program handle and later runs it. All
//! positions an engine reports are relative to the text it was given.

pub mod boa;

pub use boa::BoaEngine;

use crate::error::EngineError;

/// A JavaScript engine able to compile and run classic scripts.
pub trait Engine {
    /// Compiled, not yet evaluated script.
    type Program;
    /// Completion value of a run.
    type Value;

    /// Parse `source` into a program. Syntax errors carry the position the
    /// engine reported against `source`.
    fn parse(
        &mut self,
        source: &str,
        source_name: &str,
        strict: bool,
    ) -> Result<Self::Program, EngineError>;

    /// Evaluate a parsed program in the engine's global scope.
    fn run(&mut self, program: &Self::Program) -> Result<Self::Value, EngineError>;

    /// Parse and run `source` in one step.
    fn eval(
        &mut self,
        source: &str,
        source_name: &str,
        strict: bool,
    ) -> Result<Self::Value, EngineError> {
        let program = self.parse(source, source_name, strict)?;
        self.run(&program)
    }
}
