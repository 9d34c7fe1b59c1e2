//! Compiler facade.
//!
//! Drives a request through the pipeline: the compatibility selector decides
//! whether to lower, the invoker lowers, the wrapper adds the caller's
//! prologue and epilogue, and the program builder hands the result to the
//! engine. Every failure leaves through the error normalizer.

use std::time::Instant;

use crate::builder::build;
use crate::compat::{self, CompatibilityMode};
use crate::config::CompilerConfig;
use crate::engine::Engine;
use crate::error::{CompileResult, ErrorKind};
use crate::normalize::{NormalizeContext, normalize, normalize_synthetic};
use crate::transform::{Lowering, SwcLowering, TransformResult, transform};
use crate::wrapper::{WrappedSource, wrap};

/// A single script to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub source_text: String,
    pub source_name: String,
    pub prologue: String,
    pub epilogue: String,
    pub strict_mode_requested: bool,
    pub compatibility_mode: CompatibilityMode,
}

impl CompileRequest {
    /// Request with no prologue or epilogue, strict parsing and
    /// [`CompatibilityMode::Modern`].
    pub fn new(source_text: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self::from_config(source_text, source_name, &CompilerConfig::default())
    }

    /// Request seeded with the defaults of `config`.
    pub fn from_config(
        source_text: impl Into<String>,
        source_name: impl Into<String>,
        config: &CompilerConfig,
    ) -> Self {
        Self {
            source_text: source_text.into(),
            source_name: source_name.into(),
            prologue: String::new(),
            epilogue: String::new(),
            strict_mode_requested: config.strict,
            compatibility_mode: config.compatibility_mode,
        }
    }

    pub fn prologue(mut self, prologue: impl Into<String>) -> Self {
        self.prologue = prologue.into();
        self
    }

    pub fn epilogue(mut self, epilogue: impl Into<String>) -> Self {
        self.epilogue = epilogue.into();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_mode_requested = strict;
        self
    }

    pub fn mode(mut self, mode: CompatibilityMode) -> Self {
        self.compatibility_mode = mode;
        self
    }
}

/// Entry point of the pipeline.
///
/// Holds only configuration and the lowering capability, so one compiler can
/// serve any number of requests. Each request brings its own engine.
#[derive(Debug, Clone)]
pub struct Compiler<L = SwcLowering> {
    config: CompilerConfig,
    lowering: L,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            config,
            lowering: SwcLowering,
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

impl<L: Lowering> Compiler<L> {
    /// Compiler using a custom lowering capability.
    pub fn with_lowering(config: CompilerConfig, lowering: L) -> Self {
        Self { config, lowering }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// New request using this compiler's defaults.
    pub fn request(
        &self,
        source_text: impl Into<String>,
        source_name: impl Into<String>,
    ) -> CompileRequest {
        CompileRequest::from_config(source_text, source_name, &self.config)
    }

    /// Lower `source` without building a program.
    ///
    /// Always runs the transform, whatever the configured compatibility mode.
    pub fn preprocess(&self, source: &str, source_name: &str) -> CompileResult<TransformResult> {
        transform(
            &self.lowering,
            source,
            source_name,
            &self.config.lower_options(),
        )
    }

    /// Compile `request` into a program for `engine`.
    ///
    /// When lowering introduced helper calls, the helper declarations are
    /// built as a separate preprogram that must run first; see
    /// [`Compilation::run`].
    pub fn compile<E: Engine>(
        &self,
        engine: &mut E,
        request: &CompileRequest,
    ) -> CompileResult<Compilation<E>> {
        let start = Instant::now();
        let name = request.source_name.as_str();
        let strict = request.strict_mode_requested;

        let selection = compat::select(request.compatibility_mode, &request.source_text, name);
        let transform = if selection.will_transform {
            Some(self.preprocess(&request.source_text, name)?)
        } else {
            None
        };

        let body = match &transform {
            Some(result) => result.transformed_text.clone(),
            None => request.source_text.clone(),
        };
        let wrapped = wrap(body, &request.prologue, &request.epilogue);

        let helpers = transform.as_ref().and_then(|t| t.helpers.as_deref());
        let preprogram = match helpers {
            Some(text) => Some(build(engine, text, name, strict).map_err(|e| {
                normalize_synthetic(&e, ErrorKind::TransformFailure, name, text)
            })?),
            None => None,
        };

        // Without a transform the engine is the first to parse the user's text.
        let syntax_kind = if transform.is_some() {
            ErrorKind::WrappedSyntax
        } else {
            ErrorKind::OriginalSyntax
        };
        let program = build(engine, &wrapped.final_text, name, strict).map_err(|e| {
            let ctx = NormalizeContext {
                source_name: name,
                source_text: &request.source_text,
                transform: transform.as_ref(),
                wrapped: &wrapped,
            };
            normalize(&e, syntax_kind, &ctx)
        })?;

        tracing::debug!(
            source_name = name,
            mode = %request.compatibility_mode,
            transformed = transform.is_some(),
            preprogram = preprogram.is_some(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "compiled script"
        );

        Ok(Compilation {
            program,
            preprogram,
            source_name: request.source_name.clone(),
            source_text: request.source_text.clone(),
            transform,
            wrapped,
        })
    }
}

/// A compiled script, ready to run.
pub struct Compilation<E: Engine> {
    pub program: E::Program,
    /// Helper declarations the program depends on.
    pub preprogram: Option<E::Program>,
    source_name: String,
    source_text: String,
    transform: Option<TransformResult>,
    wrapped: WrappedSource,
}

impl<E: Engine> Compilation<E> {
    /// Exact text handed to the engine for the main program.
    pub fn final_code(&self) -> &str {
        &self.wrapped.final_text
    }

    /// Text of the preprogram, if any.
    pub fn helpers(&self) -> Option<&str> {
        self.transform.as_ref().and_then(|t| t.helpers.as_deref())
    }

    pub fn transform(&self) -> Option<&TransformResult> {
        self.transform.as_ref()
    }

    pub fn wrapped(&self) -> &WrappedSource {
        &self.wrapped
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Run the preprogram, then the program, on `engine`.
    ///
    /// `engine` must be the one the compilation was built for.
    pub fn run(&self, engine: &mut E) -> CompileResult<E::Value> {
        if let (Some(preprogram), Some(text)) = (&self.preprogram, self.helpers()) {
            engine.run(preprogram).map_err(|e| {
                normalize_synthetic(&e, ErrorKind::PreprogramRuntime, &self.source_name, text)
            })?;
        }

        engine.run(&self.program).map_err(|e| {
            let ctx = NormalizeContext {
                source_name: &self.source_name,
                source_text: &self.source_text,
                transform: self.transform.as_ref(),
                wrapped: &self.wrapped,
            };
            normalize(&e, ErrorKind::Runtime, &ctx)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BoaEngine;
    use crate::error::{LowerError, Origin};
    use crate::position::{Position, PositionMap};
    use crate::transform::{LowerOptions, Lowered, STRICT_MODE_LITERAL};

    /// Lowering that returns its input unchanged, mapped line by line.
    struct IdentityLowering;

    impl Lowering for IdentityLowering {
        fn lower(
            &self,
            source: &str,
            _source_name: &str,
            _options: &LowerOptions,
        ) -> Result<Lowered, LowerError> {
            let mut position_map = PositionMap::new();
            for line in 1..=source.lines().count() as u32 {
                position_map.push(Position::new(line, 1), Position::new(line, 1));
            }
            Ok(Lowered {
                code: source.to_string(),
                position_map,
                helpers: None,
                source_map: None,
            })
        }
    }

    struct FailingLowering;

    impl Lowering for FailingLowering {
        fn lower(&self, _: &str, _: &str, _: &LowerOptions) -> Result<Lowered, LowerError> {
            Err(LowerError::Internal("out of cheese".to_string()))
        }
    }

    #[test]
    fn test_request_builder() {
        let request = CompileRequest::new("1", "a.js")
            .prologue("(")
            .epilogue(")")
            .strict(false)
            .mode(CompatibilityMode::Legacy);
        assert_eq!(request.prologue, "(");
        assert_eq!(request.epilogue, ")");
        assert!(!request.strict_mode_requested);
        assert_eq!(request.compatibility_mode, CompatibilityMode::Legacy);
    }

    #[test]
    fn test_request_from_config() {
        let compiler = Compiler::new(CompilerConfig::new().mode(CompatibilityMode::Auto).strict(false));
        let request = compiler.request("x", "a.js");
        assert_eq!(request.compatibility_mode, CompatibilityMode::Auto);
        assert!(!request.strict_mode_requested);
    }

    #[test]
    fn test_custom_lowering() {
        let compiler = Compiler::with_lowering(CompilerConfig::default(), IdentityLowering);
        let result = compiler.preprocess("a;\nb;", "a.js").unwrap();
        assert_eq!(result.transformed_text, format!("{STRICT_MODE_LITERAL}a;\nb;"));
        assert_eq!(
            result.position_map.lookup(Position::new(2, 1)),
            Some(Position::new(2, 1))
        );
    }

    #[test]
    fn test_transform_failure_surfaces() {
        let compiler = Compiler::with_lowering(CompilerConfig::default(), FailingLowering);
        let mut engine = BoaEngine::new();
        let err = compiler
            .compile(&mut engine, &CompileRequest::new("1", "a.js"))
            .err()
            .expect("lowering fails");
        assert_eq!(err.kind, ErrorKind::TransformFailure);
        assert_eq!(err.origin, Origin::Unknown);
        assert!(err.message.contains("out of cheese"));
    }

    #[test]
    fn test_legacy_syntax_error_is_original() {
        let compiler = Compiler::default();
        let mut engine = BoaEngine::new();
        let request = CompileRequest::new("var a = 1;\nvar = 2;", "a.js").mode(CompatibilityMode::Legacy);
        let err = compiler.compile(&mut engine, &request).err().expect("syntax error");
        assert_eq!(err.kind, ErrorKind::OriginalSyntax);
        assert_eq!(err.line, 2);
        assert!(err.is_in_source());
    }

    #[test]
    fn test_wrapper_syntax_error_is_reported_against_final_text() {
        let compiler = Compiler::default();
        let mut engine = BoaEngine::new();
        let request = CompileRequest::new("1", "a.js")
            .mode(CompatibilityMode::Legacy)
            .prologue("var = (\n");
        let err = compiler.compile(&mut engine, &request).err().expect("syntax error");
        assert_eq!(err.kind, ErrorKind::WrappedSyntax);
        assert_eq!(err.origin, Origin::Synthetic);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_runtime_error_kind() {
        let compiler = Compiler::default();
        let mut engine = BoaEngine::new();
        let request = CompileRequest::new("let x = 1;\nthrow new Error('nope');", "a.js");
        let compilation = compiler.compile(&mut engine, &request).unwrap();
        let err = compilation.run(&mut engine).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Runtime);
        assert!(err.message.contains("nope"));
        assert!(err.is_in_source());
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_native_runtime_error_is_unpositioned() {
        let compiler = Compiler::default();
        let mut engine = BoaEngine::new();
        let request = CompileRequest::new("let x = 1;\nundefinedFn(x);", "a.js");
        let compilation = compiler.compile(&mut engine, &request).unwrap();
        let err = compilation.run(&mut engine).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Runtime);
        assert_eq!(err.origin, Origin::Unknown);
        assert_eq!((err.line, err.column), (0, 0));
        assert!(err.excerpt.is_empty());
    }

    #[test]
    fn test_preprogram_failure_is_reported() {
        struct ThrowingHelpers;

        impl Lowering for ThrowingHelpers {
            fn lower(&self, source: &str, _: &str, _: &LowerOptions) -> Result<Lowered, LowerError> {
                Ok(Lowered {
                    code: source.to_string(),
                    position_map: PositionMap::new(),
                    helpers: Some("throw new Error('helper broke');".to_string()),
                    source_map: None,
                })
            }
        }

        let compiler = Compiler::with_lowering(CompilerConfig::default(), ThrowingHelpers);
        let mut engine = BoaEngine::new();
        let compilation = compiler
            .compile(&mut engine, &CompileRequest::new("1", "a.js"))
            .unwrap();
        assert!(compilation.preprogram.is_some());
        let err = compilation.run(&mut engine).unwrap_err();
        assert_eq!(err.kind, ErrorKind::PreprogramRuntime);
        assert!(err.message.contains("helper broke"));
        assert_ne!(err.origin, Origin::Source);
    }
}
