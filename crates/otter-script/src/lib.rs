//! otter-script - script compilation pipeline for Otter.
//!
//! Turns user-authored JavaScript, possibly written with ES2015+ syntax the
//! execution engine does not accept, into a program the engine can run, and
//! maps every error back to the line and column the user wrote.
//!
//! # Pipeline
//!
//! ```text
//! CompileRequest
//!       ↓
//! Compatibility selector ── Legacy ──────────────┐
//!       ↓ Modern / Auto                          │
//! Transform invoker (SWC lowering + "use strict") │
//!       ↓                                        ↓
//! Wrapper (prologue + body + epilogue) ←─────────┘
//!       ↓
//! Program builder (Engine::parse)
//!       ↓
//! Compilation { program, preprogram }
//! ```
//!
//! Failures at any stage come back as a [`CompileError`] whose position has
//! been moved out of the prologue and through the transform's position map.
//!
//! # Example
//!
//! ```
//! use otter_script::{BoaEngine, CompatibilityMode, CompileRequest, Compiler};
//!
//! let compiler = Compiler::default();
//! let mut engine = BoaEngine::new();
//!
//! let request = CompileRequest::new("let [a, b] = [1, 2]; a + b", "sum.js")
//!     .mode(CompatibilityMode::Modern);
//! let compilation = compiler.compile(&mut engine, &request).unwrap();
//! assert!(compilation.final_code().starts_with("\"use strict\";"));
//!
//! let value = compilation.run(&mut engine).unwrap();
//! assert_eq!(value.as_number(), Some(3.0));
//! ```

pub mod builder;
pub mod compat;
pub mod compiler;
pub mod config;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod position;
pub mod transform;
pub mod wrapper;

pub use compat::{CompatibilityMode, Selection};
pub use compiler::{Compilation, CompileRequest, Compiler};
pub use config::CompilerConfig;
pub use dialect::{Dialect, DialectReport, Feature};
pub use engine::{BoaEngine, Engine};
pub use error::{CompileError, CompileResult, ConfigError, EngineError, ErrorKind, LowerError, Origin};
pub use position::{Position, PositionMap, Segment};
pub use transform::{
    LowerOptions, Lowered, Lowering, STRICT_MODE_LITERAL, SwcLowering, TargetDialect,
    TransformResult,
};
pub use wrapper::{Region, WrappedSource};
