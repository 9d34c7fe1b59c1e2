//! Dialect lowering.
//!
//! [`Lowering`] is the seam to the source-to-source transform. [`SwcLowering`]
//! implements it with SWC: the script is parsed, run through the ES2022 to
//! ES5 compat passes and printed back while the emitter records where every node
//! came from.
//!
//! [`transform`] is the invoker the compiler calls. It turns lowering failures
//! into [`CompileError`]s and prefixes the strict-mode literal.

use serde::{Deserialize, Serialize};
use swc_common::{
    BytePos, FileName, GLOBALS, Globals, LineCol, Mark, SourceFile, SourceMap, Spanned,
    comments::SingleThreadedComments, sync::Lrc,
};
use swc_ecma_ast::{EsVersion, Program, Script};
use swc_ecma_codegen::{Config as CodegenConfig, Emitter, text_writer::JsWriter};
use swc_ecma_compat_es2015::es2015;
use swc_ecma_compat_es2016::es2016;
use swc_ecma_compat_es2017::es2017;
use swc_ecma_compat_es2018::es2018;
use swc_ecma_compat_es2019::es2019;
use swc_ecma_compat_es2020::es2020;
use swc_ecma_compat_es2021::es2021;
use swc_ecma_compat_es2022::es2022;
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, lexer::Lexer};
use swc_ecma_transforms_base::{
    fixer::fixer,
    helpers::{HELPERS, Helpers, inject_helpers},
    hygiene::hygiene,
    resolver,
};
use swc_ecma_visit::VisitMutWith;

use crate::error::{CompileError, CompileResult, ErrorKind, LowerError, Origin};
use crate::normalize::excerpt;
use crate::position::{Position, PositionMap, Segment};

/// Directive prepended to every lowered script.
pub const STRICT_MODE_LITERAL: &str = "\"use strict\";";

/// Dialect the execution engine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetDialect {
    /// ECMAScript 5.1: everything from ES2015 through ES2022 is rewritten.
    #[default]
    Es5,
    /// ECMAScript 2015: the script is validated and reprinted only.
    Es2015,
}

impl TargetDialect {
    pub fn es_version(&self) -> EsVersion {
        match self {
            Self::Es5 => EsVersion::Es5,
            Self::Es2015 => EsVersion::Es2015,
        }
    }
}

/// Options passed to the lowering capability.
#[derive(Debug, Clone, Default)]
pub struct LowerOptions {
    pub target: TargetDialect,
    /// Also produce a Source Map v3 document.
    pub source_map: bool,
}

/// Output of a lowering run.
#[derive(Debug, Clone)]
pub struct Lowered {
    pub code: String,
    pub position_map: PositionMap,
    /// Helper declarations the lowered code calls into, if any.
    pub helpers: Option<String>,
    /// Source Map v3 JSON for `code`.
    pub source_map: Option<String>,
}

/// A source-to-source transform from a modern dialect to an older one.
///
/// Implementations must be deterministic and must not share state between
/// invocations; the compiler may call them concurrently.
pub trait Lowering {
    fn lower(
        &self,
        source: &str,
        source_name: &str,
        options: &LowerOptions,
    ) -> Result<Lowered, LowerError>;
}

/// [`Lowering`] backed by SWC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwcLowering;

impl Lowering for SwcLowering {
    fn lower(
        &self,
        source: &str,
        source_name: &str,
        options: &LowerOptions,
    ) -> Result<Lowered, LowerError> {
        let cm: Lrc<SourceMap> = Default::default();
        let fm = cm.new_source_file(
            Lrc::new(FileName::Custom(source_name.to_string())),
            source.to_string(),
        );

        let script = parse_script(&cm, &fm)?;
        let target = options.target.es_version();

        GLOBALS.set(&Globals::default(), || {
            HELPERS.set(&Helpers::new(false), || {
                let unresolved_mark = Mark::new();
                let top_level_mark = Mark::new();

                let mut program = Program::Script(script);
                program.visit_mut_with(&mut resolver(unresolved_mark, top_level_mark, false));
                if options.target == TargetDialect::Es5 {
                    // Newest first: later passes only understand older syntax.
                    program.mutate(es2022(Default::default(), unresolved_mark));
                    program.mutate(es2021());
                    program.mutate(es2020(Default::default(), unresolved_mark));
                    program.mutate(es2019());
                    program.mutate(es2018(Default::default()));
                    program.mutate(es2017(Default::default(), unresolved_mark));
                    program.mutate(es2016());
                    program.mutate(es2015(
                        unresolved_mark,
                        None::<SingleThreadedComments>,
                        Default::default(),
                    ));
                }
                program.visit_mut_with(&mut hygiene());
                program.visit_mut_with(&mut fixer(None));

                let Program::Script(script) = program else {
                    return Err(LowerError::Internal(
                        "Expected script, got module".to_string(),
                    ));
                };

                let mut mappings = vec![];
                let code = emit(&cm, &script, target, Some(&mut mappings))?;
                let position_map = build_position_map(&cm, &fm, &code, &mappings);

                let source_map = if options.source_map {
                    let mut map_buf = vec![];
                    cm.build_source_map(
                        &mappings,
                        None,
                        swc_common::source_map::DefaultSourceMapGenConfig,
                    )
                    .to_writer(&mut map_buf)
                    .map_err(|e| LowerError::Internal(format!("Failed to write source map: {e}")))?;
                    Some(String::from_utf8(map_buf).map_err(|e| {
                        LowerError::Internal(format!("Invalid UTF-8 source map: {e}"))
                    })?)
                } else {
                    None
                };

                // Helpers recorded by the passes above are emitted as their own script.
                let mut shim = Program::Script(Script::default());
                shim.mutate(inject_helpers(unresolved_mark));
                let helpers = match shim {
                    Program::Script(shim) if !shim.body.is_empty() => {
                        Some(emit(&cm, &shim, target, None)?)
                    }
                    _ => None,
                };

                Ok(Lowered {
                    code,
                    position_map,
                    helpers,
                    source_map,
                })
            })
        })
    }
}

/// Parse `fm` as a classic script, reporting the first error with its
/// position in the source.
pub(crate) fn parse_script(cm: &SourceMap, fm: &SourceFile) -> Result<Script, LowerError> {
    let lexer = Lexer::new(
        Syntax::Es(EsSyntax::default()),
        EsVersion::EsNext,
        StringInput::from(fm),
        None,
    );
    let mut parser = Parser::new_from(lexer);

    let syntax_error = |e: swc_ecma_parser::error::Error| LowerError::Syntax {
        message: e.kind().msg().to_string(),
        position: source_position(cm, fm, e.span().lo).unwrap_or(Position::new(1, 1)),
    };

    let script = parser.parse_script().map_err(syntax_error)?;
    if let Some(e) = parser.take_errors().into_iter().next() {
        return Err(syntax_error(e));
    }
    Ok(script)
}

fn emit(
    cm: &Lrc<SourceMap>,
    script: &Script,
    target: EsVersion,
    mappings: Option<&mut Vec<(BytePos, LineCol)>>,
) -> Result<String, LowerError> {
    let mut buf = vec![];
    {
        let writer = JsWriter::new(cm.clone(), "\n", &mut buf, mappings);

        let codegen_config = CodegenConfig::default()
            .with_target(target)
            .with_ascii_only(false)
            .with_minify(false)
            .with_omit_last_semi(false);

        let mut emitter = Emitter {
            cfg: codegen_config,
            cm: cm.clone(),
            comments: None,
            wr: writer,
        };

        emitter
            .emit_script(script)
            .map_err(|e| LowerError::Internal(format!("Failed to emit code: {e}")))?;
    }

    String::from_utf8(buf).map_err(|e| LowerError::Internal(format!("Invalid UTF-8 output: {e}")))
}

/// Original position of `pos`, when it lies inside `fm`.
fn source_position(cm: &SourceMap, fm: &SourceFile, pos: BytePos) -> Option<Position> {
    if pos.is_dummy() || pos < fm.start_pos || pos > fm.end_pos {
        return None;
    }
    let loc = cm.try_lookup_char_pos(pos).ok()?;
    Some(Position::new(loc.line as u32, loc.col.0 as u32 + 1))
}

fn build_position_map(
    cm: &SourceMap,
    fm: &SourceFile,
    code: &str,
    mappings: &[(BytePos, LineCol)],
) -> PositionMap {
    let lines: Vec<&str> = code.split('\n').collect();
    mappings
        .iter()
        .filter_map(|&(pos, generated)| {
            let original = source_position(cm, fm, pos)?;
            let line_text = lines.get(generated.line as usize).copied().unwrap_or_default();
            Some(Segment {
                generated: Position::new(
                    generated.line + 1,
                    utf16_to_char_column(line_text, generated.col) + 1,
                ),
                original,
            })
        })
        .collect()
}

/// Convert a 0-based UTF-16 column on `line` to a 0-based character column.
fn utf16_to_char_column(line: &str, utf16: u32) -> u32 {
    let mut units = 0;
    let mut chars = 0;
    for c in line.chars() {
        if units >= utf16 {
            break;
        }
        units += c.len_utf16() as u32;
        chars += 1;
    }
    chars + utf16.saturating_sub(units)
}

/// Result of running the invoker on one script.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    /// Lowered text, starting with [`STRICT_MODE_LITERAL`].
    pub transformed_text: String,
    /// Maps `transformed_text` positions to the original source.
    pub position_map: PositionMap,
    /// Helper declarations to evaluate before the program.
    pub helpers: Option<String>,
    /// Source Map v3 (index map) for `transformed_text`.
    pub source_map: Option<String>,
}

/// Lower `source` and prefix the strict-mode literal.
pub fn transform<L: Lowering + ?Sized>(
    lowering: &L,
    source: &str,
    source_name: &str,
    options: &LowerOptions,
) -> CompileResult<TransformResult> {
    let lowered = lowering
        .lower(source, source_name, options)
        .map_err(|e| match e {
            LowerError::Syntax { message, position } => CompileError {
                kind: ErrorKind::OriginalSyntax,
                message,
                source_name: source_name.to_string(),
                line: position.line,
                column: position.column,
                excerpt: excerpt(source, position),
                origin: Origin::Source,
            },
            LowerError::Internal(message) => {
                CompileError::unpositioned(ErrorKind::TransformFailure, message, source_name)
            }
        })?;

    let prefix_columns = STRICT_MODE_LITERAL.chars().count() as u32;
    let source_map = lowered
        .source_map
        .map(|map| offset_source_map(&map, prefix_columns))
        .transpose()
        .map_err(|e| {
            CompileError::unpositioned(
                ErrorKind::TransformFailure,
                format!("Invalid source map: {e}"),
                source_name,
            )
        })?;

    let mut transformed_text = String::with_capacity(STRICT_MODE_LITERAL.len() + lowered.code.len());
    transformed_text.push_str(STRICT_MODE_LITERAL);
    transformed_text.push_str(&lowered.code);

    tracing::debug!(
        source_name,
        input_len = source.len(),
        output_len = transformed_text.len(),
        segments = lowered.position_map.len(),
        helpers = lowered.helpers.is_some(),
        "lowered script"
    );

    Ok(TransformResult {
        transformed_text,
        position_map: lowered.position_map.offset(0, prefix_columns),
        helpers: lowered.helpers,
        source_map,
    })
}

/// Wrap a source map in an index map whose single section starts after the
/// inserted prefix.
fn offset_source_map(map: &str, columns: u32) -> Result<String, serde_json::Error> {
    let map: serde_json::Value = serde_json::from_str(map)?;
    serde_json::to_string(&serde_json::json!({
        "version": 3,
        "sections": [{
            "offset": { "line": 0, "column": columns },
            "map": map,
        }],
    }))
}
