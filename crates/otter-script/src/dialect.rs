//! Dialect detection.
//!
//! Scans a script for syntax newer than ECMAScript 5.1. Used by
//! [`CompatibilityMode::Auto`](crate::CompatibilityMode::Auto) to skip the
//! lowering transform for scripts that do not need it.

use std::collections::BTreeSet;
use std::fmt;

use swc_common::{FileName, SourceMap, sync::Lrc};
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

use crate::error::LowerError;
use crate::transform::parse_script;

/// Syntax dialect of a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Plain ECMAScript 5.1.
    Es5,
    /// Uses at least one ES2015+ construct.
    Es2015Plus,
}

/// A construct not available in ECMAScript 5.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    ArrowFunction,
    BlockScopedBinding,
    Class,
    TemplateLiteral,
    Spread,
    Destructuring,
    DefaultValue,
    RestElement,
    ForOf,
    Generator,
    AsyncFunction,
    ShorthandProperty,
    MethodProperty,
    ComputedProperty,
    NewTarget,
    Exponentiation,
    OptionalChaining,
    NullishCoalescing,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArrowFunction => "arrow function",
            Self::BlockScopedBinding => "let/const",
            Self::Class => "class",
            Self::TemplateLiteral => "template literal",
            Self::Spread => "spread",
            Self::Destructuring => "destructuring",
            Self::DefaultValue => "default value",
            Self::RestElement => "rest element",
            Self::ForOf => "for-of",
            Self::Generator => "generator",
            Self::AsyncFunction => "async function",
            Self::ShorthandProperty => "shorthand property",
            Self::MethodProperty => "method property",
            Self::ComputedProperty => "computed property",
            Self::NewTarget => "new.target",
            Self::Exponentiation => "exponentiation",
            Self::OptionalChaining => "optional chaining",
            Self::NullishCoalescing => "nullish coalescing",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of scanning a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectReport {
    pub dialect: Dialect,
    pub features: BTreeSet<Feature>,
}

impl DialectReport {
    pub fn uses(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}

/// Parse `source` and report which dialect it is written in.
pub fn detect(source: &str, source_name: &str) -> Result<DialectReport, LowerError> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        Lrc::new(FileName::Custom(source_name.to_string())),
        source.to_string(),
    );
    let script = parse_script(&cm, &fm)?;

    let mut scanner = FeatureScanner::default();
    script.visit_with(&mut scanner);

    let dialect = if scanner.features.is_empty() {
        Dialect::Es5
    } else {
        Dialect::Es2015Plus
    };
    Ok(DialectReport {
        dialect,
        features: scanner.features,
    })
}

#[derive(Default)]
struct FeatureScanner {
    features: BTreeSet<Feature>,
}

impl FeatureScanner {
    fn found(&mut self, feature: Feature) {
        self.features.insert(feature);
    }
}

impl Visit for FeatureScanner {
    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        self.found(Feature::ArrowFunction);
        if node.is_async {
            self.found(Feature::AsyncFunction);
        }
        node.visit_children_with(self);
    }

    fn visit_var_decl(&mut self, node: &VarDecl) {
        if node.kind != VarDeclKind::Var {
            self.found(Feature::BlockScopedBinding);
        }
        node.visit_children_with(self);
    }

    fn visit_class(&mut self, node: &Class) {
        self.found(Feature::Class);
        node.visit_children_with(self);
    }

    fn visit_tpl(&mut self, node: &Tpl) {
        self.found(Feature::TemplateLiteral);
        node.visit_children_with(self);
    }

    fn visit_spread_element(&mut self, node: &SpreadElement) {
        self.found(Feature::Spread);
        node.visit_children_with(self);
    }

    fn visit_expr_or_spread(&mut self, node: &ExprOrSpread) {
        if node.spread.is_some() {
            self.found(Feature::Spread);
        }
        node.visit_children_with(self);
    }

    fn visit_object_pat(&mut self, node: &ObjectPat) {
        self.found(Feature::Destructuring);
        node.visit_children_with(self);
    }

    fn visit_array_pat(&mut self, node: &ArrayPat) {
        self.found(Feature::Destructuring);
        node.visit_children_with(self);
    }

    fn visit_assign_pat(&mut self, node: &AssignPat) {
        self.found(Feature::DefaultValue);
        node.visit_children_with(self);
    }

    fn visit_rest_pat(&mut self, node: &RestPat) {
        self.found(Feature::RestElement);
        node.visit_children_with(self);
    }

    fn visit_for_of_stmt(&mut self, node: &ForOfStmt) {
        self.found(Feature::ForOf);
        node.visit_children_with(self);
    }

    fn visit_function(&mut self, node: &Function) {
        if node.is_generator {
            self.found(Feature::Generator);
        }
        if node.is_async {
            self.found(Feature::AsyncFunction);
        }
        node.visit_children_with(self);
    }

    fn visit_prop(&mut self, node: &Prop) {
        match node {
            Prop::Shorthand(_) => self.found(Feature::ShorthandProperty),
            Prop::Method(_) => self.found(Feature::MethodProperty),
            _ => {}
        }
        node.visit_children_with(self);
    }

    fn visit_computed_prop_name(&mut self, node: &ComputedPropName) {
        self.found(Feature::ComputedProperty);
        node.visit_children_with(self);
    }

    fn visit_meta_prop_expr(&mut self, node: &MetaPropExpr) {
        if node.kind == MetaPropKind::NewTarget {
            self.found(Feature::NewTarget);
        }
        node.visit_children_with(self);
    }

    fn visit_bin_expr(&mut self, node: &BinExpr) {
        match node.op {
            BinaryOp::Exp => self.found(Feature::Exponentiation),
            BinaryOp::NullishCoalescing => self.found(Feature::NullishCoalescing),
            _ => {}
        }
        node.visit_children_with(self);
    }

    fn visit_opt_chain_expr(&mut self, node: &OptChainExpr) {
        self.found(Feature::OptionalChaining);
        node.visit_children_with(self);
    }
}
