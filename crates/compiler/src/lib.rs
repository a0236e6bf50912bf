//! Zap compiler library: lexer, parser, binder, and IR generator.
//!
//! The four stages form a pure one-way pipeline (spec.md §2): each produces
//! an immutable artifact the next consumes, and a single [`DiagnosticEngine`]
//! threads through all of them by `&mut` reference. [`compile_source`] (and
//! its file-reading counterpart [`compile_file`]) is the driver, grounded on
//! the teacher's `compile_file`/`compile_to_ir` free functions in
//! `seqc::lib`: "Parse -> (pass) -> Check -> Codegen" with the same
//! short-circuit-on-error shape, adapted so every lexer/parser error across
//! the *whole* run accumulates before the pipeline gives up (panic-mode
//! recovery, spec.md §4.2), rather than failing fast on the first one.

pub mod ast;
pub mod binder;
pub mod bound;
pub mod config;
pub mod diagnostics;
pub mod ir;
pub mod irgen;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;
pub mod types;

pub use binder::Binder;
pub use bound::BoundRoot;
pub use config::CompilerConfig;
pub use diagnostics::{Diagnostic, DiagnosticEngine, DiagnosticKind, Severity};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::Token;

use std::fmt;
use std::fs;
use std::path::Path;

/// Everything produced while compiling one source file. Earlier stages'
/// artifacts are kept (not dropped) so `--debug`/`--zir` can report on any
/// of them; a real ahead-of-time driver could drop `tokens`/`ast` once
/// `bound` exists, since nothing downstream reads them again (spec.md §5
/// "Lifecycle / ownership").
#[derive(Debug)]
pub struct CompileArtifact {
    pub tokens: Vec<Token>,
    pub ast: ast::Root,
    /// `None` if lexing/parsing reported any error, or if the binder could
    /// not establish "no unresolved names, no type mismatches" (spec.md
    /// §3.5).
    pub bound: Option<BoundRoot>,
    /// `None` whenever `bound` is `None` — the IR generator never runs on a
    /// program the binder rejected.
    pub ir: Option<ir::Module>,
}

impl CompileArtifact {
    /// True once every stage has produced output with no errors reported
    /// anywhere in the run.
    pub fn succeeded(&self) -> bool {
        self.ir.is_some()
    }
}

/// Run the full pipeline over in-memory source text, skipping a stage once
/// an earlier one has reported any error (spec.md §5 "Shared-resource
/// policy": `DiagnosticEngine` is checked at stage boundaries, never read
/// back mid-stage to make a decision).
pub fn compile_source(source: &str, diag: &mut DiagnosticEngine) -> CompileArtifact {
    let tokens = Lexer::new(source).tokenize(diag);
    let ast = Parser::new(tokens.clone(), diag).parse_root();

    if diag.had_errors() {
        return CompileArtifact { tokens, ast, bound: None, ir: None };
    }

    let bound = Binder::new(diag).bind(&ast);
    let ir = match (&bound, diag.had_errors()) {
        (Some(root), false) => Some(irgen::generate(root)),
        _ => None,
    };

    CompileArtifact { tokens, ast, bound, ir }
}

#[derive(Debug)]
pub enum CompileFileError {
    /// The source file could not be read (CLI exit code 2, spec.md §6.1).
    Io(std::io::Error),
}

impl fmt::Display for CompileFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileFileError::Io(e) => write!(f, "could not read source file: {e}"),
        }
    }
}

impl std::error::Error for CompileFileError {}

/// Read `path` and run [`compile_source`] over its contents.
pub fn compile_file(
    path: &Path,
    diag: &mut DiagnosticEngine,
) -> Result<CompileArtifact, CompileFileError> {
    let source = fs::read_to_string(path).map_err(CompileFileError::Io)?;
    Ok(compile_source(&source, diag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Instruction;

    fn compile(src: &str) -> (CompileArtifact, DiagnosticEngine) {
        let mut diag = DiagnosticEngine::new();
        let artifact = compile_source(src, &mut diag);
        (artifact, diag)
    }

    // S1 -- minimal return.
    #[test]
    fn s1_minimal_return() {
        let (artifact, diag) = compile("fun main() -> Int { return 42; }");
        assert_eq!(diag.error_count(), 0);
        let module = artifact.ir.expect("S1 must produce IR");
        assert_eq!(module.functions.len(), 1);
        let f = &module.functions[0];
        assert_eq!(f.name, "main");
        assert_eq!(f.return_type, ir::IrType::Int);
        assert_eq!(f.blocks.len(), 1);
        assert!(matches!(
            f.blocks[0].instructions.last(),
            Some(Instruction::Ret { value: Some(_) })
        ));
    }

    // S2 -- variable + arithmetic.
    #[test]
    fn s2_variable_and_arithmetic() {
        let src = "fun f(x: Int) -> Int { var y: Int = x + 1; return y * 2; }";
        let (artifact, diag) = compile(src);
        assert_eq!(diag.error_count(), 0);
        let module = artifact.ir.expect("S2 must produce IR");
        let instrs = &module.functions[0].blocks[0].instructions;
        assert!(instrs.iter().any(|i| matches!(i, Instruction::Alloca { .. })));
        assert!(instrs.iter().any(|i| matches!(i, Instruction::Add { .. })));
        assert!(instrs.iter().any(|i| matches!(i, Instruction::Mul { .. })));
        assert!(matches!(instrs.last(), Some(Instruction::Ret { value: Some(_) })));
    }

    // S3 -- type error: exactly one TypeError, no IR, exit non-zero.
    #[test]
    fn s3_type_error_return_bool_as_int() {
        let (artifact, diag) = compile("fun g() -> Int { return true; }");
        assert!(artifact.ir.is_none());
        let errors: Vec<_> = diag
            .diagnostics()
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, DiagnosticKind::TypeError);
    }

    // S4 -- control flow: while loop lowers to 4 blocks.
    #[test]
    fn s4_while_loop_four_blocks() {
        let src = "fun h(n: Int) -> Int { var i: Int = 0; while i < n { i = i + 1; } return i; }";
        let (artifact, diag) = compile(src);
        assert_eq!(diag.error_count(), 0);
        let module = artifact.ir.expect("S4 must produce IR");
        let f = &module.functions[0];
        assert_eq!(f.blocks.len(), 4);
        let cond = f.blocks.iter().find(|b| b.label.starts_with("while.cond")).unwrap();
        assert!(matches!(cond.instructions.last(), Some(Instruction::CondBr { .. })));
        let end = f.blocks.iter().find(|b| b.label.starts_with("while.end")).unwrap();
        assert!(matches!(end.instructions.last(), Some(Instruction::Ret { .. })));
    }

    // S5 -- undefined name.
    #[test]
    fn s5_undefined_name() {
        let (artifact, diag) = compile("fun k() -> Int { return z; }");
        assert!(artifact.ir.is_none());
        let errors: Vec<_> = diag
            .diagnostics()
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, DiagnosticKind::NameError);
    }

    // S6 -- numeric promotion: Int + Float types as Float, no errors. The
    // Int operand must go through an explicit sitofp conversion before the
    // fadd, and the fadd must consume that conversion's result (not the
    // raw, unconverted load of `a`).
    #[test]
    fn s6_numeric_promotion() {
        use crate::ir::IrType;

        let (artifact, diag) = compile("fun p() -> Float { var a: Int = 1; return a + 2.0; }");
        assert_eq!(diag.error_count(), 0);
        let module = artifact.ir.expect("S6 must produce IR");
        let instrs = &module.functions[0].blocks[0].instructions;

        let conv_pos = instrs
            .iter()
            .position(|i| matches!(i, Instruction::IntToFloat { .. }))
            .expect("Int operand must be converted before the float add");
        let Instruction::IntToFloat { result: conv_result, .. } = &instrs[conv_pos] else {
            unreachable!()
        };

        let add_pos = instrs
            .iter()
            .position(|i| matches!(i, Instruction::FAdd { .. }))
            .expect("S6 must lower to fadd");
        assert!(conv_pos < add_pos, "conversion must precede the fadd");

        let Instruction::FAdd { lhs, ty, .. } = &instrs[add_pos] else { unreachable!() };
        assert_eq!(ty, &IrType::Float);
        assert!(
            matches!(lhs, ir::Value::Reg(r, _) if r == conv_result),
            "fadd must consume the converted value, not the raw Int load"
        );
        assert!(matches!(instrs.last(), Some(Instruction::Ret { value: Some(_) })));
    }

    // Universal property: error gating -- once lexing/parsing has an error,
    // the binder and IR generator never run.
    #[test]
    fn error_gating_stops_before_ir() {
        let (artifact, diag) = compile("fun f( { return 1 }");
        assert!(diag.had_errors());
        assert!(artifact.bound.is_none());
        assert!(artifact.ir.is_none());
    }

    #[test]
    fn compile_file_reports_unreadable_path() {
        let mut diag = DiagnosticEngine::new();
        let err = compile_file(Path::new("/nonexistent/path/to/source.zap"), &mut diag).unwrap_err();
        assert!(matches!(err, CompileFileError::Io(_)));
    }

    #[test]
    fn compile_file_reads_and_compiles_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.zap");
        fs::write(&path, "fun main() -> Int { return 0; }").unwrap();
        let mut diag = DiagnosticEngine::new();
        let artifact = compile_file(&path, &mut diag).unwrap();
        assert!(artifact.succeeded());
    }
}
