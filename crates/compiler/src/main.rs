//! Zap compiler CLI.
//!
//! `zapc [options] <file>` — flat `clap::Parser` derive, not subcommands
//! (spec.md's CLI has none, unlike the teacher's `Build`/`Lint`/`Test`/
//! `Venv`), grounded on the teacher's `#[derive(ClapParser)]` +
//! `#[command(...)]` conventions and its `println!`/`eprintln!`/
//! `process::exit(code)` error style (`crates/compiler/src/main.rs`).

use clap::Parser as ClapParser;
use std::fs;
use std::path::PathBuf;
use std::process;

use zapc::{compile_file, CompileFileError, CompilerConfig, DiagnosticEngine};

/// Exit codes per spec.md §6.1.
const EXIT_SUCCESS: i32 = 0;
const EXIT_USAGE_ERROR: i32 = 1;
const EXIT_SOURCE_UNREADABLE: i32 = 2;
const EXIT_DIAGNOSTIC_ERROR: i32 = 3;

#[derive(ClapParser)]
#[command(name = "zapc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Zap compiler - lexer, parser, binder, and IR generator", long_about = None)]
struct Cli {
    /// Input source file.
    input: PathBuf,

    /// Output artifact path (default: input minus extension).
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Verbose per-stage diagnostics (token/AST/bound-tree/IR sizes).
    #[arg(long)]
    debug: bool,

    /// Print textual IR to stdout and exit instead of writing an artifact.
    #[arg(long)]
    zir: bool,

    /// Print backend IR to stdout and exit. No backend is implemented in
    /// this crate (spec.md §1: the backend is an external collaborator),
    /// so this flag is accepted for CLI-contract completeness and reports
    /// a usage error rather than silently doing nothing.
    #[arg(long)]
    llvm: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.llvm {
        eprintln!("zapc: --llvm requires a backend, which this build does not include");
        process::exit(EXIT_USAGE_ERROR);
    }

    let config = load_config(&cli.input, cli.debug);

    let mut diag = DiagnosticEngine::new();
    let artifact = match compile_file(&cli.input, &mut diag) {
        Ok(a) => a,
        Err(CompileFileError::Io(e)) => {
            eprintln!("zapc: cannot read '{}': {e}", cli.input.display());
            process::exit(EXIT_SOURCE_UNREADABLE);
        }
    };

    if cli.debug {
        eprintln!(
            "zapc: {} token(s), {} top-level item(s)",
            artifact.tokens.len(),
            artifact.ast.items.len()
        );
        if let Some(bound) = &artifact.bound {
            eprintln!(
                "zapc: bound {} function(s), {} record(s), {} enum(s)",
                bound.functions.len(),
                bound.records.len(),
                bound.enums.len()
            );
        }
        if let Some(ir) = &artifact.ir {
            eprintln!(
                "zapc: generated {} function(s) of IR",
                ir.functions.len()
            );
        }
    }

    for d in diag.diagnostics() {
        eprintln!("{d}");
    }

    let had_errors = diag.had_errors() || (config.warnings_as_errors && !diag.diagnostics().is_empty());
    if had_errors {
        process::exit(EXIT_DIAGNOSTIC_ERROR);
    }

    let module = artifact.ir.expect("no errors reported implies IR was generated");

    if cli.zir {
        print!("{module}");
        return;
    }

    // No backend exists in this crate (spec.md §1); the IR's own textual
    // form (§6.3) is the concrete output artifact this CLI writes.
    let output = cli.output.unwrap_or_else(|| default_output_path(&cli.input));
    if let Err(e) = fs::write(&output, module.to_string()) {
        eprintln!("zapc: cannot write '{}': {e}", output.display());
        process::exit(EXIT_USAGE_ERROR);
    }
    println!("Compiled {} -> {}", cli.input.display(), output.display());
    process::exit(EXIT_SUCCESS);
}

fn default_output_path(input: &std::path::Path) -> PathBuf {
    input.with_extension("")
}

/// Load `zapc.toml` next to the input file, if present, falling back to
/// defaults. Mirrors the teacher's `lint::LintConfig::from_toml` error
/// style (`eprintln!` + `process::exit`) rather than propagating a `Result`
/// out of `main`.
fn load_config(input: &std::path::Path, debug: bool) -> CompilerConfig {
    let config_path = input.with_file_name("zapc.toml");
    if !config_path.exists() {
        return CompilerConfig::default();
    }
    let text = match fs::read_to_string(&config_path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("zapc: cannot read '{}': {e}", config_path.display());
            process::exit(EXIT_USAGE_ERROR);
        }
    };
    match CompilerConfig::from_toml(&text) {
        Ok(c) => {
            if debug {
                eprintln!("zapc: loaded {}", config_path.display());
            }
            c
        }
        Err(e) => {
            eprintln!("zapc: {e}");
            process::exit(EXIT_USAGE_ERROR);
        }
    }
}
