use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use clap::{ArgAction, Parser};
use log::{debug, info, LevelFilter};

use egg_common::manifest::{self, EggManifest};
use egg_common::Diagnostic;
use egg_compiler::ast::Program;
use egg_compiler::semantic::{self, annotations};

/// Exit status for a program with name errors.
const EXIT_NAME_ERRORS: i32 = 1;
/// Exit status for I/O, manifest, tree format and internal failures.
const EXIT_FAILURE: i32 = 2;

/// egg name analyzer.
///
/// Resolves every name in a parsed egg program (JSON AST) and reports
/// undeclared, redeclared and otherwise invalid names.
#[derive(Parser)]
#[command(
    name = "eggc",
    version,
    about,
    long_about = "egg name analyzer.\n\nReads the JSON AST of an egg program, binds every identifier to its\ndeclaration and reports name errors.\n\nExamples:\n  eggc main.ast.json                       Analyze, plain diagnostics\n  eggc main.ast.json --source main.egg     Render diagnostics against the source\n  eggc main.ast.json --emit-symbols        Print the resolution report as JSON\n  eggc                                     Use `entry` from Egg.toml"
)]
struct Cli {
    /// Input AST (.json). Defaults to `project.entry` in Egg.toml.
    input: Option<PathBuf>,

    /// Original program text, used to render diagnostics.
    #[arg(long)]
    source: Option<PathBuf>,

    /// Print which symbol every name resolved to, as JSON on stdout.
    #[arg(long = "emit-symbols")]
    emit_symbols: bool,

    /// Suppress warning output.
    #[arg(short, long)]
    quiet: bool,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // === Manifest ===
    // Egg.toml is looked up from the input's directory, else the working directory.
    let search_from = match &cli.input {
        Some(input) => fs::canonicalize(input).unwrap_or_else(|_| input.clone()),
        None => std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(manifest::MANIFEST_FILE),
    };
    let manifest = match manifest::find_and_load_manifest(&search_from) {
        Ok(m) => {
            debug!("using manifest for project `{}`", m.project.name);
            Some(m)
        }
        Err(manifest::ManifestError::NotFound(_)) => None,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(EXIT_FAILURE);
        }
    };

    let input = match cli
        .input
        .clone()
        .or_else(|| manifest.as_ref().and_then(EggManifest::entry_path))
    {
        Some(path) => path,
        None => {
            eprintln!("error: no input given and no `entry` in Egg.toml");
            process::exit(EXIT_FAILURE);
        }
    };

    // === AST ===
    let tree = read_file(&input);
    let program: Program = match serde_json::from_str(&tree) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: invalid AST in '{}': {}", input.display(), e);
            process::exit(EXIT_FAILURE);
        }
    };

    let source_path = cli
        .source
        .clone()
        .or_else(|| manifest.as_ref().and_then(EggManifest::source_path));
    let source = source_path.as_deref().map(|path| (path, read_file(path)));

    // === Name analysis ===
    let diagnostics = match semantic::analyze(&program) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("internal error: {}", e);
            process::exit(EXIT_FAILURE);
        }
    };
    info!(
        "{}: {} diagnostic(s)",
        input.display(),
        diagnostics.len()
    );

    let quiet = cli.quiet || manifest.as_ref().is_some_and(|m| m.diagnostics.quiet);
    let color = manifest.as_ref().map_or(true, |m| m.diagnostics.color);
    for diag in diagnostics.diagnostics() {
        if quiet && !diag.is_fatal() {
            continue;
        }
        match &source {
            Some((path, text)) => print_diagnostic(diag, text, &file_label(path), color),
            None => eprintln!("{}", diag),
        }
    }

    if cli.emit_symbols {
        let report = annotations::collect(&program);
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: failed to serialize symbols: {}", e);
                process::exit(EXIT_FAILURE);
            }
        }
    }

    if diagnostics.has_errors() {
        process::exit(EXIT_NAME_ERRORS);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(default)
        .parse_default_env()
        .init();
}

fn read_file(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: could not read '{}': {}", path.display(), e);
            process::exit(EXIT_FAILURE);
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn print_diagnostic(diag: &Diagnostic, source: &str, file_name: &str, color: bool) {
    // Positions past the end of the text fall back to the plain form.
    let Some(report) = build_report(diag, source, file_name, color) else {
        eprintln!("{}", diag);
        return;
    };
    if let Err(e) = report.eprint((file_name, Source::from(source))) {
        eprintln!("error: could not render diagnostic: {}", e);
        eprintln!("{}", diag);
    }
}

/// ariadne report for `diag`, labelled at its position in `source`.
/// ariadne indexes source text by character, so spans are character offsets.
fn build_report<'a>(
    diag: &Diagnostic,
    source: &str,
    file_name: &'a str,
    color: bool,
) -> Option<Report<'a, (&'a str, Range<usize>)>> {
    let start = diag.position.char_offset_in(source)?;
    let end = start + 1;

    let (kind, label_color) = if diag.is_fatal() {
        (ReportKind::Error, Color::Red)
    } else {
        (ReportKind::Warning, Color::Yellow)
    };

    let report = Report::build(kind, file_name, start)
        .with_config(Config::default().with_color(color))
        .with_message(&diag.message)
        .with_label(
            Label::new((file_name, start..end))
                .with_message(format!("{} at {}", diag.message, diag.position))
                .with_color(label_color),
        )
        .finish();
    Some(report)
}
