pub mod analyzer;
pub mod annotations;
pub mod error;
pub mod scope;
pub mod symbol;

use egg_common::{DiagnosticBag, DiagnosticSink};

use crate::ast::Program;

pub use analyzer::NameAnalyzer;
pub use error::{AnalysisError, NameError, ScopeError};
pub use scope::ScopeTable;
pub use symbol::{Symbol, SymbolKind};

/// Run name analysis over `program`, starting from an empty scope table,
/// and report name errors to `sink`.
///
/// On return every identifier and field access that could be resolved is
/// bound to its symbol. `Err` means an internal invariant was violated, not
/// that the program has errors. A tree must be analyzed only once.
pub fn analyze_program(
    program: &Program,
    sink: &mut dyn DiagnosticSink,
) -> Result<(), AnalysisError> {
    NameAnalyzer::new(sink).analyze_program(program)
}

/// Run name analysis and collect the diagnostics found.
pub fn analyze(program: &Program) -> Result<DiagnosticBag, AnalysisError> {
    let mut diagnostics = DiagnosticBag::new();
    analyze_program(program, &mut diagnostics)?;
    Ok(diagnostics)
}
