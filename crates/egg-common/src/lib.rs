pub mod errors;
pub mod manifest;
pub mod position;

pub use errors::{Diagnostic, DiagnosticBag, DiagnosticSink, Severity};
pub use position::Position;
