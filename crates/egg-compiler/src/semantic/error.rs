use egg_common::Position;

/// Failures of the scope table itself. Reaching one during analysis means
/// the analysis broke its own push/pop or check-then-insert discipline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("`{0}` is already declared in the innermost scope")]
    DuplicateDeclaration(String),
    #[error("scope table has no scopes left")]
    EmptyScopeStack,
}

/// Internal invariant violations that abort a name analysis run.
///
/// Problems with the analyzed program are never reported through this
/// type; they go to the diagnostic sink and analysis continues.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error("symbol for `{name}` at {position} is already bound")]
    AlreadyBound { name: String, position: Position },
    #[error("parameter types of a function were already recorded")]
    ParamsAlreadyRecorded,
    #[error("`{name}` does not name a struct definition")]
    NotAStructDefinition { name: String },
    #[error("unsupported expression on the left of a field access at {0}")]
    UnexpectedFieldAccessBase(Position),
}

/// Name errors in the analyzed program, with the exact text reported for
/// each one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("Multiply declared identifier")]
    MultiplyDeclared,
    #[error("Undeclared identifier")]
    Undeclared,
    #[error("Non-function declared void")]
    NonFunctionVoid,
    #[error("Invalid name of struct type")]
    InvalidStructType,
    #[error("Dot-access of non-struct type")]
    DotAccessOfNonStruct,
    #[error("Invalid struct field name")]
    InvalidStructField,
}
