use std::cell::OnceCell;
use std::rc::Rc;

use super::error::AnalysisError;
use super::scope::ScopeTable;

/// The kind of a declared symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    StructDefinition,
    StructInstance,
}

/// The resolved meaning of a declared name.
///
/// Symbols are shared (`Rc`) between the scope table that declares them and
/// every identifier bound to them. They never change after construction,
/// apart from the one-time parameter list of a function.
#[derive(Debug)]
pub enum Symbol {
    Variable { type_name: String },
    Function(FunctionSymbol),
    StructDefinition(StructDefinition),
    StructInstance(StructInstance),
}

impl Symbol {
    pub fn variable(type_name: impl Into<String>) -> Self {
        Symbol::Variable {
            type_name: type_name.into(),
        }
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Variable { .. } => SymbolKind::Variable,
            Symbol::Function(_) => SymbolKind::Function,
            Symbol::StructDefinition(_) => SymbolKind::StructDefinition,
            Symbol::StructInstance(_) => SymbolKind::StructInstance,
        }
    }

    /// Primitive or struct type name for values, `function` for functions,
    /// `struct` for struct definitions.
    pub fn type_name(&self) -> &str {
        match self {
            Symbol::Variable { type_name } => type_name,
            Symbol::Function(_) => "function",
            Symbol::StructDefinition(_) => "struct",
            Symbol::StructInstance(instance) => instance.struct_name(),
        }
    }

    pub fn as_function(&self) -> Option<&FunctionSymbol> {
        match self {
            Symbol::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_struct_instance(&self) -> Option<&StructInstance> {
        match self {
            Symbol::StructInstance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Field table of a struct definition.
    pub fn field_table(&self) -> Option<&ScopeTable> {
        match self {
            Symbol::StructDefinition(definition) => Some(definition.fields()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Variable { type_name } => write!(f, "{}", type_name),
            Symbol::Function(function) => write!(f, "{}", function),
            Symbol::StructDefinition(definition) => write!(f, "struct {}", definition.name()),
            Symbol::StructInstance(instance) => write!(f, "{}", instance.struct_name()),
        }
    }
}

/// Signature of a declared function.
#[derive(Debug)]
pub struct FunctionSymbol {
    return_type: String,
    params: OnceCell<Vec<String>>,
}

impl FunctionSymbol {
    /// A function whose parameter types are not known yet.
    pub fn new(return_type: impl Into<String>) -> Self {
        Self {
            return_type: return_type.into(),
            params: OnceCell::new(),
        }
    }

    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    /// Parameter type names in declaration order (empty until recorded).
    pub fn params(&self) -> &[String] {
        self.params.get().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Record the parameter types. Allowed exactly once, after the formal
    /// list has been walked.
    pub fn record_params(&self, params: Vec<String>) -> Result<(), AnalysisError> {
        self.params
            .set(params)
            .map_err(|_| AnalysisError::ParamsAlreadyRecorded)
    }
}

impl std::fmt::Display for FunctionSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params = self.params();
        if params.is_empty() {
            write!(f, "void -> {}", self.return_type)
        } else {
            write!(f, "{} -> {}", params.join(", "), self.return_type)
        }
    }
}

/// A struct type together with its private field namespace.
#[derive(Debug)]
pub struct StructDefinition {
    name: String,
    fields: ScopeTable,
}

impl StructDefinition {
    pub fn new(name: impl Into<String>, fields: ScopeTable) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Never pushed onto any lexical scope stack; only consulted when a
    /// value of this type is dot-accessed.
    pub fn fields(&self) -> &ScopeTable {
        &self.fields
    }
}

/// A variable (or field) whose type is a struct.
#[derive(Debug)]
pub struct StructInstance {
    struct_name: String,
    definition: Rc<Symbol>,
}

impl StructInstance {
    /// `definition` must be the struct definition `struct_name` resolved to.
    pub fn new(
        struct_name: impl Into<String>,
        definition: Rc<Symbol>,
    ) -> Result<Self, AnalysisError> {
        let struct_name = struct_name.into();
        if definition.kind() != SymbolKind::StructDefinition {
            return Err(AnalysisError::NotAStructDefinition { name: struct_name });
        }
        Ok(Self {
            struct_name,
            definition,
        })
    }

    pub fn struct_name(&self) -> &str {
        &self.struct_name
    }

    /// The `StructDefinition` symbol of this instance's type.
    pub fn definition(&self) -> &Rc<Symbol> {
        &self.definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_definition() -> Rc<Symbol> {
        let mut fields = ScopeTable::new();
        fields
            .add_declaration("x", Rc::new(Symbol::variable("int")))
            .unwrap();
        Rc::new(Symbol::StructDefinition(StructDefinition::new(
            "Point", fields,
        )))
    }

    #[test]
    fn type_names_per_kind() {
        assert_eq!(Symbol::variable("bool").type_name(), "bool");
        assert_eq!(
            Symbol::Function(FunctionSymbol::new("int")).type_name(),
            "function"
        );
        let definition = point_definition();
        assert_eq!(definition.type_name(), "struct");
        let instance =
            Symbol::StructInstance(StructInstance::new("Point", definition).unwrap());
        assert_eq!(instance.type_name(), "Point");
        assert_eq!(instance.kind(), SymbolKind::StructInstance);
    }

    #[test]
    fn function_params_recorded_once() {
        let function = FunctionSymbol::new("void");
        assert!(function.params().is_empty());
        assert_eq!(function.to_string(), "void -> void");

        function
            .record_params(vec!["int".to_string(), "bool".to_string()])
            .unwrap();
        assert_eq!(function.params(), ["int", "bool"]);
        assert_eq!(function.to_string(), "int, bool -> void");

        let err = function.record_params(Vec::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::ParamsAlreadyRecorded));
        assert_eq!(function.params().len(), 2);
    }

    #[test]
    fn struct_definition_exposes_fields() {
        let definition = point_definition();
        let fields = definition.field_table().unwrap();
        assert!(fields.lookup_local("x").unwrap().is_some());
        assert!(fields.lookup_local("y").unwrap().is_none());
        assert_eq!(definition.to_string(), "struct Point");
        assert!(Symbol::variable("int").field_table().is_none());
    }

    #[test]
    fn instance_requires_struct_definition() {
        let not_a_struct = Rc::new(Symbol::variable("int"));
        let err = StructInstance::new("Point", not_a_struct).unwrap_err();
        assert!(matches!(err, AnalysisError::NotAStructDefinition { .. }));
    }
}
