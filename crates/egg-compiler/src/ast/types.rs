use serde::Deserialize;

use super::nodes::Ident;

/// A type written in a declaration.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeNode {
    Int,
    Bool,
    Void,
    /// `struct Name`; the identifier is bound to the struct definition when
    /// the declaration using it is analyzed.
    Struct(Ident),
}

impl TypeNode {
    pub fn is_void(&self) -> bool {
        matches!(self, TypeNode::Void)
    }
}

impl std::fmt::Display for TypeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeNode::Int => write!(f, "int"),
            TypeNode::Bool => write!(f, "bool"),
            TypeNode::Void => write!(f, "void"),
            TypeNode::Struct(id) => write!(f, "{}", id.name),
        }
    }
}
