use std::rc::Rc;

use serde::Serialize;

use crate::ast::visitor::Visitor;
use crate::ast::*;

use super::symbol::Symbol;

/// Where a name occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// An identifier used as an expression.
    Use,
    /// The target of a call.
    Call,
    /// The name in a `struct T` type.
    StructType,
    /// The field name of a field access; resolved only when the field is
    /// itself struct-typed.
    Field,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub name: String,
    pub line: u32,
    pub column: u32,
    pub role: Role,
    /// Display form of the bound symbol.
    pub resolved: Option<String>,
}

impl std::fmt::Display for Annotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.resolved {
            Some(resolved) => write!(f, "{}({})", self.name, resolved),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Resolution report: which symbol every name in an analyzed `program`
/// denotes, one annotation per name use in source order.
pub fn collect(program: &Program) -> Vec<Annotation> {
    let mut collector = Collector::default();
    collector.visit_program(program);
    collector.annotations
}

#[derive(Default)]
struct Collector {
    annotations: Vec<Annotation>,
}

impl Collector {
    fn record(&mut self, id: &Ident, role: Role, symbol: Option<&Rc<Symbol>>) {
        self.annotations.push(Annotation {
            name: id.name.clone(),
            line: id.pos.line,
            column: id.pos.column,
            role,
            resolved: symbol.map(|sym| sym.to_string()),
        });
    }
}

impl Visitor for Collector {
    fn visit_type(&mut self, ty: &TypeNode) {
        if let TypeNode::Struct(id) = ty {
            self.record(id, Role::StructType, id.symbol());
        }
    }

    fn visit_ident(&mut self, id: &Ident) {
        self.record(id, Role::Use, id.symbol());
    }

    fn visit_field_access(&mut self, access: &FieldAccess) {
        self.visit_expr(&access.loc);
        self.record(&access.field, Role::Field, access.symbol());
    }

    fn visit_call(&mut self, call: &CallExpr) {
        self.record(&call.callee, Role::Call, call.callee.symbol());
        for arg in &call.args {
            self.visit_expr(arg);
        }
    }
}
