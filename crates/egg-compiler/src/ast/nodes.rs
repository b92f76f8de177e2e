use std::cell::{Cell, OnceCell};
use std::rc::Rc;

use egg_common::Position;
use serde::Deserialize;

use super::types::TypeNode;
use crate::semantic::error::AnalysisError;
use crate::semantic::symbol::Symbol;

// ============================================================================
// Program (top-level)
// ============================================================================

/// A complete egg program: the root of the tree handed over by the parser.
#[derive(Debug, Deserialize)]
pub struct Program {
    pub declarations: Vec<Declaration>,
}

// ============================================================================
// Identifiers
// ============================================================================

/// A name occurring in the source, together with the symbol it denotes once
/// name analysis has resolved it.
#[derive(Debug, Deserialize)]
pub struct Ident {
    pub name: String,
    pub pos: Position,
    #[serde(skip)]
    symbol: OnceCell<Rc<Symbol>>,
}

impl Ident {
    pub fn new(name: impl Into<String>, pos: Position) -> Self {
        Self {
            name: name.into(),
            pos,
            symbol: OnceCell::new(),
        }
    }

    /// The resolved symbol, if analysis has bound one.
    pub fn symbol(&self) -> Option<&Rc<Symbol>> {
        self.symbol.get()
    }

    /// Bind the resolved symbol. The slot is write-once.
    pub fn bind(&self, symbol: Rc<Symbol>) -> Result<(), AnalysisError> {
        self.symbol
            .set(symbol)
            .map_err(|_| AnalysisError::AlreadyBound {
                name: self.name.clone(),
                position: self.pos,
            })
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// A declaration in a program, function body, or block.
#[derive(Debug, Deserialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum Declaration {
    Variable(VarDecl),
    Function(FunctionDecl),
    Struct(StructDecl),
}

/// `int x;`, `struct Point p;`
#[derive(Debug, Deserialize)]
pub struct VarDecl {
    pub ty: TypeNode,
    pub name: Ident,
    /// Size marker carried over from the parser; not consulted by name analysis.
    #[serde(default)]
    pub size: Option<u32>,
}

/// `int f(int a, bool b) { ... }`
#[derive(Debug, Deserialize)]
pub struct FunctionDecl {
    pub return_type: TypeNode,
    pub name: Ident,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    pub body: Block,
}

/// A single formal parameter.
#[derive(Debug, Deserialize)]
pub struct ParamDecl {
    pub ty: TypeNode,
    pub name: Ident,
}

/// `struct Point { int x; int y; };`
#[derive(Debug, Deserialize)]
pub struct StructDecl {
    pub name: Ident,
    pub fields: Vec<VarDecl>,
}

/// A function body or the body of a block statement: local declarations
/// followed by statements.
#[derive(Debug, Default, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub declarations: Vec<Declaration>,
    #[serde(default)]
    pub statements: Vec<Stmt>,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Stmt {
    /// `x = e;`
    Assign(AssignExpr),
    /// `x++;`
    PostInc { target: Expr },
    /// `x--;`
    PostDec { target: Expr },
    /// `cin >> x;`
    Read { target: Expr },
    /// `cout << e;`
    Write { value: Expr },
    If {
        cond: Expr,
        body: Block,
    },
    IfElse {
        cond: Expr,
        then_body: Block,
        else_body: Block,
    },
    While {
        cond: Expr,
        body: Block,
    },
    Repeat {
        count: Expr,
        body: Block,
    },
    /// `f(a, b);`
    Call(CallExpr),
    Return {
        #[serde(default)]
        value: Option<Expr>,
    },
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expr {
    IntLit { value: i64, pos: Position },
    StrLit { value: String, pos: Position },
    True { pos: Position },
    False { pos: Position },
    Id(Ident),
    FieldAccess(FieldAccess),
    Assign(Box<AssignExpr>),
    Call(CallExpr),
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Position of the leftmost token of the expression.
    pub fn position(&self) -> Position {
        match self {
            Expr::IntLit { pos, .. }
            | Expr::StrLit { pos, .. }
            | Expr::True { pos }
            | Expr::False { pos } => *pos,
            Expr::Id(id) => id.pos,
            Expr::FieldAccess(access) => access.loc.position(),
            Expr::Assign(assign) => assign.target.position(),
            Expr::Call(call) => call.callee.pos,
            Expr::Unary { operand, .. } => operand.position(),
            Expr::Binary { lhs, .. } => lhs.position(),
        }
    }
}

/// `loc.field`, where `loc` is an identifier or another field access.
#[derive(Debug, Deserialize)]
pub struct FieldAccess {
    pub loc: Box<Expr>,
    pub field: Ident,
    /// Struct definition reached through `field`, when `field` is itself
    /// struct-typed. Lets an enclosing access continue the chain.
    #[serde(skip)]
    symbol: OnceCell<Rc<Symbol>>,
    /// Set when this access (or its prefix) failed to resolve.
    #[serde(skip)]
    errored: Cell<bool>,
}

impl FieldAccess {
    pub fn new(loc: Expr, field: Ident) -> Self {
        Self {
            loc: Box::new(loc),
            field,
            symbol: OnceCell::new(),
            errored: Cell::new(false),
        }
    }

    pub fn symbol(&self) -> Option<&Rc<Symbol>> {
        self.symbol.get()
    }

    pub fn bind(&self, symbol: Rc<Symbol>) -> Result<(), AnalysisError> {
        self.symbol
            .set(symbol)
            .map_err(|_| AnalysisError::AlreadyBound {
                name: self.field.name.clone(),
                position: self.field.pos,
            })
    }

    pub fn is_errored(&self) -> bool {
        self.errored.get()
    }

    pub fn mark_errored(&self) {
        self.errored.set(true);
    }
}

/// `target = value`
#[derive(Debug, Deserialize)]
pub struct AssignExpr {
    pub target: Expr,
    pub value: Expr,
}

/// `callee(args...)`
#[derive(Debug, Deserialize)]
pub struct CallExpr {
    pub callee: Ident,
    #[serde(default)]
    pub args: Vec<Expr>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    // Logical
    And,
    Or,
    // Comparison
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Negate,
    Not,
}
