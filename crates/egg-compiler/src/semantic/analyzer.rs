use std::rc::Rc;

use egg_common::{DiagnosticSink, Position};
use log::{debug, info};

use crate::ast::*;

use super::error::{AnalysisError, NameError};
use super::scope::ScopeTable;
use super::symbol::{FunctionSymbol, StructDefinition, StructInstance, Symbol, SymbolKind};

/// Single-pass name analysis.
///
/// Walks the tree depth-first, declaring names as they are met and binding
/// every identifier use to the symbol it denotes. Name errors in the program
/// are reported to the sink and the walk carries on, so one run surfaces
/// every independent error. Only internal invariant violations stop it.
pub struct NameAnalyzer<'a> {
    sink: &'a mut dyn DiagnosticSink,
    errors: usize,
}

impl<'a> NameAnalyzer<'a> {
    pub fn new(sink: &'a mut dyn DiagnosticSink) -> Self {
        Self { sink, errors: 0 }
    }

    /// Number of name errors reported so far.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Analyze `program` against a fresh scope table.
    pub fn analyze_program(&mut self, program: &Program) -> Result<(), AnalysisError> {
        let mut table = ScopeTable::new();
        self.analyze_program_in(program, &mut table)
    }

    /// Analyze `program` with its top-level declarations going into the
    /// innermost scope of `table`.
    pub fn analyze_program_in(
        &mut self,
        program: &Program,
        table: &mut ScopeTable,
    ) -> Result<(), AnalysisError> {
        self.analyze_declarations(&program.declarations, table)?;
        info!(
            "name analysis finished: {} declaration(s), {} error(s)",
            program.declarations.len(),
            self.errors
        );
        Ok(())
    }

    fn report(&mut self, position: Position, error: NameError) {
        debug!("{} at {}", error, position);
        self.errors += 1;
        self.sink.fatal(position, &error.to_string());
    }

    // ====================================================================
    // Declarations
    // ====================================================================

    fn analyze_declarations(
        &mut self,
        declarations: &[Declaration],
        table: &mut ScopeTable,
    ) -> Result<(), AnalysisError> {
        for decl in declarations {
            self.analyze_declaration(decl, table)?;
        }
        Ok(())
    }

    fn analyze_declaration(
        &mut self,
        decl: &Declaration,
        table: &mut ScopeTable,
    ) -> Result<Option<Rc<Symbol>>, AnalysisError> {
        match decl {
            Declaration::Variable(var) => self.analyze_var_decl(var, table, None),
            Declaration::Function(func) => {
                self.analyze_function_decl(func, table)?;
                Ok(None)
            }
            Declaration::Struct(decl) => {
                self.analyze_struct_decl(decl, table)?;
                Ok(None)
            }
        }
    }

    /// Declare a variable (or struct field) in the innermost scope of
    /// `table`.
    ///
    /// Struct type names are looked up in `struct_types` when given, else in
    /// `table` itself. Fields of a struct resolve their struct types in the
    /// namespace enclosing the struct, never in the field table being built.
    fn analyze_var_decl(
        &mut self,
        decl: &VarDecl,
        table: &mut ScopeTable,
        struct_types: Option<&ScopeTable>,
    ) -> Result<Option<Rc<Symbol>>, AnalysisError> {
        let mut failed = false;
        let mut struct_type = None;

        match &decl.ty {
            TypeNode::Void => {
                self.report(decl.name.pos, NameError::NonFunctionVoid);
                failed = true;
            }
            TypeNode::Struct(type_id) => {
                let types: &ScopeTable = match struct_types {
                    Some(types) => types,
                    None => &*table,
                };
                match types.lookup_global(&type_id.name)?.cloned() {
                    Some(definition) if definition.kind() == SymbolKind::StructDefinition => {
                        type_id.bind(Rc::clone(&definition))?;
                        struct_type = Some((type_id.name.as_str(), definition));
                    }
                    _ => {
                        self.report(type_id.pos, NameError::InvalidStructType);
                        failed = true;
                    }
                }
            }
            TypeNode::Int | TypeNode::Bool => {}
        }

        if table.lookup_local(&decl.name.name)?.is_some() {
            self.report(decl.name.pos, NameError::MultiplyDeclared);
            failed = true;
        }

        if failed {
            return Ok(None);
        }

        let symbol = Rc::new(match struct_type {
            Some((name, definition)) => {
                Symbol::StructInstance(StructInstance::new(name, definition)?)
            }
            None => Symbol::variable(decl.ty.to_string()),
        });
        table.add_declaration(&decl.name.name, Rc::clone(&symbol))?;
        Ok(Some(symbol))
    }

    fn analyze_function_decl(
        &mut self,
        func: &FunctionDecl,
        table: &mut ScopeTable,
    ) -> Result<(), AnalysisError> {
        debug!("function `{}` at {}", func.name.name, func.name.pos);

        // Declared before the body is entered so recursive calls resolve.
        let symbol = if table.lookup_local(&func.name.name)?.is_some() {
            self.report(func.name.pos, NameError::MultiplyDeclared);
            None
        } else {
            let symbol = Rc::new(Symbol::Function(FunctionSymbol::new(
                func.return_type.to_string(),
            )));
            table.add_declaration(&func.name.name, Rc::clone(&symbol))?;
            Some(symbol)
        };

        // Parameters and locals share the one scope of the body.
        table.push_scope();
        let result = self.analyze_function_scope(func, symbol.as_deref(), table);
        table.pop_scope()?;
        result
    }

    fn analyze_function_scope(
        &mut self,
        func: &FunctionDecl,
        symbol: Option<&Symbol>,
        table: &mut ScopeTable,
    ) -> Result<(), AnalysisError> {
        let mut param_types = Vec::with_capacity(func.params.len());
        for param in &func.params {
            if let Some(declared) = self.analyze_param_decl(param, table)? {
                param_types.push(declared.type_name().to_string());
            }
        }
        if let Some(function) = symbol.and_then(Symbol::as_function) {
            function.record_params(param_types)?;
        }

        self.analyze_block_contents(&func.body, table)
    }

    fn analyze_param_decl(
        &mut self,
        param: &ParamDecl,
        table: &mut ScopeTable,
    ) -> Result<Option<Rc<Symbol>>, AnalysisError> {
        let mut failed = false;
        if param.ty.is_void() {
            self.report(param.name.pos, NameError::NonFunctionVoid);
            failed = true;
        }
        if table.lookup_local(&param.name.name)?.is_some() {
            self.report(param.name.pos, NameError::MultiplyDeclared);
            failed = true;
        }
        if failed {
            return Ok(None);
        }

        let symbol = Rc::new(Symbol::variable(param.ty.to_string()));
        table.add_declaration(&param.name.name, Rc::clone(&symbol))?;
        Ok(Some(symbol))
    }

    fn analyze_struct_decl(
        &mut self,
        decl: &StructDecl,
        table: &mut ScopeTable,
    ) -> Result<(), AnalysisError> {
        debug!("struct `{}` at {}", decl.name.name, decl.name.pos);

        let duplicate = table.lookup_local(&decl.name.name)?.is_some();
        if duplicate {
            self.report(decl.name.pos, NameError::MultiplyDeclared);
        }

        // Fields are checked even for a duplicate struct, to surface their
        // own errors.
        let mut fields = ScopeTable::new();
        for field in &decl.fields {
            self.analyze_var_decl(field, &mut fields, Some(&*table))?;
        }

        if !duplicate {
            let definition = StructDefinition::new(decl.name.name.clone(), fields);
            table.add_declaration(&decl.name.name, Rc::new(Symbol::StructDefinition(definition)))?;
        }
        Ok(())
    }

    // ====================================================================
    // Statements
    // ====================================================================

    fn analyze_block_contents(
        &mut self,
        block: &Block,
        table: &mut ScopeTable,
    ) -> Result<(), AnalysisError> {
        self.analyze_declarations(&block.declarations, table)?;
        for stmt in &block.statements {
            self.analyze_stmt(stmt, table)?;
        }
        Ok(())
    }

    /// Analyze the body of a block statement in its own scope.
    fn analyze_nested_block(
        &mut self,
        block: &Block,
        table: &mut ScopeTable,
    ) -> Result<(), AnalysisError> {
        table.push_scope();
        let result = self.analyze_block_contents(block, table);
        table.pop_scope()?;
        result
    }

    fn analyze_stmt(&mut self, stmt: &Stmt, table: &mut ScopeTable) -> Result<(), AnalysisError> {
        match stmt {
            Stmt::Assign(assign) => self.analyze_assign(assign, table),
            Stmt::PostInc { target } | Stmt::PostDec { target } | Stmt::Read { target } => {
                self.analyze_expr(target, table)
            }
            Stmt::Write { value } => self.analyze_expr(value, table),
            Stmt::If { cond, body } | Stmt::While { cond, body } => {
                self.analyze_expr(cond, table)?;
                self.analyze_nested_block(body, table)
            }
            Stmt::IfElse {
                cond,
                then_body,
                else_body,
            } => {
                self.analyze_expr(cond, table)?;
                self.analyze_nested_block(then_body, table)?;
                self.analyze_nested_block(else_body, table)
            }
            Stmt::Repeat { count, body } => {
                self.analyze_expr(count, table)?;
                self.analyze_nested_block(body, table)
            }
            Stmt::Call(call) => self.analyze_call(call, table),
            Stmt::Return { value } => match value {
                Some(value) => self.analyze_expr(value, table),
                None => Ok(()),
            },
        }
    }

    // ====================================================================
    // Expressions
    // ====================================================================

    fn analyze_expr(&mut self, expr: &Expr, table: &ScopeTable) -> Result<(), AnalysisError> {
        match expr {
            Expr::IntLit { .. } | Expr::StrLit { .. } | Expr::True { .. } | Expr::False { .. } => {
                Ok(())
            }
            Expr::Id(id) => self.analyze_ident(id, table),
            Expr::FieldAccess(access) => self.analyze_field_access(access, table),
            Expr::Assign(assign) => self.analyze_assign(assign, table),
            Expr::Call(call) => self.analyze_call(call, table),
            Expr::Unary { operand, .. } => self.analyze_expr(operand, table),
            Expr::Binary { lhs, rhs, .. } => {
                self.analyze_expr(lhs, table)?;
                self.analyze_expr(rhs, table)
            }
        }
    }

    fn analyze_ident(&mut self, id: &Ident, table: &ScopeTable) -> Result<(), AnalysisError> {
        match table.lookup_global(&id.name)? {
            Some(symbol) => id.bind(Rc::clone(symbol)),
            None => {
                self.report(id.pos, NameError::Undeclared);
                Ok(())
            }
        }
    }

    fn analyze_assign(&mut self, assign: &AssignExpr, table: &ScopeTable) -> Result<(), AnalysisError> {
        self.analyze_expr(&assign.target, table)?;
        self.analyze_expr(&assign.value, table)
    }

    fn analyze_call(&mut self, call: &CallExpr, table: &ScopeTable) -> Result<(), AnalysisError> {
        self.analyze_ident(&call.callee, table)?;
        for arg in &call.args {
            self.analyze_expr(arg, table)?;
        }
        Ok(())
    }

    /// Resolve `loc.field`.
    ///
    /// `loc` is analyzed first, so chains resolve left to right. The field is
    /// then looked up in the field table of the struct `loc` evaluates to.
    /// When the field is itself struct-typed, its struct definition is bound
    /// to this node so an enclosing access can continue the chain. A node
    /// whose prefix already failed is marked errored without a further
    /// diagnostic.
    fn analyze_field_access(
        &mut self,
        access: &FieldAccess,
        table: &ScopeTable,
    ) -> Result<(), AnalysisError> {
        self.analyze_expr(&access.loc, table)?;

        let Some(definition) = self.field_access_base(access)? else {
            access.mark_errored();
            return Ok(());
        };
        let fields = definition
            .field_table()
            .ok_or_else(|| AnalysisError::NotAStructDefinition {
                name: definition.type_name().to_string(),
            })?;

        match fields.lookup_global(&access.field.name)? {
            None => {
                self.report(access.field.pos, NameError::InvalidStructField);
                access.mark_errored();
            }
            Some(field) => {
                if let Some(instance) = field.as_struct_instance() {
                    access.bind(Rc::clone(instance.definition()))?;
                }
            }
        }
        Ok(())
    }

    /// The struct definition in which `access.field` is looked up, or `None`
    /// when the left side does not lead to one.
    fn field_access_base(
        &mut self,
        access: &FieldAccess,
    ) -> Result<Option<Rc<Symbol>>, AnalysisError> {
        match access.loc.as_ref() {
            Expr::Id(id) => {
                // Undeclared: already reported by the identifier itself.
                let Some(symbol) = id.symbol() else {
                    return Ok(None);
                };
                match symbol.as_struct_instance() {
                    Some(instance) => Ok(Some(Rc::clone(instance.definition()))),
                    None => {
                        self.report(id.pos, NameError::DotAccessOfNonStruct);
                        Ok(None)
                    }
                }
            }
            Expr::FieldAccess(inner) => {
                if inner.is_errored() {
                    return Ok(None);
                }
                match inner.symbol() {
                    Some(symbol) if symbol.kind() == SymbolKind::StructDefinition => {
                        Ok(Some(Rc::clone(symbol)))
                    }
                    _ => {
                        self.report(inner.field.pos, NameError::DotAccessOfNonStruct);
                        Ok(None)
                    }
                }
            }
            other => Err(AnalysisError::UnexpectedFieldAccessBase(other.position())),
        }
    }
}
