use super::nodes::*;
use super::types::TypeNode;

/// Visitor trait for walking the AST.
///
/// Default implementations walk children in source order; override
/// specific methods to add behavior at particular node types.
pub trait Visitor {
    fn visit_program(&mut self, program: &Program) {
        for decl in &program.declarations {
            self.visit_declaration(decl);
        }
    }

    fn visit_declaration(&mut self, decl: &Declaration) {
        match decl {
            Declaration::Variable(v) => self.visit_var_decl(v),
            Declaration::Function(f) => self.visit_function_decl(f),
            Declaration::Struct(s) => self.visit_struct_decl(s),
        }
    }

    fn visit_var_decl(&mut self, decl: &VarDecl) {
        self.visit_type(&decl.ty);
    }

    fn visit_function_decl(&mut self, func: &FunctionDecl) {
        self.visit_type(&func.return_type);
        for param in &func.params {
            self.visit_type(&param.ty);
        }
        self.visit_block(&func.body);
    }

    fn visit_struct_decl(&mut self, decl: &StructDecl) {
        for field in &decl.fields {
            self.visit_var_decl(field);
        }
    }

    fn visit_type(&mut self, _ty: &TypeNode) {}

    fn visit_block(&mut self, block: &Block) {
        for decl in &block.declarations {
            self.visit_declaration(decl);
        }
        for stmt in &block.statements {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign(assign) => self.visit_assign(assign),
            Stmt::PostInc { target } | Stmt::PostDec { target } | Stmt::Read { target } => {
                self.visit_expr(target)
            }
            Stmt::Write { value } => self.visit_expr(value),
            Stmt::If { cond, body } | Stmt::While { cond, body } => {
                self.visit_expr(cond);
                self.visit_block(body);
            }
            Stmt::IfElse {
                cond,
                then_body,
                else_body,
            } => {
                self.visit_expr(cond);
                self.visit_block(then_body);
                self.visit_block(else_body);
            }
            Stmt::Repeat { count, body } => {
                self.visit_expr(count);
                self.visit_block(body);
            }
            Stmt::Call(call) => self.visit_call(call),
            Stmt::Return { value } => {
                if let Some(ref val) = value {
                    self.visit_expr(val);
                }
            }
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::IntLit { .. } | Expr::StrLit { .. } | Expr::True { .. } | Expr::False { .. } => {}
            Expr::Id(id) => self.visit_ident(id),
            Expr::FieldAccess(access) => self.visit_field_access(access),
            Expr::Assign(assign) => self.visit_assign(assign),
            Expr::Call(call) => self.visit_call(call),
            Expr::Unary { operand, .. } => self.visit_expr(operand),
            Expr::Binary { lhs, rhs, .. } => {
                self.visit_expr(lhs);
                self.visit_expr(rhs);
            }
        }
    }

    fn visit_ident(&mut self, _id: &Ident) {}

    fn visit_field_access(&mut self, access: &FieldAccess) {
        self.visit_expr(&access.loc);
    }

    fn visit_assign(&mut self, assign: &AssignExpr) {
        self.visit_expr(&assign.target);
        self.visit_expr(&assign.value);
    }

    fn visit_call(&mut self, call: &CallExpr) {
        for arg in &call.args {
            self.visit_expr(arg);
        }
    }
}
