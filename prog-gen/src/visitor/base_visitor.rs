use crate::ast::expr::{
    AssignExpr, BinaryExpr, CallExpr, CastExpr, ConstExpr, Expr, ExprListExpr, IndexExpr,
    MemberExpr, PlaceExpr, UnaryExpr, VarUseExpr,
};
use crate::ast::program::Program;
use crate::ast::stmt::{CntLoopStmt, DeclStmt, ExprStmt, IfStmt, Stmt};

/// AST visitor trait over the finished, immutable tree.
/// The default implementation visits in execution order.
pub trait Visitor: Sized {
    fn enter_scope(&mut self) {}
    fn exit_scope(&mut self) {}

    fn visit_name(&mut self, _name: &str) {}

    fn visit_program(&mut self, program: &Program) {
        walk_program(self, program);
    }

    // Statements
    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }
    fn visit_decl_stmt(&mut self, stmt: &DeclStmt) {
        walk_decl_stmt(self, stmt);
    }
    fn visit_expr_stmt(&mut self, stmt: &ExprStmt) {
        walk_expr_stmt(self, stmt);
    }
    fn visit_if_stmt(&mut self, stmt: &IfStmt) {
        walk_if_stmt(self, stmt);
    }
    fn visit_loop_stmt(&mut self, stmt: &CntLoopStmt) {
        walk_loop_stmt(self, stmt);
    }

    // Expressions
    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }
    fn visit_place_expr(&mut self, expr: &PlaceExpr) {
        walk_place_expr(self, expr);
    }
    fn visit_var_use_expr(&mut self, expr: &VarUseExpr) {
        self.visit_name(&expr.name);
    }
    fn visit_const_expr(&mut self, _expr: &ConstExpr) {}
    fn visit_assign_expr(&mut self, expr: &AssignExpr) {
        walk_assign_expr(self, expr);
    }
    fn visit_binary_expr(&mut self, expr: &BinaryExpr) {
        walk_binary_expr(self, expr);
    }
    fn visit_unary_expr(&mut self, expr: &UnaryExpr) {
        walk_unary_expr(self, expr);
    }
    fn visit_index_expr(&mut self, expr: &IndexExpr) {
        walk_index_expr(self, expr);
    }
    fn visit_member_expr(&mut self, expr: &MemberExpr) {
        self.visit_name(&expr.base);
    }
    fn visit_cast_expr(&mut self, expr: &CastExpr) {
        walk_cast_expr(self, expr);
    }
    fn visit_list_expr(&mut self, expr: &ExprListExpr) {
        walk_list_expr(self, expr);
    }
    fn visit_call_expr(&mut self, expr: &CallExpr) {
        walk_call_expr(self, expr);
    }
}

pub fn walk_program<V: Visitor>(visitor: &mut V, program: &Program) {
    for stmt in &program.body {
        visitor.visit_stmt(stmt);
    }
    for stmt in &program.check_stmts {
        visitor.visit_stmt(stmt);
    }
    for stmt in &program.assert_stmts {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor>(visitor: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Decl(decl_stmt) => visitor.visit_decl_stmt(decl_stmt),
        Stmt::Expr(expr_stmt) => visitor.visit_expr_stmt(expr_stmt),
        Stmt::If(if_stmt) => visitor.visit_if_stmt(if_stmt),
        Stmt::Loop(loop_stmt) => visitor.visit_loop_stmt(loop_stmt),
    }
}

pub fn walk_decl_stmt<V: Visitor>(visitor: &mut V, DeclStmt { data, init, .. }: &DeclStmt) {
    visitor.visit_name(data.name());
    if let Some(init) = init {
        visitor.visit_expr(init);
    }
}

pub fn walk_expr_stmt<V: Visitor>(visitor: &mut V, ExprStmt { expr }: &ExprStmt) {
    visitor.visit_expr(expr);
}

pub fn walk_if_stmt<V: Visitor>(
    visitor: &mut V,
    IfStmt {
        cond,
        then,
        otherwise,
    }: &IfStmt,
) {
    visitor.visit_expr(cond);
    visitor.enter_scope();
    for stmt in then {
        visitor.visit_stmt(stmt);
    }
    visitor.exit_scope();
    if let Some(otherwise) = otherwise {
        visitor.enter_scope();
        for stmt in otherwise {
            visitor.visit_stmt(stmt);
        }
        visitor.exit_scope();
    }
}

pub fn walk_loop_stmt<V: Visitor>(
    visitor: &mut V,
    CntLoopStmt {
        iter_decl,
        cond,
        step,
        body,
        ..
    }: &CntLoopStmt,
) {
    visitor.visit_decl_stmt(iter_decl);
    visitor.visit_expr(cond);
    visitor.visit_expr(step);
    visitor.enter_scope();
    for stmt in body {
        visitor.visit_stmt(stmt);
    }
    visitor.exit_scope();
}

pub fn walk_expr<V: Visitor>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::VarUse(var_use_expr) => visitor.visit_var_use_expr(var_use_expr),
        Expr::Const(const_expr) => visitor.visit_const_expr(const_expr),
        Expr::Assign(assign_expr) => visitor.visit_assign_expr(assign_expr),
        Expr::Binary(binary_expr) => visitor.visit_binary_expr(binary_expr),
        Expr::Unary(unary_expr) => visitor.visit_unary_expr(unary_expr),
        Expr::Index(index_expr) => visitor.visit_index_expr(index_expr),
        Expr::Member(member_expr) => visitor.visit_member_expr(member_expr),
        Expr::Cast(cast_expr) => visitor.visit_cast_expr(cast_expr),
        Expr::List(list_expr) => visitor.visit_list_expr(list_expr),
        Expr::Call(call_expr) => visitor.visit_call_expr(call_expr),
    }
}

pub fn walk_place_expr<V: Visitor>(visitor: &mut V, expr: &PlaceExpr) {
    match expr {
        PlaceExpr::Var(var_use_expr) => visitor.visit_var_use_expr(var_use_expr),
        PlaceExpr::Index(index_expr) => visitor.visit_index_expr(index_expr),
        PlaceExpr::Member(member_expr) => visitor.visit_member_expr(member_expr),
    }
}

pub fn walk_assign_expr<V: Visitor>(visitor: &mut V, AssignExpr { place, rhs, .. }: &AssignExpr) {
    visitor.visit_place_expr(place);
    visitor.visit_expr(rhs);
}

pub fn walk_binary_expr<V: Visitor>(visitor: &mut V, BinaryExpr { lhs, rhs, .. }: &BinaryExpr) {
    visitor.visit_expr(lhs);
    visitor.visit_expr(rhs);
}

pub fn walk_unary_expr<V: Visitor>(visitor: &mut V, UnaryExpr { expr, .. }: &UnaryExpr) {
    visitor.visit_expr(expr);
}

pub fn walk_index_expr<V: Visitor>(visitor: &mut V, IndexExpr { array_name, index, .. }: &IndexExpr) {
    visitor.visit_name(array_name);
    visitor.visit_expr(index);
}

pub fn walk_cast_expr<V: Visitor>(visitor: &mut V, CastExpr { expr, .. }: &CastExpr) {
    visitor.visit_expr(expr);
}

pub fn walk_list_expr<V: Visitor>(visitor: &mut V, ExprListExpr { exprs }: &ExprListExpr) {
    for expr in exprs {
        visitor.visit_expr(expr);
    }
}

pub fn walk_call_expr<V: Visitor>(visitor: &mut V, CallExpr { name, args, .. }: &CallExpr) {
    visitor.visit_name(name);
    visitor.visit_list_expr(args);
}
