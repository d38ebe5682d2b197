//! Statement nodes.

use crate::ast::data::Data;
use crate::ast::expr::Expr;
use crate::ast::op::{BinaryOp, UnaryOp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A declaration, optionally extern, optionally with an initializer.
    Decl(DeclStmt),
    /// An expression evaluated for its side effects.
    Expr(ExprStmt),
    /// A conditional with an optional else body.
    If(IfStmt),
    /// A bounded counting loop.
    Loop(CntLoopStmt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclStmt {
    pub data: Data,
    pub is_extern: bool,
    pub init: Option<Expr>,
}

impl From<DeclStmt> for Stmt {
    fn from(stmt: DeclStmt) -> Stmt {
        Stmt::Decl(stmt)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
}

impl From<ExprStmt> for Stmt {
    fn from(stmt: ExprStmt) -> Stmt {
        Stmt::Expr(stmt)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then: Vec<Stmt>,
    pub otherwise: Option<Vec<Stmt>>,
}

impl IfStmt {
    /// The condition's concrete value decides the branch taken at runtime;
    /// it is known at generation time.
    pub fn taken(&self) -> bool {
        self.cond.val().as_bool()
    }
}

impl From<IfStmt> for Stmt {
    fn from(stmt: IfStmt) -> Stmt {
        Stmt::If(stmt)
    }
}

/// A counting loop in the canonical bounded form
/// `for (iter = start; iter < end; iter += step)`. The trip count is derived
/// from the pieces at construction time, and the bound must lie within the
/// iterator's declared range, so the loop terminates regardless of its body.
#[derive(Debug, Clone, PartialEq)]
pub struct CntLoopStmt {
    pub iter_decl: DeclStmt,
    pub cond: Expr,
    pub step: Expr,
    pub body: Vec<Stmt>,
    iterations: u64,
}

impl CntLoopStmt {
    pub fn new(iter_decl: DeclStmt, cond: Expr, step: Expr, body: Vec<Stmt>) -> CntLoopStmt {
        let iter = match &iter_decl.data {
            Data::Var(var) => var,
            _ => panic!("loop iterator must be a scalar variable"),
        };
        let start = iter.value().as_i128();
        let end = match &cond {
            Expr::Binary(bin) if bin.op == BinaryOp::Lt => match (&*bin.lhs, &*bin.rhs) {
                (Expr::VarUse(var_use), Expr::Const(bound)) if var_use.name == iter.name => {
                    bound.val.as_i128()
                }
                _ => panic!("counting loop condition must compare the iterator against a constant bound"),
            },
            _ => panic!("counting loop condition must compare the iterator against a constant bound"),
        };
        let step_by = match &step {
            Expr::Unary(unary) if matches!(unary.op, UnaryOp::PreInc | UnaryOp::PostInc) => {
                match &*unary.expr {
                    Expr::VarUse(var_use) if var_use.name == iter.name => 1,
                    _ => panic!("counting loop step must advance the iterator"),
                }
            }
            Expr::Assign(assign) => match &*assign.rhs {
                Expr::Binary(bin) if bin.op == BinaryOp::Add => match (&*bin.lhs, &*bin.rhs) {
                    (Expr::VarUse(var_use), Expr::Const(delta)) if var_use.name == iter.name => {
                        delta.val.as_i128()
                    }
                    _ => panic!("counting loop step must advance the iterator"),
                },
                _ => panic!("counting loop step must advance the iterator"),
            },
            _ => panic!("counting loop step must advance the iterator"),
        };
        assert!(step_by > 0, "counting loop step must be positive");
        assert!(
            iter.min().as_i128() <= start && end <= iter.max().as_i128(),
            "loop bound must lie within the iterator's declared range"
        );
        let iterations = if end <= start {
            0
        } else {
            ((end - start + step_by - 1) / step_by) as u64
        };
        CntLoopStmt {
            iter_decl,
            cond,
            step,
            body,
            iterations,
        }
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}

impl From<CntLoopStmt> for Stmt {
    fn from(stmt: CntLoopStmt) -> Stmt {
        Stmt::Loop(stmt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum StmtKind {
    Decl,
    Expr,
    If,
    Loop,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::data::{Modifier, Variable};
    use crate::ast::eval::TypedVal;
    use crate::ast::expr::{AssignExpr, BinaryExpr, PlaceExpr, UnaryExpr, VarUseExpr};
    use crate::ast::ty::IntTy;

    fn iterator(name: &str, start: i32, end: i32) -> Variable {
        let mut iter = Variable::new(name, IntTy::Int, Modifier::None, false);
        iter.set_value(TypedVal::int(start));
        iter.set_min(TypedVal::int(start));
        iter.set_max(TypedVal::int(end));
        iter
    }

    #[test]
    fn loop_over_fifty_iterates_fifty_times() {
        let iter = iterator("i_0", 0, 50);
        let use_iter = VarUseExpr::new(&iter);
        let cond = BinaryExpr::new(BinaryOp::Lt, use_iter.clone().into(), Expr::int(50));
        let step = UnaryExpr::new(UnaryOp::PreInc, use_iter.clone().into());
        let decl = DeclStmt {
            data: iter.into(),
            is_extern: false,
            init: Some(Expr::int(0)),
        };
        let stmt = CntLoopStmt::new(decl, cond.into(), step.into(), vec![]);
        assert_eq!(stmt.iterations(), 50);
    }

    #[test]
    fn loop_with_wider_step_rounds_up() {
        let iter = iterator("i_0", 0, 7);
        let use_iter = VarUseExpr::new(&iter);
        let cond = BinaryExpr::new(BinaryOp::Lt, use_iter.clone().into(), Expr::int(7));
        let advance = BinaryExpr::new(BinaryOp::Add, use_iter.clone().into(), Expr::int(2));
        let step = AssignExpr::new(PlaceExpr::Var(use_iter), advance.into());
        let decl = DeclStmt {
            data: iter.into(),
            is_extern: false,
            init: Some(Expr::int(0)),
        };
        let stmt = CntLoopStmt::new(decl, cond.into(), step.into(), vec![]);
        assert_eq!(stmt.iterations(), 4);
    }

    #[test]
    fn empty_range_loop_never_runs() {
        let iter = iterator("i_0", 3, 3);
        let use_iter = VarUseExpr::new(&iter);
        let cond = BinaryExpr::new(BinaryOp::Lt, use_iter.clone().into(), Expr::int(3));
        let step = UnaryExpr::new(UnaryOp::PreInc, use_iter.clone().into());
        let decl = DeclStmt {
            data: iter.into(),
            is_extern: false,
            init: Some(Expr::int(3)),
        };
        let stmt = CntLoopStmt::new(decl, cond.into(), step.into(), vec![]);
        assert_eq!(stmt.iterations(), 0);
    }

    #[test]
    #[should_panic(expected = "declared range")]
    fn loop_bound_outside_iterator_range_is_fatal() {
        let iter = iterator("i_0", 0, 10);
        let use_iter = VarUseExpr::new(&iter);
        let cond = BinaryExpr::new(BinaryOp::Lt, use_iter.clone().into(), Expr::int(100));
        let step = UnaryExpr::new(UnaryOp::PreInc, use_iter.clone().into());
        let decl = DeclStmt {
            data: iter.into(),
            is_extern: false,
            init: Some(Expr::int(0)),
        };
        CntLoopStmt::new(decl, cond.into(), step.into(), vec![]);
    }
}
