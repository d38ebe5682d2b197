use crate::ast::data::{Data, Modifier, Variable};
use crate::ast::eval::TypedVal;
use crate::ast::expr::{
    AssignExpr, BinaryExpr, CastExpr, Expr, IndexExpr, MemberExpr, PlaceExpr, UnaryExpr,
    VarUseExpr,
};
use crate::ast::op::{BinaryOp, UnaryOp};
use crate::ast::stmt::{CntLoopStmt, DeclStmt, ExprStmt, IfStmt, Stmt, StmtKind};
use crate::ast::ty::IntTy;
use crate::context::{Context, ScopeCtx};
use crate::generate::utils::track_stmt;
use rand::prelude::SliceRandom;
use rand::Rng;
use std::cmp::max;

impl Stmt {
    /// Attempts up to `ctx.policy.max_stmt_attempts` times to generate a
    /// valid statement in the given scope.
    pub fn fuzz_stmt(ctx: &mut Context, scope: &ScopeCtx) -> Option<Stmt> {
        let mut res: Option<Stmt> = None;
        let mut num_failed_attempts = 0;
        while res.is_none() && num_failed_attempts < ctx.policy.max_stmt_attempts {
            res = Stmt::generate_stmt(ctx, scope);
            if res.is_none() {
                num_failed_attempts += 1;
                ctx.statistics.max_failed_stmt_attempts =
                    max(ctx.statistics.max_failed_stmt_attempts, num_failed_attempts);
            }
        }
        res
    }

    /// A single attempt to generate a statement of a policy-drawn kind.
    pub fn generate_stmt(ctx: &mut Context, scope: &ScopeCtx) -> Option<Stmt> {
        match ctx.choose_stmt_kind(scope) {
            StmtKind::Decl => DeclStmt::generate_stmt(ctx, scope).map(From::from),
            StmtKind::Expr => ExprStmt::generate_stmt(ctx, scope).map(From::from),
            StmtKind::If => IfStmt::generate_stmt(ctx, scope).map(From::from),
            StmtKind::Loop => CntLoopStmt::generate_stmt(ctx, scope).map(From::from),
        }
    }

    fn generate_branch_stmts(ctx: &mut Context, scope: &ScopeCtx) -> Option<Vec<Stmt>> {
        let num_stmts = ctx.choose_num_branch_stmts();
        let mut stmts = vec![];
        for _ in 0..num_stmts {
            stmts.push(Stmt::fuzz_stmt(ctx, scope)?);
        }
        Some(stmts)
    }
}

impl DeclStmt {
    /// A const local scalar initialized from the live operand pool. Const
    /// keeps every later read of the local loop-invariant.
    pub fn generate_stmt(ctx: &mut Context, scope: &ScopeCtx) -> Option<DeclStmt> {
        track_stmt(StmtKind::Decl, Box::new(DeclStmt::generate_stmt_internal))(ctx, scope)
    }

    fn generate_stmt_internal(ctx: &mut Context, _scope: &ScopeCtx) -> Option<DeclStmt> {
        let ty = IntTy::generate_type(ctx)?;
        let name = ctx.create_var_name();
        let is_volatile = ctx.rng.gen_bool(ctx.policy.volatile_prob);
        let is_static = ctx.choose_static_specifier();
        let init = Expr::fuzz_expr(ctx)?;
        let init: Expr = if init.ty() == ty {
            init
        } else {
            CastExpr::new(ty, init).into()
        };
        let mut var = Variable::new(name, ty, Modifier::from_flags(true, is_volatile), is_static);
        var.set_value(init.val());
        ctx.local_sym_table.add_variable(var.clone());
        Some(DeclStmt {
            data: var.into(),
            is_extern: false,
            init: Some(init),
        })
    }
}

impl ExprStmt {
    /// An assignment of a fresh expression to one external output leaf. The
    /// tracked value is updated in step with the program the statement will
    /// become.
    pub fn generate_stmt(ctx: &mut Context, scope: &ScopeCtx) -> Option<ExprStmt> {
        track_stmt(StmtKind::Expr, Box::new(ExprStmt::generate_stmt_internal))(ctx, scope)
    }

    fn generate_stmt_internal(ctx: &mut Context, _scope: &ScopeCtx) -> Option<ExprStmt> {
        let place = PlaceExpr::generate_place(ctx)?;
        let rhs = Expr::fuzz_expr(ctx)?;
        let rhs: Expr = if rhs.ty() == place.ty() {
            rhs
        } else {
            CastExpr::new(place.ty(), rhs).into()
        };
        let assign = AssignExpr::new(place, rhs);
        ctx.extern_out_sym_table.assign(&assign.place, assign.val);
        Some(ExprStmt {
            expr: assign.into(),
        })
    }
}

impl PlaceExpr {
    /// Samples one writable output leaf: a scalar, an array element at a
    /// constant in-bounds subscript, or a struct member chain.
    pub fn generate_place(ctx: &mut Context) -> Option<PlaceExpr> {
        let entries: Vec<Data> = ctx.extern_out_sym_table.entries().cloned().collect();
        let entry = entries.choose(&mut ctx.rng)?;
        match entry {
            Data::Var(var) => Some(PlaceExpr::Var(VarUseExpr::new(var))),
            Data::Array(arr) => {
                let idx = ctx.rng.gen_range(0..arr.len());
                Some(PlaceExpr::Index(IndexExpr::new(
                    arr,
                    Expr::const_val(TypedVal::int(idx as i32)),
                )))
            }
            Data::Struct(data) => {
                let paths = data.ty.scalar_leaf_paths();
                let path = paths.choose(&mut ctx.rng)?;
                Some(PlaceExpr::Member(MemberExpr::new(data, path)))
            }
        }
    }
}

impl IfStmt {
    /// The condition's value is concrete, so only the branch the program
    /// will actually take commits its value updates; the other branch is
    /// generated against a snapshot and discarded from tracking. Locals
    /// declared inside either branch die with it.
    pub fn generate_stmt(ctx: &mut Context, scope: &ScopeCtx) -> Option<IfStmt> {
        track_stmt(StmtKind::If, Box::new(IfStmt::generate_stmt_internal))(ctx, scope)
    }

    fn generate_stmt_internal(ctx: &mut Context, scope: &ScopeCtx) -> Option<IfStmt> {
        let cond = Expr::fuzz_cond(ctx)?;
        let child = scope.child(StmtKind::If);
        let outer = ctx.snapshot();

        let then = Stmt::generate_branch_stmts(ctx, &child)?;
        let then_state = ctx.snapshot();
        ctx.restore_snapshot(outer.clone());

        let otherwise = if ctx.choose_else_branch() {
            let stmts = Stmt::generate_branch_stmts(ctx, &child)?;
            Some(stmts)
        } else {
            None
        };
        let else_state = ctx.snapshot();
        ctx.restore_snapshot(outer);

        if cond.val().as_bool() {
            ctx.extern_out_sym_table = then_state.extern_out_sym_table;
        } else if otherwise.is_some() {
            ctx.extern_out_sym_table = else_state.extern_out_sym_table;
        }

        Some(IfStmt {
            cond,
            then,
            otherwise,
        })
    }
}

impl CntLoopStmt {
    /// A canonical bounded loop `for (int i = 0; i < N; ++i)`. The iterator
    /// ranges over [0, N], so the trip count is static; body expressions
    /// read only loop-invariant operands, so one application of the body's
    /// value updates matches any positive trip count, and a zero-trip loop
    /// contributes nothing.
    pub fn generate_stmt(ctx: &mut Context, scope: &ScopeCtx) -> Option<CntLoopStmt> {
        track_stmt(StmtKind::Loop, Box::new(CntLoopStmt::generate_stmt_internal))(ctx, scope)
    }

    fn generate_stmt_internal(ctx: &mut Context, scope: &ScopeCtx) -> Option<CntLoopStmt> {
        let trips = ctx.choose_loop_iterations() as i32;
        let name = ctx.create_iter_name();
        let mut iter = Variable::new(name, IntTy::Int, Modifier::None, false);
        iter.set_max(TypedVal::int(trips));
        iter.set_value(TypedVal::int(0));
        iter.set_min(TypedVal::int(0));
        let use_iter = VarUseExpr::new(&iter);
        let cond = BinaryExpr::new(BinaryOp::Lt, use_iter.clone().into(), Expr::int(trips));
        let step = UnaryExpr::new(UnaryOp::PreInc, use_iter.into());
        let iter_decl = DeclStmt {
            data: iter.into(),
            is_extern: false,
            init: Some(Expr::int(0)),
        };

        let child = scope.child(StmtKind::Loop);
        let outer = ctx.snapshot();
        let body = Stmt::generate_branch_stmts(ctx, &child)?;
        if trips == 0 {
            ctx.extern_out_sym_table = outer.extern_out_sym_table;
        }
        ctx.local_sym_table = outer.local_sym_table;

        let stmt = CntLoopStmt::new(iter_decl, cond.into(), step.into(), body);
        debug_assert_eq!(stmt.iterations(), trips as u64);
        Some(stmt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::program::generate_external_data;
    use crate::policy::Policy;

    fn seeded_ctx(seed: u64, policy: &Policy) -> Context {
        let mut ctx = Context::with_policy(seed, policy);
        generate_external_data(&mut ctx);
        ctx
    }

    #[test]
    fn assignments_update_the_tracked_output() {
        let mut ctx = seeded_ctx(41, &Policy::default());
        let scope = ScopeCtx::root();
        let stmt = ExprStmt::generate_stmt(&mut ctx, &scope).unwrap();
        let (place, val) = match &stmt.expr {
            Expr::Assign(assign) => (&assign.place, assign.val),
            other => panic!("expected an assignment, found {:?}", other),
        };
        if let PlaceExpr::Var(var_use) = place {
            let tracked = ctx
                .extern_out_sym_table
                .get_variable(&var_use.name)
                .unwrap()
                .value();
            assert_eq!(tracked, val);
        }
    }

    #[test]
    fn untaken_branch_updates_are_discarded() {
        let mut ctx = seeded_ctx(43, &Policy::control_flow());
        let scope = ScopeCtx::root();
        for _ in 0..10 {
            let before: Vec<i128> = ctx
                .extern_out_sym_table
                .leaf_exprs()
                .iter()
                .map(|leaf| leaf.val().as_i128())
                .collect();
            let stmt = IfStmt::generate_stmt(&mut ctx, &scope).unwrap();
            if !stmt.taken() && stmt.otherwise.is_none() {
                let after: Vec<i128> = ctx
                    .extern_out_sym_table
                    .leaf_exprs()
                    .iter()
                    .map(|leaf| leaf.val().as_i128())
                    .collect();
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn loop_bodies_leave_locals_scoped() {
        let mut ctx = seeded_ctx(47, &Policy::control_flow());
        let scope = ScopeCtx::root();
        let locals_before = ctx.local_sym_table.len();
        let stmt = CntLoopStmt::generate_stmt(&mut ctx, &scope).unwrap();
        assert_eq!(ctx.local_sym_table.len(), locals_before);
        assert!(stmt.iterations() <= ctx.policy.loop_iter_dist.max() as u64);
    }
}
