use lazy_static::lazy_static;
use rand::prelude::SliceRandom;
use rand::Rng;
use std::cmp::max;
use std::collections::HashMap;

use crate::ast::data::Variable;
use crate::ast::eval::TypedVal;
use crate::ast::expr::{
    BinaryExpr, CastExpr, ConstExpr, Expr, ExprKind, IndexExpr, MemberExpr, UnaryExpr, VarUseExpr,
};
use crate::ast::op::BinaryOp;
use crate::ast::ty::IntTy;
use crate::context::Context;
use crate::generate::utils::{increment_counter, limit_arith_depth, track_expr};

impl Expr {
    /// Attempts up to `ctx.policy.max_expr_attempts` times to generate a
    /// valid expression, then falls back to a constant leaf, which always
    /// succeeds.
    pub fn fuzz_expr(ctx: &mut Context) -> Option<Expr> {
        let mut res: Option<Expr> = None;
        let mut num_failed_attempts = 0;
        while res.is_none() && num_failed_attempts < ctx.policy.max_expr_attempts {
            res = Expr::generate_expr(ctx);
            if res.is_none() {
                num_failed_attempts += 1;
                ctx.statistics.max_failed_expr_attempts =
                    max(ctx.statistics.max_failed_expr_attempts, num_failed_attempts);
            }
        }
        res.or_else(|| ConstExpr::generate_expr(ctx))
    }

    /// A single attempt to generate an expression of a policy-drawn kind.
    pub fn generate_expr(ctx: &mut Context) -> Option<Expr> {
        let expr_kind = ctx.choose_expr_kind();
        match expr_kind {
            ExprKind::Const => ConstExpr::generate_expr(ctx),
            ExprKind::VarUse => VarUseExpr::generate_expr(ctx),
            ExprKind::Binary => BinaryExpr::generate_expr(ctx).map(From::from),
            ExprKind::Unary => UnaryExpr::generate_expr(ctx).map(From::from),
            ExprKind::Cast => CastExpr::generate_expr(ctx).map(From::from),
            ExprKind::Index => IndexExpr::generate_expr(ctx).map(From::from),
            ExprKind::Member => MemberExpr::generate_expr(ctx).map(From::from),
            _ => panic!("ExprKind {:?} is not generated inside arithmetic trees", expr_kind),
        }
    }

    /// A boolean-valued expression for conditions: a comparison when the
    /// policy carries one, otherwise a test against zero.
    pub fn fuzz_cond(ctx: &mut Context) -> Option<Expr> {
        match ctx.choose_comparison_op() {
            Some(op) => {
                let lhs = Expr::fuzz_expr(ctx)?;
                let rhs = Expr::fuzz_expr(ctx)?;
                Some(BinaryExpr::new(op, lhs, rhs).into())
            }
            None => {
                let expr = Expr::fuzz_expr(ctx)?;
                let zero = Expr::const_val(TypedVal::zero(expr.ty()));
                Some(BinaryExpr::new(BinaryOp::Ne, expr, zero).into())
            }
        }
    }
}

impl ConstExpr {
    pub fn generate_expr(ctx: &mut Context) -> Option<Expr> {
        track_expr(ExprKind::Const, Box::new(ConstExpr::generate_expr_internal))(ctx)
    }

    fn generate_expr_internal(ctx: &mut Context) -> Option<Expr> {
        let ty = ctx.choose_int_ty();
        let val = ty.rand_val(ctx);
        Some(Expr::const_val(TypedVal::new(ty, val)))
    }

    pub fn can_generate(_ctx: &Context) -> bool {
        true
    }
}

impl VarUseExpr {
    pub fn generate_expr(ctx: &mut Context) -> Option<Expr> {
        track_expr(ExprKind::VarUse, Box::new(VarUseExpr::generate_expr_internal))(ctx)
    }

    fn generate_expr_internal(ctx: &mut Context) -> Option<Expr> {
        let vars: Vec<&Variable> = ctx
            .extern_inp_sym_table
            .variables()
            .chain(ctx.local_sym_table.variables())
            .collect();
        let var = vars.choose(&mut ctx.rng)?;
        Some(VarUseExpr::new(var).into())
    }

    pub fn can_generate(ctx: &Context) -> bool {
        ctx.extern_inp_sym_table.has_variables() || ctx.local_sym_table.has_variables()
    }
}

impl BinaryExpr {
    pub fn generate_expr(ctx: &mut Context) -> Option<BinaryExpr> {
        track_expr(
            ExprKind::Binary,
            limit_arith_depth(Box::new(BinaryExpr::generate_expr_internal)),
        )(ctx)
    }

    /// Draws an operator and operands, then rejects any candidate whose
    /// classification is not none and redraws. A UB-flagged node never
    /// leaves this function.
    fn generate_expr_internal(ctx: &mut Context) -> Option<BinaryExpr> {
        let mut num_failed_attempts = 0;
        while num_failed_attempts < ctx.policy.max_expr_attempts {
            let op = ctx.choose_binary_op();
            let lhs = Expr::fuzz_expr(ctx)?;
            let rhs = Expr::fuzz_expr(ctx)?;
            let expr = BinaryExpr::new(op, lhs, rhs);
            let res = if expr.ub.is_ub() { None } else { Some(expr) };
            increment_counter(
                &res,
                op,
                &mut ctx.statistics.successful_mapping.bin_op_counter,
                &mut ctx.statistics.failed_mapping.bin_op_counter,
            );
            if res.is_some() {
                return res;
            }
            num_failed_attempts += 1;
        }
        None
    }

    pub fn can_generate(ctx: &Context) -> bool {
        ctx.arith_depth < ctx.policy.max_arith_depth
    }
}

impl UnaryExpr {
    pub fn generate_expr(ctx: &mut Context) -> Option<UnaryExpr> {
        track_expr(
            ExprKind::Unary,
            limit_arith_depth(Box::new(UnaryExpr::generate_expr_internal)),
        )(ctx)
    }

    fn generate_expr_internal(ctx: &mut Context) -> Option<UnaryExpr> {
        let mut num_failed_attempts = 0;
        while num_failed_attempts < ctx.policy.max_expr_attempts {
            let op = ctx.choose_unary_op();
            if op.is_step_op() {
                // Steps mutate a place; they belong to loop headers only.
                num_failed_attempts += 1;
                continue;
            }
            let arg = Expr::fuzz_expr(ctx)?;
            let expr = UnaryExpr::new(op, arg);
            let res = if expr.ub.is_ub() { None } else { Some(expr) };
            increment_counter(
                &res,
                op,
                &mut ctx.statistics.successful_mapping.un_op_counter,
                &mut ctx.statistics.failed_mapping.un_op_counter,
            );
            if res.is_some() {
                return res;
            }
            num_failed_attempts += 1;
        }
        None
    }

    pub fn can_generate(ctx: &Context) -> bool {
        ctx.arith_depth < ctx.policy.max_arith_depth
    }
}

impl CastExpr {
    pub fn generate_expr(ctx: &mut Context) -> Option<CastExpr> {
        track_expr(
            ExprKind::Cast,
            limit_arith_depth(Box::new(CastExpr::generate_expr_internal)),
        )(ctx)
    }

    fn generate_expr_internal(ctx: &mut Context) -> Option<CastExpr> {
        let ty = IntTy::generate_type(ctx)?;
        let expr = Expr::fuzz_expr(ctx)?;
        Some(CastExpr::new(ty, expr))
    }

    pub fn can_generate(ctx: &Context) -> bool {
        ctx.arith_depth < ctx.policy.max_arith_depth
    }
}

impl IndexExpr {
    pub fn generate_expr(ctx: &mut Context) -> Option<IndexExpr> {
        track_expr(ExprKind::Index, Box::new(IndexExpr::generate_expr_internal))(ctx)
    }

    /// Subscripts an input array with a constant drawn in bounds, so the
    /// node can never classify as out-of-bounds.
    fn generate_expr_internal(ctx: &mut Context) -> Option<IndexExpr> {
        if !ctx.extern_inp_sym_table.has_arrays() {
            return None;
        }
        let arr = ctx
            .extern_inp_sym_table
            .rand_array(&mut ctx.rng)
            .clone();
        let idx = ctx.rng.gen_range(0..arr.len());
        let expr = IndexExpr::new(&arr, Expr::const_val(TypedVal::int(idx as i32)));
        assert!(!expr.ub.is_ub(), "in-bounds subscript classified as UB");
        Some(expr)
    }

    pub fn can_generate(ctx: &Context) -> bool {
        ctx.extern_inp_sym_table.has_arrays()
    }
}

impl MemberExpr {
    pub fn generate_expr(ctx: &mut Context) -> Option<MemberExpr> {
        track_expr(ExprKind::Member, Box::new(MemberExpr::generate_expr_internal))(ctx)
    }

    fn generate_expr_internal(ctx: &mut Context) -> Option<MemberExpr> {
        if !ctx.extern_inp_sym_table.has_structs() {
            return None;
        }
        let data = ctx
            .extern_inp_sym_table
            .rand_struct(&mut ctx.rng)
            .clone();
        let paths = data.ty.scalar_leaf_paths();
        let path = paths.choose(&mut ctx.rng)?;
        Some(MemberExpr::new(&data, path))
    }

    pub fn can_generate(ctx: &Context) -> bool {
        ctx.extern_inp_sym_table.has_structs()
    }
}

lazy_static! {
    pub static ref GENERABLE_EXPR_FNS: HashMap<ExprKind, fn(&Context) -> bool> = {
        let mut map: HashMap<ExprKind, fn(&Context) -> bool> = HashMap::new();
        map.insert(ExprKind::Const, ConstExpr::can_generate);
        map.insert(ExprKind::VarUse, VarUseExpr::can_generate);
        map.insert(ExprKind::Binary, BinaryExpr::can_generate);
        map.insert(ExprKind::Unary, UnaryExpr::can_generate);
        map.insert(ExprKind::Cast, CastExpr::can_generate);
        map.insert(ExprKind::Index, IndexExpr::can_generate);
        map.insert(ExprKind::Member, MemberExpr::can_generate);
        map
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::eval::UbKind;
    use crate::policy::Policy;

    fn walk_ub_free(expr: &Expr) {
        assert_eq!(expr.ub(), UbKind::None, "UB-flagged node reached a finished tree");
        match expr {
            Expr::Binary(e) => {
                walk_ub_free(&e.lhs);
                walk_ub_free(&e.rhs);
            }
            Expr::Unary(e) => walk_ub_free(&e.expr),
            Expr::Cast(e) => walk_ub_free(&e.expr),
            Expr::Index(e) => walk_ub_free(&e.index),
            _ => {}
        }
    }

    #[test]
    fn generated_trees_are_ub_free_and_type_sound() {
        let mut ctx = Context::with_policy(17, &Policy::default());
        for _ in 0..100 {
            let expr = Expr::fuzz_expr(&mut ctx).unwrap();
            walk_ub_free(&expr);
            // The propagated value fits the resolved type.
            assert_eq!(expr.val().ty, expr.ty());
            assert_eq!(expr.val().val, expr.ty().cast_value(expr.val().val));
        }
    }

    #[test]
    fn shift_heavy_policies_still_converge() {
        let mut ctx = Context::with_policy(23, &Policy::shifts());
        for _ in 0..50 {
            let expr = Expr::fuzz_expr(&mut ctx).unwrap();
            walk_ub_free(&expr);
        }
    }

    #[test]
    fn conditions_resolve_to_bool_with_known_value() {
        let mut ctx = Context::with_policy(29, &Policy::default());
        for _ in 0..20 {
            let cond = Expr::fuzz_cond(&mut ctx).unwrap();
            assert_eq!(cond.ty(), IntTy::Bool);
            walk_ub_free(&cond);
        }
    }
}
