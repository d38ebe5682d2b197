use crate::ast::expr::ExprKind;
use crate::ast::stmt::StmtKind;
use crate::ast::ty::TyKind;
use crate::context::{Context, ScopeCtx};
use std::collections::BTreeMap;

/// Depth limiter for arithmetic trees: the wrapped generator only runs while
/// the policy's depth cap has headroom.
pub fn limit_arith_depth<T: 'static>(
    f: Box<dyn FnOnce(&mut Context) -> Option<T>>,
) -> Box<dyn FnOnce(&mut Context) -> Option<T>> {
    Box::new(|ctx| -> Option<T> {
        if ctx.arith_depth >= ctx.policy.max_arith_depth {
            return None;
        }
        ctx.arith_depth += 1;
        let res = f(ctx);
        ctx.arith_depth -= 1;
        res
    })
}

macro_rules! track_function {
    ($function_name: ident, $kind: ty, $counter: ident, $($arg: ident: $arg_ty: ty),*) => {
        pub fn $function_name<T: 'static>(
            kind: $kind,
            f: Box<dyn FnOnce(&mut Context, $($arg_ty),*) -> Option<T>>,
        ) -> Box<dyn FnOnce(&mut Context, $($arg_ty),*) -> Option<T>> {
            Box::new(move |ctx, $($arg),*| -> Option<T> {
                let res = f(ctx, $($arg),*);
                if res.is_some() {
                    *ctx.statistics
                        .successful_mapping
                        .$counter
                        .entry(kind)
                        .or_insert(0) += 1;
                } else {
                    *ctx.statistics
                        .failed_mapping
                        .$counter
                        .entry(kind)
                        .or_insert(0) += 1;
                }
                res
            })
        }
    };
}

track_function!(track_expr, ExprKind, expr_counter,);
track_function!(track_ty, TyKind, ty_counter,);
track_function!(track_stmt, StmtKind, stmt_counter, scope: &ScopeCtx<'_>);

pub fn increment_counter<T, K: Ord>(
    res: &Option<T>,
    key: K,
    success_counter: &mut BTreeMap<K, usize>,
    failed_counter: &mut BTreeMap<K, usize>,
) {
    if res.is_some() {
        *success_counter.entry(key).or_insert(0) += 1;
    } else {
        *failed_counter.entry(key).or_insert(0) += 1;
    }
}
