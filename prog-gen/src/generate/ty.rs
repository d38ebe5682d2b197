use crate::ast::data::Modifier;
use crate::ast::ty::{IntTy, StructTy, TyKind};
use crate::context::Context;
use crate::generate::utils::track_ty;
use rand::prelude::SliceRandom;

impl IntTy {
    /// Draws one scalar type from the policy's eligible set. A single-entry
    /// set degenerates to that entry on every invocation.
    pub fn generate_type(ctx: &mut Context) -> Option<IntTy> {
        track_ty(TyKind::Int, Box::new(IntTy::generate_type_internal))(ctx)
    }

    fn generate_type_internal(ctx: &mut Context) -> Option<IntTy> {
        Some(ctx.choose_int_ty())
    }
}

impl Modifier {
    pub fn generate_modifier(ctx: &mut Context, allow_const: bool) -> Modifier {
        ctx.choose_modifier(allow_const)
    }
}

impl StructTy {
    /// Builds one new struct type. Members are scalars or, bounded by the
    /// policy's nesting depth, previously-frozen struct types drawn from the
    /// pool; the type under construction is never eligible, so cyclic
    /// nesting cannot arise. The finished type is frozen and pooled.
    pub fn generate_new_type(ctx: &mut Context) -> Option<StructTy> {
        track_ty(TyKind::Struct, Box::new(StructTy::generate_new_type_internal))(ctx)
    }

    fn generate_new_type_internal(ctx: &mut Context) -> Option<StructTy> {
        let name = ctx.create_struct_type_name();
        let len = ctx.choose_struct_member_count().max(1);
        let mut ty = StructTy::new(name);
        for i in 0..len {
            let member_name = ctx.create_member_name(i);
            let eligible: Vec<StructTy> = ctx
                .struct_type_pool
                .iter()
                .filter(|nested| nested.struct_depth() + 1 <= ctx.policy.max_struct_depth)
                .cloned()
                .collect();
            if !eligible.is_empty() && ctx.choose_nested_struct() {
                let nested = eligible.choose(&mut ctx.rng).unwrap().clone();
                ty.add_member(nested.into(), member_name)
                    .expect("pooled struct types are always frozen");
            } else {
                let int_ty = IntTy::generate_type(ctx)?;
                ty.add_member(int_ty.into(), member_name)
                    .expect("a struct type under construction accepts scalar members");
            }
        }
        ty.freeze();
        ctx.struct_type_pool.push(ty.clone());
        Some(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Policy, PolicyBuilder};

    #[test]
    fn single_entry_type_set_degenerates_deterministically() {
        let policy = PolicyBuilder::from_policy(Policy::default())
            .int_type_dist(vec![(IntTy::UShort, 1.0)])
            .build()
            .unwrap();
        let mut ctx = Context::with_policy(7, &policy);
        for _ in 0..32 {
            assert_eq!(IntTy::generate_type(&mut ctx), Some(IntTy::UShort));
        }
    }

    #[test]
    fn generated_struct_types_are_frozen_and_pooled() {
        let mut ctx = Context::with_policy(11, &Policy::composite());
        let ty = StructTy::generate_new_type(&mut ctx).unwrap();
        assert!(ty.is_frozen());
        assert!(ty.num_members() >= 1);
        assert_eq!(ctx.struct_type_pool.len(), 1);
    }

    #[test]
    fn nested_members_respect_the_depth_cap() {
        let policy = PolicyBuilder::from_policy(Policy::composite())
            .nested_struct_prob(1.0)
            .max_struct_depth(2)
            .build()
            .unwrap();
        let mut ctx = Context::with_policy(13, &policy);
        for _ in 0..8 {
            let ty = StructTy::generate_new_type(&mut ctx).unwrap();
            assert!(ty.struct_depth() <= policy.max_struct_depth);
        }
    }
}
