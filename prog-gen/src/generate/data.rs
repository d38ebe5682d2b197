use crate::ast::data::{ArrayData, Data, DataKind, Modifier, StructData, Variable};
use crate::ast::eval::TypedVal;
use crate::ast::ty::IntTy;
use crate::context::Context;
use rand::Rng;

impl Variable {
    /// One finished scalar with a random value across its full declared
    /// range.
    pub fn generate_var(ctx: &mut Context, allow_const: bool) -> Option<Variable> {
        let ty = IntTy::generate_type(ctx)?;
        let name = ctx.create_var_name();
        let modifier = Modifier::generate_modifier(ctx, allow_const);
        let mut var = Variable::new(name, ty, modifier, false);
        let val = ty.rand_val(ctx);
        var.set_value(TypedVal::new(ty, val));
        Some(var)
    }
}

impl ArrayData {
    pub fn generate_array(ctx: &mut Context, allow_const: bool) -> Option<ArrayData> {
        let elem_ty = IntTy::generate_type(ctx)?;
        let name = ctx.create_array_name();
        let modifier = Modifier::generate_modifier(ctx, allow_const);
        let len = ctx.choose_array_length();
        let mut arr = ArrayData::new(name, elem_ty, modifier, len);
        if let Some(align) = ctx.choose_array_align() {
            arr.set_align(align);
        }
        for i in 0..len {
            let val = elem_ty.rand_val(ctx);
            arr.set_elem(i, TypedVal::new(elem_ty, val));
        }
        Some(arr)
    }
}

impl StructData {
    /// Instantiates one pooled struct type with random leaf values.
    /// Instantiation freezes the type; pooled types already are.
    pub fn generate_struct(ctx: &mut Context, _allow_const: bool) -> Option<StructData> {
        if ctx.struct_type_pool.is_empty() {
            return None;
        }
        let idx = ctx.rng.gen_range(0..ctx.struct_type_pool.len());
        let mut ty = ctx.struct_type_pool[idx].clone();
        let name = ctx.create_struct_name();
        // Struct instances are filled in member-by-member by the generated
        // init function, so they are never const-qualified.
        let modifier = Modifier::generate_modifier(ctx, false);
        let mut data = StructData::new(name, &mut ty, modifier);
        for path in ty.scalar_leaf_paths() {
            let leaf_ty = data.leaf(&path).ty;
            let val = leaf_ty.rand_val(ctx);
            data.set_leaf(&path, TypedVal::new(leaf_ty, val));
        }
        Some(data)
    }
}

impl Data {
    pub fn generate_data(ctx: &mut Context, kind: DataKind, allow_const: bool) -> Option<Data> {
        match kind {
            DataKind::Var => Variable::generate_var(ctx, allow_const).map(From::from),
            DataKind::Array => ArrayData::generate_array(ctx, allow_const).map(From::from),
            DataKind::Struct => StructData::generate_struct(ctx, allow_const).map(From::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;

    #[test]
    fn generated_scalars_respect_their_range() {
        let mut ctx = Context::with_policy(3, &Policy::default());
        for _ in 0..64 {
            let var = Variable::generate_var(&mut ctx, true).unwrap();
            let value = var.value().as_i128();
            assert!(var.min().as_i128() <= value && value <= var.max().as_i128());
        }
    }

    #[test]
    fn struct_generation_requires_a_pooled_type() {
        let mut ctx = Context::with_policy(3, &Policy::default());
        assert!(StructData::generate_struct(&mut ctx, false).is_none());
    }
}
