//! Named storage: scalar variables, arrays and struct instances.

use crate::ast::eval::TypedVal;
use crate::ast::ty::{IntTy, StructTy, Ty};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Modifier {
    None,
    Const,
    Volatile,
    ConstVolatile,
}

impl Modifier {
    pub fn from_flags(is_const: bool, is_volatile: bool) -> Modifier {
        match (is_const, is_volatile) {
            (false, false) => Modifier::None,
            (true, false) => Modifier::Const,
            (false, true) => Modifier::Volatile,
            (true, true) => Modifier::ConstVolatile,
        }
    }

    pub fn is_const(self) -> bool {
        matches!(self, Modifier::Const | Modifier::ConstVolatile)
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Modifier::None => "",
            Modifier::Const => "const ",
            Modifier::Volatile => "volatile ",
            Modifier::ConstVolatile => "const volatile ",
        }
    }
}

/// A scalar variable with a declared inclusive range. The invariant
/// min <= value <= max holds at every point; violating it indicates a bug in
/// a generator and is fatal.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: IntTy,
    pub modifier: Modifier,
    pub is_static: bool,
    value: TypedVal,
    min: TypedVal,
    max: TypedVal,
    initialized: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: IntTy, modifier: Modifier, is_static: bool) -> Variable {
        Variable {
            name: name.into(),
            ty,
            modifier,
            is_static,
            value: TypedVal::zero(ty),
            min: TypedVal::new(ty, ty.min_value()),
            max: TypedVal::new(ty, ty.max_value()),
            initialized: false,
        }
    }

    pub fn value(&self) -> TypedVal {
        self.value
    }

    pub fn min(&self) -> TypedVal {
        self.min
    }

    pub fn max(&self) -> TypedVal {
        self.max
    }

    pub fn set_value(&mut self, val: TypedVal) {
        let val = val.cast(self.ty);
        assert!(
            !(self.modifier.is_const() && self.initialized),
            "cannot reassign const variable {}",
            self.name
        );
        assert!(
            self.min.as_i128() <= val.as_i128() && val.as_i128() <= self.max.as_i128(),
            "value {} of variable {} outside declared range [{}, {}]",
            val.as_i128(),
            self.name,
            self.min.as_i128(),
            self.max.as_i128()
        );
        self.value = val;
        self.initialized = true;
    }

    pub fn set_min(&mut self, min: TypedVal) {
        let min = min.cast(self.ty);
        assert!(
            min.as_i128() <= self.value.as_i128(),
            "new minimum {} of variable {} exceeds current value {}",
            min.as_i128(),
            self.name,
            self.value.as_i128()
        );
        self.min = min;
    }

    pub fn set_max(&mut self, max: TypedVal) {
        let max = max.cast(self.ty);
        assert!(
            self.value.as_i128() <= max.as_i128(),
            "new maximum {} of variable {} is below current value {}",
            max.as_i128(),
            self.name,
            self.value.as_i128()
        );
        self.max = max;
    }
}

/// A fixed-length array with per-element values. Elements share the full
/// range of the element type; bounds violations are fatal internal errors.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayData {
    pub name: String,
    pub elem_ty: IntTy,
    pub modifier: Modifier,
    align: Option<u32>,
    values: Vec<TypedVal>,
}

impl ArrayData {
    pub fn new(name: impl Into<String>, elem_ty: IntTy, modifier: Modifier, len: usize) -> ArrayData {
        ArrayData {
            name: name.into(),
            elem_ty,
            modifier,
            align: None,
            values: vec![TypedVal::zero(elem_ty); len],
        }
    }

    pub fn set_align(&mut self, align: u32) {
        assert!(align.is_power_of_two(), "alignment must be a power of two");
        self.align = Some(align);
    }

    pub fn align(&self) -> Option<u32> {
        self.align
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn elems(&self) -> &[TypedVal] {
        &self.values
    }

    pub fn elem(&self, idx: usize) -> TypedVal {
        assert!(
            idx < self.values.len(),
            "element index {} out of range for array {} of length {}",
            idx,
            self.name,
            self.values.len()
        );
        self.values[idx]
    }

    pub fn set_elem(&mut self, idx: usize, val: TypedVal) {
        assert!(
            idx < self.values.len(),
            "element index {} out of range for array {} of length {}",
            idx,
            self.name,
            self.values.len()
        );
        self.values[idx] = val.cast(self.elem_ty);
    }
}

/// Per-member value of a struct instance, recursively.
#[derive(Debug, Clone, PartialEq)]
pub enum DataVal {
    Scalar(TypedVal),
    Struct(Vec<DataVal>),
}

/// An instance of a frozen struct type. Creating the first instance freezes
/// the type for good.
#[derive(Debug, Clone, PartialEq)]
pub struct StructData {
    pub name: String,
    pub ty: StructTy,
    pub modifier: Modifier,
    members: Vec<DataVal>,
}

fn zeroed_members(ty: &StructTy) -> Vec<DataVal> {
    ty.members()
        .iter()
        .map(|m| match &m.ty {
            Ty::Int(int_ty) => DataVal::Scalar(TypedVal::zero(*int_ty)),
            Ty::Struct(struct_ty) => DataVal::Struct(zeroed_members(struct_ty)),
        })
        .collect()
}

impl StructData {
    pub fn new(name: impl Into<String>, ty: &mut StructTy, modifier: Modifier) -> StructData {
        ty.freeze();
        StructData {
            name: name.into(),
            ty: ty.clone(),
            modifier,
            members: zeroed_members(ty),
        }
    }

    pub fn member(&self, idx: usize) -> &DataVal {
        self.ty.member(idx);
        &self.members[idx]
    }

    /// Reads the scalar leaf reached by `path`, one member index per nesting
    /// level. A path that does not end at a scalar is a generator bug.
    pub fn leaf(&self, path: &[usize]) -> TypedVal {
        fn walk(ty: &StructTy, members: &[DataVal], path: &[usize]) -> TypedVal {
            let (idx, rest) = path
                .split_first()
                .expect("member path must not be empty");
            let member_ty = ty.member(*idx);
            match (&members[*idx], &member_ty.ty) {
                (DataVal::Scalar(val), Ty::Int(_)) => {
                    assert!(rest.is_empty(), "member path continues past scalar leaf");
                    *val
                }
                (DataVal::Struct(inner), Ty::Struct(inner_ty)) => walk(inner_ty, inner, rest),
                _ => panic!("struct member values diverge from the type definition"),
            }
        }
        walk(&self.ty, &self.members, path)
    }

    pub fn set_leaf(&mut self, path: &[usize], val: TypedVal) {
        fn walk(ty: &StructTy, members: &mut [DataVal], path: &[usize], val: TypedVal) {
            let (idx, rest) = path
                .split_first()
                .expect("member path must not be empty");
            let member_ty = ty.member(*idx).clone();
            match (&mut members[*idx], member_ty.ty) {
                (DataVal::Scalar(slot), Ty::Int(int_ty)) => {
                    assert!(rest.is_empty(), "member path continues past scalar leaf");
                    *slot = val.cast(int_ty);
                }
                (DataVal::Struct(inner), Ty::Struct(inner_ty)) => walk(&inner_ty, inner, rest, val),
                _ => panic!("struct member values diverge from the type definition"),
            }
        }
        walk(&self.ty.clone(), &mut self.members, path, val);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Var(Variable),
    Array(ArrayData),
    Struct(StructData),
}

impl Data {
    pub fn name(&self) -> &str {
        match self {
            Data::Var(var) => &var.name,
            Data::Array(arr) => &arr.name,
            Data::Struct(s) => &s.name,
        }
    }
}

impl From<Variable> for Data {
    fn from(var: Variable) -> Data {
        Data::Var(var)
    }
}

impl From<ArrayData> for Data {
    fn from(arr: ArrayData) -> Data {
        Data::Array(arr)
    }
}

impl From<StructData> for Data {
    fn from(s: StructData) -> Data {
        Data::Struct(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum DataKind {
    Var,
    Array,
    Struct,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_range_tracks_value() {
        let mut var = Variable::new("i", IntTy::ULong, Modifier::None, false);
        var.set_value(TypedVal::new(IntTy::ULong, 10));
        var.set_min(TypedVal::new(IntTy::ULong, 5));
        var.set_max(TypedVal::new(IntTy::ULong, 50));
        assert_eq!(var.value().as_i128(), 10);
        assert_eq!(var.min().as_i128(), 5);
        assert_eq!(var.max().as_i128(), 50);
    }

    #[test]
    #[should_panic(expected = "outside declared range")]
    fn value_outside_range_is_fatal() {
        let mut var = Variable::new("i", IntTy::UChar, Modifier::None, false);
        var.set_max(TypedVal::new(IntTy::UChar, 10));
        var.set_value(TypedVal::new(IntTy::UChar, 11));
    }

    #[test]
    #[should_panic(expected = "cannot reassign const")]
    fn const_reassignment_is_fatal() {
        let mut var = Variable::new("c", IntTy::Int, Modifier::Const, false);
        var.set_value(TypedVal::int(1));
        var.set_value(TypedVal::int(2));
    }

    #[test]
    fn array_alignment_is_recorded() {
        let mut arr = ArrayData::new("a", IntTy::Int, Modifier::None, 3);
        assert_eq!(arr.align(), None);
        arr.set_align(16);
        assert_eq!(arr.align(), Some(16));
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn odd_alignment_is_fatal() {
        let mut arr = ArrayData::new("a", IntTy::Int, Modifier::None, 3);
        arr.set_align(12);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn array_bounds_are_fatal() {
        let arr = ArrayData::new("a", IntTy::Int, Modifier::None, 3);
        arr.elem(3);
    }

    #[test]
    fn instantiation_freezes_struct_type() {
        let mut ty = StructTy::new("S0");
        ty.add_member(IntTy::UInt.into(), "member_0").unwrap();
        let _instance = StructData::new("struct_0", &mut ty, Modifier::None);
        assert!(ty.is_frozen());
        assert!(ty.add_member(IntTy::Int.into(), "member_1").is_err());
    }

    #[test]
    fn struct_leaf_access_follows_member_paths() {
        let mut inner = StructTy::new("S0");
        inner.add_member(IntTy::Short.into(), "member_0").unwrap();
        inner.freeze();
        let mut outer = StructTy::new("S1");
        outer.add_member(IntTy::Bool.into(), "member_0").unwrap();
        outer.add_member(inner.into(), "member_1").unwrap();
        let mut s = StructData::new("struct_0", &mut outer, Modifier::None);
        s.set_leaf(&[1, 0], TypedVal::new(IntTy::Short, 7));
        assert_eq!(s.leaf(&[1, 0]).as_i128(), 7);
        assert_eq!(s.leaf(&[0]).as_bool(), false);
    }
}
