//! Type nodes of the generated dialect.

use crate::context::Context;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Integer kinds of the target dialect, with fixed widths (char 8, short 16,
/// int 32, long 64, long long 64) and two's complement representation.
/// `Char` is emitted as `signed char` so its signedness is not
/// implementation-defined.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum IntTy {
    Bool,
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
}

impl IntTy {
    pub fn all() -> Vec<IntTy> {
        vec![
            IntTy::Bool,
            IntTy::Char,
            IntTy::UChar,
            IntTy::Short,
            IntTy::UShort,
            IntTy::Int,
            IntTy::UInt,
            IntTy::Long,
            IntTy::ULong,
            IntTy::LongLong,
            IntTy::ULongLong,
        ]
    }

    pub fn bit_width(self) -> u32 {
        match self {
            IntTy::Bool => 1,
            IntTy::Char | IntTy::UChar => 8,
            IntTy::Short | IntTy::UShort => 16,
            IntTy::Int | IntTy::UInt => 32,
            IntTy::Long | IntTy::ULong | IntTy::LongLong | IntTy::ULongLong => 64,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            IntTy::Char | IntTy::Short | IntTy::Int | IntTy::Long | IntTy::LongLong
        )
    }

    /// Conversion rank ordering of the dialect.
    pub fn rank(self) -> u32 {
        match self {
            IntTy::Bool => 0,
            IntTy::Char | IntTy::UChar => 1,
            IntTy::Short | IntTy::UShort => 2,
            IntTy::Int | IntTy::UInt => 3,
            IntTy::Long | IntTy::ULong => 4,
            IntTy::LongLong | IntTy::ULongLong => 5,
        }
    }

    pub fn unsigned_counterpart(self) -> IntTy {
        match self {
            IntTy::Char => IntTy::UChar,
            IntTy::Short => IntTy::UShort,
            IntTy::Int => IntTy::UInt,
            IntTy::Long => IntTy::ULong,
            IntTy::LongLong => IntTy::ULongLong,
            _ => self,
        }
    }

    /// Integer promotion: every kind of rank below `int` fits in `int` and
    /// promotes to it.
    pub fn promoted(self) -> IntTy {
        if self.rank() < IntTy::Int.rank() {
            IntTy::Int
        } else {
            self
        }
    }

    /// The usual arithmetic conversions over two already-promoted operands.
    /// Equal rank with mixed signedness resolves to the unsigned operand;
    /// a higher-ranked signed operand wins only when it can represent every
    /// value of the unsigned one.
    pub fn common_ty(lhs: IntTy, rhs: IntTy) -> IntTy {
        let lhs = lhs.promoted();
        let rhs = rhs.promoted();
        if lhs == rhs {
            return lhs;
        }
        if lhs.is_signed() == rhs.is_signed() {
            return if lhs.rank() >= rhs.rank() { lhs } else { rhs };
        }
        let (signed, unsigned) = if lhs.is_signed() { (lhs, rhs) } else { (rhs, lhs) };
        if unsigned.rank() >= signed.rank() {
            unsigned
        } else if signed.bit_width() > unsigned.bit_width() {
            signed
        } else {
            signed.unsigned_counterpart()
        }
    }

    /// Bit pattern of the smallest representable value, sign-extended to u128.
    pub fn min_value(self) -> u128 {
        match self {
            IntTy::Bool => 0,
            IntTy::Char => i8::MIN as u128,
            IntTy::UChar => 0,
            IntTy::Short => i16::MIN as u128,
            IntTy::UShort => 0,
            IntTy::Int => i32::MIN as u128,
            IntTy::UInt => 0,
            IntTy::Long | IntTy::LongLong => i64::MIN as u128,
            IntTy::ULong | IntTy::ULongLong => 0,
        }
    }

    /// Bit pattern of the largest representable value.
    pub fn max_value(self) -> u128 {
        match self {
            IntTy::Bool => 1,
            IntTy::Char => i8::MAX as u128,
            IntTy::UChar => u8::MAX as u128,
            IntTy::Short => i16::MAX as u128,
            IntTy::UShort => u16::MAX as u128,
            IntTy::Int => i32::MAX as u128,
            IntTy::UInt => u32::MAX as u128,
            IntTy::Long | IntTy::LongLong => i64::MAX as u128,
            IntTy::ULong | IntTy::ULongLong => u64::MAX as u128,
        }
    }

    /// Wraps an arbitrary bit pattern to this type's representation.
    /// Signed values are stored sign-extended to u128, matching the literal
    /// representation used throughout the AST.
    pub fn cast_value(self, value: u128) -> u128 {
        match self {
            IntTy::Bool => (value != 0) as u128,
            IntTy::Char => value as i8 as u128,
            IntTy::UChar => value as u8 as u128,
            IntTy::Short => value as i16 as u128,
            IntTy::UShort => value as u16 as u128,
            IntTy::Int => value as i32 as u128,
            IntTy::UInt => value as u32 as u128,
            IntTy::Long | IntTy::LongLong => value as i64 as u128,
            IntTy::ULong | IntTy::ULongLong => value as u64 as u128,
        }
    }

    /// Draws a full-range random value of this type.
    pub fn rand_val(self, ctx: &mut Context) -> u128 {
        let rng = &mut ctx.rng;
        match self {
            IntTy::Bool => rng.gen::<bool>() as u128,
            IntTy::Char => rng.gen::<i8>() as u128,
            IntTy::UChar => rng.gen::<u8>() as u128,
            IntTy::Short => rng.gen::<i16>() as u128,
            IntTy::UShort => rng.gen::<u16>() as u128,
            IntTy::Int => rng.gen::<i32>() as u128,
            IntTy::UInt => rng.gen::<u32>() as u128,
            IntTy::Long | IntTy::LongLong => rng.gen::<i64>() as u128,
            IntTy::ULong | IntTy::ULongLong => rng.gen::<u64>() as u128,
        }
    }
}

/// A type of the generated dialect: an integer kind or a struct type.
#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Int(IntTy),
    Struct(StructTy),
}

impl Ty {
    pub fn is_struct(&self) -> bool {
        matches!(self, Ty::Struct(_))
    }

    pub fn struct_depth(&self) -> usize {
        match self {
            Ty::Int(_) => 0,
            Ty::Struct(struct_ty) => struct_ty.struct_depth(),
        }
    }
}

impl From<IntTy> for Ty {
    fn from(ty: IntTy) -> Ty {
        Ty::Int(ty)
    }
}

impl From<StructTy> for Ty {
    fn from(ty: StructTy) -> Ty {
        Ty::Struct(ty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberDef {
    pub name: String,
    pub ty: Ty,
}

/// An aggregate type with an ordered member list. The list is append-only
/// until the type is frozen; a type freezes when its generator completes it,
/// and at the latest when the first value of the type is instantiated.
#[derive(Debug, Clone, PartialEq)]
pub struct StructTy {
    pub name: String,
    members: Vec<MemberDef>,
    frozen: bool,
}

impl StructTy {
    pub fn new(name: impl Into<String>) -> StructTy {
        StructTy {
            name: name.into(),
            members: vec![],
            frozen: false,
        }
    }

    /// Appends a member. Fails on a frozen type, and fails when the member is
    /// a struct type that is not yet frozen itself, which statically rules
    /// out self-nesting and mutual nesting.
    pub fn add_member(&mut self, ty: Ty, name: impl Into<String>) -> Result<(), StructTyError> {
        if self.frozen {
            return Err(StructTyError::Frozen(self.name.clone()));
        }
        if let Ty::Struct(member_ty) = &ty {
            if !member_ty.is_frozen() {
                return Err(StructTyError::UnfrozenMember {
                    parent: self.name.clone(),
                    member: member_ty.name.clone(),
                });
            }
        }
        self.members.push(MemberDef {
            name: name.into(),
            ty,
        });
        Ok(())
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn num_members(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> &[MemberDef] {
        &self.members
    }

    /// Bounds-checked member lookup. An out-of-range index is a generator
    /// bug, never a recoverable condition.
    pub fn member(&self, idx: usize) -> &MemberDef {
        assert!(
            idx < self.members.len(),
            "member index {} out of range for struct type {} with {} members",
            idx,
            self.name,
            self.members.len()
        );
        &self.members[idx]
    }

    pub fn struct_depth(&self) -> usize {
        1 + self
            .members
            .iter()
            .map(|m| m.ty.struct_depth())
            .max()
            .unwrap_or_default()
    }

    /// Enumerates the member paths of every scalar leaf, in declaration
    /// order, one member index per nesting level.
    pub fn scalar_leaf_paths(&self) -> Vec<Vec<usize>> {
        let mut paths = vec![];
        for (i, member) in self.members.iter().enumerate() {
            match &member.ty {
                Ty::Int(_) => paths.push(vec![i]),
                Ty::Struct(inner) => {
                    for mut path in inner.scalar_leaf_paths() {
                        path.insert(0, i);
                        paths.push(path);
                    }
                }
            }
        }
        paths
    }

    /// Whether this type directly or transitively contains the named struct.
    pub fn contains_struct(&self, name: &str) -> bool {
        self.members.iter().any(|m| match &m.ty {
            Ty::Int(_) => false,
            Ty::Struct(struct_ty) => struct_ty.name == name || struct_ty.contains_struct(name),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructTyError {
    Frozen(String),
    UnfrozenMember { parent: String, member: String },
}

impl Error for StructTyError {}

impl Display for StructTyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StructTyError::Frozen(name) => {
                write!(f, "struct type {} is frozen and cannot gain members", name)
            }
            StructTyError::UnfrozenMember { parent, member } => write!(
                f,
                "struct type {} cannot nest unfrozen struct type {}",
                parent, member
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum TyKind {
    Int,
    Struct,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint_width_and_signedness() {
        let ty = IntTy::UInt;
        assert_eq!(ty.bit_width(), 32);
        assert!(!ty.is_signed());
        assert_eq!(ty.promoted(), IntTy::UInt);
    }

    #[test]
    fn narrow_types_promote_to_int() {
        for ty in [IntTy::Bool, IntTy::Char, IntTy::UChar, IntTy::Short, IntTy::UShort] {
            assert_eq!(ty.promoted(), IntTy::Int);
        }
    }

    #[test]
    fn common_ty_equal_rank_mixed_signedness_is_unsigned() {
        assert_eq!(IntTy::common_ty(IntTy::Int, IntTy::UInt), IntTy::UInt);
        assert_eq!(IntTy::common_ty(IntTy::LongLong, IntTy::ULongLong), IntTy::ULongLong);
    }

    #[test]
    fn common_ty_signed_wins_when_wider() {
        // long (64) represents every unsigned int (32) value.
        assert_eq!(IntTy::common_ty(IntTy::Long, IntTy::UInt), IntTy::Long);
    }

    #[test]
    fn common_ty_unsigned_counterpart_on_equal_width() {
        // long long cannot represent every unsigned long value.
        assert_eq!(IntTy::common_ty(IntTy::LongLong, IntTy::ULong), IntTy::ULongLong);
    }

    #[test]
    fn common_ty_promotes_narrow_operands() {
        assert_eq!(IntTy::common_ty(IntTy::UChar, IntTy::UChar), IntTy::Int);
        assert_eq!(IntTy::common_ty(IntTy::Short, IntTy::Bool), IntTy::Int);
    }

    #[test]
    fn cast_value_truncates_and_sign_extends() {
        assert_eq!(IntTy::Char.cast_value(0x1FF), 0x1FFu128 as u8 as i8 as u128);
        assert_eq!(IntTy::UChar.cast_value(0x1FF), 0xFF);
        assert_eq!(IntTy::Bool.cast_value(42), 1);
    }

    #[test]
    fn struct_member_append_and_lookup() {
        let mut ty = StructTy::new("S0");
        ty.add_member(IntTy::UInt.into(), "member_0").unwrap();
        ty.add_member(IntTy::Bool.into(), "member_1").unwrap();
        assert_eq!(ty.num_members(), 2);
        assert_eq!(ty.member(1).name, "member_1");
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn struct_member_out_of_range_is_fatal() {
        let mut ty = StructTy::new("S0");
        ty.add_member(IntTy::Int.into(), "member_0").unwrap();
        ty.member(1);
    }

    #[test]
    fn frozen_struct_rejects_members() {
        let mut ty = StructTy::new("S0");
        ty.add_member(IntTy::Int.into(), "member_0").unwrap();
        ty.freeze();
        assert_eq!(
            ty.add_member(IntTy::Int.into(), "member_1"),
            Err(StructTyError::Frozen("S0".to_string()))
        );
    }

    #[test]
    fn mutual_nesting_is_rejected() {
        let mut a = StructTy::new("A");
        a.add_member(IntTy::Int.into(), "member_0").unwrap();
        let mut b = StructTy::new("B");
        // A is not frozen yet, so B cannot nest it.
        assert!(b.add_member(a.clone().into(), "member_0").is_err());
        a.freeze();
        b.add_member(a.clone().into(), "member_0").unwrap();
        b.freeze();
        // Nesting B back into A fails because A is frozen.
        assert!(a.add_member(b.into(), "member_1").is_err());
    }

    #[test]
    fn nested_struct_depth() {
        let mut inner = StructTy::new("S0");
        inner.add_member(IntTy::Int.into(), "member_0").unwrap();
        inner.freeze();
        let mut outer = StructTy::new("S1");
        outer.add_member(inner.into(), "member_0").unwrap();
        outer.freeze();
        assert_eq!(outer.struct_depth(), 2);
        assert!(outer.contains_struct("S0"));
        assert!(!outer.contains_struct("S1"));
    }
}
