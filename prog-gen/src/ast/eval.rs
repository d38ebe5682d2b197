//! Concrete value arithmetic with undefined-behaviour classification.
//!
//! Every operation evaluates under the resolved type's arithmetic: unsigned
//! operations wrap and are always defined, signed overflow and friends are
//! reported through the error channel. Callers handle the classification
//! inline; a frequently-hit result of random construction is not an
//! exceptional control-flow event.

use crate::ast::op::{BinaryOp, UnaryOp};
use crate::ast::ty::IntTy;
use num_traits::{CheckedRem, PrimInt, WrappingAdd, WrappingMul, WrappingSub};
use std::fmt::{Display, Formatter};

/// A concrete value of a primitive type. The u128 holds the value's bit
/// pattern cast with respect to the type: signed values are stored
/// sign-extended, unsigned values zero-extended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TypedVal {
    pub ty: IntTy,
    pub val: u128,
}

impl TypedVal {
    pub fn new(ty: IntTy, val: u128) -> TypedVal {
        TypedVal {
            ty,
            val: ty.cast_value(val),
        }
    }

    pub fn zero(ty: IntTy) -> TypedVal {
        TypedVal { ty, val: 0 }
    }

    pub fn bool_val(b: bool) -> TypedVal {
        TypedVal::new(IntTy::Bool, b as u128)
    }

    pub fn int(i: i32) -> TypedVal {
        TypedVal::new(IntTy::Int, i as u128)
    }

    pub fn uint(u: u32) -> TypedVal {
        TypedVal::new(IntTy::UInt, u as u128)
    }

    pub fn llong(i: i64) -> TypedVal {
        TypedVal::new(IntTy::LongLong, i as u128)
    }

    pub fn ullong(u: u64) -> TypedVal {
        TypedVal::new(IntTy::ULongLong, u as u128)
    }

    /// Conversion between primitive types. Narrowing and sign changes wrap
    /// (two's complement); the dialect defines them, so this is never UB.
    pub fn cast(self, ty: IntTy) -> TypedVal {
        TypedVal::new(ty, self.val)
    }

    pub fn as_i128(self) -> i128 {
        self.val as i128
    }

    pub fn as_bool(self) -> bool {
        self.val != 0
    }

    /// The value as the dialect's widest unsigned type, used by the checksum.
    pub fn as_u64(self) -> u64 {
        self.cast(IntTy::ULongLong).val as u64
    }

    pub fn is_zero(self) -> bool {
        self.val == 0
    }
}

/// Undefined-behaviour classification attached to every expression node.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UbKind {
    None,
    SignOvf,
    SignOvfMin,
    ZeroDiv,
    ShiftRhsNeg,
    ShiftRhsLarge,
    NegShift,
    OutOfBounds,
}

impl UbKind {
    pub fn is_ub(self) -> bool {
        self != UbKind::None
    }
}

impl Display for UbKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UbKind::None => "none",
            UbKind::SignOvf => "signed overflow",
            UbKind::SignOvfMin => "signed overflow at minimum",
            UbKind::ZeroDiv => "division by zero",
            UbKind::ShiftRhsNeg => "shift by negative amount",
            UbKind::ShiftRhsLarge => "shift amount exceeds width",
            UbKind::NegShift => "left shift of negative value",
            UbKind::OutOfBounds => "out-of-bounds index",
        };
        f.write_str(name)
    }
}

pub type EvalResult = Result<TypedVal, UbKind>;

fn min_mul_kind<T: PrimInt + WrappingAdd>(lhs: T, rhs: T) -> UbKind {
    if (lhs == T::min_value() && rhs.wrapping_add(&T::one()).is_zero())
        || (rhs == T::min_value() && lhs.wrapping_add(&T::one()).is_zero())
    {
        UbKind::SignOvfMin
    } else {
        UbKind::SignOvf
    }
}

fn signed_arith<T>(op: BinaryOp, lhs: T, rhs: T) -> Result<T, UbKind>
where
    T: PrimInt + WrappingAdd + CheckedRem<Output = T>,
{
    match op {
        BinaryOp::Add => lhs.checked_add(&rhs).ok_or(UbKind::SignOvf),
        BinaryOp::Sub => lhs.checked_sub(&rhs).ok_or(UbKind::SignOvf),
        BinaryOp::Mul => lhs.checked_mul(&rhs).ok_or_else(|| min_mul_kind(lhs, rhs)),
        BinaryOp::Div => {
            if rhs.is_zero() {
                Err(UbKind::ZeroDiv)
            } else {
                lhs.checked_div(&rhs).ok_or(UbKind::SignOvfMin)
            }
        }
        BinaryOp::Mod => {
            if rhs.is_zero() {
                Err(UbKind::ZeroDiv)
            } else {
                lhs.checked_rem(&rhs).ok_or(UbKind::SignOvfMin)
            }
        }
        BinaryOp::BitAnd => Ok(lhs & rhs),
        BinaryOp::BitOr => Ok(lhs | rhs),
        BinaryOp::BitXor => Ok(lhs ^ rhs),
        _ => panic!("operator {:?} is not integer arithmetic", op),
    }
}

fn unsigned_arith<T>(op: BinaryOp, lhs: T, rhs: T) -> Result<T, UbKind>
where
    T: PrimInt + WrappingAdd + WrappingSub + WrappingMul,
{
    match op {
        BinaryOp::Add => Ok(lhs.wrapping_add(&rhs)),
        BinaryOp::Sub => Ok(lhs.wrapping_sub(&rhs)),
        BinaryOp::Mul => Ok(lhs.wrapping_mul(&rhs)),
        BinaryOp::Div => {
            if rhs.is_zero() {
                Err(UbKind::ZeroDiv)
            } else {
                Ok(lhs / rhs)
            }
        }
        BinaryOp::Mod => {
            if rhs.is_zero() {
                Err(UbKind::ZeroDiv)
            } else {
                Ok(lhs % rhs)
            }
        }
        BinaryOp::BitAnd => Ok(lhs & rhs),
        BinaryOp::BitOr => Ok(lhs | rhs),
        BinaryOp::BitXor => Ok(lhs ^ rhs),
        _ => panic!("operator {:?} is not integer arithmetic", op),
    }
}

impl BinaryOp {
    /// Evaluates the operation over two concrete operands, resolving the
    /// result type bottom-up (promotion, then the usual arithmetic
    /// conversions; shifts take the promoted left operand's type;
    /// comparisons and logical connectives yield bool).
    pub fn apply(self, lhs: TypedVal, rhs: TypedVal) -> EvalResult {
        if self.is_shift() {
            return self.apply_shift(lhs, rhs);
        }
        if self.is_comparison() {
            return self.apply_comparison(lhs, rhs);
        }
        if self.is_logical() {
            let res = match self {
                BinaryOp::LogAnd => lhs.as_bool() && rhs.as_bool(),
                BinaryOp::LogOr => lhs.as_bool() || rhs.as_bool(),
                _ => unreachable!(),
            };
            return Ok(TypedVal::bool_val(res));
        }
        self.apply_arith(lhs, rhs)
    }

    fn apply_arith(self, lhs: TypedVal, rhs: TypedVal) -> EvalResult {
        let ty = IntTy::common_ty(lhs.ty, rhs.ty);
        let a = lhs.cast(ty);
        let b = rhs.cast(ty);
        match ty {
            IntTy::Int => {
                signed_arith(self, a.val as i32, b.val as i32).map(|v| TypedVal::new(ty, v as u128))
            }
            IntTy::UInt => {
                unsigned_arith(self, a.val as u32, b.val as u32).map(|v| TypedVal::new(ty, v as u128))
            }
            IntTy::Long | IntTy::LongLong => {
                signed_arith(self, a.val as i64, b.val as i64).map(|v| TypedVal::new(ty, v as u128))
            }
            IntTy::ULong | IntTy::ULongLong => {
                unsigned_arith(self, a.val as u64, b.val as u64).map(|v| TypedVal::new(ty, v as u128))
            }
            _ => panic!("operands of {:?} must be promoted before arithmetic", self),
        }
    }

    fn apply_shift(self, lhs: TypedVal, rhs: TypedVal) -> EvalResult {
        let ty = lhs.ty.promoted();
        let a = lhs.cast(ty);
        let shift = rhs.cast(rhs.ty.promoted()).as_i128();
        if shift < 0 {
            return Err(UbKind::ShiftRhsNeg);
        }
        if shift >= ty.bit_width() as i128 {
            return Err(UbKind::ShiftRhsLarge);
        }
        let shift = shift as u32;
        match self {
            BinaryOp::Shl if ty.is_signed() => {
                let v = a.as_i128();
                if v < 0 {
                    return Err(UbKind::NegShift);
                }
                let res = v << shift;
                if res > ty.max_value() as i128 {
                    Err(UbKind::SignOvf)
                } else {
                    Ok(TypedVal::new(ty, res as u128))
                }
            }
            BinaryOp::Shl => Ok(TypedVal::new(ty, a.val << shift)),
            // Right shift of a negative value is an arithmetic shift in the
            // dialect, never UB.
            BinaryOp::Shr if ty.is_signed() => Ok(TypedVal::new(ty, (a.as_i128() >> shift) as u128)),
            BinaryOp::Shr => Ok(TypedVal::new(ty, a.val >> shift)),
            _ => unreachable!(),
        }
    }

    fn apply_comparison(self, lhs: TypedVal, rhs: TypedVal) -> EvalResult {
        let ty = IntTy::common_ty(lhs.ty, rhs.ty);
        let a = lhs.cast(ty).as_i128();
        let b = rhs.cast(ty).as_i128();
        let res = match self {
            BinaryOp::Lt => a < b,
            BinaryOp::Gt => a > b,
            BinaryOp::Le => a <= b,
            BinaryOp::Ge => a >= b,
            BinaryOp::Eq => a == b,
            BinaryOp::Ne => a != b,
            _ => unreachable!(),
        };
        Ok(TypedVal::bool_val(res))
    }
}

impl UnaryOp {
    pub fn apply(self, arg: TypedVal) -> EvalResult {
        match self {
            UnaryOp::Plus => Ok(arg.cast(arg.ty.promoted())),
            UnaryOp::Negate => {
                let ty = arg.ty.promoted();
                let a = arg.cast(ty);
                if ty.is_signed() {
                    let v = a.as_i128();
                    if v == ty.min_value() as i128 {
                        Err(UbKind::SignOvfMin)
                    } else {
                        Ok(TypedVal::new(ty, (-v) as u128))
                    }
                } else {
                    Ok(TypedVal::new(ty, a.val.wrapping_neg()))
                }
            }
            UnaryOp::BitNot => {
                let ty = arg.ty.promoted();
                Ok(TypedVal::new(ty, !arg.cast(ty).val))
            }
            UnaryOp::LogNot => Ok(TypedVal::bool_val(!arg.as_bool())),
            UnaryOp::PreInc | UnaryOp::PostInc => Self::step(arg, 1),
            UnaryOp::PreDec | UnaryOp::PostDec => Self::step(arg, -1),
        }
    }

    /// Increment/decrement keep the operand's type (no promotion).
    fn step(arg: TypedVal, delta: i128) -> EvalResult {
        let ty = arg.ty;
        if ty.is_signed() {
            let v = arg.as_i128();
            if (delta > 0 && v == ty.max_value() as i128) || (delta < 0 && v == ty.min_value() as i128)
            {
                Err(UbKind::SignOvf)
            } else {
                Ok(TypedVal::new(ty, (v + delta) as u128))
            }
        } else if delta > 0 {
            Ok(TypedVal::new(ty, arg.val.wrapping_add(1)))
        } else {
            Ok(TypedVal::new(ty, arg.val.wrapping_sub(1)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_add_ok() {
        assert_eq!(
            BinaryOp::Add.apply(TypedVal::int(-5), TypedVal::int(12)),
            Ok(TypedVal::int(7))
        );
    }

    #[test]
    fn signed_add_overflow() {
        assert_eq!(
            BinaryOp::Add.apply(TypedVal::int(i32::MAX), TypedVal::int(1)),
            Err(UbKind::SignOvf)
        );
    }

    #[test]
    fn unsigned_add_wraps() {
        assert_eq!(
            BinaryOp::Add.apply(TypedVal::uint(u32::MAX), TypedVal::uint(2)),
            Ok(TypedVal::uint(1))
        );
    }

    #[test]
    fn narrow_operands_promote_to_int() {
        let lhs = TypedVal::new(IntTy::UChar, 200);
        let rhs = TypedVal::new(IntTy::UChar, 100);
        // uchar + uchar happens in int, so no wrap at 8 bits.
        assert_eq!(BinaryOp::Add.apply(lhs, rhs), Ok(TypedVal::int(300)));
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(
            BinaryOp::Div.apply(TypedVal::int(12), TypedVal::int(0)),
            Err(UbKind::ZeroDiv)
        );
        assert_eq!(
            BinaryOp::Mod.apply(TypedVal::uint(12), TypedVal::uint(0)),
            Err(UbKind::ZeroDiv)
        );
    }

    #[test]
    fn min_div_minus_one() {
        assert_eq!(
            BinaryOp::Div.apply(TypedVal::int(i32::MIN), TypedVal::int(-1)),
            Err(UbKind::SignOvfMin)
        );
    }

    #[test]
    fn min_mul_minus_one() {
        assert_eq!(
            BinaryOp::Mul.apply(TypedVal::int(i32::MIN), TypedVal::int(-1)),
            Err(UbKind::SignOvfMin)
        );
        assert_eq!(
            BinaryOp::Mul.apply(TypedVal::int(-1), TypedVal::int(i32::MIN)),
            Err(UbKind::SignOvfMin)
        );
    }

    #[test]
    fn shr_of_llong_max_is_defined() {
        let lhs = TypedVal::llong(i64::MAX);
        let rhs = TypedVal::llong(2);
        let res = BinaryOp::Shr.apply(lhs, rhs).unwrap();
        assert_eq!(res.ty, IntTy::LongLong);
        assert_eq!(res.as_i128(), (i64::MAX >> 2) as i128);
    }

    #[test]
    fn shift_amount_out_of_range() {
        assert_eq!(
            BinaryOp::Shl.apply(TypedVal::int(1), TypedVal::int(32)),
            Err(UbKind::ShiftRhsLarge)
        );
        assert_eq!(
            BinaryOp::Shr.apply(TypedVal::int(1), TypedVal::int(-1)),
            Err(UbKind::ShiftRhsNeg)
        );
        // The left operand promotes to int, so a shift by 16 is in range.
        let lhs = TypedVal::new(IntTy::Short, 3);
        assert_eq!(
            BinaryOp::Shl.apply(lhs, TypedVal::int(16)),
            Ok(TypedVal::int(3 << 16))
        );
    }

    #[test]
    fn shl_of_negative_value() {
        assert_eq!(
            BinaryOp::Shl.apply(TypedVal::int(-1), TypedVal::int(1)),
            Err(UbKind::NegShift)
        );
    }

    #[test]
    fn shl_overflow_is_classified() {
        assert_eq!(
            BinaryOp::Shl.apply(TypedVal::int(1), TypedVal::int(31)),
            Err(UbKind::SignOvf)
        );
        assert_eq!(
            BinaryOp::Shl.apply(TypedVal::uint(1), TypedVal::int(31)),
            Ok(TypedVal::uint(1 << 31))
        );
    }

    #[test]
    fn arithmetic_shr_of_negative() {
        let res = BinaryOp::Shr.apply(TypedVal::int(-8), TypedVal::int(1)).unwrap();
        assert_eq!(res, TypedVal::int(-4));
    }

    #[test]
    fn mixed_signedness_comparison_uses_common_ty() {
        // -1 converts to UINT_MAX in the unsigned common type.
        assert_eq!(
            BinaryOp::Lt.apply(TypedVal::int(-1), TypedVal::uint(0)),
            Ok(TypedVal::bool_val(false))
        );
    }

    #[test]
    fn negate_min_is_classified() {
        assert_eq!(UnaryOp::Negate.apply(TypedVal::int(i32::MIN)), Err(UbKind::SignOvfMin));
        assert_eq!(UnaryOp::Negate.apply(TypedVal::int(5)), Ok(TypedVal::int(-5)));
    }

    #[test]
    fn negate_unsigned_wraps() {
        assert_eq!(
            UnaryOp::Negate.apply(TypedVal::uint(1)),
            Ok(TypedVal::uint(u32::MAX))
        );
    }

    #[test]
    fn bit_not_promotes() {
        let res = UnaryOp::BitNot.apply(TypedVal::new(IntTy::UChar, 0xFF)).unwrap();
        assert_eq!(res, TypedVal::int(!0xFF));
    }

    #[test]
    fn log_not() {
        assert_eq!(UnaryOp::LogNot.apply(TypedVal::bool_val(true)), Ok(TypedVal::bool_val(false)));
        assert_eq!(UnaryOp::LogNot.apply(TypedVal::int(3)), Ok(TypedVal::bool_val(false)));
    }

    #[test]
    fn increment_keeps_type() {
        let res = UnaryOp::PreInc.apply(TypedVal::int(41)).unwrap();
        assert_eq!(res, TypedVal::int(42));
        assert_eq!(
            UnaryOp::PreInc.apply(TypedVal::int(i32::MAX)),
            Err(UbKind::SignOvf)
        );
    }

    #[test]
    fn cast_wraps_and_is_defined() {
        let v = TypedVal::int(-27);
        assert_eq!(v.cast(IntTy::UInt), TypedVal::uint(-27i32 as u32));
        assert_eq!(v.cast(IntTy::UInt).cast(IntTy::ULongLong).as_u64(), (-27i32 as u32) as u64);
    }
}
