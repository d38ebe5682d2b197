//! Expression nodes.
//!
//! Every node resolves its type, its concrete value and its UB
//! classification bottom-up at construction time and is immutable
//! afterwards. A generator must never finalize a node whose classification
//! is not `UbKind::None`; it redraws instead.

use crate::ast::data::{ArrayData, StructData, Variable};
use crate::ast::eval::{TypedVal, UbKind};
use crate::ast::op::{BinaryOp, UnaryOp};
use crate::ast::ty::{IntTy, Ty};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A scalar variable access such as `var_3`.
    VarUse(VarUseExpr),
    /// An integer literal.
    Const(ConstExpr),
    /// An assignment `place = expr`.
    Assign(AssignExpr),
    /// A binary operation such as `a + b`.
    Binary(BinaryExpr),
    /// A unary operation such as `~a` or `++i`.
    Unary(UnaryExpr),
    /// A subscript into a named array such as `arr_1[3]`.
    Index(IndexExpr),
    /// A member chain on a named struct instance such as `struct_2.member_0`.
    Member(MemberExpr),
    /// An explicit conversion such as `(short)(a)`.
    Cast(CastExpr),
    /// A comma-joined argument list.
    List(ExprListExpr),
    /// A call such as `hash(seed, v)`.
    Call(CallExpr),
}

impl Expr {
    pub fn ty(&self) -> IntTy {
        match self {
            Expr::VarUse(expr) => expr.ty,
            Expr::Const(expr) => expr.val.ty,
            Expr::Assign(expr) => expr.ty,
            Expr::Binary(expr) => expr.ty,
            Expr::Unary(expr) => expr.ty,
            Expr::Index(expr) => expr.elem_ty,
            Expr::Member(expr) => expr.ty,
            Expr::Cast(expr) => expr.ty,
            Expr::List(expr) => expr.last().ty(),
            Expr::Call(expr) => expr.ty,
        }
    }

    pub fn val(&self) -> TypedVal {
        match self {
            Expr::VarUse(expr) => expr.val,
            Expr::Const(expr) => expr.val,
            Expr::Assign(expr) => expr.val,
            Expr::Binary(expr) => expr.val,
            Expr::Unary(expr) => expr.val,
            Expr::Index(expr) => expr.val,
            Expr::Member(expr) => expr.val,
            Expr::Cast(expr) => expr.val,
            Expr::List(expr) => expr.last().val(),
            Expr::Call(expr) => expr.val,
        }
    }

    /// The node's own classification. Operand classifications are handled
    /// when the operands are built, so a finished tree is UB-free exactly
    /// when every node reports `UbKind::None`.
    pub fn ub(&self) -> UbKind {
        match self {
            Expr::Binary(expr) => expr.ub,
            Expr::Unary(expr) => expr.ub,
            Expr::Index(expr) => expr.ub,
            _ => UbKind::None,
        }
    }

    pub fn kind(&self) -> ExprKind {
        match self {
            Expr::VarUse(_) => ExprKind::VarUse,
            Expr::Const(_) => ExprKind::Const,
            Expr::Assign(_) => ExprKind::Assign,
            Expr::Binary(_) => ExprKind::Binary,
            Expr::Unary(_) => ExprKind::Unary,
            Expr::Index(_) => ExprKind::Index,
            Expr::Member(_) => ExprKind::Member,
            Expr::Cast(_) => ExprKind::Cast,
            Expr::List(_) => ExprKind::List,
            Expr::Call(_) => ExprKind::Call,
        }
    }

    pub fn const_val(val: TypedVal) -> Expr {
        Expr::Const(ConstExpr { val })
    }

    pub fn int(i: i32) -> Expr {
        Expr::const_val(TypedVal::int(i))
    }

    pub fn uint(u: u32) -> Expr {
        Expr::const_val(TypedVal::uint(u))
    }

    pub fn llong(i: i64) -> Expr {
        Expr::const_val(TypedVal::llong(i))
    }

    pub fn bool_lit(b: bool) -> Expr {
        Expr::const_val(TypedVal::bool_val(b))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarUseExpr {
    pub name: String,
    pub ty: IntTy,
    pub val: TypedVal,
}

impl VarUseExpr {
    /// Snapshots the variable at construction time. Generation is strictly
    /// ordered, so the snapshot equals the value at the node's execution
    /// point.
    pub fn new(var: &Variable) -> VarUseExpr {
        VarUseExpr {
            name: var.name.clone(),
            ty: var.ty,
            val: var.value(),
        }
    }
}

impl From<VarUseExpr> for Expr {
    fn from(expr: VarUseExpr) -> Expr {
        Expr::VarUse(expr)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstExpr {
    pub val: TypedVal,
}

impl ConstExpr {
    pub fn new(val: TypedVal) -> ConstExpr {
        ConstExpr { val }
    }
}

impl From<ConstExpr> for Expr {
    fn from(expr: ConstExpr) -> Expr {
        Expr::Const(expr)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
    pub ty: IntTy,
    pub val: TypedVal,
    pub ub: UbKind,
}

impl BinaryExpr {
    pub fn new(op: BinaryOp, lhs: Expr, rhs: Expr) -> BinaryExpr {
        let (ty, val, ub) = match op.apply(lhs.val(), rhs.val()) {
            Ok(val) => (val.ty, val, UbKind::None),
            Err(ub) => {
                let ty = if op.is_shift() {
                    lhs.ty().promoted()
                } else if op.produces_bool() {
                    IntTy::Bool
                } else {
                    IntTy::common_ty(lhs.ty(), rhs.ty())
                };
                (ty, TypedVal::zero(ty), ub)
            }
        };
        BinaryExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            ty,
            val,
            ub,
        }
    }
}

impl From<BinaryExpr> for Expr {
    fn from(expr: BinaryExpr) -> Expr {
        Expr::Binary(expr)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub expr: Box<Expr>,
    pub ty: IntTy,
    pub val: TypedVal,
    pub ub: UbKind,
}

impl UnaryExpr {
    pub fn new(op: UnaryOp, expr: Expr) -> UnaryExpr {
        let (ty, val, ub) = match op.apply(expr.val()) {
            Ok(val) => (val.ty, val, UbKind::None),
            Err(ub) => {
                let ty = match op {
                    UnaryOp::LogNot => IntTy::Bool,
                    op if op.is_step_op() => expr.ty(),
                    _ => expr.ty().promoted(),
                };
                (ty, TypedVal::zero(ty), ub)
            }
        };
        UnaryExpr {
            op,
            expr: Box::new(expr),
            ty,
            val,
            ub,
        }
    }
}

impl From<UnaryExpr> for Expr {
    fn from(expr: UnaryExpr) -> Expr {
        Expr::Unary(expr)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CastExpr {
    pub ty: IntTy,
    pub expr: Box<Expr>,
    pub val: TypedVal,
}

impl CastExpr {
    pub fn new(ty: IntTy, expr: Expr) -> CastExpr {
        let val = expr.val().cast(ty);
        CastExpr {
            ty,
            expr: Box::new(expr),
            val,
        }
    }
}

impl From<CastExpr> for Expr {
    fn from(expr: CastExpr) -> Expr {
        Expr::Cast(expr)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub array_name: String,
    pub elem_ty: IntTy,
    pub len: usize,
    pub index: Box<Expr>,
    pub val: TypedVal,
    pub ub: UbKind,
}

impl IndexExpr {
    /// Resolves the subscript against the named array. An index outside
    /// [0, len) classifies the node as out-of-bounds; the generator rejects
    /// such nodes instead of finalizing them.
    pub fn new(arr: &ArrayData, index: Expr) -> IndexExpr {
        let idx = index.val().as_i128();
        let (val, ub) = if idx < 0 || idx as usize >= arr.len() {
            (TypedVal::zero(arr.elem_ty), UbKind::OutOfBounds)
        } else {
            (arr.elem(idx as usize), UbKind::None)
        };
        IndexExpr {
            array_name: arr.name.clone(),
            elem_ty: arr.elem_ty,
            len: arr.len(),
            index: Box::new(index),
            val,
            ub,
        }
    }

    /// The resolved constant index, available on in-bounds nodes only.
    pub fn resolved_index(&self) -> usize {
        assert!(!self.ub.is_ub(), "out-of-bounds index node has no resolved index");
        self.index.val().as_i128() as usize
    }
}

impl From<IndexExpr> for Expr {
    fn from(expr: IndexExpr) -> Expr {
        Expr::Index(expr)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberSel {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub base: String,
    pub path: Vec<MemberSel>,
    pub ty: IntTy,
    pub val: TypedVal,
}

impl MemberExpr {
    /// Resolves a member chain on a struct instance down to a scalar leaf.
    /// Member lookups are bounds-checked; a broken path is a generator bug.
    pub fn new(data: &StructData, path: &[usize]) -> MemberExpr {
        assert!(!path.is_empty(), "member path must not be empty");
        let mut sels = vec![];
        let mut leaf_ty = None;
        let mut cursor = &data.ty;
        for (pos, idx) in path.iter().enumerate() {
            let member = cursor.member(*idx);
            sels.push(MemberSel {
                index: *idx,
                name: member.name.clone(),
            });
            match &member.ty {
                Ty::Struct(inner) => {
                    assert!(
                        pos + 1 < path.len(),
                        "member path must end at a scalar leaf"
                    );
                    cursor = inner;
                }
                Ty::Int(int_ty) => {
                    assert!(
                        pos + 1 == path.len(),
                        "member path continues past scalar leaf"
                    );
                    leaf_ty = Some(*int_ty);
                }
            }
        }
        MemberExpr {
            base: data.name.clone(),
            path: sels,
            ty: leaf_ty.expect("member path must end at a scalar leaf"),
            val: data.leaf(path),
        }
    }

    pub fn indices(&self) -> Vec<usize> {
        self.path.iter().map(|sel| sel.index).collect()
    }
}

impl From<MemberExpr> for Expr {
    fn from(expr: MemberExpr) -> Expr {
        Expr::Member(expr)
    }
}

/// The writable positions an assignment may target.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceExpr {
    Var(VarUseExpr),
    Index(IndexExpr),
    Member(MemberExpr),
}

impl PlaceExpr {
    pub fn ty(&self) -> IntTy {
        match self {
            PlaceExpr::Var(expr) => expr.ty,
            PlaceExpr::Index(expr) => expr.elem_ty,
            PlaceExpr::Member(expr) => expr.ty,
        }
    }
}

impl From<PlaceExpr> for Expr {
    fn from(place: PlaceExpr) -> Expr {
        match place {
            PlaceExpr::Var(expr) => expr.into(),
            PlaceExpr::Index(expr) => expr.into(),
            PlaceExpr::Member(expr) => expr.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpr {
    pub place: PlaceExpr,
    pub rhs: Box<Expr>,
    pub ty: IntTy,
    pub val: TypedVal,
}

impl AssignExpr {
    pub fn new(place: PlaceExpr, rhs: Expr) -> AssignExpr {
        let ty = place.ty();
        let val = rhs.val().cast(ty);
        AssignExpr {
            place,
            rhs: Box::new(rhs),
            ty,
            val,
        }
    }
}

impl From<AssignExpr> for Expr {
    fn from(expr: AssignExpr) -> Expr {
        Expr::Assign(expr)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprListExpr {
    pub exprs: Vec<Expr>,
}

impl ExprListExpr {
    pub fn new(exprs: Vec<Expr>) -> ExprListExpr {
        ExprListExpr { exprs }
    }

    fn last(&self) -> &Expr {
        self.exprs
            .last()
            .expect("expression list must not be empty")
    }
}

impl From<ExprListExpr> for Expr {
    fn from(expr: ExprListExpr) -> Expr {
        Expr::List(expr)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: String,
    pub args: ExprListExpr,
    pub ty: IntTy,
    pub val: TypedVal,
}

impl CallExpr {
    /// The callee's semantics are supplied by the builder (the checksum and
    /// assert sequences are the only call sites the generator produces).
    pub fn new(name: impl Into<String>, args: ExprListExpr, ty: IntTy, val: TypedVal) -> CallExpr {
        CallExpr {
            name: name.into(),
            args,
            ty,
            val,
        }
    }
}

impl From<CallExpr> for Expr {
    fn from(expr: CallExpr) -> Expr {
        Expr::Call(expr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum ExprKind {
    VarUse,
    Const,
    Assign,
    Binary,
    Unary,
    Index,
    Member,
    Cast,
    List,
    Call,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::data::Modifier;

    #[test]
    fn binary_node_finalizes_type_value_and_classification() {
        let node = BinaryExpr::new(BinaryOp::Shr, Expr::llong(i64::MAX), Expr::llong(2));
        assert_eq!(node.ty, IntTy::LongLong);
        assert_eq!(node.val.as_i128(), (i64::MAX >> 2) as i128);
        assert_eq!(node.ub, UbKind::None);
    }

    #[test]
    fn literal_zero_divisor_is_classified_at_construction() {
        let node = BinaryExpr::new(BinaryOp::Div, Expr::int(10), Expr::int(0));
        assert_eq!(node.ub, UbKind::ZeroDiv);
    }

    #[test]
    fn index_node_resolves_element_value() {
        let mut arr = ArrayData::new("arr_0", IntTy::Short, Modifier::None, 3);
        arr.set_elem(2, TypedVal::new(IntTy::Short, -5i16 as u128));
        let node = IndexExpr::new(&arr, Expr::int(2));
        assert_eq!(node.elem_ty, IntTy::Short);
        assert_eq!(node.val.as_i128(), -5);
        assert_eq!(node.ub, UbKind::None);
        assert_eq!(node.resolved_index(), 2);

        let oob = IndexExpr::new(&arr, Expr::int(3));
        assert_eq!(oob.ub, UbKind::OutOfBounds);
    }

    #[test]
    fn assignment_converts_to_the_place_type() {
        let mut var = Variable::new("var_0", IntTy::UChar, Modifier::None, false);
        var.set_value(TypedVal::new(IntTy::UChar, 1));
        let place = PlaceExpr::Var(VarUseExpr::new(&var));
        let node = AssignExpr::new(place, Expr::int(300));
        assert_eq!(node.ty, IntTy::UChar);
        assert_eq!(node.val.as_i128(), 300 % 256);
    }
}
