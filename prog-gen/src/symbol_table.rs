//! Registries of live data shared between generation and emission.
//!
//! The value map is persistent; branch generation snapshots a table and
//! commits only the branch the condition selects. Enumeration follows
//! registration order, so every traversal is deterministic for a fixed
//! seed.

use crate::ast::data::{ArrayData, Data, StructData, Variable};
use crate::ast::eval::TypedVal;
use crate::ast::expr::{
    BinaryExpr, CallExpr, CastExpr, Expr, ExprListExpr, IndexExpr, MemberExpr, PlaceExpr,
    VarUseExpr,
};
use crate::ast::op::BinaryOp;
use crate::ast::stmt::{DeclStmt, ExprStmt, Stmt};
use crate::ast::ty::{IntTy, StructTy};
use archery::RcK;
use rand::prelude::{SliceRandom, StdRng};
use rpds::map::red_black_tree_map::Iter;
use rpds::RedBlackTreeMap;

pub const HASH_FN: &str = "hash";
pub const ASSERT_FN: &str = "assert";
pub const SEED_VAR: &str = "seed";

/// The combine step emitted into the generated program's hash function.
/// The generator folds with the identical arithmetic to predict the
/// checksum.
pub fn hash_combine(seed: u64, v: u64) -> u64 {
    seed ^ v
        .wrapping_add(0x9e3779b9)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    data: RedBlackTreeMap<String, Data>,
    order: Vec<String>,
    struct_types: Vec<StructTy>,
}

impl SymbolTable {
    pub fn add_data(&mut self, data: Data) {
        let name = data.name().to_owned();
        assert!(
            !self.data.contains_key(&name),
            "symbol {} registered twice",
            name
        );
        self.data = self.data.insert(name.clone(), data);
        self.order.push(name);
    }

    pub fn add_variable(&mut self, var: Variable) {
        self.add_data(var.into());
    }

    pub fn add_array(&mut self, arr: ArrayData) {
        self.add_data(arr.into());
    }

    pub fn add_struct(&mut self, data: StructData) {
        self.add_data(data.into());
    }

    pub fn add_struct_type(&mut self, ty: StructTy) {
        self.struct_types.push(ty);
    }

    pub fn struct_types(&self) -> &[StructTy] {
        &self.struct_types
    }

    pub fn get(&self, name: &str) -> Option<&Data> {
        self.data.get(name)
    }

    pub fn get_variable(&self, name: &str) -> Option<&Variable> {
        match self.data.get(name) {
            Some(Data::Var(var)) => Some(var),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &Data> {
        self.order.iter().map(move |name| {
            self.data
                .get(name)
                .expect("symbol table order index diverged from the value map")
        })
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.entries().filter_map(|data| match data {
            Data::Var(var) => Some(var),
            _ => None,
        })
    }

    pub fn arrays(&self) -> impl Iterator<Item = &ArrayData> {
        self.entries().filter_map(|data| match data {
            Data::Array(arr) => Some(arr),
            _ => None,
        })
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructData> {
        self.entries().filter_map(|data| match data {
            Data::Struct(s) => Some(s),
            _ => None,
        })
    }

    pub fn has_variables(&self) -> bool {
        self.variables().next().is_some()
    }

    pub fn has_arrays(&self) -> bool {
        self.arrays().next().is_some()
    }

    pub fn has_structs(&self) -> bool {
        self.structs().next().is_some()
    }

    /// Uniformly samples one live scalar variable. A well-formed generator
    /// never calls this on a table without variables.
    pub fn rand_variable(&self, rng: &mut StdRng) -> &Variable {
        let vars: Vec<&Variable> = self.variables().collect();
        vars.choose(rng)
            .expect("sampled a variable from a symbol table without variables")
    }

    /// Uniformly samples one live array; fatal on a table without arrays.
    pub fn rand_array(&self, rng: &mut StdRng) -> &ArrayData {
        let arrays: Vec<&ArrayData> = self.arrays().collect();
        arrays
            .choose(rng)
            .expect("sampled an array from a symbol table without arrays")
    }

    pub fn rand_struct(&self, rng: &mut StdRng) -> &StructData {
        let structs: Vec<&StructData> = self.structs().collect();
        structs
            .choose(rng)
            .expect("sampled a struct from a symbol table without structs")
    }

    /// Applies an assignment to the scalar leaf the place denotes.
    pub fn assign(&mut self, place: &PlaceExpr, val: TypedVal) {
        match place {
            PlaceExpr::Var(var_use) => {
                match self.data.get_mut(&var_use.name) {
                    Some(Data::Var(var)) => var.set_value(val),
                    _ => panic!("assignment to unregistered variable {}", var_use.name),
                };
            }
            PlaceExpr::Index(index) => {
                match self.data.get_mut(&index.array_name) {
                    Some(Data::Array(arr)) => arr.set_elem(index.resolved_index(), val),
                    _ => panic!("assignment to unregistered array {}", index.array_name),
                };
            }
            PlaceExpr::Member(member) => {
                match self.data.get_mut(&member.base) {
                    Some(Data::Struct(s)) => s.set_leaf(&member.indices(), val),
                    _ => panic!("assignment to unregistered struct {}", member.base),
                };
            }
        }
    }

    /// Extern declarations for every tracked entry, in registration order.
    pub fn extern_decl_stmts(&self) -> Vec<Stmt> {
        self.entries()
            .map(|data| {
                DeclStmt {
                    data: data.clone(),
                    is_extern: true,
                    init: None,
                }
                .into()
            })
            .collect()
    }

    /// Definitions with concrete initializers. Scalars carry their value as
    /// an initializer expression; arrays are brace-initialized from their
    /// element values by the emitter, and struct instances are filled in by
    /// the generated init function.
    pub fn def_stmts(&self) -> Vec<Stmt> {
        self.entries()
            .map(|data| {
                let init = match data {
                    Data::Var(var) => Some(Expr::const_val(var.value())),
                    Data::Array(_) | Data::Struct(_) => None,
                };
                DeclStmt {
                    data: data.clone(),
                    is_extern: false,
                    init,
                }
                .into()
            })
            .collect()
    }

    /// Member-by-member initialization of every struct instance, recursing
    /// into nested members.
    pub fn struct_init_stmts(&self) -> Vec<Stmt> {
        let mut stmts = vec![];
        for data in self.structs() {
            for path in data.ty.scalar_leaf_paths() {
                let member = MemberExpr::new(data, &path);
                let value = Expr::const_val(member.val);
                let assign = crate::ast::expr::AssignExpr::new(PlaceExpr::Member(member), value);
                stmts.push(ExprStmt { expr: assign.into() }.into());
            }
        }
        stmts
    }

    /// One read expression per tracked scalar leaf, in registration order.
    pub fn leaf_exprs(&self) -> Vec<Expr> {
        let mut exprs = vec![];
        for data in self.entries() {
            match data {
                Data::Var(var) => exprs.push(VarUseExpr::new(var).into()),
                Data::Array(arr) => {
                    for i in 0..arr.len() {
                        let index = Expr::const_val(TypedVal::int(i as i32));
                        exprs.push(IndexExpr::new(arr, index).into());
                    }
                }
                Data::Struct(s) => {
                    for path in s.ty.scalar_leaf_paths() {
                        exprs.push(MemberExpr::new(s, &path).into());
                    }
                }
            }
        }
        exprs
    }

    /// The value-folding check sequence: one hash call per tracked leaf,
    /// threading the running seed through. Returns the statements and leaves
    /// `seed` at the folded value.
    pub fn build_check_stmts(&self, seed: &mut u64) -> Vec<Stmt> {
        let mut stmts = vec![];
        for leaf in self.leaf_exprs() {
            let arg = CastExpr::new(IntTy::ULongLong, leaf);
            let folded = hash_combine(*seed, arg.val.as_u64());
            let seed_use = VarUseExpr {
                name: SEED_VAR.to_owned(),
                ty: IntTy::ULongLong,
                val: TypedVal::ullong(*seed),
            };
            let args = ExprListExpr::new(vec![seed_use.into(), arg.into()]);
            let call = CallExpr::new(HASH_FN, args, IntTy::ULongLong, TypedVal::ullong(folded));
            stmts.push(ExprStmt { expr: call.into() }.into());
            *seed = folded;
        }
        stmts
    }

    /// Folds every tracked leaf into the running checksum, mirroring the
    /// emitted check sequence.
    pub fn fold_checksum(&self, seed: u64) -> u64 {
        self.leaf_exprs()
            .iter()
            .fold(seed, |acc, leaf| hash_combine(acc, leaf.val().as_u64()))
    }

    /// Assertions pinning every tracked leaf to its final value.
    pub fn build_assert_stmts(&self, scalars_only: bool) -> Vec<Stmt> {
        let mut stmts = vec![];
        for leaf in self.leaf_exprs() {
            if scalars_only && !matches!(leaf, Expr::VarUse(_)) {
                continue;
            }
            let expected = Expr::const_val(leaf.val());
            let eq = BinaryExpr::new(BinaryOp::Eq, leaf, expected);
            let args = ExprListExpr::new(vec![eq.into()]);
            let call = CallExpr::new(ASSERT_FN, args, IntTy::Bool, TypedVal::bool_val(true));
            stmts.push(ExprStmt { expr: call.into() }.into());
        }
        stmts
    }
}

/// Name-ordered iteration over the raw value map, for callers that do not
/// need registration order.
impl<'a> IntoIterator for &'a SymbolTable {
    type Item = (&'a String, &'a Data);
    type IntoIter = Iter<'a, String, Data, RcK>;

    fn into_iter(self) -> Self::IntoIter {
        (&self.data).into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::data::Modifier;

    #[test]
    fn check_sequence_folds_tracked_values() {
        let mut table = SymbolTable::default();
        let mut var = Variable::new("i", IntTy::ULong, Modifier::None, false);
        var.set_value(TypedVal::new(IntTy::ULong, 10));
        table.add_variable(var);

        let mut seed = 0u64;
        let stmts = table.build_check_stmts(&mut seed);
        assert_eq!(stmts.len(), 1);
        assert_eq!(seed, hash_combine(0, 10));
        assert_eq!(table.fold_checksum(0), seed);
        match &stmts[0] {
            Stmt::Expr(stmt) => match &stmt.expr {
                Expr::Call(call) => {
                    assert_eq!(call.name, HASH_FN);
                    assert_eq!(call.val.as_u64(), seed);
                }
                other => panic!("expected a hash call, found {:?}", other),
            },
            other => panic!("expected an expression statement, found {:?}", other),
        }
    }

    #[test]
    fn leaf_enumeration_covers_aggregates_in_order() {
        let mut table = SymbolTable::default();
        let mut var = Variable::new("var_0", IntTy::Int, Modifier::None, false);
        var.set_value(TypedVal::int(1));
        table.add_variable(var);
        let mut arr = ArrayData::new("arr_1", IntTy::UChar, Modifier::None, 2);
        arr.set_elem(0, TypedVal::new(IntTy::UChar, 2));
        arr.set_elem(1, TypedVal::new(IntTy::UChar, 3));
        table.add_array(arr);

        let leaves = table.leaf_exprs();
        let vals: Vec<i128> = leaves.iter().map(|leaf| leaf.val().as_i128()).collect();
        assert_eq!(vals, vec![1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "without variables")]
    fn sampling_an_empty_table_is_fatal() {
        use rand::SeedableRng;
        let table = SymbolTable::default();
        let mut rng = StdRng::seed_from_u64(1);
        table.rand_variable(&mut rng);
    }

    #[test]
    fn map_iteration_is_name_ordered() {
        let mut table = SymbolTable::default();
        table.add_variable(Variable::new("var_2", IntTy::Int, Modifier::None, false));
        table.add_variable(Variable::new("var_1", IntTy::Int, Modifier::None, false));
        let names: Vec<&String> = (&table).into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["var_1", "var_2"]);
    }

    #[test]
    fn assignment_updates_the_tracked_value() {
        let mut table = SymbolTable::default();
        let mut var = Variable::new("var_0", IntTy::Short, Modifier::None, false);
        var.set_value(TypedVal::new(IntTy::Short, 5));
        table.add_variable(var);

        let place = PlaceExpr::Var(VarUseExpr::new(table.get_variable("var_0").unwrap()));
        table.assign(&place, TypedVal::int(-7));
        assert_eq!(table.get_variable("var_0").unwrap().value().as_i128(), -7);
    }
}
