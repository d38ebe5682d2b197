use crate::ast::data::{DataKind, Modifier};
use crate::ast::expr::ExprKind;
use crate::ast::op::{BinaryOp, UnaryOp};
use crate::ast::stmt::StmtKind;
use crate::ast::ty::{IntTy, StructTy};
use crate::generate::expr::GENERABLE_EXPR_FNS;
use crate::policy::Policy;
use crate::statistics::generation::GenerationStatistics;
use crate::symbol_table::SymbolTable;

use rand::prelude::{SliceRandom, StdRng};
use rand::{thread_rng, Rng, SeedableRng};

/// Whole-run generation state. Every random draw anywhere in generation
/// passes through `rng` in program order, which is what makes a run
/// reproducible from its seed.
pub struct Context {
    pub policy: Policy,
    /// The seed actually used. Requesting seed 0 draws a fresh one.
    pub seed: u64,
    pub name_handler: NameHandler,
    pub statistics: GenerationStatistics,
    pub rng: StdRng,

    pub extern_inp_sym_table: SymbolTable,
    pub extern_out_sym_table: SymbolTable,
    pub local_sym_table: SymbolTable,
    /// Frozen struct types available for nesting and instantiation.
    pub struct_type_pool: Vec<StructTy>,

    pub arith_depth: usize,
}

impl Context {
    pub fn new(seed: u64) -> Context {
        Context::with_policy(seed, &Policy::default())
    }

    pub fn with_policy(seed: u64, policy: &Policy) -> Context {
        // Seed 0 is reserved for "pick one at random".
        let seed = if seed == 0 {
            loop {
                let fresh: u64 = thread_rng().gen();
                if fresh != 0 {
                    break fresh;
                }
            }
        } else {
            seed
        };
        Context {
            policy: policy.clone(),
            seed,
            name_handler: NameHandler::default(),
            statistics: GenerationStatistics::default(),
            rng: StdRng::seed_from_u64(seed),
            extern_inp_sym_table: SymbolTable::default(),
            extern_out_sym_table: SymbolTable::default(),
            local_sym_table: SymbolTable::default(),
            struct_type_pool: vec![],
            arith_depth: 0,
        }
    }
}

pub fn choose<T: Clone>(dist: &[(T, f64)], rng: &mut StdRng) -> Option<T> {
    if dist.is_empty() {
        return None;
    }
    Some(dist.choose_weighted(rng, |item| item.1).unwrap().0.clone())
}

impl Context {
    pub fn choose_int_ty(&mut self) -> IntTy {
        choose(&self.policy.int_type_dist, &mut self.rng)
            .expect("integer type eligible set is empty")
    }

    pub fn choose_modifier(&mut self, allow_const: bool) -> Modifier {
        let is_const = allow_const && self.rng.gen_bool(self.policy.const_prob);
        let is_volatile = self.rng.gen_bool(self.policy.volatile_prob);
        Modifier::from_flags(is_const, is_volatile)
    }

    pub fn choose_static_specifier(&mut self) -> bool {
        self.rng.gen_bool(self.policy.static_prob)
    }

    pub fn choose_input_kind(&mut self) -> DataKind {
        let mut dist = self.policy.input_kind_dist.clone();
        if self.struct_type_pool.is_empty() {
            dist.retain(|(kind, _)| *kind != DataKind::Struct);
        }
        choose(&dist, &mut self.rng).expect("input data kind eligible set is empty")
    }

    pub fn choose_output_kind(&mut self) -> DataKind {
        let mut dist = self.policy.output_kind_dist.clone();
        if self.struct_type_pool.is_empty() {
            dist.retain(|(kind, _)| *kind != DataKind::Struct);
        }
        choose(&dist, &mut self.rng).expect("output data kind eligible set is empty")
    }

    pub fn choose_stmt_kind(&mut self, scope: &ScopeCtx) -> StmtKind {
        let mut dist = self.policy.stmt_dist.clone();
        if scope.depth >= self.policy.max_loop_depth {
            dist.retain(|(kind, _)| *kind != StmtKind::Loop);
        }
        if scope.if_depth >= self.policy.max_if_depth {
            dist.retain(|(kind, _)| *kind != StmtKind::If);
        }
        choose(&dist, &mut self.rng).expect("statement kind eligible set is empty")
    }

    pub fn choose_expr_kind(&mut self) -> ExprKind {
        let mut dist = self.policy.expr_dist.clone();
        dist.retain(|(expr_kind, _)| {
            GENERABLE_EXPR_FNS
                .get(expr_kind)
                .map_or(false, |f| f(self))
        });
        choose(&dist, &mut self.rng).expect("expression kind eligible set is empty")
    }

    pub fn choose_binary_op(&mut self) -> BinaryOp {
        choose(&self.policy.binary_op_dist, &mut self.rng)
            .expect("binary operator eligible set is empty")
    }

    pub fn choose_comparison_op(&mut self) -> Option<BinaryOp> {
        let dist: Vec<(BinaryOp, f64)> = self
            .policy
            .binary_op_dist
            .iter()
            .filter(|(op, _)| op.is_comparison())
            .copied()
            .collect();
        choose(&dist, &mut self.rng)
    }

    pub fn choose_unary_op(&mut self) -> UnaryOp {
        choose(&self.policy.unary_op_dist, &mut self.rng)
            .expect("unary operator eligible set is empty")
    }

    pub fn choose_num_struct_types(&mut self) -> usize {
        self.policy.num_struct_types_dist.sample(&mut self.rng)
    }

    pub fn choose_struct_member_count(&mut self) -> usize {
        self.policy.struct_member_dist.sample(&mut self.rng)
    }

    pub fn choose_nested_struct(&mut self) -> bool {
        self.rng.gen_bool(self.policy.nested_struct_prob)
    }

    pub fn choose_num_inputs(&mut self) -> usize {
        self.policy.num_inputs_dist.sample(&mut self.rng)
    }

    pub fn choose_num_outputs(&mut self) -> usize {
        self.policy.num_outputs_dist.sample(&mut self.rng)
    }

    pub fn choose_array_length(&mut self) -> usize {
        self.policy.array_length_dist.sample(&mut self.rng)
    }

    pub fn choose_array_align(&mut self) -> Option<u32> {
        if self.rng.gen_bool(self.policy.array_align_prob) {
            [8u32, 16, 32].choose(&mut self.rng).copied()
        } else {
            None
        }
    }

    pub fn choose_num_stmts(&mut self) -> usize {
        self.policy.num_stmt_dist.sample(&mut self.rng)
    }

    pub fn choose_num_branch_stmts(&mut self) -> usize {
        self.policy.num_branch_stmt_dist.sample(&mut self.rng)
    }

    pub fn choose_loop_iterations(&mut self) -> usize {
        self.policy.loop_iter_dist.sample(&mut self.rng)
    }

    pub fn choose_else_branch(&mut self) -> bool {
        self.rng.gen_bool(self.policy.else_prob)
    }

    pub fn choose_inp_as_arg(&mut self) -> bool {
        self.rng.gen_bool(self.policy.inp_as_arg_prob)
    }

    pub fn create_var_name(&mut self) -> String {
        self.name_handler.create_var_name()
    }

    pub fn create_array_name(&mut self) -> String {
        self.name_handler.create_array_name()
    }

    pub fn create_struct_name(&mut self) -> String {
        self.name_handler.create_struct_name()
    }

    pub fn create_struct_type_name(&mut self) -> String {
        self.name_handler.create_struct_type_name()
    }

    pub fn create_iter_name(&mut self) -> String {
        self.name_handler.create_iter_name()
    }

    pub fn create_member_name(&mut self, index: usize) -> String {
        NameHandler::create_member_name(index)
    }
}

/// Snapshot of the mutable symbol state, used around conditional branches:
/// each branch generates against the snapshot, and only the branch selected
/// by the condition's concrete value is committed.
#[derive(Clone)]
pub struct ContextSnapshot {
    pub extern_out_sym_table: SymbolTable,
    pub local_sym_table: SymbolTable,
}

impl Context {
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            extern_out_sym_table: self.extern_out_sym_table.clone(),
            local_sym_table: self.local_sym_table.clone(),
        }
    }

    pub fn restore_snapshot(&mut self, snapshot: ContextSnapshot) {
        self.extern_out_sym_table = snapshot.extern_out_sym_table;
        self.local_sym_table = snapshot.local_sym_table;
    }
}

#[derive(Default, Clone)]
pub struct NameHandler {
    var_counter: i32,
    array_counter: i32,
    struct_counter: i32,
    struct_type_counter: i32,
    iter_counter: i32,
}

impl NameHandler {
    fn create_var_name(&mut self) -> String {
        self.var_counter += 1;
        format!("var_{}", self.var_counter)
    }

    fn create_array_name(&mut self) -> String {
        self.array_counter += 1;
        format!("arr_{}", self.array_counter)
    }

    fn create_struct_name(&mut self) -> String {
        self.struct_counter += 1;
        format!("struct_obj_{}", self.struct_counter)
    }

    fn create_struct_type_name(&mut self) -> String {
        self.struct_type_counter += 1;
        format!("S{}", self.struct_type_counter)
    }

    fn create_iter_name(&mut self) -> String {
        self.iter_counter += 1;
        format!("i_{}", self.iter_counter)
    }

    fn create_member_name(index: usize) -> String {
        format!("member_{}", index)
    }
}

/// Per-scope generation state, chained by parent reference. A scope context
/// is transient: it lives for the duration of its scope's generation and
/// never outlives the pass. Depths are inherited from the parent and
/// incremented only for the dimension the owning statement represents.
#[derive(Debug, Clone, Copy)]
pub struct ScopeCtx<'p> {
    /// The statement kind owning this scope; `None` for the function body.
    pub kind: Option<StmtKind>,
    /// Loop nesting depth.
    pub depth: usize,
    /// Conditional nesting depth.
    pub if_depth: usize,
    pub parent: Option<&'p ScopeCtx<'p>>,
}

impl<'p> ScopeCtx<'p> {
    pub fn root() -> ScopeCtx<'static> {
        ScopeCtx {
            kind: None,
            depth: 0,
            if_depth: 0,
            parent: None,
        }
    }

    pub fn child(&'p self, kind: StmtKind) -> ScopeCtx<'p> {
        let mut depth = self.depth;
        let mut if_depth = self.if_depth;
        match kind {
            StmtKind::Loop => depth += 1,
            StmtKind::If => if_depth += 1,
            _ => {}
        }
        ScopeCtx {
            kind: Some(kind),
            depth,
            if_depth,
            parent: Some(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_depths_are_inherited_not_recomputed() {
        let root = ScopeCtx::root();
        let loop_scope = root.child(StmtKind::Loop);
        assert_eq!((loop_scope.depth, loop_scope.if_depth), (1, 0));
        let if_scope = loop_scope.child(StmtKind::If);
        assert_eq!((if_scope.depth, if_scope.if_depth), (1, 1));
        let inner_loop = if_scope.child(StmtKind::Loop);
        assert_eq!((inner_loop.depth, inner_loop.if_depth), (2, 1));
        assert!(inner_loop.parent.is_some());
    }

    #[test]
    fn nonzero_seed_is_kept_verbatim() {
        let ctx = Context::new(42);
        assert_eq!(ctx.seed, 42);
        let random = Context::new(0);
        assert_ne!(random.seed, 0);
    }
}
