use crate::ast::data::DataKind;
use crate::ast::expr::ExprKind;
use crate::ast::op::{BinaryOp, UnaryOp};
use crate::ast::stmt::StmtKind;
use crate::ast::ty::IntTy;
use crate::distribution::Distribution;
use derive_builder::Builder;
use rand::prelude::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(custom_constructor, build_fn(private, name = "fallible_build"))]
pub struct Policy {
    /// Unique identifier for policy.
    pub name: String,

    // Max generation attempts
    /// Max attempts for generating an expression before falling back to a
    /// constant leaf.
    pub max_expr_attempts: usize,
    /// Max attempts for generating a statement.
    pub max_stmt_attempts: usize,
    /// Max attempts for generating a type.
    pub max_ty_attempts: usize,

    // Types
    /// Distribution of eligible integer kinds.
    pub int_type_dist: Vec<(IntTy, f64)>,
    /// Distribution of the number of struct types defined per program.
    pub num_struct_types_dist: Distribution,
    /// Distribution of the number of members in a generated struct type.
    pub struct_member_dist: Distribution,
    /// Probability of a struct member reusing a previously-frozen struct
    /// type instead of a scalar.
    pub nested_struct_prob: f64,
    /// Maximum nesting depth of struct types.
    pub max_struct_depth: usize,

    // Modifiers
    /// Probability of a datum being const-qualified (where writable data is
    /// not required).
    pub const_prob: f64,
    /// Probability of a datum being volatile-qualified.
    pub volatile_prob: f64,
    /// Probability of a local declaration carrying the static specifier.
    pub static_prob: f64,

    // External data
    /// Distribution of the number of external inputs.
    pub num_inputs_dist: Distribution,
    /// Distribution of the number of external outputs.
    pub num_outputs_dist: Distribution,
    /// Distribution of input data kinds.
    pub input_kind_dist: Vec<(DataKind, f64)>,
    /// Distribution of output data kinds.
    pub output_kind_dist: Vec<(DataKind, f64)>,
    /// Distribution of array lengths.
    pub array_length_dist: Distribution,
    /// Probability of a generated array carrying an explicit alignment.
    pub array_align_prob: f64,

    // Statements
    /// Distribution of the number of statements in the test function body.
    pub num_stmt_dist: Distribution,
    /// Distribution of the number of statements in a conditional or loop
    /// body.
    pub num_branch_stmt_dist: Distribution,
    /// Distribution of statement kinds.
    pub stmt_dist: Vec<(StmtKind, f64)>,
    /// Distribution of counting-loop trip counts.
    pub loop_iter_dist: Distribution,
    /// Maximum loop nesting depth.
    pub max_loop_depth: usize,
    /// Maximum conditional nesting depth.
    pub max_if_depth: usize,
    /// Probability of a conditional having an else body.
    pub else_prob: f64,

    // Expressions
    /// Distribution of expression kinds inside arithmetic trees.
    pub expr_dist: Vec<(ExprKind, f64)>,
    /// Distribution of binary operators.
    pub binary_op_dist: Vec<(BinaryOp, f64)>,
    /// Distribution of unary operators.
    pub unary_op_dist: Vec<(UnaryOp, f64)>,
    /// Maximum nesting depth of an arithmetic expression.
    pub max_arith_depth: usize,

    // Interface
    /// Probability of a scalar input being passed as a parameter when the
    /// input-passing mode leaves the choice open.
    pub inp_as_arg_prob: f64,
}

impl Policy {
    pub fn get_policies() -> Vec<Policy> {
        vec![
            Policy::default(),
            Policy::arithmetics(),
            Policy::control_flow(),
            Policy::composite(),
            Policy::shifts(),
        ]
    }

    pub fn get_policy_names() -> Vec<String> {
        Policy::get_policies()
            .iter()
            .map(|p| p.name.clone())
            .collect::<Vec<String>>()
    }

    pub fn get_policy(name: &str) -> Option<Policy> {
        Policy::get_policies()
            .iter()
            .find(|p| p.name == name)
            .cloned()
    }

    pub fn parse_policy_args_or_random(policy: &Option<String>) -> Policy {
        match policy {
            None => Policy::get_policies()
                .choose(&mut rand::thread_rng())
                .cloned()
                .unwrap(),
            Some(_) => Policy::parse_policy_args(policy),
        }
    }

    pub fn parse_policy_args(policy: &Option<String>) -> Policy {
        let policy = if let Some(policy) = policy {
            Policy::get_policy(policy)
        } else {
            Some(Policy::default())
        };
        policy.unwrap_or_else(|| {
            eprintln!(
                "Invalid policy, choose from {:?}",
                Policy::get_policy_names()
            );
            std::process::exit(2)
        })
    }

    /// Configuration-level consistency. Every table a generator draws from
    /// must be usable before generation starts; an empty eligible set at
    /// draw time is never defaulted silently.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_expr_attempts == 0 || self.max_stmt_attempts == 0 || self.max_ty_attempts == 0 {
            return Err("max expr/stmt/ty attempts must be greater than 0".to_string());
        }
        for (table, name) in [
            (self.int_type_dist.is_empty(), "int_type_dist"),
            (self.input_kind_dist.is_empty(), "input_kind_dist"),
            (self.output_kind_dist.is_empty(), "output_kind_dist"),
            (self.stmt_dist.is_empty(), "stmt_dist"),
            (self.expr_dist.is_empty(), "expr_dist"),
            (self.binary_op_dist.is_empty(), "binary_op_dist"),
            (self.unary_op_dist.is_empty(), "unary_op_dist"),
        ] {
            if table {
                return Err(format!("{} must not be empty", name));
            }
        }
        for (prob, name) in [
            (self.nested_struct_prob, "nested_struct_prob"),
            (self.const_prob, "const_prob"),
            (self.volatile_prob, "volatile_prob"),
            (self.static_prob, "static_prob"),
            (self.else_prob, "else_prob"),
            (self.inp_as_arg_prob, "inp_as_arg_prob"),
            (self.array_align_prob, "array_align_prob"),
        ] {
            if !(0.0..=1.0).contains(&prob) {
                return Err(format!("{} must lie within [0, 1]", name));
            }
        }
        if !self
            .expr_dist
            .iter()
            .any(|(kind, weight)| *kind == ExprKind::Const && *weight > 0.0)
        {
            return Err("expr_dist must give constants a positive weight".to_string());
        }
        if !self
            .stmt_dist
            .iter()
            .any(|(kind, weight)| *kind == StmtKind::Expr && *weight > 0.0)
        {
            return Err("stmt_dist must give expression statements a positive weight".to_string());
        }
        if self.num_inputs_dist.min() == 0 {
            return Err("a program must have at least one external input".to_string());
        }
        if self.num_outputs_dist.min() == 0 {
            return Err("a program must have at least one external output".to_string());
        }
        if self.array_length_dist.min() == 0 {
            return Err("generated arrays must not be empty".to_string());
        }
        Ok(())
    }
}

impl Default for Policy {
    fn default() -> Self {
        Policy::default_with_name("default")
    }
}

impl Policy {
    pub fn arithmetics() -> Policy {
        PolicyBuilder::from_policy(Policy::default())
            .name("arithmetics".to_owned())
            .num_struct_types_dist(Distribution::none())
            .input_kind_dist(vec![(DataKind::Var, 1.0)])
            .output_kind_dist(vec![(DataKind::Var, 1.0)])
            .stmt_dist(vec![(StmtKind::Expr, 4.0), (StmtKind::Decl, 1.0)])
            .num_stmt_dist(Distribution::new_uniform_inclusive(10, 30))
            .max_arith_depth(8)
            .build()
            .unwrap()
    }

    pub fn control_flow() -> Policy {
        PolicyBuilder::from_policy(Policy::default())
            .name("control_flow".to_owned())
            .stmt_dist(vec![
                (StmtKind::Expr, 3.0),
                (StmtKind::Decl, 1.0),
                (StmtKind::If, 3.0),
                (StmtKind::Loop, 3.0),
            ])
            .max_if_depth(3)
            .max_loop_depth(3)
            .else_prob(0.6)
            .build()
            .unwrap()
    }

    pub fn composite() -> Policy {
        PolicyBuilder::from_policy(Policy::default())
            .name("composite".to_owned())
            .num_struct_types_dist(Distribution::new_uniform_inclusive(2, 6))
            .struct_member_dist(Distribution::new_uniform_inclusive(2, 5))
            .nested_struct_prob(0.4)
            .max_struct_depth(3)
            .input_kind_dist(vec![
                (DataKind::Var, 2.0),
                (DataKind::Array, 1.5),
                (DataKind::Struct, 1.5),
            ])
            .output_kind_dist(vec![
                (DataKind::Var, 2.0),
                (DataKind::Array, 1.0),
                (DataKind::Struct, 1.0),
            ])
            .expr_dist_with(ExprKind::Index, 1.5)
            .expr_dist_with(ExprKind::Member, 1.5)
            .build()
            .unwrap()
    }

    pub fn shifts() -> Policy {
        PolicyBuilder::from_policy(Policy::arithmetics())
            .name("shifts".to_owned())
            .binary_op_dist(vec![
                (BinaryOp::Shl, 3.0),
                (BinaryOp::Shr, 3.0),
                (BinaryOp::Add, 1.0),
                (BinaryOp::Sub, 1.0),
                (BinaryOp::BitAnd, 1.0),
                (BinaryOp::BitOr, 1.0),
                (BinaryOp::BitXor, 1.0),
            ])
            .build()
            .unwrap()
    }
}

impl Policy {
    fn default_with_name(name: &str) -> Self {
        Policy {
            name: name.to_string(),

            max_expr_attempts: 10,
            max_stmt_attempts: 30,
            max_ty_attempts: 10,

            int_type_dist: vec![
                (IntTy::Bool, 1.0),
                (IntTy::Char, 2.0),
                (IntTy::UChar, 2.0),
                (IntTy::Short, 2.0),
                (IntTy::UShort, 2.0),
                (IntTy::Int, 3.0),
                (IntTy::UInt, 3.0),
                (IntTy::Long, 1.0),
                (IntTy::ULong, 1.0),
                (IntTy::LongLong, 1.0),
                (IntTy::ULongLong, 1.0),
            ],
            num_struct_types_dist: Distribution::new_uniform_inclusive(0, 3),
            struct_member_dist: Distribution::new_uniform_inclusive(2, 4),
            nested_struct_prob: 0.25,
            max_struct_depth: 2,

            const_prob: 0.5,
            volatile_prob: 0.15,
            static_prob: 0.2,

            num_inputs_dist: Distribution::new_uniform_inclusive(4, 8),
            num_outputs_dist: Distribution::new_uniform_inclusive(3, 6),
            input_kind_dist: vec![
                (DataKind::Var, 4.0),
                (DataKind::Array, 1.0),
                (DataKind::Struct, 1.0),
            ],
            output_kind_dist: vec![
                (DataKind::Var, 4.0),
                (DataKind::Array, 1.0),
                (DataKind::Struct, 1.0),
            ],
            array_length_dist: Distribution::new_uniform_inclusive(2, 8),
            array_align_prob: 0.25,

            num_stmt_dist: Distribution::new_uniform_inclusive(5, 12),
            num_branch_stmt_dist: Distribution::new_uniform_inclusive(1, 4),
            stmt_dist: vec![
                (StmtKind::Expr, 5.0),
                (StmtKind::Decl, 1.5),
                (StmtKind::If, 2.0),
                (StmtKind::Loop, 2.0),
            ],
            loop_iter_dist: Distribution::new_uniform_inclusive(1, 64),
            max_loop_depth: 2,
            max_if_depth: 2,
            else_prob: 0.5,

            expr_dist: vec![
                (ExprKind::Const, 4.0),
                (ExprKind::VarUse, 4.0),
                (ExprKind::Binary, 5.0),
                (ExprKind::Unary, 2.0),
                (ExprKind::Cast, 1.5),
                (ExprKind::Index, 0.5),
                (ExprKind::Member, 0.5),
            ],
            binary_op_dist: vec![
                (BinaryOp::Add, 2.0),
                (BinaryOp::Sub, 2.0),
                (BinaryOp::Mul, 1.5),
                (BinaryOp::Div, 1.0),
                (BinaryOp::Mod, 1.0),
                (BinaryOp::Shl, 1.0),
                (BinaryOp::Shr, 1.0),
                (BinaryOp::Lt, 0.5),
                (BinaryOp::Gt, 0.5),
                (BinaryOp::Le, 0.5),
                (BinaryOp::Ge, 0.5),
                (BinaryOp::Eq, 0.5),
                (BinaryOp::Ne, 0.5),
                (BinaryOp::BitAnd, 1.0),
                (BinaryOp::BitOr, 1.0),
                (BinaryOp::BitXor, 1.0),
                (BinaryOp::LogAnd, 0.5),
                (BinaryOp::LogOr, 0.5),
            ],
            unary_op_dist: vec![
                (UnaryOp::Plus, 0.5),
                (UnaryOp::Negate, 2.0),
                (UnaryOp::LogNot, 1.0),
                (UnaryOp::BitNot, 2.0),
            ],
            max_arith_depth: 5,

            inp_as_arg_prob: 0.5,
        }
    }
}

impl PolicyBuilder {
    pub fn build(&self) -> Result<Policy, PolicyBuilderError> {
        let policy = self.fallible_build().unwrap();
        policy
            .validate()
            .map_err(PolicyBuilderError::ValidationError)?;
        Ok(policy)
    }

    pub fn from_policy(policy: Policy) -> PolicyBuilder {
        PolicyBuilder {
            name: Some(policy.name),
            max_expr_attempts: Some(policy.max_expr_attempts),
            max_stmt_attempts: Some(policy.max_stmt_attempts),
            max_ty_attempts: Some(policy.max_ty_attempts),
            int_type_dist: Some(policy.int_type_dist),
            num_struct_types_dist: Some(policy.num_struct_types_dist),
            struct_member_dist: Some(policy.struct_member_dist),
            nested_struct_prob: Some(policy.nested_struct_prob),
            max_struct_depth: Some(policy.max_struct_depth),
            const_prob: Some(policy.const_prob),
            volatile_prob: Some(policy.volatile_prob),
            static_prob: Some(policy.static_prob),
            num_inputs_dist: Some(policy.num_inputs_dist),
            num_outputs_dist: Some(policy.num_outputs_dist),
            input_kind_dist: Some(policy.input_kind_dist),
            output_kind_dist: Some(policy.output_kind_dist),
            array_length_dist: Some(policy.array_length_dist),
            array_align_prob: Some(policy.array_align_prob),
            num_stmt_dist: Some(policy.num_stmt_dist),
            num_branch_stmt_dist: Some(policy.num_branch_stmt_dist),
            stmt_dist: Some(policy.stmt_dist),
            loop_iter_dist: Some(policy.loop_iter_dist),
            max_loop_depth: Some(policy.max_loop_depth),
            max_if_depth: Some(policy.max_if_depth),
            else_prob: Some(policy.else_prob),
            expr_dist: Some(policy.expr_dist),
            binary_op_dist: Some(policy.binary_op_dist),
            unary_op_dist: Some(policy.unary_op_dist),
            max_arith_depth: Some(policy.max_arith_depth),
            inp_as_arg_prob: Some(policy.inp_as_arg_prob),
        }
    }

    pub fn expr_dist_with(&mut self, kind: ExprKind, weight: f64) -> &mut Self {
        self.expr_dist.as_mut().unwrap().retain(|(k, _)| *k != kind);
        if weight > 0.0 {
            self.expr_dist.as_mut().unwrap().push((kind, weight));
        }
        self
    }

    pub fn stmt_dist_with(&mut self, kind: StmtKind, weight: f64) -> &mut Self {
        self.stmt_dist.as_mut().unwrap().retain(|(k, _)| *k != kind);
        if weight > 0.0 {
            self.stmt_dist.as_mut().unwrap().push((kind, weight));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        for policy in Policy::get_policies() {
            assert_eq!(policy.validate(), Ok(()), "policy {}", policy.name);
        }
    }

    #[test]
    fn empty_int_type_table_is_a_configuration_error() {
        let mut policy = Policy::default();
        policy.int_type_dist.clear();
        assert!(policy.validate().is_err());
    }

    #[test]
    fn builder_rejects_invalid_probability() {
        let res = PolicyBuilder::from_policy(Policy::default())
            .else_prob(1.5)
            .build();
        assert!(res.is_err());
    }

    #[test]
    fn policies_are_selectable_by_name() {
        assert_eq!(
            Policy::get_policy("composite").map(|p| p.name),
            Some("composite".to_string())
        );
        assert_eq!(Policy::get_policy("no_such_policy"), None);
    }
}
