use crate::ast::data::Data;
use crate::ast::eval::TypedVal;
use crate::ast::expr::{
    AssignExpr, BinaryExpr, CallExpr, CastExpr, ConstExpr, ExprListExpr, IndexExpr, MemberExpr,
    UnaryExpr, VarUseExpr,
};
use crate::ast::program::Program;
use crate::ast::stmt::{CntLoopStmt, DeclStmt, ExprStmt, IfStmt, Stmt};
use crate::ast::ty::{IntTy, StructTy, Ty};
use crate::runtime::config::LangStd;
use crate::symbol_table::SEED_VAR;
use crate::visitor::base_visitor::Visitor;

/// Visitor used to print the finished tree. Emission is a pure read of
/// already-propagated state; it never consumes the random stream.
pub struct EmitVisitor {
    output: String,
    curr_indent: usize,
    indentation: usize,
    std: LangStd,
}

impl Default for EmitVisitor {
    fn default() -> Self {
        EmitVisitor::new(LangStd::Cxx)
    }
}

impl EmitVisitor {
    pub fn new(std: LangStd) -> EmitVisitor {
        EmitVisitor {
            output: String::new(),
            curr_indent: 0,
            indentation: 4,
            std,
        }
    }

    pub fn output(&self) -> String {
        assert!(
            !self.output.is_empty(),
            "Run visit before accessing emit visitor output"
        );
        self.output.clone()
    }

    fn pad(&mut self) {
        self.output.push_str(&" ".repeat(self.curr_indent));
    }

    pub fn type_name(&self, ty: IntTy) -> &'static str {
        match self.std {
            LangStd::Cxx | LangStd::Sycl => match ty {
                IntTy::Bool => "bool",
                IntTy::Char => "signed char",
                IntTy::UChar => "unsigned char",
                IntTy::Short => "short",
                IntTy::UShort => "unsigned short",
                IntTy::Int => "int",
                IntTy::UInt => "unsigned int",
                IntTy::Long => "long int",
                IntTy::ULong => "unsigned long int",
                IntTy::LongLong => "long long int",
                IntTy::ULongLong => "unsigned long long int",
            },
            LangStd::Ispc => match ty {
                IntTy::Bool => "bool",
                IntTy::Char => "int8",
                IntTy::UChar => "unsigned int8",
                IntTy::Short => "int16",
                IntTy::UShort => "unsigned int16",
                IntTy::Int => "int32",
                IntTy::UInt => "unsigned int32",
                IntTy::Long | IntTy::LongLong => "int64",
                IntTy::ULong | IntTy::ULongLong => "unsigned int64",
            },
        }
    }

    fn signed_literal(value: i128, suffix: &str, min: i128) -> String {
        // The literal for the most negative value parses as a unary minus on
        // an out-of-range constant, so it is spelled as an expression.
        if value == min {
            format!("({}{} - 1)", min + 1, suffix)
        } else {
            format!("{}{}", value, suffix)
        }
    }

    pub fn literal(&self, val: TypedVal) -> String {
        if self.std == LangStd::Ispc {
            return match val.ty {
                IntTy::Bool => val.as_bool().to_string(),
                IntTy::Int => val.as_i128().to_string(),
                ty => format!("(({})({}))", self.type_name(ty), val.as_i128()),
            };
        }
        match val.ty {
            IntTy::Bool => val.as_bool().to_string(),
            IntTy::Char => format!("(signed char){}", val.as_i128()),
            IntTy::UChar => format!("(unsigned char){}", val.as_i128()),
            IntTy::Short => format!("(short){}", val.as_i128()),
            IntTy::UShort => format!("(unsigned short){}", val.as_i128()),
            IntTy::Int => Self::signed_literal(val.as_i128(), "", i32::MIN as i128),
            IntTy::UInt => format!("{}U", val.as_i128()),
            IntTy::Long => Self::signed_literal(val.as_i128(), "L", i64::MIN as i128),
            IntTy::ULong => format!("{}UL", val.as_i128()),
            IntTy::LongLong => Self::signed_literal(val.as_i128(), "LL", i64::MIN as i128),
            IntTy::ULongLong => format!("{}ULL", val.as_i128()),
        }
    }

    fn data_ty_name(&self, ty: &Ty) -> String {
        match ty {
            Ty::Int(int_ty) => self.type_name(*int_ty).to_string(),
            Ty::Struct(struct_ty) => format!("struct {}", struct_ty.name),
        }
    }

    fn emit_struct_ty_def(&mut self, ty: &StructTy) {
        self.output.push_str(&format!("struct {} {{\n", ty.name));
        for member in ty.members() {
            self.output.push_str(&format!(
                "{}{} {};\n",
                " ".repeat(self.indentation),
                self.data_ty_name(&member.ty),
                member.name
            ));
        }
        self.output.push_str("};\n");
    }

    /// One declaration line, without trailing newline. Extern declarations
    /// drop initializers; array definitions brace-initialize from their
    /// element values.
    fn emit_decl_line(&mut self, stmt: &DeclStmt) {
        if stmt.is_extern {
            self.output.push_str("extern ");
        }
        match &stmt.data {
            Data::Var(var) => {
                if var.is_static {
                    self.output.push_str("static ");
                }
                self.output.push_str(var.modifier.prefix());
                self.output
                    .push_str(&format!("{} {}", self.type_name(var.ty), var.name));
                if let Some(init) = &stmt.init {
                    if !stmt.is_extern {
                        self.output.push_str(" = ");
                        self.visit_expr(init);
                    }
                }
            }
            Data::Array(arr) => {
                if let Some(align) = arr.align() {
                    if self.std != LangStd::Ispc {
                        self.output.push_str(&format!("alignas({}) ", align));
                    }
                }
                self.output.push_str(arr.modifier.prefix());
                self.output.push_str(&format!(
                    "{} {} [{}]",
                    self.type_name(arr.elem_ty),
                    arr.name,
                    arr.len()
                ));
                if !stmt.is_extern {
                    let elems: Vec<String> =
                        arr.elems().iter().map(|elem| self.literal(*elem)).collect();
                    self.output
                        .push_str(&format!(" = {{{}}}", elems.join(", ")));
                }
            }
            Data::Struct(data) => {
                self.output.push_str(data.modifier.prefix());
                self.output
                    .push_str(&format!("struct {} {}", data.ty.name, data.name));
            }
        }
        self.output.push(';');
    }

    fn emit_block(&mut self, stmts: &[Stmt]) {
        self.output.push_str("{\n");
        self.enter_scope();
        for stmt in stmts {
            self.visit_stmt(stmt);
            self.output.push('\n');
        }
        self.exit_scope();
        self.pad();
        self.output.push('}');
    }
}

impl Visitor for EmitVisitor {
    fn enter_scope(&mut self) {
        self.curr_indent += self.indentation;
    }

    fn exit_scope(&mut self) {
        self.curr_indent -= self.indentation;
    }

    fn visit_name(&mut self, name: &str) {
        self.output.push_str(name);
    }

    fn visit_decl_stmt(&mut self, stmt: &DeclStmt) {
        self.pad();
        self.emit_decl_line(stmt);
    }

    fn visit_expr_stmt(&mut self, stmt: &ExprStmt) {
        self.pad();
        self.visit_expr(&stmt.expr);
        self.output.push(';');
    }

    fn visit_if_stmt(&mut self, stmt: &IfStmt) {
        self.pad();
        self.output.push_str("if (");
        self.visit_expr(&stmt.cond);
        self.output.push_str(") ");
        self.emit_block(&stmt.then);
        if let Some(otherwise) = &stmt.otherwise {
            self.output.push_str(" else ");
            self.emit_block(otherwise);
        }
    }

    fn visit_loop_stmt(&mut self, stmt: &CntLoopStmt) {
        self.pad();
        self.output.push_str("for (");
        match &stmt.iter_decl.data {
            Data::Var(iter) => {
                self.output
                    .push_str(&format!("{} {} = ", self.type_name(iter.ty), iter.name));
                match &stmt.iter_decl.init {
                    Some(init) => self.visit_expr(init),
                    None => self.output.push('0'),
                }
            }
            _ => panic!("loop iterator must be a scalar variable"),
        }
        self.output.push_str("; ");
        self.visit_expr(&stmt.cond);
        self.output.push_str("; ");
        self.visit_expr(&stmt.step);
        self.output.push_str(") ");
        self.emit_block(&stmt.body);
    }

    fn visit_var_use_expr(&mut self, expr: &VarUseExpr) {
        self.visit_name(&expr.name);
    }

    fn visit_const_expr(&mut self, expr: &ConstExpr) {
        let literal = self.literal(expr.val);
        self.output.push_str(&literal);
    }

    fn visit_assign_expr(&mut self, expr: &AssignExpr) {
        self.visit_place_expr(&expr.place);
        self.output.push_str(" = ");
        self.visit_expr(&expr.rhs);
    }

    fn visit_binary_expr(&mut self, expr: &BinaryExpr) {
        self.output.push('(');
        self.visit_expr(&expr.lhs);
        self.output.push_str(&format!(" {} ", expr.op.to_string()));
        self.visit_expr(&expr.rhs);
        self.output.push(')');
    }

    fn visit_unary_expr(&mut self, expr: &UnaryExpr) {
        if expr.op.is_postfix() {
            self.visit_expr(&expr.expr);
            self.output.push_str(&expr.op.to_string());
        } else if expr.op.is_step_op() {
            self.output.push_str(&expr.op.to_string());
            self.visit_expr(&expr.expr);
        } else {
            self.output.push_str(&expr.op.to_string());
            self.output.push('(');
            self.visit_expr(&expr.expr);
            self.output.push(')');
        }
    }

    fn visit_index_expr(&mut self, expr: &IndexExpr) {
        self.visit_name(&expr.array_name);
        self.output.push('[');
        self.visit_expr(&expr.index);
        self.output.push(']');
    }

    fn visit_member_expr(&mut self, expr: &MemberExpr) {
        self.visit_name(&expr.base);
        for sel in &expr.path {
            self.output.push('.');
            self.output.push_str(&sel.name);
        }
    }

    fn visit_cast_expr(&mut self, expr: &CastExpr) {
        self.output
            .push_str(&format!("(({})(", self.type_name(expr.ty)));
        self.visit_expr(&expr.expr);
        self.output.push_str("))");
    }

    fn visit_list_expr(&mut self, expr: &ExprListExpr) {
        for (i, expr) in expr.exprs.iter().enumerate() {
            if i != 0 {
                self.output.push_str(", ");
            }
            self.visit_expr(expr);
        }
    }

    fn visit_call_expr(&mut self, expr: &CallExpr) {
        self.visit_name(&expr.name);
        self.output.push('(');
        self.visit_list_expr(&expr.args);
        self.output.push(')');
    }
}

impl EmitVisitor {
    fn seed_banner(&mut self, seed: u64) {
        self.output.push_str(&format!("/* Seed: {} */\n\n", seed));
    }

    fn test_fn_params(&self, program: &Program) -> String {
        program
            .inputs
            .variables()
            .filter(|var| program.arg_inputs.contains(&var.name))
            .map(|var| format!("const {} {}", self.type_name(var.ty), var.name))
            .collect::<Vec<String>>()
            .join(", ")
    }

    fn test_fn_args(program: &Program) -> String {
        program
            .inputs
            .variables()
            .filter(|var| program.arg_inputs.contains(&var.name))
            .map(|var| var.name.clone())
            .collect::<Vec<String>>()
            .join(", ")
    }

    /// The shared header: struct type definitions, extern declarations of
    /// every external datum, and the prototypes linking the translation
    /// units together.
    pub fn emit_header(&mut self, program: &Program, seed: u64) -> String {
        let prev_std = self.std;
        if self.std == LangStd::Ispc {
            // The header is consumed by the C++ driver.
            self.std = LangStd::Cxx;
        }
        self.output.clear();
        self.seed_banner(seed);
        for ty in &program.struct_types {
            self.emit_struct_ty_def(ty);
            self.output.push('\n');
        }
        self.output
            .push_str("extern unsigned long long int seed;\n");
        self.output.push_str(
            "void hash(unsigned long long int &seed, unsigned long long int v);\n\n",
        );
        for stmt in program
            .inputs
            .extern_decl_stmts()
            .iter()
            .chain(program.outputs.extern_decl_stmts().iter())
        {
            if let Stmt::Decl(decl) = stmt {
                self.emit_decl_line(decl);
                self.output.push('\n');
            }
        }
        self.output.push('\n');
        self.output.push_str("void init();\n");
        let linkage = if prev_std == LangStd::Ispc {
            "extern \"C\" "
        } else {
            ""
        };
        self.output.push_str(&format!(
            "{}void foo({});\n",
            linkage,
            self.test_fn_params(program)
        ));
        self.output.push_str("void check();\n");
        self.std = prev_std;
        self.output()
    }

    /// The test function's translation unit, kept apart from the input
    /// definitions so the compilers under test cannot fold them together.
    pub fn emit_func(&mut self, program: &Program, seed: u64) -> String {
        self.output.clear();
        self.seed_banner(seed);
        match self.std {
            LangStd::Cxx | LangStd::Sycl => {
                self.output.push_str("#include \"init.h\"\n\n");
                self.output
                    .push_str(&format!("void foo({}) ", self.test_fn_params(program)));
            }
            LangStd::Ispc => {
                for ty in &program.struct_types {
                    self.emit_struct_ty_def(ty);
                    self.output.push('\n');
                }
                for stmt in program
                    .inputs
                    .extern_decl_stmts()
                    .iter()
                    .chain(program.outputs.extern_decl_stmts().iter())
                {
                    if let Stmt::Decl(decl) = stmt {
                        self.emit_decl_line(decl);
                        self.output.push('\n');
                    }
                }
                self.output.push('\n');
                self.output
                    .push_str(&format!("export void foo({}) ", self.test_fn_params(program)));
            }
        }
        self.emit_block(&program.body);
        self.output.push('\n');
        self.output()
    }

    /// The driver: definitions with concrete initializers, the hash
    /// function, init/check, and the entry point printing the checksum.
    pub fn emit_driver(&mut self, program: &Program, seed: u64) -> String {
        let prev_std = self.std;
        if self.std == LangStd::Ispc {
            self.std = LangStd::Cxx;
        }
        self.output.clear();
        self.seed_banner(seed);
        match prev_std {
            LangStd::Sycl => self.output.push_str("#include <iostream>\n"),
            _ => self.output.push_str("#include <stdio.h>\n"),
        }
        if !program.assert_stmts.is_empty() {
            self.output.push_str("#include <assert.h>\n");
        }
        self.output.push_str("#include \"init.h\"\n\n");

        self.output
            .push_str("unsigned long long int seed = 0ULL;\n\n");
        self.output.push_str(
            "void hash(unsigned long long int &seed, unsigned long long int v) {\n",
        );
        self.output.push_str(&format!(
            "{}seed ^= v + 0x9e3779b9ULL + (seed << 6) + (seed >> 2);\n}}\n\n",
            " ".repeat(self.indentation)
        ));

        for stmt in program
            .inputs
            .def_stmts()
            .iter()
            .chain(program.outputs.def_stmts().iter())
        {
            if let Stmt::Decl(decl) = stmt {
                self.emit_decl_line(decl);
                self.output.push('\n');
            }
        }
        self.output.push('\n');

        self.output.push_str("void init() ");
        let init_stmts: Vec<Stmt> = program
            .inputs
            .struct_init_stmts()
            .into_iter()
            .chain(program.outputs.struct_init_stmts().into_iter())
            .collect();
        self.emit_block(&init_stmts);
        self.output.push_str("\n\n");

        self.output.push_str("void check() ");
        let check_stmts: Vec<Stmt> = program
            .check_stmts
            .iter()
            .cloned()
            .chain(program.assert_stmts.iter().cloned())
            .collect();
        self.emit_block(&check_stmts);
        self.output.push_str("\n\n");

        self.output.push_str("int main() {\n");
        let indent = " ".repeat(self.indentation);
        self.output.push_str(&format!("{}init();\n", indent));
        self.output
            .push_str(&format!("{}foo({});\n", indent, Self::test_fn_args(program)));
        self.output.push_str(&format!("{}check();\n", indent));
        match prev_std {
            LangStd::Sycl => self.output.push_str(&format!(
                "{}std::cout << {} << std::endl;\n",
                indent, SEED_VAR
            )),
            _ => self
                .output
                .push_str(&format!("{}printf(\"%llu\\n\", {});\n", indent, SEED_VAR)),
        }
        self.output.push_str(&format!("{}return 0;\n}}\n", indent));
        self.std = prev_std;
        self.output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::data::{ArrayData, Modifier, Variable};
    use crate::ast::expr::Expr;
    use crate::ast::op::BinaryOp;
    use crate::symbol_table::SymbolTable;

    #[test]
    fn expressions_emit_dialect_syntax() {
        let expr = BinaryExpr::new(BinaryOp::Add, Expr::int(1), Expr::int(2));
        let mut visitor = EmitVisitor::default();
        visitor.visit_binary_expr(&expr);
        assert_eq!(visitor.output(), "(1 + 2)");
    }

    #[test]
    fn casts_and_literals_are_parenthesized() {
        let expr = CastExpr::new(IntTy::Short, Expr::int(-5));
        let mut visitor = EmitVisitor::default();
        visitor.visit_cast_expr(&expr);
        assert_eq!(visitor.output(), "((short)(-5))");
    }

    #[test]
    fn int_min_literal_is_spelled_as_an_expression() {
        let mut visitor = EmitVisitor::default();
        visitor.visit_const_expr(&ConstExpr::new(TypedVal::int(i32::MIN)));
        assert_eq!(visitor.output(), "(-2147483647 - 1)");
    }

    #[test]
    fn index_emission_subscripts_the_array() {
        let mut arr = ArrayData::new("arr_1", IntTy::UInt, Modifier::None, 4);
        arr.set_elem(2, TypedVal::uint(9));
        let expr = IndexExpr::new(&arr, Expr::int(2));
        let mut visitor = EmitVisitor::default();
        visitor.visit_index_expr(&expr);
        assert_eq!(visitor.output(), "arr_1[2]");
    }

    #[test]
    fn check_sequence_emits_hash_calls() {
        let mut table = SymbolTable::default();
        let mut var = Variable::new("i", IntTy::ULong, Modifier::None, false);
        var.set_value(TypedVal::new(IntTy::ULong, 10));
        table.add_variable(var);
        let mut seed = 0u64;
        let stmts = table.build_check_stmts(&mut seed);
        let mut visitor = EmitVisitor::default();
        visitor.visit_stmt(&stmts[0]);
        assert_eq!(
            visitor.output(),
            "hash(seed, ((unsigned long long int)(i)));"
        );
    }

    #[test]
    fn volatile_scalar_definitions_carry_the_qualifier() {
        let mut var = Variable::new("var_1", IntTy::Short, Modifier::Volatile, false);
        var.set_value(TypedVal::new(IntTy::Short, -3i16 as u128));
        let stmt = DeclStmt {
            data: var.into(),
            is_extern: false,
            init: Some(Expr::const_val(TypedVal::new(IntTy::Short, -3i16 as u128))),
        };
        let mut visitor = EmitVisitor::default();
        visitor.visit_decl_stmt(&stmt);
        assert_eq!(visitor.output(), "volatile short var_1 = (short)-3;");
    }
}
