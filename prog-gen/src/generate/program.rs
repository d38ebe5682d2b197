use crate::ast::data::Data;
use crate::ast::program::Program;
use crate::ast::stmt::Stmt;
use crate::ast::ty::StructTy;
use crate::context::{Context, ScopeCtx};
use crate::generator::GenOptions;
use crate::runtime::config::OptionLevel;
use std::collections::BTreeSet;

/// Phase one of generation: struct types, then external inputs, then
/// external outputs, strictly in that order so the draw stream is fixed for
/// a given seed.
pub fn generate_external_data(ctx: &mut Context) {
    let num_types = ctx.choose_num_struct_types();
    for _ in 0..num_types {
        let ty = StructTy::generate_new_type(ctx)
            .expect("struct type generation draws from validated tables");
        ctx.extern_inp_sym_table.add_struct_type(ty);
    }

    let num_inputs = ctx.choose_num_inputs();
    for _ in 0..num_inputs {
        let kind = ctx.choose_input_kind();
        let data = Data::generate_data(ctx, kind, true)
            .expect("input generation draws from validated tables");
        ctx.extern_inp_sym_table.add_data(data);
    }

    let num_outputs = ctx.choose_num_outputs();
    for _ in 0..num_outputs {
        let kind = ctx.choose_output_kind();
        // Outputs are assignment targets and are never const-qualified.
        let data = Data::generate_data(ctx, kind, false)
            .expect("output generation draws from validated tables");
        ctx.extern_out_sym_table.add_data(data);
    }
}

impl Program {
    /// Drives one whole-program generation pass. After this returns, nothing
    /// in the result mutates again; emission is a pure read.
    pub fn generate(ctx: &mut Context, opts: &GenOptions) -> Option<Program> {
        generate_external_data(ctx);

        let root = ScopeCtx::root();
        let num_stmts = ctx.choose_num_stmts();
        let mut body = vec![];
        for _ in 0..num_stmts {
            body.push(Stmt::fuzz_stmt(ctx, &root)?);
        }

        let mut arg_inputs = BTreeSet::new();
        match opts.inp_as_args {
            OptionLevel::None => {}
            OptionLevel::Some => {
                let names: Vec<String> = ctx
                    .extern_inp_sym_table
                    .variables()
                    .map(|var| var.name.clone())
                    .collect();
                for name in names {
                    if ctx.choose_inp_as_arg() {
                        arg_inputs.insert(name);
                    }
                }
            }
            OptionLevel::All => {
                arg_inputs = ctx
                    .extern_inp_sym_table
                    .variables()
                    .map(|var| var.name.clone())
                    .collect();
            }
        }

        let mut seed = 0u64;
        let mut check_stmts = ctx.extern_inp_sym_table.build_check_stmts(&mut seed);
        check_stmts.extend(ctx.extern_out_sym_table.build_check_stmts(&mut seed));

        let assert_stmts = match opts.asserts {
            OptionLevel::None => vec![],
            OptionLevel::Some => ctx.extern_out_sym_table.build_assert_stmts(true),
            OptionLevel::All => {
                let mut stmts = ctx.extern_inp_sym_table.build_assert_stmts(false);
                stmts.extend(ctx.extern_out_sym_table.build_assert_stmts(false));
                stmts
            }
        };

        Some(Program {
            struct_types: ctx.extern_inp_sym_table.struct_types().to_vec(),
            inputs: ctx.extern_inp_sym_table.clone(),
            outputs: ctx.extern_out_sym_table.clone(),
            body,
            check_stmts,
            assert_stmts,
            arg_inputs,
            expected_checksum: seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;

    #[test]
    fn whole_program_generation_succeeds_for_every_preset() {
        for (i, policy) in Policy::get_policies().into_iter().enumerate() {
            let mut ctx = Context::with_policy(100 + i as u64, &policy);
            let program = Program::generate(&mut ctx, &GenOptions::default()).unwrap();
            assert!(!program.outputs.is_empty());
            assert!(!program.check_stmts.is_empty());
        }
    }

    #[test]
    fn expected_checksum_matches_a_manual_fold() {
        let mut ctx = Context::with_policy(5, &Policy::default());
        let program = Program::generate(&mut ctx, &GenOptions::default()).unwrap();
        let folded = program
            .outputs
            .fold_checksum(program.inputs.fold_checksum(0));
        assert_eq!(program.expected_checksum, folded);
    }

    #[test]
    fn all_inputs_mode_passes_every_scalar_input() {
        let mut ctx = Context::with_policy(9, &Policy::default());
        let opts = GenOptions {
            inp_as_args: OptionLevel::All,
            ..GenOptions::default()
        };
        let program = Program::generate(&mut ctx, &opts).unwrap();
        let scalar_inputs = program.inputs.variables().count();
        assert_eq!(program.arg_inputs.len(), scalar_inputs);
    }
}
