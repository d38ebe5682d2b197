//! The finished program: fully-propagated, immutable after generation.

use crate::ast::stmt::Stmt;
use crate::ast::ty::StructTy;
use crate::symbol_table::SymbolTable;
use std::collections::BTreeSet;

/// Everything emission needs, produced by one generation pass. Nothing in
/// here mutates once generation completes; the emission passes only read.
#[derive(Debug, Clone)]
pub struct Program {
    /// Struct type definitions, in dependency order.
    pub struct_types: Vec<StructTy>,
    /// External input data: initialized by the driver, read by the test
    /// function.
    pub inputs: SymbolTable,
    /// External output data: assigned by the test function, folded into the
    /// checksum.
    pub outputs: SymbolTable,
    /// Body of the generated test function.
    pub body: Vec<Stmt>,
    /// The value-folding check sequence over inputs and outputs.
    pub check_stmts: Vec<Stmt>,
    /// Optional assertions pinning tracked leaves to their final values.
    pub assert_stmts: Vec<Stmt>,
    /// Scalar inputs passed to the test function as parameters instead of
    /// being read as globals.
    pub arg_inputs: BTreeSet<String>,
    /// The checksum both builds of the program must print.
    pub expected_checksum: u64,
}
