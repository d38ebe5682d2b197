pub mod base_visitor;
pub mod emit_visitor;
