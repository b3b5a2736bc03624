//! Semantic analysis: two traversals over the AST.
//!
//! The first collects class and function signatures so forward references
//! and recursion work, resolves inheritance, and closes field layouts. The
//! second checks bodies and lowers them to [`ir`], annotating every
//! reference with its resolved symbol. Analysis recovers after errors and
//! keeps going; the caller decides what to do with a diagnosed [`ir::Root`].

mod decl;
mod expr;
mod stmt;
mod type_checking;
mod util;

#[cfg(test)]
mod tests;

use crate::ast;
use crate::diagnostic::AggregateResult;
use crate::ir;

use util::Analyzer;

pub fn build_ir_from_ast(ast: &ast::Ast) -> AggregateResult<ir::Root> {
    let mut analyzer = Analyzer::new();

    let res = decl::collect_signatures(&mut analyzer, ast);
    let res = res.aggregate(decl::check_bodies(&mut analyzer, ast));

    debug_assert_eq!(analyzer.table.depth(), 0, "ICE: unbalanced scope stack");

    res.map(|()| analyzer.into_root())
}
