//! Subject-language frontend: syntax tree, parser, and rewrite helpers.
//!
//! Functions under test, mutants, and assertions all share this
//! representation. The tree is immutable and `Arc`-shared so mutant creation
//! copies only the rewritten path.

pub mod ast;
mod parser;

pub use ast::{
    expr_rewrites, replace_expr, return_rewrites, BinOp, Block, CmpOp, Expr, FunctionDef,
    LogicOp, Rewrite, Stmt, UnaryOp,
};
pub use parser::{parse_assertion, parse_function};
