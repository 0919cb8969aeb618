/**
quadc | tac/mod.rs
Three-address code: the quadruple instruction set and the generator
that lowers a syntax tree into it.
*/

pub mod ast;
pub mod lower;

pub use ast::*;
pub use lower::{generate, Lowering};
