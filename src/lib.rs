/**
quadc | src/lib.rs
Back end of a minimal imperative-language compiler: lowers a syntax tree
into three-address quadruples and emits them as 8086 assembly text.
*/

pub mod asm8086;
pub mod ast;
pub mod compile_error;
pub mod diagnostics;
pub mod driver;
pub mod semantic;
pub mod tac;

pub use compile_error::CompileError;
pub use diagnostics::{Diagnostic, Severity};
