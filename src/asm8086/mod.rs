/**
quadc | asm8086/mod.rs
Target back end: translates the quadruple sequence into 8086 assembly
text using a fixed MASM template.
*/

pub mod emit;

pub use emit::{assemble, write_assembly, Assembly};
