/**
quadc | src/driver.rs
Compiler driver: runs the back-end pipeline
(load tree → optional semantic check → lower to quads → emit asm).
*/

use std::fs;
use std::path::Path;

use crate::ast::Node;
use crate::compile_error::CompileError;
use crate::{asm8086, semantic, tac};

#[derive(Debug, Clone, Copy, Default)]
pub struct CompileFlags {
    pub dump_tree: bool,  // --dump-tree
    pub dump_quads: bool, // --dump-quads
    pub check: bool,      // --check (declare-before-use pre-pass)
    pub verbose: bool,    // extra stage prints
}

#[derive(Debug)]
pub enum CompileStop {
    Done, // artifact written
    StoppedAfterTree,
    StoppedAfterQuads,
}

/// Loads a front-end syntax tree serialized as JSON.
pub fn load_tree(input: &Path) -> Result<Node, CompileError> {
    let text = fs::read_to_string(input)?;
    let tree = serde_json::from_str(&text)?;
    Ok(tree)
}

/// Public entrypoint for the driver. Returns where it stopped.
pub fn compile_tree(
    tree: &Node,
    output: &Path,
    flags: CompileFlags,
) -> Result<CompileStop, CompileError> {
    if flags.dump_tree {
        println!("{tree}");
        return Ok(CompileStop::StoppedAfterTree);
    }

    // The semantic check is the only pass that halts the pipeline.
    if flags.check {
        semantic::check_declared(tree)?;
        if flags.verbose {
            eprintln!("Semantic check passed.");
        }
    }

    let lowering = tac::generate(tree);
    if flags.verbose {
        eprintln!(
            "Lowering completed: {} quadruples, {} diagnostics.",
            lowering.instructions.len(),
            lowering.diagnostics.len()
        );
    }

    if flags.dump_quads {
        for quad in &lowering.instructions {
            println!("{quad}");
        }
        return Ok(CompileStop::StoppedAfterQuads);
    }

    let emit_diagnostics = asm8086::write_assembly(&lowering.instructions, output)?;
    if flags.verbose {
        eprintln!(
            "Wrote {} ({} emitter diagnostics).",
            output.display(),
            emit_diagnostics.len()
        );
    }

    Ok(CompileStop::Done)
}
