/**
quadc
Back end of a minimal imperative-language compiler: consumes a
serialized syntax tree and produces 8086 assembly text.
*/

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use quadc::driver::{self, CompileFlags};

#[derive(Parser, Debug)]
#[command(name = "quadc", version, about = "Lowers a syntax tree to 8086 assembly")]
struct Cli {
    /// Input syntax tree (JSON, produced by the front end)
    input: PathBuf,

    /// Output assembly path (defaults to the input with an .asm extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the syntax tree and stop
    #[arg(long)]
    dump_tree: bool,

    /// Print the quadruple sequence and stop
    #[arg(long)]
    dump_quads: bool,

    /// Run the declare-before-use check before lowering
    #[arg(long)]
    check: bool,

    /// Extra stage reporting on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let output = cli
        .output
        .unwrap_or_else(|| cli.input.with_extension("asm"));
    let flags = CompileFlags {
        dump_tree: cli.dump_tree,
        dump_quads: cli.dump_quads,
        check: cli.check,
        verbose: cli.verbose,
    };

    let tree = match driver::load_tree(&cli.input) {
        Ok(tree) => tree,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match driver::compile_tree(&tree, &output, flags) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
