/**
quadc | compile_error.rs
Holds details related to the errors to possibly raise during compilation.
*/

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse syntax tree input: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("semantic error: {0}")]
    Semantic(String),
}
