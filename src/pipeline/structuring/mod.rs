pub mod prompt;
pub mod parser;
pub mod summary;
pub mod orchestrator;

pub use prompt::*;
pub use parser::*;
pub use summary::*;
pub use orchestrator::*;

use thiserror::Error;

use crate::pipeline::llm::LlmError;

#[derive(Error, Debug)]
pub enum StructuringError {
    #[error("Generation failed: {0}")]
    Llm(#[from] LlmError),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Expected a JSON array of lab results")]
    NotAnArray,
}
