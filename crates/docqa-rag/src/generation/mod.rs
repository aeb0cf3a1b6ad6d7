//! Prompt assembly and answer generation

pub mod assemble;
pub mod generate;

pub use assemble::{AssembledPrompt, ContextAssembler};
pub use generate::{AnswerGenerator, GenerationOutcome, FALLBACK_ANSWER};
