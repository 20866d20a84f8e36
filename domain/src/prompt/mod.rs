//! Prompt domain
//!
//! Templates for the prompts sent at each phase of the consensus pipeline.

mod template;

pub use template::PromptTemplate;
