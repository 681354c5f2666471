// Interview engine: Phase 1 (context analysis) and Phase 2 (question generation).
// All model calls go through llm_client; markers and labels live in prompts.rs.

pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prompts;
