// Player analysis: prompt building, completion, defensive parsing and the
// deterministic position/age fallback.
// All LLM calls go through llm_client, never directly to a provider.

pub mod analyzer;
pub mod fallback;
pub mod handlers;
pub mod models;
pub mod parser;
pub mod prompts;
