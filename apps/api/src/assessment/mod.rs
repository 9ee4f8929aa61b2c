// Assessment flow: a psychometric battery followed by job-role questions,
// one answer per request, ending in a model-generated analysis.
// All LLM calls go through llm_client.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod session;
