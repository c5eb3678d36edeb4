pub mod gemini;
pub mod prompt_builder;
pub mod trip_orchestrator;
