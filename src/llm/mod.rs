pub mod client;
pub mod gemini;
pub mod generator;
pub mod openai;
pub mod prompt;
pub mod provider;
pub mod schema;
pub mod secrets;

pub use client::{ProviderSettings, build_provider, test_configured_api_key};
pub use generator::StructuredGenerator;
pub use prompt::{Prompt, build_prompt};
pub use provider::{ModelProvider, ProviderKind};
pub use schema::{LessonSchema, OutputSchema, QuizSchema, SchemaDescriptor};
pub use secrets::{clear_api_key, prompt_for_api_key, store_api_key};
