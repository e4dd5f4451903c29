use std::fmt;

use async_trait::async_trait;

use super::prompt::Prompt;
use super::schema::SchemaDescriptor;
use crate::error::GenerationResult;

/// A hosted model that can answer a prompt in a requested JSON shape.
///
/// Implementations make exactly one outbound request per `call` and fold
/// every failure into a [`crate::error::GenerationError`]; retrying is left
/// to whatever the underlying HTTP client does on its own.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    /// Returns the raw text of the model's structured reply.
    async fn call(&self, prompt: &Prompt, schema: &SchemaDescriptor) -> GenerationResult<String>;

    /// Cheap authenticated request used to validate a credential.
    async fn healthcheck(&self) -> GenerationResult<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ProviderKind {
    Gemini,
    Openai,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Openai => "openai",
        }
    }

    pub fn api_key_env(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "STUDYGEN_GEMINI_API_KEY",
            ProviderKind::Openai => "STUDYGEN_OPENAI_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini => super::gemini::DEFAULT_MODEL,
            ProviderKind::Openai => super::openai::DEFAULT_MODEL,
        }
    }

    pub fn default_api_base(self) -> &'static str {
        match self {
            ProviderKind::Gemini => super::gemini::DEFAULT_API_BASE,
            ProviderKind::Openai => super::openai::DEFAULT_API_BASE,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
