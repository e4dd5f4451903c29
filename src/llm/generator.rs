use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};

use super::prompt::build_prompt;
use super::provider::ModelProvider;
use super::schema::OutputSchema;
use crate::error::GenerationResult;
use crate::request::GenerationRequest;

/// Turns a [`GenerationRequest`] into decoded output with a single model call.
///
/// The provider handle is immutable and shared between concurrent requests;
/// every call builds its own prompt and descriptor, so nothing is carried
/// from one request to the next.
#[derive(Clone)]
pub struct StructuredGenerator {
    provider: Arc<dyn ModelProvider>,
}

impl StructuredGenerator {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self { provider }
    }

    #[instrument(
        skip_all,
        fields(
            provider = self.provider.name(),
            model = self.provider.model(),
            schema = schema.name(),
            items = request.item_count().get(),
            difficulty = %request.difficulty(),
        )
    )]
    pub async fn generate<S: OutputSchema>(
        &self,
        request: &GenerationRequest,
        schema: &S,
    ) -> GenerationResult<S::Output> {
        let prompt = build_prompt(request, schema);
        let descriptor = schema.descriptor(request);
        let started = Instant::now();

        debug!(prompt_chars = prompt.body.len(), "awaiting model response");
        let payload = match self.provider.call(&prompt, &descriptor).await {
            Ok(payload) => payload,
            Err(err) => {
                warn!(kind = %err.kind, error = %err.message, "model call failed");
                return Err(err);
            }
        };

        match schema.decode(&payload, request) {
            Ok(output) => {
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "generation completed"
                );
                Ok(output)
            }
            Err(err) => {
                error!(raw_payload = %payload, error = %err.message, "model reply did not match schema");
                Err(err)
            }
        }
    }
}
