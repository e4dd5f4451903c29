use async_openai::{Client, config::OpenAIConfig, error::OpenAIError};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};

use super::prompt::Prompt;
use super::provider::ModelProvider;
use super::schema::SchemaDescriptor;
use crate::error::{GenerationError, GenerationResult};

pub const DEFAULT_MODEL: &str = "gpt-5-nano";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

const MAX_OUTPUT_TOKENS: u32 = 5000;

#[derive(Deserialize, Debug)]
struct ResponsesReply {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<OutputContent>,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OutputContent {
    OutputText {
        text: String,
    },
    Refusal {
        refusal: String,
    },
    #[serde(other)]
    Other,
}

/// OpenAI Responses API with a strict `json_schema` text format.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: &SecretString, model: &str, api_base: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.expose_secret().as_str())
            .with_api_base(api_base.trim_end_matches('/'));

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }

    fn request_body(&self, prompt: &Prompt, schema: &SchemaDescriptor) -> Value {
        json!({
            "model": self.model,
            "instructions": prompt.system,
            "input": prompt.body,
            "max_output_tokens": MAX_OUTPUT_TOKENS,
            "text": {
                "format": {
                    "type": "json_schema",
                    "name": schema.name,
                    "schema": strict_schema(&schema.schema),
                    "strict": true
                }
            }
        })
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn call(&self, prompt: &Prompt, schema: &SchemaDescriptor) -> GenerationResult<String> {
        let reply: ResponsesReply = self
            .client
            .responses()
            .create_byot(self.request_body(prompt, schema))
            .await
            .map_err(map_openai_error)?;

        reply_text(reply)
    }

    async fn healthcheck(&self) -> GenerationResult<()> {
        self.client
            .models()
            .list()
            .await
            .map_err(map_openai_error)?;
        Ok(())
    }
}

fn map_openai_error(err: OpenAIError) -> GenerationError {
    match err {
        OpenAIError::Reqwest(err) => {
            GenerationError::transport(format!("request to OpenAI failed: {err}"))
        }
        OpenAIError::ApiError(api) => GenerationError::provider(format!("OpenAI: {}", api.message)),
        err @ OpenAIError::JSONDeserialize(..) => {
            GenerationError::transport(format!("malformed reply from OpenAI: {err}"))
        }
        other => GenerationError::provider(format!("OpenAI: {other}")),
    }
}

fn reply_text(reply: ResponsesReply) -> GenerationResult<String> {
    for item in reply.output {
        let OutputItem::Message { content } = item else {
            continue;
        };
        for part in content {
            match part {
                OutputContent::OutputText { text } if !text.trim().is_empty() => {
                    return Ok(text);
                }
                OutputContent::Refusal { refusal } => {
                    return Err(GenerationError::provider(format!(
                        "OpenAI refused the request: {refusal}"
                    )));
                }
                _ => {}
            }
        }
    }

    Err(GenerationError::provider("No text output returned from model"))
}

/// Strict mode rejects objects that allow unknown keys, so every object in
/// the schema is closed.
fn strict_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut closed: serde_json::Map<String, Value> = map
                .iter()
                .map(|(key, value)| (key.clone(), strict_schema(value)))
                .collect();
            if closed.get("type").and_then(Value::as_str) == Some("object") {
                closed.insert("additionalProperties".to_string(), Value::Bool(false));
            }
            Value::Object(closed)
        }
        Value::Array(items) => Value::Array(items.iter().map(strict_schema).collect()),
        other => other.clone(),
    }
}
