use std::net::SocketAddr;

use anyhow::Result;
use clap::Args;
use clap::builder::RangedU64ValueParser;

use crate::api::RequestLimits;
use crate::llm::secrets::ApiKeySource;
use crate::llm::{ProviderKind, ProviderSettings};

/// Which hosted model to talk to.
#[derive(Args, Debug, Clone)]
pub struct ProviderArgs {
    /// LLM provider
    #[arg(long, value_enum, env = "STUDYGEN_PROVIDER", default_value_t = ProviderKind::Gemini)]
    pub provider: ProviderKind,
    /// Model name. Defaults to the provider's recommended model
    #[arg(long, env = "STUDYGEN_MODEL", value_name = "MODEL")]
    pub model: Option<String>,
    /// Override the provider's API base URL
    #[arg(long, env = "STUDYGEN_API_BASE", value_name = "URL")]
    pub api_base: Option<String>,
}

impl ProviderArgs {
    pub fn resolve(&self) -> Result<(ProviderSettings, ApiKeySource)> {
        ProviderSettings::load(
            self.provider,
            self.model.as_deref(),
            self.api_base.as_deref(),
        )
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "STUDYGEN_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,
    #[command(flatten)]
    pub provider: ProviderArgs,
    /// Largest `num_questions` a caller may ask for
    #[arg(
        long,
        env = "STUDYGEN_MAX_QUESTIONS",
        default_value_t = 20,
        value_name = "COUNT",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_questions: usize,
    /// Largest `num_sections` a caller may ask for
    #[arg(
        long,
        env = "STUDYGEN_MAX_SECTIONS",
        default_value_t = 10,
        value_name = "COUNT",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_sections: usize,
    /// Emit logs as JSON lines
    #[arg(long, env = "STUDYGEN_LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl ServeArgs {
    pub fn limits(&self) -> RequestLimits {
        RequestLimits {
            max_questions: self.max_questions,
            max_sections: self.max_sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Harness {
        #[command(flatten)]
        serve: ServeArgs,
    }

    #[test]
    fn serve_args_defaults() {
        let parsed = Harness::try_parse_from(["studygen"]).unwrap().serve;
        assert_eq!(parsed.bind, "127.0.0.1:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(parsed.provider.provider, ProviderKind::Gemini);
        assert!(parsed.provider.model.is_none());
        let limits = parsed.limits();
        assert_eq!(limits.max_questions, 20);
        assert_eq!(limits.max_sections, 10);
        assert!(!parsed.log_json);
    }

    #[test]
    fn serve_args_overrides() {
        let parsed = Harness::try_parse_from([
            "studygen",
            "--bind",
            "0.0.0.0:9000",
            "--provider",
            "openai",
            "--model",
            "gpt-test",
            "--max-questions",
            "8",
            "--log-json",
        ])
        .unwrap()
        .serve;

        assert_eq!(parsed.bind.port(), 9000);
        assert_eq!(parsed.provider.provider, ProviderKind::Openai);
        assert_eq!(parsed.provider.model.as_deref(), Some("gpt-test"));
        assert_eq!(parsed.limits().max_questions, 8);
        assert!(parsed.log_json);
    }

    #[test]
    fn zero_caps_are_rejected() {
        assert!(Harness::try_parse_from(["studygen", "--max-questions", "0"]).is_err());
        assert!(Harness::try_parse_from(["studygen", "--max-sections", "0"]).is_err());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(Harness::try_parse_from(["studygen", "--provider", "llama"]).is_err());
    }
}
