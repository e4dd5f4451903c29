use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use secrecy::SecretString;

use super::gemini::GeminiProvider;
use super::openai::OpenAiProvider;
use super::provider::{ModelProvider, ProviderKind};
use super::secrets::{ApiKeySource, get_api_key_from_sources};

/// Everything needed to bind to one hosted model.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub model: String,
    pub api_base: String,
    pub api_key: SecretString,
}

impl ProviderSettings {
    /// Resolves the credential for `kind` and fills in provider defaults for
    /// anything not overridden.
    pub fn load(
        kind: ProviderKind,
        model: Option<&str>,
        api_base: Option<&str>,
    ) -> Result<(Self, ApiKeySource)> {
        let lookup = get_api_key_from_sources(kind)?.ok_or_else(|| {
            anyhow!(
                "No {kind} API key configured. Set {} or run `studygen key --provider {kind} --set`.",
                kind.api_key_env()
            )
        })?;

        let settings = Self {
            kind,
            model: model.unwrap_or(kind.default_model()).to_string(),
            api_base: api_base.unwrap_or(kind.default_api_base()).to_string(),
            api_key: lookup.api_key,
        };
        Ok((settings, lookup.source))
    }
}

pub fn build_provider(settings: &ProviderSettings) -> Result<Arc<dyn ModelProvider>> {
    let provider: Arc<dyn ModelProvider> = match settings.kind {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(
            settings.api_key.clone(),
            &settings.model,
            &settings.api_base,
        )?),
        ProviderKind::Openai => Arc::new(OpenAiProvider::new(
            &settings.api_key,
            &settings.model,
            &settings.api_base,
        )),
    };
    Ok(provider)
}

pub async fn test_configured_api_key(
    kind: ProviderKind,
    model: Option<&str>,
    api_base: Option<&str>,
) -> Result<ApiKeySource> {
    let (settings, source) = ProviderSettings::load(kind, model, api_base)?;
    let provider = build_provider(&settings)?;
    provider
        .healthcheck()
        .await
        .with_context(|| format!("Failed to validate API key with {kind}"))?;
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_provider_matches_kind() {
        for kind in [ProviderKind::Gemini, ProviderKind::Openai] {
            let settings = ProviderSettings {
                kind,
                model: kind.default_model().to_string(),
                api_base: kind.default_api_base().to_string(),
                api_key: SecretString::new("key".to_string()),
            };
            let provider = build_provider(&settings).unwrap();
            assert_eq!(provider.name(), kind.as_str());
            assert_eq!(provider.model(), kind.default_model());
        }
    }

    #[test]
    fn settings_debug_is_redacted() {
        let settings = ProviderSettings {
            kind: ProviderKind::Gemini,
            model: "gemini-2.0-flash".to_string(),
            api_base: "http://localhost".to_string(),
            api_key: SecretString::new("AIza-secret".to_string()),
        };
        assert!(!format!("{settings:?}").contains("AIza-secret"));
    }
}
