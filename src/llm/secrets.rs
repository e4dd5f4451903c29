use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dialoguer::{Password, theme::ColorfulTheme};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::provider::ProviderKind;
use crate::utils::{get_data_dir, strip_controls_and_escapes, trim_line};

const AUTH_FILE_NAME: &str = "auth.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    Environment,
    AuthFile,
}

impl ApiKeySource {
    pub fn description(&self) -> &'static str {
        match self {
            ApiKeySource::Environment => "environment variable",
            ApiKeySource::AuthFile => "local auth file",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct AuthFile {
    #[serde(flatten)]
    providers: HashMap<String, ProviderAuth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProviderAuth {
    key: String,
}

/// A resolved credential. `Debug` on the key is redacted by `secrecy`.
#[derive(Debug)]
pub struct ApiKeyLookup {
    pub api_key: SecretString,
    pub source: ApiKeySource,
}

pub fn prompt_for_api_key(provider: ProviderKind) -> Result<String> {
    println!(
        "Enter your {provider} API key. It is stored in {} for future use.",
        auth_file_path()?.display()
    );
    let raw_password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API Key")
        .allow_empty_password(true)
        .interact()
        .context("Failed to read API key from the terminal")?;

    let password = strip_controls_and_escapes(&raw_password);
    Ok(password.trim().to_string())
}

pub fn store_api_key(provider: ProviderKind, api_key: &str) -> Result<()> {
    store_api_key_at(&auth_file_path()?, provider, api_key)
}

pub fn clear_api_key(provider: ProviderKind) -> Result<bool> {
    clear_api_key_at(&auth_file_path()?, provider)
}

/// Resolves the credential for `provider`: the provider's environment
/// variable first, then the local auth file.
pub fn get_api_key_from_sources(provider: ProviderKind) -> Result<Option<ApiKeyLookup>> {
    let from_env = env::var(provider.api_key_env()).ok();
    lookup_api_key(provider, from_env, &auth_file_path()?)
}

fn lookup_api_key(
    provider: ProviderKind,
    from_env: Option<String>,
    auth_path: &Path,
) -> Result<Option<ApiKeyLookup>> {
    if let Some(value) = from_env
        && let Some(key) = trim_line(&value)
    {
        return Ok(Some(ApiKeyLookup {
            api_key: SecretString::new(key.to_string()),
            source: ApiKeySource::Environment,
        }));
    }

    let Some(auth) = read_auth_file(auth_path)? else {
        return Ok(None);
    };

    let key = auth
        .providers
        .get(provider.as_str())
        .and_then(|entry| trim_line(&entry.key))
        .map(|key| ApiKeyLookup {
            api_key: SecretString::new(key.to_string()),
            source: ApiKeySource::AuthFile,
        });

    Ok(key)
}

fn store_api_key_at(auth_path: &Path, provider: ProviderKind, api_key: &str) -> Result<()> {
    let trimmed = trim_line(api_key).with_context(|| "Cannot store an empty API key")?;

    let mut auth = read_auth_file(auth_path)?.unwrap_or_default();
    auth.providers.insert(
        provider.as_str().to_string(),
        ProviderAuth {
            key: trimmed.to_string(),
        },
    );

    write_auth_file(auth_path, &auth)
}

fn clear_api_key_at(auth_path: &Path, provider: ProviderKind) -> Result<bool> {
    let Some(mut auth) = read_auth_file(auth_path)? else {
        return Ok(false);
    };

    if auth.providers.remove(provider.as_str()).is_none() {
        return Ok(false);
    }

    if auth.providers.is_empty() {
        fs::remove_file(auth_path).with_context(|| {
            format!(
                "Failed to remove empty auth file at {}",
                auth_path.display()
            )
        })?;
        return Ok(true);
    }

    write_auth_file(auth_path, &auth)?;
    Ok(true)
}

fn auth_file_path() -> Result<PathBuf> {
    let data_dir = get_data_dir()?;
    Ok(data_dir.join(AUTH_FILE_NAME))
}

fn read_auth_file(path: &Path) -> Result<Option<AuthFile>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(parse_auth_contents(&contents, path)?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => {
            Err(err).with_context(|| format!("Failed to read auth file at {}", path.display()))
        }
    }
}

fn write_auth_file(path: &Path, value: &AuthFile) -> Result<()> {
    let contents = serialize_auth(value)?;
    fs::write(path, contents)
        .with_context(|| format!("Failed to write auth file at {}", path.display()))?;
    Ok(())
}

fn parse_auth_contents(contents: &str, path: &Path) -> Result<Option<AuthFile>> {
    if contents.trim().is_empty() {
        return Ok(Some(AuthFile::default()));
    }

    let parsed: AuthFile = serde_json::from_str(contents)
        .with_context(|| format!("Failed to parse auth file at {}", path.display()))?;
    Ok(Some(parsed))
}

fn serialize_auth(value: &AuthFile) -> Result<String> {
    let contents = serde_json::to_string_pretty(value)?;
    Ok(format!("{}\n", contents))
}
