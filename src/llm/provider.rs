//! Provider selection and backend construction.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use super::backend::ModelBackend;
use super::gemini::GeminiBackend;
use super::openai::OpenAiBackend;
use crate::error::{BackendError, ConfigError};

/// Supported model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Gemini,
    OpenAi,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.5-flash",
            Provider::OpenAi => "gpt-4o-mini",
        }
    }

    /// Environment variables checked for an API key, in order.
    pub fn api_key_env_vars(&self) -> &'static [&'static str] {
        match self {
            Provider::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            Provider::OpenAi => &["OPENAI_API_KEY"],
        }
    }

    /// First non-empty API key found in the environment.
    pub fn api_key_from_env(&self) -> Option<String> {
        self.api_key_env_vars()
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|key| !key.trim().is_empty())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAi),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// Everything needed to reach a provider.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl BackendSettings {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Build the HTTP backend for `provider`.
pub fn build_backend(
    provider: Provider,
    settings: &BackendSettings,
) -> Result<Box<dyn ModelBackend>, BackendError> {
    info!(
        "Using {} backend (timeout {} ms)",
        provider,
        settings.timeout.as_millis()
    );

    let backend: Box<dyn ModelBackend> = match provider {
        Provider::Gemini => {
            let backend = GeminiBackend::new(settings.api_key.clone(), settings.timeout)?;
            match &settings.base_url {
                Some(url) => Box::new(backend.with_base_url(url.clone())),
                None => Box::new(backend),
            }
        }
        Provider::OpenAi => {
            let backend = OpenAiBackend::new(settings.api_key.clone(), settings.timeout)?;
            match &settings.base_url {
                Some(url) => Box::new(backend.with_base_url(url.clone())),
                None => Box::new(backend),
            }
        }
    };

    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("gemini".parse::<Provider>(), Ok(Provider::Gemini));
        assert_eq!("Google".parse::<Provider>(), Ok(Provider::Gemini));
        assert_eq!(" OpenAI ".parse::<Provider>(), Ok(Provider::OpenAi));
        assert_eq!(
            "anthropic".parse::<Provider>(),
            Err(ConfigError::UnknownProvider("anthropic".to_string()))
        );
    }

    #[test]
    fn test_display_round_trips() {
        for provider in [Provider::Gemini, Provider::OpenAi] {
            assert_eq!(provider.to_string().parse::<Provider>(), Ok(provider));
        }
    }

    #[test]
    fn test_api_key_prefers_first_non_empty_var() {
        temp_env::with_vars(
            [
                ("GEMINI_API_KEY", Some("")),
                ("GOOGLE_API_KEY", Some("google-key")),
            ],
            || {
                assert_eq!(
                    Provider::Gemini.api_key_from_env().as_deref(),
                    Some("google-key")
                );
            },
        );
    }

    #[test]
    fn test_missing_api_key() {
        temp_env::with_var_unset("OPENAI_API_KEY", || {
            assert_eq!(Provider::OpenAi.api_key_from_env(), None);
        });
    }

    #[test]
    fn test_build_backend_requires_key() {
        let settings = BackendSettings::new("", Duration::from_secs(1));
        assert!(matches!(
            build_backend(Provider::OpenAi, &settings),
            Err(BackendError::Configuration(_))
        ));
    }

    #[test]
    fn test_build_backend_with_base_url() {
        let settings =
            BackendSettings::new("key", Duration::from_secs(1)).with_base_url("http://localhost:1");
        assert!(build_backend(Provider::Gemini, &settings).is_ok());
        assert!(build_backend(Provider::OpenAi, &settings).is_ok());
    }
}
