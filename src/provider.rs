// src/provider.rs
//! Model Selector: a closed set of four LLM providers, static per-provider
//! model menus, and credential binding. Dispatch is an exhaustive match over
//! the enum, so there is no fifth silent branch.

use crate::config::Credentials;
use crate::error::OracleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAiChat,
    XAi,
    Claude,
    Gemini,
}

pub const ALL_PROVIDERS: [Provider; 4] = [
    Provider::OpenAiChat,
    Provider::XAi,
    Provider::Claude,
    Provider::Gemini,
];

impl Provider {
    /// Name as shown in the UI dropdown and accepted on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Provider::OpenAiChat => "OpenAIChat",
            Provider::XAi => "xAI",
            Provider::Claude => "Claude",
            Provider::Gemini => "Gemini",
        }
    }

    pub fn parse(name: &str) -> Result<Self, OracleError> {
        match name {
            "OpenAIChat" => Ok(Provider::OpenAiChat),
            "xAI" => Ok(Provider::XAi),
            "Claude" => Ok(Provider::Claude),
            "Gemini" => Ok(Provider::Gemini),
            other => Err(OracleError::UnsupportedProvider(other.to_string())),
        }
    }

    /// Static model menu per provider. Model ids are validated only by
    /// membership here.
    pub fn models(self) -> &'static [&'static str] {
        match self {
            Provider::OpenAiChat => &["gpt-4o", "gpt-4o-mini", "gpt-4.1-mini"],
            Provider::XAi => &["grok-2-latest", "grok-beta"],
            Provider::Claude => &["claude-3-5-sonnet-20241022", "claude-3-5-haiku-20241022"],
            Provider::Gemini => &["gemini-1.5-pro", "gemini-1.5-flash", "gemini-2.0-flash"],
        }
    }
}

/// A ready-to-invoke backend handle: provider + model id + that provider's
/// credential. Pure configuration resolution, nothing networked.
#[derive(Debug, Clone)]
pub struct Backend {
    pub provider: Provider,
    pub model: String,
    pub api_key: String,
}

impl Backend {
    pub fn resolve(
        provider_name: &str,
        model: &str,
        credentials: &Credentials,
    ) -> Result<Self, OracleError> {
        let provider = Provider::parse(provider_name)?;
        if !provider.models().contains(&model) {
            return Err(OracleError::UnknownModel {
                provider: provider.wire_name(),
                model: model.to_string(),
            });
        }
        let api_key = credentials.for_provider(provider);
        if api_key.trim().is_empty() {
            return Err(OracleError::MissingCredential(provider.wire_name()));
        }
        Ok(Self {
            provider,
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }
}
