// src/config.rs
//! Startup configuration: per-provider credentials and tunables, loaded once
//! from the environment and passed explicitly into the router state. No
//! ambient lookups after startup.

use std::env;
use std::time::Duration;

use crate::error::OracleError;
use crate::provider::Provider;

// --- env names & defaults ---
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_XAI_API_KEY: &str = "XAI_API_KEY";
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";
/// Legacy fallback for the news key, kept for older deployments.
pub const ENV_API_KEY: &str = "API_KEY";

pub const ENV_HEADLINE_CACHE_TTL_SECS: &str = "HEADLINE_CACHE_TTL_SECS";
pub const ENV_HEADLINE_COUNTRY: &str = "HEADLINE_COUNTRY";

pub const DEFAULT_HEADLINE_CACHE_TTL: Duration = Duration::from_secs(60);

/// One credential per supported provider. All four must be present at startup
/// so the user is warned before picking anything from the dropdown.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub openai: String,
    pub xai: String,
    pub anthropic: String,
    pub google: String,
}

impl Credentials {
    pub fn for_provider(&self, provider: Provider) -> &str {
        match provider {
            Provider::OpenAiChat => &self.openai,
            Provider::XAi => &self.xai,
            Provider::Claude => &self.anthropic,
            Provider::Gemini => &self.google,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub news_api_key: String,
    pub headline_cache_ttl: Duration,
    /// Optional comma-joined ISO country codes for the news query.
    pub country: Option<String>,
}

impl AppConfig {
    /// Load all keys from the environment. Any missing variable is collected
    /// and reported in one error so the operator fixes everything at once.
    pub fn from_env() -> Result<Self, OracleError> {
        let mut missing = Vec::new();

        let openai = read_required(ENV_OPENAI_API_KEY, &mut missing);
        let xai = read_required(ENV_XAI_API_KEY, &mut missing);
        let anthropic = read_required(ENV_ANTHROPIC_API_KEY, &mut missing);
        let google = read_required(ENV_GOOGLE_API_KEY, &mut missing);

        // A blank primary still honors the legacy variable.
        let news_api_key = [ENV_NEWS_API_KEY, ENV_API_KEY]
            .into_iter()
            .find_map(|name| {
                env::var(name)
                    .ok()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
            .unwrap_or_else(|| {
                missing.push(ENV_NEWS_API_KEY);
                String::new()
            });

        if !missing.is_empty() {
            return Err(OracleError::Configuration {
                missing: missing.join(", "),
            });
        }

        Ok(Self {
            credentials: Credentials {
                openai,
                xai,
                anthropic,
                google,
            },
            news_api_key,
            headline_cache_ttl: cache_ttl_from_env(),
            country: env::var(ENV_HEADLINE_COUNTRY)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }
}

fn read_required(name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => {
            missing.push(name);
            String::new()
        }
    }
}

fn cache_ttl_from_env() -> Duration {
    env::var(ENV_HEADLINE_CACHE_TTL_SECS)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_HEADLINE_CACHE_TTL)
}
