// src/llm.rs
//! Text-generation backends: one HTTP implementation per provider family,
//! dispatched by exhaustive match over `Provider`, plus a deterministic mock
//! for tests and `AI_TEST_MODE=mock` runs.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::provider::{Backend, Provider};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(4);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_TOKENS: u32 = 700;
const TEMPERATURE: f32 = 0.2;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const XAI_BASE_URL: &str = "https://api.x.ai";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// One synchronous text-generation call per request.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynGenerator = Arc<dyn TextGenerator>;

/// Factory: mock under `AI_TEST_MODE=mock`, otherwise the real HTTP backend.
pub fn build_generator(backend: Backend) -> Result<DynGenerator> {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Ok(Arc::new(MockGenerator));
    }
    Ok(Arc::new(HttpGenerator::new(backend)?))
}

// ------------------------------------------------------------
// HTTP backend
// ------------------------------------------------------------

pub struct HttpGenerator {
    http: reqwest::Client,
    backend: Backend,
}

impl HttpGenerator {
    pub fn new(backend: Backend) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("headline-oracle/0.1")
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self { http, backend })
    }

    /// Chat Completions shape shared by OpenAI and xAI.
    async fn chat_openai_like(&self, base_url: &str, system: &str, user: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let req = Req {
            model: &self.backend.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system,
                },
                Msg {
                    role: "user",
                    content: user,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let resp = self
            .http
            .post(format!("{base_url}/v1/chat/completions"))
            .bearer_auth(&self.backend.api_key)
            .json(&req)
            .send()
            .await
            .context("chat completions request")?;
        if !resp.status().is_success() {
            bail!("chat completions returned status {}", resp.status());
        }
        let body: Resp = resp.json().await.context("chat completions body")?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.trim())
            .unwrap_or_default();
        if content.is_empty() {
            bail!("chat completions returned no content");
        }
        Ok(content.to_string())
    }

    async fn chat_anthropic(&self, system: &str, user: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct Resp {
            content: Vec<Block>,
        }
        #[derive(Deserialize)]
        struct Block {
            text: String,
        }

        let payload = serde_json::json!({
            "model": self.backend.model,
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "system": system,
            "messages": [{"role": "user", "content": user}],
        });

        let resp = self
            .http
            .post(format!("{ANTHROPIC_BASE_URL}/v1/messages"))
            .header("x-api-key", &self.backend.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&payload)
            .send()
            .await
            .context("anthropic messages request")?;
        if !resp.status().is_success() {
            bail!("anthropic messages returned status {}", resp.status());
        }
        let body: Resp = resp.json().await.context("anthropic messages body")?;
        let content = body
            .content
            .first()
            .map(|b| b.text.trim())
            .unwrap_or_default();
        if content.is_empty() {
            bail!("anthropic messages returned no content");
        }
        Ok(content.to_string())
    }

    async fn chat_gemini(&self, system: &str, user: &str) -> Result<String> {
        let endpoint = format!(
            "{GEMINI_BASE_URL}/models/{}:generateContent?key={}",
            self.backend.model, self.backend.api_key
        );
        // Gemini has no separate system role here; fold the instruction into
        // the single user turn.
        let payload = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": format!("{system}\n\n{user}")}]
            }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_TOKENS,
            }
        });

        let resp = self
            .http
            .post(endpoint)
            .json(&payload)
            .send()
            .await
            .context("gemini generateContent request")?;
        if !resp.status().is_success() {
            bail!("gemini generateContent returned status {}", resp.status());
        }
        let body: serde_json::Value = resp.json().await.context("gemini generateContent body")?;
        let content = body
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|cand| cand.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(|parts| parts.get(0))
            .and_then(|part| part.get("text"))
            .and_then(|text| text.as_str())
            .unwrap_or_default()
            .trim()
            .to_string();
        if content.is_empty() {
            bail!("gemini generateContent returned no content");
        }
        Ok(content)
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        match self.backend.provider {
            Provider::OpenAiChat => self.chat_openai_like(OPENAI_BASE_URL, system, user).await,
            Provider::XAi => self.chat_openai_like(XAI_BASE_URL, system, user).await,
            Provider::Claude => self.chat_anthropic(system, user).await,
            Provider::Gemini => self.chat_gemini(system, user).await,
        }
    }

    fn name(&self) -> &'static str {
        self.backend.provider.wire_name()
    }
}

// ------------------------------------------------------------
// Deterministic mock
// ------------------------------------------------------------

/// Echoes the headline back inside a fenced, schema-shaped JSON object. The
/// `date_pattern` is deliberately in the past so the forwarding rule gets
/// exercised end to end, and the fences exercise JSON extraction.
pub struct MockGenerator;

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, _system: &str, user: &str) -> Result<String> {
        let object = serde_json::json!({
            "headline": user,
            "question": format!("Will the outcome described in \"{user}\" be confirmed by the stated deadline?"),
            "date_pattern": "2024-01-01",
            "category": "Financials",
            "source": "Mock Wire",
            "options": [
                {"id": "A", "text": "Yes, fully confirmed"},
                {"id": "B", "text": "Partially confirmed"},
                {"id": "C", "text": "No, contradicted"},
                {"id": "D", "text": "No decision by the deadline"},
            ],
        });
        Ok(format!("```json\n{object}\n```"))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
