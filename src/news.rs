// src/news.rs
//! Headline Source: one GET against the newsdata.io "latest" endpoint, title
//! cleanup, and a single-slot TTL cache so UI refreshes do not hammer the
//! service. A failed fetch degrades to an empty string, never an error.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::error::OracleError;

const LATEST_URL: &str = "https://newsdata.io/api/1/latest";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(4);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One-time metrics registration (so series show up for scrapers).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("headline_fetch_total", "Headline fetch attempts.");
        describe_counter!(
            "headline_fetch_errors_total",
            "Headline fetches that degraded to an empty result."
        );
        describe_counter!(
            "headline_cache_hits_total",
            "Headline reads served from the TTL cache."
        );
    });
}

/// Anonymized id for log lines; raw headline text is never logged.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Produces one current headline. Empty string means "no headline available";
/// implementations must not raise for transport or parse failures.
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn latest_headline(&self) -> String;
    fn name(&self) -> &'static str;
}

// ------------------------------------------------------------
// newsdata.io client
// ------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default)]
    results: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
}

pub struct NewsdataSource {
    http: reqwest::Client,
    api_key: String,
    country: Option<String>,
}

impl NewsdataSource {
    pub fn new(api_key: &str, country: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("headline-oracle/0.1")
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            country,
        })
    }

    async fn fetch_latest(&self) -> Result<String, OracleError> {
        let mut req = self.http.get(LATEST_URL).query(&[
            ("apikey", self.api_key.as_str()),
            ("language", "en"),
            ("removeduplicate", "1"),
        ]);
        if let Some(country) = &self.country {
            req = req.query(&[("country", country.as_str())]);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| OracleError::ExternalService(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(OracleError::ExternalService(format!(
                "newsdata.io returned status {}",
                resp.status()
            )));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| OracleError::ExternalService(e.to_string()))?;
        parse_latest_title(&body)
    }
}

#[async_trait]
impl HeadlineSource for NewsdataSource {
    async fn latest_headline(&self) -> String {
        ensure_metrics_described();
        counter!("headline_fetch_total").increment(1);
        match self.fetch_latest().await {
            Ok(title) => {
                if !title.is_empty() {
                    tracing::debug!(id = %anon_hash(&title), source = self.name(), "headline fetched");
                }
                title
            }
            Err(e) => {
                tracing::warn!(error = %e, source = self.name(), "headline fetch failed");
                counter!("headline_fetch_errors_total").increment(1);
                String::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "newsdata.io"
    }
}

/// Parse the `results` array and keep only the first title, cleaned.
fn parse_latest_title(body: &str) -> Result<String, OracleError> {
    let parsed: LatestResponse =
        serde_json::from_str(body).map_err(|e| OracleError::ExternalService(e.to_string()))?;
    Ok(parsed
        .results
        .first()
        .and_then(|a| a.title.as_deref())
        .map(clean_headline)
        .unwrap_or_default())
}

// ------------------------------------------------------------
// Title cleanup
// ------------------------------------------------------------

/// Normalize a raw title: decode HTML entities, collapse whitespace, strip a
/// trailing source attribution like " - Reuters" or " | BBC News".
pub fn clean_headline(raw: &str) -> String {
    let mut out = html_escape::decode_html_entities(raw).to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    static RE_SOURCE: OnceCell<regex::Regex> = OnceCell::new();
    let re_source = RE_SOURCE
        .get_or_init(|| regex::Regex::new(r"\s+[-\u{2013}\u{2014}|]\s+[A-Z][^-|]{1,40}$").unwrap());
    re_source.replace(&out, "").trim().to_string()
}

// ------------------------------------------------------------
// Fixture source (tests and offline runs)
// ------------------------------------------------------------

enum FixtureMode {
    Body(String),
    Failing,
}

/// Serves canned newsdata.io JSON through the same parse path as the real
/// client, or simulates a transport failure.
pub struct FixtureSource {
    mode: FixtureMode,
}

impl FixtureSource {
    pub fn from_json(body: &str) -> Self {
        Self {
            mode: FixtureMode::Body(body.to_string()),
        }
    }

    pub fn empty() -> Self {
        Self::from_json(r#"{"results":[]}"#)
    }

    pub fn failing() -> Self {
        Self {
            mode: FixtureMode::Failing,
        }
    }
}

#[async_trait]
impl HeadlineSource for FixtureSource {
    async fn latest_headline(&self) -> String {
        ensure_metrics_described();
        counter!("headline_fetch_total").increment(1);
        let result = match &self.mode {
            FixtureMode::Body(body) => parse_latest_title(body),
            FixtureMode::Failing => Err(OracleError::ExternalService(
                "simulated transport failure".to_string(),
            )),
        };
        match result {
            Ok(title) => title,
            Err(e) => {
                tracing::warn!(error = %e, source = self.name(), "headline fetch failed");
                counter!("headline_fetch_errors_total").increment(1);
                String::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

// ------------------------------------------------------------
// Single-slot TTL cache
// ------------------------------------------------------------

/// One global "latest headline" slot: {value, fetched_at} with a fixed TTL.
/// The read path checks staleness and refetches; staleness is the only
/// invalidation rule, there is no manual eviction.
pub struct CachedHeadline {
    inner: Arc<dyn HeadlineSource>,
    ttl: Duration,
    slot: Mutex<Option<(String, Instant)>>,
}

impl CachedHeadline {
    pub fn new(inner: Arc<dyn HeadlineSource>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Returns (headline, cache_hit). An empty fetch result is not cached so
    /// the next read retries the service.
    pub async fn get(&self) -> (String, bool) {
        {
            let slot = self.slot.lock().expect("headline cache lock poisoned");
            if let Some((value, fetched_at)) = slot.as_ref() {
                if fetched_at.elapsed() < self.ttl {
                    counter!("headline_cache_hits_total").increment(1);
                    return (value.clone(), true);
                }
            }
        }

        let fresh = self.inner.latest_headline().await;
        if !fresh.is_empty() {
            let mut slot = self.slot.lock().expect("headline cache lock poisoned");
            *slot = Some((fresh.clone(), Instant::now()));
        }
        (fresh, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_headline_strips_trailing_attribution() {
        assert_eq!(
            clean_headline("Fed hints at June rate pause - Reuters"),
            "Fed hints at June rate pause"
        );
        assert_eq!(
            clean_headline("Markets rally on jobs data | BBC News"),
            "Markets rally on jobs data"
        );
    }

    #[test]
    fn clean_headline_keeps_inline_dashes() {
        assert_eq!(
            clean_headline("US-China talks resume in Geneva"),
            "US-China talks resume in Geneva"
        );
    }

    #[test]
    fn clean_headline_decodes_entities_and_collapses_ws() {
        assert_eq!(
            clean_headline("Oil&nbsp;&nbsp;prices  jump &amp; settle higher"),
            "Oil prices jump & settle higher"
        );
    }

    #[test]
    fn parse_latest_title_takes_first_result_only() {
        let body = r#"{"status":"success","results":[
            {"title":"First headline - AP News"},
            {"title":"Second headline"}
        ]}"#;
        assert_eq!(parse_latest_title(body).unwrap(), "First headline");
    }

    #[test]
    fn parse_latest_title_handles_missing_fields() {
        assert_eq!(parse_latest_title(r#"{"results":[]}"#).unwrap(), "");
        assert_eq!(parse_latest_title(r#"{"results":[{}]}"#).unwrap(), "");
        assert!(parse_latest_title("not json").is_err());
    }
}
