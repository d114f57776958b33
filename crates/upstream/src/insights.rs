//! Natural-language insights from a text-generation API.
//!
//! [`GeminiInsightGenerator`] calls the configured endpoint with bearer auth.
//! [`StaticInsightGenerator`] returns a fixed set of bullets and is used when
//! no API key is configured. Neither ever fails: the network-backed
//! generator maps every error to a fallback set.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hoops_core::{InsightGame, InsightGenerator, InsightsConfig, PlayerId};
use reqwest::{Certificate, Client};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::InsightError;

/// At most this many bullets are returned.
pub const MAX_BULLETS: usize = 6;

const PROMPT_INSTRUCTION: &str = "Summarize the player's recent performance and expected next game in 4 short bullet points. Focus on form, consistency, minutes, and scoring trend.";

/// Fixed bullet sets served instead of generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackInsights {
    NoApiKey,
    /// TLS verification failed although a CA bundle was configured.
    TlsWithCaBundle,
    TlsWithoutCaBundle,
    Unavailable,
}

impl FallbackInsights {
    #[must_use]
    pub fn bullets(self) -> Vec<String> {
        let lines: [&str; 2] = match self {
            Self::NoApiKey => [
                "AI insights not available (no API key).",
                "Use recent game averages and trends for quick checks.",
            ],
            Self::TlsWithCaBundle => [
                "AI insights unavailable due to SSL verification error.",
                "Check GEMINI_CA_BUNDLE/REQUESTS_CA_BUNDLE points to a valid PEM with the proxy CA.",
            ],
            Self::TlsWithoutCaBundle => [
                "AI insights unavailable due to SSL verification error.",
                "Set GEMINI_CA_BUNDLE (path to PEM) or add your proxy CA to the OS trust store for a permanent fix.",
            ],
            Self::Unavailable => [
                "AI insights temporarily unavailable.",
                "Fallback: look at recent average points and minutes for quick context.",
            ],
        };
        lines.iter().map(ToString::to_string).collect()
    }
}

/// Always answers with the same fallback bullets.
#[derive(Debug, Clone)]
pub struct StaticInsightGenerator {
    kind: FallbackInsights,
}

impl StaticInsightGenerator {
    #[must_use]
    pub const fn new(kind: FallbackInsights) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl InsightGenerator for StaticInsightGenerator {
    async fn generate(&self, _prompt: &str) -> Vec<String> {
        self.kind.bullets()
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    prompt: &'a str,
    max_output_tokens: u32,
    temperature: f64,
}

/// Network-backed generator.
#[derive(Debug, Clone)]
pub struct GeminiInsightGenerator {
    http: Client,
    api_url: String,
    api_key: String,
    has_ca_bundle: bool,
    root_certs: Vec<Certificate>,
    max_output_tokens: u32,
    temperature: f64,
}

impl GeminiInsightGenerator {
    /// Builds the generator, trusting the configured CA bundle in addition to
    /// the built-in roots.
    ///
    /// # Errors
    /// Returns `Tls` if the CA bundle cannot be read or parsed.
    pub fn new(config: &InsightsConfig, api_key: impl Into<String>) -> Result<Self, InsightError> {
        let root_certs = match config.ca_bundle.as_deref() {
            Some(path) => {
                let pem = fs::read(path).map_err(|e| {
                    InsightError::Tls(format!("cannot read CA bundle {path}: {e}"))
                })?;
                Certificate::from_pem_bundle(&pem)
                    .map_err(|e| InsightError::Tls(format!("invalid CA bundle {path}: {e}")))?
            }
            None => Vec::new(),
        };
        let http = build_client(Duration::from_secs(config.timeout_secs), &root_certs)?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: api_key.into(),
            has_ca_bundle: config.ca_bundle.is_some(),
            root_certs,
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
        })
    }

    /// Replaces the request timeout, keeping the trusted CA bundle.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be rebuilt.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, InsightError> {
        self.http = build_client(timeout, &self.root_certs)?;
        Ok(self)
    }

    /// Extra roots trusted on top of the built-in ones.
    #[must_use]
    pub fn root_certificate_count(&self) -> usize {
        self.root_certs.len()
    }

    async fn request(&self, prompt: &str) -> Result<Vec<String>, InsightError> {
        debug!(url = %self.api_url, "Calling insight API");
        let body = GenerateRequest {
            prompt,
            max_output_tokens: self.max_output_tokens,
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(InsightError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let data: Value = response.json().await?;
        let text = extract_text(&data).ok_or(InsightError::EmptyResponse)?;
        Ok(split_bullets(&text))
    }

    fn fallback_for(&self, error: &InsightError) -> FallbackInsights {
        match error {
            InsightError::Tls(_) if self.has_ca_bundle => FallbackInsights::TlsWithCaBundle,
            InsightError::Tls(_) => FallbackInsights::TlsWithoutCaBundle,
            _ => FallbackInsights::Unavailable,
        }
    }
}

fn build_client(timeout: Duration, root_certs: &[Certificate]) -> Result<Client, InsightError> {
    root_certs
        .iter()
        .cloned()
        .fold(Client::builder().timeout(timeout), |builder, cert| {
            builder.add_root_certificate(cert)
        })
        .build()
        .map_err(|e| InsightError::Network(e.to_string()))
}

#[async_trait]
impl InsightGenerator for GeminiInsightGenerator {
    async fn generate(&self, prompt: &str) -> Vec<String> {
        match self.request(prompt).await {
            Ok(bullets) => bullets,
            Err(e) => {
                warn!(error = %e, "Insight generation failed; serving fallback insights");
                self.fallback_for(&e).bullets()
            }
        }
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Picks the generator for the configuration: network-backed when an API
/// key is present, static otherwise.
#[must_use]
pub fn insight_generator_from_config(config: &InsightsConfig) -> Arc<dyn InsightGenerator> {
    let Some(api_key) = config.api_key() else {
        info!("No insight API key configured; using static insights");
        return Arc::new(StaticInsightGenerator::new(FallbackInsights::NoApiKey));
    };

    match GeminiInsightGenerator::new(config, api_key) {
        Ok(generator) => {
            info!(url = %config.api_url, ca_bundle = config.ca_bundle.is_some(), "Insight API enabled");
            Arc::new(generator)
        }
        Err(e) => {
            warn!(error = %e, "Insight API client could not be built; using static insights");
            Arc::new(StaticInsightGenerator::new(FallbackInsights::TlsWithCaBundle))
        }
    }
}

/// Prompt listing the prediction and recent games, one line per game.
#[must_use]
pub fn build_prompt(player_id: PlayerId, predicted_points: Option<f64>, games: &[InsightGame]) -> String {
    let mut lines = vec![
        format!("Player ID: {player_id}"),
        format!("Predicted points: {}", display_or_na(predicted_points)),
        "Recent games:".to_string(),
    ];
    for game in games {
        lines.push(format!(
            "{}: {} pts, {} min, FG% {}",
            game.date.as_deref().unwrap_or("n/a"),
            display_or_na(game.pts),
            display_or_na(game.min),
            display_or_na(game.fg_pct),
        ));
    }
    lines.push(PROMPT_INSTRUCTION.to_string());
    lines.join("\n")
}

/// Builds the prompt and asks the generator. Never fails.
pub async fn generate_insights(
    generator: &dyn InsightGenerator,
    player_id: PlayerId,
    predicted_points: Option<f64>,
    games: &[InsightGame],
) -> Vec<String> {
    let prompt = build_prompt(player_id, predicted_points, games);
    let bullets = generator.generate(&prompt).await;
    info!(player_id, generator = generator.name(), bullets = bullets.len(), "Generated insights");
    bullets
}

/// Pulls the generated text out of the response shapes the API has used.
fn extract_text(data: &Value) -> Option<String> {
    let from_candidates = data
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
        .and_then(|c| c.get("content").or_else(|| c.get("output")))
        .and_then(content_text);

    let from_output = || {
        let first = data.get("output")?.as_array()?.first()?;
        let parts: Vec<&str> = first
            .get("content")?
            .as_array()?
            .iter()
            .filter_map(|c| {
                c.get("text")
                    .or_else(|| c.get("span").and_then(|s| s.get("text")))
                    .and_then(Value::as_str)
            })
            .collect();
        Some(parts.join("\n"))
    };

    from_candidates
        .filter(|t| !t.is_empty())
        .or_else(|| from_output().filter(|t| !t.is_empty()))
        .or_else(|| data.get("text").and_then(Value::as_str).map(str::to_string))
        .filter(|t| !t.is_empty())
}

/// A candidate's content is either a plain string or `{parts: [{text}]}`.
fn content_text(content: &Value) -> Option<String> {
    if let Some(s) = content.as_str() {
        return Some(s.to_string());
    }
    let parts: Vec<&str> = content
        .get("parts")?
        .as_array()?
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    Some(parts.join("\n"))
}

/// Non-empty lines trimmed of bullet markers, at most [`MAX_BULLETS`].
fn split_bullets(text: &str) -> Vec<String> {
    let bullets: Vec<String> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.trim_matches(|c| matches!(c, ' ' | '-' | '•' | '\t')).to_string())
        .take(MAX_BULLETS)
        .collect();
    if bullets.is_empty() {
        vec![text.to_string()]
    } else {
        bullets
    }
}

fn display_or_na(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}
