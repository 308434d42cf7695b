use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{read_body, Provider};

pub const DEFAULT_BASE: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini `generateContent`.
pub struct Gemini {
    model: String,
    api_key: String,
    api_base: String,
    client: Client,
}

impl Gemini {
    pub fn new(model: String, api_key: String, api_base: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            model,
            api_key,
            api_base: api_base.unwrap_or_else(|| DEFAULT_BASE.to_string()),
            client: super::http_client(timeout)?,
        })
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Deserialize)]
struct PartOut {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl Provider for Gemini {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        );
        let body = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: prompt }] }],
        };

        tracing::debug!(%url, prompt_bytes = prompt.len(), "gemini: POST");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("gemini request failed")?;

        let text = read_body("gemini", resp).await?;
        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("gemini response parse error: {e}"))?;

        let reply: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if reply.is_empty() {
            return Err(anyhow!("gemini: empty content"));
        }
        Ok(reply)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
