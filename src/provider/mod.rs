use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::cli::ProviderKind;
use crate::config::Config;

pub mod anthropic;
pub mod gemini;
pub mod ollama;
pub mod openai;

/// One outbound text-generation call. No retries; failures go straight back
/// to the caller, which decides how to recover.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    fn name(&self) -> &'static str;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("build HTTP client")
}

fn api_key(cfg: &Config) -> Result<String> {
    let var = cfg.api_key_env();
    std::env::var(&var).map_err(|_| anyhow!("{var} env var is not set"))
}

pub fn make_provider(cfg: &Config) -> Result<DynProvider> {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    let base = cfg.api_base();
    let model = cfg.model.clone();

    let provider: DynProvider = match cfg.provider {
        ProviderKind::Gemini => Box::new(gemini::Gemini::new(model, api_key(cfg)?, base, timeout)?),
        ProviderKind::OpenAI => Box::new(openai::OpenAIProvider::new(model, api_key(cfg)?, base, timeout)?),
        ProviderKind::Anthropic => Box::new(anthropic::Anthropic::new(model, api_key(cfg)?, base, timeout)?),
        ProviderKind::Ollama => Box::new(ollama::Ollama::new(model, base, timeout)?),
    };
    Ok(provider)
}

/// Shared tail of every adapter: bail on non-2xx with the body attached.
pub(crate) async fn read_body(provider: &str, resp: reqwest::Response) -> Result<String> {
    let status = resp.status();
    let text = resp
        .text()
        .await
        .with_context(|| format!("{provider} read body failed"))?;
    tracing::debug!(provider, %status, body = %text, "provider response");
    if !status.is_success() {
        return Err(anyhow!("{provider} API error ({status}): {text}"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_needs_no_key() {
        let cfg = Config { provider: ProviderKind::Ollama, ..Config::default() };
        assert_eq!(make_provider(&cfg).unwrap().name(), "ollama");
    }

    #[test]
    fn missing_key_is_reported_by_name() {
        let cfg = Config {
            api_key_env: Some("FARMASSIST_TEST_KEY_THAT_IS_NEVER_SET".into()),
            ..Config::default()
        };
        let err = make_provider(&cfg).err().expect("missing key must fail");
        assert!(err.to_string().contains("FARMASSIST_TEST_KEY_THAT_IS_NEVER_SET"));
    }
}
