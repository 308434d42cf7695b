use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::{Args, ProviderKind};

pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderKind,
    pub model: String,
    /// Override for the provider endpoint (proxies, local mocks).
    pub api_base: Option<String>,
    /// Environment variable holding the API key; per-provider default when unset.
    pub api_key_env: Option<String>,
    pub timeout_secs: u64,
    /// Holds the profile database.
    pub data_dir: PathBuf,
    pub artifacts_dir: PathBuf,
    pub save_exchanges: bool,
    pub max_image_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: "gemini-2.0-flash".into(),
            api_base: None,
            api_key_env: None,
            timeout_secs: 120,
            data_dir: ".farmassist".into(),
            artifacts_dir: ".farmassist/out".into(),
            save_exchanges: false,
            max_image_bytes: MAX_IMAGE_BYTES,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file (if any), then `FARMASSIST_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => {
                let raw = fs::read_to_string(p)?;
                toml::from_str(&raw).with_context(|| format!("parse config {}", p.display()))?
            }
            None => Config::default(),
        };
        cfg.apply_env(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(p) = get("FARMASSIST_PROVIDER") {
            self.provider = toml::Value::String(p.to_lowercase())
                .try_into()
                .with_context(|| format!("FARMASSIST_PROVIDER: unknown provider {p:?}"))?;
        }
        if let Some(m) = get("FARMASSIST_MODEL") {
            self.model = m;
        }
        if let Some(b) = get("FARMASSIST_API_BASE") {
            self.api_base = Some(b);
        }
        if let Some(d) = get("FARMASSIST_DATA_DIR") {
            self.data_dir = d.into();
        }
        Ok(())
    }

    /// Command-line flags win over everything else.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(p) = args.provider {
            if p != self.provider && args.model.is_none() {
                self.model = default_model(p).into();
            }
            self.provider = p;
        }
        if let Some(m) = &args.model {
            self.model = m.clone();
        }
        if args.save_exchanges {
            self.save_exchanges = true;
        }
    }

    pub fn api_key_env(&self) -> String {
        self.api_key_env.clone().unwrap_or_else(|| {
            match self.provider {
                ProviderKind::Gemini => "GEMINI_API_KEY",
                ProviderKind::OpenAI => "OPENAI_API_KEY",
                ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
                ProviderKind::Ollama => "OLLAMA_API_KEY",
            }
            .to_string()
        })
    }

    pub fn api_base(&self) -> Option<String> {
        self.api_base.clone()
    }

    pub fn profile_db(&self) -> PathBuf {
        self.data_dir.join("farmassist.db")
    }
}

pub fn default_model(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Gemini => "gemini-2.0-flash",
        ProviderKind::OpenAI => "gpt-4.1-mini",
        ProviderKind::Anthropic => "claude-3-5-haiku-latest",
        ProviderKind::Ollama => "llama3.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    #[test]
    fn defaults_target_gemini() {
        let cfg = Config::default();
        assert_eq!(cfg.provider, ProviderKind::Gemini);
        assert_eq!(cfg.api_key_env(), "GEMINI_API_KEY");
        assert_eq!(cfg.max_image_bytes, 5_242_880);
    }

    #[test]
    fn toml_overlays_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("farmassist.toml");
        std::fs::write(&path, "provider = \"ollama\"\nmodel = \"mistral\"\ntimeout_secs = 30\n").unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.provider, ProviderKind::Ollama);
        assert_eq!(cfg.model, "mistral");
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.data_dir, PathBuf::from(".farmassist"));
    }

    #[test]
    fn env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FARMASSIST_PROVIDER", "Anthropic"),
            ("FARMASSIST_API_BASE", "http://127.0.0.1:9999"),
        ]
        .into_iter()
        .collect();
        let mut cfg = Config::default();
        cfg.apply_env(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.provider, ProviderKind::Anthropic);
        assert_eq!(cfg.api_base().as_deref(), Some("http://127.0.0.1:9999"));
    }

    #[test]
    fn bad_env_provider_is_rejected() {
        let mut cfg = Config::default();
        assert!(cfg.apply_env(|k| (k == "FARMASSIST_PROVIDER").then(|| "cohere".to_string())).is_err());
    }

    #[test]
    fn switching_provider_switches_default_model() {
        let args = Args::try_parse_from(["farmassist", "--provider", "openai", "suggest"]).unwrap();
        let mut cfg = Config::default();
        cfg.apply_args(&args);
        assert_eq!(cfg.model, "gpt-4.1-mini");
        assert_eq!(cfg.api_key_env(), "OPENAI_API_KEY");
    }
}
