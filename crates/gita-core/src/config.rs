use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::provider::Provider;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_SPEECH_COMMAND: &str = "espeak-ng";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub ollama_url: Option<String>,
    /// Speech synthesizer program, e.g. `espeak-ng`.
    pub speech_command: Option<String>,
    /// Program handed (file, title, text) when sharing a verse card.
    pub share_command: Option<String>,
    /// Font used for share cards; must cover Devanagari.
    pub font_path: Option<PathBuf>,
    /// Where share cards are saved when no share command is set.
    pub export_dir: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            provider: Some(Provider::Gemini.as_str().to_string()),
            ..Self::default()
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("gita-modern"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    pub fn log_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("gita.log"))
    }

    pub fn provider(&self) -> Provider {
        self.provider
            .as_deref()
            .and_then(Provider::from_str)
            .unwrap_or(Provider::Gemini)
    }

    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider().default_model().to_string())
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// Gemini key: `GEMINI_API_KEY`, then `API_KEY`, then the stored key.
    pub fn gemini_api_key(&self) -> Option<String> {
        env_key("GEMINI_API_KEY")
            .or_else(|| env_key("API_KEY"))
            .or_else(|| stored_key(&self.gemini_api_key))
    }

    pub fn openai_api_key(&self) -> Option<String> {
        env_key("OPENAI_API_KEY").or_else(|| stored_key(&self.openai_api_key))
    }

    pub fn ollama_url(&self) -> String {
        self.ollama_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
    }

    pub fn speech_command(&self) -> String {
        self.speech_command
            .clone()
            .unwrap_or_else(|| DEFAULT_SPEECH_COMMAND.to_string())
    }

    /// Share cards land here unless a share command takes them.
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Where the credential for `provider` comes from: `"env"`, `"config"`,
    /// `"local"` for providers without one, or `None` when it is missing.
    pub fn key_source(&self, provider: Provider) -> Option<&'static str> {
        let (env_names, stored): (&[&str], &Option<String>) = match provider {
            Provider::Gemini => (&["GEMINI_API_KEY", "API_KEY"], &self.gemini_api_key),
            Provider::OpenAI => (&["OPENAI_API_KEY"], &self.openai_api_key),
            Provider::Ollama => return Some("local"),
        };
        if env_names.iter().any(|name| env_key(name).is_some()) {
            Some("env")
        } else if stored_key(stored).is_some() {
            Some("config")
        } else {
            None
        }
    }

    /// Store an API key for a provider that needs one.
    pub fn set_api_key(&mut self, provider: Provider, key: &str) {
        let key = Some(key.trim().to_string());
        match provider {
            Provider::Gemini => self.gemini_api_key = key,
            Provider::OpenAI => self.openai_api_key = key,
            Provider::Ollama => {}
        }
    }

    /// Switch provider and drop a model that belonged to the previous one.
    pub fn set_provider(&mut self, provider: Provider) {
        if self.provider() != provider {
            self.model = None;
        }
        self.provider = Some(provider.as_str().to_string());
    }
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn stored_key(key: &Option<String>) -> Option<String> {
    key.clone().filter(|k| !k.trim().is_empty())
}
