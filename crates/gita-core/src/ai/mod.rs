pub mod gemini;
pub mod ollama;
pub mod openai;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

use serde_json::Value;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::ExplainError;
use crate::explanation::{build_prompt, explanation_schema, parse_explanation, Explanation};
use crate::provider::Provider;

/// A configured connection to one generative-AI provider.
#[derive(Clone)]
pub enum Backend {
    Gemini(GeminiClient),
    OpenAI(OpenAIClient),
    Ollama(OllamaClient),
}

impl Backend {
    /// Build the backend for the configured provider, or `None` when its
    /// API key is missing.
    pub fn from_config(config: &Config) -> Option<Self> {
        match config.provider() {
            Provider::Gemini => config
                .gemini_api_key()
                .map(|key| Backend::Gemini(GeminiClient::new(&key))),
            Provider::OpenAI => config
                .openai_api_key()
                .map(|key| Backend::OpenAI(OpenAIClient::new(&key))),
            Provider::Ollama => Some(Backend::Ollama(OllamaClient::new(&config.ollama_url()))),
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            Backend::Gemini(_) => Provider::Gemini,
            Backend::OpenAI(_) => Provider::OpenAI,
            Backend::Ollama(_) => Provider::Ollama,
        }
    }

    pub async fn generate_json(
        &self,
        model: &str,
        prompt: &str,
        schema: &Value,
        temperature: f32,
    ) -> Result<String, ExplainError> {
        match self {
            Backend::Gemini(client) => client.generate_json(model, prompt, schema, temperature).await,
            Backend::OpenAI(client) => client.generate_json(model, prompt, schema, temperature).await,
            Backend::Ollama(client) => client.generate_json(model, prompt, schema, temperature).await,
        }
    }

    pub async fn list_models(&self) -> Result<Vec<String>, ExplainError> {
        match self {
            Backend::Gemini(_) => Ok(GeminiClient::list_models()),
            Backend::OpenAI(_) => Ok(OpenAIClient::list_models()),
            Backend::Ollama(client) => client.list_models().await,
        }
    }
}

/// Fetches verse explanations: one prompt, one attempt, no caching.
#[derive(Clone)]
pub struct ExplanationClient {
    provider: Provider,
    backend: Option<Backend>,
    model: String,
    temperature: f32,
}

impl ExplanationClient {
    pub fn new(backend: Backend, model: &str, temperature: f32) -> Self {
        Self {
            provider: backend.provider(),
            backend: Some(backend),
            model: model.to_string(),
            temperature,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            provider: config.provider(),
            backend: Backend::from_config(config),
            model: config.model(),
            temperature: config.temperature(),
        }
    }

    /// A client for `provider` with no backend; every fetch fails with
    /// `MissingCredential`.
    pub fn unconfigured(provider: Provider) -> Self {
        Self {
            provider,
            backend: None,
            model: provider.default_model().to_string(),
            temperature: crate::config::DEFAULT_TEMPERATURE,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub fn backend(&self) -> Option<&Backend> {
        self.backend.as_ref()
    }

    pub async fn fetch_explanation(
        &self,
        chapter: u8,
        verse: u16,
        language: &str,
    ) -> Result<Explanation, ExplainError> {
        let result = self.request(chapter, verse, language).await;
        if let Err(e) = &result {
            error!(
                kind = e.kind(),
                provider = self.provider.as_str(),
                chapter,
                verse,
                language,
                "explanation request failed: {}",
                e
            );
        }
        result
    }

    async fn request(&self, chapter: u8, verse: u16, language: &str) -> Result<Explanation, ExplainError> {
        let backend = self
            .backend
            .as_ref()
            .ok_or(ExplainError::MissingCredential(self.provider))?;

        let prompt = build_prompt(chapter, verse, language);
        let schema = explanation_schema();

        debug!(chapter, verse, language, model = %self.model, "requesting explanation");
        let text = backend
            .generate_json(&self.model, &prompt, &schema, self.temperature)
            .await?;
        parse_explanation(&text)
    }
}
