use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ExplainError;
use crate::provider::Provider;

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: Value,
    options: OllamaOptions,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Deserialize)]
struct OllamaModelsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Generate with `format` set to the schema so the model emits matching JSON.
    pub async fn generate_json(
        &self,
        model: &str,
        prompt: &str,
        schema: &Value,
        temperature: f32,
    ) -> Result<String, ExplainError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = build_request(model, prompt, schema, temperature);

        debug!(model, url = %url, "sending Ollama generate request");
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, "Ollama request failed. Make sure Ollama is running with: ollama serve");
            return Err(ExplainError::Status {
                provider: Provider::Ollama,
                status,
                body,
            });
        }

        let ollama_response: OllamaResponse = response.json().await?;
        if ollama_response.response.trim().is_empty() {
            return Err(ExplainError::EmptyContent);
        }
        Ok(ollama_response.response)
    }

    pub async fn list_models(&self) -> Result<Vec<String>, ExplainError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ExplainError::Status {
                provider: Provider::Ollama,
                status: response.status().as_u16(),
                body: String::new(),
            });
        }

        let models_response: OllamaModelsResponse = response.json().await?;
        Ok(models_response
            .models
            .into_iter()
            .map(|model| model.name)
            .collect())
    }
}

fn build_request(model: &str, prompt: &str, schema: &Value, temperature: f32) -> OllamaRequest {
    OllamaRequest {
        model: model.to_string(),
        prompt: prompt.to_string(),
        stream: false,
        format: schema.clone(),
        options: OllamaOptions { temperature },
    }
}
