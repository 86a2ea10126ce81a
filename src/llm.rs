use async_trait::async_trait;
use post_optimizer::config::AppConfig;
use post_optimizer::optimizer::TextGenerator;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct GenerationClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GenerationClient {
    pub fn from_config(config: &AppConfig) -> Result<Self, String> {
        let timeout = Duration::from_millis(config.generation.timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| format!("failed to build generation client: {}", err))?;
        let api_key = env::var("GENERATION_API_KEY")
            .ok()
            .filter(|value| !value.trim().is_empty());

        Ok(Self {
            client,
            endpoint: config.generation.endpoint.clone(),
            api_key,
        })
    }
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct GenerationResponse {
    response: String,
}

#[async_trait]
impl TextGenerator for GenerationClient {
    async fn generate(&self, prompt: &str) -> Result<String, String> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&GenerationRequest { prompt });
        if let Some(key) = &self.api_key {
            request = request.header(AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|err| format!("generation request failed: {}", err))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_else(|_| String::new());
            let detail = error_body.trim();
            tracing::warn!(%status, "generation endpoint returned an error");
            if detail.is_empty() {
                return Err(format!("generation API error: {}", status));
            }
            return Err(format!("generation API error: {} {}", status, detail));
        }

        let body: GenerationResponse = response
            .json()
            .await
            .map_err(|err| format!("generation response parse failed: {}", err))?;

        Ok(body.response)
    }
}
