use crate::domain::generation::{GenerateRequest, GenerateResponse};
use crate::domain::ports::{ConfigProvider, GenerativeModel};
use crate::utils::error::{AushadhError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Error bodies are logged and returned; cap them so a HTML error page does
/// not flood the terminal.
const MAX_ERROR_BODY: usize = 2048;

/// REST client for the `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_base: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_base: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn from_config(config: &impl ConfigProvider) -> Result<Self> {
        let api_key = config
            .api_key()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AushadhError::MissingConfigError {
                field: "api_key (set GEMINI_API_KEY)".to_string(),
            })?;
        Self::new(
            config.api_base(),
            api_key,
            Duration::from_secs(config.timeout_secs()),
        )
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, model: &str, request: &GenerateRequest) -> Result<GenerateResponse> {
        let url = self.endpoint(model);
        let parts: usize = request.contents.iter().map(|c| c.parts.len()).sum();
        tracing::debug!("Calling model {} ({} content parts)", model, parts);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Model response status: {}", status);

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            tracing::warn!("Model {} returned HTTP {}", model, status.as_u16());
            return Err(AushadhError::ModelHttpError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed)
    }
}
