use crate::core::extract::parse_model_json;
use crate::core::photo::PreparedImage;
use crate::core::sanitize::sanitize_analysis;
use crate::domain::model::AnalysisResult;
use crate::utils::error::{AushadhError, Result};
use crate::utils::validation::validate_url;
use reqwest::Client;
use std::time::Duration;

/// Analyzes through a running proxy instead of calling the model directly,
/// so no API key is needed on this side.
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    endpoint: String,
}

impl ProxyClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        validate_url("proxy_url", base_url)?;
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: format!("{}/api/process-prescription", base_url.trim_end_matches('/')),
        })
    }

    pub async fn analyze(&self, image: &PreparedImage) -> Result<AnalysisResult> {
        tracing::info!("Sending prescription to proxy {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "image": image.data_uri() }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!("Proxy returned HTTP {}", status.as_u16());
            return Err(AushadhError::ModelHttpError {
                status: status.as_u16(),
                body,
            });
        }

        let value = parse_model_json(&body)?;
        Ok(sanitize_analysis(&value))
    }
}
