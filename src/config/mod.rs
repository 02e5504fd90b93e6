#[cfg(feature = "clap")]
pub mod cli;
pub mod storage;
pub mod toml_config;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_PROXY_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_LOCATOR_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VOICE: &str = "Kore";
pub const DEFAULT_MAX_DIMENSION: u32 = 1280;
pub const DEFAULT_JPEG_QUALITY: u8 = 80;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Everything needed to talk to the hosted model and prepare images for it.
#[derive(Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    pub api_base: String,
    pub api_key: Option<String>,
    pub analysis_model: String,
    pub proxy_model: String,
    pub locator_model: String,
    pub speech_model: String,
    pub voice_name: String,
    pub max_dimension: u32,
    pub jpeg_quality: u8,
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            proxy_model: DEFAULT_PROXY_MODEL.to_string(),
            locator_model: DEFAULT_LOCATOR_MODEL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            voice_name: DEFAULT_VOICE.to_string(),
            max_dimension: DEFAULT_MAX_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// Hand-written so the API key never reaches the logs.
impl fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSettings")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("analysis_model", &self.analysis_model)
            .field("proxy_model", &self.proxy_model)
            .field("locator_model", &self.locator_model)
            .field("speech_model", &self.speech_model)
            .field("voice_name", &self.voice_name)
            .field("max_dimension", &self.max_dimension)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ConfigProvider for ModelSettings {
    fn api_base(&self) -> &str {
        &self.api_base
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn analysis_model(&self) -> &str {
        &self.analysis_model
    }

    fn proxy_model(&self) -> &str {
        &self.proxy_model
    }

    fn locator_model(&self) -> &str {
        &self.locator_model
    }

    fn speech_model(&self) -> &str {
        &self.speech_model
    }

    fn voice_name(&self) -> &str {
        &self.voice_name
    }

    fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}

impl Validate for ModelSettings {
    fn validate(&self) -> Result<()> {
        validate_url("model.api_base", &self.api_base)?;
        validate_non_empty_string("model.analysis", &self.analysis_model)?;
        validate_non_empty_string("model.proxy", &self.proxy_model)?;
        validate_non_empty_string("model.locator", &self.locator_model)?;
        validate_non_empty_string("model.speech", &self.speech_model)?;
        validate_non_empty_string("model.voice", &self.voice_name)?;
        validate_positive_number("image.max_dimension", self.max_dimension as u64, 1)?;
        validate_range("image.quality", self.jpeg_quality, 1, 100)?;
        validate_positive_number("model.timeout_seconds", self.timeout_secs, 1)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub body_limit_bytes: usize,
    pub json_logs: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            json_logs: false,
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Saturates instead of overflowing on absurd values.
    pub fn set_body_limit_mb(&mut self, mb: usize) {
        self.body_limit_bytes = mb.saturating_mul(1024 * 1024);
    }
}

impl Validate for ServerSettings {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.host)?;
        validate_positive_number("server.body_limit_mb", self.body_limit_bytes as u64, 1)?;
        Ok(())
    }
}
