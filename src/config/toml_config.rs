use crate::config::{ModelSettings, ServerSettings};
use crate::utils::error::{AushadhError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// `${VAR_NAME}` placeholders.
fn env_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub model: Option<ModelSection>,
    pub image: Option<ImageSection>,
    pub server: Option<ServerSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSection {
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub analysis: Option<String>,
    pub proxy: Option<String>,
    pub locator: Option<String>,
    pub speech: Option<String>,
    pub voice: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageSection {
    pub max_dimension: Option<u32>,
    pub quality: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub body_limit_mb: Option<usize>,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AushadhError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| AushadhError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Unset variables keep their `${NAME}` placeholder.
    fn substitute_env_vars(content: &str) -> String {
        env_placeholder()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// Model settings with every missing key taken from the built-in defaults.
    pub fn model_settings(&self) -> ModelSettings {
        let mut settings = ModelSettings::default();

        if let Some(model) = &self.model {
            if let Some(v) = &model.api_base {
                settings.api_base = v.clone();
            }
            // An unresolved placeholder means the variable was not exported.
            settings.api_key = model
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty() && !env_placeholder().is_match(k));
            if let Some(v) = &model.analysis {
                settings.analysis_model = v.clone();
            }
            if let Some(v) = &model.proxy {
                settings.proxy_model = v.clone();
            }
            if let Some(v) = &model.locator {
                settings.locator_model = v.clone();
            }
            if let Some(v) = &model.speech {
                settings.speech_model = v.clone();
            }
            if let Some(v) = &model.voice {
                settings.voice_name = v.clone();
            }
            if let Some(v) = model.timeout_seconds {
                settings.timeout_secs = v;
            }
        }

        if let Some(image) = &self.image {
            if let Some(v) = image.max_dimension {
                settings.max_dimension = v;
            }
            if let Some(v) = image.quality {
                settings.jpeg_quality = v;
            }
        }

        settings
    }

    pub fn server_settings(&self) -> ServerSettings {
        let mut settings = ServerSettings::default();

        if let Some(server) = &self.server {
            if let Some(v) = &server.host {
                settings.host = v.clone();
            }
            if let Some(v) = server.port {
                settings.port = v;
            }
            if let Some(v) = server.body_limit_mb {
                settings.set_body_limit_mb(v);
            }
            if let Some(v) = server.json_logs {
                settings.json_logs = v;
            }
        }

        settings
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.model_settings().validate()?;
        self.server_settings().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ConfigProvider;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[model]
api_base = "https://models.example.com"
api_key = "abc123"
analysis = "vision-large"
voice = "Puck"
timeout_seconds = 30

[image]
max_dimension = 1024
quality = 70

[server]
port = 8080
body_limit_mb = 4
json_logs = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let model = config.model_settings();
        let server = config.server_settings();

        assert_eq!(model.api_base(), "https://models.example.com");
        assert_eq!(model.api_key(), Some("abc123"));
        assert_eq!(model.analysis_model(), "vision-large");
        assert_eq!(model.locator_model(), crate::config::DEFAULT_LOCATOR_MODEL);
        assert_eq!(model.voice_name(), "Puck");
        assert_eq!(model.max_dimension(), 1024);
        assert_eq!(model.jpeg_quality(), 70);
        assert_eq!(server.port, 8080);
        assert_eq!(server.body_limit_bytes, 4 * 1024 * 1024);
        assert!(server.json_logs);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_huge_body_limit_does_not_overflow() {
        let config =
            TomlConfig::from_toml_str("[server]\nbody_limit_mb = 9223372036854775807\n").unwrap();
        assert_eq!(config.server_settings().body_limit_bytes, usize::MAX);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        let model = config.model_settings();
        assert_eq!(model.max_dimension(), 1280);
        assert_eq!(model.api_key(), None);
        assert_eq!(config.server_settings().port, 3000);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("AUSHADH_TEST_API_KEY", "from-env");

        let toml_content = r#"
[model]
api_key = "${AUSHADH_TEST_API_KEY}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.model_settings().api_key(), Some("from-env"));

        std::env::remove_var("AUSHADH_TEST_API_KEY");
    }

    #[test]
    fn test_unresolved_placeholder_is_treated_as_missing_key() {
        let toml_content = r#"
[model]
api_key = "${AUSHADH_TEST_UNSET_VARIABLE}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.model_settings().api_key(), None);
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[model]
api_base = "invalid-url"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[image]\nmax_dimension = 640\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.model_settings().max_dimension(), 640);
    }

    #[test]
    fn test_malformed_toml_is_a_config_error() {
        let err = TomlConfig::from_toml_str("[model\napi_base = 1").unwrap_err();
        assert!(matches!(err, AushadhError::ConfigValidationError { .. }));
    }
}
