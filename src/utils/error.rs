use thiserror::Error;

#[derive(Error, Debug)]
pub enum AushadhError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Base64 decoding error: {0}")]
    DecodeError(#[from] base64::DecodeError),

    #[error("Model returned HTTP {status}: {body}")]
    ModelHttpError { status: u16, body: String },

    #[error("Model returned no usable content")]
    EmptyResponse,

    #[error("Failed to parse model response as JSON: {message}")]
    ResponseParseError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Model,
    Parsing,
    Image,
    Configuration,
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AushadhError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AushadhError::ApiError(_) => ErrorCategory::Network,
            AushadhError::ModelHttpError { .. } | AushadhError::EmptyResponse => {
                ErrorCategory::Model
            }
            AushadhError::SerializationError(_) | AushadhError::ResponseParseError { .. } => {
                ErrorCategory::Parsing
            }
            AushadhError::ImageError(_) | AushadhError::DecodeError(_) => ErrorCategory::Image,
            AushadhError::MissingConfigError { .. }
            | AushadhError::InvalidConfigValueError { .. }
            | AushadhError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            AushadhError::ValidationError { .. } => ErrorCategory::Input,
            AushadhError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Model if self.is_rate_limited() => ErrorSeverity::Medium,
            ErrorCategory::Model | ErrorCategory::Parsing | ErrorCategory::Image => {
                ErrorSeverity::High
            }
            ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// True when the hosted model rejected the call for quota reasons (HTTP 429).
    pub fn is_rate_limited(&self) -> bool {
        match self {
            AushadhError::ModelHttpError { status, .. } => *status == 429,
            AushadhError::ApiError(e) => {
                e.status().map(|s| s.as_u16() == 429).unwrap_or(false)
            }
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        if self.is_rate_limited() {
            return "High traffic. Please wait a moment.".to_string();
        }
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Model | ErrorCategory::Parsing => {
                "We couldn't clearly read the medicines. Please try a clearer photo.".to_string()
            }
            ErrorCategory::Image => {
                "The selected file could not be read as an image.".to_string()
            }
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => self.to_string(),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        if self.is_rate_limited() {
            return "Wait a few seconds and run the command again";
        }
        match self.category() {
            ErrorCategory::Network => "Check your network connection and the API base URL",
            ErrorCategory::Model | ErrorCategory::Parsing => {
                "Retake the photo in good light with the whole prescription in frame"
            }
            ErrorCategory::Image => "Use a JPEG, PNG or WebP photo of the prescription",
            ErrorCategory::Configuration => {
                "Check the command-line flags, the TOML file and GEMINI_API_KEY"
            }
            ErrorCategory::Input => "Check the command arguments",
            ErrorCategory::System => "Check file paths and permissions",
        }
    }
}

pub type Result<T> = std::result::Result<T, AushadhError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_maps_to_high_traffic_message() {
        let err = AushadhError::ModelHttpError {
            status: 429,
            body: "RESOURCE_EXHAUSTED".to_string(),
        };
        assert!(err.is_rate_limited());
        assert_eq!(err.user_friendly_message(), "High traffic. Please wait a moment.");
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_other_model_failures_ask_for_clearer_photo() {
        let errors = vec![
            AushadhError::ModelHttpError {
                status: 500,
                body: String::new(),
            },
            AushadhError::EmptyResponse,
            AushadhError::ResponseParseError {
                message: "no JSON object".to_string(),
            },
        ];

        for err in errors {
            assert!(!err.is_rate_limited());
            assert_eq!(
                err.user_friendly_message(),
                "We couldn't clearly read the medicines. Please try a clearer photo."
            );
        }
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = AushadhError::MissingConfigError {
            field: "api_key".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
