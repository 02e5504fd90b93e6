use crate::config::toml_config::TomlConfig;
use crate::config::ModelSettings;
use crate::domain::model::Language;
use crate::utils::error::{AushadhError, Result};
use crate::utils::validation::{validate_coordinates, Validate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// Model connection flags shared by both binaries. Unset flags fall back to
/// the TOML file given with `--config`, then to the built-in defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct ModelArgs {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, env = "GEMINI_API_BASE")]
    pub api_base: Option<String>,

    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used for prescription analysis
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[arg(long, global = true)]
    pub locator_model: Option<String>,

    #[arg(long, global = true)]
    pub speech_model: Option<String>,

    #[arg(long, global = true)]
    pub voice: Option<String>,

    /// Longest image side sent to the model, in pixels
    #[arg(long, global = true)]
    pub max_dimension: Option<u32>,

    /// JPEG quality (1-100)
    #[arg(long, global = true)]
    pub quality: Option<u8>,

    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

impl ModelArgs {
    /// Loads the TOML base (if any), applies flag overrides and validates.
    pub fn resolve(&self) -> Result<ModelSettings> {
        let mut settings = self.base_config()?.model_settings();

        if let Some(v) = &self.api_base {
            settings.api_base = v.clone();
        }
        if let Some(v) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            settings.api_key = Some(v.clone());
        }
        if let Some(v) = &self.model {
            settings.analysis_model = v.clone();
        }
        if let Some(v) = &self.locator_model {
            settings.locator_model = v.clone();
        }
        if let Some(v) = &self.speech_model {
            settings.speech_model = v.clone();
        }
        if let Some(v) = &self.voice {
            settings.voice_name = v.clone();
        }
        if let Some(v) = self.max_dimension {
            settings.max_dimension = v;
        }
        if let Some(v) = self.quality {
            settings.jpeg_quality = v;
        }
        if let Some(v) = self.timeout_secs {
            settings.timeout_secs = v;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn base_config(&self) -> Result<TomlConfig> {
        match &self.config {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                TomlConfig::from_file(path)
            }
            None => Ok(TomlConfig::default()),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "aushadh-ai")]
#[command(about = "Read a prescription photo and find cheaper Jan Aushadhi generics")]
pub struct CliConfig {
    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a prescription photo
    Analyze(AnalyzeArgs),

    /// Find the nearest Jan Aushadhi Kendra
    #[command(allow_negative_numbers = true)]
    Locate { lat: f64, lng: f64 },

    /// Narrate a saved analysis summary into a WAV file
    Speak {
        /// Analysis JSON written by `analyze --save`
        result: PathBuf,

        #[arg(long, default_value = "en")]
        lang: Language,

        #[arg(long, default_value = "summary.wav")]
        out: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    /// Prescription photo (JPEG, PNG or WebP)
    #[arg(required_unless_present = "url")]
    pub image: Option<PathBuf>,

    /// Fetch the photo over HTTP instead of reading a file
    #[arg(long, conflicts_with = "image")]
    pub url: Option<String>,

    /// Send the photo through a running proxy instead of calling the model directly
    #[arg(long, env = "AUSHADH_PROXY_URL")]
    pub proxy_url: Option<String>,

    /// Clockwise rotation applied before upload (0, 90, 180, 270)
    #[arg(long, default_value_t = 0)]
    pub rotate: u16,

    /// Summary language shown in the report
    #[arg(long, default_value = "en")]
    pub lang: Language,

    /// Print the analysis as JSON instead of the text report
    #[arg(long)]
    pub json: bool,

    /// Save the analysis JSON for a later `speak`; a directory gets a
    /// timestamped file name
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Also look up the nearest Kendra, e.g. `--locate 28.61,77.20`
    #[arg(long, allow_hyphen_values = true)]
    pub locate: Option<Coordinates>,

    /// Narrate the summary after analysis
    #[arg(long, requires = "audio_out")]
    pub speak: bool,

    #[arg(long)]
    pub audio_out: Option<PathBuf>,
}

impl Validate for AnalyzeArgs {
    fn validate(&self) -> Result<()> {
        if self.image.is_none() && self.url.is_none() {
            return Err(AushadhError::ValidationError {
                message: "Provide an image path or --url".to_string(),
            });
        }
        if let Some(url) = &self.url {
            crate::utils::validation::validate_url("url", url)?;
        }
        if let Some(proxy_url) = &self.proxy_url {
            crate::utils::validation::validate_url("proxy_url", proxy_url)?;
        }
        if !matches!(self.rotate, 0 | 90 | 180 | 270) {
            return Err(AushadhError::InvalidConfigValueError {
                field: "rotate".to_string(),
                value: self.rotate.to_string(),
                reason: "Rotation must be 0, 90, 180 or 270".to_string(),
            });
        }
        if let Some(coords) = &self.locate {
            validate_coordinates(coords.lat, coords.lng)?;
        }
        Ok(())
    }
}

/// `LAT,LNG` pair from the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl FromStr for Coordinates {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| format!("Expected LAT,LNG but got '{}'", s))?;
        let lat = lat
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("Invalid latitude '{}': {}", lat.trim(), e))?;
        let lng = lng
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("Invalid longitude '{}': {}", lng.trim(), e))?;
        Ok(Self { lat, lng })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze_command() {
        let config = CliConfig::try_parse_from([
            "aushadh-ai",
            "analyze",
            "rx.jpg",
            "--rotate",
            "90",
            "--lang",
            "ta",
            "--locate",
            "12.97,77.59",
        ])
        .unwrap();

        match config.command {
            Command::Analyze(args) => {
                assert_eq!(args.image, Some(PathBuf::from("rx.jpg")));
                assert_eq!(args.rotate, 90);
                assert_eq!(args.lang, Language::Ta);
                assert_eq!(
                    args.locate,
                    Some(Coordinates {
                        lat: 12.97,
                        lng: 77.59
                    })
                );
                assert!(args.validate().is_ok());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_analyze_requires_image_or_url() {
        assert!(CliConfig::try_parse_from(["aushadh-ai", "analyze"]).is_err());
        assert!(CliConfig::try_parse_from([
            "aushadh-ai",
            "analyze",
            "--url",
            "https://example.com/rx.jpeg"
        ])
        .is_ok());
    }

    #[test]
    fn test_speak_flag_requires_audio_out() {
        assert!(CliConfig::try_parse_from(["aushadh-ai", "analyze", "rx.jpg", "--speak"]).is_err());
    }

    #[test]
    fn test_locate_accepts_negative_coordinates() {
        let config =
            CliConfig::try_parse_from(["aushadh-ai", "locate", "-33.86", "151.20"]).unwrap();
        match config.command {
            Command::Locate { lat, lng } => {
                assert_eq!(lat, -33.86);
                assert_eq!(lng, 151.20);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_rotation_fails_validation() {
        let config =
            CliConfig::try_parse_from(["aushadh-ai", "analyze", "rx.jpg", "--rotate", "45"])
                .unwrap();
        match config.command {
            Command::Analyze(args) => assert!(args.validate().is_err()),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = ModelArgs {
            api_key: Some("key".to_string()),
            max_dimension: Some(800),
            voice: Some("Puck".to_string()),
            ..Default::default()
        };

        let settings = args.resolve().unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("key"));
        assert_eq!(settings.max_dimension, 800);
        assert_eq!(settings.voice_name, "Puck");
        assert_eq!(settings.analysis_model, crate::config::DEFAULT_ANALYSIS_MODEL);
    }

    #[test]
    fn test_coordinates_parsing() {
        assert!("28.6,77.2".parse::<Coordinates>().is_ok());
        assert!("28.6".parse::<Coordinates>().is_err());
        assert!("north,77.2".parse::<Coordinates>().is_err());
    }
}
