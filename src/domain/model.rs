use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder the model is instructed to use for illegible fields.
pub const NOT_PROVIDED: &str = "Not provided in image";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub prescribed_brand: String,
    pub active_salt: String,
    pub jan_aushadhi_generic: String,
    pub brand_price_est: String,
    pub jan_aushadhi_price_est: String,
    pub savings_est: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub doctor: String,
    pub date: String,
    pub currency: String,
}

/// Patient-facing summary in the seven supported languages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultilingualSummary {
    pub en: String,
    pub hi: String,
    pub te: String,
    pub ta: String,
    pub kn: String,
    pub bn: String,
    pub mr: String,
}

impl MultilingualSummary {
    pub fn get(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.en,
            Language::Hi => &self.hi,
            Language::Te => &self.te,
            Language::Ta => &self.ta,
            Language::Kn => &self.kn,
            Language::Bn => &self.bn,
            Language::Mr => &self.mr,
        }
    }

    /// Text for `lang`, falling back to English when that translation is empty.
    pub fn text_for(&self, lang: Language) -> &str {
        let text = self.get(lang);
        if text.trim().is_empty() {
            &self.en
        } else {
            text
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub metadata: AnalysisMetadata,
    pub medications: Vec<Medication>,
    pub bhashini_summary: MultilingualSummary,
    pub disclaimer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreLocation {
    pub name: String,
    pub address: String,
    #[serde(rename = "mapUri")]
    pub map_uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Te,
    Ta,
    Kn,
    Bn,
    Mr,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::En,
        Language::Hi,
        Language::Te,
        Language::Ta,
        Language::Kn,
        Language::Bn,
        Language::Mr,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Te => "te",
            Language::Ta => "ta",
            Language::Kn => "kn",
            Language::Bn => "bn",
            Language::Mr => "mr",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "Hindi (हिंदी)",
            Language::Te => "Telugu (తెలుగు)",
            Language::Ta => "Tamil (தமிழ்)",
            Language::Kn => "Kannada (ಕನ್ನಡ)",
            Language::Bn => "Bengali (বাংলা)",
            Language::Mr => "Marathi (मराठी)",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.code() == code)
            .ok_or_else(|| {
                let codes: Vec<&str> = Language::ALL.iter().map(|l| l.code()).collect();
                format!("Unsupported language '{}'. Use one of: {}", s, codes.join(", "))
            })
    }
}

/// Lifecycle of a single analyze action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppStatus {
    #[default]
    Idle,
    Uploading,
    Processing,
    Success,
    Error,
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppStatus::Idle => "idle",
            AppStatus::Uploading => "uploading",
            AppStatus::Processing => "processing",
            AppStatus::Success => "success",
            AppStatus::Error => "error",
        };
        f.write_str(s)
    }
}
