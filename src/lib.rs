pub mod config;
pub mod core;
pub mod domain;
#[cfg(feature = "proxy")]
pub mod server;
pub mod utils;

#[cfg(feature = "clap")]
pub use config::cli::{CliConfig, ModelArgs};
pub use config::{storage::LocalStorage, ModelSettings, ServerSettings};

pub use crate::core::{
    analyzer::PrescriptionAnalyzer, gemini::GeminiClient, locator::StoreLocator,
    speech::Narrator,
};
pub use domain::model::{AnalysisResult, AppStatus, Language, Medication, StoreLocation};
pub use utils::error::{AushadhError, Result};
