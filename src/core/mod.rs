pub mod analyzer;
pub mod extract;
pub mod gemini;
pub mod locator;
pub mod photo;
pub mod proxy_client;
pub mod report;
pub mod sanitize;
pub mod savings;
pub mod speech;

pub use crate::domain::generation::{GenerateRequest, GenerateResponse};
pub use crate::domain::model::{AnalysisResult, Language, Medication, StoreLocation};
pub use crate::domain::ports::{ConfigProvider, GenerativeModel, Storage};
pub use crate::utils::error::Result;
