use crate::domain::generation::{GenerateRequest, GenerateResponse};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn analysis_model(&self) -> &str;
    fn proxy_model(&self) -> &str;
    fn locator_model(&self) -> &str;
    fn speech_model(&self) -> &str;
    fn voice_name(&self) -> &str;
    fn max_dimension(&self) -> u32;
    fn jpeg_quality(&self) -> u8;
    fn timeout_secs(&self) -> u64;
}

/// A hosted multimodal model reachable through `generateContent`.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, model: &str, request: &GenerateRequest) -> Result<GenerateResponse>;
}
