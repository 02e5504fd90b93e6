use crate::core::extract::parse_model_json;
use crate::core::sanitize::sanitize_analysis;
use crate::domain::generation::{Content, GenerateRequest, GenerationConfig, Part};
use crate::domain::model::AnalysisResult;
use crate::domain::ports::{ConfigProvider, GenerativeModel};
use crate::utils::error::{AushadhError, Result};
use serde_json::{json, Value};

pub const ANALYSIS_PROMPT: &str = "\
Role: You are an expert Indian medical pharmacist supporting the Pradhan Mantri Bhartiya \
Janaushadhi Pariyojana (PMBJP).
Task: Read the medical prescription in the image, digitize it and map every medicine to its \
Jan Aushadhi generic equivalent.

Instructions:
1. Handwriting: transcribe every doctor name visible, the date, and all medications with dosages.
2. Generic mapping: identify the active chemical salt of every brand.
3. Jan Aushadhi match: match the salt to the standard Jan Aushadhi generic product.
4. Pricing: compare branded and Jan Aushadhi prices; if data is missing, estimate an 80% saving. \
Write the rupee symbol (₹) in UTF-8.
5. Summary: give a short patient-friendly summary in English, Hindi, Telugu, Tamil, Kannada, \
Bengali and Marathi.

Constraint: respond with JSON only, no conversational text. Mark illegible text as \
'Not provided in image'.
";

const STRICT_JSON_CONSTRAINT: &str = "\
Your output MUST be a single valid JSON object with no other text and no markdown fences. \
The JSON object must follow exactly this shape:
";

const MEDICATION_FIELDS: [&str; 6] = [
    "prescribed_brand",
    "active_salt",
    "jan_aushadhi_generic",
    "brand_price_est",
    "jan_aushadhi_price_est",
    "savings_est",
];

const SUMMARY_LANGUAGES: [&str; 7] = ["en", "hi", "te", "ta", "kn", "bn", "mr"];

fn string_properties(keys: &[&str]) -> Value {
    Value::Object(
        keys.iter()
            .map(|k| (k.to_string(), json!({"type": "STRING"})))
            .collect(),
    )
}

fn string_placeholders(keys: &[&str]) -> Value {
    Value::Object(
        keys.iter()
            .map(|k| (k.to_string(), Value::String("string".to_string())))
            .collect(),
    )
}

/// Structured-output schema sent with every analysis request.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "metadata": {
                "type": "OBJECT",
                "properties": string_properties(&["doctor", "date", "currency"]),
                "required": ["doctor", "date", "currency"]
            },
            "medications": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": string_properties(&MEDICATION_FIELDS),
                    "required": MEDICATION_FIELDS
                }
            },
            "bhashini_summary": {
                "type": "OBJECT",
                "properties": string_properties(&SUMMARY_LANGUAGES),
                "required": ["en"]
            },
            "disclaimer": {"type": "STRING"}
        },
        "required": ["metadata", "medications", "bhashini_summary", "disclaimer"]
    })
}

/// Prompt for models called without a response schema: the shape is spelled
/// out in the text instead.
pub fn inline_schema_prompt() -> String {
    let shape = json!({
        "metadata": string_placeholders(&["doctor", "date", "currency"]),
        "medications": [string_placeholders(&MEDICATION_FIELDS)],
        "bhashini_summary": string_placeholders(&SUMMARY_LANGUAGES),
        "disclaimer": "string"
    });
    let shape = serde_json::to_string_pretty(&shape).unwrap_or_default();
    format!("{}\n{}{}\n", ANALYSIS_PROMPT, STRICT_JSON_CONSTRAINT, shape)
}

pub struct PrescriptionAnalyzer<M: GenerativeModel> {
    model: M,
    analysis_model: String,
    proxy_model: String,
}

impl<M: GenerativeModel> PrescriptionAnalyzer<M> {
    pub fn new(model: M, config: &impl ConfigProvider) -> Self {
        Self {
            model,
            analysis_model: config.analysis_model().to_string(),
            proxy_model: config.proxy_model().to_string(),
        }
    }

    /// One structured-output call, then recovery parsing and sanitization.
    pub async fn analyze(&self, image_base64: &str, mime_type: &str) -> Result<AnalysisResult> {
        tracing::info!(
            "Analyzing prescription with {} ({} base64 chars)",
            self.analysis_model,
            image_base64.len()
        );

        let request = GenerateRequest {
            contents: vec![Content::user(vec![
                Part::inline(mime_type, image_base64),
                Part::text(ANALYSIS_PROMPT),
            ])],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(response_schema()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let response = self.model.generate(&self.analysis_model, &request).await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(AushadhError::EmptyResponse);
        }

        let value = parse_model_json(&text)?;
        let result = sanitize_analysis(&value);
        tracing::info!("Detected {} medication(s)", result.medications.len());
        Ok(result)
    }

    /// Proxy path: returns the model's text untouched and leaves parsing to
    /// the caller.
    pub async fn analyze_raw(&self, image_base64: &str, mime_type: &str) -> Result<String> {
        tracing::info!(
            "Forwarding prescription to {} ({} base64 chars)",
            self.proxy_model,
            image_base64.len()
        );

        let request = GenerateRequest {
            contents: vec![Content::user(vec![
                Part::text(inline_schema_prompt()),
                Part::inline(mime_type, image_base64),
            ])],
            ..Default::default()
        };

        let response = self.model.generate(&self.proxy_model, &request).await?;
        let text = response.text();
        if text.is_empty() {
            return Err(AushadhError::EmptyResponse);
        }
        Ok(text)
    }
}
