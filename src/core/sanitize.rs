//! Coerces whatever the model returned into the string-only result shape.
//!
//! The model is asked for strings everywhere but occasionally answers with
//! numbers, nested objects, arrays or nulls. None of that may reach the
//! report as a debug dump, and none of it may panic.

use crate::domain::model::{
    AnalysisMetadata, AnalysisResult, Medication, MultilingualSummary, NOT_PROVIDED,
};
use serde_json::{Map, Value};

pub const DEFAULT_SUMMARY: &str = "Analysis complete.";
pub const DEFAULT_CURRENCY: &str = "INR";
pub const DEFAULT_DISCLAIMER: &str = "This is an AI-generated estimate for information only. \
Verify every medicine and dosage with your doctor or pharmacist before buying.";

pub fn sanitize_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(_) | Value::Array(_) => item.to_string(),
                other => sanitize_value(other),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => {
            if let Some(text) = map.get("text").filter(|v| is_truthy(v)) {
                return sanitize_value(text);
            }
            if let Some(value) = map.get("value").filter(|v| is_truthy(v)) {
                return sanitize_value(value);
            }
            if map.is_empty() {
                String::new()
            } else {
                value.to_string()
            }
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn field(map: Option<&Map<String, Value>>, key: &str) -> String {
    map.and_then(|m| m.get(key))
        .map(sanitize_value)
        .unwrap_or_default()
}

fn field_or(map: Option<&Map<String, Value>>, key: &str, default: &str) -> String {
    let value = field(map, key);
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}

fn sanitize_medication(value: &Value) -> Medication {
    let map = value.as_object();
    Medication {
        prescribed_brand: field(map, "prescribed_brand"),
        active_salt: field(map, "active_salt"),
        jan_aushadhi_generic: field(map, "jan_aushadhi_generic"),
        brand_price_est: field(map, "brand_price_est"),
        jan_aushadhi_price_est: field(map, "jan_aushadhi_price_est"),
        savings_est: field(map, "savings_est"),
    }
}

/// Builds an [`AnalysisResult`] from any JSON value, filling defaults for
/// missing parts.
pub fn sanitize_analysis(value: &Value) -> AnalysisResult {
    let root = value.as_object();

    let medications = match root.and_then(|r| r.get("medications")) {
        Some(Value::Array(items)) => items.iter().map(sanitize_medication).collect(),
        Some(single @ Value::Object(_)) => {
            tracing::warn!("Model returned a single medication object instead of a list");
            vec![sanitize_medication(single)]
        }
        _ => Vec::new(),
    };

    let metadata = root.and_then(|r| r.get("metadata")).and_then(Value::as_object);
    let summary = root
        .and_then(|r| r.get("bhashini_summary"))
        .and_then(Value::as_object);

    AnalysisResult {
        metadata: AnalysisMetadata {
            doctor: field_or(metadata, "doctor", NOT_PROVIDED),
            date: field_or(metadata, "date", NOT_PROVIDED),
            currency: field_or(metadata, "currency", DEFAULT_CURRENCY),
        },
        medications,
        bhashini_summary: MultilingualSummary {
            en: field_or(summary, "en", DEFAULT_SUMMARY),
            hi: field(summary, "hi"),
            te: field(summary, "te"),
            ta: field(summary, "ta"),
            kn: field(summary, "kn"),
            bn: field(summary, "bn"),
            mr: field(summary, "mr"),
        },
        disclaimer: field_or(root, "disclaimer", DEFAULT_DISCLAIMER),
    }
}
