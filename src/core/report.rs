use crate::core::savings::SavingsSummary;
use crate::domain::model::{AnalysisResult, Language, StoreLocation};
use chrono::{DateTime, TimeZone};
use std::fmt::Write;

const RULE: &str = "────────────────────────────────────────────────────────";

pub fn render_report(result: &AnalysisResult, lang: Language) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Prescription Analysis");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Doctor   : {}", result.metadata.doctor);
    let _ = writeln!(out, "Date     : {}", result.metadata.date);
    let _ = writeln!(out, "Currency : {}", result.metadata.currency);
    let _ = writeln!(out);

    if result.medications.is_empty() {
        let _ = writeln!(out, "No medications detected");
    } else {
        let _ = writeln!(out, "Medications ({})", result.medications.len());
        for (index, med) in result.medications.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:>2}. {} -> {}",
                index + 1,
                or_dash(&med.prescribed_brand),
                or_dash(&med.jan_aushadhi_generic)
            );
            let _ = writeln!(out, "    Active salt  : {}", or_dash(&med.active_salt));
            let _ = writeln!(
                out,
                "    Market price : {:<12} Jan Aushadhi: {:<12} Savings: {}",
                or_dash(&med.brand_price_est),
                or_dash(&med.jan_aushadhi_price_est),
                or_dash(&med.savings_est)
            );
        }
    }
    let _ = writeln!(out);

    if let Some(savings) = SavingsSummary::compute(&result.medications) {
        out.push_str(&savings.render());
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Summary [{}]", lang.label());
    let _ = writeln!(out, "{}", result.bhashini_summary.text_for(lang));
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "⚠ {}", result.disclaimer);

    out
}

pub fn render_store(store: &StoreLocation) -> String {
    format!(
        "Nearest Jan Aushadhi Kendra\n{}\n{}\n{}\nNavigate: {}\n",
        RULE, store.name, store.address, store.map_uri
    )
}

/// File name for a saved analysis, e.g. `analysis-20241010-093000.json`.
pub fn timestamped_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("analysis-{}.json", at.format("%Y%m%d-%H%M%S"))
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AnalysisMetadata, Medication, MultilingualSummary};

    fn sample() -> AnalysisResult {
        AnalysisResult {
            metadata: AnalysisMetadata {
                doctor: "Dr. K. Nair".to_string(),
                date: "10/10/2024".to_string(),
                currency: "INR".to_string(),
            },
            medications: vec![Medication {
                prescribed_brand: "Glycomet 500".to_string(),
                active_salt: "Metformin 500mg".to_string(),
                jan_aushadhi_generic: "Metformin Tablets IP 500mg".to_string(),
                brand_price_est: "₹40".to_string(),
                jan_aushadhi_price_est: "₹10".to_string(),
                savings_est: "75%".to_string(),
            }],
            bhashini_summary: MultilingualSummary {
                en: "Diabetes tablet twice daily".to_string(),
                ta: "நீரிழிவு மாத்திரை".to_string(),
                ..Default::default()
            },
            disclaimer: "Consult your doctor.".to_string(),
        }
    }

    #[test]
    fn test_report_contains_all_sections() {
        let text = render_report(&sample(), Language::Ta);

        assert!(text.contains("Doctor   : Dr. K. Nair"));
        assert!(text.contains("Glycomet 500 -> Metformin Tablets IP 500mg"));
        assert!(text.contains("Active salt  : Metformin 500mg"));
        assert!(text.contains("Estimated Savings"));
        assert!(text.contains("Save 75%"));
        assert!(text.contains("Summary [Tamil (தமிழ்)]"));
        assert!(text.contains("நீரிழிவு மாத்திரை"));
        assert!(text.contains("Consult your doctor."));
    }

    #[test]
    fn test_report_without_medications_hides_savings() {
        let mut result = sample();
        result.medications.clear();

        let text = render_report(&result, Language::En);
        assert!(text.contains("No medications detected"));
        assert!(!text.contains("Estimated Savings"));
        assert!(text.contains("Diabetes tablet twice daily"));
    }

    #[test]
    fn test_render_store() {
        let store = StoreLocation {
            name: "PMBJK Andheri".to_string(),
            address: "Station Road".to_string(),
            map_uri: "https://maps.google.com/?cid=7".to_string(),
        };
        let text = render_store(&store);
        assert!(text.contains("PMBJK Andheri"));
        assert!(text.contains("Navigate: https://maps.google.com/?cid=7"));
    }

    #[test]
    fn test_timestamped_name() {
        let at = chrono::Utc.with_ymd_and_hms(2024, 10, 10, 9, 30, 0).unwrap();
        assert_eq!(timestamped_name(&at), "analysis-20241010-093000.json");
    }
}
