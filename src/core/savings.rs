use crate::domain::model::Medication;

const BAR_WIDTH: usize = 30;

/// Extracts a number from free-form price text such as `"₹ 1,250.00 / strip"`.
/// Everything except digits and dots is dropped; unparsable input is 0.
pub fn parse_price(price: &str) -> f64 {
    let clean: String = price
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if clean.is_empty() {
        return 0.0;
    }
    // Keep the leading `digits[.digits]` so stray dots ("Rs. 45") do not void the price.
    let mut seen_dot = false;
    let numeric: String = clean
        .trim_start_matches('.')
        .chars()
        .take_while(|c| {
            if *c == '.' {
                if seen_dot {
                    return false;
                }
                seen_dot = true;
            }
            true
        })
        .collect();
    numeric.parse::<f64>().unwrap_or(0.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavingsSlice {
    pub name: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SavingsSummary {
    pub total_brand: f64,
    pub total_generic: f64,
    pub total_savings: f64,
    pub percentage: i64,
}

impl SavingsSummary {
    /// `None` when there is nothing to show: no medications or a zero market total.
    pub fn compute(medications: &[Medication]) -> Option<Self> {
        if medications.is_empty() {
            return None;
        }

        let (total_brand, total_generic) =
            medications.iter().fold((0.0, 0.0), |(brand, generic), med| {
                (
                    brand + parse_price(&med.brand_price_est),
                    generic + parse_price(&med.jan_aushadhi_price_est),
                )
            });

        if total_brand == 0.0 {
            return None;
        }

        let total_savings = total_brand - total_generic;
        // Halves round up, so -12.5% shows as -12%.
        let percentage = (total_savings / total_brand * 100.0 + 0.5).floor() as i64;

        Some(Self {
            total_brand,
            total_generic,
            total_savings,
            percentage,
        })
    }

    /// Chart segments: what the generics cost and what is saved.
    pub fn slices(&self) -> [SavingsSlice; 2] {
        [
            SavingsSlice {
                name: "Jan Aushadhi",
                value: self.total_generic,
            },
            SavingsSlice {
                name: "Savings",
                value: self.total_savings,
            },
        ]
    }

    pub fn render(&self) -> String {
        let ratio = if self.total_brand > 0.0 {
            (self.total_generic / self.total_brand).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let generic_cells = (ratio * BAR_WIDTH as f64).round() as usize;
        let bar = format!(
            "[{}{}]",
            "#".repeat(generic_cells),
            "-".repeat(BAR_WIDTH - generic_cells)
        );

        let mut out = String::new();
        out.push_str("Estimated Savings\n");
        out.push_str("Based on PMBJP comparative pricing\n");
        out.push_str(&format!(
            "  ₹{:.0}  (Save {}%)\n",
            self.total_savings, self.percentage
        ));
        out.push_str(&format!("  Market Price        ₹{:.0}\n", self.total_brand));
        out.push_str(&format!("  Jan Aushadhi Price  ₹{:.0}\n", self.total_generic));
        out.push_str(&format!("  {} # generic  - saved\n", bar));
        out
    }
}
