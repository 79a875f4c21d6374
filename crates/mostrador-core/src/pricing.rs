//! Price normalization.
//!
//! The upstream platform reports amounts either in full currency units or in
//! minor units (hundredths) without saying which. Every code path that shows a
//! price goes through [`PriceNormalizer`] so the same amount always renders the
//! same way.

use serde::Deserialize;

/// Default amount at or above which a value is taken to be in minor units.
pub const DEFAULT_MINOR_UNITS_THRESHOLD: f64 = 500_000.0;

/// Decides whether an amount is in minor units and renders it for display.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PriceNormalizer {
    /// Always divide by 100
    #[serde(default)]
    pub force_minor_units: bool,
    /// Amounts at or above this are divided by 100
    #[serde(default = "default_threshold")]
    pub minor_units_threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_MINOR_UNITS_THRESHOLD
}

impl Default for PriceNormalizer {
    fn default() -> Self {
        Self {
            force_minor_units: false,
            minor_units_threshold: DEFAULT_MINOR_UNITS_THRESHOLD,
        }
    }
}

impl PriceNormalizer {
    pub fn new(force_minor_units: bool, minor_units_threshold: f64) -> Self {
        Self {
            force_minor_units,
            minor_units_threshold,
        }
    }

    pub fn with_force_minor_units(mut self, force: bool) -> Self {
        self.force_minor_units = force;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.minor_units_threshold = threshold;
        self
    }

    /// Converts a raw upstream amount to full currency units.
    pub fn normalize_amount(&self, amount: f64) -> f64 {
        if self.force_minor_units || amount >= self.minor_units_threshold {
            amount / 100.0
        } else {
            amount
        }
    }

    /// Renders an amount the way prices are shown to customers (`$ 35.595`).
    ///
    /// Returns `None` when there is nothing sensible to show.
    pub fn display(&self, amount: Option<f64>) -> Option<String> {
        let amount = amount.filter(|a| a.is_finite() && *a >= 0.0)?;
        Some(format_ars(self.normalize_amount(amount)))
    }
}

/// Formats pesos with `.` as thousands separator and no decimals.
fn format_ars(amount: f64) -> String {
    let whole = amount.round() as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("$ {}", grouped)
}
