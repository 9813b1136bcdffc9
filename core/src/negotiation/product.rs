//! Product under negotiation and its fair price heuristic

use super::persona::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality grade of the goods
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QualityGrade {
    A,
    B,
    Export,
    Other(String),
}

impl QualityGrade {
    /// Price adjustment for this grade, in percent of market price
    pub fn multiplier_pct(&self) -> u64 {
        match self {
            QualityGrade::A => 105,
            QualityGrade::B => 95,
            QualityGrade::Export => 110,
            QualityGrade::Other(_) => 100,
        }
    }
}

impl From<String> for QualityGrade {
    fn from(value: String) -> Self {
        match value.as_str() {
            "A" => QualityGrade::A,
            "B" => QualityGrade::B,
            "Export" => QualityGrade::Export,
            _ => QualityGrade::Other(value),
        }
    }
}

impl From<QualityGrade> for String {
    fn from(grade: QualityGrade) -> Self {
        grade.to_string()
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityGrade::A => write!(f, "A"),
            QualityGrade::B => write!(f, "B"),
            QualityGrade::Export => write!(f, "Export"),
            QualityGrade::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Goods being bought or sold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub category: String,
    pub origin: String,
    pub quantity: u32,
    pub quality_grade: QualityGrade,
    /// Market price for the whole lot
    pub base_market_price: u64,
    /// Export-grade goods carry a small premium
    #[serde(default)]
    pub export_grade: bool,
}

impl Product {
    /// Ten export-grade Alphonso mangoes at the given market price
    pub fn alphonso_mangoes(base_market_price: u64) -> Self {
        Self {
            name: "Alphonso Mangoes".to_string(),
            category: "Fruit".to_string(),
            origin: "India".to_string(),
            quantity: 10,
            quality_grade: QualityGrade::A,
            base_market_price,
            export_grade: true,
        }
    }

    /// Fair price as seen from one side of the table.
    ///
    /// Buyers clamp the estimate into 70%..=120% of market; sellers never
    /// value the goods at or below market.
    pub fn fair_price(&self, role: Role) -> u64 {
        let base = self.base_market_price;
        let mut pct = self.quality_grade.multiplier_pct();
        if self.export_grade {
            pct += 2;
        }
        let fair = percent_of(base, pct);

        match role {
            Role::Buyer => fair.clamp(percent_of(base, 70), percent_of(base, 120)),
            Role::Seller => fair.max(base.saturating_add(1)),
        }
    }

    /// One-line description used in prompts and summaries
    pub fn describe(&self) -> String {
        format!(
            "{} x {} (quality: {})",
            self.quantity, self.name, self.quality_grade
        )
    }
}

/// `pct` percent of `amount`, rounded down and saturating at `u64::MAX`
pub(crate) fn percent_of(amount: u64, pct: u64) -> u64 {
    let scaled = amount as u128 * pct as u128 / 100;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}
