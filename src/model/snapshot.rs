use crate::model::{Amount, Period};
use serde::{Deserialize, Serialize};

/// Aggregated analytics for one `Period`, as returned by `GET /api/analytics/dashboard`.
///
/// A snapshot is never patched. A new fetch replaces it as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    /// The period this snapshot was requested for. The server echoes it back, but the client
    /// overwrites it with the period it asked for.
    #[serde(default)]
    pub period: Period,
    pub total_balance: Amount,
    pub monthly_income: Amount,
    pub monthly_expenses: Amount,
    /// Percent of income that was saved, e.g. `12.5` for 12.5%.
    pub savings_rate: f64,
    #[serde(default)]
    pub spending_trend: Vec<TrendPoint>,
    #[serde(default)]
    pub category_breakdown: Vec<CategorySlice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_transactions: Option<u64>,
}

/// Total spending on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    pub amount: Amount,
}

/// Total spending in one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySlice {
    pub name: String,
    pub value: f64,
}

impl CategorySlice {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}
