//! Aggregated views over the application collection.

use super::amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One point of a trend series (a calendar month or a derived week).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsDataPoint {
    pub period: String,
    #[serde(default)]
    pub total_applications: u64,
    #[serde(default)]
    pub offers_issued: u64,
    #[serde(default)]
    pub coe_issued: u64,
    #[serde(default, with = "amount")]
    pub total_collection: Decimal,
}

/// Headline numbers shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_applications: usize,
    pub offers_issued: usize,
    pub coe_issued: usize,
    #[serde(with = "amount")]
    pub total_collection: Decimal,
}

/// Dimension a performance table is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Agent,
    Marketer,
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Agent => write!(f, "Agent"),
            GroupBy::Marketer => write!(f, "Marketer"),
        }
    }
}

/// Filter values that produced a filtered performance bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intake: Option<String>,
}

impl AppliedFilters {
    pub fn is_empty(&self) -> bool {
        self.campus.is_none() && self.course.is_none() && self.intake.is_none()
    }
}

/// Per-agent or per-marketer performance bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub group_by: GroupBy,
    pub name: String,
    pub applications: usize,
    pub offers_issued: usize,
    pub coe_issued: usize,
    #[serde(with = "amount")]
    pub total_amount: Decimal,
    /// Offers as a percentage of applications, one decimal place.
    pub conversion_rate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<AppliedFilters>,
}
