//! Attribution output handed to reporting sinks.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metadata::BudgetTier;
use crate::model::ModelSelection;
use crate::touchpoint::Platform;

/// Credit assigned to one converted journey.
///
/// `platform_scores` and `campaign_scores` each partition
/// `total_attribution`. `ad_scores` only covers touchpoints that carry an
/// ad id and is not required to add up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResult {
    pub journey_customer_key: String,
    pub model_used: ModelSelection,
    /// Conversion value, or 1.0 when the conversion carried no value.
    pub total_attribution: f64,
    /// Monetary order value, when the conversion carried one.
    #[serde(default)]
    pub conversion_value: Option<f64>,
    pub converted_at: DateTime<Utc>,
    pub platform_scores: BTreeMap<Platform, f64>,
    pub campaign_scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub ad_scores: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub campaign_tiers: BTreeMap<String, BudgetTier>,
    pub confidence_score: f64,
    pub adjustment_applied: bool,
    #[serde(default)]
    pub fallback_applied: bool,
    /// Pinterest's share of the final platform map, doubled and capped at 1.
    #[serde(default)]
    pub discovery_score: f64,
    /// Number of touchpoints that received credit.
    pub touchpoint_count: usize,
}

impl AttributionResult {
    pub fn platform_total(&self) -> f64 {
        self.platform_scores.values().sum()
    }

    pub fn campaign_total(&self) -> f64 {
        self.campaign_scores.values().sum()
    }

    pub fn platform_score(&self, platform: Platform) -> f64 {
        self.platform_scores.get(&platform).copied().unwrap_or(0.0)
    }
}
