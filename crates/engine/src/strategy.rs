//! Pluggable scoring for the `machine_learning` model.
//!
//! Strategies are untrusted: whatever they return is checked by the
//! registry before it is used.

use attribution_core::Journey;

/// Scoring capability for the `machine_learning` attribution model.
pub trait AttributionStrategy: Send + Sync {
    /// One weight per attributable touchpoint (everything before the
    /// conversion), in journey order. Must be non-negative and sum to 1.
    fn predict(&self, journey: &Journey) -> Vec<f64>;

    /// Strategy name for logging.
    fn strategy_name(&self) -> &str;
}

/// Heuristic strategy that favours touchpoints by interaction depth and
/// recency. Useful as a default and as a reference implementation.
#[derive(Debug, Clone)]
pub struct EngagementStrategy {
    recency_bias: f64,
}

impl EngagementStrategy {
    pub fn new(recency_bias: f64) -> Self {
        Self {
            recency_bias: recency_bias.max(0.0),
        }
    }

    fn depth(interaction: attribution_core::InteractionType) -> f64 {
        use attribution_core::InteractionType::*;
        match interaction {
            Impression => 1.0,
            Closeup => 2.0,
            Save => 3.0,
            Click => 4.0,
            Conversion => 0.0,
        }
    }
}

impl Default for EngagementStrategy {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl AttributionStrategy for EngagementStrategy {
    fn predict(&self, journey: &Journey) -> Vec<f64> {
        let touchpoints = journey.attributable();
        let n = touchpoints.len();
        let raw: Vec<f64> = touchpoints
            .iter()
            .enumerate()
            .map(|(i, tp)| {
                let position = (i + 1) as f64 / n as f64;
                Self::depth(tp.interaction_type) * (1.0 + self.recency_bias * position)
            })
            .collect();

        let total: f64 = raw.iter().sum();
        if total <= 0.0 {
            return vec![1.0 / n as f64; n];
        }
        raw.into_iter().map(|w| w / total).collect()
    }

    fn strategy_name(&self) -> &str {
        "engagement"
    }
}
