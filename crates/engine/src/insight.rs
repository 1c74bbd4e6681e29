//! Pinterest discovery insight over a model comparison.
//!
//! Each model's Pinterest credit is taken as a share of that result's total,
//! so the strategy bands read the same for a $20 order and a $20,000 one.

use std::collections::BTreeMap;

use attribution_core::{AttributionModel, AttributionResult, Platform};
use serde::{Deserialize, Serialize};
use tracing::info;

const INCREASE_BUDGET_ABOVE: f64 = 0.4;
const OPTIMIZE_CREATIVE_ABOVE: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStrategy {
    IncreaseBudget,
    OptimizeCreative,
    ReviewStrategy,
}

impl DiscoveryStrategy {
    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::IncreaseBudget => {
                "Pinterest is carrying the discovery phase; shift budget toward it"
            }
            Self::OptimizeCreative => {
                "Pinterest contributes moderately; focus on creative and targeting"
            }
            Self::ReviewStrategy => "Pinterest discovery credit is low; review targeting and creative",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationPriority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryInsight {
    /// Mean Pinterest share of attribution across the compared models.
    pub average_pinterest_share: f64,
    pub pinterest_share_by_model: BTreeMap<AttributionModel, f64>,
    pub strategy: DiscoveryStrategy,
    pub recommendation: String,
    pub priority: OptimizationPriority,
}

impl DiscoveryInsight {
    /// Reduce a `compare_models` map to a discovery strategy. An empty map
    /// reads as zero share.
    pub fn from_comparison(results: &BTreeMap<AttributionModel, AttributionResult>) -> Self {
        let pinterest_share_by_model: BTreeMap<AttributionModel, f64> = results
            .iter()
            .map(|(model, result)| (*model, pinterest_share(result)))
            .collect();

        let average_pinterest_share = if pinterest_share_by_model.is_empty() {
            0.0
        } else {
            pinterest_share_by_model.values().sum::<f64>() / pinterest_share_by_model.len() as f64
        };

        let strategy = if average_pinterest_share > INCREASE_BUDGET_ABOVE {
            DiscoveryStrategy::IncreaseBudget
        } else if average_pinterest_share > OPTIMIZE_CREATIVE_ABOVE {
            DiscoveryStrategy::OptimizeCreative
        } else {
            DiscoveryStrategy::ReviewStrategy
        };
        let priority = if average_pinterest_share < OPTIMIZE_CREATIVE_ABOVE {
            OptimizationPriority::High
        } else {
            OptimizationPriority::Medium
        };

        info!(
            models = pinterest_share_by_model.len(),
            average_pinterest_share,
            strategy = ?strategy,
            "Pinterest discovery insight computed"
        );

        Self {
            average_pinterest_share,
            pinterest_share_by_model,
            strategy,
            recommendation: strategy.recommendation().to_string(),
            priority,
        }
    }
}

fn pinterest_share(result: &AttributionResult) -> f64 {
    if result.total_attribution <= 0.0 {
        return 0.0;
    }
    result.platform_score(Platform::Pinterest) / result.total_attribution
}
