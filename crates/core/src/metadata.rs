//! Campaign metadata lookup used to enrich attribution results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::touchpoint::Platform;

/// Budget tier a campaign is bucketed into by the media plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetadata {
    pub campaign_id: String,
    pub platform: Platform,
    #[serde(default)]
    pub name: Option<String>,
    pub budget_tier: BudgetTier,
}

/// Read-only campaign lookup. Implementations must already hold their data
/// in memory; the engine never waits on I/O.
pub trait CampaignMetadataProvider: Send + Sync {
    fn lookup(&self, campaign_id: &str) -> Option<CampaignMetadata>;
}

/// In-memory provider backed by a map.
#[derive(Debug, Clone, Default)]
pub struct StaticCampaignMetadata {
    campaigns: HashMap<String, CampaignMetadata>,
}

impl StaticCampaignMetadata {
    pub fn new(campaigns: impl IntoIterator<Item = CampaignMetadata>) -> Self {
        Self {
            campaigns: campaigns
                .into_iter()
                .map(|c| (c.campaign_id.clone(), c))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.campaigns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty()
    }
}

impl CampaignMetadataProvider for StaticCampaignMetadata {
    fn lookup(&self, campaign_id: &str) -> Option<CampaignMetadata> {
        self.campaigns.get(campaign_id).cloned()
    }
}
