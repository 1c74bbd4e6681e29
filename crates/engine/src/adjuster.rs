//! Discovery-phase adjustment.
//!
//! Pinterest is treated as a discovery platform: when a journey comes with
//! trending-keyword or audience-persona signals, its platform score is
//! boosted and the whole platform map is rescaled back to the original
//! total, so credit moves between platforms without being created.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use attribution_core::{AppConfig, InteractionType, Journey, Platform};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Audience persona attached to a journey by the caller. Interests sit at
/// the top level; nested shapes are rejected rather than read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerPersona {
    #[serde(default)]
    pub persona_name: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub age_ranges: Vec<String>,
}

impl CustomerPersona {
    pub fn has_interests(&self) -> bool {
        !self.interests.is_empty()
    }
}

/// Discovery-phase signals for one journey.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Enrichment {
    #[serde(default)]
    pub trending_keywords: BTreeSet<String>,
    #[serde(default)]
    pub customer_persona: Option<CustomerPersona>,
}

impl Enrichment {
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            trending_keywords: keywords.into_iter().map(Into::into).collect(),
            customer_persona: None,
        }
    }

    pub fn with_persona(mut self, persona: CustomerPersona) -> Self {
        self.customer_persona = Some(persona);
        self
    }

    pub fn has_trending_keywords(&self) -> bool {
        !self.trending_keywords.is_empty()
    }

    pub fn has_persona_interests(&self) -> bool {
        self.customer_persona
            .as_ref()
            .is_some_and(CustomerPersona::has_interests)
    }
}

/// Platform scores after adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedScores {
    pub platform_scores: BTreeMap<Platform, f64>,
    pub adjustment_applied: bool,
    /// Multiplier applied to Pinterest before rescaling.
    pub boost: f64,
}

/// Credit for one Pinterest touchpoint within the Pinterest platform score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinterestShare {
    pub touchpoint_index: usize,
    pub interaction_type: InteractionType,
    #[serde(default)]
    pub pin_id: Option<String>,
    pub campaign_id: String,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct DiscoveryAdjuster {
    config: Arc<AppConfig>,
}

impl DiscoveryAdjuster {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }

    /// 1.0, plus the trending-keyword boost, plus the persona boost.
    pub fn discovery_boost(&self, enrichment: &Enrichment) -> f64 {
        let discovery = &self.config.discovery;
        let mut boost = 1.0;
        if enrichment.has_trending_keywords() {
            boost += discovery.trending_keyword_boost;
        }
        if enrichment.has_persona_interests() {
            boost += discovery.persona_interest_boost;
        }
        boost
    }

    /// Boost Pinterest and rescale every platform so the total is unchanged.
    /// `model_boost` is the model's own Pinterest multiplier (1.0 for none).
    pub fn adjust(
        &self,
        platform_scores: &BTreeMap<Platform, f64>,
        enrichment: &Enrichment,
        model_boost: f64,
    ) -> AdjustedScores {
        let boost = self.discovery_boost(enrichment) * model_boost;
        let pre_total: f64 = platform_scores.values().sum();
        let pinterest = platform_scores
            .get(&Platform::Pinterest)
            .copied()
            .unwrap_or(0.0);

        if boost <= 1.0 || pinterest <= 0.0 || pre_total <= 0.0 {
            return AdjustedScores {
                platform_scores: platform_scores.clone(),
                adjustment_applied: false,
                boost: 1.0,
            };
        }

        let mut adjusted = platform_scores.clone();
        adjusted.insert(Platform::Pinterest, pinterest * boost);

        let post_total: f64 = adjusted.values().sum();
        let scale = pre_total / post_total;
        for score in adjusted.values_mut() {
            *score *= scale;
        }

        debug!(
            boost,
            before = pinterest,
            after = adjusted[&Platform::Pinterest],
            "Pinterest discovery adjustment applied"
        );

        AdjustedScores {
            platform_scores: adjusted,
            adjustment_applied: true,
            boost,
        }
    }

    /// Split a Pinterest platform score across the journey's Pinterest
    /// touchpoints by interaction weight.
    pub fn pinterest_breakdown(&self, journey: &Journey, pinterest_score: f64) -> Vec<PinterestShare> {
        let weights = &self.config.discovery.interaction_weights;
        let pins: Vec<(usize, &attribution_core::Touchpoint)> = journey
            .attributable()
            .iter()
            .enumerate()
            .filter(|(_, tp)| tp.platform == Platform::Pinterest)
            .collect();

        let total: f64 = pins.iter().map(|(_, tp)| weights.weight(tp.interaction_type)).sum();
        let even = 1.0 / pins.len().max(1) as f64;

        pins.iter()
            .map(|(index, tp)| {
                let share = if total > 0.0 {
                    weights.weight(tp.interaction_type) / total
                } else {
                    even
                };
                PinterestShare {
                    touchpoint_index: *index,
                    interaction_type: tp.interaction_type,
                    pin_id: tp.pin_id.clone(),
                    campaign_id: tp.campaign_id.clone(),
                    score: pinterest_score * share,
                }
            })
            .collect()
    }
}

/// Pinterest's share of the platform map, doubled and capped at 1.0.
pub fn discovery_score(platform_scores: &BTreeMap<Platform, f64>) -> f64 {
    let total: f64 = platform_scores.values().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let pinterest = platform_scores
        .get(&Platform::Pinterest)
        .copied()
        .unwrap_or(0.0);
    (pinterest / total * 2.0).min(1.0)
}
