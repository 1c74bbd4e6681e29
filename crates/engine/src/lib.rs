//! Multi-touch cross-platform attribution: model registry, discovery-phase
//! adjustment, and the calculator that ties them together.

pub mod adjuster;
pub mod calculator;
pub mod insight;
pub mod rates;
pub mod registry;
pub mod strategy;

pub use adjuster::{AdjustedScores, CustomerPersona, DiscoveryAdjuster, Enrichment, PinterestShare};
pub use calculator::AttributionCalculator;
pub use insight::{DiscoveryInsight, DiscoveryStrategy, OptimizationPriority};
pub use rates::{HistoricalRateTable, JourneyPosition};
pub use registry::{Fallback, FallbackReason, ModelRegistry, TouchpointWeights};
pub use strategy::{AttributionStrategy, EngagementStrategy};

use attribution_core::{
    AttributionResult, EngineResult, Journey, RawTouchpoint, ValidationError,
};

/// Build a validated journey from raw event-source records.
pub fn build_journey(
    customer_key: impl Into<String>,
    raw_touchpoints: Vec<RawTouchpoint>,
) -> Result<Journey, ValidationError> {
    Journey::build(customer_key, raw_touchpoints)
}

/// Attribute one journey by model identifier (`"linear"`, `"time_decay"`,
/// ..., or `"ensemble"`).
pub fn calculate_attribution(
    calculator: &AttributionCalculator,
    journey: &Journey,
    model_id: &str,
    enrichment: Option<&Enrichment>,
) -> EngineResult<AttributionResult> {
    calculator.calculate_by_id(journey, model_id, enrichment)
}
