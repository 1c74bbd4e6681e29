//! Attribution calculator: validates a journey, scores it with a model,
//! scales the weights by the conversion value, aggregates per platform,
//! campaign and ad, applies discovery adjustment and checks conservation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use attribution_core::{
    AppConfig, AttributionModel, AttributionResult, CampaignMetadataProvider, EngineError,
    EngineResult, Journey, ModelSelection, Platform,
};
use tracing::{debug, error, info};

use crate::adjuster::{discovery_score, DiscoveryAdjuster, Enrichment, PinterestShare};
use crate::insight::DiscoveryInsight;
use crate::registry::{ModelRegistry, TouchpointWeights};

/// Stateless attribution orchestrator. Safe to share across threads; each
/// call only reads its own journey and the fixed configuration.
#[derive(Clone)]
pub struct AttributionCalculator {
    config: Arc<AppConfig>,
    registry: ModelRegistry,
    adjuster: DiscoveryAdjuster,
    metadata: Option<Arc<dyn CampaignMetadataProvider>>,
}

impl fmt::Debug for AttributionCalculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributionCalculator")
            .field("registry", &self.registry)
            .field("metadata", &self.metadata.is_some())
            .finish()
    }
}

impl AttributionCalculator {
    pub fn new(registry: ModelRegistry) -> Self {
        let config = registry.shared_config();
        info!(
            rate_table = registry.has_rate_table(),
            strategy = registry.has_strategy(),
            "Attribution calculator initialized"
        );
        Self {
            adjuster: DiscoveryAdjuster::new(Arc::clone(&config)),
            config,
            registry,
            metadata: None,
        }
    }

    /// Calculator with default configuration and no optional inputs.
    pub fn with_defaults() -> EngineResult<Self> {
        Ok(Self::new(ModelRegistry::new(Arc::new(AppConfig::default()))?))
    }

    pub fn with_metadata_provider(mut self, provider: Arc<dyn CampaignMetadataProvider>) -> Self {
        self.metadata = Some(provider);
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn adjuster(&self) -> &DiscoveryAdjuster {
        &self.adjuster
    }

    /// Attribute a converted journey with one model.
    pub fn calculate(
        &self,
        journey: &Journey,
        model: AttributionModel,
        enrichment: Option<&Enrichment>,
    ) -> EngineResult<AttributionResult> {
        let start = Instant::now();
        self.ensure_attributable(journey)?;
        let weights = self.registry.score(journey, model)?;
        let model_boost = self
            .config
            .models
            .settings(model)
            .boost_for(Platform::Pinterest);
        let result = self.finish(journey, weights, enrichment, model_boost)?;
        metrics::histogram!("attribution.latency_us").record(start.elapsed().as_micros() as f64);
        Ok(result)
    }

    /// Attribute by textual model identifier.
    pub fn calculate_by_id(
        &self,
        journey: &Journey,
        model_id: &str,
        enrichment: Option<&Enrichment>,
    ) -> EngineResult<AttributionResult> {
        let model: ModelSelection = model_id.parse()?;
        match model {
            ModelSelection::Single(model) => self.calculate(journey, model, enrichment),
            ModelSelection::Ensemble => self.calculate_ensemble(journey, enrichment),
        }
    }

    /// Attribute with the weighted blend of all seven models.
    pub fn calculate_ensemble(
        &self,
        journey: &Journey,
        enrichment: Option<&Enrichment>,
    ) -> EngineResult<AttributionResult> {
        let start = Instant::now();
        self.ensure_attributable(journey)?;
        let weights = self.registry.score_ensemble(journey)?;
        let result = self.finish(journey, weights, enrichment, 1.0)?;
        metrics::histogram!("attribution.latency_us").record(start.elapsed().as_micros() as f64);
        Ok(result)
    }

    /// Run every model against one journey.
    pub fn compare_models(
        &self,
        journey: &Journey,
        enrichment: Option<&Enrichment>,
    ) -> EngineResult<BTreeMap<AttributionModel, AttributionResult>> {
        AttributionModel::ALL
            .into_iter()
            .map(|model| {
                self.calculate(journey, model, enrichment)
                    .map(|result| (model, result))
            })
            .collect()
    }

    /// Compare every model and reduce the comparison to a Pinterest
    /// discovery strategy.
    pub fn discovery_insight(
        &self,
        journey: &Journey,
        enrichment: Option<&Enrichment>,
    ) -> EngineResult<DiscoveryInsight> {
        let results = self.compare_models(journey, enrichment)?;
        Ok(DiscoveryInsight::from_comparison(&results))
    }

    /// Attribute many independent journeys on `workers` threads. Results
    /// come back in input order, one per journey.
    pub fn calculate_batch(
        &self,
        journeys: &[Journey],
        model: AttributionModel,
        enrichment: Option<&Enrichment>,
        workers: usize,
    ) -> Vec<EngineResult<AttributionResult>> {
        if journeys.is_empty() {
            return Vec::new();
        }
        let chunk_size = journeys.len().div_ceil(workers.max(1));

        std::thread::scope(|scope| {
            let handles: Vec<_> = journeys
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|journey| self.calculate(journey, model, enrichment))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(results) => results,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }

    /// Split the result's Pinterest credit across the journey's Pinterest
    /// touchpoints by interaction type.
    pub fn pinterest_breakdown(
        &self,
        journey: &Journey,
        result: &AttributionResult,
    ) -> Vec<PinterestShare> {
        self.adjuster
            .pinterest_breakdown(journey, result.platform_score(Platform::Pinterest))
    }

    fn ensure_attributable(&self, journey: &Journey) -> EngineResult<()> {
        journey
            .validate()
            .map_err(|e| EngineError::InvalidJourney(e.to_string()))?;
        if journey.conversion().is_none() {
            return Err(EngineError::InvalidJourney(format!(
                "journey {} has no conversion",
                journey.customer_key()
            )));
        }
        Ok(())
    }

    fn finish(
        &self,
        journey: &Journey,
        weights: TouchpointWeights,
        enrichment: Option<&Enrichment>,
        model_boost: f64,
    ) -> EngineResult<AttributionResult> {
        let conversion_value = journey.conversion_value();
        let total = conversion_value.unwrap_or(1.0);
        let touchpoints = journey.attributable();

        // Weights already passed the registry's sum check; dividing out the
        // residual keeps that tolerance from scaling with the order value.
        let weight_sum = weights.sum();

        let mut platform_scores: BTreeMap<Platform, f64> = BTreeMap::new();
        let mut campaign_scores: BTreeMap<String, f64> = BTreeMap::new();
        let mut ad_scores: BTreeMap<String, f64> = BTreeMap::new();

        for (tp, weight) in touchpoints.iter().zip(&weights.weights) {
            let score = weight / weight_sum * total;
            *platform_scores.entry(tp.platform).or_default() += score;
            *campaign_scores.entry(tp.campaign_id.clone()).or_default() += score;
            if let Some(ad_id) = &tp.ad_id {
                *ad_scores.entry(ad_id.clone()).or_default() += score;
            }
        }

        let mut adjustment_applied = false;
        if let Some(enrichment) = enrichment {
            let adjusted = self.adjuster.adjust(&platform_scores, enrichment, model_boost);
            adjustment_applied = adjusted.adjustment_applied;
            platform_scores = adjusted.platform_scores;
        }

        let confidence_score = self.confidence(touchpoints.len(), weights.fell_back());

        self.check_conservation("platform_scores", total, platform_scores.values().sum())?;
        self.check_conservation("campaign_scores", total, campaign_scores.values().sum())?;

        let campaign_tiers = match &self.metadata {
            Some(provider) => campaign_scores
                .keys()
                .filter_map(|id| provider.lookup(id).map(|meta| (id.clone(), meta.budget_tier)))
                .collect(),
            None => BTreeMap::new(),
        };

        let converted_at = journey.converted_at().ok_or_else(|| {
            EngineError::InvalidJourney(format!(
                "journey {} has no conversion",
                journey.customer_key()
            ))
        })?;

        metrics::counter!("attribution.calculated").increment(1);
        if weights.fell_back() {
            metrics::counter!("attribution.fallbacks").increment(1);
        }
        if adjustment_applied {
            metrics::counter!("attribution.discovery_adjusted").increment(1);
        }

        debug!(
            customer = journey.customer_key(),
            model = %weights.model,
            total,
            confidence = confidence_score,
            adjustment_applied,
            "Attribution calculated"
        );

        Ok(AttributionResult {
            journey_customer_key: journey.customer_key().to_string(),
            model_used: weights.model,
            total_attribution: total,
            conversion_value,
            converted_at,
            discovery_score: discovery_score(&platform_scores),
            platform_scores,
            campaign_scores,
            ad_scores,
            campaign_tiers,
            confidence_score,
            adjustment_applied,
            fallback_applied: weights.fell_back(),
            touchpoint_count: touchpoints.len(),
        })
    }

    fn confidence(&self, touchpoints: usize, fell_back: bool) -> f64 {
        let engine = &self.config.engine;
        let mut confidence = engine.baseline_confidence;
        if fell_back {
            confidence -= engine.fallback_confidence_penalty;
        }
        if touchpoints < engine.low_signal_touchpoints {
            confidence -= engine.low_signal_confidence_penalty;
        }
        confidence.clamp(0.0, 1.0)
    }

    /// A mismatch here means money was miscomputed. It is reported, never
    /// corrected. The tolerance is absolute, in currency units.
    fn check_conservation(&self, scope: &str, expected: f64, actual: f64) -> EngineResult<()> {
        let tolerance = self.config.engine.conservation_tolerance;
        if !actual.is_finite() || (expected - actual).abs() > tolerance {
            error!(scope, expected, actual, "Attribution conservation violated");
            metrics::counter!("attribution.conservation_violations").increment(1);
            return Err(EngineError::ConservationViolation {
                scope: scope.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjuster::CustomerPersona;
    use crate::rates::HistoricalRateTable;
    use crate::strategy::AttributionStrategy;
    use attribution_core::{
        BudgetTier, CampaignMetadata, InteractionType, StaticCampaignMetadata, Touchpoint,
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn converted_journey(value: Option<f64>) -> Journey {
        let mut conversion = Touchpoint::new(Platform::Other, InteractionType::Conversion, "shop", at(48));
        conversion.value = value;
        Journey::from_touchpoints(
            "cust-42",
            vec![
                Touchpoint::new(Platform::Pinterest, InteractionType::Save, "pin-spring", at(0))
                    .with_pin_id("p-1")
                    .with_ad_id("ad-1"),
                Touchpoint::new(Platform::Meta, InteractionType::Impression, "meta-retarget", at(10))
                    .with_ad_id("ad-2"),
                Touchpoint::new(Platform::Pinterest, InteractionType::Click, "pin-spring", at(20)),
                Touchpoint::new(Platform::Google, InteractionType::Click, "search-brand", at(30)),
                conversion,
            ],
        )
        .unwrap()
    }

    fn calculator() -> AttributionCalculator {
        AttributionCalculator::with_defaults().unwrap()
    }

    #[test]
    fn test_linear_scales_by_conversion_value() {
        let result = calculator()
            .calculate(&converted_journey(Some(200.0)), AttributionModel::Linear, None)
            .unwrap();

        assert_eq!(result.total_attribution, 200.0);
        assert_eq!(result.conversion_value, Some(200.0));
        assert!((result.platform_score(Platform::Pinterest) - 100.0).abs() < 1e-9);
        assert!((result.platform_score(Platform::Meta) - 50.0).abs() < 1e-9);
        assert!((result.campaign_scores["pin-spring"] - 100.0).abs() < 1e-9);
        assert!((result.ad_scores["ad-1"] - 50.0).abs() < 1e-9);
        assert!(!result.adjustment_applied);
        assert_eq!(result.touchpoint_count, 4);
        assert_eq!(result.converted_at, at(48));
    }

    #[test]
    fn test_missing_value_uses_unit_total() {
        let result = calculator()
            .calculate(&converted_journey(None), AttributionModel::LastClick, None)
            .unwrap();
        assert_eq!(result.total_attribution, 1.0);
        assert_eq!(result.conversion_value, None);
        assert_eq!(result.platform_score(Platform::Google), 1.0);
    }

    #[test]
    fn test_conservation_for_all_models() {
        let calc = calculator();
        let journey = converted_journey(Some(137.45));
        let enrichment = Enrichment::with_keywords(["spring outfits"]);
        for model in AttributionModel::ALL {
            for enrichment in [None, Some(&enrichment)] {
                let result = calc.calculate(&journey, model, enrichment).unwrap();
                assert!((result.platform_total() - result.total_attribution).abs() < 1e-6);
                assert!((result.campaign_total() - result.total_attribution).abs() < 1e-6);
                assert_eq!(result.total_attribution, 137.45);
            }
        }
    }

    #[test]
    fn test_unconverted_journey_rejected() {
        let journey = Journey::from_touchpoints(
            "cust-1",
            vec![Touchpoint::new(Platform::Meta, InteractionType::Click, "c", at(0))],
        )
        .unwrap();
        let err = calculator()
            .calculate(&journey, AttributionModel::Linear, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidJourney(_)));
    }

    #[test]
    fn test_unknown_model_id_rejected() {
        let err = calculator()
            .calculate_by_id(&converted_journey(Some(10.0)), "w_shaped", None)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownModel(_)));
    }

    #[test]
    fn test_calculate_by_id_accepts_ensemble() {
        let result = calculator()
            .calculate_by_id(&converted_journey(Some(10.0)), "ensemble", None)
            .unwrap();
        assert_eq!(result.model_used, ModelSelection::Ensemble);
        assert!((result.platform_total() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_baseline_and_fallback() {
        let calc = calculator();
        let journey = converted_journey(Some(50.0));

        let linear = calc.calculate(&journey, AttributionModel::Linear, None).unwrap();
        assert!((linear.confidence_score - 0.85).abs() < 1e-12);
        assert!(!linear.fallback_applied);

        let data_driven = calc.calculate(&journey, AttributionModel::DataDriven, None).unwrap();
        assert!(data_driven.fallback_applied);
        assert!(linear.confidence_score - data_driven.confidence_score >= 0.15 - 1e-12);
        assert_eq!(data_driven.platform_scores, linear.platform_scores);
    }

    #[test]
    fn test_data_driven_with_table_keeps_confidence() {
        let registry = ModelRegistry::new(Arc::new(AppConfig::default()))
            .unwrap()
            .with_rate_table(
                HistoricalRateTable::new(0.05)
                    .with_platform_rate(Platform::Pinterest, 0.15)
                    .with_platform_rate(Platform::Meta, 0.12)
                    .with_platform_rate(Platform::Google, 0.18),
            );
        let result = AttributionCalculator::new(registry)
            .calculate(&converted_journey(Some(50.0)), AttributionModel::DataDriven, None)
            .unwrap();
        assert!(!result.fallback_applied);
        assert!((result.confidence_score - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_single_touchpoint_is_low_signal() {
        let journey = Journey::from_touchpoints(
            "cust-1",
            vec![
                Touchpoint::new(Platform::Tiktok, InteractionType::Click, "tt", at(0)),
                Touchpoint::conversion(Platform::Tiktok, "tt", at(1), 30.0),
            ],
        )
        .unwrap();
        let calc = calculator();
        let result = calc.calculate(&journey, AttributionModel::FirstClick, None).unwrap();
        assert!((result.confidence_score - 0.75).abs() < 1e-12);

        let both = calc.calculate(&journey, AttributionModel::DataDriven, None).unwrap();
        assert!((both.confidence_score - 0.60).abs() < 1e-12);
    }

    #[test]
    fn test_enrichment_shifts_credit_to_pinterest() {
        let calc = calculator();
        let journey = converted_journey(Some(100.0));
        let plain = calc.calculate(&journey, AttributionModel::Linear, None).unwrap();

        let enrichment = Enrichment::with_keywords(["capsule wardrobe"]).with_persona(CustomerPersona {
            persona_name: None,
            interests: vec!["fashion".to_string()],
            age_ranges: vec![],
        });
        let boosted = calc
            .calculate(&journey, AttributionModel::Linear, Some(&enrichment))
            .unwrap();

        assert!(boosted.adjustment_applied);
        assert!(boosted.platform_score(Platform::Pinterest) > plain.platform_score(Platform::Pinterest));
        assert!(boosted.platform_score(Platform::Meta) < plain.platform_score(Platform::Meta));
        assert!((boosted.platform_total() - 100.0).abs() < 1e-9);
        assert_eq!(boosted.campaign_scores, plain.campaign_scores);
        // Pinterest already holds half the credit, so the score is capped.
        assert_eq!(plain.discovery_score, 1.0);
        assert_eq!(boosted.discovery_score, 1.0);
    }

    #[test]
    fn test_enrichment_raises_uncapped_discovery_score() {
        let journey = Journey::from_touchpoints(
            "cust-7",
            vec![
                Touchpoint::new(Platform::Pinterest, InteractionType::Save, "pin-spring", at(0)),
                Touchpoint::new(Platform::Meta, InteractionType::Impression, "meta-retarget", at(5)),
                Touchpoint::new(Platform::Tiktok, InteractionType::Click, "tt-hauls", at(10)),
                Touchpoint::new(Platform::Google, InteractionType::Click, "search-brand", at(15)),
                Touchpoint::conversion(Platform::Other, "shop", at(20), 100.0),
            ],
        )
        .unwrap();
        let calc = calculator();
        let plain = calc.calculate(&journey, AttributionModel::Linear, None).unwrap();
        let boosted = calc
            .calculate(&journey, AttributionModel::Linear, Some(&Enrichment::with_keywords(["linen"])))
            .unwrap();

        assert!((plain.discovery_score - 0.5).abs() < 1e-12);
        assert!(boosted.discovery_score > plain.discovery_score);
        assert!(boosted.discovery_score < 1.0);
    }

    #[test]
    fn test_model_platform_boost_applies_to_pinterest() {
        let mut config = AppConfig::default();
        config
            .models
            .linear
            .platform_boost
            .insert(Platform::Pinterest, 1.5);
        let calc = AttributionCalculator::new(ModelRegistry::new(Arc::new(config)).unwrap());
        let journey = converted_journey(Some(100.0));

        let enrichment = Enrichment::with_keywords(["x"]);
        let boosted = calc
            .calculate(&journey, AttributionModel::Linear, Some(&enrichment))
            .unwrap();
        // Pinterest 50 * 1.8 = 90 against 50 elsewhere, rescaled to 100.
        assert!((boosted.platform_score(Platform::Pinterest) - 100.0 * 90.0 / 140.0).abs() < 1e-9);

        let unboosted = calc.calculate(&journey, AttributionModel::Linear, None).unwrap();
        assert!((unboosted.platform_score(Platform::Pinterest) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_campaign_tiers_from_metadata() {
        let provider = StaticCampaignMetadata::new([CampaignMetadata {
            campaign_id: "pin-spring".to_string(),
            platform: Platform::Pinterest,
            name: Some("Spring Collection".to_string()),
            budget_tier: BudgetTier::High,
        }]);
        let calc = calculator().with_metadata_provider(Arc::new(provider));
        let result = calc
            .calculate(&converted_journey(Some(10.0)), AttributionModel::Linear, None)
            .unwrap();
        assert_eq!(result.campaign_tiers.len(), 1);
        assert_eq!(result.campaign_tiers["pin-spring"], BudgetTier::High);
    }

    #[test]
    fn test_compare_models_runs_all_seven() {
        let results = calculator()
            .compare_models(&converted_journey(Some(10.0)), None)
            .unwrap();
        assert_eq!(results.len(), 7);
        assert_eq!(
            results[&AttributionModel::FirstClick].platform_score(Platform::Pinterest),
            10.0
        );
    }

    #[test]
    fn test_discovery_insight_over_all_models() {
        let insight = calculator()
            .discovery_insight(&converted_journey(Some(60.0)), None)
            .unwrap();
        assert_eq!(insight.pinterest_share_by_model.len(), 7);
        assert_eq!(insight.pinterest_share_by_model[&AttributionModel::FirstClick], 1.0);
        assert_eq!(insight.pinterest_share_by_model[&AttributionModel::LastClick], 0.0);
        assert_eq!(insight.strategy, crate::insight::DiscoveryStrategy::IncreaseBudget);
    }

    #[test]
    fn test_batch_preserves_order() {
        let calc = calculator();
        let journeys: Vec<Journey> = (0..25)
            .map(|i| {
                Journey::from_touchpoints(
                    format!("cust-{i}"),
                    vec![
                        Touchpoint::new(Platform::Meta, InteractionType::Click, "m", at(0)),
                        Touchpoint::conversion(Platform::Meta, "m", at(1), i as f64),
                    ],
                )
                .unwrap()
            })
            .collect();

        let results = calc.calculate_batch(&journeys, AttributionModel::Linear, None, 4);
        assert_eq!(results.len(), 25);
        for (i, result) in results.into_iter().enumerate() {
            let result = result.unwrap();
            assert_eq!(result.journey_customer_key, format!("cust-{i}"));
            assert_eq!(result.total_attribution, i as f64);
        }
    }

    #[test]
    fn test_invalid_strategy_output_surfaces() {
        struct Broken;
        impl AttributionStrategy for Broken {
            fn predict(&self, journey: &Journey) -> Vec<f64> {
                vec![1.0; journey.attributable().len()]
            }
            fn strategy_name(&self) -> &str {
                "broken"
            }
        }

        let registry = ModelRegistry::new(Arc::new(AppConfig::default()))
            .unwrap()
            .with_strategy(Arc::new(Broken));
        let err = AttributionCalculator::new(registry)
            .calculate(&converted_journey(Some(10.0)), AttributionModel::MachineLearning, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidModelOutput { .. }));
    }

    struct SlightlyOff;

    impl AttributionStrategy for SlightlyOff {
        fn predict(&self, journey: &Journey) -> Vec<f64> {
            let mut weights = vec![0.0; journey.attributable().len()];
            weights[0] = 0.5;
            weights[1] = 0.5 + 9e-7;
            weights
        }
        fn strategy_name(&self) -> &str {
            "slightly_off"
        }
    }

    #[test]
    fn test_large_order_conserves_within_absolute_tolerance() {
        let registry = ModelRegistry::new(Arc::new(AppConfig::default()))
            .unwrap()
            .with_strategy(Arc::new(SlightlyOff));
        let calc = AttributionCalculator::new(registry);
        let journey = converted_journey(Some(1_000_000.0));

        let result = calc
            .calculate(&journey, AttributionModel::MachineLearning, None)
            .unwrap();
        assert_eq!(result.total_attribution, 1_000_000.0);
        assert!((result.platform_total() - 1_000_000.0).abs() <= 1e-6);
        assert!((result.campaign_total() - 1_000_000.0).abs() <= 1e-6);

        let enrichment = Enrichment::with_keywords(["capsule wardrobe"]);
        let adjusted = calc
            .calculate(&journey, AttributionModel::MachineLearning, Some(&enrichment))
            .unwrap();
        assert!((adjusted.platform_total() - 1_000_000.0).abs() <= 1e-6);
    }

    #[test]
    fn test_conservation_tolerance_does_not_scale_with_value() {
        let calc = calculator();
        assert!(calc
            .check_conservation("platform_scores", 1_000_000.0, 1_000_000.0 + 5e-7)
            .is_ok());
        let err = calc
            .check_conservation("platform_scores", 1_000_000.0, 1_000_000.9)
            .unwrap_err();
        assert!(matches!(err, EngineError::ConservationViolation { .. }));
        assert!(calc
            .check_conservation("campaign_scores", 10.0, f64::NAN)
            .is_err());
    }

    #[test]
    fn test_pinterest_breakdown_sums_to_platform_score() {
        let calc = calculator();
        let journey = converted_journey(Some(100.0));
        let result = calc.calculate(&journey, AttributionModel::Linear, None).unwrap();
        let shares = calc.pinterest_breakdown(&journey, &result);
        let total: f64 = shares.iter().map(|s| s.score).sum();
        assert!((total - result.platform_score(Platform::Pinterest)).abs() < 1e-9);
        // Save (0.3) vs click (0.4).
        assert!((shares[0].score - 50.0 * 0.3 / 0.7).abs() < 1e-9);
    }
}
