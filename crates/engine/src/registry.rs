//! Attribution model registry: pure per-touchpoint weighting for each of
//! the seven models, with every model's output checked before use.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use attribution_core::{
    AppConfig, AttributionModel, EngineError, EngineResult, Journey, ModelSelection, Touchpoint,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::rates::{HistoricalRateTable, JourneyPosition};
use crate::strategy::AttributionStrategy;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Why a model could not run as requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// data_driven was requested but no rate table is loaded.
    NoRateTable,
    /// The rate table shows no positive lift for any touchpoint.
    NoPositiveLift,
    /// machine_learning was requested but no strategy is registered.
    NoStrategy,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            FallbackReason::NoRateTable => "no historical rate table",
            FallbackReason::NoPositiveLift => "no positive conversion lift",
            FallbackReason::NoStrategy => "no scoring strategy registered",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fallback {
    pub from: AttributionModel,
    pub to: AttributionModel,
    pub reason: FallbackReason,
}

/// Normalized credit per attributable touchpoint, in journey order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchpointWeights {
    pub model: ModelSelection,
    pub weights: Vec<f64>,
    #[serde(default)]
    pub fallbacks: Vec<Fallback>,
}

impl TouchpointWeights {
    fn new(model: impl Into<ModelSelection>, weights: Vec<f64>) -> Self {
        Self {
            model: model.into(),
            weights,
            fallbacks: Vec::new(),
        }
    }

    pub fn fell_back(&self) -> bool {
        !self.fallbacks.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Weights keyed by touchpoint index.
    pub fn as_map(&self) -> BTreeMap<usize, f64> {
        self.weights.iter().copied().enumerate().collect()
    }
}

/// Maps model identifiers to their scoring rules. Holds only immutable,
/// initialization-time state and can be shared freely across threads.
#[derive(Clone)]
pub struct ModelRegistry {
    config: Arc<AppConfig>,
    rates: Option<Arc<HistoricalRateTable>>,
    strategy: Option<Arc<dyn AttributionStrategy>>,
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("rates", &self.rates.is_some())
            .field(
                "strategy",
                &self.strategy.as_ref().map(|s| s.strategy_name().to_string()),
            )
            .finish()
    }
}

impl ModelRegistry {
    pub fn new(config: Arc<AppConfig>) -> EngineResult<Self> {
        config.validate()?;
        info!(
            half_life_days = config.engine.time_decay_half_life_days,
            baseline_confidence = config.engine.baseline_confidence,
            "Attribution model registry initialized"
        );
        Ok(Self {
            config,
            rates: None,
            strategy: None,
        })
    }

    pub fn with_rate_table(mut self, table: HistoricalRateTable) -> Self {
        if table.is_empty() {
            warn!("Rate table has no platform rates, data_driven will fall back to linear");
        }
        self.rates = Some(Arc::new(table));
        self
    }

    pub fn with_strategy(mut self, strategy: Arc<dyn AttributionStrategy>) -> Self {
        info!(strategy = strategy.strategy_name(), "Machine learning strategy registered");
        self.strategy = Some(strategy);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn shared_config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    pub fn has_rate_table(&self) -> bool {
        self.rates.is_some()
    }

    pub fn has_strategy(&self) -> bool {
        self.strategy.is_some()
    }

    /// Score by textual model identifier.
    pub fn score_by_id(&self, journey: &Journey, model_id: &str) -> EngineResult<TouchpointWeights> {
        self.score(journey, model_id.parse()?)
    }

    /// Per-touchpoint weights for `model`, checked to sum to 1.
    pub fn score(&self, journey: &Journey, model: AttributionModel) -> EngineResult<TouchpointWeights> {
        let touchpoints = journey.attributable();
        if touchpoints.is_empty() {
            return Err(EngineError::InvalidJourney(format!(
                "journey {} has no touchpoints before the conversion",
                journey.customer_key()
            )));
        }

        let scored = match model {
            AttributionModel::FirstClick => TouchpointWeights::new(model, first_click(touchpoints.len())),
            AttributionModel::LastClick => TouchpointWeights::new(model, last_click(touchpoints.len())),
            AttributionModel::Linear => TouchpointWeights::new(model, linear(touchpoints.len())),
            AttributionModel::TimeDecay => {
                let reference = journey
                    .converted_at()
                    .unwrap_or(touchpoints[touchpoints.len() - 1].timestamp);
                let weights = time_decay(
                    touchpoints,
                    reference,
                    self.config.engine.time_decay_half_life_days,
                );
                TouchpointWeights::new(model, weights)
            }
            AttributionModel::PositionBased => TouchpointWeights::new(
                model,
                position_based(
                    touchpoints.len(),
                    self.config.engine.position_first_share,
                    self.config.engine.position_last_share,
                ),
            ),
            AttributionModel::DataDriven => self.data_driven(journey),
            AttributionModel::MachineLearning => self.machine_learning(journey),
        };

        self.check_weights(&scored, touchpoints.len())?;
        debug!(
            customer = journey.customer_key(),
            model = %model,
            touchpoints = touchpoints.len(),
            fallback = scored.fell_back(),
            "Model scored"
        );
        Ok(scored)
    }

    /// Blend every model by its configured ensemble weight.
    pub fn score_ensemble(&self, journey: &Journey) -> EngineResult<TouchpointWeights> {
        let n = journey.attributable().len();
        let mut blended = vec![0.0; n];
        let mut fallbacks = Vec::new();
        let mut total_weight = 0.0;

        for model in AttributionModel::ALL {
            let weight = self.config.models.settings(model).weight;
            if weight <= 0.0 {
                continue;
            }
            let scored = self.score(journey, model)?;
            for (acc, w) in blended.iter_mut().zip(&scored.weights) {
                *acc += weight * w;
            }
            for fallback in scored.fallbacks {
                if !fallbacks.contains(&fallback) {
                    fallbacks.push(fallback);
                }
            }
            total_weight += weight;
        }

        if total_weight <= 0.0 {
            return Err(EngineError::Config(
                "ensemble requires at least one model with a positive weight".to_string(),
            ));
        }
        for w in &mut blended {
            *w /= total_weight;
        }

        let scored = TouchpointWeights {
            model: ModelSelection::Ensemble,
            weights: blended,
            fallbacks,
        };
        self.check_weights(&scored, n)?;
        Ok(scored)
    }

    fn data_driven(&self, journey: &Journey) -> TouchpointWeights {
        let touchpoints = journey.attributable();
        let n = touchpoints.len();

        let Some(rates) = self.rates.as_deref() else {
            warn!(
                customer = journey.customer_key(),
                "No historical rate table, data_driven falls back to linear"
            );
            return linear_fallback(AttributionModel::DataDriven, n, FallbackReason::NoRateTable);
        };

        let factors = &self.config.data_driven.interaction_factors;
        let contributions: Vec<f64> = touchpoints
            .iter()
            .enumerate()
            .map(|(i, tp)| {
                rates.lift(tp.platform, JourneyPosition::of(i, n)) * factors.weight(tp.interaction_type)
            })
            .collect();

        let total: f64 = contributions.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            warn!(
                customer = journey.customer_key(),
                "Rate table shows no lift for this journey, data_driven falls back to linear"
            );
            return linear_fallback(AttributionModel::DataDriven, n, FallbackReason::NoPositiveLift);
        }

        TouchpointWeights::new(
            AttributionModel::DataDriven,
            contributions.into_iter().map(|c| c / total).collect(),
        )
    }

    fn machine_learning(&self, journey: &Journey) -> TouchpointWeights {
        match self.strategy.as_deref() {
            Some(strategy) => {
                TouchpointWeights::new(AttributionModel::MachineLearning, strategy.predict(journey))
            }
            None => {
                warn!(
                    customer = journey.customer_key(),
                    "No scoring strategy registered, machine_learning falls back to data_driven"
                );
                let mut scored = self.data_driven(journey);
                scored.model = AttributionModel::MachineLearning.into();
                scored.fallbacks.insert(
                    0,
                    Fallback {
                        from: AttributionModel::MachineLearning,
                        to: AttributionModel::DataDriven,
                        reason: FallbackReason::NoStrategy,
                    },
                );
                scored
            }
        }
    }

    /// Model output is never trusted: length, sign and sum are checked
    /// after every call.
    fn check_weights(&self, scored: &TouchpointWeights, expected_len: usize) -> EngineResult<()> {
        let tolerance = self.config.engine.weight_tolerance;
        let reason = if scored.weights.len() != expected_len {
            Some(format!(
                "expected {expected_len} weights, got {}",
                scored.weights.len()
            ))
        } else if let Some((i, w)) = scored
            .weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < -tolerance)
        {
            Some(format!("weight {i} is {w}"))
        } else {
            let sum = scored.sum();
            ((sum - 1.0).abs() > tolerance).then(|| format!("weights sum to {sum}, not 1.0"))
        };

        match reason {
            Some(reason) => {
                error!(model = %scored.model, %reason, "Model output rejected");
                metrics::counter!("attribution.invalid_model_output").increment(1);
                Err(EngineError::InvalidModelOutput {
                    model: scored.model.to_string(),
                    reason,
                })
            }
            None => Ok(()),
        }
    }
}

fn linear_fallback(from: AttributionModel, n: usize, reason: FallbackReason) -> TouchpointWeights {
    TouchpointWeights {
        model: from.into(),
        weights: linear(n),
        fallbacks: vec![Fallback {
            from,
            to: AttributionModel::Linear,
            reason,
        }],
    }
}

fn first_click(n: usize) -> Vec<f64> {
    let mut weights = vec![0.0; n];
    weights[0] = 1.0;
    weights
}

fn last_click(n: usize) -> Vec<f64> {
    let mut weights = vec![0.0; n];
    weights[n - 1] = 1.0;
    weights
}

fn linear(n: usize) -> Vec<f64> {
    vec![1.0 / n as f64; n]
}

/// Weight ∝ 2^(-Δt / half_life). Ages are measured relative to the most
/// recent touchpoint so that very old journeys cannot underflow to zero;
/// the shift cancels out in normalization.
fn time_decay(touchpoints: &[Touchpoint], reference: DateTime<Utc>, half_life_days: f64) -> Vec<f64> {
    let ages: Vec<f64> = touchpoints
        .iter()
        .map(|tp| (reference - tp.timestamp).num_milliseconds().max(0) as f64 / MILLIS_PER_DAY)
        .collect();
    let youngest = ages.iter().copied().fold(f64::INFINITY, f64::min);

    let raw: Vec<f64> = ages
        .iter()
        .map(|age| (-(age - youngest) / half_life_days).exp2())
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

/// First and last get their configured shares, the middle splits the
/// rest. With two or fewer touchpoints the unused middle share is handed
/// back proportionally.
fn position_based(n: usize, first_share: f64, last_share: f64) -> Vec<f64> {
    match n {
        1 => vec![1.0],
        2 => {
            let ends = first_share + last_share;
            if ends <= 0.0 {
                linear(2)
            } else {
                vec![first_share / ends, last_share / ends]
            }
        }
        _ => {
            let middle = (1.0 - first_share - last_share).max(0.0) / (n - 2) as f64;
            let mut weights = vec![middle; n];
            weights[0] = first_share;
            weights[n - 1] = last_share;
            let total: f64 = weights.iter().sum();
            weights.into_iter().map(|w| w / total).collect()
        }
    }
}
