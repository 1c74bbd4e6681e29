use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::model::AttributionModel;
use crate::touchpoint::{InteractionType, Platform};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Root engine configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `ATTRIBUTION__`.
///
/// Constructed once at startup and shared read-only by the registry,
/// adjuster and calculator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub data_driven: DataDrivenConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_half_life_days")]
    pub time_decay_half_life_days: f64,
    #[serde(default = "default_attribution_window_days")]
    pub attribution_window_days: u32,
    #[serde(default = "default_baseline_confidence")]
    pub baseline_confidence: f64,
    #[serde(default = "default_fallback_penalty")]
    pub fallback_confidence_penalty: f64,
    #[serde(default = "default_low_signal_penalty")]
    pub low_signal_confidence_penalty: f64,
    /// Journeys with fewer attributable touchpoints than this are low-signal.
    #[serde(default = "default_low_signal_touchpoints")]
    pub low_signal_touchpoints: usize,
    #[serde(default = "default_tolerance")]
    pub weight_tolerance: f64,
    #[serde(default = "default_tolerance")]
    pub conservation_tolerance: f64,
    #[serde(default = "default_position_share")]
    pub position_first_share: f64,
    #[serde(default = "default_position_share")]
    pub position_last_share: f64,
}

/// Per-model ensemble weight and platform boost table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    pub weight: f64,
    #[serde(default)]
    pub platform_boost: BTreeMap<Platform, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_first_click")]
    pub first_click: ModelSettings,
    #[serde(default = "default_last_click")]
    pub last_click: ModelSettings,
    #[serde(default = "default_linear")]
    pub linear: ModelSettings,
    #[serde(default = "default_time_decay")]
    pub time_decay: ModelSettings,
    #[serde(default = "default_position_based")]
    pub position_based: ModelSettings,
    #[serde(default = "default_data_driven")]
    pub data_driven: ModelSettings,
    #[serde(default = "default_machine_learning")]
    pub machine_learning: ModelSettings,
}

/// Weights for the four pre-conversion interaction types.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionWeights {
    pub impression: f64,
    pub save: f64,
    pub closeup: f64,
    pub click: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_trending_boost")]
    pub trending_keyword_boost: f64,
    #[serde(default = "default_persona_boost")]
    pub persona_interest_boost: f64,
    #[serde(default = "default_discovery_weights")]
    pub interaction_weights: InteractionWeights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataDrivenConfig {
    #[serde(default = "default_interaction_factors")]
    pub interaction_factors: InteractionWeights,
}

// Default functions
fn default_half_life_days() -> f64 {
    7.0
}
fn default_attribution_window_days() -> u32 {
    30
}
fn default_baseline_confidence() -> f64 {
    0.85
}
fn default_fallback_penalty() -> f64 {
    0.15
}
fn default_low_signal_penalty() -> f64 {
    0.10
}
fn default_low_signal_touchpoints() -> usize {
    2
}
fn default_tolerance() -> f64 {
    1e-6
}
fn default_position_share() -> f64 {
    0.4
}
fn default_trending_boost() -> f64 {
    0.2
}
fn default_persona_boost() -> f64 {
    0.1
}
fn default_discovery_weights() -> InteractionWeights {
    InteractionWeights {
        impression: 0.1,
        save: 0.3,
        closeup: 0.2,
        click: 0.4,
    }
}
fn default_interaction_factors() -> InteractionWeights {
    InteractionWeights {
        impression: 0.3,
        save: 0.8,
        closeup: 0.7,
        click: 1.0,
    }
}

fn settings(weight: f64) -> ModelSettings {
    ModelSettings {
        weight,
        platform_boost: BTreeMap::new(),
    }
}
fn default_first_click() -> ModelSettings {
    settings(0.3)
}
fn default_last_click() -> ModelSettings {
    settings(0.4)
}
fn default_linear() -> ModelSettings {
    settings(0.2)
}
fn default_time_decay() -> ModelSettings {
    settings(0.3)
}
fn default_position_based() -> ModelSettings {
    settings(0.25)
}
fn default_data_driven() -> ModelSettings {
    settings(0.35)
}
fn default_machine_learning() -> ModelSettings {
    settings(0.4)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_decay_half_life_days: default_half_life_days(),
            attribution_window_days: default_attribution_window_days(),
            baseline_confidence: default_baseline_confidence(),
            fallback_confidence_penalty: default_fallback_penalty(),
            low_signal_confidence_penalty: default_low_signal_penalty(),
            low_signal_touchpoints: default_low_signal_touchpoints(),
            weight_tolerance: default_tolerance(),
            conservation_tolerance: default_tolerance(),
            position_first_share: default_position_share(),
            position_last_share: default_position_share(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            first_click: default_first_click(),
            last_click: default_last_click(),
            linear: default_linear(),
            time_decay: default_time_decay(),
            position_based: default_position_based(),
            data_driven: default_data_driven(),
            machine_learning: default_machine_learning(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            trending_keyword_boost: default_trending_boost(),
            persona_interest_boost: default_persona_boost(),
            interaction_weights: default_discovery_weights(),
        }
    }
}

impl Default for DataDrivenConfig {
    fn default() -> Self {
        Self {
            interaction_factors: default_interaction_factors(),
        }
    }
}

impl ModelsConfig {
    pub fn settings(&self, model: AttributionModel) -> &ModelSettings {
        match model {
            AttributionModel::FirstClick => &self.first_click,
            AttributionModel::LastClick => &self.last_click,
            AttributionModel::Linear => &self.linear,
            AttributionModel::TimeDecay => &self.time_decay,
            AttributionModel::PositionBased => &self.position_based,
            AttributionModel::DataDriven => &self.data_driven,
            AttributionModel::MachineLearning => &self.machine_learning,
        }
    }
}

impl ModelSettings {
    /// Boost multiplier for `platform`; 1.0 when none is configured.
    pub fn boost_for(&self, platform: Platform) -> f64 {
        self.platform_boost.get(&platform).copied().unwrap_or(1.0)
    }
}

impl InteractionWeights {
    /// Weight for an interaction type. Conversions carry no weight.
    pub fn weight(&self, interaction: InteractionType) -> f64 {
        match interaction {
            InteractionType::Impression => self.impression,
            InteractionType::Save => self.save,
            InteractionType::Closeup => self.closeup,
            InteractionType::Click => self.click,
            InteractionType::Conversion => 0.0,
        }
    }

    pub fn sum(&self) -> f64 {
        self.impression + self.save + self.closeup + self.click
    }

    fn all_non_negative(&self) -> bool {
        [self.impression, self.save, self.closeup, self.click]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

impl AppConfig {
    /// Load configuration from an optional file and environment variables.
    pub fn load(path: Option<&str>) -> EngineResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("ATTRIBUTION")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot honour.
    pub fn validate(&self) -> EngineResult<()> {
        let engine = &self.engine;
        if !(engine.time_decay_half_life_days.is_finite() && engine.time_decay_half_life_days > 0.0)
        {
            return Err(EngineError::Config(
                "time_decay_half_life_days must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("baseline_confidence", engine.baseline_confidence),
            ("fallback_confidence_penalty", engine.fallback_confidence_penalty),
            ("low_signal_confidence_penalty", engine.low_signal_confidence_penalty),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Config(format!("{name} must be within [0, 1]")));
            }
        }
        for (name, value) in [
            ("weight_tolerance", engine.weight_tolerance),
            ("conservation_tolerance", engine.conservation_tolerance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::Config(format!(
                    "{name} must be a positive finite number"
                )));
            }
        }
        let first = engine.position_first_share;
        let last = engine.position_last_share;
        if first < 0.0 || last < 0.0 || first + last > 1.0 + WEIGHT_SUM_TOLERANCE {
            return Err(EngineError::Config(
                "position shares must be non-negative and sum to at most 1".to_string(),
            ));
        }

        for model in AttributionModel::ALL {
            let settings = self.models.settings(model);
            if !(settings.weight.is_finite() && settings.weight >= 0.0) {
                return Err(EngineError::Config(format!(
                    "{model} ensemble weight must be non-negative"
                )));
            }
            if let Some((platform, boost)) = settings
                .platform_boost
                .iter()
                .find(|(_, b)| !(b.is_finite() && **b >= 1.0))
            {
                return Err(EngineError::Config(format!(
                    "{model} platform boost for {platform} is {boost}, must be >= 1.0"
                )));
            }
        }
        let ensemble_total: f64 = AttributionModel::ALL
            .iter()
            .map(|model| self.models.settings(*model).weight)
            .sum();
        if ensemble_total <= 0.0 {
            return Err(EngineError::Config(
                "at least one model needs a positive ensemble weight".to_string(),
            ));
        }

        let weights = &self.discovery.interaction_weights;
        if !weights.all_non_negative() || (weights.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(EngineError::Config(
                "discovery interaction weights must be non-negative and sum to 1.0".to_string(),
            ));
        }
        if self.discovery.trending_keyword_boost < 0.0 || self.discovery.persona_interest_boost < 0.0
        {
            return Err(EngineError::Config(
                "discovery boosts must be non-negative".to_string(),
            ));
        }
        if !self.data_driven.interaction_factors.all_non_negative() {
            return Err(EngineError::Config(
                "data-driven interaction factors must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
