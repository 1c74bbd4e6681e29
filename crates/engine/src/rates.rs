//! Historical conversion rates for data-driven attribution.

use std::collections::BTreeMap;

use attribution_core::Platform;
use serde::{Deserialize, Serialize};

/// Where a touchpoint sits in the attributable part of a journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyPosition {
    /// The journey has a single attributable touchpoint.
    Only,
    First,
    Middle,
    Last,
}

impl JourneyPosition {
    pub fn of(index: usize, len: usize) -> Self {
        if len <= 1 {
            JourneyPosition::Only
        } else if index == 0 {
            JourneyPosition::First
        } else if index + 1 == len {
            JourneyPosition::Last
        } else {
            JourneyPosition::Middle
        }
    }
}

/// Conversion rates observed for journeys that contained a platform at a
/// given position, compared against a baseline rate for journeys without
/// it. Lookups fall back from position-specific to platform-wide rates,
/// then to the baseline (zero lift).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRateTable {
    pub baseline_rate: f64,
    #[serde(default)]
    pub platform_rates: BTreeMap<Platform, f64>,
    #[serde(default)]
    pub position_rates: BTreeMap<Platform, BTreeMap<JourneyPosition, f64>>,
}

impl HistoricalRateTable {
    pub fn new(baseline_rate: f64) -> Self {
        Self {
            baseline_rate,
            ..Default::default()
        }
    }

    pub fn with_platform_rate(mut self, platform: Platform, rate: f64) -> Self {
        self.platform_rates.insert(platform, rate);
        self
    }

    pub fn with_position_rate(
        mut self,
        platform: Platform,
        position: JourneyPosition,
        rate: f64,
    ) -> Self {
        self.position_rates
            .entry(platform)
            .or_default()
            .insert(position, rate);
        self
    }

    pub fn rate(&self, platform: Platform, position: JourneyPosition) -> f64 {
        self.position_rates
            .get(&platform)
            .and_then(|positions| positions.get(&position))
            .or_else(|| self.platform_rates.get(&platform))
            .copied()
            .unwrap_or(self.baseline_rate)
    }

    /// Conversion-rate lift over baseline, floored at zero.
    pub fn lift(&self, platform: Platform, position: JourneyPosition) -> f64 {
        let lift = self.rate(platform, position) - self.baseline_rate;
        if lift.is_finite() {
            lift.max(0.0)
        } else {
            0.0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.platform_rates.is_empty() && self.position_rates.is_empty()
    }
}
