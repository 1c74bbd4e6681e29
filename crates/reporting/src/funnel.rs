//! Funnel analysis: progression from impression to purchase.
//!
//! Every rate is a ratio of two counts. An empty denominator yields a rate
//! of zero rather than an error, so a campaign with no delivery simply
//! reports a flat funnel.

use serde::{Deserialize, Serialize};

/// Raw stage counts feeding a funnel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelCounts {
    pub impressions: u64,
    pub clicks: u64,
    pub saves: u64,
    pub purchases: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStepResult {
    pub step_name: String,
    pub entered: u64,
    pub completed: u64,
    pub dropped_off: u64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelResult {
    pub steps: Vec<FunnelStepResult>,
    pub impression_to_click: f64,
    pub click_to_save: f64,
    pub save_to_purchase: f64,
    /// Purchases per impression.
    pub overall_conversion_rate: f64,
    /// Purchases per click.
    pub funnel_efficiency: f64,
}

impl FunnelResult {
    pub fn from_counts(counts: FunnelCounts) -> Self {
        let stages = [
            ("impression_to_click", counts.impressions, counts.clicks),
            ("click_to_save", counts.clicks, counts.saves),
            ("save_to_purchase", counts.saves, counts.purchases),
        ];

        let steps: Vec<FunnelStepResult> = stages
            .iter()
            .map(|&(name, entered, completed)| FunnelStepResult {
                step_name: name.to_string(),
                entered,
                completed,
                // Saves can outnumber clicks on Pinterest, so a stage may
                // complete more than entered.
                dropped_off: entered.saturating_sub(completed),
                conversion_rate: ratio(completed, entered),
            })
            .collect();

        Self {
            impression_to_click: steps[0].conversion_rate,
            click_to_save: steps[1].conversion_rate,
            save_to_purchase: steps[2].conversion_rate,
            overall_conversion_rate: ratio(counts.purchases, counts.impressions),
            funnel_efficiency: ratio(counts.purchases, counts.clicks),
            steps,
        }
    }
}

/// `numerator / denominator`, or 0.0 when the denominator is zero.
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// `numerator / denominator`, or `None` when the denominator is zero.
/// Used where a missing value and a true zero must stay distinct (ROAS).
pub fn ratio_or_none(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_funnel_rates() {
        let funnel = FunnelResult::from_counts(FunnelCounts {
            impressions: 10_000,
            clicks: 200,
            saves: 50,
            purchases: 5,
        });
        assert!((funnel.impression_to_click - 0.02).abs() < 1e-12);
        assert!((funnel.click_to_save - 0.25).abs() < 1e-12);
        assert!((funnel.save_to_purchase - 0.1).abs() < 1e-12);
        assert!((funnel.overall_conversion_rate - 0.0005).abs() < 1e-12);
        assert!((funnel.funnel_efficiency - 0.025).abs() < 1e-12);

        assert_eq!(funnel.steps.len(), 3);
        assert_eq!(funnel.steps[0].dropped_off, 9_800);
        assert_eq!(funnel.steps[2].completed, 5);
    }

    #[test]
    fn test_empty_funnel_is_zero_not_error() {
        let funnel = FunnelResult::from_counts(FunnelCounts::default());
        assert_eq!(funnel.impression_to_click, 0.0);
        assert_eq!(funnel.click_to_save, 0.0);
        assert_eq!(funnel.save_to_purchase, 0.0);
        assert_eq!(funnel.overall_conversion_rate, 0.0);
        assert!(funnel.steps.iter().all(|s| s.dropped_off == 0));
    }

    #[test]
    fn test_each_stage_guarded_independently() {
        // No saves recorded, but clicks and purchases exist.
        let funnel = FunnelResult::from_counts(FunnelCounts {
            impressions: 1_000,
            clicks: 40,
            saves: 0,
            purchases: 3,
        });
        assert!((funnel.impression_to_click - 0.04).abs() < 1e-12);
        assert_eq!(funnel.click_to_save, 0.0);
        assert_eq!(funnel.save_to_purchase, 0.0);
        assert!((funnel.funnel_efficiency - 0.075).abs() < 1e-12);
    }

    #[test]
    fn test_saves_exceeding_clicks() {
        let funnel = FunnelResult::from_counts(FunnelCounts {
            impressions: 500,
            clicks: 10,
            saves: 30,
            purchases: 1,
        });
        assert!((funnel.click_to_save - 3.0).abs() < 1e-12);
        assert_eq!(funnel.steps[1].dropped_off, 0);
    }

    #[test]
    fn test_ratio_or_none() {
        assert_eq!(ratio_or_none(10.0, 0.0), None);
        assert_eq!(ratio_or_none(0.0, 5.0), Some(0.0));
        assert_eq!(ratio_or_none(30.0, 10.0), Some(3.0));
    }
}
