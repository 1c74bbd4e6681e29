//! Cross-platform performance summaries over a date window.
//!
//! Money is accumulated in integer micro-units so that partial sums can be
//! merged in any order and still produce a bit-identical summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use attribution_core::{AttributionResult, Platform};

use crate::funnel::{ratio, ratio_or_none, FunnelCounts, FunnelResult};
use crate::metrics::{CampaignMetrics, DateRange};

const MICROS_PER_UNIT: f64 = 1_000_000.0;

fn to_micros(amount: f64) -> i128 {
    (amount * MICROS_PER_UNIT).round() as i128
}

fn from_micros(micros: i128) -> f64 {
    micros as f64 / MICROS_PER_UNIT
}

// ---------------------------------------------------------------------------
// Summary types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformPerformance {
    pub impressions: u64,
    pub clicks: u64,
    pub saves: u64,
    pub closeups: u64,
    pub spend: f64,
    /// Conversion value credited to this platform by attribution.
    pub attributed_revenue: f64,
    pub ctr: f64,
    /// `None` when the platform had no spend.
    pub roas: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub date_range: DateRange,
    /// Converted journeys inside the window.
    pub purchases: u64,
    pub impressions: u64,
    pub clicks: u64,
    pub saves: u64,
    pub closeups: u64,
    pub spend: f64,
    pub revenue: f64,
    /// Clicks per impression, 0.0 with no impressions.
    pub ctr: f64,
    /// Revenue per unit of spend, `None` with no spend.
    pub roas: Option<f64>,
    pub funnel: FunnelResult,
    pub average_confidence: f64,
    pub platforms: BTreeMap<Platform, PlatformPerformance>,
    /// Journeys attributed per model identifier.
    pub models: BTreeMap<String, u64>,
    /// Platform with the highest CTR, ties going to the first in platform order.
    pub top_platform: Option<Platform>,
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PlatformTally {
    impressions: u64,
    clicks: u64,
    saves: u64,
    closeups: u64,
    spend_micros: i128,
    attributed_micros: i128,
}

impl PlatformTally {
    fn merge(&mut self, other: &PlatformTally) {
        self.impressions += other.impressions;
        self.clicks += other.clicks;
        self.saves += other.saves;
        self.closeups += other.closeups;
        self.spend_micros += other.spend_micros;
        self.attributed_micros += other.attributed_micros;
    }

    fn finish(&self) -> PlatformPerformance {
        let spend = from_micros(self.spend_micros);
        let attributed_revenue = from_micros(self.attributed_micros);
        PlatformPerformance {
            impressions: self.impressions,
            clicks: self.clicks,
            saves: self.saves,
            closeups: self.closeups,
            spend,
            attributed_revenue,
            ctr: ratio(self.clicks, self.impressions),
            roas: ratio_or_none(attributed_revenue, spend),
        }
    }
}

/// Partial performance sums for one window. Accumulators built over
/// disjoint slices of the input can be merged in any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceAccumulator {
    range: DateRange,
    purchases: u64,
    revenue_micros: i128,
    confidence_micros: i128,
    platforms: BTreeMap<Platform, PlatformTally>,
    models: BTreeMap<String, u64>,
    excluded_results: u64,
    excluded_metrics: u64,
}

impl PerformanceAccumulator {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            purchases: 0,
            revenue_micros: 0,
            confidence_micros: 0,
            platforms: BTreeMap::new(),
            models: BTreeMap::new(),
            excluded_results: 0,
            excluded_metrics: 0,
        }
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    /// Count one attribution result. Returns `false` when it converted
    /// outside the window and was skipped.
    pub fn add_result(&mut self, result: &AttributionResult) -> bool {
        if !self.range.contains(result.converted_at) {
            self.excluded_results += 1;
            return false;
        }

        self.purchases += 1;
        self.confidence_micros += to_micros(result.confidence_score);
        *self.models.entry(result.model_used.to_string()).or_default() += 1;

        // Valueless conversions carry unit credit, which is not revenue.
        if let Some(value) = result.conversion_value {
            self.revenue_micros += to_micros(value);
            for (platform, score) in &result.platform_scores {
                self.platforms.entry(*platform).or_default().attributed_micros += to_micros(*score);
            }
        }
        true
    }

    /// Count one day of campaign delivery. Returns `false` when the row was
    /// outside the window or its spend was unusable.
    pub fn add_metrics(&mut self, metrics: &CampaignMetrics) -> bool {
        if !self.range.contains_date(metrics.date) {
            self.excluded_metrics += 1;
            return false;
        }
        if !metrics.spend.is_finite() || metrics.spend < 0.0 {
            warn!(
                campaign_id = %metrics.campaign_id,
                date = %metrics.date,
                spend = metrics.spend,
                "Skipping metrics row with invalid spend"
            );
            self.excluded_metrics += 1;
            return false;
        }

        let tally = self.platforms.entry(metrics.platform).or_default();
        tally.impressions += metrics.impressions;
        tally.clicks += metrics.clicks;
        tally.saves += metrics.saves;
        tally.closeups += metrics.closeups;
        tally.spend_micros += to_micros(metrics.spend);
        true
    }

    pub fn extend_results<'a, I>(&mut self, results: I)
    where
        I: IntoIterator<Item = &'a AttributionResult>,
    {
        for result in results {
            self.add_result(result);
        }
    }

    pub fn extend_metrics<'a, I>(&mut self, metrics: I)
    where
        I: IntoIterator<Item = &'a CampaignMetrics>,
    {
        for row in metrics {
            self.add_metrics(row);
        }
    }

    pub fn merge(&mut self, other: PerformanceAccumulator) {
        debug_assert_eq!(self.range, other.range);
        self.purchases += other.purchases;
        self.revenue_micros += other.revenue_micros;
        self.confidence_micros += other.confidence_micros;
        self.excluded_results += other.excluded_results;
        self.excluded_metrics += other.excluded_metrics;
        for (platform, tally) in &other.platforms {
            self.platforms.entry(*platform).or_default().merge(tally);
        }
        for (model, count) in other.models {
            *self.models.entry(model).or_default() += count;
        }
    }

    pub fn finish(self) -> PerformanceSummary {
        let mut totals = PlatformTally::default();
        for tally in self.platforms.values() {
            totals.merge(tally);
        }

        let spend = from_micros(totals.spend_micros);
        let revenue = from_micros(self.revenue_micros);
        let average_confidence = if self.purchases == 0 {
            0.0
        } else {
            from_micros(self.confidence_micros) / self.purchases as f64
        };

        let platforms: BTreeMap<Platform, PlatformPerformance> = self
            .platforms
            .iter()
            .map(|(platform, tally)| (*platform, tally.finish()))
            .collect();

        let top_platform = platforms
            .iter()
            .filter(|(_, perf)| perf.impressions > 0)
            .fold(None::<(Platform, f64)>, |best, (platform, perf)| match best {
                Some((_, ctr)) if ctr >= perf.ctr => best,
                _ => Some((*platform, perf.ctr)),
            })
            .map(|(platform, _)| platform);

        let funnel = FunnelResult::from_counts(FunnelCounts {
            impressions: totals.impressions,
            clicks: totals.clicks,
            saves: totals.saves,
            purchases: self.purchases,
        });

        if self.excluded_results > 0 || self.excluded_metrics > 0 {
            debug!(
                excluded_results = self.excluded_results,
                excluded_metrics = self.excluded_metrics,
                "Inputs outside the reporting window were skipped"
            );
        }

        let summary = PerformanceSummary {
            date_range: self.range,
            purchases: self.purchases,
            impressions: totals.impressions,
            clicks: totals.clicks,
            saves: totals.saves,
            closeups: totals.closeups,
            spend,
            revenue,
            ctr: ratio(totals.clicks, totals.impressions),
            roas: ratio_or_none(revenue, spend),
            funnel,
            average_confidence,
            platforms,
            models: self.models,
            top_platform,
        };

        metrics::counter!("reporting.summaries").increment(1);
        info!(
            start = %summary.date_range.start,
            end = %summary.date_range.end,
            purchases = summary.purchases,
            revenue = summary.revenue,
            spend = summary.spend,
            ctr = summary.ctr,
            roas = ?summary.roas,
            "Performance summary computed"
        );

        summary
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Reduce attribution results and delivery metrics for one window into a
/// summary. Input order never affects the output.
pub fn aggregate_performance(
    results: &[AttributionResult],
    metrics: &[CampaignMetrics],
    range: DateRange,
) -> PerformanceSummary {
    let mut acc = PerformanceAccumulator::new(range);
    acc.extend_results(results);
    acc.extend_metrics(metrics);
    acc.finish()
}

/// Same as [`aggregate_performance`], with the inputs split across
/// `workers` scoped threads and the partial sums merged afterwards.
pub fn aggregate_performance_parallel(
    results: &[AttributionResult],
    metrics: &[CampaignMetrics],
    range: DateRange,
    workers: usize,
) -> PerformanceSummary {
    let workers = workers.max(1);
    if workers == 1 {
        return aggregate_performance(results, metrics, range);
    }
    let result_chunk = results.len().div_ceil(workers).max(1);
    let metric_chunk = metrics.len().div_ceil(workers).max(1);

    let partials: Vec<PerformanceAccumulator> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let results = results.chunks(result_chunk).nth(worker).unwrap_or(&[]);
                let metrics = metrics.chunks(metric_chunk).nth(worker).unwrap_or(&[]);
                scope.spawn(move || {
                    let mut acc = PerformanceAccumulator::new(range);
                    acc.extend_results(results);
                    acc.extend_metrics(metrics);
                    acc
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(acc) => acc,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    partials
        .into_iter()
        .fold(PerformanceAccumulator::new(range), |mut acc, partial| {
            acc.merge(partial);
            acc
        })
        .finish()
}
