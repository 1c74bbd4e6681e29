//! Raw per-campaign delivery metrics and reporting windows.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use attribution_core::{EngineError, EngineResult, Platform};

/// One day of delivery metrics for one campaign, as reported by the
/// platform's ads API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetrics {
    pub campaign_id: String,
    pub platform: Platform,
    pub date: NaiveDate,
    pub impressions: u64,
    pub clicks: u64,
    #[serde(default)]
    pub saves: u64,
    #[serde(default)]
    pub closeups: u64,
    pub spend: f64,
}

/// Inclusive range of calendar dates (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> EngineResult<Self> {
        if start > end {
            return Err(EngineError::Config(format!(
                "date range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The `days` days ending on `end`, inclusive.
    pub fn trailing(end: NaiveDate, days: u32) -> EngineResult<Self> {
        let span = Duration::days(i64::from(days.max(1)) - 1);
        Self::new(end - span, end)
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.contains_date(instant.date_naive())
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(matches!(
            DateRange::new(date(10), date(3)),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_range_is_inclusive() {
        let range = DateRange::new(date(1), date(7)).unwrap();
        assert!(range.contains_date(date(1)));
        assert!(range.contains_date(date(7)));
        assert!(!range.contains_date(date(8)));
        assert!(range.contains(Utc.with_ymd_and_hms(2024, 4, 7, 23, 59, 59).unwrap()));
        assert_eq!(range.days(), 7);
    }

    #[test]
    fn test_trailing_window() {
        let range = DateRange::trailing(date(30), 30).unwrap();
        assert_eq!(range.start, date(1));
        assert_eq!(range.days(), 30);
    }

    #[test]
    fn test_metrics_optional_counts_default() {
        let json = r#"{"campaign_id":"c1","platform":"meta","date":"2024-04-02","impressions":100,"clicks":4,"spend":12.5}"#;
        let metrics: CampaignMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.saves, 0);
        assert_eq!(metrics.platform, Platform::Meta);
    }
}
