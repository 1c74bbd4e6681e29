//! Performance reporting over attribution results: date windows, funnel
//! rates, and cross-platform summaries.

pub mod funnel;
pub mod metrics;
pub mod performance;

pub use funnel::{FunnelCounts, FunnelResult, FunnelStepResult};
pub use metrics::{CampaignMetrics, DateRange};
pub use performance::{
    aggregate_performance, aggregate_performance_parallel, PerformanceAccumulator,
    PerformanceSummary, PlatformPerformance,
};
