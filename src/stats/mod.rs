//! Stats module - filtering, aggregation and descriptive statistics

pub mod aggregator;
mod calculator;
mod report;

pub use aggregator::{MonthlySeries, SeasonalAggregate, SeasonalRanking, YearRange};
pub use calculator::DescriptiveStats;
pub use report::DashboardReport;
