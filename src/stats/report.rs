//! Dashboard Report Module
//! Everything one render cycle needs, computed from the table and a year range.

use super::aggregator::{
    filter_by_years, monthly_means, seasonal_means, seasonal_ranking, AggregateError,
    MonthlySeries, SeasonalAggregate, SeasonalRanking, YearRange,
};
use super::calculator::{DescriptiveStats, StatsCalculator};
use crate::data::{AirQualityTable, REQUIRED_POLLUTANTS};

#[derive(Debug, Clone)]
pub struct DashboardReport {
    pub range: YearRange,
    /// The rows inside `range`.
    pub visible: AirQualityTable,
    pub monthly: MonthlySeries,
    pub seasonal: Vec<SeasonalAggregate>,
    pub ranking: Vec<SeasonalRanking>,
    pub descriptive: Vec<DescriptiveStats>,
}

impl DashboardReport {
    /// Run the full aggregation pipeline for one year range.
    pub fn compute(table: &AirQualityTable, range: YearRange) -> Result<Self, AggregateError> {
        let view = filter_by_years(table, range)?;
        if view.is_empty() {
            log::debug!("No rows in {}-{}", range.start(), range.end());
        }
        let monthly = monthly_means(&view)?;
        let seasonal = seasonal_means(&view)?;
        let ranking = seasonal_ranking(&seasonal);
        let descriptive = StatsCalculator::describe(&view, &REQUIRED_POLLUTANTS)?;

        log::debug!(
            "Report {}-{}: {} rows, {} months, {} seasons",
            range.start(),
            range.end(),
            view.len(),
            monthly.rows.len(),
            seasonal.len()
        );

        Ok(Self {
            range,
            visible: view,
            monthly,
            seasonal,
            ranking,
            descriptive,
        })
    }

    pub fn row_count(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}
