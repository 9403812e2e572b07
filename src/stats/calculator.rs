//! Statistics Calculator Module
//! Descriptive statistics (count / mean / std / min / quartiles / max).

use super::aggregator::{column_values, AggregateError};
use crate::data::AirQualityTable;
use statrs::statistics::Statistics;

/// Descriptive statistics for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1).
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl DescriptiveStats {
    /// Stats of an empty column: zero count, everything else NaN.
    pub fn empty(column: &str) -> Self {
        Self {
            column: column.to_string(),
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            median: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(column: &str, values: &[f64]) -> DescriptiveStats {
        let n = values.len();
        if n == 0 {
            return DescriptiveStats::empty(column);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        DescriptiveStats {
            column: column.to_string(),
            count: n,
            mean: values.iter().mean(),
            // NaN for a single value, like pandas
            std: values.iter().std_dev(),
            min: sorted[0],
            q25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            q75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Describe each named column over the visible rows, in the given order.
    pub fn describe(
        view: &AirQualityTable,
        columns: &[&str],
    ) -> Result<Vec<DescriptiveStats>, AggregateError> {
        columns
            .iter()
            .map(|name| {
                let values = column_values(view, name)?;
                Ok(Self::compute_descriptive_stats(name, &values))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::REQUIRED_POLLUTANTS;
    use crate::stats::aggregator::tests::sample_table;
    use crate::stats::aggregator::{filter_by_years, YearRange};

    #[test]
    fn matches_pandas_describe() {
        let stats = StatsCalculator::compute_descriptive_stats("PM2.5", &[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(stats.count, 4);
        assert!((stats.mean - 2.5).abs() < 1e-12);
        assert!((stats.std - 1.290_994_448_7).abs() < 1e-9);
        assert_eq!(stats.min, 1.0);
        assert!((stats.q25 - 1.75).abs() < 1e-12);
        assert!((stats.median - 2.5).abs() < 1e-12);
        assert!((stats.q75 - 3.25).abs() < 1e-12);
        assert_eq!(stats.max, 4.0);
    }

    #[test]
    fn single_value_has_nan_std() {
        let stats = StatsCalculator::compute_descriptive_stats("SO2", &[7.0]);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.median, 7.0);
        assert!(stats.std.is_nan());
    }

    #[test]
    fn empty_column_is_nan() {
        let stats = StatsCalculator::compute_descriptive_stats("NO2", &[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan() && stats.max.is_nan());
    }

    #[test]
    fn count_equals_filtered_rows() {
        let table = sample_table();
        let view = filter_by_years(&table, YearRange::new(2013, 2015).unwrap()).unwrap();
        let described = StatsCalculator::describe(&view, &REQUIRED_POLLUTANTS).unwrap();

        assert_eq!(described.len(), 4);
        for stats in &described {
            assert_eq!(stats.count, view.len());
        }
        assert_eq!(described[1].column, "PM10");
    }

    #[test]
    fn unknown_column_is_an_error() {
        let table = sample_table();
        let view = filter_by_years(&table, YearRange::new(2013, 2017).unwrap()).unwrap();
        assert!(StatsCalculator::describe(&view, &["CO"]).is_err());
    }
}
