//! Aggregator Module
//! Year-range filtering, monthly resampling and seasonal grouping.

use crate::data::{AirQualityTable, Season, SEASONAL_POLLUTANTS, SEASON_COLUMN, TIMESTAMP_COLUMN};
use chrono::{Datelike, Months, NaiveDate};
use polars::prelude::*;
use thiserror::Error;

const RECORD_COUNT: &str = "record_count";
const YEAR_KEY: &str = "year";
const MONTH_KEY: &str = "month";

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Year range is inverted: {start} > {end}")]
    InvertedRange { start: i32, end: i32 },
    #[error("Column '{0}' is not a measurement column")]
    UnknownColumn(String),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Inclusive year range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Result<Self, AggregateError> {
        if start > end {
            return Err(AggregateError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }
}

/// Mean of every measurement column for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyAggregate {
    /// Last calendar day of the month.
    pub month_end: NaiveDate,
    pub record_count: usize,
    /// In `MonthlySeries::columns` order.
    pub means: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MonthlySeries {
    pub columns: Vec<String>,
    pub rows: Vec<MonthlyAggregate>,
}

impl MonthlySeries {
    /// `(month_end, mean)` pairs for a single column.
    pub fn column(&self, name: &str) -> Option<Vec<(NaiveDate, f64)>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(
            self.rows
                .iter()
                .map(|r| (r.month_end, r.means[idx]))
                .collect(),
        )
    }
}

/// Seasonal means of PM2.5, SO2 and NO2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalAggregate {
    pub season: Season,
    pub record_count: usize,
    pub pm25: f64,
    pub so2: f64,
    pub no2: f64,
}

impl SeasonalAggregate {
    pub fn pollutant_means(&self) -> [f64; 3] {
        [self.pm25, self.so2, self.no2]
    }
}

/// Seasonal row with its static rank and the mean/max of its three pollutant means.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalRanking {
    pub aggregate: SeasonalAggregate,
    pub rank: u8,
    pub mean: f64,
    pub max: f64,
}

/// Keep the rows whose timestamp year lies in `range`.
pub fn filter_by_years(
    table: &AirQualityTable,
    range: YearRange,
) -> Result<AirQualityTable, AggregateError> {
    let year = col(TIMESTAMP_COLUMN).dt().year();
    let frame = table
        .frame
        .clone()
        .lazy()
        .filter(
            year.clone()
                .gt_eq(lit(range.start()))
                .and(year.lt_eq(lit(range.end()))),
        )
        .collect()?;
    Ok(table.with_frame(frame))
}

/// All values of one measurement column, in row order.
pub fn column_values(table: &AirQualityTable, name: &str) -> Result<Vec<f64>, AggregateError> {
    if !table.has_measurement(name) {
        return Err(AggregateError::UnknownColumn(name.to_string()));
    }
    let column = table.frame.column(name)?.cast(&DataType::Float64)?;
    let ca = column.f64()?;
    Ok(ca.into_iter().flatten().collect())
}

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Resample to month-end buckets, averaging every measurement column.
///
/// Months without any row are left out rather than filled.
pub fn monthly_means(view: &AirQualityTable) -> Result<MonthlySeries, AggregateError> {
    let mut aggs = vec![len().alias(RECORD_COUNT)];
    aggs.extend(view.measurement_columns.iter().map(|c| col(c.as_str()).mean()));

    let grouped = view
        .frame
        .clone()
        .lazy()
        .group_by([
            col(TIMESTAMP_COLUMN).dt().year().alias(YEAR_KEY),
            col(TIMESTAMP_COLUMN).dt().month().alias(MONTH_KEY),
        ])
        .agg(aggs)
        .sort_by_exprs([col(YEAR_KEY), col(MONTH_KEY)], SortMultipleOptions::default())
        .collect()?;

    let years = int_values(&grouped, YEAR_KEY)?;
    let months = int_values(&grouped, MONTH_KEY)?;
    let counts = int_values(&grouped, RECORD_COUNT)?;
    let means = view
        .measurement_columns
        .iter()
        .map(|c| float_values(&grouped, c))
        .collect::<Result<Vec<_>, _>>()?;

    let rows = (0..grouped.height())
        .filter_map(|i| {
            let year = i32::try_from(years[i]).ok()?;
            let month = u32::try_from(months[i]).ok()?;
            let first = NaiveDate::from_ymd_opt(year, month, 1)?;
            Some(MonthlyAggregate {
                month_end: month_end(first),
                record_count: counts[i] as usize,
                means: means.iter().map(|column| column[i]).collect(),
            })
        })
        .collect();

    Ok(MonthlySeries {
        columns: view.measurement_columns.clone(),
        rows,
    })
}

/// Mean PM2.5/SO2/NO2 per season present, in Winter..Fall order.
pub fn seasonal_means(view: &AirQualityTable) -> Result<Vec<SeasonalAggregate>, AggregateError> {
    if let Some(missing) = SEASONAL_POLLUTANTS
        .iter()
        .find(|name| !view.has_measurement(name))
    {
        return Err(AggregateError::UnknownColumn(missing.to_string()));
    }

    let mut aggs = vec![len().alias(RECORD_COUNT)];
    aggs.extend(SEASONAL_POLLUTANTS.iter().map(|c| col(*c).mean()));

    let grouped = view
        .frame
        .clone()
        .lazy()
        .group_by([col(SEASON_COLUMN)])
        .agg(aggs)
        .collect()?;

    let seasons = text_values(&grouped, SEASON_COLUMN)?;
    let counts = int_values(&grouped, RECORD_COUNT)?;
    let means = SEASONAL_POLLUTANTS
        .iter()
        .map(|c| float_values(&grouped, c))
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows: Vec<SeasonalAggregate> = seasons
        .iter()
        .enumerate()
        .filter_map(|(i, name)| {
            Some(SeasonalAggregate {
                season: Season::from_name(name)?,
                record_count: counts[i] as usize,
                pm25: means[0][i],
                so2: means[1][i],
                no2: means[2][i],
            })
        })
        .collect();
    rows.sort_by_key(|r| r.season);
    Ok(rows)
}

/// Attach rank, mean and max to each seasonal row.
pub fn seasonal_ranking(seasonal: &[SeasonalAggregate]) -> Vec<SeasonalRanking> {
    seasonal
        .iter()
        .map(|agg| {
            let values = agg.pollutant_means();
            SeasonalRanking {
                aggregate: *agg,
                rank: agg.season.rank(),
                mean: values.iter().sum::<f64>() / values.len() as f64,
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            }
        })
        .collect()
}

fn int_values(df: &DataFrame, name: &str) -> Result<Vec<i64>, AggregateError> {
    let column = df.column(name)?.cast(&DataType::Int64)?;
    let ca = column.i64()?;
    Ok(ca.into_iter().map(|v| v.unwrap_or_default()).collect())
}

/// Null means (an all-null group) come back as NaN.
fn float_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, AggregateError> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    let ca = column.f64()?;
    Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

fn text_values(df: &DataFrame, name: &str) -> Result<Vec<String>, AggregateError> {
    let column = df.column(name)?.cast(&DataType::String)?;
    let ca = column.as_materialized_series().str()?;
    Ok(ca
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}
