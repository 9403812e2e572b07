//! Data Processor Module
//! Cleans the raw frame (missing values, timestamps) and labels seasons.

use super::loader::DataLoader;
use super::model::{
    timestamp_column, AirQualityTable, CleanedTable, Season, DATE_COLUMNS, SEASON_COLUMN,
    TIMESTAMP_COLUMN,
};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Position of each row in the loaded file, carried through the filters.
const SOURCE_ROW_COLUMN: &str = "source_row";
/// Per-row count of cells filled by imputation.
const IMPUTED_COLUMN: &str = "imputed_cells";

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error(
        "Row {row}: year={year}, month={month}, day={day}, hour={hour} is not a valid date/hour"
    )]
    InvalidTimestamp {
        row: usize,
        year: String,
        month: String,
        day: String,
        hour: String,
    },
}

/// What to do with rows that have missing measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Drop every row with any missing field.
    #[default]
    DropRow,
    /// Fill numeric gaps with the column mean and text gaps with the most
    /// frequent value. Rows missing a date part are still dropped.
    ImputeMean,
}

/// What to do with rows whose date parts do not form a valid date/hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidTimestampPolicy {
    /// Fail the whole load.
    #[default]
    Abort,
    /// Skip the row and count it in the report.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningPolicy {
    pub missing: MissingValuePolicy,
    pub invalid_timestamp: InvalidTimestampPolicy,
}

/// Row accounting for one cleaning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub dropped_incomplete: usize,
    pub imputed_cells: usize,
    pub skipped_invalid_timestamps: usize,
    pub output_rows: usize,
}

impl fmt::Display for CleaningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} rows kept ({} incomplete dropped, {} cells imputed, {} invalid timestamps skipped)",
            self.output_rows,
            self.input_rows,
            self.dropped_incomplete,
            self.imputed_cells,
            self.skipped_invalid_timestamps
        )
    }
}

/// Combine date parts into an hourly timestamp.
///
/// Returns `None` for anything that is not a real calendar date with an hour
/// in 0..=23.
pub fn build_timestamp(year: i64, month: i64, day: i64, hour: i64) -> Option<NaiveDateTime> {
    let year = i32::try_from(year).ok()?;
    let month = u32::try_from(month).ok()?;
    let day = u32::try_from(day).ok()?;
    let hour = u32::try_from(hour).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, 0, 0)
}

/// Read one date part as written in the file.
///
/// Whole-valued floats (`3.0`) are accepted; fractions and text are not.
fn parse_date_part(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>().ok().or_else(|| {
        let value = text.parse::<f64>().ok()?;
        (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
    })
}

/// Handles data cleaning and season enrichment.
pub struct DataProcessor;

impl DataProcessor {
    /// Clean then enrich in one step.
    pub fn prepare(
        df: &DataFrame,
        policy: &CleaningPolicy,
    ) -> Result<(AirQualityTable, CleaningReport), ProcessorError> {
        let (cleaned, report) = Self::clean(df, policy)?;
        Ok((Self::enrich(cleaned)?, report))
    }

    /// Handle missing values, build timestamps and drop the date-part columns.
    pub fn clean(
        df: &DataFrame,
        policy: &CleaningPolicy,
    ) -> Result<(CleanedTable, CleaningReport), ProcessorError> {
        let numeric = DataLoader::get_numeric_columns(df);
        let measurement_columns: Vec<String> = numeric
            .iter()
            .filter(|c| !DATE_COLUMNS.contains(&c.as_str()))
            .cloned()
            .collect();
        let label_columns: Vec<String> = DataLoader::get_columns(df)
            .into_iter()
            .filter(|c| !numeric.contains(c) && !DATE_COLUMNS.contains(&c.as_str()))
            .collect();
        let value_columns: Vec<&str> = measurement_columns
            .iter()
            .chain(&label_columns)
            .map(String::as_str)
            .collect();

        // Kept as text so that "20x3" or "1.5" surface as invalid timestamps
        // rather than as missing values.
        let date_parts = DATE_COLUMNS
            .iter()
            .map(|name| Self::text_column(df, name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = CleaningReport {
            input_rows: df.height(),
            ..Default::default()
        };

        let mut source = df.clone();
        let rows: Vec<u64> = (0..df.height() as u64).collect();
        source.with_column(Series::new(SOURCE_ROW_COLUMN.into(), rows))?;

        let normalised = source
            .lazy()
            .with_columns(Self::normalise(&measurement_columns, &label_columns))
            .filter(Self::all_present(DATE_COLUMNS))
            .with_column(Self::null_cells(&value_columns).alias(IMPUTED_COLUMN));

        let filled = match policy.missing {
            MissingValuePolicy::DropRow => normalised,
            MissingValuePolicy::ImputeMean => {
                normalised.with_columns(Self::fill_gaps(&measurement_columns, &label_columns))
            }
        };

        // An all-null column has no mean or mode, so imputation can leave gaps.
        let complete = filled
            .filter(Self::all_present(value_columns.iter().copied()))
            .collect()?;
        report.dropped_incomplete = report.input_rows - complete.height();

        let mut keep = Vec::with_capacity(complete.height());
        let mut stamps = Vec::with_capacity(complete.height());
        let source_rows = complete.column(SOURCE_ROW_COLUMN)?.u64()?;
        for row in source_rows.into_no_null_iter() {
            let row = row as usize;
            let texts: Vec<&str> = date_parts
                .iter()
                .map(|part| part[row].as_deref().unwrap_or_default())
                .collect();
            let parsed: Option<Vec<i64>> = texts.iter().map(|t| parse_date_part(t)).collect();

            match parsed.and_then(|p| build_timestamp(p[0], p[1], p[2], p[3])) {
                Some(timestamp) => {
                    keep.push(true);
                    stamps.push(Some(timestamp));
                }
                None => match policy.invalid_timestamp {
                    InvalidTimestampPolicy::Abort => {
                        return Err(ProcessorError::InvalidTimestamp {
                            row,
                            year: texts[0].to_string(),
                            month: texts[1].to_string(),
                            day: texts[2].to_string(),
                            hour: texts[3].to_string(),
                        });
                    }
                    InvalidTimestampPolicy::Skip => {
                        log::warn!(
                            "Skipping row {row}: {}-{}-{} {}h is not a valid date/hour",
                            texts[0],
                            texts[1],
                            texts[2],
                            texts[3]
                        );
                        report.skipped_invalid_timestamps += 1;
                        keep.push(false);
                    }
                },
            }
        }

        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        let mut kept = complete.filter(&mask)?;
        kept.with_column(timestamp_column(&stamps)?)?;
        report.imputed_cells = kept.column(IMPUTED_COLUMN)?.u32()?.sum().unwrap_or(0) as usize;

        let selection: Vec<Expr> = std::iter::once(TIMESTAMP_COLUMN)
            .chain(value_columns.iter().copied())
            .map(col)
            .collect();
        let frame = kept.lazy().select(selection).collect()?;

        report.output_rows = frame.height();
        log::info!("Cleaning: {report}");

        Ok((
            CleanedTable {
                measurement_columns,
                label_columns,
                frame,
            },
            report,
        ))
    }

    /// Attach the season derived from each timestamp's month.
    pub fn enrich(cleaned: CleanedTable) -> Result<AirQualityTable, ProcessorError> {
        let frame = cleaned
            .frame
            .lazy()
            .with_column(Self::season_expr())
            .collect()?;

        Ok(AirQualityTable {
            measurement_columns: cleaned.measurement_columns,
            label_columns: cleaned.label_columns,
            frame,
        })
    }

    /// `Season::from_month` as a column expression over `timestamp`.
    fn season_expr() -> Expr {
        let month = col(TIMESTAMP_COLUMN).dt().month();
        let in_season = |season: Season| {
            (1..=12u32)
                .filter(|&m| Season::from_month(m) == season)
                .fold(lit(false), |acc, m| acc.or(month.clone().eq(lit(m))))
        };

        when(in_season(Season::Winter))
            .then(lit(Season::Winter.name()))
            .when(in_season(Season::Spring))
            .then(lit(Season::Spring.name()))
            .when(in_season(Season::Summer))
            .then(lit(Season::Summer.name()))
            .otherwise(lit(Season::Fall.name()))
            .alias(SEASON_COLUMN)
    }

    /// Measurements as Float64 with NaN read as missing; labels as text.
    fn normalise(measurements: &[String], labels: &[String]) -> Vec<Expr> {
        measurements
            .iter()
            .map(|c| col(c.as_str()).cast(DataType::Float64).fill_nan(lit(NULL)))
            .chain(labels.iter().map(|c| col(c.as_str()).cast(DataType::String)))
            .collect()
    }

    /// Column mean for numbers; most frequent value for text, smallest on ties.
    fn fill_gaps(measurements: &[String], labels: &[String]) -> Vec<Expr> {
        measurements
            .iter()
            .map(|c| col(c.as_str()).fill_null(col(c.as_str()).mean()))
            .chain(labels.iter().map(|c| {
                let mode = col(c.as_str()).mode().sort(SortOptions::default()).first();
                col(c.as_str()).fill_null(mode)
            }))
            .collect()
    }

    fn all_present<'a>(columns: impl IntoIterator<Item = &'a str>) -> Expr {
        columns
            .into_iter()
            .fold(lit(true), |acc, name| acc.and(col(name).is_not_null()))
    }

    fn null_cells(columns: &[&str]) -> Expr {
        columns
            .iter()
            .fold(lit(0u32), |acc, name| {
                acc + col(*name).is_null().cast(DataType::UInt32)
            })
            .cast(DataType::UInt32)
    }

    fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, ProcessorError> {
        let column = df.column(name)?.cast(&DataType::String)?;
        let ca = column.as_materialized_series().str()?;
        Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::data::loader::fixtures::load;

    const ROWS: &str = "\
1,2013,3,1,0,4,4,4,7,300,77,-0.7,1023,-18.8,0,NNW,4.4,Gucheng
2,2013,3,1,1,NA,4,4,7,300,77,-1.1,1023.2,-18.2,0,N,4.7,Gucheng
3,2013,3,1,2,8,4,NA,7,300,77,-1.1,1023.5,-18.2,0,NA,5.6,Gucheng
4,2013,12,31,23,20,30,5,9,400,60,-3,1030,-20,0,N,2.0,Gucheng
";

    fn skipping() -> CleaningPolicy {
        CleaningPolicy {
            invalid_timestamp: InvalidTimestampPolicy::Skip,
            ..Default::default()
        }
    }

    #[test]
    fn drop_row_removes_incomplete_rows_and_date_parts() {
        let df = load(ROWS);
        let (table, report) = DataProcessor::clean(&df, &CleaningPolicy::default()).unwrap();

        assert_eq!(report.input_rows, 4);
        assert_eq!(report.dropped_incomplete, 2);
        assert_eq!(report.output_rows, 2);
        assert_eq!(table.frame.height(), 2);
        for part in DATE_COLUMNS {
            assert!(!table.measurement_columns.iter().any(|c| c == part));
            assert!(table.frame.column(part).is_err());
        }
        assert!(table.frame.column(SOURCE_ROW_COLUMN).is_err());
        assert!(table.frame.column(IMPUTED_COLUMN).is_err());
        assert_eq!(table.label_columns, vec!["wd".to_string(), "station".to_string()]);

        let stamps = millis(&table.frame);
        assert_eq!(stamps[1], stamp(2013, 12, 31, 23).and_utc().timestamp_millis());
        assert_eq!(str_values(&table.frame, "wd"), vec!["NNW", "N"]);
    }

    #[test]
    fn impute_mean_keeps_every_row() {
        let df = load(ROWS);
        let policy = CleaningPolicy {
            missing: MissingValuePolicy::ImputeMean,
            ..Default::default()
        };
        let (table, report) = DataProcessor::clean(&df, &policy).unwrap();

        assert_eq!(report.output_rows, 4);
        assert_eq!(report.dropped_incomplete, 0);
        assert_eq!(report.imputed_cells, 3);
        // mean of 4, 8, 20
        let pm25 = f64_values(&table.frame, "PM2.5");
        assert!((pm25[1] - 32.0 / 3.0).abs() < 1e-9);
        let so2 = f64_values(&table.frame, "SO2");
        assert!((so2[2] - 13.0 / 3.0).abs() < 1e-9);
        assert_eq!(str_values(&table.frame, "wd")[2], "N");
    }

    #[test]
    fn impute_mean_still_drops_rows_without_a_date() {
        let df = load(
            "1,2013,3,1,0,4,4,4,7,300,77,-0.7,1023,-18.8,0,NNW,4.4,Gucheng\n\
             2,NA,3,1,1,NA,4,4,7,300,77,-1.1,1023.2,-18.2,0,N,4.7,Gucheng\n",
        );
        let policy = CleaningPolicy {
            missing: MissingValuePolicy::ImputeMean,
            ..Default::default()
        };
        let (table, report) = DataProcessor::clean(&df, &policy).unwrap();
        assert_eq!(report.dropped_incomplete, 1);
        assert_eq!(report.imputed_cells, 0);
        assert_eq!(table.frame.height(), 1);
    }

    #[test]
    fn nan_counts_as_missing() {
        let df = load(
            "1,2013,3,1,0,NaN,4,4,7,300,77,-0.7,1023,-18.8,0,NNW,4.4,Gucheng\n\
             2,2013,3,1,1,6,4,4,7,300,77,-1.1,1023.2,-18.2,0,N,4.7,Gucheng\n",
        );
        let (table, report) = DataProcessor::clean(&df, &CleaningPolicy::default()).unwrap();
        assert_eq!(report.dropped_incomplete, 1);
        assert_eq!(f64_values(&table.frame, "PM2.5"), vec![6.0]);
    }

    #[test]
    fn invalid_timestamp_aborts_by_default() {
        let df = load("1,2013,2,30,0,4,4,4,7,300,77,-0.7,1023,-18.8,0,NNW,4.4,Gucheng\n");
        let err = DataProcessor::clean(&df, &CleaningPolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            ProcessorError::InvalidTimestamp { row: 0, ref month, ref day, .. }
                if month == "2" && day == "30"
        ));
    }

    #[test]
    fn invalid_timestamp_can_be_skipped() {
        let df = load(
            "1,2013,2,30,0,4,4,4,7,300,77,-0.7,1023,-18.8,0,NNW,4.4,Gucheng\n\
             2,2013,3,1,24,4,4,4,7,300,77,-0.7,1023,-18.8,0,NNW,4.4,Gucheng\n\
             3,2013,3,1,5,4,4,4,7,300,77,-0.7,1023,-18.8,0,NNW,4.4,Gucheng\n",
        );
        let (table, report) = DataProcessor::clean(&df, &skipping()).unwrap();
        assert_eq!(report.skipped_invalid_timestamps, 2);
        assert_eq!(report.output_rows, 1);
        assert_eq!(millis(&table.frame), vec![stamp(2013, 3, 1, 5).and_utc().timestamp_millis()]);
    }

    #[test]
    fn text_in_a_date_part_is_an_invalid_timestamp() {
        let df = load(
            "1,2013,3,1,0,4,4,4,7,300,77,-0.7,1023,-18.8,0,NNW,4.4,Gucheng\n\
             2,20x3,3,1,1,4,4,4,7,300,77,-1.1,1023.2,-18.2,0,N,4.7,Gucheng\n",
        );
        let err = DataProcessor::clean(&df, &CleaningPolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            ProcessorError::InvalidTimestamp { row: 1, ref year, .. } if year == "20x3"
        ));

        let (table, report) = DataProcessor::clean(&df, &skipping()).unwrap();
        assert_eq!(report.dropped_incomplete, 0);
        assert_eq!(report.skipped_invalid_timestamps, 1);
        assert_eq!(table.frame.height(), 1);
        assert!(!table.label_columns.iter().any(|c| c == "year"));
    }

    #[test]
    fn fractional_hour_is_an_invalid_timestamp() {
        let df = load(
            "1,2013,3,1,0,4,4,4,7,300,77,-0.7,1023,-18.8,0,NNW,4.4,Gucheng\n\
             2,2013,3,1,1.5,4,4,4,7,300,77,-1.1,1023.2,-18.2,0,N,4.7,Gucheng\n",
        );
        let err = DataProcessor::clean(&df, &CleaningPolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            ProcessorError::InvalidTimestamp { row: 1, ref hour, .. } if hour == "1.5"
        ));

        let (table, _) = DataProcessor::clean(&df, &skipping()).unwrap();
        assert_eq!(millis(&table.frame), vec![stamp(2013, 3, 1, 0).and_utc().timestamp_millis()]);
    }

    #[test]
    fn enrich_labels_seasons() {
        let df = load(ROWS);
        let (table, _) = DataProcessor::prepare(&df, &CleaningPolicy::default()).unwrap();
        assert_eq!(str_values(&table.frame, SEASON_COLUMN), vec!["Spring", "Winter"]);
    }

    #[test]
    fn season_column_agrees_with_from_month() {
        let rows: Vec<Row> = (1..=12).map(|m| (2014, m, 1, 0, [1.0; 4])).collect();
        let t = table(&rows);
        let expected: Vec<String> = (1..=12)
            .map(|m| Season::from_month(m).name().to_string())
            .collect();
        assert_eq!(str_values(&t.frame, SEASON_COLUMN), expected);
    }

    #[test]
    fn build_timestamp_rejects_out_of_range_parts() {
        assert!(build_timestamp(2016, 2, 29, 23).is_some());
        assert!(build_timestamp(2015, 2, 29, 0).is_none());
        assert!(build_timestamp(2013, 13, 1, 0).is_none());
        assert!(build_timestamp(2013, 1, 1, 24).is_none());
        assert!(build_timestamp(2013, -1, 1, 0).is_none());
    }

    #[test]
    fn date_parts_must_be_whole_numbers() {
        assert_eq!(parse_date_part("2013"), Some(2013));
        assert_eq!(parse_date_part("3.0"), Some(3));
        assert_eq!(parse_date_part("1.5"), None);
        assert_eq!(parse_date_part("20x3"), None);
        assert_eq!(parse_date_part("NaN"), None);
    }

    #[test]
    fn policy_deserializes_from_snake_case() {
        let policy: CleaningPolicy =
            serde_json::from_str(r#"{"missing":"impute_mean","invalid_timestamp":"skip"}"#)
                .unwrap();
        assert_eq!(policy.missing, MissingValuePolicy::ImputeMean);
        assert_eq!(policy.invalid_timestamp, InvalidTimestampPolicy::Skip);
    }
}
