//! Data Model Module
//! Season labels and the cleaned, timestamped table.

use chrono::NaiveDateTime;
use polars::prelude::*;
use std::fmt;

/// Columns combined into the observation timestamp.
pub const DATE_COLUMNS: [&str; 4] = ["year", "month", "day", "hour"];

/// Pollutant columns every input file must provide.
pub const REQUIRED_POLLUTANTS: [&str; 4] = ["PM2.5", "PM10", "SO2", "NO2"];

/// Pollutants summarised per season.
pub const SEASONAL_POLLUTANTS: [&str; 3] = ["PM2.5", "SO2", "NO2"];

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const SEASON_COLUMN: &str = "season";

/// Meteorological season derived from the calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// Canonical display order.
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Fall];

    /// Map a calendar month (1-12) to its season.
    ///
    /// Dec/Jan/Feb are Winter, Mar-May Spring, Jun-Aug Summer and everything
    /// else Fall, so the mapping is total.
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Fall,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Static ordinal used by the ranking table (Winter = 1 .. Fall = 4).
    pub fn rank(self) -> u8 {
        match self {
            Season::Winter => 1,
            Season::Spring => 2,
            Season::Summer => 3,
            Season::Fall => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Millisecond `timestamp` column built from hourly date-times.
pub fn timestamp_column(stamps: &[Option<NaiveDateTime>]) -> PolarsResult<Column> {
    let millis: Vec<Option<i64>> = stamps
        .iter()
        .map(|t| t.map(|t| t.and_utc().timestamp_millis()))
        .collect();
    Series::new(TIMESTAMP_COLUMN.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .map(Column::from)
}

/// Output of the cleaning stage: `timestamp` followed by the measurement and
/// label columns, with no nulls and no date-part columns.
#[derive(Debug, Clone)]
pub struct CleanedTable {
    pub measurement_columns: Vec<String>,
    pub label_columns: Vec<String>,
    pub frame: DataFrame,
}

/// The cleaned dataset with its `season` column. Built once at startup and
/// never mutated; year filters produce new tables over the same columns.
#[derive(Debug, Clone)]
pub struct AirQualityTable {
    /// Numeric columns (everything except the date parts), all Float64.
    pub measurement_columns: Vec<String>,
    /// Text columns such as wind direction and station name.
    pub label_columns: Vec<String>,
    pub frame: DataFrame,
}

impl AirQualityTable {
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Same columns over a different set of rows.
    pub fn with_frame(&self, frame: DataFrame) -> Self {
        Self {
            measurement_columns: self.measurement_columns.clone(),
            label_columns: self.label_columns.clone(),
            frame,
        }
    }

    pub fn has_measurement(&self, name: &str) -> bool {
        self.measurement_columns.iter().any(|c| c == name)
    }

    /// Columns in display order: timestamp, season, measurements, labels.
    pub fn display_columns(&self) -> Vec<&str> {
        [TIMESTAMP_COLUMN, SEASON_COLUMN]
            .into_iter()
            .chain(self.measurement_columns.iter().map(String::as_str))
            .chain(self.label_columns.iter().map(String::as_str))
            .collect()
    }

    /// Smallest and largest observation year.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        let year = || col(TIMESTAMP_COLUMN).dt().year();
        let span = self
            .frame
            .clone()
            .lazy()
            .select([year().min().alias("first"), year().max().alias("last")])
            .collect()
            .ok()?;
        let get = |name: &str| span.column(name).ok()?.i32().ok()?.get(0);
        Some((get("first")?, get("last")?))
    }
}
