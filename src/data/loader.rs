//! CSV Data Loader Module
//! Reads the air-quality CSV into a Polars DataFrame and checks its shape.

use super::model::{DATE_COLUMNS, REQUIRED_POLLUTANTS};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Data file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Required column '{0}' is missing")]
    MissingColumn(String),
    #[error("Column '{column}' must be numeric but was read as {dtype}")]
    NonNumericColumn { column: String, dtype: String },
}

/// Loads the raw station file with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file, treating any of `null_tokens` as a missing value.
    ///
    /// The file must carry the date-part columns and the four core pollutant
    /// columns; the pollutants must parse as numbers.
    pub fn load_csv(path: &Path, null_tokens: &[String]) -> Result<DataFrame, LoaderError> {
        if !path.is_file() {
            return Err(LoaderError::FileNotFound(path.to_path_buf()));
        }

        let null_values = if null_tokens.is_empty() {
            None
        } else {
            Some(NullValues::AllColumns(
                null_tokens.iter().map(|t| t.as_str().into()).collect(),
            ))
        };

        // Infer over the whole file: a column can be whole numbers for
        // thousands of rows before its first decimal.
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(None)
            .with_null_values(null_values)
            .finish()?
            .collect()?;

        Self::validate_schema(&df)?;

        log::info!(
            "Loaded {} rows, {} columns from {}",
            df.height(),
            df.width(),
            path.display()
        );
        Ok(df)
    }

    /// Check required columns exist and pollutants are numeric.
    pub fn validate_schema(df: &DataFrame) -> Result<(), LoaderError> {
        let columns = Self::get_columns(df);
        for required in DATE_COLUMNS.iter().chain(REQUIRED_POLLUTANTS.iter()) {
            if !columns.iter().any(|c| c == required) {
                return Err(LoaderError::MissingColumn(required.to_string()));
            }
        }

        for pollutant in REQUIRED_POLLUTANTS {
            let column = df.column(pollutant)?;
            if !Self::is_numeric(column.dtype()) {
                return Err(LoaderError::NonNumericColumn {
                    column: pollutant.to_string(),
                    dtype: column.dtype().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Get list of column names from a DataFrame.
    pub fn get_columns(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Get list of numeric column names, in file order.
    pub fn get_numeric_columns(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| Self::is_numeric(col.dtype()))
            .map(|col| col.name().to_string())
            .collect()
    }

    fn is_numeric(dtype: &DataType) -> bool {
        matches!(
            dtype,
            DataType::Float32
                | DataType::Float64
                | DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
        )
    }
}

/// Shared CSV fixture helpers for unit tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    pub const HEADER: &str =
        "No,year,month,day,hour,PM2.5,PM10,SO2,NO2,CO,O3,TEMP,PRES,DEWP,RAIN,wd,WSPM,station";

    /// Write `body` under the standard header to a temp file.
    pub fn write_csv(body: &str) -> NamedTempFile {
        write_raw(&format!("{HEADER}\n{body}"))
    }

    pub fn write_raw(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp csv");
        file.write_all(contents.as_bytes()).expect("write temp csv");
        file.flush().expect("flush temp csv");
        file
    }

    pub fn default_null_tokens() -> Vec<String> {
        vec!["NA".to_string(), String::new()]
    }

    pub fn load(body: &str) -> DataFrame {
        let file = write_csv(body);
        DataLoader::load_csv(file.path(), &default_null_tokens()).expect("load fixture")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn loads_rows_and_reads_na_as_null() {
        let df = load(
            "1,2013,3,1,0,4,4,4,7,300,77,-0.7,1023,-18.8,0,NNW,4.4,Gucheng\n\
             2,2013,3,1,1,NA,4,4,7,300,77,-1.1,1023.2,-18.2,0,N,4.7,Gucheng\n",
        );
        assert_eq!(df.height(), 2);
        let pm25 = df.column("PM2.5").unwrap();
        assert_eq!(pm25.null_count(), 1);
        assert!(DataLoader::get_numeric_columns(&df).contains(&"PM2.5".to_string()));
        assert!(!DataLoader::get_numeric_columns(&df).contains(&"wd".to_string()));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = DataLoader::load_csv(Path::new("/nonexistent/prsa.csv"), &[]).unwrap_err();
        assert!(matches!(err, LoaderError::FileNotFound(_)));
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let file = write_raw("year,month,day,hour,PM2.5,PM10,SO2\n2013,3,1,0,4,4,4\n");
        let err = DataLoader::load_csv(file.path(), &default_null_tokens()).unwrap_err();
        match err {
            LoaderError::MissingColumn(name) => assert_eq!(name, "NO2"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn text_in_pollutant_column_is_malformed() {
        let file = write_raw(
            "year,month,day,hour,PM2.5,PM10,SO2,NO2\n\
             2013,3,1,0,high,4,4,7\n\
             2013,3,1,1,low,4,4,7\n",
        );
        let err = DataLoader::load_csv(file.path(), &default_null_tokens()).unwrap_err();
        assert!(matches!(err, LoaderError::NonNumericColumn { .. }));
    }

    #[test]
    fn late_decimal_keeps_column_float() {
        let mut body = String::new();
        for i in 0..10_050 {
            let so2 = if i == 10_040 { "1.9992".to_string() } else { (i % 9).to_string() };
            body.push_str(&format!(
                "{i},2014,1,1,0,4,4,{so2},7,300,77,-0.7,1023,-18.8,0,NNW,4.4,Gucheng\n"
            ));
        }
        let df = load(&body);

        assert_eq!(df.height(), 10_050);
        let so2 = df.column("SO2").unwrap();
        assert_eq!(so2.dtype(), &DataType::Float64);
        assert_eq!(so2.f64().unwrap().get(10_040), Some(1.9992));
    }

    #[test]
    fn empty_cells_are_null() {
        let df = load("1,2013,3,1,0,,4,4,7,300,77,-0.7,1023,-18.8,0,,4.4,Gucheng\n");
        assert_eq!(df.column("PM2.5").unwrap().null_count(), 1);
        assert_eq!(df.column("wd").unwrap().null_count(), 1);
    }
}
