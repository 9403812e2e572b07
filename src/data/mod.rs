//! Data module - CSV loading, cleaning and season labelling

mod loader;
mod model;
mod processor;

pub use loader::DataLoader;
pub use model::{
    AirQualityTable, Season, REQUIRED_POLLUTANTS, SEASONAL_POLLUTANTS, SEASON_COLUMN,
    TIMESTAMP_COLUMN,
};
pub use processor::{CleaningPolicy, CleaningReport, DataProcessor};

#[cfg(test)]
pub(crate) use loader::fixtures as loader_fixtures;
#[cfg(test)]
pub(crate) use processor::fixtures as processor_fixtures;
