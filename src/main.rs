//! Air Quality Dashboard - hourly pollution time series viewer
//!
//! Loads one station's CSV once at startup, cleans it and labels seasons, then
//! shows monthly trends, seasonal means and summary tables for a chosen range
//! of years.

mod charts;
mod config;
mod data;
mod gui;
mod stats;

use anyhow::Context;
use config::DashboardConfig;
use data::{DataLoader, DataProcessor};
use eframe::egui;
use gui::AirQualityApp;

/// Slider bounds when neither the config nor the data provide any.
const REFERENCE_YEARS: (i32, i32) = (2013, 2017);

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DashboardConfig::load(std::env::args()).context("loading configuration")?;

    // A load or clean failure ends the process before any window opens.
    let raw = DataLoader::load_csv(&config.data_path, &config.null_tokens)
        .with_context(|| format!("loading {}", config.data_path.display()))?;
    let (dataset, cleaning) =
        DataProcessor::prepare(&raw, &config.cleaning).context("cleaning data")?;
    drop(raw);
    if dataset.is_empty() {
        log::warn!("No complete rows left after cleaning: {cleaning}");
    }

    let bounds = config
        .year_bounds
        .or_else(|| dataset.year_span())
        .unwrap_or(REFERENCE_YEARS);
    log::info!(
        "{} observations ready, years {}-{}",
        dataset.len(),
        bounds.0,
        bounds.1
    );

    let source_name = config
        .data_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| config.data_path.display().to_string());
    let title = config.title;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 600.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        "Air Quality Dashboard",
        options,
        Box::new(move |cc| {
            Ok(Box::new(AirQualityApp::new(
                cc,
                title,
                source_name,
                dataset,
                cleaning,
                bounds,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {e}"))
}
