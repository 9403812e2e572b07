//! Air Quality Dashboard Main Application
//! Main window with control panel and report viewer.

use crate::data::{AirQualityTable, CleaningReport};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::stats::{DashboardReport, YearRange};
use egui::SidePanel;

/// Main application window.
///
/// Owns the cleaned dataset, which is never modified after startup; every
/// year-range change recomputes the report from it.
pub struct AirQualityApp {
    title: String,
    dataset: AirQualityTable,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
}

impl AirQualityApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        title: String,
        source_name: String,
        dataset: AirQualityTable,
        cleaning: CleaningReport,
        bounds: (i32, i32),
    ) -> Self {
        let mut app = Self {
            title,
            dataset,
            control_panel: ControlPanel::new(bounds, source_name, cleaning),
            chart_viewer: ChartViewer::new(),
        };
        app.recompute();
        app
    }

    /// Rebuild the report for the selected years.
    fn recompute(&mut self) {
        let settings = self.control_panel.settings;
        let result = YearRange::new(settings.start_year, settings.end_year)
            .and_then(|range| DashboardReport::compute(&self.dataset, range));

        match result {
            Ok(report) => {
                self.control_panel.set_status(&format!(
                    "{} records in {}-{}",
                    report.row_count(),
                    settings.start_year,
                    settings.end_year
                ));
                self.chart_viewer.set_report(report);
            }
            Err(e) => {
                log::error!("Report failed: {e}");
                self.chart_viewer.clear();
                self.control_panel.set_status(&format!("Error: {e}"));
            }
        }
    }
}

impl eframe::App for AirQualityApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::YearRangeChanged => self.recompute(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Report
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer
                .show(ui, &self.title, self.control_panel.settings.show_raw);
        });
    }
}
