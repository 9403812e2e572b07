//! Chart Viewer Widget
//! Central scrollable page with the trend chart, seasonal chart and tables.

use crate::charts::ChartPlotter;
use crate::stats::DashboardReport;
use egui::{RichText, ScrollArea};

const SECTION_SPACING: f32 = 15.0;

/// Renders the current report; holds nothing but the last computed result.
#[derive(Default)]
pub struct ChartViewer {
    pub report: Option<DashboardReport>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.report = None;
    }

    pub fn set_report(&mut self, report: DashboardReport) {
        self.report = Some(report);
    }

    /// Draw the page
    pub fn show(&self, ui: &mut egui::Ui, title: &str, show_raw: bool) {
        let Some(report) = &self.report else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        let (start, end) = (report.range.start(), report.range.end());

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading(RichText::new(format!("{title} ({start}-{end})")).size(24.0));
                ui.label("Air pollution trends and the effect of seasons on air quality.");
                if report.is_empty() {
                    Self::empty_note(ui);
                }
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "Monthly PM2.5 and PM10 Trend");
                ChartPlotter::draw_monthly_trend(ui, &report.monthly);
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "Seasonal Effect on Air Quality");
                ChartPlotter::draw_seasonal_bars(ui, &report.seasonal);
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "Descriptive Statistics");
                ChartPlotter::draw_descriptive_table(ui, &report.descriptive);
                ui.add_space(SECTION_SPACING);

                Self::section(ui, "Seasonal Ranking");
                ChartPlotter::draw_ranking_table(ui, &report.ranking);

                if show_raw {
                    ui.add_space(SECTION_SPACING);
                    Self::section(ui, &format!("Raw Data ({} rows)", report.row_count()));
                    ChartPlotter::draw_raw_table(ui, &report.visible);
                }
            });
    }

    fn section(ui: &mut egui::Ui, title: &str) {
        ui.label(RichText::new(title).size(18.0).strong());
        ui.add_space(6.0);
    }

    fn empty_note(ui: &mut egui::Ui) {
        ui.label(RichText::new("No records in the selected years").italics());
    }
}
