//! Control Panel Widget
//! Left side panel with the year-range filter and display toggles.

use crate::data::CleaningReport;
use egui::{Color32, RichText};

/// User selections that drive the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSettings {
    pub start_year: i32,
    pub end_year: i32,
    pub show_raw: bool,
}

/// Left side control panel.
pub struct ControlPanel {
    pub settings: UserSettings,
    /// Inclusive slider bounds
    pub bounds: (i32, i32),
    pub source_name: String,
    pub cleaning: CleaningReport,
    pub status: String,
}

impl ControlPanel {
    pub fn new(bounds: (i32, i32), source_name: String, cleaning: CleaningReport) -> Self {
        Self {
            settings: UserSettings {
                start_year: bounds.0,
                end_year: bounds.1,
                show_raw: false,
            },
            bounds,
            source_name,
            cleaning,
            status: "Ready".to_string(),
        }
    }

    /// Keep `start <= end`, moving whichever end the user did not touch.
    pub fn reconcile(settings: &mut UserSettings, start_changed: bool) {
        if settings.start_year > settings.end_year {
            if start_changed {
                settings.end_year = settings.start_year;
            } else {
                settings.start_year = settings.end_year;
            }
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🌫 Air Quality")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new(&self.source_name).size(12.0));
                ui.label(
                    RichText::new(format!(
                        "{} of {} rows kept",
                        self.cleaning.output_rows, self.cleaning.input_rows
                    ))
                    .size(11.0)
                    .color(Color32::GRAY),
                );
                if self.cleaning.imputed_cells > 0 {
                    ui.label(
                        RichText::new(format!("{} cells imputed", self.cleaning.imputed_cells))
                            .size(11.0)
                            .color(Color32::GRAY),
                    );
                }
                if self.cleaning.skipped_invalid_timestamps > 0 {
                    ui.label(
                        RichText::new(format!(
                            "{} rows with invalid dates skipped",
                            self.cleaning.skipped_invalid_timestamps
                        ))
                        .size(11.0)
                        .color(Color32::from_rgb(243, 156, 18)),
                    );
                }
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Year Range Section =====
        ui.label(RichText::new("📅 Year Range").size(14.0).strong());
        ui.add_space(8.0);

        let (lo, hi) = self.bounds;
        let start = ui.add(egui::Slider::new(&mut self.settings.start_year, lo..=hi).text("From"));
        let end = ui.add(egui::Slider::new(&mut self.settings.end_year, lo..=hi).text("To"));

        if start.changed() || end.changed() {
            Self::reconcile(&mut self.settings, start.changed());
            action = ControlPanelAction::YearRangeChanged;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Display Section =====
        ui.checkbox(&mut self.settings.show_raw, "Show raw data");

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    YearRangeChanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(start_year: i32, end_year: i32) -> UserSettings {
        UserSettings {
            start_year,
            end_year,
            show_raw: false,
        }
    }

    #[test]
    fn moving_start_past_end_drags_end() {
        let mut s = settings(2016, 2014);
        ControlPanel::reconcile(&mut s, true);
        assert_eq!((s.start_year, s.end_year), (2016, 2016));
    }

    #[test]
    fn moving_end_below_start_drags_start() {
        let mut s = settings(2016, 2014);
        ControlPanel::reconcile(&mut s, false);
        assert_eq!((s.start_year, s.end_year), (2014, 2014));
    }

    #[test]
    fn new_panel_selects_full_range() {
        let panel =
            ControlPanel::new((2013, 2017), "station.csv".into(), CleaningReport::default());
        assert_eq!((panel.settings.start_year, panel.settings.end_year), (2013, 2017));
        assert!(!panel.settings.show_raw);
    }
}
