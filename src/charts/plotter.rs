//! Chart Plotter Module
//! Creates interactive visualizations and tables using egui_plot / egui::Grid.

use crate::data::{AirQualityTable, Season, SEASONAL_POLLUTANTS};
use crate::stats::{DescriptiveStats, MonthlySeries, SeasonalAggregate, SeasonalRanking};
use chrono::{Datelike, NaiveDate};
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};
use polars::prelude::Column;

pub const PM25_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue
pub const PM10_COLOR: Color32 = Color32::from_rgb(231, 76, 60); // Red

/// Bar colors for PM2.5, SO2, NO2
pub const SEASONAL_PALETTE: [Color32; 3] = [
    Color32::from_rgb(52, 152, 219), // Blue
    Color32::from_rgb(243, 156, 18), // Orange
    Color32::from_rgb(46, 204, 113), // Green
];

const CHART_HEIGHT: f32 = 320.0;
const BAR_WIDTH: f64 = 0.25;
const RAW_ROW_HEIGHT: f32 = 18.0;

/// Month index used as the x coordinate of the trend chart.
pub fn month_index(date: NaiveDate) -> f64 {
    (date.year() * 12 + date.month0() as i32) as f64
}

/// Inverse of [`month_index`] for axis labels; empty between months.
pub fn month_label(value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 {
        return String::new();
    }
    let idx = rounded as i32;
    format!("{}-{:02}", idx.div_euclid(12), idx.rem_euclid(12) + 1)
}

/// Season name for a bar-chart grid mark; empty off the season positions.
pub fn season_label(value: f64) -> String {
    if value < 0.0 || (value - value.round()).abs() > 1e-6 {
        return String::new();
    }
    Season::ALL
        .get(value.round() as usize)
        .map(|s| s.name().to_string())
        .unwrap_or_default()
}

/// One cell as display text; strings lose their quotes.
pub fn cell_text(column: &Column, row: usize) -> String {
    column
        .as_materialized_series()
        .get(row)
        .map(|value| value.to_string().trim_matches('"').to_string())
        .unwrap_or_default()
}

/// Creates the dashboard charts and tables.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Monthly PM2.5 / PM10 trend lines.
    pub fn draw_monthly_trend(ui: &mut egui::Ui, monthly: &MonthlySeries) {
        let series = [("PM2.5", PM25_COLOR), ("PM10", PM10_COLOR)];

        Plot::new("monthly_trend")
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .x_axis_label("Month")
            .y_axis_label("Concentration (µg/m³)")
            .allow_scroll(false)
            .x_axis_formatter(|mark, _range| month_label(mark.value))
            .label_formatter(|name, value| {
                if name.is_empty() {
                    String::new()
                } else {
                    format!("{name}\n{}: {:.1}", month_label(value.x.round()), value.y)
                }
            })
            .show(ui, |plot_ui| {
                for (name, color) in series {
                    let Some(points) = monthly.column(name) else {
                        continue;
                    };
                    let line_points: PlotPoints = points
                        .iter()
                        .map(|&(month_end, mean)| [month_index(month_end), mean])
                        .collect();
                    plot_ui.line(
                        Line::new(line_points)
                            .color(color)
                            .width(2.0)
                            .name(name),
                    );
                }
            });
    }

    /// Grouped bars of seasonal PM2.5 / SO2 / NO2 means.
    ///
    /// Seasons sit at fixed x positions so a missing season leaves a gap.
    pub fn draw_seasonal_bars(ui: &mut egui::Ui, seasonal: &[SeasonalAggregate]) {
        Plot::new("seasonal_bars")
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .x_axis_label("Season")
            .y_axis_label("Concentration (µg/m³)")
            .allow_scroll(false)
            .allow_drag(false)
            .include_y(0.0)
            .x_axis_formatter(|mark, _range| season_label(mark.value))
            .show(ui, |plot_ui| {
                for (k, (name, color)) in SEASONAL_POLLUTANTS
                    .iter()
                    .zip(SEASONAL_PALETTE)
                    .enumerate()
                {
                    let offset = (k as f64 - 1.0) * BAR_WIDTH;
                    let bars: Vec<Bar> = seasonal
                        .iter()
                        .map(|agg| {
                            let x = f64::from(agg.season.rank() - 1) + offset;
                            Bar::new(x, agg.pollutant_means()[k])
                                .width(BAR_WIDTH)
                                .name(format!("{} {}", agg.season, name))
                        })
                        .collect();
                    plot_ui.bar_chart(BarChart::new(bars).color(color).name(*name));
                }
            });
    }

    /// count / mean / std / min / quartiles / max, one column per pollutant.
    pub fn draw_descriptive_table(ui: &mut egui::Ui, stats: &[DescriptiveStats]) {
        type Getter = fn(&DescriptiveStats) -> f64;
        let rows: [(&str, Getter); 7] = [
            ("mean", |s| s.mean),
            ("std", |s| s.std),
            ("min", |s| s.min),
            ("25%", |s| s.q25),
            ("50%", |s| s.median),
            ("75%", |s| s.q75),
            ("max", |s| s.max),
        ];

        Self::table_frame(ui, |ui| {
            egui::Grid::new("descriptive_table")
                .striped(true)
                .min_col_width(70.0)
                .spacing([12.0, 4.0])
                .show(ui, |ui| {
                    ui.label(RichText::new("").strong());
                    for s in stats {
                        ui.label(RichText::new(&s.column).strong().size(12.0));
                    }
                    ui.end_row();

                    ui.label(RichText::new("count").strong().size(12.0));
                    for s in stats {
                        ui.label(RichText::new(s.count.to_string()).size(12.0));
                    }
                    ui.end_row();

                    for (label, get) in rows {
                        ui.label(RichText::new(label).strong().size(12.0));
                        for s in stats {
                            ui.label(RichText::new(format!("{:.3}", get(s))).size(12.0));
                        }
                        ui.end_row();
                    }
                });
        });
    }

    /// Seasonal means with rank, mean-of-means and max-of-means columns.
    pub fn draw_ranking_table(ui: &mut egui::Ui, ranking: &[SeasonalRanking]) {
        Self::table_frame(ui, |ui| {
            egui::Grid::new("ranking_table")
                .striped(true)
                .min_col_width(60.0)
                .spacing([12.0, 4.0])
                .show(ui, |ui| {
                    let headers = [
                        "Season", "Records", "PM2.5", "SO2", "NO2", "Rank", "Mean", "Max",
                    ];
                    for header in headers {
                        ui.label(RichText::new(header).strong().size(12.0));
                    }
                    ui.end_row();

                    for row in ranking {
                        let agg = &row.aggregate;
                        ui.label(RichText::new(agg.season.name()).size(12.0));
                        ui.label(RichText::new(agg.record_count.to_string()).size(12.0));
                        for value in agg.pollutant_means() {
                            ui.label(RichText::new(format!("{value:.2}")).size(12.0));
                        }
                        ui.label(RichText::new(row.rank.to_string()).size(12.0));
                        ui.label(RichText::new(format!("{:.2}", row.mean)).size(12.0));
                        ui.label(RichText::new(format!("{:.2}", row.max)).size(12.0));
                        ui.end_row();
                    }
                });
        });
    }

    /// Unaggregated rows; only the visible slice is laid out.
    pub fn draw_raw_table(ui: &mut egui::Ui, table: &AirQualityTable) {
        let columns: Vec<&Column> = table
            .display_columns()
            .into_iter()
            .filter_map(|name| table.frame.column(name).ok())
            .collect();
        let total_rows = table.len() + 1;

        egui::ScrollArea::both()
            .id_salt("raw_table_scroll")
            .max_height(400.0)
            .auto_shrink([false, true])
            .show_rows(ui, RAW_ROW_HEIGHT, total_rows, |ui, row_range| {
                egui::Grid::new("raw_table")
                    .striped(true)
                    .min_col_width(50.0)
                    .show(ui, |ui| {
                        for row in row_range {
                            for column in &columns {
                                if row == 0 {
                                    ui.label(RichText::new(column.name().as_str()).strong());
                                } else {
                                    ui.label(cell_text(column, row - 1));
                                }
                            }
                            ui.end_row();
                        }
                    });
            });
    }

    fn table_frame(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, add_contents);
    }
}
