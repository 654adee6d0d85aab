use std::collections::BTreeMap;

use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

use super::{date_from_day, day_number};
use crate::data::indicators::pretty_label;
use crate::data::model::{Dataset, Record};
use crate::data::summary::pearson;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 320.0;

fn format_day(x: f64, pattern: &str) -> String {
    date_from_day(x)
        .map(|d| d.format(pattern).to_string())
        .unwrap_or_default()
}

/// Group `(x, y)` points of the visible records by region.
fn series_by_region<F>(dataset: &Dataset, indices: &[usize], point: F) -> BTreeMap<String, Vec<[f64; 2]>>
where
    F: Fn(&Record) -> Option<[f64; 2]>,
{
    let mut series: BTreeMap<String, Vec<[f64; 2]>> = BTreeMap::new();
    for rec in indices.iter().filter_map(|&i| dataset.record(i)) {
        if let Some(p) = point(rec) {
            series.entry(rec.region.clone()).or_default().push(p);
        }
    }
    series
}

// ---------------------------------------------------------------------------
// Disease trends over time
// ---------------------------------------------------------------------------

/// One line per selected region of the selected disease over time.
pub fn trend_chart(ui: &mut Ui, state: &AppState) {
    let (Some(dataset), Some(disease)) = (&state.dataset, &state.disease) else {
        ui.label("No disease column available.");
        return;
    };

    let mut series = series_by_region(dataset, &state.visible_indices, |rec| {
        Some([day_number(rec.date), rec.number(disease)?])
    });
    for points in series.values_mut() {
        points.sort_by(|a, b| a[0].total_cmp(&b[0]));
    }

    ui.label(RichText::new(format!("{} Over Time", pretty_label(disease))).strong());

    Plot::new("trend_plot")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label("Date")
        .y_axis_label(pretty_label(disease))
        .x_axis_formatter(|mark, _range| format_day(mark.value, "%Y-%m"))
        .label_formatter(|name, value| {
            let date = format_day(value.x, "%Y-%m-%d");
            if name.is_empty() {
                format!("{date}\n{:.3}", value.y)
            } else {
                format!("{name}\n{date}\n{:.3}", value.y)
            }
        })
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (region, points) in series {
                let color = state
                    .region_colors
                    .as_ref()
                    .map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(&region));
                plot_ui.line(
                    Line::new(PlotPoints::new(points))
                        .name(&region)
                        .color(color)
                        .width(1.5),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Behavioral & demographic correlation
// ---------------------------------------------------------------------------

/// Driver selector plus a scatter of driver vs. disease coloured by region.
pub fn correlation_chart(ui: &mut Ui, state: &mut AppState) {
    let drivers = state.indicators.drivers.clone();
    let current = state.driver.clone().unwrap_or_default();

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Choose variable to compare with incidence:");
        egui::ComboBox::from_id_salt("driver")
            .selected_text(pretty_label(&current))
            .show_ui(ui, |ui: &mut Ui| {
                for col in &drivers {
                    if ui
                        .selectable_label(current == *col, pretty_label(col))
                        .clicked()
                    {
                        state.set_driver(col.clone());
                    }
                }
            });
    });

    let (Some(dataset), Some(disease), Some(driver)) = (&state.dataset, &state.disease, &state.driver) else {
        return;
    };

    let series = series_by_region(dataset, &state.visible_indices, |rec| {
        Some([rec.number(driver)?, rec.number(disease)?])
    });

    let caption = match pearson(dataset, &state.visible_indices, driver, disease) {
        Some(r) => format!("{} vs. {}  (Pearson r = {r:.3})", pretty_label(driver), pretty_label(disease)),
        None => format!("{} vs. {}", pretty_label(driver), pretty_label(disease)),
    };
    ui.label(RichText::new(caption).strong());

    Plot::new("correlation_plot")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label(pretty_label(driver))
        .y_axis_label(pretty_label(disease))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (region, points) in series {
                let color = state
                    .region_colors
                    .as_ref()
                    .map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(&region));
                plot_ui.points(
                    Points::new(PlotPoints::new(points))
                        .name(&region)
                        .color(color)
                        .radius(3.0),
                );
            }
        });
}
