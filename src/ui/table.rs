use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::indicators::pretty_label;
use crate::data::summary::region_summaries;
use crate::state::AppState;

const ROW_HEIGHT: f32 = 18.0;

/// Per-region statistics of the selected disease over the current view.
pub fn summary_table(ui: &mut Ui, state: &AppState) {
    let (Some(dataset), Some(disease)) = (&state.dataset, &state.disease) else {
        return;
    };
    let rows = region_summaries(dataset, &state.visible_indices, disease);
    if rows.is_empty() {
        ui.label("No values for the current selection.");
        return;
    }

    ui.label(RichText::new(format!("{} by region", pretty_label(disease))).strong());

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto().at_least(140.0))
        .columns(Column::auto().at_least(70.0), 5)
        .header(20.0, |mut header| {
            for title in ["Region", "Count", "Mean", "Min", "Max", "Latest"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for row in &rows {
                body.row(ROW_HEIGHT, |mut r| {
                    r.col(|ui| {
                        ui.label(&row.region);
                    });
                    r.col(|ui| {
                        ui.label(row.count.to_string());
                    });
                    for v in [row.mean, row.min, row.max] {
                        r.col(|ui| {
                            ui.label(format!("{v:.3}"));
                        });
                    }
                    r.col(|ui| {
                        ui.label(row.latest.map_or("–".to_string(), |v| format!("{v:.3}")));
                    });
                });
            }
        });
}
