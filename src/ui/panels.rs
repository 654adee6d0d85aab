use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::checksum::FileReport;
use crate::data::indicators::pretty_label;
use crate::state::AppState;
use crate::ui::{map, plot, table};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Panel");
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };
    if dataset.is_empty() {
        ui.label("The dataset has no records.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Disease selector ----
            ui.strong("Disease");
            let current = state.disease.clone().unwrap_or_default();
            let diseases = state.indicators.diseases.clone();
            egui::ComboBox::from_id_salt("disease")
                .selected_text(pretty_label(&current))
                .show_ui(ui, |ui: &mut Ui| {
                    for col in &diseases {
                        if ui
                            .selectable_label(current == *col, pretty_label(col))
                            .clicked()
                        {
                            state.set_disease(col.clone());
                        }
                    }
                });
            ui.separator();

            // ---- Date range ----
            if let (Some(sel), Some((min, max))) = (&state.selection, state.date_bounds()) {
                ui.strong("Date Range");
                let (mut start, mut end) = (sel.start, sel.end);
                let mut changed = false;
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("From");
                    changed |= ui.add(DatePickerButton::new(&mut start).id_salt("start_date")).changed();
                });
                ui.horizontal(|ui: &mut Ui| {
                    ui.label("To");
                    changed |= ui.add(DatePickerButton::new(&mut end).id_salt("end_date")).changed();
                });
                if ui.small_button("Full range").clicked() {
                    start = min;
                    end = max;
                    changed = true;
                }
                if start > end {
                    ui.label(RichText::new("Start is after end: nothing to show.").color(Color32::YELLOW));
                }
                if changed {
                    state.set_date_range(start, end);
                }
                ui.separator();
            }

            // ---- Region multi-select ----
            let n_selected = state.selection.as_ref().map_or(0, |s| s.regions.len());
            let n_total = dataset.regions().len();
            egui::CollapsingHeader::new(
                RichText::new(format!("Select Region(s)  ({n_selected}/{n_total})")).strong(),
            )
            .id_salt("regions")
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                ui.horizontal(|ui: &mut Ui| {
                    if ui.small_button("All").clicked() {
                        state.select_all_regions();
                    }
                    if ui.small_button("None").clicked() {
                        state.select_no_regions();
                    }
                });

                for region in dataset.regions() {
                    let mut text = RichText::new(region);
                    if let Some(cm) = &state.region_colors {
                        text = text.color(cm.color_for(region));
                    }
                    let mut checked = state.is_region_selected(region);
                    if ui.checkbox(&mut checked, text).changed() {
                        state.toggle_region(region);
                    }
                }
            });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open dataset…").clicked() {
                open_dataset_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open boundaries…").clicked() {
                open_boundaries_dialog(state);
                ui.close_menu();
            }
        });
        ui.menu_button("Integrity", |ui: &mut Ui| {
            if ui.button("Verify checksums").clicked() {
                state.run_checksums();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let source = state
                .data_source
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!(
                "{source}: {} records loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.load_error {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// All dashboard sections, or the error state when nothing is loaded.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| match &state.load_error {
            Some(err) => {
                ui.heading(RichText::new(err).color(Color32::RED));
            }
            None => {
                ui.heading("Open a dataset to begin  (File → Open dataset…)");
            }
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Ghana Infectious Disease Trends Dashboard");
            ui.label(RichText::new("Machine Learning-Powered Epidemiology | HIV/AIDS Focus").italics());
            ui.add_space(8.0);

            ui.heading("1. National Disease Trends Over Time");
            plot::trend_chart(ui, state);
            ui.add_space(12.0);

            ui.heading("2. Regional Distribution Map");
            map::choropleth(ui, state);
            ui.add_space(12.0);

            ui.heading("3. Behavioral & Demographic Correlation");
            plot::correlation_chart(ui, state);
            ui.add_space(12.0);

            ui.heading("4. Regional Summary");
            table::summary_table(ui, state);
            ui.add_space(12.0);

            ui.heading("5. ML Forecasting Results");
            ui.label("Coming soon: machine learning forecasts of HIV/AIDS incidence to 2030.");
        });
}

// ---------------------------------------------------------------------------
// Integrity window
// ---------------------------------------------------------------------------

pub fn integrity_window(ctx: &egui::Context, state: &mut AppState) {
    if !state.show_integrity {
        return;
    }
    let mut open = true;
    let mut rerun = false;

    egui::Window::new("Integrity")
        .open(&mut open)
        .resizable(true)
        .show(ctx, |ui: &mut Ui| {
            ui.label(format!("Manifest: {}", state.config.checksum_manifest.display()));
            ui.separator();
            match &state.checksum_reports {
                Some(Ok(reports)) if reports.is_empty() => {
                    ui.label("Manifest lists no files.");
                }
                Some(Ok(reports)) => {
                    for report in reports {
                        report_line(ui, report);
                    }
                }
                Some(Err(e)) => {
                    ui.label(RichText::new(e).color(Color32::RED));
                }
                None => {}
            }
            if ui.button("Verify again").clicked() {
                rerun = true;
            }
        });

    state.show_integrity = open;
    if rerun {
        state.run_checksums();
    }
}

fn report_line(ui: &mut Ui, report: &FileReport) {
    let color = if report.is_ok() {
        Color32::GREEN
    } else {
        Color32::RED
    };
    ui.label(RichText::new(report.to_string()).color(color).monospace());
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_dataset_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open disease dataset")
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.load_dataset(&path);
    }
}

pub fn open_boundaries_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open region boundaries")
        .add_filter("GeoJSON", &["geojson", "json"])
        .pick_file();

    if let Some(path) = file {
        state.load_boundaries(&path);
    }
}
