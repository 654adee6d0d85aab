use std::collections::BTreeMap;

use eframe::egui::{self, Color32, Mesh, RichText, Shape, Stroke, Ui};
use egui_plot::{Plot, PlotPoint};

use crate::color::{SequentialRamp, NO_DATA};
use crate::data::indicators::pretty_label;
use crate::data::summary::latest_per_region;
use crate::geo::{normalize_region, Boundaries};
use crate::state::AppState;

const MAP_HEIGHT: f32 = 500.0;

/// Latest value of `column` per region within the current view, keyed by
/// normalized region name so it can be joined to boundary shapes.
pub fn latest_values(state: &AppState, column: &str) -> BTreeMap<String, f64> {
    let Some(dataset) = &state.dataset else {
        return BTreeMap::new();
    };
    latest_per_region(dataset, &state.visible_indices)
        .into_iter()
        .filter_map(|(region, i)| {
            let value = dataset.record(i)?.number(column)?;
            Some((normalize_region(&region), value))
        })
        .collect()
}

/// Map extent as `(min, max)` corners in lon/lat.
fn extent(boundaries: &Boundaries) -> Option<([f64; 2], [f64; 2])> {
    let mut points = boundaries
        .regions
        .iter()
        .flat_map(|r| r.rings.iter().flatten());
    let first = *points.next()?;
    Some(points.fold((first, first), |(lo, hi), p| {
        ([lo[0].min(p[0]), lo[1].min(p[1])], [hi[0].max(p[0]), hi[1].max(p[1])])
    }))
}

// ---------------------------------------------------------------------------
// Choropleth (central panel)
// ---------------------------------------------------------------------------

/// Regions filled by the latest value of the selected disease.
pub fn choropleth(ui: &mut Ui, state: &AppState) {
    let Some(boundaries) = &state.boundaries else {
        let msg = state
            .boundary_message
            .as_deref()
            .unwrap_or("No boundary file loaded (File → Open boundaries…)");
        ui.label(RichText::new(msg).italics());
        return;
    };
    let Some(disease) = &state.disease else {
        return;
    };
    let Some((lo, hi)) = extent(boundaries) else {
        return;
    };

    let values = latest_values(state, disease);
    let ramp = SequentialRamp::from_values(values.values().copied());

    let response = Plot::new("choropleth")
        .height(MAP_HEIGHT)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .show_x(false)
        .show_y(false)
        .allow_scroll(false)
        .include_x(lo[0])
        .include_x(hi[0])
        .include_y(lo[1])
        .include_y(hi[1])
        .show(ui, |_plot_ui| {});

    let transform = response.transform;
    let painter = ui.painter_at(response.response.rect);
    let outline = Stroke::new(1.0, Color32::from_gray(90));

    for shape in &boundaries.regions {
        let value = values.get(&normalize_region(&shape.name)).copied();
        let fill = ramp.map_or(NO_DATA, |r| r.color_for(value));

        for (ring, triangles) in shape.rings.iter().zip(&shape.triangles) {
            let screen: Vec<egui::Pos2> = ring
                .iter()
                .map(|p| transform.position_from_point(&PlotPoint::new(p[0], p[1])))
                .collect();

            let mut mesh = Mesh::default();
            for pos in &screen {
                mesh.colored_vertex(*pos, fill.gamma_multiply(0.85));
            }
            for t in triangles {
                mesh.add_triangle(t[0] as u32, t[1] as u32, t[2] as u32);
            }
            painter.add(Shape::mesh(mesh));
            painter.add(Shape::closed_line(screen, outline));
        }
    }

    let hovered = response
        .response
        .hover_pos()
        .map(|pos| transform.value_from_position(pos))
        .and_then(|pt| boundaries.region_at(pt.x, pt.y));
    if let Some(shape) = hovered {
        let text = match values.get(&normalize_region(&shape.name)) {
            Some(v) => format!("{}: {v:.3}", shape.name),
            None => format!("{}: no data", shape.name),
        };
        response.response.on_hover_text_at_pointer(text);
    }

    legend(ui, disease, ramp);
}

fn legend(ui: &mut Ui, disease: &str, ramp: Option<SequentialRamp>) {
    ui.horizontal_wrapped(|ui: &mut Ui| {
        ui.label(RichText::new(pretty_label(disease)).strong());
        if let Some(ramp) = ramp {
            for (value, color) in ramp.legend_stops(5) {
                ui.label(RichText::new("■").color(color));
                ui.label(format!("{value:.2}"));
            }
        }
        ui.label(RichText::new("■").color(NO_DATA));
        ui.label("no data");
    });
}
