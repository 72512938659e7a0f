use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{Line, Plot, PlotPoint, PlotPoints, Text, VLine};

use crate::data::pipeline::Outcome;
use crate::render::{row_runs, scales};
use crate::state::AppState;
use crate::ui::preview;

// ---------------------------------------------------------------------------
// Parallel-coordinates view (central panel)
// ---------------------------------------------------------------------------

/// Render the explorer in the central panel.
pub fn explorer_view(ui: &mut Ui, state: &AppState) {
    if state.session.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to explore it  (File → Open…)");
        });
        return;
    }

    let Some(outcome) = &state.outcome else {
        return;
    };

    let projection = match outcome {
        Outcome::NeedsSelection => {
            ui.label("Please select at least one numeric column to continue.");
            return;
        }
        Outcome::Empty { shape } => {
            ui.label(format!("Filtered data shape: {shape:?}"));
            ui.label(
                RichText::new("No data after filtering. Try adjusting the sliders.")
                    .color(Color32::YELLOW),
            );
            return;
        }
        Outcome::Ready { shape, projection } => {
            ui.label(format!("Filtered data shape: {shape:?}"));
            projection
        }
    };

    let axis_scales = scales(projection);
    let colors = projection.color();
    let height = state.config.viewport_height.min(ui.available_height() * 0.7);

    let mut plot = Plot::new("parallel_plot").height(height);
    // Named lines are grouped by colour label; without one, names carry the uid.
    if colors.is_some() {
        plot = plot.legend(egui_plot::Legend::default());
    }

    plot.show_axes([false, false])
        .show_grid([false, true])
        .include_y(-0.05)
        .include_y(1.1)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for row in 0..projection.num_rows() {
                let (color, name) = match colors {
                    Some(labels) => (state.color_map.color_for(&labels[row]), labels[row].clone()),
                    None => (
                        state.color_map.default_color(),
                        format!("uid {}", projection.uid()[row]),
                    ),
                };

                for run in row_runs(projection, &axis_scales, row) {
                    let points: PlotPoints = run.iter().map(|&(i, y)| [i as f64, y]).collect();
                    plot_ui.line(Line::new(points).name(&name).color(color).width(1.0));
                }
            }

            for (i, (axis, scale)) in projection.axes().iter().zip(&axis_scales).enumerate() {
                let x = i as f64;
                plot_ui.vline(VLine::new(x).color(Color32::GRAY).width(1.5));
                plot_ui.text(Text::new(
                    PlotPoint::new(x, 1.08),
                    RichText::new(&axis.name).strong(),
                ));
                plot_ui.text(Text::new(
                    PlotPoint::new(x, 1.02),
                    RichText::new(format!("{:.3}", scale.max)).small(),
                ));
                plot_ui.text(Text::new(
                    PlotPoint::new(x, -0.03),
                    RichText::new(format!("{:.3}", scale.min)).small(),
                ));
            }
        });

    ui.add_space(6.0);
    egui::CollapsingHeader::new("Data preview")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            preview::projection_table(ui, projection, state.config.preview_rows);
        });
}
