use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use parquet::arrow::ArrowWriter;

use crate::data::loader::load_file;
use crate::data::pipeline::Outcome;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – column selection, range sliders, colour
// ---------------------------------------------------------------------------

/// A change requested by a widget, applied after the panel is drawn.
enum Action {
    Toggle(String),
    Range(String, f64, f64),
    Color(Option<String>),
}

/// Render the left selection / filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Columns");
    ui.separator();

    let Some(session) = &state.session else {
        ui.label("No dataset loaded.");
        return;
    };

    let mut actions = Vec::new();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Numeric column multiselect ----
            ui.strong("Select columns to plot");
            if session.classes.numeric.is_empty() {
                ui.label(RichText::new("No numeric columns in this file.").italics());
            }
            for col in &session.classes.numeric {
                let position = state.selection.columns.iter().position(|c| c == col);
                let mut checked = position.is_some();
                let label = match position {
                    Some(i) => format!("{col}  #{}", i + 1),
                    None => col.clone(),
                };
                let enabled = session.bounds.contains_key(col);
                let response = ui
                    .add_enabled(enabled, egui::Checkbox::new(&mut checked, label))
                    .on_disabled_hover_text("Column has no numeric values");
                if response.changed() {
                    actions.push(Action::Toggle(col.clone()));
                }
            }
            ui.separator();

            // ---- Range sliders for the selected columns ----
            if !state.selection.columns.is_empty() {
                ui.strong("Apply filters to selected columns");
                for col in &state.selection.columns {
                    let (Some(bounds), Some(range)) = (session.bounds.get(col), state.ranges.get(col))
                    else {
                        continue;
                    };
                    let (mut low, mut high) = (range.low(), range.high());
                    let span = bounds.low()..=bounds.high();

                    egui::CollapsingHeader::new(RichText::new(format!("{col} range")).strong())
                        .id_salt(col)
                        .default_open(true)
                        .show(ui, |ui: &mut Ui| {
                            let lo_changed = ui
                                .add(egui::Slider::new(&mut low, span.clone()).text("min"))
                                .changed();
                            let hi_changed = ui
                                .add(egui::Slider::new(&mut high, span).text("max"))
                                .changed();
                            if lo_changed || hi_changed {
                                actions.push(Action::Range(col.clone(), low, high));
                            }
                        });
                }
                ui.separator();
            }

            // ---- Colour-by selector ----
            ui.strong("Color by (optional)");
            let current = state.selection.color.clone();
            egui::ComboBox::from_id_salt("color_by")
                .selected_text(current.as_deref().unwrap_or("None"))
                .show_ui(ui, |ui: &mut Ui| {
                    if ui.selectable_label(current.is_none(), "None").clicked() {
                        actions.push(Action::Color(None));
                    }
                    for col in &session.classes.categorical {
                        if ui
                            .selectable_label(current.as_deref() == Some(col.as_str()), col)
                            .clicked()
                        {
                            actions.push(Action::Color(Some(col.clone())));
                        }
                    }
                });

            if !state.color_map.legend_entries().is_empty() {
                ui.add_space(4.0);
                for (label, color) in state.color_map.legend_entries() {
                    ui.label(RichText::new(label).color(color));
                }
            }
        });

    // Each action re-runs the pipeline from the loaded table.
    for action in actions {
        match action {
            Action::Toggle(col) => state.toggle_column(&col),
            Action::Range(col, low, high) => state.set_range(&col, low, high),
            Action::Color(col) => state.set_color_column(col),
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state
                .outcome
                .as_ref()
                .is_some_and(|o| o.projection().is_some());
            if ui
                .add_enabled(can_export, egui::Button::new("Export HTML…"))
                .clicked()
            {
                export_dialog(state, ExportKind::Html);
                ui.close_menu();
            }
            if ui
                .add_enabled(can_export, egui::Button::new("Export Parquet…"))
                .clicked()
            {
                export_dialog(state, ExportKind::Parquet);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(session) = &state.session {
            let (rows, cols) = session.table.shape();
            ui.label(format!("{}: {rows} rows × {cols} columns", session.source));
        }

        if let Some(notice) = &state.notice {
            ui.separator();
            ui.label(notice);
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open tabular data")
        .add_filter("Supported files", &["parquet", "pq", "csv", "json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = open_path(state, &path) {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

/// Load `path` and start a new session with it.
pub fn open_path(state: &mut AppState, path: &Path) -> Result<()> {
    let table = load_file(path).with_context(|| format!("loading {}", path.display()))?;
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    state.set_table(source, table);
    Ok(())
}

/// What the export menu writes.
#[derive(Debug, Clone, Copy)]
pub enum ExportKind {
    /// Self-contained parallel-coordinates document.
    Html,
    /// The projection table itself.
    Parquet,
}

pub fn export_dialog(state: &mut AppState, kind: ExportKind) {
    let (file_name, filter_name, ext) = match kind {
        ExportKind::Html => ("parallel_coordinates.html", "HTML", "html"),
        ExportKind::Parquet => ("projection.parquet", "Parquet", "parquet"),
    };
    let file = rfd::FileDialog::new()
        .set_title("Export filtered data")
        .set_file_name(file_name)
        .add_filter(filter_name, &[ext])
        .save_file();

    if let Some(path) = file {
        let result = match kind {
            ExportKind::Html => export_html(state, &path),
            ExportKind::Parquet => export_parquet(state, &path),
        };
        finish_export(state, &path, result);
    }
}

/// Report an export in the top bar.
fn finish_export(state: &mut AppState, path: &Path, result: Result<usize>) {
    match result {
        Ok(bytes) => {
            log::info!("Exported {bytes} bytes to {}", path.display());
            let name = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            state.notice = Some(format!("Saved {name} ({})", format_size(bytes)));
            state.status_message = None;
        }
        Err(e) => {
            log::error!("Failed to export: {e:#}");
            state.notice = None;
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

fn format_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{bytes} B")
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{:.1} MiB", b / (KIB * KIB))
    }
}

/// Render the current projection and write it to `path`.
pub fn export_html(state: &AppState, path: &Path) -> Result<usize> {
    let doc = state.render_document().context("rendering HTML")?;
    std::fs::write(path, &doc.html).with_context(|| format!("writing {}", path.display()))?;
    Ok(doc.len())
}

/// Write the current projection to `path` as Parquet.
pub fn export_parquet(state: &AppState, path: &Path) -> Result<usize> {
    let projection = state
        .outcome
        .as_ref()
        .and_then(Outcome::projection)
        .context("nothing to export: no rows after filtering")?;
    let batch = projection.to_record_batch().context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    Ok(std::fs::metadata(path)?.len() as usize)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::loader::{load_bytes, FileFormat};

    #[test]
    fn open_then_export_round_trip() {
        let mut csv = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        csv.write_all(b"a,b,kind\n1,10,x\n2,20,y\n3,30,x\n").unwrap();
        csv.flush().unwrap();

        let mut state = AppState::default();
        open_path(&mut state, csv.path()).unwrap();
        assert_eq!(state.selection.columns, vec!["a", "b"]);
        state.set_range("a", 2.0, 3.0);
        assert_eq!(state.outcome.as_ref().unwrap().filtered_shape(), Some((2, 3)));

        let out = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
        let written = export_html(&state, out.path()).unwrap();
        let html = std::fs::read_to_string(out.path()).unwrap();
        assert_eq!(html.len(), written);
        assert_eq!(html.matches("<polyline").count(), 2);

        let pq = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        export_parquet(&state, pq.path()).unwrap();
        let exported = load_bytes(std::fs::read(pq.path()).unwrap(), FileFormat::Parquet).unwrap();
        assert_eq!(exported.column_names(), vec!["uid", "a", "b"]);
        assert_eq!(exported.num_rows(), 2);
    }

    #[test]
    fn export_reports_size_in_top_bar() {
        let mut state = AppState::default();
        state.status_message = Some("Error: stale".into());

        finish_export(&mut state, Path::new("/tmp/out/chart.html"), Ok(2560));
        assert_eq!(state.notice.as_deref(), Some("Saved chart.html (2.5 KiB)"));
        assert_eq!(state.status_message, None);

        finish_export(&mut state, Path::new("chart.html"), Err(anyhow::anyhow!("disk full")));
        assert_eq!(state.notice, None);
        assert_eq!(state.status_message.as_deref(), Some("Error: disk full"));
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MiB");
    }

    #[test]
    fn failed_open_keeps_previous_session() {
        let mut csv = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        csv.write_all(b"a\n1\n").unwrap();
        csv.flush().unwrap();

        let mut state = AppState::default();
        open_path(&mut state, csv.path()).unwrap();

        let mut bad = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        bad.write_all(b"not parquet").unwrap();
        bad.flush().unwrap();

        assert!(open_path(&mut state, bad.path()).is_err());
        assert_eq!(state.session.as_ref().unwrap().table.shape(), (1, 1));
        assert!(matches!(state.outcome, Some(Outcome::Ready { .. })));
    }
}
