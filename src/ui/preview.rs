use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::data::projection::Projection;

/// Show the first `max_rows` rows of the projection as a table.
pub fn projection_table(ui: &mut Ui, projection: &Projection, max_rows: usize) {
    let names = projection.column_names();
    let n_rows = projection.num_rows().min(max_rows);

    TableBuilder::new(ui)
        .striped(true)
        .max_scroll_height(240.0)
        .columns(Column::auto().at_least(60.0).resizable(true), names.len())
        .header(20.0, |mut header| {
            for name in &names {
                header.col(|ui| {
                    ui.strong(*name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, n_rows, |mut row| {
                let i = row.index();
                row.col(|ui| {
                    ui.label(projection.uid()[i].to_string());
                });
                for axis in projection.axes() {
                    row.col(|ui| {
                        match axis.values[i] {
                            Some(v) => ui.label(format!("{v}")),
                            None => ui.weak("None"),
                        };
                    });
                }
                if let Some(labels) = projection.color() {
                    row.col(|ui| {
                        ui.label(&labels[i]);
                    });
                }
            });
        });

    if projection.num_rows() > n_rows {
        ui.weak(format!("… {} more rows", projection.num_rows() - n_rows));
    }
}
