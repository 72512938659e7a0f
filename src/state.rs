use std::collections::BTreeMap;

use crate::color::ColorMap;
use crate::config::ExplorerConfig;
use crate::data::classify::{classify, ColumnClasses};
use crate::data::filter::{FilterSpec, NumericRange};
use crate::data::model::Table;
use crate::data::pipeline::{run, Outcome, Selection};
use crate::render::html::{render_html, HtmlDocument};
use crate::render::RenderError;

// ---------------------------------------------------------------------------
// Session – everything derived from one loaded file
// ---------------------------------------------------------------------------

/// A loaded table plus what was computed from it once at load time.
pub struct Session {
    /// Display name of the loaded file.
    pub source: String,
    pub table: Table,
    pub classes: ColumnClasses,
    /// Observed `[min, max]` per numeric column that has any finite value.
    pub bounds: BTreeMap<String, NumericRange>,
}

impl Session {
    pub fn new(source: String, table: Table) -> Self {
        let classes = classify(&table);
        let bounds = classes
            .numeric
            .iter()
            .filter_map(|name| {
                let column = table.column(name)?;
                match NumericRange::observed(column) {
                    Some(range) => Some((name.clone(), range)),
                    None => {
                        log::warn!("Numeric column '{name}' has no finite values; it cannot be filtered");
                        None
                    }
                }
            })
            .collect();
        Session {
            source,
            table,
            classes,
            bounds,
        }
    }

    /// Numeric columns that can be selected (they have an observed range).
    pub fn selectable_columns(&self) -> impl Iterator<Item = &String> {
        self.classes
            .numeric
            .iter()
            .filter(|name| self.bounds.contains_key(*name))
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ExplorerConfig,

    /// Loaded table (None until user loads a file).
    pub session: Option<Session>,

    /// Selected numeric columns and colour column.
    pub selection: Selection,

    /// Slider positions per numeric column.  Survive selection changes and
    /// are reset when a new file is loaded.
    pub ranges: BTreeMap<String, NumericRange>,

    /// Result of the last pipeline run.
    pub outcome: Option<Outcome>,

    /// Colour map for the current projection's `color` column.
    pub color_map: ColorMap,

    /// Error message shown in the UI.
    pub status_message: Option<String>,

    /// Outcome of the last export (file and size), shown in the top bar.
    pub notice: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ExplorerConfig::default())
    }
}

impl AppState {
    pub fn new(config: ExplorerConfig) -> Self {
        Self {
            config,
            session: None,
            selection: Selection::default(),
            ranges: BTreeMap::new(),
            outcome: None,
            color_map: ColorMap::uniform(),
            status_message: None,
            notice: None,
        }
    }

    /// Ingest a newly loaded table, replacing the previous session wholesale.
    pub fn set_table(&mut self, source: String, table: Table) {
        let session = Session::new(source, table);

        self.ranges = session.bounds.clone();
        self.selection = Selection {
            columns: session
                .selectable_columns()
                .take(self.config.default_selected_columns)
                .cloned()
                .collect(),
            color: None,
        };

        log::info!(
            "Loaded '{}' with shape {:?}; numeric columns {:?}",
            session.source,
            session.table.shape(),
            session.classes.numeric
        );
        self.session = Some(session);
        self.status_message = None;
        self.notice = None;
        self.recompute();
    }

    /// Add the column to the end of the selection, or remove it.
    pub fn toggle_column(&mut self, column: &str) {
        if let Some(pos) = self.selection.columns.iter().position(|c| c == column) {
            self.selection.columns.remove(pos);
        } else {
            let Some(bounds) = self.bounds(column) else {
                return;
            };
            let range = self
                .ranges
                .get(column)
                .map_or(bounds, |r| r.clamp_to(&bounds));
            self.ranges.insert(column.to_string(), range);
            self.selection.columns.push(column.to_string());
        }
        self.recompute();
    }

    /// Move a slider.  Bounds are ordered and clamped to the observed range.
    pub fn set_range(&mut self, column: &str, low: f64, high: f64) {
        let Some(bounds) = self.bounds(column) else {
            return;
        };
        match NumericRange::new(low.min(high), low.max(high)) {
            Ok(range) => {
                self.ranges.insert(column.to_string(), range.clamp_to(&bounds));
                self.recompute();
            }
            Err(e) => log::warn!("Ignoring slider update for '{column}': {e}"),
        }
    }

    /// Set (or clear) the colour column.
    pub fn set_color_column(&mut self, column: Option<String>) {
        self.selection.color = column;
        self.recompute();
    }

    /// Observed range of a numeric column in the loaded table.
    pub fn bounds(&self, column: &str) -> Option<NumericRange> {
        self.session.as_ref()?.bounds.get(column).copied()
    }

    /// Filter spec covering exactly the selected columns.
    pub fn filter_spec(&self) -> FilterSpec {
        self.selection
            .columns
            .iter()
            .filter_map(|col| Some((col.clone(), *self.ranges.get(col)?)))
            .collect()
    }

    /// Re-run the whole pipeline from the loaded table.
    pub fn recompute(&mut self) {
        let Some(session) = &self.session else {
            self.outcome = None;
            return;
        };

        match run(&session.table, &self.selection, &self.filter_spec()) {
            Ok(outcome) => {
                self.color_map = match outcome.projection().and_then(|p| p.color()) {
                    Some(labels) => ColorMap::new(
                        labels,
                        self.config.palette_saturation,
                        self.config.palette_lightness,
                    ),
                    None => ColorMap::uniform(),
                };
                if let Outcome::Empty { shape } = &outcome {
                    log::info!("No data after filtering (shape {shape:?})");
                }
                self.status_message = None;
                self.outcome = Some(outcome);
            }
            Err(e) => {
                log::error!("Pipeline failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.outcome = None;
            }
        }
    }

    /// Render the current projection as an HTML document.
    pub fn render_document(&self) -> Result<HtmlDocument, RenderError> {
        let projection = self
            .outcome
            .as_ref()
            .and_then(Outcome::projection)
            .ok_or(RenderError::EmptyProjection)?;
        render_html(projection, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Column, ColumnKind};

    fn table(n_numeric: usize) -> Table {
        let mut columns: Vec<Column> = (0..n_numeric)
            .map(|i| {
                Column::new(
                    format!("n{i}"),
                    ColumnKind::Numeric,
                    (0..10).map(|v| CellValue::Integer(v * (i as i64 + 1))).collect(),
                )
            })
            .collect();
        columns.push(Column::new(
            "label",
            ColumnKind::Categorical,
            (0..10).map(|v| CellValue::String(format!("l{}", v % 3))).collect(),
        ));
        Table::new(columns).unwrap()
    }

    fn loaded(n_numeric: usize) -> AppState {
        let mut state = AppState::default();
        state.set_table("test.parquet".into(), table(n_numeric));
        state
    }

    #[test]
    fn load_selects_first_five_numeric_columns() {
        let state = loaded(7);
        assert_eq!(state.selection.columns, vec!["n0", "n1", "n2", "n3", "n4"]);
        assert_eq!(state.selection.color, None);
        assert_eq!(state.outcome.as_ref().unwrap().filtered_shape(), Some((10, 8)));
    }

    #[test]
    fn no_numeric_columns_asks_for_selection() {
        let state = loaded(0);
        assert!(state.selection.columns.is_empty());
        assert_eq!(state.outcome, Some(Outcome::NeedsSelection));
    }

    #[test]
    fn ranges_survive_deselect_and_reselect() {
        let mut state = loaded(2);
        state.set_range("n1", 4.0, 8.0);
        state.toggle_column("n1");
        assert_eq!(state.selection.columns, vec!["n0"]);

        state.toggle_column("n1");
        assert_eq!(state.selection.columns, vec!["n0", "n1"]);
        assert_eq!(state.ranges["n1"], NumericRange::new(4.0, 8.0).unwrap());
        assert_eq!(state.outcome.as_ref().unwrap().filtered_shape(), Some((3, 3)));
    }

    #[test]
    fn new_load_resets_ranges() {
        let mut state = loaded(1);
        state.set_range("n0", 2.0, 3.0);
        state.set_table("other.parquet".into(), table(1));
        assert_eq!(state.ranges["n0"], NumericRange::new(0.0, 9.0).unwrap());
    }

    #[test]
    fn slider_is_clamped_and_ordered() {
        let mut state = loaded(1);
        state.set_range("n0", 50.0, -5.0);
        assert_eq!(state.ranges["n0"], NumericRange::new(0.0, 9.0).unwrap());
    }

    #[test]
    fn empty_result_has_no_document() {
        let mut state = loaded(1);
        state.set_range("n0", 3.5, 3.6);
        assert_eq!(state.outcome, Some(Outcome::Empty { shape: (0, 2) }));
        assert!(matches!(state.render_document(), Err(RenderError::EmptyProjection)));
    }

    #[test]
    fn color_column_drives_color_map() {
        let mut state = loaded(1);
        state.set_color_column(Some("label".into()));
        assert_eq!(state.color_map.legend_entries().len(), 3);

        let doc = state.render_document().unwrap();
        assert!(doc.html.contains("\"color\":[\"l0\""));

        state.set_color_column(None);
        assert!(state.color_map.legend_entries().is_empty());
    }

    #[test]
    fn infinite_cells_do_not_hide_a_column() {
        let table = Table::new(vec![
            Column::new(
                "f",
                ColumnKind::Numeric,
                vec![CellValue::Float(1.0), CellValue::Float(f64::INFINITY), CellValue::Float(3.0)],
            ),
            Column::new(
                "d",
                ColumnKind::Numeric,
                vec![CellValue::Integer(1), CellValue::Integer(2), CellValue::Integer(3)],
            ),
        ])
        .unwrap();
        let mut state = AppState::default();
        state.set_table("inf.parquet".into(), table);

        let session = state.session.as_ref().unwrap();
        assert_eq!(session.selectable_columns().collect::<Vec<_>>(), vec!["f", "d"]);
        assert_eq!(state.ranges["f"], NumericRange::new(1.0, 3.0).unwrap());
        // the infinite row fails the finite range on "f"
        assert_eq!(state.outcome.as_ref().unwrap().filtered_shape(), Some((2, 2)));
    }

    #[test]
    fn successful_run_clears_previous_error() {
        let mut state = loaded(1);
        state.set_color_column(Some("missing".into()));
        assert!(state.status_message.is_some());
        assert_eq!(state.outcome, None);

        state.set_color_column(None);
        assert_eq!(state.status_message, None);
        assert!(matches!(state.outcome, Some(Outcome::Ready { .. })));
    }
}
