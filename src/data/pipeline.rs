use super::error::PipelineError;
use super::filter::{filter_rows, FilterSpec};
use super::model::Table;
use super::projection::Projection;

/// What the user picked in the side panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Numeric columns to plot, in the order they were picked.
    pub columns: Vec<String>,
    /// Optional categorical column used for colouring.
    pub color: Option<String>,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// No numeric column selected; nothing was filtered.
    NeedsSelection,
    /// The filters removed every row. `shape` is that of the filtered table.
    Empty { shape: (usize, usize) },
    /// Rows survived; `projection` is ready to render.
    Ready {
        shape: (usize, usize),
        projection: Projection,
    },
}

impl Outcome {
    pub fn projection(&self) -> Option<&Projection> {
        match self {
            Outcome::Ready { projection, .. } => Some(projection),
            _ => None,
        }
    }

    /// Shape of the filtered table, when filtering happened.
    pub fn filtered_shape(&self) -> Option<(usize, usize)> {
        match self {
            Outcome::NeedsSelection => None,
            Outcome::Empty { shape } | Outcome::Ready { shape, .. } => Some(*shape),
        }
    }
}

/// Run filter and projection for one interaction.
///
/// Always starts from the untouched `table`; nothing is carried over from
/// earlier runs.
pub fn run(table: &Table, selection: &Selection, spec: &FilterSpec) -> Result<Outcome, PipelineError> {
    if selection.columns.is_empty() {
        return Ok(Outcome::NeedsSelection);
    }

    let filtered = filter_rows(table, &selection.columns, spec)?;
    let shape = filtered.shape();
    log::debug!("Filtered data shape: {shape:?}");

    if filtered.is_empty() {
        return Ok(Outcome::Empty { shape });
    }

    let projection = Projection::build(&filtered, &selection.columns, selection.color.as_deref())?;
    Ok(Outcome::Ready { shape, projection })
}
