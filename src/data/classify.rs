use super::model::{ColumnKind, Table};

/// Column names split by kind, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnClasses {
    /// Columns that can be range-filtered and plotted as axes.
    pub numeric: Vec<String>,
    /// Columns that can be used for colouring.
    pub categorical: Vec<String>,
}

/// Split the table's columns into numeric and categorical names.
///
/// Columns of kind [`ColumnKind::Other`] appear in neither list.
pub fn classify(table: &Table) -> ColumnClasses {
    let mut classes = ColumnClasses::default();
    for col in table.columns() {
        match col.kind {
            ColumnKind::Numeric => classes.numeric.push(col.name.clone()),
            ColumnKind::Categorical => classes.categorical.push(col.name.clone()),
            ColumnKind::Other => {}
        }
    }
    classes
}
