use std::fmt;

use super::error::TableError;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Dates and timestamps are kept as their ISO-8601 text.
    Date(String),
    Null,
}

impl CellValue {
    /// Numeric view of the cell. `None` for non-numeric cells and nulls.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Whether the cell lies inside the closed interval `[low, high]`.
    ///
    /// Nulls, NaN and non-numeric cells never match; neither do infinities,
    /// since bounds are always finite.
    pub fn within(&self, low: f64, high: f64) -> bool {
        match self.as_f64() {
            Some(v) => v >= low && v <= high,
            None => false,
        }
    }

    /// Text form used for labels (colour column, exports).
    /// Nulls become `None`.
    pub fn to_label(&self) -> String {
        match self {
            CellValue::String(s) | CellValue::Date(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(v) => v.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Null => "None".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// Inferred kind of a column, decided once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Integers and floats; can be range-filtered.
    Numeric,
    /// Strings and dictionary-encoded strings; can drive the colour column.
    Categorical,
    /// Booleans, dates and anything else.
    Other,
}

/// One named column of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind, values: Vec<CellValue>) -> Self {
        Column {
            name: name.into(),
            kind,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Observed `[min, max]` over the finite numeric cells.
    pub fn numeric_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .filter_map(CellValue::as_f64)
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

// ---------------------------------------------------------------------------
// RowId – stable identity of a source row
// ---------------------------------------------------------------------------

/// Original position of a row in the loaded file.
///
/// Treated as an opaque label downstream; survives filtering unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub usize);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Equal-length named columns with positional row alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    row_ids: Vec<RowId>,
}

impl Table {
    /// Build a table from freshly loaded columns, numbering rows from zero.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let n_rows = columns.first().map_or(0, Column::len);
        Self::with_row_ids(columns, (0..n_rows).map(RowId).collect())
    }

    fn with_row_ids(columns: Vec<Column>, row_ids: Vec<RowId>) -> Result<Self, TableError> {
        for (i, col) in columns.iter().enumerate() {
            if col.len() != row_ids.len() {
                return Err(TableError::RaggedColumn {
                    column: col.name.clone(),
                    expected: row_ids.len(),
                    found: col.len(),
                });
            }
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(TableError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Table { columns, row_ids })
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.row_ids.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`, as reported to the user.
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows(), self.num_columns())
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.row_ids.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_ids(&self) -> &[RowId] {
        &self.row_ids
    }

    /// New table holding the rows at `positions`, in the given order.
    ///
    /// Row identities travel with their rows. Panics if a position is out of
    /// bounds.
    pub fn take(&self, positions: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|col| Column {
                name: col.name.clone(),
                kind: col.kind,
                values: positions.iter().map(|&p| col.values[p].clone()).collect(),
            })
            .collect();
        let row_ids = positions.iter().map(|&p| self.row_ids[p]).collect();
        Table { columns, row_ids }
    }
}
