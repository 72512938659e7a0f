use std::collections::BTreeMap;

use super::error::{PipelineError, RangeError};
use super::model::{CellValue, Column, ColumnKind, Table};

// ---------------------------------------------------------------------------
// NumericRange – a closed interval chosen on a slider
// ---------------------------------------------------------------------------

/// Closed interval `[low, high]` with finite bounds and `low <= high`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    low: f64,
    high: f64,
}

impl NumericRange {
    pub fn new(low: f64, high: f64) -> Result<Self, RangeError> {
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(RangeError { low, high });
        }
        Ok(NumericRange { low, high })
    }

    /// Full observed range of a numeric column, if it has any finite values.
    pub fn observed(column: &Column) -> Option<Self> {
        let (low, high) = column.numeric_range()?;
        NumericRange::new(low, high).ok()
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn contains(&self, value: &CellValue) -> bool {
        value.within(self.low, self.high)
    }

    /// Intersect with `bounds`; falls back to `bounds` when they do not overlap.
    pub fn clamp_to(&self, bounds: &NumericRange) -> NumericRange {
        let low = self.low.max(bounds.low);
        let high = self.high.min(bounds.high);
        if low > high {
            *bounds
        } else {
            NumericRange { low, high }
        }
    }
}

// ---------------------------------------------------------------------------
// FilterSpec – one range per selected column
// ---------------------------------------------------------------------------

/// Per-column range filters: column_name → inclusive `[low, high]`.
///
/// Rebuilt whole on every slider change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    ranges: BTreeMap<String, NumericRange>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, column: impl Into<String>, range: NumericRange) -> Self {
        self.ranges.insert(column.into(), range);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, range: NumericRange) {
        self.ranges.insert(column.into(), range);
    }

    pub fn get(&self, column: &str) -> Option<&NumericRange> {
        self.ranges.get(column)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NumericRange)> {
        self.ranges.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, NumericRange)> for FilterSpec {
    fn from_iter<T: IntoIterator<Item = (String, NumericRange)>>(iter: T) -> Self {
        FilterSpec {
            ranges: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Applying the filters
// ---------------------------------------------------------------------------

/// Resolve the selected columns and check the spec covers exactly them.
fn resolve<'t, 's>(
    table: &'t Table,
    selected: &[String],
    spec: &'s FilterSpec,
) -> Result<Vec<(&'t Column, &'s NumericRange)>, PipelineError> {
    let mut resolved = Vec::with_capacity(selected.len());
    for (i, name) in selected.iter().enumerate() {
        if selected[..i].contains(name) {
            return Err(PipelineError::DuplicateSelection(name.clone()));
        }
        let column = table
            .column(name)
            .ok_or_else(|| PipelineError::UnknownColumn(name.clone()))?;
        if column.kind != ColumnKind::Numeric {
            return Err(PipelineError::NotNumeric(name.clone()));
        }
        let range = spec
            .get(name)
            .ok_or_else(|| PipelineError::MissingRange(name.clone()))?;
        resolved.push((column, range));
    }
    if let Some((extra, _)) = spec.iter().find(|(col, _)| !selected.iter().any(|s| s == col)) {
        return Err(PipelineError::UnselectedRange(extra.to_string()));
    }
    Ok(resolved)
}

/// Boolean row mask: `true` where the row passes every column's range.
pub fn row_mask(
    table: &Table,
    selected: &[String],
    spec: &FilterSpec,
) -> Result<Vec<bool>, PipelineError> {
    let filters = resolve(table, selected, spec)?;
    let mask = (0..table.num_rows())
        .map(|row| {
            filters
                .iter()
                .all(|(column, range)| range.contains(&column.values[row]))
        })
        .collect();
    Ok(mask)
}

/// Fresh table holding the rows of `table` that pass every selected range.
///
/// All columns are kept, in their original order; surviving rows keep their
/// relative order and their row identities.  The source table is untouched.
pub fn filter_rows(
    table: &Table,
    selected: &[String],
    spec: &FilterSpec,
) -> Result<Table, PipelineError> {
    let positions: Vec<usize> = row_mask(table, selected, spec)?
        .into_iter()
        .enumerate()
        .filter_map(|(i, keep)| keep.then_some(i))
        .collect();
    Ok(table.take(&positions))
}
