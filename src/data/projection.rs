use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

use super::error::PipelineError;
use super::model::{ColumnKind, RowId, Table};

/// Name of the row-identity column.
pub const UID_COLUMN: &str = "uid";
/// Name of the optional colour column.
pub const COLOR_COLUMN: &str = "color";

/// One plotted dimension: a selected numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub name: String,
    /// `None` for null cells.
    pub values: Vec<Option<f64>>,
}

impl Axis {
    /// `[min, max]` over the finite values on this axis.
    pub fn extent(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// The filtered rows reshaped for visualisation:
/// `uid`, then the selected columns in selection order, then `color`.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    uid: Vec<RowId>,
    axes: Vec<Axis>,
    color: Option<Vec<String>>,
}

impl Projection {
    /// Reshape `filtered` into a projection.
    ///
    /// Never adds, drops or reorders rows.
    pub fn build(
        filtered: &Table,
        selected: &[String],
        color_column: Option<&str>,
    ) -> Result<Self, PipelineError> {
        let axes = selected
            .iter()
            .map(|name| {
                let column = filtered
                    .column(name)
                    .ok_or_else(|| PipelineError::UnknownColumn(name.clone()))?;
                if column.kind != ColumnKind::Numeric {
                    return Err(PipelineError::NotNumeric(name.clone()));
                }
                Ok(Axis {
                    name: name.clone(),
                    values: column.values.iter().map(|v| v.as_f64()).collect(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let color = color_column
            .map(|name| {
                let column = filtered
                    .column(name)
                    .ok_or_else(|| PipelineError::UnknownColumn(name.to_string()))?;
                if column.kind != ColumnKind::Categorical {
                    return Err(PipelineError::NotCategorical(name.to_string()));
                }
                Ok(column.values.iter().map(|v| v.to_label()).collect())
            })
            .transpose()?;

        Ok(Projection {
            uid: filtered.row_ids().to_vec(),
            axes,
            color,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.uid.len()
    }

    /// Identity column + axes + optional colour column.
    pub fn num_columns(&self) -> usize {
        1 + self.axes.len() + usize::from(self.color.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.uid.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        std::iter::once(UID_COLUMN)
            .chain(self.axes.iter().map(|a| a.name.as_str()))
            .chain(self.color.as_ref().map(|_| COLOR_COLUMN))
            .collect()
    }

    pub fn uid(&self) -> &[RowId] {
        &self.uid
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn color(&self) -> Option<&[String]> {
        self.color.as_deref()
    }

    /// Export as an Arrow batch: `uid` and `color` as Utf8, axes as Float64.
    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let mut fields = vec![Field::new(UID_COLUMN, DataType::Utf8, false)];
        let mut arrays: Vec<ArrayRef> = vec![Arc::new(StringArray::from_iter_values(
            self.uid.iter().map(|id| id.to_string()),
        ))];

        for axis in &self.axes {
            fields.push(Field::new(axis.name.as_str(), DataType::Float64, true));
            arrays.push(Arc::new(Float64Array::from(axis.values.clone())));
        }

        if let Some(color) = &self.color {
            fields.push(Field::new(COLOR_COLUMN, DataType::Utf8, false));
            arrays.push(Arc::new(StringArray::from_iter_values(color)));
        }

        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
    }
}
