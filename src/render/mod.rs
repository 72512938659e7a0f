/// Renderers for a [`Projection`]: shared parallel-coordinates layout plus
/// the self-contained HTML document.  The in-window plot lives in `ui::plot`.
pub mod html;

use thiserror::Error;

use crate::data::projection::{Axis, Projection};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("nothing to render: the projection has no rows")]
    EmptyProjection,
    #[error("writing rendered document: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialising projection data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Linear map from an axis' data extent onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScale {
    pub min: f64,
    pub max: f64,
}

impl AxisScale {
    pub fn for_axis(axis: &Axis) -> Self {
        let (min, max) = axis.extent().unwrap_or((0.0, 1.0));
        AxisScale { min, max }
    }

    /// Position of `value` on the axis; a flat axis puts everything mid-way.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span.abs() < f64::EPSILON {
            0.5
        } else {
            (value - self.min) / span
        }
    }
}

/// One row's polyline, split wherever a cell is null.
///
/// Each run holds `(axis index, normalised value)` pairs for consecutive axes.
pub fn row_runs(projection: &Projection, scales: &[AxisScale], row: usize) -> Vec<Vec<(usize, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (i, (axis, scale)) in projection.axes().iter().zip(scales).enumerate() {
        match axis.values[row].filter(|v| v.is_finite()) {
            Some(v) => current.push((i, scale.normalize(v))),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

pub fn scales(projection: &Projection) -> Vec<AxisScale> {
    projection.axes().iter().map(AxisScale::for_axis).collect()
}
