//! Breakpoint lookup tables with multilinear interpolation.
//!
//! Tables arrive as whitespace-delimited text inside `tableData` elements:
//! 1D is (index, value) pairs per line, 2D leads with a row of column
//! indices, 3D is an ordered list of 2D slices each tagged with a
//! breakpoint in the third independent variable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("table expects {expected} inputs, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// A parsed 1D table: parallel arrays of monotonic breakpoints and values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table1D {
    pub indices: Vec<f64>,
    pub values: Vec<f64>,
}

/// A parsed 2D table: row indices, column indices, dense value matrix.
/// When used as a 3D slice, `breakpoint` carries the third-variable tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table2D {
    pub breakpoint: f64,
    pub row_indices: Vec<f64>,
    pub col_indices: Vec<f64>,
    pub data: Vec<Vec<f64>>,
}

/// Table payload discriminated by dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TableData {
    OneD(Table1D),
    TwoD(Table2D),
    ThreeD(Vec<Table2D>),
}

/// A lookup table together with the property names of its independent
/// variables, in lookup order (row, column, table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupTable {
    pub name: String,
    pub independent_vars: Vec<String>,
    pub lookup_types: Vec<String>,
    pub data: TableData,
}

impl LookupTable {
    pub fn dimension(&self) -> usize {
        match &self.data {
            TableData::OneD(_) => 1,
            TableData::TwoD(_) => 2,
            TableData::ThreeD(_) => 3,
        }
    }

    /// Interpolate at the given query point. The number of inputs must
    /// match the table dimension; queries outside the breakpoint span clamp
    /// to the nearest endpoint.
    pub fn interpolate(&self, inputs: &[f64]) -> Result<f64, TableError> {
        let expected = self.dimension();
        if inputs.len() != expected {
            return Err(TableError::DimensionMismatch {
                expected,
                got: inputs.len(),
            });
        }
        Ok(match &self.data {
            TableData::OneD(t) => interpolate_1d(t, inputs[0]),
            TableData::TwoD(t) => interpolate_2d(t, inputs[0], inputs[1]),
            TableData::ThreeD(slices) => interpolate_3d(slices, inputs[0], inputs[1], inputs[2]),
        })
    }
}

/// Parse 1D table text: every non-blank line holding at least two numeric
/// fields contributes an (index, value) pair.
pub fn parse_1d(text: &str) -> Table1D {
    let mut table = Table1D::default();
    for line in text.lines() {
        let fields: Vec<f64> = line
            .split_whitespace()
            .filter_map(|f| f.parse().ok())
            .collect();
        if fields.len() >= 2 {
            table.indices.push(fields[0]);
            table.values.push(fields[1]);
        }
    }
    table
}

/// Parse 2D table text: first non-blank line is column indices, each
/// following line is a row index and its values.
pub fn parse_2d(text: &str) -> Table2D {
    let mut table = Table2D::default();
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    if let Some(header) = lines.next() {
        table.col_indices = header
            .split_whitespace()
            .filter_map(|f| f.parse().ok())
            .collect();
    }

    for line in lines {
        let fields: Vec<f64> = line
            .split_whitespace()
            .filter_map(|f| f.parse().ok())
            .collect();
        if let Some((&row_index, values)) = fields.split_first() {
            table.row_indices.push(row_index);
            table.data.push(values.to_vec());
        }
    }
    table
}

/// Ragged rows are tolerated: a missing cell reads as 0 and indexing never
/// runs past the row's actual length.
fn cell(data: &[Vec<f64>], row: usize, col: usize) -> f64 {
    data.get(row)
        .and_then(|r| r.get(col))
        .copied()
        .unwrap_or(0.0)
}

/// Bracketing breakpoint pair and interpolation fraction for a query,
/// clamped to the span endpoints.
fn find_indices(indices: &[f64], value: f64) -> (usize, usize, f64) {
    let n = indices.len();
    if n == 0 {
        return (0, 0, 0.0);
    }
    if value <= indices[0] {
        return (0, 0, 0.0);
    }
    if value >= indices[n - 1] {
        return (n - 1, n - 1, 0.0);
    }
    for i in 0..n - 1 {
        if value >= indices[i] && value <= indices[i + 1] {
            let span = indices[i + 1] - indices[i];
            let frac = if span != 0.0 {
                (value - indices[i]) / span
            } else {
                0.0
            };
            return (i, i + 1, frac);
        }
    }
    (n - 1, n - 1, 0.0)
}

fn interpolate_1d(t: &Table1D, x: f64) -> f64 {
    let n = t.indices.len().min(t.values.len());
    if n == 0 {
        return 0.0;
    }
    if x <= t.indices[0] {
        return t.values[0];
    }
    if x >= t.indices[n - 1] {
        return t.values[n - 1];
    }
    let (i0, i1, frac) = find_indices(&t.indices[..n], x);
    t.values[i0] + frac * (t.values[i1] - t.values[i0])
}

fn interpolate_2d(t: &Table2D, row: f64, col: f64) -> f64 {
    if t.row_indices.is_empty() || t.col_indices.is_empty() || t.data.is_empty() {
        return 0.0;
    }

    let (r0, r1, row_frac) = find_indices(&t.row_indices, row);
    let (c0, c1, col_frac) = find_indices(&t.col_indices, col);

    let v00 = cell(&t.data, r0, c0);
    let v01 = cell(&t.data, r0, c1);
    let v10 = cell(&t.data, r1, c0);
    let v11 = cell(&t.data, r1, c1);

    let lo = v00 + col_frac * (v01 - v00);
    let hi = v10 + col_frac * (v11 - v10);
    lo + row_frac * (hi - lo)
}

fn interpolate_3d(slices: &[Table2D], row: f64, col: f64, table: f64) -> f64 {
    if slices.is_empty() {
        return 0.0;
    }

    // Outside the slice breakpoint span the query collapses to the nearest
    // slice evaluated as 2D.
    if table <= slices[0].breakpoint {
        return interpolate_2d(&slices[0], row, col);
    }
    if table >= slices[slices.len() - 1].breakpoint {
        return interpolate_2d(&slices[slices.len() - 1], row, col);
    }

    for i in 0..slices.len() - 1 {
        if table >= slices[i].breakpoint && table <= slices[i + 1].breakpoint {
            let span = slices[i + 1].breakpoint - slices[i].breakpoint;
            let frac = if span != 0.0 {
                (table - slices[i].breakpoint) / span
            } else {
                0.0
            };
            let v0 = interpolate_2d(&slices[i], row, col);
            let v1 = interpolate_2d(&slices[i + 1], row, col);
            return v0 + frac * (v1 - v0);
        }
    }
    interpolate_2d(&slices[slices.len() - 1], row, col)
}
