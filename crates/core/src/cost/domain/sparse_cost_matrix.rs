//! Compressed-row sparse cost matrix.
//!
//! Only allowed pairs are stored. A missing entry means the pair cannot be
//! linked at all; it is never assigned, whatever the blocking value.

use std::fmt;

use thiserror::Error;

use super::cost_matrix::CostMatrix;

/// Malformed sparse structure or incompatible operands.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SparseMatrixError {
    #[error("row {row}: columns must be strictly increasing")]
    UnsortedColumns { row: usize },

    #[error("duplicate entry at ({row}, {col})")]
    DuplicateEntry { row: usize, col: usize },

    #[error("column {col} out of range for a matrix with {ncols} columns")]
    ColumnOutOfRange { col: usize, ncols: usize },

    #[error("row {row} out of range for a matrix with {nrows} rows")]
    RowOutOfRange { row: usize, nrows: usize },

    #[error("inconsistent structure: {0}")]
    Inconsistent(String),

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}

/// Sparse matrix in compressed-row form. Within a row, columns are strictly
/// increasing.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseCostMatrix {
    costs: Vec<f64>,
    columns: Vec<usize>,
    row_starts: Vec<usize>,
    ncols: usize,
}

impl SparseCostMatrix {
    /// Builds a matrix from compressed-row arrays: `row_counts[i]` entries of
    /// `costs` and `columns` belong to row `i`.
    pub fn new(
        costs: Vec<f64>,
        columns: Vec<usize>,
        row_counts: &[usize],
        ncols: usize,
    ) -> Result<Self, SparseMatrixError> {
        if costs.len() != columns.len() {
            return Err(SparseMatrixError::Inconsistent(format!(
                "{} costs for {} column indices",
                costs.len(),
                columns.len()
            )));
        }
        let mut row_starts = Vec::with_capacity(row_counts.len() + 1);
        row_starts.push(0);
        for &count in row_counts {
            let last = row_starts[row_starts.len() - 1];
            row_starts.push(last + count);
        }
        let total = row_starts[row_starts.len() - 1];
        if total != columns.len() {
            return Err(SparseMatrixError::Inconsistent(format!(
                "row counts sum to {total} but {} entries were given",
                columns.len()
            )));
        }

        let matrix = Self {
            costs,
            columns,
            row_starts,
            ncols,
        };
        for row in 0..matrix.nrows() {
            let cols = matrix.row_columns(row);
            if cols.windows(2).any(|w| w[0] >= w[1]) {
                return Err(SparseMatrixError::UnsortedColumns { row });
            }
            if let Some(&col) = cols.last().filter(|&&c| c >= ncols) {
                return Err(SparseMatrixError::ColumnOutOfRange { col, ncols });
            }
        }
        Ok(matrix)
    }

    /// Builds a matrix from `(row, col, cost)` triplets in any order.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        mut triplets: Vec<(usize, usize, f64)>,
    ) -> Result<Self, SparseMatrixError> {
        triplets.sort_by_key(|&(row, col, _)| (row, col));
        let mut row_counts = vec![0usize; nrows];
        let mut costs = Vec::with_capacity(triplets.len());
        let mut columns = Vec::with_capacity(triplets.len());
        let mut previous: Option<(usize, usize)> = None;
        for (row, col, cost) in triplets {
            if row >= nrows {
                return Err(SparseMatrixError::RowOutOfRange { row, nrows });
            }
            if col >= ncols {
                return Err(SparseMatrixError::ColumnOutOfRange { col, ncols });
            }
            if previous == Some((row, col)) {
                return Err(SparseMatrixError::DuplicateEntry { row, col });
            }
            previous = Some((row, col));
            row_counts[row] += 1;
            costs.push(cost);
            columns.push(col);
        }
        Self::new(costs, columns, &row_counts, ncols)
    }

    /// Stores every entry of `dense`, blocked ones included.
    pub fn from_dense(dense: &CostMatrix) -> Self {
        let (nrows, ncols) = (dense.nrows(), dense.ncols());
        Self {
            costs: dense.view().iter().copied().collect(),
            columns: (0..nrows).flat_map(|_| 0..ncols).collect(),
            row_starts: (0..=nrows).map(|i| i * ncols).collect(),
            ncols,
        }
    }

    /// Square matrix with `values` on the diagonal and nothing else stored.
    pub fn diagonal(values: &[f64]) -> Self {
        let n = values.len();
        Self {
            costs: values.to_vec(),
            columns: (0..n).collect(),
            row_starts: (0..=n).collect(),
            ncols: n,
        }
    }

    pub fn nrows(&self) -> usize {
        self.row_starts.len() - 1
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored entries.
    pub fn cardinality(&self) -> usize {
        self.costs.len()
    }

    /// Fraction of cells that hold an entry.
    pub fn density(&self) -> f64 {
        let cells = self.nrows() * self.ncols;
        if cells == 0 {
            0.0
        } else {
            self.cardinality() as f64 / cells as f64
        }
    }

    pub fn costs(&self) -> &[f64] {
        &self.costs
    }

    pub fn row_counts(&self) -> Vec<usize> {
        self.row_starts.windows(2).map(|w| w[1] - w[0]).collect()
    }

    pub fn row_columns(&self, row: usize) -> &[usize] {
        &self.columns[self.row_starts[row]..self.row_starts[row + 1]]
    }

    pub fn row_costs(&self, row: usize) -> &[f64] {
        &self.costs[self.row_starts[row]..self.row_starts[row + 1]]
    }

    /// `(column, cost)` entries of `row`, by increasing column.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.row_columns(row)
            .iter()
            .copied()
            .zip(self.row_costs(row).iter().copied())
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        let cols = self.row_columns(row);
        cols.binary_search(&col)
            .ok()
            .map(|at| self.row_costs(row)[at])
    }

    pub fn transpose(&self) -> Self {
        let nrows = self.nrows();
        let mut counts = vec![0usize; self.ncols];
        for &col in &self.columns {
            counts[col] += 1;
        }
        let mut row_starts = Vec::with_capacity(self.ncols + 1);
        row_starts.push(0);
        for &count in &counts {
            let last = row_starts[row_starts.len() - 1];
            row_starts.push(last + count);
        }

        let mut next = row_starts[..self.ncols].to_vec();
        let mut costs = vec![0.0; self.cardinality()];
        let mut columns = vec![0usize; self.cardinality()];
        for row in 0..nrows {
            for (col, cost) in self.row(row) {
                let at = next[col];
                costs[at] = cost;
                columns[at] = row;
                next[col] += 1;
            }
        }
        Self {
            costs,
            columns,
            row_starts,
            ncols: nrows,
        }
    }

    /// `[self | other]`.
    pub fn hcat(&self, other: &Self) -> Result<Self, SparseMatrixError> {
        if self.nrows() != other.nrows() {
            return Err(SparseMatrixError::DimensionMismatch(format!(
                "cannot place {} rows beside {} rows",
                other.nrows(),
                self.nrows()
            )));
        }
        let mut costs = Vec::with_capacity(self.cardinality() + other.cardinality());
        let mut columns = Vec::with_capacity(costs.capacity());
        let mut row_starts = Vec::with_capacity(self.row_starts.len());
        row_starts.push(0);
        for row in 0..self.nrows() {
            costs.extend_from_slice(self.row_costs(row));
            columns.extend_from_slice(self.row_columns(row));
            costs.extend_from_slice(other.row_costs(row));
            columns.extend(other.row_columns(row).iter().map(|&c| c + self.ncols));
            row_starts.push(costs.len());
        }
        Ok(Self {
            costs,
            columns,
            row_starts,
            ncols: self.ncols + other.ncols,
        })
    }

    /// `self` stacked above `other`.
    pub fn vcat(&self, other: &Self) -> Result<Self, SparseMatrixError> {
        if self.ncols != other.ncols {
            return Err(SparseMatrixError::DimensionMismatch(format!(
                "cannot stack {} columns under {} columns",
                other.ncols, self.ncols
            )));
        }
        let offset = self.cardinality();
        let mut costs = self.costs.clone();
        costs.extend_from_slice(&other.costs);
        let mut columns = self.columns.clone();
        columns.extend_from_slice(&other.columns);
        let mut row_starts = self.row_starts.clone();
        row_starts.extend(other.row_starts[1..].iter().map(|&s| s + offset));
        Ok(Self {
            costs,
            columns,
            row_starts,
            ncols: self.ncols,
        })
    }

    /// Same structure, every stored cost replaced by `value`.
    pub fn fill_with(&self, value: f64) -> Self {
        Self {
            costs: vec![value; self.cardinality()],
            ..self.clone()
        }
    }

    /// No-linking complement of this `m × n` linking block: an
    /// `(m + n) × (n + m)` matrix with source alternatives on the top-right
    /// diagonal, target alternatives on the bottom-left diagonal and the
    /// transposed structure, valued at the smallest alternative, bottom-right.
    pub fn complement(
        &self,
        source_alternatives: &[f64],
        target_alternatives: &[f64],
    ) -> Result<Self, SparseMatrixError> {
        if source_alternatives.len() != self.nrows() || target_alternatives.len() != self.ncols {
            return Err(SparseMatrixError::DimensionMismatch(format!(
                "{}x{} block with {} source and {} target alternatives",
                self.nrows(),
                self.ncols,
                source_alternatives.len(),
                target_alternatives.len()
            )));
        }
        let min_alternative = source_alternatives
            .iter()
            .chain(target_alternatives)
            .copied()
            .fold(f64::INFINITY, f64::min);

        let top = self.hcat(&Self::diagonal(source_alternatives))?;
        let bottom = Self::diagonal(target_alternatives)
            .hcat(&self.transpose().fill_with(min_alternative))?;
        top.vcat(&bottom)
    }

    /// Sum of the stored entries selected by `row_to_col`. Pairs without a
    /// stored entry contribute nothing.
    pub fn total_assignment_cost(&self, row_to_col: &[Option<usize>]) -> f64 {
        row_to_col
            .iter()
            .enumerate()
            .filter_map(|(row, col)| col.and_then(|c| self.get(row, c)))
            .sum()
    }

    /// Dense copy with `missing` in every cell that has no entry.
    pub fn to_dense(&self, missing: f64) -> CostMatrix {
        let mut dense = CostMatrix::blocked(self.nrows(), self.ncols, missing);
        for row in 0..self.nrows() {
            for (col, cost) in self.row(row) {
                dense.set(row, col, cost);
            }
        }
        dense
    }

    /// Table rendering with optional row and column labels.
    pub fn to_table(&self, row_labels: Option<&[String]>, col_labels: Option<&[String]>) -> String {
        let mut out = format!(
            "{} x {} sparse cost matrix, {} entries (density {:.3})\n",
            self.nrows(),
            self.ncols,
            self.cardinality(),
            self.density()
        );
        let label = |labels: Option<&[String]>, i: usize| {
            labels
                .and_then(|l| l.get(i).cloned())
                .unwrap_or_else(|| i.to_string())
        };
        out.push_str(&format!("{:>10}", ""));
        for col in 0..self.ncols {
            out.push_str(&format!("{:>10}", label(col_labels, col)));
        }
        out.push('\n');
        for row in 0..self.nrows() {
            out.push_str(&format!("{:>10}", label(row_labels, row)));
            let mut entries = self.row(row).peekable();
            for col in 0..self.ncols {
                match entries.next_if(|&(c, _)| c == col) {
                    Some((_, cost)) => out.push_str(&format!("{cost:>10.1}")),
                    None => out.push_str(&format!("{:>10}", "-")),
                }
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for SparseCostMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_table(None, None))
    }
}
