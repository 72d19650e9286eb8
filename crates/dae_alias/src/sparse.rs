//! Sparse exact coefficient matrix of the linear subsystem.
//!
//! Rows are stored as compressed lists (sorted column indices plus the
//! matching coefficients) and remember the parent equation they came from,
//! so row swaps never lose track of which equation a row describes.
//! A stored coefficient is never zero.

use crate::graph::{EqId, VarId};
use num_bigint::BigInt;
use num_traits::Zero;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SparseMatrixClil {
    nparentrows: usize,
    ncols: usize,
    pub(crate) nzrows: Vec<EqId>,
    pub(crate) row_cols: Vec<Vec<VarId>>,
    pub(crate) row_vals: Vec<Vec<BigInt>>,
}

impl SparseMatrixClil {
    /// Empty matrix over `ncols` unknowns for a system of `nparentrows` equations.
    pub fn new(nparentrows: usize, ncols: usize) -> Self {
        Self {
            nparentrows,
            ncols,
            ..Self::default()
        }
    }

    /// Append the row of equation `eq`. Duplicate columns are summed and
    /// zero coefficients dropped.
    pub fn push_row(&mut self, eq: EqId, entries: impl IntoIterator<Item = (VarId, BigInt)>) {
        let mut entries: Vec<(VarId, BigInt)> = entries.into_iter().collect();
        entries.sort_by_key(|(v, _)| *v);
        let mut cols: Vec<VarId> = Vec::with_capacity(entries.len());
        let mut vals: Vec<BigInt> = Vec::with_capacity(entries.len());
        for (var, val) in entries {
            match cols.last() {
                Some(&last) if last == var => {
                    if let Some(acc) = vals.last_mut() {
                        *acc += val;
                    }
                }
                _ => {
                    cols.push(var);
                    vals.push(val);
                }
            }
        }
        let (cols, vals) = cols
            .into_iter()
            .zip(vals)
            .filter(|(_, v)| !v.is_zero())
            .unzip();
        self.nzrows.push(eq);
        self.row_cols.push(cols);
        self.row_vals.push(vals);
    }

    pub fn nrows(&self) -> usize {
        self.nzrows.len()
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nparentrows(&self) -> usize {
        self.nparentrows
    }

    /// Parent equation of every row, in row order.
    pub fn nzrows(&self) -> &[EqId] {
        &self.nzrows
    }

    /// Row index currently holding equation `eq`.
    pub fn row_of_equation(&self, eq: EqId) -> Option<usize> {
        self.nzrows.iter().position(|&e| e == eq)
    }

    pub fn row(&self, i: usize) -> RowView<'_> {
        RowView {
            cols: &self.row_cols[i],
            vals: &self.row_vals[i],
        }
    }

    pub fn row_mut(&mut self, i: usize) -> RowMut<'_> {
        RowMut {
            cols: &mut self.row_cols[i],
            vals: &mut self.row_vals[i],
        }
    }

    pub fn swap_rows(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        self.nzrows.swap(i, j);
        self.row_cols.swap(i, j);
        self.row_vals.swap(i, j);
    }

    /// Overwrite row `i` with the contents of `src` (parent equation kept).
    pub fn copy_row_from(&mut self, i: usize, src: RowView<'_>) {
        self.row_cols[i] = src.cols.to_vec();
        self.row_vals[i] = src.vals.to_vec();
    }

    /// Column access by scan: `(row, coefficient)` for every row touching `var`.
    pub fn column(&self, var: VarId) -> Vec<(usize, &BigInt)> {
        self.row_cols
            .iter()
            .enumerate()
            .filter_map(|(i, cols)| {
                cols.binary_search(&var)
                    .ok()
                    .map(|pos| (i, &self.row_vals[i][pos]))
            })
            .collect()
    }

    /// Stored coefficients in the whole matrix.
    pub fn nnz(&self) -> usize {
        self.row_cols.iter().map(Vec::len).sum()
    }
}

/// Read-only row as a sparse `variable -> coefficient` map.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    cols: &'a [VarId],
    vals: &'a [BigInt],
}

impl<'a> RowView<'a> {
    pub fn get(&self, var: VarId) -> Option<&'a BigInt> {
        self.cols.binary_search(&var).ok().map(|pos| &self.vals[pos])
    }

    pub fn nnz(&self) -> usize {
        self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }

    pub fn cols(&self) -> &'a [VarId] {
        self.cols
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &'a BigInt)> + 'a {
        self.cols.iter().copied().zip(self.vals.iter())
    }
}

/// Mutable row. Writes keep the columns sorted and never store a zero.
#[derive(Debug)]
pub struct RowMut<'a> {
    cols: &'a mut Vec<VarId>,
    vals: &'a mut Vec<BigInt>,
}

impl<'a> RowMut<'a> {
    pub fn view(&self) -> RowView<'_> {
        RowView {
            cols: self.cols.as_slice(),
            vals: self.vals.as_slice(),
        }
    }

    pub fn get(&self, var: VarId) -> Option<&BigInt> {
        self.cols.binary_search(&var).ok().map(|pos| &self.vals[pos])
    }

    pub fn nnz(&self) -> usize {
        self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }

    /// Set a single cell; writing zero removes the entry.
    pub fn set(&mut self, var: VarId, val: BigInt) {
        match self.cols.binary_search(&var) {
            Ok(pos) if val.is_zero() => {
                self.cols.remove(pos);
                self.vals.remove(pos);
            }
            Ok(pos) => self.vals[pos] = val,
            Err(_) if val.is_zero() => {}
            Err(pos) => {
                self.cols.insert(pos, var);
                self.vals.insert(pos, val);
            }
        }
    }

    /// `row[var] += delta`; returns the new coefficient.
    pub fn add(&mut self, var: VarId, delta: &BigInt) -> BigInt {
        let updated = self.get(var).cloned().unwrap_or_default() + delta;
        self.set(var, updated.clone());
        updated
    }

    pub fn remove(&mut self, var: VarId) -> Option<BigInt> {
        let pos = self.cols.binary_search(&var).ok()?;
        self.cols.remove(pos);
        Some(self.vals.remove(pos))
    }

    pub fn zero(&mut self) {
        self.cols.clear();
        self.vals.clear();
    }

    /// Owned copy of the current entries.
    pub fn entries(&self) -> Vec<(VarId, BigInt)> {
        self.cols.iter().copied().zip(self.vals.iter().cloned()).collect()
    }
}

impl fmt::Display for SparseMatrixClil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, eq) in self.nzrows.iter().enumerate() {
            write!(f, "e{}:", eq)?;
            for (var, val) in self.row(i).iter() {
                write!(f, " {}*v{}", val, var)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
