//! Fraction-free (Bareiss) elimination on the sparse linear subsystem.
//!
//! Row `k` is processed by choosing a pivot among rows `k..`, swapping it
//! into place and cancelling the pivot column from every row below with
//!
//! ```text
//! row_i <- (pivot * row_i - row_i[p] * row_k) / last_pivot
//! ```
//!
//! where the division is exact for every intermediate (Sylvester's identity).
//! Columns are never moved: the pivot variable of each step is recorded and
//! a [`ColumnMap`] tracks the column order the dense algorithm would have
//! produced.

use crate::graph::VarId;
use crate::sparse::SparseMatrixClil;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};

/// Logical column order of a virtually column-swapped matrix.
///
/// After elimination the first `rank` logical columns hold the pivot
/// variables in pivot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    var_at: Vec<VarId>,
    col_of: Vec<usize>,
}

impl ColumnMap {
    pub fn identity(ncols: usize) -> Self {
        Self {
            var_at: (0..ncols).collect(),
            col_of: (0..ncols).collect(),
        }
    }

    /// Swap logical column `k` with the column currently holding `var`.
    pub fn swap_into(&mut self, k: usize, var: VarId) {
        let from = self.col_of[var];
        if from == k {
            return;
        }
        let displaced = self.var_at[k];
        self.var_at.swap(k, from);
        self.col_of[var] = k;
        self.col_of[displaced] = from;
    }

    #[inline]
    pub fn var_at(&self, col: usize) -> VarId {
        self.var_at[col]
    }

    #[inline]
    pub fn col_of(&self, var: VarId) -> usize {
        self.col_of[var]
    }

    /// Variables in logical column order.
    pub fn order(&self) -> &[VarId] {
        &self.var_at
    }
}

/// Where the next pivot is searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PivotSearch {
    /// Only masked (purely linear) variables are eligible.
    Masked,
    /// The masked search ran dry at row `rank1`; any variable is eligible.
    Unmasked { rank1: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pivot {
    pub row: usize,
    pub var: VarId,
    pub value: BigInt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BareissOutcome {
    /// Rows reduced using masked variables only.
    pub rank1: usize,
    /// Full rank reached.
    pub rank2: usize,
    /// Pivot variable of each reduced row, in elimination order.
    pub pivots: Vec<VarId>,
    pub columns: ColumnMap,
    /// Last pivot value (the leading minor determinant, up to sign).
    pub last_pivot: BigInt,
}

/// First eligible entry in rows `k..` whose row length satisfies `constraint`.
fn find_first_linear_variable(
    m: &SparseMatrixClil,
    k: usize,
    mask: Option<&[bool]>,
    constraint: impl Fn(usize) -> bool,
) -> Option<Pivot> {
    for row in k..m.nrows() {
        let cols = &m.row_cols[row];
        if !constraint(cols.len()) {
            continue;
        }
        for (j, &var) in cols.iter().enumerate() {
            if mask.map_or(true, |mask| mask[var]) {
                return Some(Pivot {
                    row,
                    var,
                    value: m.row_vals[row][j].clone(),
                });
            }
        }
    }
    None
}

/// Pivot preference: singleton rows, then pairs, then anything.
pub fn find_masked_pivot(mask: Option<&[bool]>, m: &SparseMatrixClil, k: usize) -> Option<Pivot> {
    find_first_linear_variable(m, k, mask, |n| n == 1)
        .or_else(|| find_first_linear_variable(m, k, mask, |n| n == 2))
        .or_else(|| find_first_linear_variable(m, k, mask, |_| true))
}

/// Cancel `pivot_var` from rows `k+1..`; rows above `k` are left in
/// echelon form. On an inexact division nothing is written and the
/// offending row is returned.
fn bareiss_update_virtual_colswap(
    m: &mut SparseMatrixClil,
    k: usize,
    pivot_var: VarId,
    pivot: &BigInt,
    last_pivot: &BigInt,
) -> Result<(), usize> {
    let mut updated: Vec<(usize, Vec<VarId>, Vec<BigInt>)> = Vec::new();
    let pivot_cols = &m.row_cols[k];
    let pivot_vals = &m.row_vals[k];

    for ei in k + 1..m.nrows() {
        let cols = &m.row_cols[ei];
        let vals = &m.row_vals[ei];
        let coeff = match cols.binary_search(&pivot_var) {
            Ok(pos) => vals[pos].clone(),
            Err(_) => BigInt::zero(),
        };
        if coeff.is_zero() && pivot == last_pivot {
            continue;
        }

        let mut new_cols = Vec::with_capacity(cols.len() + pivot_cols.len());
        let mut new_vals = Vec::with_capacity(cols.len() + pivot_cols.len());
        let (mut a, mut b) = (0, 0);
        while a < pivot_cols.len() || b < cols.len() {
            let va = pivot_cols.get(a).copied();
            let vb = cols.get(b).copied();
            let (var, ck, ci) = match (va, vb) {
                (Some(x), Some(y)) if x == y => {
                    a += 1;
                    b += 1;
                    (x, Some(&pivot_vals[a - 1]), Some(&vals[b - 1]))
                }
                (Some(x), Some(y)) if x < y => {
                    a += 1;
                    (x, Some(&pivot_vals[a - 1]), None)
                }
                (Some(x), None) => {
                    a += 1;
                    (x, Some(&pivot_vals[a - 1]), None)
                }
                (_, Some(y)) => {
                    b += 1;
                    (y, None, Some(&vals[b - 1]))
                }
                (None, None) => break,
            };
            if var == pivot_var {
                continue;
            }
            let mut num = BigInt::zero();
            if let Some(ci) = ci {
                num += pivot * ci;
            }
            if let Some(ck) = ck {
                num -= &coeff * ck;
            }
            let (q, r) = num.div_rem(last_pivot);
            if !r.is_zero() {
                return Err(ei);
            }
            if !q.is_zero() {
                new_cols.push(var);
                new_vals.push(q);
            }
        }
        updated.push((ei, new_cols, new_vals));
    }

    for (ei, cols, vals) in updated {
        m.row_cols[ei] = cols;
        m.row_vals[ei] = vals;
    }
    Ok(())
}

/// Run Bareiss elimination on `m`.
///
/// `mirror`, when given, receives the same row swaps so it stays
/// row-aligned with `m`. `mask[v]` marks variables eligible during the
/// first (purely linear) phase.
pub fn bareiss(
    m: &mut SparseMatrixClil,
    mut mirror: Option<&mut SparseMatrixClil>,
    mask: &[bool],
) -> BareissOutcome {
    let mut search = PivotSearch::Masked;
    let mut pivots = Vec::new();
    let mut columns = ColumnMap::identity(m.ncols());
    let mut last_pivot = BigInt::one();
    let mut rank2 = m.nrows();

    for k in 0..m.nrows() {
        let found = match search {
            PivotSearch::Masked => match find_masked_pivot(Some(mask), m, k) {
                Some(p) => Some(p),
                None => {
                    search = PivotSearch::Unmasked { rank1: k };
                    find_masked_pivot(None, m, k)
                }
            },
            PivotSearch::Unmasked { .. } => find_masked_pivot(None, m, k),
        };
        let Some(pivot) = found else {
            rank2 = k;
            break;
        };

        if pivot.row != k {
            m.swap_rows(k, pivot.row);
            if let Some(mirror) = mirror.as_deref_mut() {
                mirror.swap_rows(k, pivot.row);
            }
        }
        columns.swap_into(k, pivot.var);

        if let Err(row) = bareiss_update_virtual_colswap(m, k, pivot.var, &pivot.value, &last_pivot) {
            tracing::warn!(
                target: "alias",
                row,
                step = k,
                "inexact Bareiss division; stopping elimination"
            );
            rank2 = k;
            break;
        }
        pivots.push(pivot.var);
        last_pivot = pivot.value;
    }

    let rank1 = match search {
        PivotSearch::Masked => rank2,
        PivotSearch::Unmasked { rank1 } => rank1.min(rank2),
    };
    pivots.truncate(rank2);

    BareissOutcome {
        rank1,
        rank2,
        pivots,
        columns,
        last_pivot,
    }
}
