//! Alias elimination driver.
//!
//! Runs Bareiss on the linear subsystem, zeroes purely linear unknowns the
//! elimination left free, simplifies pivot rows in reverse order,
//! reconciles rows that elimination made denser than the original and
//! sweeps to a fixpoint. The substituted rows are factorized again until a
//! round finds nothing new, and the row structure is written back into the
//! incidence graph.

use crate::alias_graph::{Alias, AliasGraph};
use crate::bareiss::bareiss;
use crate::ensure_alias_invariant;
use crate::error::AliasError;
use crate::graph::{BipartiteGraph, DiffGraph, VarId};
use crate::options::AliasOptions;
use crate::simplify::{locally_structure_simplify, substitute_aliases};
use crate::sparse::SparseMatrixClil;
use smallvec::SmallVec;

/// Result of one elimination pass.
#[derive(Debug, Clone)]
pub struct AliasElimination {
    pub aliases: AliasGraph,
    /// Reduced linear rows in equation order, aligned with `matrix.nzrows()`.
    pub matrix: SparseMatrixClil,
    /// Ranks and pivots of the first factorization.
    pub rank1: usize,
    pub rank2: usize,
    pub pivots: Vec<VarId>,
    /// Rows replaced by their original form during reconciliation.
    pub reconciled: usize,
    /// Fixpoint sweeps run after reconciliation.
    pub sweeps: usize,
    /// Factorizations run until one recorded no new alias.
    pub rounds: usize,
}

/// Unknowns eligible for the purely linear phase: not part of any
/// derivative chain, stored with a nonzero coefficient in some linear row
/// and incident to no equation outside the linear subsystem.
pub fn linear_variable_mask(
    graph: &BipartiteGraph,
    var_to_diff: &DiffGraph,
    mm: &SparseMatrixClil,
) -> Vec<bool> {
    let mut in_linear = vec![false; graph.neqs()];
    for &eq in mm.nzrows() {
        in_linear[eq] = true;
    }
    let mut in_row = vec![false; graph.nvars()];
    for i in 0..mm.nrows() {
        for &v in mm.row(i).cols() {
            in_row[v] = true;
        }
    }
    (0..graph.nvars())
        .map(|v| {
            in_row[v]
                && var_to_diff.is_undifferentiated(v)
                && graph.var_neighbors(v).iter().all(|&eq| in_linear[eq])
        })
        .collect()
}

/// What a single factorization contributed.
struct Round {
    matrix: SparseMatrixClil,
    rank1: usize,
    rank2: usize,
    pivots: Vec<VarId>,
    reconciled: usize,
    sweeps: usize,
}

/// Factorize `input`, pin free linear unknowns, simplify, reconcile and
/// sweep. Aliases are recorded in `ag`.
fn eliminate_round(
    input: &SparseMatrixClil,
    mask: &[bool],
    ag: &mut AliasGraph,
    var_to_diff: &DiffGraph,
    options: &AliasOptions,
) -> Result<Round, AliasError> {
    let mut mm_orig = input.clone();
    let mut mm = input.clone();
    let outcome = bareiss(&mut mm, Some(&mut mm_orig), mask);
    let (rank1, rank2) = (outcome.rank1, outcome.rank2);
    let pivots = outcome.pivots;
    tracing::debug!(target: "alias", rows = mm.nrows(), rank1, rank2, "bareiss done");

    // Purely linear unknowns left without a pivot are free: pin them to zero.
    let mut linear_pivot = vec![false; mask.len()];
    for &p in &pivots[..rank1] {
        linear_pivot[p] = true;
    }
    for v in 0..mask.len() {
        if mask[v] && !linear_pivot[v] && !ag.is_eliminated(v) {
            ag.set_zero(v)?;
        }
    }

    for i in (0..rank2).rev() {
        locally_structure_simplify(&mut mm.row_mut(i), pivots[i], ag, var_to_diff)?;
    }

    let mut reduced = false;
    let mut reconciled = 0;
    for i in 0..rank2 {
        if mm_orig.row(i).nnz() < mm.row(i).nnz() {
            mm.copy_row_from(i, mm_orig.row(i));
            reconciled += 1;
            reduced = true;
            locally_structure_simplify(&mut mm.row_mut(i), pivots[i], ag, var_to_diff)?;
        }
    }

    let mut sweeps = 0;
    if reduced {
        loop {
            if options.max_sweeps.map_or(false, |max| sweeps >= max) {
                tracing::warn!(target: "alias", sweeps, "sweep budget exhausted before fixpoint");
                break;
            }
            sweeps += 1;
            let mut changed = false;
            for i in (0..rank2).rev() {
                changed |= locally_structure_simplify(&mut mm.row_mut(i), pivots[i], ag, var_to_diff)?;
            }
            if !changed {
                break;
            }
        }
    }

    Ok(Round {
        matrix: mm,
        rank1,
        rank2,
        pivots,
        reconciled,
        sweeps,
    })
}

/// Rows of `mm` with aliases substituted, reordered by parent equation.
fn substituted_in_equation_order(
    mm: &mut SparseMatrixClil,
    ag: &mut AliasGraph,
) -> Result<SparseMatrixClil, AliasError> {
    for i in 0..mm.nrows() {
        substitute_aliases(&mut mm.row_mut(i), ag)?;
    }
    let mut order: Vec<usize> = (0..mm.nrows()).collect();
    order.sort_by_key(|&i| mm.nzrows()[i]);
    let mut out = SparseMatrixClil::new(mm.nparentrows(), mm.ncols());
    for i in order {
        out.push_row(mm.nzrows()[i], mm.row(i).iter().map(|(v, c)| (v, c.clone())));
    }
    Ok(out)
}

/// Point every incidence at surviving unknowns: linear equations get the
/// columns of their row, other equations have eliminated neighbors
/// replaced by their alias target.
fn write_back(graph: &mut BipartiteGraph, mm: &SparseMatrixClil, ag: &mut AliasGraph) -> Result<(), AliasError> {
    let mut in_linear = vec![false; graph.neqs()];
    for i in 0..mm.nrows() {
        let eq = mm.nzrows()[i];
        in_linear[eq] = true;
        graph.set_neighbors(eq, mm.row(i).cols().iter().copied());
    }
    for eq in 0..graph.neqs() {
        if in_linear[eq] {
            continue;
        }
        let mut vars: SmallVec<[VarId; 8]> = SmallVec::new();
        for &v in graph.eq_neighbors(eq) {
            match ag.try_get(v)? {
                None => vars.push(v),
                Some(Alias::Var(_, t)) => vars.push(t),
                Some(Alias::Zero) => {}
            }
        }
        graph.set_neighbors(eq, vars);
    }
    Ok(())
}

/// Eliminate aliases of the linear subsystem `mm_orig` of `graph`.
///
/// Factorizations are repeated on the substituted rows until one of them
/// records no new alias; that last factorization is discarded and the rows
/// it started from are returned. On return the incidence of every linear
/// equation matches its reduced row and no incidence references an
/// eliminated unknown.
pub fn alias_eliminate_graph(
    graph: &mut BipartiteGraph,
    var_to_diff: &DiffGraph,
    mut mm_orig: SparseMatrixClil,
    options: &AliasOptions,
) -> Result<AliasElimination, AliasError> {
    ensure_alias_invariant!(
        mm_orig.ncols() == graph.nvars() && var_to_diff.len() == graph.nvars(),
        "matrix has {} columns and derivative chain {} entries for {} unknowns",
        mm_orig.ncols(),
        var_to_diff.len(),
        graph.nvars()
    );

    let mut ag = AliasGraph::new(graph.nvars());
    let mut current = substituted_in_equation_order(&mut mm_orig, &mut ag)?;
    let mut first: Option<(usize, usize, Vec<VarId>)> = None;
    let (mut reconciled, mut sweeps, mut rounds) = (0, 0, 0);

    loop {
        let mask = linear_variable_mask(graph, var_to_diff, &current);
        let before = ag.len();
        let mut round = eliminate_round(&current, &mask, &mut ag, var_to_diff, options)?;
        rounds += 1;
        reconciled += round.reconciled;
        sweeps += round.sweeps;
        if first.is_none() {
            first = Some((round.rank1, round.rank2, std::mem::take(&mut round.pivots)));
        }
        if ag.len() == before {
            break;
        }
        current = substituted_in_equation_order(&mut round.matrix, &mut ag)?;
        write_back(graph, &current, &mut ag)?;
    }
    write_back(graph, &current, &mut ag)?;

    let (rank1, rank2, pivots) = first.unwrap_or_default();
    tracing::debug!(
        target: "alias",
        eliminated = ag.len(),
        reconciled,
        sweeps,
        rounds,
        "alias elimination done"
    );

    Ok(AliasElimination {
        aliases: ag,
        matrix: current,
        rank1,
        rank2,
        pivots,
        reconciled,
        sweeps,
        rounds,
    })
}
