//! Ordering of observed (defining) equations.

use crate::error::AliasError;
use dae_ast::{collect_unknowns, Context, Equation, ExprId};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// Kahn ordering of defining equations.
///
/// Equation `i` defines unknown `assigns[i]` and reads `rhs_vars[i]`.
/// An equation depends on every equation defining one of its right-hand
/// side unknowns (itself included). With `check` set, a cycle is an error;
/// otherwise the acyclic prefix found so far is returned.
pub fn topsort_defining(
    assigns: &[usize],
    rhs_vars: &[Vec<usize>],
    nvars: usize,
    check: bool,
) -> Result<Vec<usize>, AliasError> {
    let neqs = assigns.len();
    let mut readers: Vec<Vec<usize>> = vec![Vec::new(); nvars];
    for (eq, vars) in rhs_vars.iter().enumerate() {
        for &v in vars {
            if readers[v].last() != Some(&eq) {
                readers[v].push(eq);
            }
        }
    }

    let mut degrees = vec![0usize; neqs];
    for &var in assigns {
        for &reader in &readers[var] {
            degrees[reader] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..neqs).filter(|&eq| degrees[eq] == 0).collect();
    let mut ordered = Vec::with_capacity(neqs);
    while let Some(eq) = queue.pop_front() {
        ordered.push(eq);
        for &reader in &readers[assigns[eq]] {
            degrees[reader] -= 1;
            if degrees[reader] == 0 {
                queue.push_back(reader);
            }
        }
    }

    if check && ordered.len() != neqs {
        return Err(AliasError::ObservedCycle {
            ordered: ordered.len(),
            total: neqs,
        });
    }
    Ok(ordered)
}

/// Order `eqs` (each `unknown = expression`) so that every equation comes
/// after the equations defining the unknowns it reads.
pub fn topsort_equations(
    ctx: &Context,
    eqs: &[Equation],
    unknowns: &[ExprId],
    check: bool,
) -> Result<Vec<Equation>, AliasError> {
    let index: FxHashMap<ExprId, usize> = unknowns.iter().enumerate().map(|(i, &u)| (u, i)).collect();

    let mut assigns = Vec::with_capacity(eqs.len());
    let mut rhs_vars = Vec::with_capacity(eqs.len());
    for (i, eq) in eqs.iter().enumerate() {
        let Some(&lhs) = index.get(&eq.lhs) else {
            return Err(AliasError::UnknownObservedLhs { equation: i });
        };
        assigns.push(lhs);

        let mut found = Vec::new();
        collect_unknowns(ctx, eq.rhs, &mut found);
        rhs_vars.push(found.iter().filter_map(|u| index.get(u).copied()).collect());
    }

    let order = topsort_defining(&assigns, &rhs_vars, unknowns.len(), check)?;
    Ok(order.into_iter().map(|i| eqs[i]).collect())
}
