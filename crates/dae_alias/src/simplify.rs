//! Local structural simplification of a single reduced row.
//!
//! A row that, after substituting known aliases, mentions its pivot and at
//! most one other unknown with a coefficient of the same magnitude says
//! `pivot = 0` or `pivot = ±other`. That fact is recorded in the alias
//! table, pushed up the derivative chain, and the row is cleared.

use crate::alias_graph::{Alias, AliasGraph, Sign};
use crate::error::AliasError;
use crate::graph::{DiffGraph, VarId};
use crate::sparse::RowMut;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use smallvec::SmallVec;

/// Replace every eliminated unknown of `row` by its resolved alias.
pub(crate) fn substitute_aliases(row: &mut RowMut<'_>, ag: &mut AliasGraph) -> Result<(), AliasError> {
    let snapshot: SmallVec<[VarId; 8]> = row.view().cols().iter().copied().collect();
    for var in snapshot {
        let Some(alias) = ag.try_get(var)? else {
            continue;
        };
        let Some(coeff) = row.remove(var) else {
            continue;
        };
        if let Alias::Var(sign, target) = alias {
            row.add(target, &sign.apply(coeff));
        }
    }
    Ok(())
}

/// Walk antiderivatives of both unknowns in lockstep; the pivot may not
/// sit deeper in its chain than the unknown it is aliased to.
fn depth_allows(var_to_diff: &DiffGraph, pivot: VarId, target: VarId) -> bool {
    let (mut p, mut t) = (pivot, target);
    loop {
        match (var_to_diff.antiderivative_of(p), var_to_diff.antiderivative_of(t)) {
            (Some(a), Some(b)) => {
                p = a;
                t = b;
            }
            (Some(_), None) => return false,
            _ => return true,
        }
    }
}

/// `pivot = alias` followed by the implied `D^k(pivot) = D^k(alias)` links.
fn plan_chain(var_to_diff: &DiffGraph, pivot: VarId, alias: Alias) -> SmallVec<[(VarId, Alias); 4]> {
    let mut links: SmallVec<[(VarId, Alias); 4]> = SmallVec::new();
    links.push((pivot, alias));
    let (mut var, mut rhs) = (pivot, alias);
    while let Some(dvar) = var_to_diff.derivative_of(var) {
        let next = match rhs {
            Alias::Zero => Alias::Zero,
            Alias::Var(sign, t) => match var_to_diff.derivative_of(t) {
                Some(dt) => Alias::Var(sign, dt),
                None => break,
            },
        };
        links.push((dvar, next));
        var = dvar;
        rhs = next;
    }
    links
}

/// Try to eliminate `pivot` using the row it was chosen for.
///
/// Returns `Ok(true)` when an alias was recorded and the row cleared,
/// `Ok(false)` when the row does not have alias shape (the row may still
/// have had known aliases substituted into it).
pub fn locally_structure_simplify(
    row: &mut RowMut<'_>,
    pivot: VarId,
    ag: &mut AliasGraph,
    var_to_diff: &DiffGraph,
) -> Result<bool, AliasError> {
    if row.get(pivot).is_none() {
        return Ok(false);
    }
    substitute_aliases(row, ag)?;
    if ag.is_eliminated(pivot) {
        return Ok(false);
    }
    let Some(pivot_val) = row.get(pivot).cloned() else {
        return Ok(false);
    };

    let other: Option<(VarId, BigInt)> = {
        let view = row.view();
        let mut others = view.iter().filter(|&(v, _)| v != pivot);
        let first = others.next().map(|(v, c)| (v, c.clone()));
        if others.next().is_some() {
            return Ok(false);
        }
        first
    };

    let alias = match other {
        None => Alias::Zero,
        Some((target, val)) => {
            let (q, r) = val.div_rem(&pivot_val);
            if !r.is_zero() || !q.abs().is_one() {
                tracing::trace!(target: "alias", var = pivot, target, "coefficients are not ±1 multiples");
                return Ok(false);
            }
            if !depth_allows(var_to_diff, pivot, target) {
                tracing::trace!(target: "alias", var = pivot, target, "pivot is deeper in its derivative chain");
                return Ok(false);
            }
            // pivot_val * pivot + val * target = 0
            Alias::Var(Sign::of(&q).flip(), target)
        }
    };

    let links = plan_chain(var_to_diff, pivot, alias);
    for &(var, rhs) in links.iter().skip(1) {
        let Some(existing) = ag.try_get(var)? else {
            continue;
        };
        if existing != ag.resolve(rhs)? {
            tracing::trace!(
                target: "alias",
                var,
                existing = %existing,
                attempted = %rhs,
                "derivative chain conflict; keeping row"
            );
            return Ok(false);
        }
    }

    for (var, rhs) in links {
        if ag.is_eliminated(var) {
            continue;
        }
        let value = match ag.resolve(rhs)? {
            Alias::Var(Sign::Pos, t) if t == var => continue,
            Alias::Var(Sign::Neg, t) if t == var => Alias::Zero,
            _ => rhs,
        };
        ag.set(var, value)?;
        tracing::trace!(target: "alias", var, alias = %value, "eliminated");
    }

    row.zero();
    Ok(true)
}
