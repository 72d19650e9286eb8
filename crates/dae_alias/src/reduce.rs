//! Rewriting a system with the aliases found by one elimination pass.

use crate::alias_graph::{Alias, AliasGraph, Sign};
use crate::eliminate::alias_eliminate_graph;
use crate::error::AliasError;
use crate::graph::{BipartiteGraph, EqId};
use crate::observed::topsort_equations;
use crate::options::AliasOptions;
use crate::system::DaeSystem;
use dae_ast::{
    collect_unknowns, equation_linear_combination, substitute, Context, DisplayEquation, Equation, Expr, ExprId,
    LinearCombination,
};
use num_rational::BigRational;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasStats {
    pub rank1: usize,
    pub rank2: usize,
    pub eliminated: usize,
    pub reconciled: usize,
    pub sweeps: usize,
    pub rounds: usize,
    pub dropped_equations: usize,
}

/// System after alias elimination.
#[derive(Debug, Clone)]
pub struct ReducedSystem {
    pub ctx: Context,
    /// Remaining equations, in original order.
    pub equations: Vec<Equation>,
    /// Original slot of each remaining equation.
    pub kept: Vec<EqId>,
    /// Unknowns that survived, in original order.
    pub unknowns: Vec<ExprId>,
    /// `v = ±t` / `v = 0` for every eliminated unknown, dependency ordered.
    pub observed: Vec<Equation>,
    pub aliases: AliasGraph,
    /// Incidence over the original equation slots after elimination.
    pub graph: BipartiteGraph,
    pub stats: AliasStats,
}

impl ReducedSystem {
    pub fn display_equations(&self) -> Vec<String> {
        self.equations
            .iter()
            .map(|&equation| {
                DisplayEquation {
                    context: &self.ctx,
                    equation,
                }
                .to_string()
            })
            .collect()
    }

    pub fn display_observed(&self) -> Vec<String> {
        self.observed
            .iter()
            .map(|&equation| {
                DisplayEquation {
                    context: &self.ctx,
                    equation,
                }
                .to_string()
            })
            .collect()
    }
}

impl fmt::Display for ReducedSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.display_equations() {
            writeln!(f, "{}", line)?;
        }
        for line in self.display_observed() {
            writeln!(f, "{}  [observed]", line)?;
        }
        Ok(())
    }
}

fn alias_expr(ctx: &mut Context, fullvars: &[ExprId], alias: Alias) -> ExprId {
    match alias {
        Alias::Zero => ctx.num(0),
        Alias::Var(Sign::Pos, t) => fullvars[t],
        Alias::Var(Sign::Neg, t) => ctx.add(Expr::Neg(fullvars[t])),
    }
}

/// `lhs - rhs` is identically zero.
fn is_trivial(ctx: &Context, eq: &Equation) -> bool {
    eq.lhs == eq.rhs
        || equation_linear_combination(ctx, eq).map_or(false, |lc| lc.is_constant() && lc.is_homogeneous())
}

impl DaeSystem {
    /// Run one alias-elimination pass and rewrite the system with it.
    ///
    /// Linear equations are replaced by their reduced rows (kept verbatim
    /// when the row did not change), other equations get the aliases
    /// substituted, and equations that become `0 = 0` are dropped.
    pub fn alias_elimination(mut self, options: &AliasOptions) -> Result<ReducedSystem, AliasError> {
        let original = self.linear_subsys_adjmat();
        let result = alias_eliminate_graph(&mut self.graph, &self.var_to_diff, original.clone(), options)?;
        let mut aliases = result.aliases;
        let resolved = aliases.resolve_all()?;

        let DaeSystem {
            mut ctx,
            equations,
            fullvars,
            var_index,
            mut graph,
            ..
        } = self;

        let mut map: FxHashMap<ExprId, ExprId> = FxHashMap::default();
        let mut observed = Vec::with_capacity(resolved.len());
        for &(v, alias) in &resolved {
            let rhs = alias_expr(&mut ctx, &fullvars, alias);
            map.insert(fullvars[v], rhs);
            observed.push(Equation::new(fullvars[v], rhs));
        }

        let linear_rows: FxHashMap<EqId, usize> = result
            .matrix
            .nzrows()
            .iter()
            .enumerate()
            .map(|(row, &eq)| (eq, row))
            .collect();

        let mut reduced = Vec::with_capacity(equations.len());
        let mut kept = Vec::with_capacity(equations.len());
        for (eq, equation) in equations.iter().enumerate() {
            let rewritten = match linear_rows.get(&eq) {
                Some(&r) => {
                    let row = result.matrix.row(r);
                    let unchanged = original
                        .row_of_equation(eq)
                        .map_or(false, |o| original.row(o).iter().eq(row.iter()));
                    if row.is_empty() {
                        None
                    } else if unchanged {
                        Some(*equation)
                    } else {
                        let mut lc = LinearCombination::default();
                        for (v, c) in row.iter() {
                            lc.add_term(fullvars[v], &BigRational::from_integer(c.clone()));
                        }
                        let lhs = lc.to_expr(&mut ctx);
                        let zero = ctx.num(0);
                        Some(Equation::new(lhs, zero))
                    }
                }
                None => {
                    let lhs = substitute(&mut ctx, equation.lhs, &map);
                    let rhs = substitute(&mut ctx, equation.rhs, &map);
                    let candidate = Equation::new(lhs, rhs);
                    if is_trivial(&ctx, &candidate) {
                        None
                    } else {
                        let mut found = Vec::new();
                        collect_unknowns(&ctx, lhs, &mut found);
                        collect_unknowns(&ctx, rhs, &mut found);
                        graph.set_neighbors(eq, found.iter().filter_map(|u| var_index.get(u).copied()));
                        Some(candidate)
                    }
                }
            };
            match rewritten {
                Some(e) => {
                    reduced.push(e);
                    kept.push(eq);
                }
                None => graph.set_neighbors(eq, std::iter::empty()),
            }
        }

        let observed = topsort_equations(&ctx, &observed, &fullvars, options.check_cycles)?;
        let unknowns: Vec<ExprId> = fullvars
            .iter()
            .enumerate()
            .filter(|&(v, _)| !aliases.is_eliminated(v))
            .map(|(_, &u)| u)
            .collect();

        let stats = AliasStats {
            rank1: result.rank1,
            rank2: result.rank2,
            eliminated: aliases.len(),
            reconciled: result.reconciled,
            sweeps: result.sweeps,
            rounds: result.rounds,
            dropped_equations: equations.len() - reduced.len(),
        };
        tracing::debug!(
            target: "alias",
            equations = reduced.len(),
            unknowns = unknowns.len(),
            observed = observed.len(),
            dropped = stats.dropped_equations,
            "system reduced"
        );

        Ok(ReducedSystem {
            ctx,
            equations: reduced,
            kept,
            unknowns,
            observed,
            aliases,
            graph,
            stats,
        })
    }
}
