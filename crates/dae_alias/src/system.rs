//! Equation system adapter: unknown numbering, incidence and the linear
//! subsystem of a set of symbolic equations.

use crate::error::AliasError;
use crate::graph::{BipartiteGraph, DiffGraph, EqId, VarId};
use crate::sparse::SparseMatrixClil;
use dae_ast::{collect_unknowns, equation_linear_combination, Context, Equation, ExprId};
use num_bigint::BigInt;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct DaeSystem {
    pub(crate) ctx: Context,
    pub(crate) equations: Vec<Equation>,
    /// Unknowns in first-appearance order, followed by derivative
    /// antecedents that only occur under `D(·)`.
    pub(crate) fullvars: Vec<ExprId>,
    pub(crate) var_index: FxHashMap<ExprId, VarId>,
    pub(crate) graph: BipartiteGraph,
    pub(crate) var_to_diff: DiffGraph,
}

impl DaeSystem {
    pub fn new(ctx: Context, equations: Vec<Equation>) -> Result<Self, AliasError> {
        let mut per_equation: Vec<Vec<ExprId>> = Vec::with_capacity(equations.len());
        let mut fullvars: Vec<ExprId> = Vec::new();
        let mut var_index: FxHashMap<ExprId, VarId> = FxHashMap::default();
        for eq in &equations {
            let mut found = Vec::new();
            collect_unknowns(&ctx, eq.lhs, &mut found);
            collect_unknowns(&ctx, eq.rhs, &mut found);
            for &u in &found {
                if !var_index.contains_key(&u) {
                    var_index.insert(u, fullvars.len());
                    fullvars.push(u);
                }
            }
            per_equation.push(found);
        }

        // Close the derivative chain: `D(D(x))` pulls in `D(x)` and `x`.
        let mut i = 0;
        while i < fullvars.len() {
            if let Some(inner) = ctx.derivative_inner(fullvars[i]) {
                if !var_index.contains_key(&inner) {
                    var_index.insert(inner, fullvars.len());
                    fullvars.push(inner);
                }
            }
            i += 1;
        }

        let mut var_to_diff = DiffGraph::new(fullvars.len());
        for (v, &u) in fullvars.iter().enumerate() {
            if let Some(inner) = ctx.derivative_inner(u) {
                if let Some(&antecedent) = var_index.get(&inner) {
                    var_to_diff.add_edge(antecedent, v)?;
                }
            }
        }

        let mut graph = BipartiteGraph::new(equations.len(), fullvars.len());
        for (eq, found) in per_equation.iter().enumerate() {
            for u in found {
                if let Some(&v) = var_index.get(u) {
                    graph.add_edge(eq, v);
                }
            }
        }

        tracing::debug!(
            target: "alias",
            equations = equations.len(),
            unknowns = fullvars.len(),
            incidence = graph.ne(),
            "system built"
        );

        Ok(Self {
            ctx,
            equations,
            fullvars,
            var_index,
            graph,
            var_to_diff,
        })
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn equations(&self) -> &[Equation] {
        &self.equations
    }

    pub fn fullvars(&self) -> &[ExprId] {
        &self.fullvars
    }

    pub fn var_of(&self, unknown: ExprId) -> Option<VarId> {
        self.var_index.get(&unknown).copied()
    }

    pub fn graph(&self) -> &BipartiteGraph {
        &self.graph
    }

    pub fn var_to_diff(&self) -> &DiffGraph {
        &self.var_to_diff
    }

    /// Integer coefficient row of equation `eq` if it is homogeneous
    /// linear with exact coefficients. Rational rows are scaled by the lcm
    /// of their denominators.
    pub fn linear_row(&self, eq: EqId) -> Option<Vec<(VarId, BigInt)>> {
        let lc = equation_linear_combination(&self.ctx, &self.equations[eq])?;
        if !lc.is_homogeneous() {
            return None;
        }
        lc.integer_row()
            .into_iter()
            .map(|(u, c)| self.var_of(u).map(|v| (v, c)))
            .collect()
    }

    /// Coefficient matrix of every linear equation, in equation order.
    pub fn linear_subsys_adjmat(&self) -> SparseMatrixClil {
        let mut mm = SparseMatrixClil::new(self.equations.len(), self.fullvars.len());
        for eq in 0..self.equations.len() {
            if let Some(row) = self.linear_row(eq) {
                mm.push_row(eq, row);
            }
        }
        mm
    }
}
