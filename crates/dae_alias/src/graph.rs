//! Equation/variable incidence and the derivative chain.
//!
//! Both structures use dense indices: equations are `0..neqs`, unknowns are
//! `0..nvars`. Adjacency lists are kept sorted so every traversal of the
//! graph is deterministic.

use crate::error::AliasError;

pub type VarId = usize;
pub type EqId = usize;

/// Bipartite incidence between equations (sources) and unknowns (destinations).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BipartiteGraph {
    /// Unknowns of each equation, sorted. `len == neqs`.
    fadjlist: Vec<Vec<VarId>>,
    /// Equations each unknown occurs in, sorted. `len == nvars`.
    badjlist: Vec<Vec<EqId>>,
}

fn insert_sorted(list: &mut Vec<usize>, value: usize) -> bool {
    match list.binary_search(&value) {
        Ok(_) => false,
        Err(pos) => {
            list.insert(pos, value);
            true
        }
    }
}

fn remove_sorted(list: &mut Vec<usize>, value: usize) {
    if let Ok(pos) = list.binary_search(&value) {
        list.remove(pos);
    }
}

impl BipartiteGraph {
    pub fn new(neqs: usize, nvars: usize) -> Self {
        Self {
            fadjlist: vec![Vec::new(); neqs],
            badjlist: vec![Vec::new(); nvars],
        }
    }

    pub fn neqs(&self) -> usize {
        self.fadjlist.len()
    }

    pub fn nvars(&self) -> usize {
        self.badjlist.len()
    }

    /// Number of edges.
    pub fn ne(&self) -> usize {
        self.fadjlist.iter().map(Vec::len).sum()
    }

    /// Returns `false` if the edge already existed.
    pub fn add_edge(&mut self, eq: EqId, var: VarId) -> bool {
        let added = insert_sorted(&mut self.fadjlist[eq], var);
        if added {
            insert_sorted(&mut self.badjlist[var], eq);
        }
        added
    }

    pub fn has_edge(&self, eq: EqId, var: VarId) -> bool {
        self.fadjlist[eq].binary_search(&var).is_ok()
    }

    #[inline]
    pub fn eq_neighbors(&self, eq: EqId) -> &[VarId] {
        &self.fadjlist[eq]
    }

    #[inline]
    pub fn var_neighbors(&self, var: VarId) -> &[EqId] {
        &self.badjlist[var]
    }

    /// Overwrite the incidence of `eq`, keeping both directions in sync.
    pub fn set_neighbors(&mut self, eq: EqId, vars: impl IntoIterator<Item = VarId>) {
        let old = std::mem::take(&mut self.fadjlist[eq]);
        for var in old {
            remove_sorted(&mut self.badjlist[var], eq);
        }
        for var in vars {
            self.add_edge(eq, var);
        }
    }
}

/// Partial injective map `var -> D(var)` together with its inverse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffGraph {
    to: Vec<Option<VarId>>,
    from: Vec<Option<VarId>>,
}

impl DiffGraph {
    pub fn new(nvars: usize) -> Self {
        Self {
            to: vec![None; nvars],
            from: vec![None; nvars],
        }
    }

    pub fn len(&self) -> usize {
        self.to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to.is_empty()
    }

    /// Record `derivative == D(var)`.
    ///
    /// Rejects edges that would give a variable two derivatives, give a
    /// derivative two antiderivatives, or close a cycle.
    pub fn add_edge(&mut self, var: VarId, derivative: VarId) -> Result<(), AliasError> {
        let err = AliasError::DerivativeChain { var, derivative };
        if var == derivative {
            return Err(err);
        }
        match (self.to[var], self.from[derivative]) {
            (Some(d), Some(v)) if d == derivative && v == var => return Ok(()),
            (None, None) => {}
            _ => return Err(err),
        }
        // `var` must not already descend from `derivative`.
        let mut up = self.from[var];
        while let Some(v) = up {
            if v == derivative {
                return Err(err);
            }
            up = self.from[v];
        }
        self.to[var] = Some(derivative);
        self.from[derivative] = Some(var);
        Ok(())
    }

    #[inline]
    pub fn derivative_of(&self, var: VarId) -> Option<VarId> {
        self.to[var]
    }

    #[inline]
    pub fn antiderivative_of(&self, var: VarId) -> Option<VarId> {
        self.from[var]
    }

    /// True when `var` neither has a derivative nor is one.
    pub fn is_undifferentiated(&self, var: VarId) -> bool {
        self.to[var].is_none() && self.from[var].is_none()
    }

    /// Number of antiderivative steps above `var`.
    pub fn order(&self, var: VarId) -> usize {
        let mut n = 0;
        let mut up = self.from[var];
        while let Some(v) = up {
            n += 1;
            up = self.from[v];
        }
        n
    }
}
