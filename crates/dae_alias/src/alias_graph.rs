//! Alias table: eliminated unknowns and what they are equal to.
//!
//! Every entry is either `v = 0` or `v = ±t`. Entries are write-once, and
//! reads compress chains so that after [`AliasGraph::get`] the stored target
//! of a key is itself not eliminated (or the entry is `Zero`).

use crate::ensure_alias_invariant;
use crate::error::AliasError;
use crate::graph::VarId;
use num_bigint::BigInt;
use smallvec::SmallVec;
use std::fmt;
use std::ops::Mul;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sign {
    Pos,
    Neg,
}

impl Sign {
    /// Sign of a nonzero integer.
    pub fn of(n: &BigInt) -> Sign {
        if n.sign() == num_bigint::Sign::Minus {
            Sign::Neg
        } else {
            Sign::Pos
        }
    }

    pub fn flip(self) -> Sign {
        match self {
            Sign::Pos => Sign::Neg,
            Sign::Neg => Sign::Pos,
        }
    }

    /// Multiply a coefficient by this sign.
    pub fn apply(self, n: BigInt) -> BigInt {
        match self {
            Sign::Pos => n,
            Sign::Neg => -n,
        }
    }
}

impl Mul for Sign {
    type Output = Sign;

    fn mul(self, rhs: Sign) -> Sign {
        if self == rhs {
            Sign::Pos
        } else {
            Sign::Neg
        }
    }
}

/// Right-hand side of an elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alias {
    Zero,
    Var(Sign, VarId),
}

impl Alias {
    pub fn target(&self) -> Option<VarId> {
        match self {
            Alias::Zero => None,
            Alias::Var(_, t) => Some(*t),
        }
    }

    pub fn scale(self, sign: Sign) -> Alias {
        match self {
            Alias::Zero => Alias::Zero,
            Alias::Var(s, t) => Alias::Var(s * sign, t),
        }
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alias::Zero => write!(f, "0"),
            Alias::Var(Sign::Pos, t) => write!(f, "+v{}", t),
            Alias::Var(Sign::Neg, t) => write!(f, "-v{}", t),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasGraph {
    aliasto: Vec<Option<Alias>>,
    /// Keys in insertion order.
    eliminated: Vec<VarId>,
}

impl AliasGraph {
    pub fn new(nvars: usize) -> Self {
        Self {
            aliasto: vec![None; nvars],
            eliminated: Vec::new(),
        }
    }

    /// Number of eliminated unknowns.
    pub fn len(&self) -> usize {
        self.eliminated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eliminated.is_empty()
    }

    pub fn nvars(&self) -> usize {
        self.aliasto.len()
    }

    #[inline]
    pub fn is_eliminated(&self, var: VarId) -> bool {
        self.aliasto.get(var).map_or(false, Option::is_some)
    }

    /// Entry as stored, without following chains.
    pub fn stored(&self, var: VarId) -> Option<Alias> {
        self.aliasto.get(var).copied().flatten()
    }

    /// Fully resolved alias of `var`, compressing the chain on the way.
    pub fn get(&mut self, var: VarId) -> Result<Alias, AliasError> {
        let Some(first) = self.stored(var) else {
            return Err(AliasError::MissingKey(var));
        };

        let mut path: SmallVec<[VarId; 8]> = SmallVec::new();
        path.push(var);
        let mut current = first;
        while let Alias::Var(sign, t) = current {
            match self.stored(t) {
                Some(next) => {
                    ensure_alias_invariant!(
                        path.len() <= self.eliminated.len(),
                        "alias chain from v{} does not terminate",
                        var
                    );
                    path.push(t);
                    current = next.scale(sign);
                }
                None => break,
            }
        }

        // Rewrite every key on the path to point at the terminal. The sign of
        // each key relative to the terminal is recovered by walking the
        // stored links from the end.
        let terminal = current;
        let mut rel = Sign::Pos;
        for &key in path.iter().rev() {
            let link = self.stored(key);
            let compressed = match terminal {
                Alias::Zero => Alias::Zero,
                Alias::Var(_, t) => {
                    let step = match link {
                        Some(Alias::Var(s, _)) => s,
                        _ => Sign::Pos,
                    };
                    rel = step * rel;
                    Alias::Var(rel, t)
                }
            };
            self.aliasto[key] = Some(compressed);
        }
        Ok(terminal)
    }

    /// Resolved alias if `var` is eliminated.
    pub fn try_get(&mut self, var: VarId) -> Result<Option<Alias>, AliasError> {
        if self.is_eliminated(var) {
            self.get(var).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Resolve an alias value through the table.
    pub fn resolve(&mut self, alias: Alias) -> Result<Alias, AliasError> {
        match alias {
            Alias::Zero => Ok(Alias::Zero),
            Alias::Var(s, t) => match self.try_get(t)? {
                Some(found) => Ok(found.scale(s)),
                None => Ok(alias),
            },
        }
    }

    /// Record `var = alias`. Write-once.
    pub fn set(&mut self, var: VarId, alias: Alias) -> Result<(), AliasError> {
        if let Some(existing) = self.stored(var) {
            return Err(AliasError::Reassigned {
                var,
                existing,
                attempted: alias,
            });
        }
        ensure_alias_invariant!(
            var < self.aliasto.len(),
            "v{} is outside the alias table",
            var
        );
        let resolved = self.resolve(alias)?;
        ensure_alias_invariant!(
            resolved.target() != Some(var),
            "aliasing v{} to {} would close a cycle",
            var,
            alias
        );
        self.aliasto[var] = Some(alias);
        self.eliminated.push(var);
        Ok(())
    }

    pub fn set_zero(&mut self, var: VarId) -> Result<(), AliasError> {
        self.set(var, Alias::Zero)
    }

    /// Stored entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, Alias)> + '_ {
        self.eliminated
            .iter()
            .filter_map(move |&v| self.stored(v).map(|a| (v, a)))
    }

    pub fn keys(&self) -> &[VarId] {
        &self.eliminated
    }

    /// Compress every entry; returns the resolved table in insertion order.
    pub fn resolve_all(&mut self) -> Result<Vec<(VarId, Alias)>, AliasError> {
        let keys = self.eliminated.clone();
        keys.into_iter()
            .map(|v| self.get(v).map(|a| (v, a)))
            .collect()
    }
}
