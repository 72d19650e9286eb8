//! Alias elimination for DAE systems.
//!
//! The linear part of a system is factorized with fraction-free
//! elimination; rows that reduce to `v = 0` or `v = ±w` become entries of an
//! [`AliasGraph`], which are propagated along the derivative chain and
//! substituted back into the remaining equations.
#![allow(clippy::needless_range_loop)] // Row loops index several parallel arrays

pub mod alias_graph;
pub mod bareiss;
pub mod eliminate;
pub mod error;
pub mod graph;
pub mod observed;
pub mod options;
pub mod reduce;
pub mod simplify;
pub mod sparse;
pub mod system;

pub use alias_graph::{Alias, AliasGraph, Sign};
pub use bareiss::{bareiss, BareissOutcome, ColumnMap};
pub use eliminate::{alias_eliminate_graph, linear_variable_mask, AliasElimination};
pub use error::AliasError;
pub use graph::{BipartiteGraph, DiffGraph, EqId, VarId};
pub use observed::{topsort_defining, topsort_equations};
pub use options::AliasOptions;
pub use reduce::{AliasStats, ReducedSystem};
pub use simplify::locally_structure_simplify;
pub use sparse::{RowMut, RowView, SparseMatrixClil};
pub use system::DaeSystem;
