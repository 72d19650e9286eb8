use crate::alias_graph::Alias;
use crate::graph::VarId;
use dae_ast::AstError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AliasError {
    /// Write-once violation on the alias table. Fatal for the pass.
    #[error("variable {var} is already eliminated as {existing}; refusing to record {attempted}")]
    Reassigned {
        var: VarId,
        existing: Alias,
        attempted: Alias,
    },
    #[error("variable {0} has not been eliminated")]
    MissingKey(VarId),
    #[error("observed equations contain at least one cycle ({ordered} of {total} ordered)")]
    ObservedCycle { ordered: usize, total: usize },
    #[error("lhs of observed equation {equation} is not an unknown of the system")]
    UnknownObservedLhs { equation: usize },
    #[error("derivative chain is not an injective acyclic map at {var} -> {derivative}")]
    DerivativeChain { var: VarId, derivative: VarId },
    #[error("invalid alias options: {0}")]
    Options(String),
    #[error(transparent)]
    Ast(#[from] AstError),
    /// Internal invariant violation
    #[error("internal error: {0}")]
    Internal(String),
}

/// Invariant check for the alias pass.
/// Debug builds assert; release builds return `AliasError::Internal`.
#[macro_export]
macro_rules! ensure_alias_invariant {
    ($cond:expr, $msg:literal $(, $args:expr)* $(,)?) => {
        if cfg!(debug_assertions) {
            debug_assert!($cond, $msg $(, $args)*);
        }
        if !$cond {
            return Err($crate::error::AliasError::Internal(format!($msg $(, $args)*)));
        }
    };
}
