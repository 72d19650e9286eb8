//! Error types for the expression layer.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AstError {
    /// `D(·)` was applied to something that is not an unknown.
    #[error("derivative of a non-variable expression: {0}")]
    InvalidDerivative(String),
}
