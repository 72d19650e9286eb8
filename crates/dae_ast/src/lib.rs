//! Symbolic layer for DAE models: an interned expression arena, exact
//! linear extraction and unknown substitution.

pub mod display;
pub mod error;
pub mod expression;
pub mod linear;
pub mod substitute;
pub mod symbol;

pub use display::{DisplayEquation, DisplayExpr};
pub use error::AstError;
pub use expression::{Context, Equation, Expr, ExprId};
pub use linear::{equation_linear_combination, linear_combination, LinearCombination};
pub use substitute::{collect_unknowns, substitute};
pub use symbol::{SymbolId, SymbolTable};
