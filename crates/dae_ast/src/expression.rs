//! Expression arena.
//!
//! Expressions are stored once in a [`Context`] and referenced by
//! [`ExprId`]. Structurally equal nodes are hash-consed, so two `ExprId`s
//! compare equal exactly when the expressions they name are identical.
//! Unknowns of a DAE are the `Variable` nodes and the `Derivative` nodes
//! built on top of them.

use crate::error::AstError;
use crate::symbol::{SymbolId, SymbolTable};
use num_bigint::BigInt;
use num_rational::BigRational;
use rustc_hash::FxHashMap;

/// Handle into a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Number(BigRational),
    Variable(SymbolId),
    /// Time derivative of an unknown (`Variable` or another `Derivative`).
    Derivative(ExprId),
    Add(ExprId, ExprId),
    Sub(ExprId, ExprId),
    Mul(ExprId, ExprId),
    Div(ExprId, ExprId),
    Pow(ExprId, ExprId),
    Neg(ExprId),
    Function(String, Vec<ExprId>),
}

/// `lhs = rhs`, both sides living in the same [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Equation {
    pub lhs: ExprId,
    pub rhs: ExprId,
}

impl Equation {
    pub fn new(lhs: ExprId, rhs: ExprId) -> Self {
        Self { lhs, rhs }
    }
}

/// Arena owning every expression node of a model.
#[derive(Debug, Clone, Default)]
pub struct Context {
    nodes: Vec<Expr>,
    interned: FxHashMap<Expr, ExprId>,
    symbols: SymbolTable,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `expr`, returning the existing id if an identical node exists.
    pub fn add(&mut self, expr: Expr) -> ExprId {
        if let Some(&id) = self.interned.get(&expr) {
            return id;
        }
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(expr.clone());
        self.interned.insert(expr, id);
        id
    }

    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    /// Number of distinct nodes allocated so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn num(&mut self, n: i64) -> ExprId {
        self.add(Expr::Number(BigRational::from_integer(BigInt::from(n))))
    }

    pub fn rational(&mut self, value: BigRational) -> ExprId {
        self.add(Expr::Number(value))
    }

    pub fn var(&mut self, name: &str) -> ExprId {
        let sym = self.symbols.intern(name);
        self.add(Expr::Variable(sym))
    }

    /// `D(u)` for an unknown `u`.
    pub fn der(&mut self, inner: ExprId) -> Result<ExprId, AstError> {
        if !self.is_unknown(inner) {
            return Err(AstError::InvalidDerivative(format!(
                "{}",
                crate::display::DisplayExpr {
                    context: self,
                    id: inner
                }
            )));
        }
        Ok(self.add(Expr::Derivative(inner)))
    }

    pub fn func(&mut self, name: &str, args: Vec<ExprId>) -> ExprId {
        self.add(Expr::Function(name.to_owned(), args))
    }

    #[inline]
    pub fn sym_name(&self, id: SymbolId) -> &str {
        self.symbols.name(id)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// True for `Variable` and `Derivative` nodes.
    pub fn is_unknown(&self, id: ExprId) -> bool {
        matches!(self.get(id), Expr::Variable(_) | Expr::Derivative(_))
    }

    /// The unknown `id` differentiates, if it is a `Derivative`.
    pub fn derivative_inner(&self, id: ExprId) -> Option<ExprId> {
        match self.get(id) {
            Expr::Derivative(inner) => Some(*inner),
            _ => None,
        }
    }

    /// Sum of `terms`, folded left; the empty sum is `0`.
    pub fn sum(&mut self, terms: impl IntoIterator<Item = ExprId>) -> ExprId {
        let mut acc: Option<ExprId> = None;
        for term in terms {
            acc = Some(match acc {
                Some(prev) => self.add(Expr::Add(prev, term)),
                None => term,
            });
        }
        match acc {
            Some(id) => id,
            None => self.num(0),
        }
    }

    /// `coef * term`, with unit coefficients rendered as `term` / `-term`.
    pub fn scaled(&mut self, coef: &BigRational, term: ExprId) -> ExprId {
        use num_traits::{One, Signed};
        if coef.is_one() {
            term
        } else if (-coef).is_one() {
            self.add(Expr::Neg(term))
        } else if coef.is_negative() {
            let c = self.rational(-coef);
            let prod = self.add(Expr::Mul(c, term));
            self.add(Expr::Neg(prod))
        } else {
            let c = self.rational(coef.clone());
            self.add(Expr::Mul(c, term))
        }
    }

    pub fn equation(&self, lhs: ExprId, rhs: ExprId) -> Equation {
        Equation::new(lhs, rhs)
    }
}
