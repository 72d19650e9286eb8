//! Exact linear extraction over unknowns.
//!
//! `linear_combination` rewrites an expression into `Σ cᵢ·uᵢ + constant`
//! where every `uᵢ` is an unknown and every coefficient is an exact
//! rational. Anything that would need a symbolic or inexact coefficient
//! (`x*y`, `sin(x)`, `x^2`, `1/x`, `sin(2)`) makes the expression
//! non-linear for our purposes and yields `None`.

use crate::expression::{Context, Equation, Expr, ExprId};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::collections::BTreeMap;

/// `Σ terms[u]·u + constant`. Zero coefficients are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinearCombination {
    pub terms: BTreeMap<ExprId, BigRational>,
    pub constant: BigRational,
}

impl LinearCombination {
    fn constant(value: BigRational) -> Self {
        Self {
            terms: BTreeMap::new(),
            constant: value,
        }
    }

    fn unknown(id: ExprId) -> Self {
        let mut terms = BTreeMap::new();
        terms.insert(id, BigRational::one());
        Self {
            terms,
            constant: BigRational::zero(),
        }
    }

    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// No constant term.
    pub fn is_homogeneous(&self) -> bool {
        self.constant.is_zero()
    }

    /// Adds `coef * term`, dropping the entry when it cancels.
    pub fn add_term(&mut self, term: ExprId, coef: &BigRational) {
        if coef.is_zero() {
            return;
        }
        let entry = self.terms.entry(term).or_insert_with(BigRational::zero);
        *entry += coef.clone();
        if entry.is_zero() {
            self.terms.remove(&term);
        }
    }

    fn add_scaled(&mut self, other: &Self, factor: &BigRational) {
        for (&term, coef) in &other.terms {
            self.add_term(term, &(coef * factor));
        }
        self.constant += &other.constant * factor;
    }

    fn scale(mut self, factor: &BigRational) -> Self {
        if factor.is_zero() {
            return Self::default();
        }
        for coef in self.terms.values_mut() {
            *coef *= factor.clone();
        }
        self.constant *= factor.clone();
        self
    }

    /// Coefficients scaled by the lcm of their denominators.
    ///
    /// The constant term is ignored; callers use this on homogeneous rows.
    pub fn integer_row(&self) -> Vec<(ExprId, BigInt)> {
        let lcm = self
            .terms
            .values()
            .fold(BigInt::one(), |acc, c| acc.lcm(c.denom()));
        let scale = BigRational::from_integer(lcm);
        self.terms
            .iter()
            .map(|(&term, coef)| (term, (coef * &scale).to_integer()))
            .collect()
    }

    /// Rebuild an expression for this combination.
    ///
    /// Terms after the first are chained with `+`/`-` by coefficient sign,
    /// so `x - 2*y` rather than `x + -2*y`.
    pub fn to_expr(&self, ctx: &mut Context) -> ExprId {
        if self.terms.is_empty() {
            return ctx.rational(self.constant.clone());
        }
        let mut parts: Vec<(ExprId, BigRational)> = self
            .terms
            .iter()
            .map(|(&term, coef)| (term, coef.clone()))
            .collect();
        if !self.constant.is_zero() {
            let c = ctx.rational(self.constant.abs());
            parts.push((c, self.constant.signum()));
        }
        let mut acc: Option<ExprId> = None;
        for (term, coef) in parts {
            acc = Some(match acc {
                None => ctx.scaled(&coef, term),
                Some(prev) if coef.is_negative() => {
                    let t = ctx.scaled(&-coef, term);
                    ctx.add(Expr::Sub(prev, t))
                }
                Some(prev) => {
                    let t = ctx.scaled(&coef, term);
                    ctx.add(Expr::Add(prev, t))
                }
            });
        }
        match acc {
            Some(id) => id,
            None => ctx.num(0),
        }
    }
}

/// Linear form of `expr` over the unknowns of `ctx`, or `None`.
pub fn linear_combination(ctx: &Context, expr: ExprId) -> Option<LinearCombination> {
    match ctx.get(expr) {
        Expr::Number(n) => Some(LinearCombination::constant(n.clone())),
        Expr::Variable(_) | Expr::Derivative(_) => Some(LinearCombination::unknown(expr)),
        Expr::Add(a, b) => {
            let mut lhs = linear_combination(ctx, *a)?;
            let rhs = linear_combination(ctx, *b)?;
            lhs.add_scaled(&rhs, &BigRational::one());
            Some(lhs)
        }
        Expr::Sub(a, b) => {
            let mut lhs = linear_combination(ctx, *a)?;
            let rhs = linear_combination(ctx, *b)?;
            lhs.add_scaled(&rhs, &-BigRational::one());
            Some(lhs)
        }
        Expr::Neg(a) => Some(linear_combination(ctx, *a)?.scale(&-BigRational::one())),
        Expr::Mul(a, b) => {
            let lhs = linear_combination(ctx, *a)?;
            let rhs = linear_combination(ctx, *b)?;
            match (lhs.is_constant(), rhs.is_constant()) {
                (true, _) => Some(rhs.scale(&lhs.constant)),
                (false, true) => Some(lhs.scale(&rhs.constant)),
                (false, false) => None,
            }
        }
        Expr::Div(a, b) => {
            let den = linear_combination(ctx, *b)?;
            if !den.is_constant() || den.constant.is_zero() {
                return None;
            }
            Some(linear_combination(ctx, *a)?.scale(&den.constant.recip()))
        }
        Expr::Pow(base, exp) => {
            let exp = linear_combination(ctx, *exp)?;
            if !exp.is_constant() || !exp.constant.is_integer() {
                return None;
            }
            let base = linear_combination(ctx, *base)?;
            if exp.constant.is_one() {
                return Some(base);
            }
            if !base.is_constant() {
                return None;
            }
            let power = exp.constant.to_integer().to_i32()?;
            if power < 0 && base.constant.is_zero() {
                return None;
            }
            Some(LinearCombination::constant(base.constant.pow(power)))
        }
        Expr::Function(..) => None,
    }
}

/// Linear form of `lhs - rhs`.
pub fn equation_linear_combination(ctx: &Context, eq: &Equation) -> Option<LinearCombination> {
    let mut lhs = linear_combination(ctx, eq.lhs)?;
    let rhs = linear_combination(ctx, eq.rhs)?;
    lhs.add_scaled(&rhs, &-BigRational::one());
    Some(lhs)
}
