use crate::expression::{Context, Equation, Expr, ExprId};
use std::fmt;

/// Renders an expression with minimal parentheses; derivatives print as `D(x)`.
pub struct DisplayExpr<'a> {
    pub context: &'a Context,
    pub id: ExprId,
}

/// Renders `lhs = rhs`.
pub struct DisplayEquation<'a> {
    pub context: &'a Context,
    pub equation: Equation,
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Add(..) | Expr::Sub(..) => 1,
        Expr::Mul(..) | Expr::Div(..) => 2,
        Expr::Neg(_) => 3,
        Expr::Pow(..) => 4,
        Expr::Number(n) if !n.is_integer() => 2,
        Expr::Number(_) | Expr::Variable(_) | Expr::Derivative(_) | Expr::Function(..) => 5,
    }
}

impl<'a> DisplayExpr<'a> {
    fn child(&self, f: &mut fmt::Formatter<'_>, id: ExprId, parens: bool) -> fmt::Result {
        let inner = DisplayExpr {
            context: self.context,
            id,
        };
        if parens {
            write!(f, "({})", inner)
        } else {
            write!(f, "{}", inner)
        }
    }

    fn binary(
        &self,
        f: &mut fmt::Formatter<'_>,
        l: ExprId,
        op: &str,
        r: ExprId,
        right_assoc_parens: bool,
    ) -> fmt::Result {
        let mine = precedence(self.context.get(self.id));
        let lp = precedence(self.context.get(l));
        let rp = precedence(self.context.get(r));
        self.child(f, l, lp < mine)?;
        write!(f, " {} ", op)?;
        let wrap_right = if right_assoc_parens { rp <= mine } else { rp < mine };
        self.child(f, r, wrap_right)
    }
}

impl<'a> fmt::Display for DisplayExpr<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.context.get(self.id) {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Variable(sym) => write!(f, "{}", self.context.sym_name(*sym)),
            Expr::Derivative(inner) => {
                write!(f, "D(")?;
                self.child(f, *inner, false)?;
                write!(f, ")")
            }
            Expr::Add(l, r) => self.binary(f, *l, "+", *r, false),
            Expr::Sub(l, r) => self.binary(f, *l, "-", *r, true),
            Expr::Mul(l, r) => self.binary(f, *l, "*", *r, false),
            Expr::Div(l, r) => self.binary(f, *l, "/", *r, true),
            Expr::Pow(b, e) => {
                let bp = precedence(self.context.get(*b));
                let ep = precedence(self.context.get(*e));
                self.child(f, *b, bp <= 4)?;
                write!(f, "^")?;
                self.child(f, *e, ep < 5)
            }
            Expr::Neg(e) => {
                write!(f, "-")?;
                let ep = precedence(self.context.get(*e));
                self.child(f, *e, ep <= 3)
            }
            Expr::Function(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    self.child(f, *arg, false)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl<'a> fmt::Display for DisplayEquation<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {}",
            DisplayExpr {
                context: self.context,
                id: self.equation.lhs
            },
            DisplayExpr {
                context: self.context,
                id: self.equation.rhs
            }
        )
    }
}
