//! Unknown-level substitution and traversal.

use crate::expression::{Context, Expr, ExprId};
use rustc_hash::FxHashMap;

/// Replace every unknown that is a key of `map` by its value.
///
/// Keys are matched before descending, so a `D(x)` key replaces the whole
/// derivative node while an `x` key leaves `D(x)` untouched.
pub fn substitute(ctx: &mut Context, expr: ExprId, map: &FxHashMap<ExprId, ExprId>) -> ExprId {
    if map.is_empty() {
        return expr;
    }
    let mut memo = FxHashMap::default();
    substitute_memo(ctx, expr, map, &mut memo)
}

fn substitute_memo(
    ctx: &mut Context,
    expr: ExprId,
    map: &FxHashMap<ExprId, ExprId>,
    memo: &mut FxHashMap<ExprId, ExprId>,
) -> ExprId {
    if let Some(&to) = map.get(&expr) {
        return to;
    }
    if let Some(&done) = memo.get(&expr) {
        return done;
    }

    let rebuilt = match ctx.get(expr).clone() {
        Expr::Number(_) | Expr::Variable(_) | Expr::Derivative(_) => expr,
        Expr::Add(a, b) => {
            let a = substitute_memo(ctx, a, map, memo);
            let b = substitute_memo(ctx, b, map, memo);
            ctx.add(Expr::Add(a, b))
        }
        Expr::Sub(a, b) => {
            let a = substitute_memo(ctx, a, map, memo);
            let b = substitute_memo(ctx, b, map, memo);
            ctx.add(Expr::Sub(a, b))
        }
        Expr::Mul(a, b) => {
            let a = substitute_memo(ctx, a, map, memo);
            let b = substitute_memo(ctx, b, map, memo);
            ctx.add(Expr::Mul(a, b))
        }
        Expr::Div(a, b) => {
            let a = substitute_memo(ctx, a, map, memo);
            let b = substitute_memo(ctx, b, map, memo);
            ctx.add(Expr::Div(a, b))
        }
        Expr::Pow(a, b) => {
            let a = substitute_memo(ctx, a, map, memo);
            let b = substitute_memo(ctx, b, map, memo);
            ctx.add(Expr::Pow(a, b))
        }
        Expr::Neg(a) => {
            let a = substitute_memo(ctx, a, map, memo);
            ctx.add(Expr::Neg(a))
        }
        Expr::Function(name, args) => {
            let args: Vec<_> = args
                .iter()
                .map(|&arg| substitute_memo(ctx, arg, map, memo))
                .collect();
            ctx.add(Expr::Function(name, args))
        }
    };
    memo.insert(expr, rebuilt);
    rebuilt
}

/// Unknowns occurring in `expr`, in first-appearance (left to right) order.
///
/// A derivative counts as one unknown; the variable under `D(·)` is not
/// reported on its own.
pub fn collect_unknowns(ctx: &Context, expr: ExprId, out: &mut Vec<ExprId>) {
    match ctx.get(expr) {
        Expr::Number(_) => {}
        Expr::Variable(_) | Expr::Derivative(_) => {
            if !out.contains(&expr) {
                out.push(expr);
            }
        }
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) | Expr::Pow(a, b) => {
            collect_unknowns(ctx, *a, out);
            collect_unknowns(ctx, *b, out);
        }
        Expr::Neg(a) => collect_unknowns(ctx, *a, out),
        Expr::Function(_, args) => {
            for &arg in args {
                collect_unknowns(ctx, arg, out);
            }
        }
    }
}
