//! End-to-end alias elimination on small symbolic systems.

use dae_alias::{
    topsort_equations, Alias, AliasError, AliasOptions, DaeSystem, ReducedSystem, Sign,
};
use dae_ast::{Context, Equation, Expr, ExprId};

fn reduce(ctx: Context, eqs: Vec<Equation>) -> ReducedSystem {
    DaeSystem::new(ctx, eqs)
        .unwrap()
        .alias_elimination(&AliasOptions::default())
        .unwrap()
}

/// Second pass over the output of a first one.
fn reduce_again(reduced: &ReducedSystem) -> ReducedSystem {
    reduce(reduced.ctx.clone(), reduced.equations.clone())
}

#[test]
fn alias_with_constant_partner() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();

    // x = y, y = 2
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let y = ctx.var("y");
    let two = ctx.num(2);
    let out = reduce(ctx, vec![Equation::new(x, y), Equation::new(y, two)]);

    assert_eq!(out.display_equations(), vec!["y = 2"]);
    assert_eq!(out.display_observed(), vec!["x = y"]);
    assert_eq!(out.unknowns, vec![y]);
    assert_eq!(out.kept, vec![1]);
    assert_eq!(out.stats.eliminated, 1);
    assert_eq!(out.stats.dropped_equations, 1);
    assert!(out.graph.eq_neighbors(0).is_empty());
}

#[test]
fn identically_zero_row_is_dropped() {
    // 0 = 2x - 2x, sin(x) = 1
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let zero = ctx.num(0);
    let one = ctx.num(1);
    let two = ctx.num(2);
    let two_x = ctx.add(Expr::Mul(two, x));
    let cancel = ctx.add(Expr::Sub(two_x, two_x));
    let sin = ctx.func("sin", vec![x]);
    let out = reduce(ctx, vec![Equation::new(zero, cancel), Equation::new(sin, one)]);

    assert_eq!(out.display_equations(), vec!["sin(x) = 1"]);
    assert!(out.observed.is_empty());
    assert!(out.aliases.is_empty());
    assert_eq!(out.stats.dropped_equations, 1);
}

#[test]
fn cancelling_equation_aliases_nothing() {
    // 0 = 2x - 2x on its own
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let zero = ctx.num(0);
    let two = ctx.num(2);
    let two_x = ctx.add(Expr::Mul(two, x));
    let cancel = ctx.add(Expr::Sub(two_x, two_x));
    let out = reduce(ctx, vec![Equation::new(zero, cancel)]);

    assert!(out.equations.is_empty());
    assert!(out.observed.is_empty());
    assert!(out.aliases.is_empty());
    assert_eq!(out.unknowns, vec![x]);
    assert_eq!(out.stats.dropped_equations, 1);
    assert!(out.graph.var_neighbors(0).is_empty());
}

#[test]
fn zero_pinning_is_followed_by_a_fresh_factorization() {
    // a + 2b + s - d = 0, a - 2c - e = 0, sin(s) = 1
    let mut ctx = Context::new();
    let [a, b, s, c, d, e] = ["a", "b", "s", "c", "d", "e"].map(|n| ctx.var(n));
    let zero = ctx.num(0);
    let one = ctx.num(1);
    let two = ctx.num(2);
    let two_b = ctx.add(Expr::Mul(two, b));
    let two_c = ctx.add(Expr::Mul(two, c));
    let ab = ctx.add(Expr::Add(a, two_b));
    let abs = ctx.add(Expr::Add(ab, s));
    let first = ctx.add(Expr::Sub(abs, d));
    let ac = ctx.add(Expr::Sub(a, two_c));
    let second = ctx.add(Expr::Sub(ac, e));
    let sin = ctx.func("sin", vec![s]);
    let eqs = vec![
        Equation::new(first, zero),
        Equation::new(second, zero),
        Equation::new(sin, one),
    ];
    let out = reduce(ctx, eqs);

    let mut observed = out.display_observed();
    observed.sort();
    assert_eq!(observed, vec!["a = 0", "c = 0", "d = 0", "e = 0"]);
    assert_eq!(out.unknowns, vec![b, s]);
    assert_eq!(out.stats.rounds, 3);

    let again = reduce_again(&out);
    assert!(again.aliases.is_empty());
    assert_eq!(again.display_equations(), out.display_equations());
}

#[test]
fn derivative_aliases_are_implied() {
    // x = y, D(x) = sin(y), D(y) = cos(x)
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let y = ctx.var("y");
    let dx = ctx.der(x).unwrap();
    let dy = ctx.der(y).unwrap();
    let sin = ctx.func("sin", vec![y]);
    let cos = ctx.func("cos", vec![x]);
    let eqs = vec![
        Equation::new(x, y),
        Equation::new(dx, sin),
        Equation::new(dy, cos),
    ];
    let sys = DaeSystem::new(ctx, eqs).unwrap();
    let vdx = sys.var_of(dx).unwrap();
    let vdy = sys.var_of(dy).unwrap();
    let mut out = sys.alias_elimination(&AliasOptions::default()).unwrap();

    assert_eq!(out.aliases.get(vdx).unwrap(), Alias::Var(Sign::Pos, vdy));
    assert_eq!(out.display_observed(), vec!["x = y", "D(x) = D(y)"]);
    assert_eq!(out.display_equations(), vec!["D(y) = sin(y)", "D(y) = cos(y)"]);
    assert_eq!(out.unknowns, vec![y, dy]);
}

#[test]
fn explicit_derivative_alias_is_consistent() {
    // x = y, D(x) = D(y), D(y) = sin(y)
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let y = ctx.var("y");
    let dx = ctx.der(x).unwrap();
    let dy = ctx.der(y).unwrap();
    let sin = ctx.func("sin", vec![y]);
    let eqs = vec![
        Equation::new(x, y),
        Equation::new(dx, dy),
        Equation::new(dy, sin),
    ];
    let out = reduce(ctx, eqs);

    assert_eq!(out.stats.eliminated, 2);
    assert_eq!(out.display_equations(), vec!["D(y) = sin(y)"]);
    let mut observed = out.display_observed();
    observed.sort();
    assert_eq!(observed, vec!["D(x) = D(y)", "x = y"]);
}

#[test]
fn negated_and_rational_aliases() {
    // x + y = 0, z/2 = y/2, y = sin(t)
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let y = ctx.var("y");
    let z = ctx.var("z");
    let t = ctx.var("t");
    let zero = ctx.num(0);
    let two = ctx.num(2);
    let sum = ctx.add(Expr::Add(x, y));
    let z_half = ctx.add(Expr::Div(z, two));
    let y_half = ctx.add(Expr::Div(y, two));
    let sin = ctx.func("sin", vec![t]);
    let eqs = vec![
        Equation::new(sum, zero),
        Equation::new(z_half, y_half),
        Equation::new(y, sin),
    ];
    let out = reduce(ctx, eqs);

    let mut observed = out.display_observed();
    observed.sort();
    assert_eq!(observed, vec!["x = -y", "z = y"]);
    assert_eq!(out.display_equations(), vec!["y = sin(t)"]);
    assert_eq!(out.unknowns.len(), 2);
}

#[test]
fn linear_chain_collapses_to_zero() {
    // a = b, b = c, c = 0: every unknown is purely linear.
    let mut ctx = Context::new();
    let a = ctx.var("a");
    let b = ctx.var("b");
    let c = ctx.var("c");
    let zero = ctx.num(0);
    let out = reduce(
        ctx,
        vec![Equation::new(a, b), Equation::new(b, c), Equation::new(c, zero)],
    );

    assert!(out.equations.is_empty());
    assert!(out.unknowns.is_empty());
    assert_eq!(out.stats.rank1, 3);
    assert_eq!(out.stats.rank2, 3);
    let mut observed = out.display_observed();
    observed.sort();
    assert_eq!(observed, vec!["a = 0", "b = 0", "c = 0"]);
}

#[test]
fn second_pass_finds_nothing() {
    let mut ctx = Context::new();
    let x = ctx.var("x");
    let y = ctx.var("y");
    let dx = ctx.der(x).unwrap();
    let dy = ctx.der(y).unwrap();
    let sin = ctx.func("sin", vec![y]);
    let cos = ctx.func("cos", vec![x]);
    let two = ctx.num(2);
    let w = ctx.var("w");
    let eqs = vec![
        Equation::new(x, y),
        Equation::new(dx, sin),
        Equation::new(dy, cos),
        Equation::new(w, two),
    ];
    let first = reduce(ctx, eqs);
    assert_eq!(first.stats.eliminated, 2);

    let second = reduce_again(&first);
    assert_eq!(second.stats.eliminated, 0);
    assert!(second.observed.is_empty());
    assert_eq!(second.display_equations(), first.display_equations());
}

#[test]
fn identical_input_gives_identical_output() {
    fn build() -> (Context, Vec<Equation>) {
        let mut ctx = Context::new();
        let names = ["p", "q", "r", "s"];
        let vars: Vec<ExprId> = names.iter().map(|n| ctx.var(n)).collect();
        let pq = ctx.add(Expr::Sub(vars[0], vars[1]));
        let rs = ctx.add(Expr::Add(vars[2], vars[3]));
        let mix = ctx.add(Expr::Mul(vars[1], vars[3]));
        let zero = ctx.num(0);
        let one = ctx.num(1);
        let eqs = vec![
            Equation::new(pq, zero),
            Equation::new(rs, vars[1]),
            Equation::new(mix, one),
        ];
        (ctx, eqs)
    }

    let (ctx_a, eqs_a) = build();
    let (ctx_b, eqs_b) = build();
    let a = reduce(ctx_a, eqs_a);
    let b = reduce(ctx_b, eqs_b);
    assert_eq!(a.to_string(), b.to_string());
    assert_eq!(a.aliases.iter().collect::<Vec<_>>(), b.aliases.iter().collect::<Vec<_>>());
    assert_eq!(a.stats, b.stats);
}

#[test]
fn cyclic_observed_equations_are_rejected() {
    let mut ctx = Context::new();
    let a = ctx.var("a");
    let b = ctx.var("b");
    let c = ctx.var("c");
    let eqs = [Equation::new(a, b), Equation::new(b, c), Equation::new(c, a)];

    let err = topsort_equations(&ctx, &eqs, &[a, b, c], true).unwrap_err();
    assert_eq!(err, AliasError::ObservedCycle { ordered: 0, total: 3 });
    assert!(topsort_equations(&ctx, &eqs, &[a, b, c], false).unwrap().is_empty());
}

#[test]
fn observed_equations_are_dependency_ordered() {
    let mut ctx = Context::new();
    let a = ctx.var("a");
    let b = ctx.var("b");
    let c = ctx.var("c");
    let one = ctx.num(1);
    let b_plus = ctx.add(Expr::Add(b, one));
    let eqs = [Equation::new(a, b_plus), Equation::new(b, c), Equation::new(c, one)];

    let order = topsort_equations(&ctx, &eqs, &[a, b, c], true).unwrap();
    assert_eq!(order, vec![eqs[2], eqs[1], eqs[0]]);
}
