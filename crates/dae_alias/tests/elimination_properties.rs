use dae_alias::{
    alias_eliminate_graph, bareiss, Alias, AliasOptions, BipartiteGraph, DiffGraph, Sign,
    SparseMatrixClil,
};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;
use proptest::prelude::*;

const NCOLS: usize = 6;

fn dense_strategy() -> impl Strategy<Value = Vec<Vec<i64>>> {
    // Mostly zeros so that rows stay sparse and aliases show up.
    let cell = prop_oneof![4 => Just(0i64), 2 => Just(1i64), 2 => Just(-1i64), 1 => -3i64..=3];
    proptest::collection::vec(proptest::collection::vec(cell, NCOLS), 1..6)
}

fn sparse(dense: &[Vec<i64>]) -> SparseMatrixClil {
    let mut m = SparseMatrixClil::new(dense.len(), NCOLS);
    for (i, row) in dense.iter().enumerate() {
        m.push_row(
            i,
            row.iter()
                .enumerate()
                .map(|(j, &c)| (j, BigInt::from(c))),
        );
    }
    m
}

fn to_big(dense: &[Vec<i64>]) -> Vec<Vec<BigInt>> {
    dense
        .iter()
        .map(|r| r.iter().map(|&c| BigInt::from(c)).collect())
        .collect()
}

/// Rank by plain Gaussian elimination over the rationals.
fn reference_rank(dense: &[Vec<BigInt>]) -> usize {
    let mut rows: Vec<Vec<BigRational>> = dense
        .iter()
        .map(|r| r.iter().map(|c| BigRational::from_integer(c.clone())).collect())
        .collect();
    let mut rank = 0;
    for col in 0..NCOLS {
        let Some(p) = (rank..rows.len()).find(|&i| !rows[i][col].is_zero()) else {
            continue;
        };
        rows.swap(rank, p);
        for i in rank + 1..rows.len() {
            if rows[i][col].is_zero() {
                continue;
            }
            let factor = &rows[i][col] / &rows[rank][col];
            for j in col..NCOLS {
                let delta = &factor * &rows[rank][j];
                rows[i][j] -= delta;
            }
        }
        rank += 1;
    }
    rank
}

/// `v = 0` as `e_v`, `v = ±t` as `e_v ∓ e_t`.
fn alias_rows(aliases: &[(usize, Alias)]) -> Vec<Vec<BigInt>> {
    aliases
        .iter()
        .map(|&(v, alias)| {
            let mut row = vec![BigInt::zero(); NCOLS];
            row[v] = BigInt::from(1);
            if let Alias::Var(sign, t) = alias {
                row[t] = match sign {
                    Sign::Pos => BigInt::from(-1),
                    Sign::Neg => BigInt::from(1),
                };
            }
            row
        })
        .collect()
}

fn dense_rows(m: &SparseMatrixClil) -> Vec<Vec<BigInt>> {
    (0..m.nrows())
        .map(|i| {
            let mut row = vec![BigInt::zero(); NCOLS];
            for (v, c) in m.row(i).iter() {
                row[v] = c.clone();
            }
            row
        })
        .collect()
}

/// Linear rows plus one nonlinear equation over the flagged columns.
fn system(dense: &[Vec<i64>], nonlinear: &[bool]) -> (BipartiteGraph, SparseMatrixClil) {
    let mut graph = BipartiteGraph::new(dense.len() + 1, NCOLS);
    let mm = sparse(dense);
    for i in 0..mm.nrows() {
        for &v in mm.row(i).cols() {
            graph.add_edge(i, v);
        }
    }
    for (v, &flag) in nonlinear.iter().enumerate() {
        if flag {
            graph.add_edge(dense.len(), v);
        }
    }
    (graph, mm)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn ranks_are_bounded_and_exact(
        dense in dense_strategy(),
        mask in proptest::collection::vec(any::<bool>(), NCOLS),
    ) {
        let mut m = sparse(&dense);
        let mut mirror = m.clone();
        let out = bareiss(&mut m, Some(&mut mirror), &mask);

        prop_assert!(out.rank1 <= out.rank2);
        prop_assert!(out.rank2 <= dense.len().min(NCOLS));
        prop_assert_eq!(out.rank2, reference_rank(&to_big(&dense)));
        prop_assert_eq!(out.pivots.len(), out.rank2);
        prop_assert_eq!(mirror.nzrows(), m.nzrows());
        for &p in &out.pivots[..out.rank1] {
            prop_assert!(mask[p]);
        }
        for i in out.rank2..m.nrows() {
            prop_assert!(m.row(i).is_empty());
        }
    }

    #[test]
    fn aliases_resolve_to_survivors(
        dense in dense_strategy(),
        nonlinear in proptest::collection::vec(any::<bool>(), NCOLS),
    ) {
        let (mut graph, mm) = system(&dense, &nonlinear);
        let diff = DiffGraph::new(NCOLS);

        let mut out = alias_eliminate_graph(&mut graph, &diff, mm, &AliasOptions::default()).unwrap();
        let resolved = out.aliases.resolve_all().unwrap();
        prop_assert_eq!(resolved.len(), out.aliases.len());
        for (v, alias) in resolved {
            if let Alias::Var(_, t) = alias {
                prop_assert_ne!(t, v);
                prop_assert!(!out.aliases.is_eliminated(t));
            }
        }
        for i in 0..out.matrix.nrows() {
            let eq = out.matrix.nzrows()[i];
            prop_assert_eq!(graph.eq_neighbors(eq), out.matrix.row(i).cols());
            for &v in out.matrix.row(i).cols() {
                prop_assert!(!out.aliases.is_eliminated(v));
            }
        }
    }

    #[test]
    fn second_run_on_the_output_finds_nothing(
        dense in dense_strategy(),
        nonlinear in proptest::collection::vec(any::<bool>(), NCOLS),
    ) {
        let (mut graph, mm) = system(&dense, &nonlinear);
        let diff = DiffGraph::new(NCOLS);
        let options = AliasOptions::default();

        let first = alias_eliminate_graph(&mut graph, &diff, mm, &options).unwrap();
        let second = alias_eliminate_graph(&mut graph, &diff, first.matrix.clone(), &options).unwrap();
        prop_assert!(second.aliases.is_empty());
        prop_assert_eq!(second.matrix, first.matrix);
    }

    #[test]
    fn aliases_and_reduced_rows_span_the_original_rows(dense in dense_strategy()) {
        // Every column is shared with a nonlinear equation, so nothing is
        // pinned to zero and every alias must follow from the rows.
        let (mut graph, mm) = system(&dense, &[true; NCOLS]);
        let diff = DiffGraph::new(NCOLS);
        let mut out = alias_eliminate_graph(&mut graph, &diff, mm, &AliasOptions::default()).unwrap();

        let original = to_big(&dense);
        let aliases = alias_rows(&out.aliases.resolve_all().unwrap());
        let reduced = dense_rows(&out.matrix);
        let rank = reference_rank(&original);

        let with_aliases: Vec<_> = original.iter().chain(&aliases).cloned().collect();
        prop_assert_eq!(reference_rank(&with_aliases), rank);

        let rebuilt: Vec<_> = reduced.iter().chain(&aliases).cloned().collect();
        prop_assert_eq!(reference_rank(&rebuilt), rank);

        let all: Vec<_> = with_aliases.iter().chain(&reduced).cloned().collect();
        prop_assert_eq!(reference_rank(&all), rank);
    }
}

#[test]
fn derivative_chain_stays_consistent() {
    // x=v0, y=v1 with derivatives up to second order:
    // D(x)=v2, D(y)=v3, D(D(x))=v4, D(D(y))=v5.
    let mut diff = DiffGraph::new(6);
    for (v, d) in [(0, 2), (1, 3), (2, 4), (3, 5)] {
        diff.add_edge(v, d).unwrap();
    }
    // e0: x + y = 0, e1: f(D(D(x)), D(D(y)))
    let mut graph = BipartiteGraph::new(2, 6);
    let mut mm = SparseMatrixClil::new(2, 6);
    mm.push_row(0, [(0, BigInt::from(1)), (1, BigInt::from(1))]);
    graph.add_edge(0, 0);
    graph.add_edge(0, 1);
    graph.add_edge(1, 4);
    graph.add_edge(1, 5);

    let mut out = alias_eliminate_graph(&mut graph, &diff, mm, &AliasOptions::default()).unwrap();
    let neg = dae_alias::Sign::Neg;
    assert_eq!(out.aliases.get(0).unwrap(), Alias::Var(neg, 1));
    assert_eq!(out.aliases.get(2).unwrap(), Alias::Var(neg, 3));
    assert_eq!(out.aliases.get(4).unwrap(), Alias::Var(neg, 5));
    assert_eq!(out.aliases.keys(), &[0, 2, 4]);
}
