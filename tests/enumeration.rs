//! End-to-end tests for enumeration.
//!
//! Tests cover pinned counts, decoding, search drivers, concurrency, and transport.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use gourgs_enum::codec::{base_m_to_decimal, decimal_to_base_m};
use gourgs_enum::{
    create_seeds, Configuration, CountingMode, EnumerationError, Enumerator, EnumeratorConfig, PrimitiveSet,
};
use num_bigint::BigUint;

const SAMPLE_EQN: &str = "prog3(prog3(ant.turn_right(),ant.move_forward(),ant.turn_left()),\
ant.if_food_ahead(ant.move_forward(),ant.move_forward()),\
prog3(ant.move_forward(),ant.move_forward(),prog2(ant.move_forward(),ant.move_forward())))";

fn arith() -> PrimitiveSet {
    let mut pset = PrimitiveSet::new();
    pset.add_operator("add", 2).unwrap();
    pset.add_operator("sub", 1).unwrap();
    pset.add_operator("truediv", 3).unwrap();
    pset.add_operator("mul", 1).unwrap();
    pset.add_variable("x").unwrap();
    pset.add_variable("y").unwrap();
    pset
}

fn ant() -> PrimitiveSet {
    let mut pset = PrimitiveSet::new();
    pset.add_operator("ant.if_food_ahead", 2).unwrap();
    pset.add_operator("prog2", 2).unwrap();
    pset.add_operator("prog3", 3).unwrap();
    pset.add_variable("ant.move_forward()").unwrap();
    pset.add_variable("ant.turn_left()").unwrap();
    pset.add_variable("ant.turn_right()").unwrap();
    pset
}

fn big(value: u64) -> BigUint {
    BigUint::from(value)
}

// ─── Codec ─────────────────────────────────────────────────────────────────────

#[test]
fn base_conversions() {
    assert_eq!(decimal_to_base_m(&big(5), 1).unwrap(), vec![1, 1, 1, 1, 1]);
    assert_eq!(decimal_to_base_m(&big(5), 2).unwrap(), vec![1, 0, 1]);
    assert_eq!(decimal_to_base_m(&big(125), 3).unwrap(), vec![1, 1, 1, 2, 2]);
    assert_eq!(decimal_to_base_m(&big(125), 9).unwrap(), vec![1, 4, 8]);

    assert_eq!(base_m_to_decimal(&[1, 1, 1, 1, 1], 1).unwrap(), big(5));
    assert_eq!(base_m_to_decimal(&[1, 0, 1], 2).unwrap(), big(5));
    assert_eq!(base_m_to_decimal(&[1, 1, 1, 2, 2], 3).unwrap(), big(125));
    assert_eq!(base_m_to_decimal(&[1, 4, 8], 9).unwrap(), big(125));

    assert!(matches!(
        decimal_to_base_m(&big(5), 0),
        Err(EnumerationError::InvalidBase { base: 0 })
    ));
}

// ─── Vocabulary ────────────────────────────────────────────────────────────────

#[test]
fn vocabulary_queries() {
    let pset = ant();
    assert_eq!(pset.get_arities(), vec![2, 3]);
    assert_eq!(
        pset.get_operators_of_arity(2).unwrap(),
        &["ant.if_food_ahead".to_string(), "prog2".to_string()]
    );
    assert_eq!(pset.get_operators_of_arity(3).unwrap(), &["prog3".to_string()]);
    assert_eq!(
        pset.get_terminals(),
        vec!["ant.move_forward()", "ant.turn_left()", "ant.turn_right()"]
    );
}

#[test]
fn invalid_arity() {
    let mut pset = PrimitiveSet::new();
    assert!(matches!(
        pset.add_operator("nullary", 0),
        Err(EnumerationError::InvalidArity { arity: 0, .. })
    ));
    assert!(pset.get_arities().is_empty());
}

// ─── Topologies and counts ─────────────────────────────────────────────────────

#[test]
fn first_topologies() {
    let en = Enumerator::new(arith());
    assert_eq!(en.ith_n_ary_tree(0).unwrap(), "..");
    assert_eq!(en.ith_n_ary_tree(1).unwrap(), "[..]");
    assert_eq!(en.ith_n_ary_tree(2).unwrap(), "[..,..]");
    assert_eq!(en.ith_n_ary_tree(3).unwrap(), "[..,..,..]");

    let trees: HashSet<String> = (0..20).map(|i| en.ith_n_ary_tree(i).unwrap()).collect();
    assert_eq!(trees.len(), 20);
}

#[test]
fn pinned_counts() {
    for en in [Enumerator::new(arith()), Enumerator::reference(arith())] {
        assert_eq!(en.calculate_l_i_b(0, 0).unwrap(), 0);
        assert_eq!(en.calculate_l_i_b(1, 0).unwrap(), 1);
        assert_eq!(en.calculate_l_i_b(2, 0).unwrap(), 0);
        assert_eq!(en.calculate_l_i_b(2, 1).unwrap(), 1);
        assert_eq!(en.calculate_l_i_b(4, 0).unwrap(), 2);

        assert_eq!(en.calculate_g_i_b(4, 0).unwrap(), big(4));
        assert_eq!(en.calculate_g_i_b(11, 0).unwrap(), big(4));

        let r: Vec<BigUint> = [0, 1, 2, 3, 11].iter().map(|&i| en.calculate_r_i(i).unwrap()).collect();
        assert_eq!(r, vec![big(1), big(2), big(1), big(1), big(4)]);

        let a: Vec<u64> = (0..6).map(|i| en.calculate_a_i(i).unwrap()).collect();
        assert_eq!(a, vec![1, 1, 2, 3, 1, 2]);

        let s: Vec<BigUint> = (0..6).map(|i| en.calculate_s_i(i).unwrap()).collect();
        assert_eq!(s, vec![big(2), big(2), big(4), big(8), big(2), big(4)]);
    }
}

#[test]
fn degenerate_vocabularies() {
    let mut no_terminals = PrimitiveSet::new();
    no_terminals.add_operator("add", 2).unwrap();
    let en = Enumerator::new(no_terminals);
    assert!(matches!(en.calculate_s_i(0), Err(EnumerationError::Unsupported { .. })));

    let mut no_operators = PrimitiveSet::new();
    no_operators.add_variable("x").unwrap();
    let en = Enumerator::new(no_operators);
    assert!(matches!(en.calculate_r_i(1), Err(EnumerationError::Unsupported { .. })));
}

// ─── Decoding ──────────────────────────────────────────────────────────────────

#[test]
fn ant_sample_solution() {
    let en = Enumerator::new(ant());
    let solution = en.generate_specified_solution(100, &big(2), &big(11), 3).unwrap();
    assert_eq!(solution, SAMPLE_EQN);
    assert_eq!(en.configuration_of(SAMPLE_EQN).unwrap(), Configuration::new(100, 2u32, 11u32));
}

#[test]
fn decoding_is_a_bijection_per_index() {
    let en = Enumerator::new(arith());
    for i in 0..30 {
        let r_i = en.calculate_r_i(i).unwrap();
        let s_i = en.calculate_s_i(i).unwrap();
        let mut seen = HashSet::new();
        let mut r = BigUint::ZERO;
        while r < r_i {
            let mut s = BigUint::ZERO;
            while s < s_i {
                let solution = en.generate_specified_solution(i, &r, &s, 2).unwrap();
                assert!(seen.insert(solution.clone()), "duplicate {} at i = {}", solution, i);
                assert_eq!(en.generate_specified_solution(i, &r, &s, 2).unwrap(), solution);
                s += 1u32;
            }
            r += 1u32;
        }
        assert_eq!(big(seen.len() as u64), &r_i * &s_i);
    }
}

#[test]
fn decoding_out_of_range() {
    let en = Enumerator::new(arith());
    let r_i = en.calculate_r_i(11).unwrap();
    let s_i = en.calculate_s_i(11).unwrap();
    assert!(matches!(
        en.generate_specified_solution(11, &r_i, &BigUint::ZERO, 2),
        Err(EnumerationError::OutOfRange { .. })
    ));
    assert!(matches!(
        en.generate_specified_solution(11, &BigUint::ZERO, &s_i, 2),
        Err(EnumerationError::OutOfRange { .. })
    ));
}

// ─── Search drivers ────────────────────────────────────────────────────────────

#[test]
fn exhaustive_yields_distinct_solutions() {
    let en = Enumerator::new(arith());
    let k = 1000;
    let solutions: Vec<String> = en
        .exhaustive_global_search(u64::MAX)
        .unwrap()
        .take(k)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(solutions.len(), k);
    let distinct: HashSet<&String> = solutions.iter().collect();
    assert_eq!(distinct.len(), k);

    // Restarting yields the same prefix.
    let again: Vec<String> = en
        .exhaustive_global_search(u64::MAX)
        .unwrap()
        .take(k)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(solutions, again);
}

#[test]
fn exhaustive_windows_concatenate() {
    let en = Enumerator::new(ant());
    let whole: Vec<String> = en
        .exhaustive_window(&BigUint::ZERO, 300)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let mut parts = Vec::new();
    for start in (0..300u64).step_by(60) {
        let part: Vec<String> = en
            .exhaustive_window(&big(start), 60)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        parts.extend(part);
    }
    assert_eq!(whole, parts);
}

#[test]
fn bounded_window_fails_instead_of_truncating() {
    let en = Enumerator::new(arith());
    let total = en.calculate_q(5).unwrap().total;
    let count = u64::try_from(&total).unwrap();
    assert_eq!(en.exhaustive_window_within(5, &BigUint::ZERO, count).unwrap().count(), count as usize);
    assert!(matches!(
        en.exhaustive_window_within(5, &BigUint::ZERO, count + 1),
        Err(EnumerationError::OutOfRange { .. })
    ));
}

#[test]
fn random_search_reproducible_and_mostly_distinct() {
    let en = Enumerator::new(ant());
    let seeds = create_seeds(1, 500);
    let first: Vec<String> = en
        .uniform_random_global_search(1_000_000, 500, &seeds)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let second: Vec<String> = en
        .uniform_random_global_search(1_000_000, 500, &seeds)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(first, second);

    let distinct: HashSet<&String> = first.iter().collect();
    assert!(distinct.len() as f64 / first.len() as f64 > 0.99);
}

// ─── Concurrency and transport ─────────────────────────────────────────────────

#[test]
fn shared_enumerator_across_threads() {
    let en = Arc::new(Enumerator::new(arith()));
    let expected: Vec<String> = (0..8u64)
        .map(|seed| en.uniform_random_global_search_once(100_000, seed).unwrap())
        .collect();

    let handles: Vec<_> = (0..8u64)
        .map(|seed| {
            let en = Arc::clone(&en);
            thread::spawn(move || en.uniform_random_global_search_once(100_000, seed).unwrap())
        })
        .collect();
    let actual: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(actual, expected);
}

#[test]
fn disjoint_index_ranges_merge_to_full_walk() {
    let en = Enumerator::new(arith());
    let full: Vec<String> = en
        .exhaustive_window(&BigUint::ZERO, 400)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    let merged: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4u64)
            .map(|worker| {
                let en = &en;
                scope.spawn(move || {
                    en.exhaustive_window(&big(worker * 100), 100)
                        .unwrap()
                        .collect::<Result<Vec<_>, _>>()
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(merged, full);
}

#[test]
fn snapshot_restores_identical_behavior() {
    let pset = ant();
    let restored_pset = PrimitiveSet::from_bytes(&pset.to_bytes().unwrap()).unwrap();
    assert_eq!(restored_pset.get_arities(), vec![2, 3]);
    assert_eq!(restored_pset.get_operators(), pset.get_operators());
    assert_eq!(restored_pset.get_terminals(), pset.get_terminals());

    let en = Enumerator::with_config(pset, EnumeratorConfig::new(CountingMode::Reference));
    let restored = Enumerator::from_bytes(&en.to_bytes().unwrap()).unwrap();
    assert_eq!(restored.mode(), CountingMode::Reference);
    assert_eq!(
        restored.generate_specified_solution(100, &big(2), &big(11), 3).unwrap(),
        SAMPLE_EQN
    );
    for i in 0..50 {
        assert_eq!(restored.calculate_r_i(i).unwrap(), en.calculate_r_i(i).unwrap());
        assert_eq!(restored.calculate_s_i(i).unwrap(), en.calculate_s_i(i).unwrap());
    }
    let seeds = create_seeds(9, 20);
    let a: Vec<String> = en
        .uniform_random_global_search(500, 20, &seeds)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let b: Vec<String> = restored
        .uniform_random_global_search(500, 20, &seeds)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn snapshot_version_mismatch() {
    let bytes = Enumerator::new(arith()).to_bytes().unwrap();
    let text = String::from_utf8(bytes).unwrap().replacen("\"version\":1", "\"version\":99", 1);
    assert!(matches!(
        Enumerator::from_bytes(text.as_bytes()),
        Err(EnumerationError::SnapshotVersion { found: 99, .. })
    ));
}
