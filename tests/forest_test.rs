//! Integration tests for the relation-ordered forest builder.

use std::cell::Cell;
use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use rstest::rstest;

use finter::util::testing::init_test_setup;
use finter::{build, HierarchyError};

fn strict_prefix(a: &&str, b: &&str) -> bool {
    a != b && b.starts_with(*a)
}

fn strict_superset(a: &BTreeSet<u32>, b: &BTreeSet<u32>) -> bool {
    a != b && a.is_superset(b)
}

/// `0` divides nothing and is divided by every nonzero number.
fn divides(a: &u32, b: &u32) -> bool {
    *a != 0 && a != b && b % a == 0
}

fn set(items: &[u32]) -> BTreeSet<u32> {
    items.iter().copied().collect()
}

#[test]
fn given_words_when_build_with_prefix_then_nests_by_prefix() {
    init_test_setup();
    // Arrange
    let words = ["a", "aardvark", "ant", "anteater", "antelope"];

    // Act
    let forest = build(words, strict_prefix).expect("build forest");

    // Assert
    let root = forest.root().index();
    let a = forest.find(&"a").unwrap();
    let ant = forest.find(&"ant").unwrap();
    assert_eq!(forest.child_items(root), vec![&"a"]);
    assert_eq!(forest.child_items(a), vec![&"aardvark", &"ant"]);
    assert_eq!(forest.child_items(ant), vec![&"anteater", &"antelope"]);
    assert_eq!(forest.len(), 5);
    forest.verify(strict_prefix).expect("verify");
}

#[test]
fn given_words_in_reverse_when_build_then_same_ancestry() {
    // Arrange
    let words = ["antelope", "anteater", "ant", "aardvark", "a"];

    // Act
    let forest = build(words, strict_prefix).expect("build forest");

    // Assert
    let ant = forest.find(&"ant").unwrap();
    assert_eq!(forest.parent_item(ant), Some(&"a"));
    let mut under_ant = forest.child_items(ant);
    under_ant.sort();
    assert_eq!(under_ant, vec![&"anteater", &"antelope"]);
    forest.verify(strict_prefix).expect("verify");
}

#[test]
fn given_sets_when_build_with_superset_then_no_intermediate_superset_skipped() {
    init_test_setup();
    // Arrange
    let sets = vec![
        set(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]),
        set(&[3, 4, 5, 6, 7]),
        set(&[6, 7]),
        set(&[4, 5, 6]),
        set(&[4, 5]),
        set(&[5]),
        set(&[7, 8, 9, 10]),
        set(&[8]),
        set(&[9, 10]),
        set(&[1, 2]),
    ];

    // Act
    let forest = build(sets, strict_superset).expect("build forest");

    // Assert
    let root = forest.root().index();
    assert_eq!(
        forest.child_items(root),
        vec![&set(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10])]
    );
    let all = forest.find(&set(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10])).unwrap();
    assert_eq!(
        forest.child_items(all),
        vec![&set(&[3, 4, 5, 6, 7]), &set(&[7, 8, 9, 10]), &set(&[1, 2])]
    );
    let mid = forest.find(&set(&[3, 4, 5, 6, 7])).unwrap();
    assert_eq!(forest.child_items(mid), vec![&set(&[6, 7]), &set(&[4, 5, 6])]);
    let five = forest.find(&set(&[5])).unwrap();
    assert_eq!(forest.parent_item(five), Some(&set(&[4, 5])));
    let four_five = forest.find(&set(&[4, 5])).unwrap();
    assert_eq!(forest.parent_item(four_five), Some(&set(&[4, 5, 6])));
    let tail = forest.find(&set(&[7, 8, 9, 10])).unwrap();
    assert_eq!(forest.child_items(tail), vec![&set(&[8]), &set(&[9, 10])]);
    assert_eq!(forest.depth(), 5);
    forest.verify(strict_superset).expect("verify");
}

#[test]
fn given_zero_to_nine_when_build_with_divisibility_then_one_is_ancestor_of_all() {
    init_test_setup();
    // Arrange
    let numbers: Vec<u32> = (0..10).collect();

    // Act
    let forest = build(numbers, divides).expect("build forest");

    // Assert
    let root = forest.root().index();
    assert_eq!(forest.child_items(root), vec![&1]);
    let one = forest.find(&1).unwrap();
    for (idx, n) in forest.iter() {
        if *n != 1 {
            let ancestors: Vec<_> = forest
                .node(idx)
                .ancestors()
                .filter_map(|a| a.item())
                .collect();
            assert!(ancestors.contains(&&1), "{n} is not below 1");
        }
    }
    assert_eq!(forest.child_items(one), vec![&2, &3, &5, &7]);
    forest.verify(divides).expect("verify");
}

#[test]
fn given_zero_when_build_with_divisibility_then_zero_is_deepest_leaf_below_powers_of_two() {
    // Arrange
    let numbers: Vec<u32> = (0..10).collect();

    // Act
    let forest = build(numbers, divides).expect("build forest");

    // Assert
    let zero = forest.find(&0).unwrap();
    let chain: Vec<u32> = forest
        .node(zero)
        .ancestors()
        .filter_map(|a| a.item().copied())
        .collect();
    assert_eq!(chain, vec![8, 4, 2, 1]);
    assert!(forest.node(zero).is_leaf());
    assert_eq!(forest.depth(), 5);
}

#[rstest]
#[case(vec![0])]
#[case(vec![0, 0])]
#[case(vec![5, 0, 1])]
fn given_zero_inputs_when_build_with_divisibility_then_no_panic(#[case] numbers: Vec<u32>) {
    // Act
    let forest = build(numbers.clone(), divides).expect("build forest");

    // Assert
    assert_eq!(forest.len(), numbers.len());
}

#[test]
fn given_relation_that_changes_its_answer_when_build_then_malformed_relation() {
    init_test_setup();
    // Arrange: "1 contains 2" holds only the first time it is asked
    let asked = Cell::new(false);
    let flaky = |a: &u32, b: &u32| *a == 1 && *b == 2 && !asked.replace(true);

    // Act
    let result = build([1u32, 2], flaky);

    // Assert
    match result {
        Err(HierarchyError::MalformedRelation { item, other, .. }) => {
            assert_eq!(item, "2");
            assert_eq!(other, "1");
        }
        other => panic!("expected MalformedRelation, got {other:?}"),
    }
}

#[test]
fn given_forest_built_with_other_relation_when_verify_then_sibling_violation() {
    // Arrange: nothing relates during the build, so all words end up siblings
    let forest = build(["a", "ab"], |_: &&str, _: &&str| false).expect("build forest");

    // Act
    let err = forest.verify(strict_prefix).unwrap_err();

    // Assert
    assert_eq!(
        err.to_string(),
        "malformed relation: \"a\" is related to its sibling \"ab\""
    );
}

#[test]
fn given_empty_input_when_build_then_root_only() {
    // Act
    let forest = build(Vec::<u32>::new(), divides).expect("build forest");

    // Assert
    assert!(forest.is_empty());
    assert!(forest.root().is_leaf());
    assert!(forest.root().item().is_none());
}
