//! Test trees over text values.

use crate::e2e_tests::helpers::{TestTree, leaf_chain_values};
use crate::ops::Operation;
use crate::types::{Value, ValueDomain, Variant};

const WORDS: [&str; 12] = [
    "pear", "apple", "fig", "kiwi", "banana", "Cherry", "date", "elder", "grape", "lime",
    "mango", "Apricot",
];

#[test]
fn test_text_values_sort_bytewise() {
    for variant in [Variant::B, Variant::BPlus] {
        let mut test = TestTree::with_domain(3, variant, ValueDomain::Lexical);
        for word in WORDS {
            assert!(test.run(Operation::Insert, word).result);
        }

        let mut expected: Vec<Value> = WORDS.iter().map(|w| Value::from(*w)).collect();
        expected.sort();
        // Upper case sorts before lower case.
        assert_eq!(expected[0], Value::from("Apricot"));
        assert_eq!(test.tree().in_order(), expected);
        assert_eq!(test.tree().validate(), Ok(()));

        if variant == Variant::BPlus {
            assert_eq!(leaf_chain_values(test.tree()), expected);
        }
    }
}

#[test]
fn test_text_search_and_remove() {
    let mut test = TestTree::with_domain(4, Variant::B, ValueDomain::Lexical);
    for word in WORDS {
        test.run(Operation::Insert, word);
    }

    assert!(test.run(Operation::Search, "kiwi").result);
    assert!(!test.run(Operation::Search, "Kiwi").result);
    assert!(test.run(Operation::Remove, "kiwi").result);
    assert!(!test.run(Operation::Search, "kiwi").result);
    assert!(!test.run(Operation::Insert, "fig").result);
    assert_eq!(test.tree().len(), WORDS.len() - 1);
}
