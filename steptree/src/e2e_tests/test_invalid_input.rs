//! Test that input outside the tree's value domain is refused up front.

use crate::e2e_tests::helpers::TestTree;
use crate::ops::{self, Operation};
use crate::session::SessionError;
use crate::tree::{Tree, TreeError};
use crate::types::{Value, ValueDomain, Variant};

#[test]
fn test_non_numeric_input_rejected() {
    let mut test = TestTree::new(3, Variant::B);
    test.insert_all([1, 2]);
    let before = test.tree().clone();

    for input in ["abc", "4.5", "", "1e3", "99999999999999999999"] {
        for operation in [Operation::Search, Operation::Insert, Operation::Remove] {
            let err = test
                .session
                .begin_input(operation, input)
                .expect_err("not a number");
            assert!(
                matches!(err, SessionError::Tree(TreeError::InvalidValue { .. })),
                "{input:?}"
            );
            assert!(!test.session.is_busy());
        }
    }
    assert_eq!(test.tree(), &before);
}

#[test]
fn test_empty_text_rejected() {
    let mut test = TestTree::with_domain(3, Variant::BPlus, ValueDomain::Lexical);
    let err = test
        .session
        .begin_input(Operation::Insert, "")
        .expect_err("empty text");
    assert_eq!(err.to_string(), "invalid value '' for a text tree");
    assert!(test.tree().is_empty());
}

#[test]
fn test_value_from_wrong_domain_produces_no_steps() {
    let tree = Tree::new(3, Variant::BPlus, ValueDomain::Lexical).expect("valid order");

    let err = ops::insert(&tree, Value::Number(1)).expect_err("number in a text tree");
    assert!(matches!(err, TreeError::InvalidValue { .. }));
}

#[test]
fn test_order_below_minimum_rejected() {
    for order in [0, 1, 2] {
        assert_eq!(
            ops::create_tree(order, Variant::B, ValueDomain::Numeric),
            Err(TreeError::InvalidConfiguration { order })
        );
    }
    assert!(ops::create_tree(3, Variant::B, ValueDomain::Numeric).is_ok());
}
