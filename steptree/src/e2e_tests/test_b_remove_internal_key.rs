//! Test removal of a key held by an internal B-tree node.

use crate::e2e_tests::helpers::TestTree;
use crate::ops::StepEvent;
use crate::types::Variant;

#[test]
fn test_remove_internal_key_uses_predecessor() {
    let mut test = TestTree::new(3, Variant::B);
    test.insert_all([10, 20, 30, 40, 50]);
    assert_eq!(test.tree().to_string(), "[30]\n[10 20] [40 50]");

    let run = test.remove(30);

    assert!(run.result);
    assert!(run.events().contains(&StepEvent::Replaced));
    assert_eq!(test.tree().to_string(), "[20]\n[10] [40 50]");
    test.assert_holds(&[10, 20, 40, 50]);
}

#[test]
fn test_remove_every_internal_key() {
    let mut test = TestTree::new(3, Variant::B);
    test.insert_all((1..=15).map(|v| v * 10));

    let mut remaining: Vec<i64> = (1..=15).map(|v| v * 10).collect();
    loop {
        let Some(root) = test.tree().root() else {
            break;
        };
        let node = test.tree().node(root);
        if node.is_leaf() {
            break;
        }
        let crate::types::Value::Number(key) = node.keys()[0] else {
            panic!("numeric tree holds a non-number");
        };

        assert!(test.remove(key).result);
        remaining.retain(|&v| v != key);
        test.assert_holds(&remaining);
    }
}
