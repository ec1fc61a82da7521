/// Property tests for the engine laws.
use proptest::prelude::*;
use treepath::{SetOptions, Value, get, set, unset};

fn key() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,6}"
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
    ]
}

proptest! {
    #[test]
    fn parse_same_path_twice_is_identical(keys in prop::collection::vec(key(), 1..5)) {
        let path = keys.join(".");
        let a = treepath::path::parse(&path).unwrap();
        let b = treepath::path::parse(&path).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn set_then_get_round_trips(keys in prop::collection::vec(key(), 1..5), value in leaf()) {
        let path = keys.join(".");
        let mut tree = Value::Object(vec![]);
        set(&mut tree, &path, value.clone(), SetOptions::default()).unwrap();
        let read = get(&tree, &path, Value::Null, false).unwrap();
        prop_assert_eq!(read, value);
    }

    #[test]
    fn unset_after_set_removes(keys in prop::collection::vec(key(), 1..5), value in leaf()) {
        let path = keys.join(".");
        let mut tree = Value::Object(vec![]);
        set(&mut tree, &path, value, SetOptions::default()).unwrap();
        unset(&mut tree, &path, false).unwrap();
        let read = get(&tree, &path, Value::Null, false).unwrap();
        prop_assert_eq!(read, Value::Null);
    }

    #[test]
    fn unset_is_idempotent(keys in prop::collection::vec(key(), 1..4), value in leaf()) {
        let path = keys.join(".");
        let mut tree = Value::Object(vec![]);
        set(&mut tree, &path, value, SetOptions::default()).unwrap();
        unset(&mut tree, &path, false).unwrap();
        let once = tree.clone();
        unset(&mut tree, &path, false).unwrap();
        prop_assert_eq!(once, tree);
    }

    #[test]
    fn set_is_idempotent(keys in prop::collection::vec(key(), 1..4), value in leaf()) {
        let path = keys.join(".");
        let mut tree = Value::Object(vec![]);
        set(&mut tree, &path, value.clone(), SetOptions::default()).unwrap();
        let once = tree.clone();
        set(&mut tree, &path, value, SetOptions::default()).unwrap();
        prop_assert_eq!(once, tree);
    }

    #[test]
    fn terminal_index_round_trips(i in 0usize..8, value in leaf()) {
        let path = format!("xs[{i}]");
        let mut tree = Value::Object(vec![]);
        set(&mut tree, &path, value.clone(), SetOptions::default()).unwrap();
        let read = get(&tree, &path, Value::Null, false).unwrap();
        prop_assert_eq!(read, value);
    }
}
