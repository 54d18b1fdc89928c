//! Recursive merge of configuration trees.
//!
//! Keys missing from the target are inserted, nested maps combine key by key and
//! every other pairing (scalars, lists, a map meeting a non-map) is overwritten by
//! the incoming side. Later sources therefore win.

use crate::value::{ConfigTree, Value};

/// Merge `incoming` on top of `existing`, returning the combined tree.
pub fn deep_merge(existing: &ConfigTree, incoming: &ConfigTree) -> ConfigTree {
    let mut merged = existing.clone();
    merge_into(&mut merged, incoming.clone());
    merged
}

/// In-place form of [`deep_merge`].
pub fn merge_into(target: &mut ConfigTree, incoming: ConfigTree) {
    for (key, value) in incoming {
        merge_value(target, &key, value);
    }
}

/// Merge a single value under `key`, deep-merging when both sides are maps.
/// An existing key keeps its position.
pub fn merge_value(target: &mut ConfigTree, key: &str, value: Value) {
    if let Value::Map(nested) = value {
        if let Some(Value::Map(existing)) = target.get_mut(key) {
            merge_into(existing, nested);
            return;
        }
        target.insert(key.to_string(), Value::Map(nested));
        return;
    }
    target.insert(key.to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(entries: &[(&str, Value)]) -> ConfigTree {
        entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_inserts_missing_keys() {
        let a = tree(&[("x", Value::Int(1))]);
        let b = tree(&[("y", Value::Int(2))]);
        let merged = deep_merge(&a, &b);
        assert_eq!(merged, tree(&[("x", Value::Int(1)), ("y", Value::Int(2))]));
    }

    #[test]
    fn test_nested_maps_combine() {
        let a = tree(&[("process", Value::Map(tree(&[("cpus", Value::Int(2))])))]);
        let b = tree(&[("process", Value::Map(tree(&[("memory", Value::from("4 GB"))])))]);
        let merged = deep_merge(&a, &b);
        let process = merged["process"].as_map().unwrap();
        assert_eq!(process["cpus"], Value::Int(2));
        assert_eq!(process["memory"], Value::from("4 GB"));
    }

    #[test]
    fn test_incoming_overwrites_scalars_lists_and_mismatches() {
        let a = tree(&[
            ("n", Value::Int(1)),
            ("list", Value::from(vec![1i64, 2])),
            ("m", Value::Map(tree(&[("k", Value::Int(1))]))),
        ]);
        let b = tree(&[
            ("n", Value::Int(2)),
            ("list", Value::from(vec![3i64])),
            ("m", Value::from("flat")),
        ]);
        let merged = deep_merge(&a, &b);
        assert_eq!(merged["n"], Value::Int(2));
        assert_eq!(merged["list"], Value::from(vec![3i64]));
        assert_eq!(merged["m"], Value::from("flat"));
    }

    #[test]
    fn test_merge_with_self_is_identity() {
        let t = tree(&[
            ("a", Value::Map(tree(&[("b", Value::Int(1)), ("c", Value::from(vec!["x"]))]))),
            ("d", Value::Null),
        ]);
        assert_eq!(deep_merge(&t, &t), t);
    }

    #[test]
    fn test_key_order_follows_first_declaration() {
        let a = tree(&[("first", Value::Int(1)), ("second", Value::Int(2))]);
        let b = tree(&[("third", Value::Int(3)), ("first", Value::Int(10))]);
        let merged = deep_merge(&a, &b);
        let keys: Vec<_> = merged.keys().cloned().collect();
        assert_eq!(keys, vec!["first", "second", "third"]);
        assert_eq!(merged["first"], Value::Int(10));
    }

    #[test]
    fn test_merge_value() {
        let mut t = tree(&[("a", Value::Map(tree(&[("x", Value::Int(1))])))]);
        merge_value(&mut t, "a", Value::Map(tree(&[("y", Value::Int(2))])));
        merge_value(&mut t, "b", Value::Int(3));
        assert_eq!(t["a"].as_map().unwrap().len(), 2);
        assert_eq!(t["b"], Value::Int(3));
    }
}
