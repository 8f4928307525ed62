use devsim_storage::StateStore;
use std::collections::HashMap;

fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn merge_preserves_sibling_unique_keys() {
    let store = StateStore::new();
    store
        .merge("dev-1", "env", "k1", values(&[("temp", "25")]))
        .expect("merge");
    store
        .merge("dev-1", "env", "k2", values(&[("temp", "30")]))
        .expect("merge");
    store
        .merge("dev-1", "env", "k1", values(&[("temp", "26")]))
        .expect("merge");

    let record = store.record("dev-1", "env").expect("record");
    assert_eq!(record.len(), 2);
    assert_eq!(record.entry("k1").and_then(|v| v.get("temp")).map(String::as_str), Some("26"));
    assert_eq!(record.entry("k2").and_then(|v| v.get("temp")).map(String::as_str), Some("30"));
}

#[test]
fn records_are_scoped_by_device_and_store_key() {
    let store = StateStore::new();
    store
        .merge("dev-1", "env", "_data", values(&[("temp", "25")]))
        .expect("merge");

    assert!(store.record("dev-2", "env").expect("record").is_empty());
    assert!(store.record("dev-1", "other").expect("record").is_empty());

    assert_eq!(store.clear_device("dev-1").expect("clear"), 1);
    assert!(store.record("dev-1", "env").expect("record").is_empty());
    assert_eq!(store.len("dev-1"), 0);
}
