use super::*;

#[test]
fn memory_storage_round_trips_values() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get("k"), None);

    storage.set("k", "v");
    assert_eq!(storage.get("k"), Some("v".to_owned()));

    storage.set("k", "v2");
    assert_eq!(storage.get("k"), Some("v2".to_owned()));
}

#[test]
fn memory_storage_remove_is_idempotent() {
    let storage = MemoryStorage::new();
    storage.set("k", "v");
    storage.remove("k");
    assert_eq!(storage.get("k"), None);
    storage.remove("k");
    assert_eq!(storage.get("k"), None);
}
