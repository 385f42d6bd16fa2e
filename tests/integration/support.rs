use skydns_records::record::RecordReconciler;
use skydns_records::store::MemoryStore;
use std::collections::BTreeSet;

pub const PREFIX: &str = "/skydns/";

pub fn reconciler() -> (MemoryStore, RecordReconciler<MemoryStore>) {
    let store = MemoryStore::new();
    let reconciler = RecordReconciler::new(store.clone(), PREFIX);
    (store, reconciler)
}

pub fn hosts(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|h| h.to_string()).collect()
}

/// Leaf keys only, directories skipped.
pub fn leaf_keys(store: &MemoryStore) -> Vec<String> {
    store
        .keys()
        .into_iter()
        .filter(|k| store.value(k).is_some())
        .collect()
}
