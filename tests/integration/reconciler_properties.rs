use crate::integration::support::{hosts, leaf_keys, reconciler};
use proptest::prelude::*;
use skydns_records::error::RecordError;
use skydns_records::record::derive_path;
use skydns_records::store::KeyValueStore;

#[tokio::test]
async fn www_example_com_lands_under_reversed_labels() {
    let (store, reconciler) = reconciler();
    let id = reconciler
        .create_or_replace("www.example.com", 300, &hosts(&["10.0.0.1", "10.0.0.2"]))
        .await
        .unwrap();
    assert_eq!(id, "www.example.com");

    assert_eq!(
        leaf_keys(&store),
        vec![
            "/skydns/com/example/www/record-10_0_0_1".to_string(),
            "/skydns/com/example/www/record-10_0_0_2".to_string(),
        ]
    );

    let payload: serde_json::Value = serde_json::from_str(
        &store
            .value("/skydns/com/example/www/record-10_0_0_1")
            .unwrap(),
    )
    .unwrap();
    assert_eq!(payload["host"], "10.0.0.1");
    assert_eq!(payload["ttl"], 300);
    assert_eq!(payload["group"], "www.example.com");
}

#[tokio::test]
async fn round_trip_returns_what_was_written() {
    let (_, reconciler) = reconciler();
    let written = hosts(&["10.0.0.1", "backend.internal", "10.0.0.3"]);
    reconciler
        .create_or_replace("api.example.org", 120, &written)
        .await
        .unwrap();

    let record = reconciler.read("api.example.org").await.unwrap();
    assert_eq!(record.name, "api.example.org");
    assert_eq!(record.ttl, Some(120));
    assert_eq!(record.hosts, written);
}

#[tokio::test]
async fn writing_twice_matches_writing_once() {
    let (store, reconciler) = reconciler();
    let set = hosts(&["10.0.0.1", "10.0.0.2"]);
    reconciler
        .create_or_replace("www.example.com", 60, &set)
        .await
        .unwrap();
    let once: Vec<_> = leaf_keys(&store)
        .into_iter()
        .map(|k| (store.value(&k), k))
        .collect();

    reconciler
        .create_or_replace("www.example.com", 60, &set)
        .await
        .unwrap();
    let twice: Vec<_> = leaf_keys(&store)
        .into_iter()
        .map(|k| (store.value(&k), k))
        .collect();

    assert_eq!(once, twice);
}

#[tokio::test]
async fn empty_host_set_removes_the_record() {
    let (store, reconciler) = reconciler();
    reconciler
        .create_or_replace("www.example.com", 60, &hosts(&["10.0.0.1"]))
        .await
        .unwrap();
    assert!(reconciler.exists("www.example.com").await.unwrap());

    reconciler
        .create_or_replace("www.example.com", 60, &hosts(&[]))
        .await
        .unwrap();

    assert!(!reconciler.exists("www.example.com").await.unwrap());
    assert!(matches!(
        reconciler.read("www.example.com").await,
        Err(RecordError::NotFound(_))
    ));
    assert!(store.get("/skydns/com/example/www").await.is_err());
}

#[tokio::test]
async fn delete_keeps_subdomain_records() {
    let (_, reconciler) = reconciler();
    reconciler
        .create_or_replace("example.com", 60, &hosts(&["10.0.0.1"]))
        .await
        .unwrap();
    reconciler
        .create_or_replace("www.example.com", 60, &hosts(&["10.0.0.2"]))
        .await
        .unwrap();

    reconciler.delete("example.com").await.unwrap();

    assert!(!reconciler.exists("example.com").await.unwrap());
    let child = reconciler.read("www.example.com").await.unwrap();
    assert_eq!(child.hosts, hosts(&["10.0.0.2"]));
}

#[tokio::test]
async fn never_created_name_does_not_exist() {
    let (_, reconciler) = reconciler();
    assert!(!reconciler.exists("ghost.example.com").await.unwrap());
    assert!(reconciler.delete("ghost.example.com").await.is_ok());
}

#[tokio::test]
async fn sanitized_collision_keeps_a_single_entry() {
    let (store, reconciler) = reconciler();
    // "a.b" and "a_b" both sanitize to "a_b".
    reconciler
        .create_or_replace("collide.example.com", 60, &hosts(&["a.b", "a_b"]))
        .await
        .unwrap();

    assert_eq!(
        leaf_keys(&store),
        vec!["/skydns/com/example/collide/record-a_b".to_string()]
    );
    let record = reconciler.read("collide.example.com").await.unwrap();
    assert_eq!(record.hosts.len(), 1);
}

#[tokio::test]
async fn unavailable_store_surfaces_connection_errors() {
    let (store, reconciler) = reconciler();
    store.set_unavailable(true);
    assert!(matches!(
        reconciler.exists("www.example.com").await,
        Err(RecordError::Connection(_))
    ));
    assert!(matches!(
        reconciler
            .create_or_replace("www.example.com", 60, &hosts(&["10.0.0.1"]))
            .await,
        Err(RecordError::Connection(_))
    ));
}

#[tokio::test]
async fn failing_entry_is_reported_after_the_rest_are_written() {
    let (store, reconciler) = reconciler();
    store.fail_on("/skydns/com/example/www/record-10_0_0_1");

    let result = reconciler
        .create_or_replace("www.example.com", 60, &hosts(&["10.0.0.1", "10.0.0.2"]))
        .await;

    match result {
        Err(RecordError::PartialFailure { failures, .. }) => assert_eq!(failures.len(), 1),
        other => panic!("expected a partial failure, got {:?}", other),
    }
    assert!(store
        .value("/skydns/com/example/www/record-10_0_0_2")
        .is_some());
}

proptest! {
    #[test]
    fn path_has_one_segment_per_label(labels in prop::collection::vec("[a-z0-9-]{1,12}", 1..6)) {
        let name = labels.join(".");
        let path = derive_path(&name, "/skydns/");
        let segments: Vec<&str> = path.as_str().trim_start_matches("/skydns/").split('/').collect();
        let mut reversed = labels.clone();
        reversed.reverse();
        prop_assert_eq!(segments, reversed.iter().map(String::as_str).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn foreign_leaf_beside_entries_is_left_alone() {
    let (store, reconciler) = reconciler();
    reconciler
        .create_or_replace("www.example.com", 60, &hosts(&["10.0.0.1", "10.0.0.2"]))
        .await
        .unwrap();
    store
        .set("/skydns/com/example/www/x1", "not a record payload")
        .await
        .unwrap();

    let record = reconciler.read("www.example.com").await.unwrap();
    assert_eq!(record.hosts, hosts(&["10.0.0.1", "10.0.0.2"]));
    assert!(reconciler.exists("www.example.com").await.unwrap());

    reconciler.delete("www.example.com").await.unwrap();

    assert_eq!(leaf_keys(&store), vec!["/skydns/com/example/www/x1".to_string()]);
    assert!(store.get("/skydns/com/example/www").await.unwrap().dir);
    assert!(!reconciler.exists("www.example.com").await.unwrap());
    assert!(matches!(
        reconciler.read("www.example.com").await,
        Err(RecordError::NotFound(_))
    ));
}
