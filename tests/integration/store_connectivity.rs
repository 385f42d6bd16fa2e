use skydns_records::error::RecordError;
use skydns_records::record::RecordReconciler;
use skydns_records::store::{connect, StoreConfig};
use std::time::Duration;

fn unreachable_config() -> StoreConfig {
    let mut config = StoreConfig::new(["http://127.0.0.1:1"]);
    config.dial_timeout = Duration::from_millis(500);
    config.request_timeout = Some(Duration::from_secs(2));
    config
}

#[tokio::test]
async fn connect_is_lazy() {
    let client = connect(&unreachable_config()).unwrap();
    assert_eq!(client.endpoints().len(), 1);
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn exists_against_dead_endpoint_is_a_connection_error() {
    let client = connect(&unreachable_config()).unwrap();
    let reconciler = RecordReconciler::new(client, "/skydns/");
    let result = reconciler.exists("www.example.com").await;
    assert!(matches!(result, Err(RecordError::Connection(_))), "{:?}", result);
}

#[test]
fn unsupported_scheme_is_rejected() {
    let config = StoreConfig::new(["unix:///var/run/etcd.sock"]);
    assert!(connect(&config).is_err());
}

#[test]
fn missing_tls_files_fail_at_connect() {
    let mut config = StoreConfig::new(["https://127.0.0.1:2379"]);
    config.tls = Some(skydns_records::store::TlsMaterial {
        ca_file: "/nonexistent/ca.pem".into(),
        cert_file: "/nonexistent/client.pem".into(),
        key_file: "/nonexistent/client-key.pem".into(),
    });
    assert!(connect(&config).is_err());
}
