use std::fs;

use skydns_records::store::MemoryStore;
use skydns_records::tooling::cli::{CliContext, Commands};
use tempfile::TempDir;

fn context() -> CliContext<MemoryStore> {
    CliContext::with_store(MemoryStore::new(), "/skydns/")
}

#[tokio::test]
async fn read_json_contract_has_required_fields() {
    let cli = context();
    cli.execute(&Commands::Create {
        name: "www.example.com".to_string(),
        ttl: Some(300),
        hosts: vec!["10.0.0.1".to_string()],
    })
    .await
    .unwrap();

    let output = cli
        .execute(&Commands::Read {
            name: "www.example.com".to_string(),
            format: "json".to_string(),
        })
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert!(parsed.get("name").and_then(|v| v.as_str()).is_some());
    assert!(parsed.get("ttl").and_then(|v| v.as_u64()).is_some());
    assert!(parsed.get("hosts").and_then(|v| v.as_array()).is_some());
    assert!(parsed.get("path").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn read_of_missing_record_fails() {
    let err = context()
        .execute(&Commands::Read {
            name: "missing.example.com".to_string(),
            format: "text".to_string(),
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn apply_converges_a_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = temp_dir.path().join("records.toml");
    fs::write(
        &manifest,
        r#"
[[records]]
name = "www.example.com"
ttl = 300
records = ["10.0.0.1", "10.0.0.2"]

[[records]]
name = "mail.example.com"
ttl = 60
records = ["10.0.1.1"]
"#,
    )
    .unwrap();

    let cli = context();

    let dry = cli
        .execute(&Commands::Apply {
            file: manifest.clone(),
            dry_run: true,
        })
        .await
        .unwrap();
    assert!(dry.contains("create"));
    assert!(!cli.reconciler().exists("www.example.com").await.unwrap());

    cli.execute(&Commands::Apply {
        file: manifest.clone(),
        dry_run: false,
    })
    .await
    .unwrap();
    assert!(cli.reconciler().exists("www.example.com").await.unwrap());
    assert!(cli.reconciler().exists("mail.example.com").await.unwrap());

    let again = cli
        .execute(&Commands::Apply {
            file: manifest.clone(),
            dry_run: false,
        })
        .await
        .unwrap();
    assert!(again.lines().all(|line| line.starts_with("no-op")), "{}", again);

    fs::write(
        &manifest,
        r#"
[[records]]
name = "www.example.com"
ttl = 300
records = ["10.0.0.9"]
"#,
    )
    .unwrap();
    let replaced = cli
        .execute(&Commands::Apply {
            file: manifest,
            dry_run: false,
        })
        .await
        .unwrap();
    assert!(replaced.contains("changed: records"), "{}", replaced);

    let record = cli.reconciler().read("www.example.com").await.unwrap();
    assert_eq!(record.hosts.into_iter().collect::<Vec<_>>(), vec!["10.0.0.9"]);
}

#[tokio::test]
async fn apply_rejects_duplicate_names() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = temp_dir.path().join("records.json");
    fs::write(
        &manifest,
        r#"{"records": [
            {"name": "a.example.com", "ttl": 60, "records": ["10.0.0.1"]},
            {"name": "a.example.com.", "ttl": 60, "records": ["10.0.0.2"]}
        ]}"#,
    )
    .unwrap();

    assert!(context()
        .execute(&Commands::Apply {
            file: manifest,
            dry_run: true,
        })
        .await
        .is_err());
}
