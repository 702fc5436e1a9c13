use hostgate_policy::{PermissionLevel, ServiceConfig};
use hostgate_store::{ConfigStore, PersistedConfigDocument};
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

fn sample_document() -> PersistedConfigDocument {
    let mut services = BTreeMap::new();
    services.insert(
        "eventlog".to_string(),
        ServiceConfig {
            enabled: true,
            permission_level: PermissionLevel::ReadOnly,
            enable_anonymization: true,
            service_specific: BTreeMap::new(),
        },
    );
    services.insert("filesearch".to_string(), ServiceConfig::default());
    PersistedConfigDocument::new(services)
}

#[test]
fn test_load_missing_file_returns_none_without_creating_it() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    let store = ConfigStore::new(&path);

    assert!(store.load().unwrap().is_none());
    assert!(!path.exists());
}

#[test]
fn test_save_then_load_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    let doc = sample_document();

    ConfigStore::new(&path).save(&doc).unwrap();

    // A fresh store instance must see field-for-field identical services.
    let loaded = ConfigStore::new(&path).load().unwrap().unwrap();
    assert_eq!(loaded.services, doc.services);
    assert_eq!(loaded.version, doc.version);
}

#[test]
fn test_save_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("dir").join("config.json");

    ConfigStore::new(&path).save(&sample_document()).unwrap();
    assert!(path.exists());
}

#[test]
fn test_save_is_human_readable_and_leaves_no_temp_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");

    ConfigStore::new(&path).save(&sample_document()).unwrap();

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains('\n'), "expected indented JSON");
    assert!(raw.contains("eventlog"));
    assert!(!temp.path().join("config.tmp").exists());
}

#[test]
fn test_corrupt_file_quarantined_and_load_returns_none() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    fs::write(&path, "{not valid json").unwrap();

    let store = ConfigStore::new(&path);
    assert!(store.load().unwrap().is_none());

    let corrupt = temp.path().join("config.json.corrupt");
    assert!(corrupt.exists());
    assert_eq!(fs::read_to_string(&corrupt).unwrap(), "{not valid json");
    assert!(!path.exists());
}

#[test]
fn test_schema_mismatch_is_treated_as_corruption() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    fs::write(&path, r#"{"version": "not-a-number"}"#).unwrap();

    assert!(ConfigStore::new(&path).load().unwrap().is_none());
    assert!(temp.path().join("config.json.corrupt").exists());
}

#[test]
fn test_second_quarantine_never_overwrites_the_first() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    let store = ConfigStore::new(&path);

    fs::write(&path, "first corruption").unwrap();
    assert!(store.load().unwrap().is_none());

    fs::write(&path, "second corruption").unwrap();
    assert!(store.load().unwrap().is_none());

    let first = temp.path().join("config.json.corrupt");
    let second = temp.path().join("config.json.corrupt.1");
    assert_eq!(fs::read_to_string(&first).unwrap(), "first corruption");
    assert_eq!(fs::read_to_string(&second).unwrap(), "second corruption");
}

#[test]
fn test_save_overwrites_whole_document() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.json");
    let store = ConfigStore::new(&path);

    store.save(&sample_document()).unwrap();

    let mut services = BTreeMap::new();
    services.insert("eventlog".to_string(), ServiceConfig::default());
    let replacement = PersistedConfigDocument::new(services);
    store.save(&replacement).unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.services.len(), 1);
    assert!(!loaded.services["eventlog"].enabled);
}
