use hostgate_store::{AuditEntry, AuditLogConfig, AuditLogger};
use serde_json::json;
use std::fs::{self, OpenOptions};
use std::io::Write;
use tempfile::TempDir;

fn entry(action: &str) -> AuditEntry {
    AuditEntry {
        timestamp: String::new(),
        action: action.to_string(),
        service_id: "eventlog".to_string(),
        previous_value: json!({"enabled": false}),
        new_value: json!({"enabled": true}),
        source: "config-api".to_string(),
    }
}

#[test]
fn test_entries_read_back_in_chronological_order() {
    let temp = TempDir::new().unwrap();
    let logger = AuditLogger::new(temp.path().join("audit.jsonl"), AuditLogConfig::default())
        .unwrap();

    for i in 0..10 {
        logger.log(&entry(&format!("action{}", i))).unwrap();
    }

    let entries = logger.recent_entries(10).unwrap();
    assert_eq!(entries.len(), 10);
    for (i, e) in entries.iter().enumerate() {
        assert_eq!(e.action, format!("action{}", i));
    }
}

#[test]
fn test_timestamp_stamped_when_empty() {
    let temp = TempDir::new().unwrap();
    let logger = AuditLogger::new(temp.path().join("audit.jsonl"), AuditLogConfig::default())
        .unwrap();

    logger.log(&entry("enable")).unwrap();

    let entries = logger.recent_entries(1).unwrap();
    assert!(!entries[0].timestamp.is_empty());
}

#[test]
fn test_supplied_timestamp_preserved() {
    let temp = TempDir::new().unwrap();
    let logger = AuditLogger::new(temp.path().join("audit.jsonl"), AuditLogConfig::default())
        .unwrap();

    let mut stamped = entry("enable");
    stamped.timestamp = "2026-01-01T00:00:00+00:00".to_string();
    logger.log(&stamped).unwrap();

    let entries = logger.recent_entries(1).unwrap();
    assert_eq!(entries[0].timestamp, "2026-01-01T00:00:00+00:00");
}

#[test]
fn test_recent_entries_with_count_beyond_history() {
    let temp = TempDir::new().unwrap();
    let logger = AuditLogger::new(temp.path().join("audit.jsonl"), AuditLogConfig::default())
        .unwrap();

    for i in 0..3 {
        logger.log(&entry(&format!("action{}", i))).unwrap();
    }

    let entries = logger.recent_entries(50).unwrap();
    assert_eq!(entries.len(), 3);
}

#[test]
fn test_rotation_produces_multiple_files() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("audit.jsonl");
    let config = AuditLogConfig {
        max_file_bytes: 1,
        max_backups: 5,
    };
    let logger = AuditLogger::new(&path, config).unwrap();

    for i in 0..4 {
        logger.log(&entry(&format!("action{}", i))).unwrap();
    }

    assert!(path.exists());
    assert!(temp.path().join("audit.jsonl.1").exists());
    assert!(temp.path().join("audit.jsonl.2").exists());
}

#[test]
fn test_recent_entries_span_rotation_boundary() {
    let temp = TempDir::new().unwrap();
    let config = AuditLogConfig {
        max_file_bytes: 1,
        max_backups: 5,
    };
    let logger = AuditLogger::new(temp.path().join("audit.jsonl"), config).unwrap();

    for i in 0..5 {
        logger.log(&entry(&format!("action{}", i))).unwrap();
    }

    let entries = logger.recent_entries(4).unwrap();
    let actions: Vec<_> = entries.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["action1", "action2", "action3", "action4"]);
}

#[test]
fn test_retention_discards_oldest_backup() {
    let temp = TempDir::new().unwrap();
    let config = AuditLogConfig {
        max_file_bytes: 1,
        max_backups: 2,
    };
    let logger = AuditLogger::new(temp.path().join("audit.jsonl"), config).unwrap();

    for i in 0..8 {
        logger.log(&entry(&format!("action{}", i))).unwrap();
    }

    assert!(temp.path().join("audit.jsonl.1").exists());
    assert!(temp.path().join("audit.jsonl.2").exists());
    assert!(!temp.path().join("audit.jsonl.3").exists());

    // History beyond the retained files is gone; what remains stays ordered.
    let entries = logger.recent_entries(50).unwrap();
    let actions: Vec<_> = entries.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["action5", "action6", "action7"]);
}

#[test]
fn test_unparsable_lines_are_skipped() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("audit.jsonl");
    let logger = AuditLogger::new(&path, AuditLogConfig::default()).unwrap();

    logger.log(&entry("action0")).unwrap();
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{garbage line").unwrap();
    }
    logger.log(&entry("action1")).unwrap();

    let entries = logger.recent_entries(10).unwrap();
    let actions: Vec<_> = entries.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["action0", "action1"]);
}

#[test]
fn test_append_only_across_logger_instances() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("audit.jsonl");

    {
        let logger = AuditLogger::new(&path, AuditLogConfig::default()).unwrap();
        logger.log(&entry("action0")).unwrap();
    }
    {
        let logger = AuditLogger::new(&path, AuditLogConfig::default()).unwrap();
        logger.log(&entry("action1")).unwrap();
    }

    let raw = fs::read_to_string(&path).unwrap();
    assert_eq!(raw.lines().count(), 2);
}
