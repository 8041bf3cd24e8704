// Backup and replay of versioned secrets through the kv2 engine

mod common;

use common::*;
use serde_json::json;
use std::sync::Arc;
use vaultkeep_core::types::RunOptions;
use vaultkeep_engines::chunk;
use vaultkeep_engines::new_engine;
use vaultkeep_engines::versioned::VersionedBackup;
use vaultkeep_store::{MemoryStore, Operation, StoredVersion, VersionedSecret};

/// Build a history of `n` versions where every version in `gone` is destroyed
fn history(n: u64, gone: &[u64]) -> VersionedSecret {
    let versions = (1..=n)
        .map(|v| {
            if gone.contains(&v) {
                StoredVersion::destroyed()
            } else {
                StoredVersion::live(payload(json!({ "value": v })))
            }
        })
        .collect();
    VersionedSecret::new(versions)
}

/// Source store holding one versioned secret
fn source_with(key: &str, secret: VersionedSecret) -> Arc<MemoryStore> {
    let mount = kv2_mount();
    let store = store_with(&mount);
    store.put_versioned(&mount.path, key, secret);
    store
}

/// Back up `source` to a temp dir, then restore into a fresh store
async fn round_trip(source: Arc<MemoryStore>) -> (Arc<MemoryStore>, tempfile::TempDir) {
    let mount = kv2_mount();
    let dir = tempfile::tempdir().unwrap();
    let engine = new_engine(&mount.engine_type).unwrap();

    let ctx = context(source, &mount, &dir, RunOptions::default());
    ctx.local.ensure_root().await.unwrap();
    engine.backup(&ctx).await.unwrap();

    let target = store_with(&mount);
    let ctx = context(target.clone(), &mount, &dir, RunOptions::default());
    engine.restore(&ctx).await.unwrap();
    (target, dir)
}

#[tokio::test]
async fn test_scenario_a_backup_record() {
    let mount = kv2_mount();
    let source = store_with(&mount);
    source.put_versioned(
        "secret",
        "app/db",
        VersionedSecret::new(vec![
            StoredVersion::live(payload(json!({"user": "a"}))),
            StoredVersion::destroyed(),
            StoredVersion::live(payload(json!({"user": "b"}))),
        ]),
    );

    let dir = tempfile::tempdir().unwrap();
    let ctx = context(source, &mount, &dir, RunOptions::default());
    ctx.local.ensure_root().await.unwrap();
    let saved = new_engine(&mount.engine_type)
        .unwrap()
        .backup(&ctx)
        .await
        .unwrap();
    assert_eq!(saved, 1);

    let records: Vec<(String, VersionedBackup)> = chunk::read_all_entries(&ctx.local).await.unwrap();
    assert_eq!(records.len(), 1);
    let (key, record) = &records[0];
    assert_eq!(key, "app/db");
    assert_eq!(record.metadata.current_version, 3);
    assert_eq!(record.data[&1], payload(json!({"user": "a"})));
    assert!(record.data[&2].is_empty());
    assert_eq!(record.data[&3], payload(json!({"user": "b"})));
}

#[tokio::test]
async fn test_scenario_a_replay_order_and_final_state() {
    let source = source_with(
        "app/db",
        VersionedSecret::new(vec![
            StoredVersion::live(payload(json!({"user": "a"}))),
            StoredVersion::destroyed(),
            StoredVersion::live(payload(json!({"user": "b"}))),
        ]),
    );

    let (target, _dir) = round_trip(source).await;

    let secret = "secret/app/db".to_string();
    assert_eq!(
        target.operations(),
        vec![
            Operation::WriteVersion { secret: secret.clone(), version: 1 },
            Operation::WriteMetadata { secret: secret.clone() },
            Operation::WriteVersion { secret: secret.clone(), version: 2 },
            Operation::WriteVersion { secret: secret.clone(), version: 3 },
            Operation::Destroy { secret, versions: vec![2] },
        ]
    );

    let restored = target.versioned("secret", "app/db").unwrap();
    assert_eq!(restored.current_version(), 3);
    assert_eq!(restored.versions[0].data, payload(json!({"user": "a"})));
    assert!(restored.versions[1].destroyed);
    assert_eq!(restored.versions[2].data, payload(json!({"user": "b"})));
    assert!(!restored.versions[2].destroyed);
}

#[tokio::test]
async fn test_round_trip_preserves_destroyed_set() {
    let cases: &[(u64, &[u64])] = &[
        (1, &[]),
        (4, &[1]),
        (5, &[2, 4]),
        (6, &[6]),
        (3, &[1, 2, 3]),
    ];

    for &(n, gone) in cases {
        let (target, _dir) = round_trip(source_with("team/key", history(n, gone))).await;

        let restored = target.versioned("secret", "team/key").unwrap();
        assert_eq!(restored.current_version(), n, "case n={} gone={:?}", n, gone);
        for (i, version) in restored.versions.iter().enumerate() {
            let number = i as u64 + 1;
            if gone.contains(&number) {
                assert!(version.destroyed, "v{} should be destroyed", number);
            } else {
                assert!(!version.destroyed);
                assert_eq!(version.data, payload(json!({ "value": number })));
            }
        }

        let destroys: Vec<_> = target
            .operations()
            .into_iter()
            .filter(|op| matches!(op, Operation::Destroy { .. }))
            .collect();
        assert_eq!(destroys.len(), usize::from(!gone.is_empty()));
    }
}

#[tokio::test]
async fn test_all_destroyed_still_lands_on_version_count() {
    let (target, _dir) = round_trip(source_with("old", history(4, &[1, 2, 3, 4]))).await;

    let writes = target
        .operations()
        .iter()
        .filter(|op| matches!(op, Operation::WriteVersion { .. }))
        .count();
    assert_eq!(writes, 4);
    let restored = target.versioned("secret", "old").unwrap();
    assert!(restored.versions.iter().all(|v| v.destroyed));
}

#[tokio::test]
async fn test_soft_deleted_version_is_destroyed_on_restore() {
    let source = source_with(
        "svc",
        VersionedSecret::new(vec![
            StoredVersion::live(payload(json!({"v": 1}))),
            StoredVersion::deleted(payload(json!({"v": 2}))),
        ]),
    );
    let (target, _dir) = round_trip(source).await;

    let restored = target.versioned("secret", "svc").unwrap();
    assert_eq!(restored.current_version(), 2);
    assert!(restored.versions[1].destroyed);
    assert!(restored.versions[1].data.is_empty());
}

#[tokio::test]
async fn test_metadata_settings_are_restored() {
    let mut secret = history(2, &[]);
    secret.max_versions = 5;
    secret.cas_required = true;
    secret.delete_version_after = "768h".to_string();
    secret.custom_metadata = Some([("owner".to_string(), "ops".to_string())].into());

    let (target, _dir) = round_trip(source_with("cfg", secret.clone())).await;

    let restored = target.versioned("secret", "cfg").unwrap();
    assert_eq!(restored.max_versions, 5);
    assert!(restored.cas_required);
    assert_eq!(restored.delete_version_after, "768h");
    assert_eq!(restored.custom_metadata, secret.custom_metadata);
}

#[tokio::test]
async fn test_cas_required_secret_replays_every_version() {
    let mut secret = history(4, &[2]);
    secret.cas_required = true;

    let (target, _dir) = round_trip(source_with("locked", secret)).await;

    let restored = target.versioned("secret", "locked").unwrap();
    assert!(restored.cas_required);
    assert_eq!(restored.current_version(), 4);
    assert!(restored.versions[1].destroyed);
    for number in [1u64, 3, 4] {
        let version = &restored.versions[number as usize - 1];
        assert!(!version.destroyed);
        assert_eq!(version.data, payload(json!({ "value": number })));
    }
}

#[tokio::test]
async fn test_write_failure_aborts_key_without_destroy() {
    let mount = kv2_mount();
    let source = source_with("app", history(3, &[2]));
    let dir = tempfile::tempdir().unwrap();
    let engine = new_engine(&mount.engine_type).unwrap();

    let ctx = context(source, &mount, &dir, RunOptions::default());
    ctx.local.ensure_root().await.unwrap();
    engine.backup(&ctx).await.unwrap();

    let target = store_with(&mount);
    target.fail_on("secret/metadata/app");
    let ctx = context(target.clone(), &mount, &dir, RunOptions::default());
    assert!(engine.restore(&ctx).await.is_err());

    // version 1 landed before the metadata write failed; nothing was rolled back
    assert_eq!(
        target.operations(),
        vec![Operation::WriteVersion { secret: "secret/app".into(), version: 1 }]
    );
}
