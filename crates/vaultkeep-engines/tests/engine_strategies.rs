// Backup and restore of the non-kv engines against an in-memory store

mod common;

use common::*;
use serde_json::json;
use vaultkeep_core::types::{EngineMount, EngineType, RunOptions};
use vaultkeep_engines::{codec, new_engine, EngineContext};
use vaultkeep_store::{MemoryStore, Operation};

async fn backup(ctx: &EngineContext) -> usize {
    ctx.local.ensure_root().await.unwrap();
    new_engine(&ctx.mount.engine_type)
        .unwrap()
        .backup(ctx)
        .await
        .unwrap()
}

async fn restore(ctx: &EngineContext) -> usize {
    new_engine(&ctx.mount.engine_type)
        .unwrap()
        .restore(ctx)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_ssh_relocates_ca_keys_and_restores_roles() {
    let mount = EngineMount::new("ssh", EngineType::Ssh, "ssh-uuid");
    let source = store_with(&mount);
    source.put_raw("logical/ssh-uuid/config/ca_public_key", r#"{"key":"ssh-rsa AAAA"}"#);
    source.put_raw("logical/ssh-uuid/config/ca_private_key", r#"{"key":"-----BEGIN"}"#);
    source.put_secret("ssh/roles/dev", payload(json!({"key_type": "ca"})));

    let dir = tempfile::tempdir().unwrap();
    let ctx = context(source, &mount, &dir, raw_options());
    assert_eq!(backup(&ctx).await, 3);

    let target = store_with(&mount);
    let ctx = context(target.clone(), &mount, &dir, raw_options());
    assert_eq!(restore(&ctx).await, 2);

    let ca = target.secret("ssh/config/ca").unwrap();
    assert_eq!(ca["public_key"], "ssh-rsa AAAA");
    assert_eq!(ca["private_key"], "-----BEGIN");
    assert_eq!(ca["generate_signing_key"], false);
    assert_eq!(target.secret("ssh/roles/dev").unwrap()["key_type"], "ca");
}

#[tokio::test]
async fn test_ssh_without_raw_skips_ca() {
    let mount = EngineMount::new("ssh", EngineType::Ssh, "ssh-uuid");
    let source = store_with(&mount);
    source.put_raw("logical/ssh-uuid/config/ca_public_key", r#"{"key":"pub"}"#);
    source.put_secret("ssh/roles/dev", payload(json!({"key_type": "otp"})));

    let dir = tempfile::tempdir().unwrap();
    let ctx = context(source, &mount, &dir, RunOptions::default());
    assert_eq!(backup(&ctx).await, 1);
    assert!(!ctx.local.exists("config"));

    let target = store_with(&mount);
    let ctx = context(target.clone(), &mount, &dir, RunOptions::default());
    restore(&ctx).await;
    assert!(target.secret("ssh/config/ca").is_none());
    assert!(target.secret("ssh/roles/dev").is_some());
}

#[tokio::test]
async fn test_database_flattens_connection_config() {
    let mount = EngineMount::new("db", EngineType::Database, "db-uuid");
    let source = store_with(&mount);
    source.put_raw(
        "logical/db-uuid/config/pg",
        &json!({
            "plugin_name": "postgresql-database-plugin",
            "allowed_roles": ["app"],
            "connection_details": {"connection_url": "postgres://db", "username": "vault"}
        })
        .to_string(),
    );
    source.put_secret("db/roles/app", payload(json!({"db_name": "pg"})));

    let dir = tempfile::tempdir().unwrap();
    backup(&context(source, &mount, &dir, raw_options())).await;

    let target = store_with(&mount);
    let restored = restore(&context(target.clone(), &mount, &dir, raw_options())).await;
    // one connection config plus one role
    assert_eq!(restored, 2);
    let writes = target
        .operations()
        .iter()
        .filter(|op| matches!(op, Operation::Write { .. }))
        .count();
    assert_eq!(restored, writes);

    let config = target.secret("db/config/pg").unwrap();
    assert_eq!(config["connection_url"], "postgres://db");
    assert_eq!(config["plugin_name"], "postgresql-database-plugin");
    assert!(!config.contains_key("connection_details"));
    assert_eq!(target.secret("db/roles/app").unwrap()["db_name"], "pg");
}

#[tokio::test]
async fn test_database_restore_without_config_dir() {
    let mount = EngineMount::new("db", EngineType::Database, "db-uuid");
    let dir = tempfile::tempdir().unwrap();
    let target = store_with(&mount);
    let ctx = context(target.clone(), &mount, &dir, RunOptions::default());
    assert_eq!(restore(&ctx).await, 0);
    assert!(target.operations().is_empty());
}

#[tokio::test]
async fn test_ad_merges_config_blocks() {
    let mount = EngineMount::new("ad", EngineType::Ad, "ad-uuid");
    let source = store_with(&mount);
    source.put_raw(
        "logical/ad-uuid/config",
        &json!({"PasswordConf": {"length": 64}, "ADConf": {"binddn": "cn=vault"}}).to_string(),
    );

    let dir = tempfile::tempdir().unwrap();
    assert_eq!(backup(&context(source, &mount, &dir, raw_options())).await, 1);

    let target = store_with(&mount);
    restore(&context(target.clone(), &mount, &dir, raw_options())).await;
    assert_eq!(
        target.secret("ad/config").unwrap(),
        payload(json!({"length": 64, "binddn": "cn=vault"}))
    );
}

#[tokio::test]
async fn test_aws_restores_root_and_lease() {
    let mount = EngineMount::new("aws", EngineType::Aws, "aws-uuid");
    let source = store_with(&mount);
    source.put_raw(
        "logical/aws-uuid/config/root",
        r#"{"access_key":"AKIA","secret_key":"s3cr3t"}"#,
    );
    source.put_secret("aws/config/lease", payload(json!({"lease": "768h0m0s"})));
    source.put_secret("aws/roles/deploy", payload(json!({"credential_type": "iam_user"})));

    let dir = tempfile::tempdir().unwrap();
    backup(&context(source, &mount, &dir, raw_options())).await;

    let target = store_with(&mount);
    assert_eq!(restore(&context(target.clone(), &mount, &dir, raw_options())).await, 3);
    assert_eq!(target.secret("aws/config/root").unwrap()["access_key"], "AKIA");
    assert_eq!(target.secret("aws/config/lease").unwrap()["lease"], "768h0m0s");
    assert!(target.secret("aws/roles/deploy").is_some());
}

#[tokio::test]
async fn test_pki_raw_tree_is_restored_verbatim() {
    let mount = EngineMount::new("pki", EngineType::Pki, "pki-uuid");
    let source = store_with(&mount);
    source.put_raw("logical/pki-uuid/config/ca_bundle", "bundle-bytes");
    source.put_raw("logical/pki-uuid/certs/17-aa", "cert-bytes");

    let dir = tempfile::tempdir().unwrap();
    let ctx = context(source, &mount, &dir, RunOptions::default());
    assert_eq!(backup(&ctx).await, 2);
    let stored = ctx.local.read_to_string("certs/17-aa").await.unwrap();
    assert_eq!(stored, codec::encode_bytes(b"cert-bytes"));

    let target = store_with(&mount);
    restore(&context(target.clone(), &mount, &dir, RunOptions::default())).await;
    assert_eq!(target.raw("logical/pki-uuid/certs/17-aa").as_deref(), Some("cert-bytes"));
    assert_eq!(target.raw("logical/pki-uuid/config/ca_bundle").as_deref(), Some("bundle-bytes"));
    assert!(target
        .operations()
        .iter()
        .all(|op| matches!(op, Operation::RawWrite { .. })));
}

#[tokio::test]
async fn test_totp_maps_algorithm() {
    let mount = EngineMount::new("totp", EngineType::Totp, "totp-uuid");
    let source = store_with(&mount);
    source.put_raw(
        "logical/totp-uuid/key/github",
        r#"{"key":"JBSWY3DP","issuer":"GitHub","algorithm":1,"digits":6,"period":30}"#,
    );

    let dir = tempfile::tempdir().unwrap();
    assert_eq!(backup(&context(source, &mount, &dir, raw_options())).await, 1);

    let target = store_with(&mount);
    restore(&context(target.clone(), &mount, &dir, raw_options())).await;
    let key = target.secret("totp/keys/github").unwrap();
    assert_eq!(key["algorithm"], "SHA256");
    assert_eq!(key["issuer"], "GitHub");
}

#[tokio::test]
async fn test_totp_without_raw_is_noop() {
    let mount = EngineMount::new("totp", EngineType::Totp, "totp-uuid");
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(store_with(&mount), &mount, &dir, RunOptions::default());
    assert_eq!(backup(&ctx).await, 0);
}

#[tokio::test]
async fn test_transit_exports_and_restores_keys() {
    let mount = EngineMount::new("transit", EngineType::Transit, "tr-uuid");
    let source = store_with(&mount);
    source.put_secret("transit/keys/orders", payload(json!({"type": "aes256-gcm96"})));
    source.put_secret("transit/backup/orders", payload(json!({"backup": "b64blob"})));

    let dir = tempfile::tempdir().unwrap();
    // raw is ignored for transit
    let ctx = context(source.clone(), &mount, &dir, raw_options());
    assert!(!ctx.raw_enabled());
    assert_eq!(backup(&ctx).await, 1);

    let exported = source.secret("transit/keys/orders/config").unwrap();
    assert_eq!(exported["exportable"], true);
    assert_eq!(exported["allow_plaintext_backup"], true);

    let target = store_with(&mount);
    restore(&context(target.clone(), &mount, &dir, RunOptions::default())).await;
    assert_eq!(target.secret("transit/restore/orders").unwrap()["backup"], "b64blob");
}

#[test]
fn test_raw_forced_off_for_versioned_mounts() {
    let mount = kv2_mount();
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(std::sync::Arc::new(MemoryStore::new()), &mount, &dir, raw_options());
    assert!(!ctx.raw_enabled());
}
