// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn memory_store_round_trip() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    assert_eq!(store.read("k")?, None);
    store.write("k", "v")?;
    assert_eq!(store.read("k")?, Some("v".to_owned()));
    store.remove("k")?;
    assert_eq!(store.read("k")?, None);
    Ok(())
}

#[test]
fn file_store_survives_reopen() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tokens.json");

    let store = FileStore::open(&path);
    store.write("alm-access-token", "abc")?;
    store.write("alm-access-token-expiry", "1234")?;
    drop(store);

    let reopened = FileStore::open(&path);
    assert_eq!(reopened.read("alm-access-token")?, Some("abc".to_owned()));
    assert_eq!(reopened.read("alm-access-token-expiry")?, Some("1234".to_owned()));
    Ok(())
}

#[test]
fn file_store_tolerates_malformed_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tokens.json");
    std::fs::write(&path, "not json")?;

    let store = FileStore::open(&path);
    assert_eq!(store.read("anything")?, None);
    store.write("k", "v")?;
    assert_eq!(store.read("k")?, Some("v".to_owned()));
    Ok(())
}
