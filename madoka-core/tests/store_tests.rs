// File: madoka-core/tests/store_tests.rs

use madoka_core::repositories::{BindStore, DisableStore, ParentStore};
use madoka_core::Error;

#[tokio::test]
async fn bind_store_round_trips_through_disk() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("bind_data.json");

    let store = BindStore::load(&path).await?;
    assert!(store.upsert("g1", "u1", "1").await?);
    assert!(store.upsert("g1", "u2", "2").await?);
    assert!(!store.upsert("g1", "u1", "3").await?);
    assert!(store.set_nickname("g1", "u2", Some("Sayaka".into())).await?);
    assert!(!store.set_nickname("g1", "nobody", None).await?);

    let reloaded = BindStore::load(&path).await?;
    assert_eq!(reloaded.get_all("g1"), vec!["3".to_string(), "2".to_string()]);
    assert_eq!(reloaded.get_by_steam_id("g1", "2").unwrap().nickname.as_deref(), Some("Sayaka"));
    assert!(reloaded.get_by_steam_id("g2", "2").is_none());
    Ok(())
}

#[tokio::test]
async fn removing_the_last_record_drops_the_group() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let store = BindStore::load(dir.path().join("bind_data.json")).await?;
    store.upsert("g1", "u1", "1").await?;

    assert!(store.remove("g1", "u1").await?);
    assert!(!store.remove("g1", "u1").await?);
    assert!(store.bind_map().is_empty());
    Ok(())
}

#[tokio::test]
async fn corrupt_documents_are_reported() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("disable_parent_data.json");
    std::fs::write(&path, b"{not json")?;
    assert!(matches!(DisableStore::load(&path).await, Err(Error::Json(_))));
    Ok(())
}

#[tokio::test]
async fn write_failures_surface_to_the_caller() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    // A directory where the document should be makes the final rename fail.
    let path = dir.path().join("disable_parent_data.json");
    let store = DisableStore::load(&path).await?;
    std::fs::create_dir(&path)?;
    std::fs::write(path.join("occupant"), b"x")?;

    assert!(store.add("g1").await.is_err());
    assert!(!store.is_disabled("g1"), "a failed save must not change memory");

    std::fs::remove_dir_all(&path)?;
    assert!(store.add("g1").await?);
    assert!(store.is_disabled("g1"));
    Ok(())
}

#[tokio::test]
async fn disable_set_toggles() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let store = DisableStore::load(dir.path().join("d.json")).await?;
    assert!(store.add("g").await?);
    assert!(!store.add("g").await?);
    assert!(store.is_disabled("g"));
    assert!(store.remove("g").await?);
    assert!(!store.is_disabled("g"));
    Ok(())
}

#[tokio::test]
async fn group_ids_that_escape_the_avatar_dir_are_rejected() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let avatars = dir.path().join("parents");
    let store = ParentStore::load(dir.path().join("parent_data.json"), &avatars).await?;

    for bad in ["../evil", "a/b", "a\\b", "..", ""] {
        assert!(store.update(bad, Some(b"png"), "x").await.is_err(), "{bad:?}");
        assert!(store.get(bad).is_none());
    }
    assert!(!dir.path().join("evil.png").exists());

    store.update("123456", Some(b"png"), "Mitakihara").await?;
    assert_eq!(store.get("123456").unwrap().name.as_deref(), Some("Mitakihara"));
    assert_eq!(store.avatar_bytes("123456").await.as_deref(), Some(&b"png"[..]));
    Ok(())
}
