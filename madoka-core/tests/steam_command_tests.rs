// File: madoka-core/tests/steam_command_tests.rs

mod test_utils;

use std::sync::Arc;
use tempfile::TempDir;
use madoka_core::cache::TtlCache;
use madoka_core::platforms::steam::{AvatarFetcher, ProfileDefaults, SteamClient};
use madoka_core::render::SvgRenderer;
use madoka_core::repositories::{BindStore, DisableStore, ParentStore};
use madoka_core::services::SteamCommandService;
use madoka_core::Error;
use test_utils::{group_message, player, MockSteamHttp, RecordingHost, PNG};

struct Harness {
    dir: TempDir,
    http: Arc<MockSteamHttp>,
    host: Arc<RecordingHost>,
    binds: Arc<BindStore>,
    parents: Arc<ParentStore>,
    disabled: Arc<DisableStore>,
    service: SteamCommandService,
}

async fn harness() -> Result<Harness, Error> {
    let dir = tempfile::tempdir()?;
    let http = MockSteamHttp::new();
    let host = RecordingHost::new();
    let binds = Arc::new(BindStore::load(dir.path().join("bind_data.json")).await?);
    let parents = Arc::new(ParentStore::load(dir.path().join("parent_data.json"), dir.path().join("parents")).await?);
    let disabled = Arc::new(DisableStore::load(dir.path().join("disable_parent_data.json")).await?);
    let steam = Arc::new(SteamClient::new(http.clone(), "KEY", Arc::new(TtlCache::new(16))));
    let avatars = Arc::new(AvatarFetcher::new(http.clone(), Some(dir.path().join("cache")), PNG.to_vec()));

    let service = SteamCommandService::new(
        steam,
        binds.clone(),
        parents.clone(),
        disabled.clone(),
        avatars,
        Arc::new(SvgRenderer::new()),
        host.clone(),
        ProfileDefaults { avatar: PNG.to_vec(), background: PNG.to_vec() },
    );
    Ok(Harness { dir, http, host, binds, parents, disabled, service })
}

async fn last_reply(h: &Harness, user: &str, admin: bool, text: &str) -> String {
    let replies = h
        .service
        .handle(&group_message("g1", user, admin, text))
        .await
        .unwrap()
        .expect("steam command");
    replies.last().map(|m| m.plain_text()).unwrap_or_default()
}

#[tokio::test]
async fn bind_accepts_friend_codes_and_persists() -> Result<(), Error> {
    let h = harness().await?;
    h.http.set_player(player("76561197960278073", "Madoka", None));

    let reply = last_reply(&h, "100", false, "steam bind 12345").await;
    assert!(reply.contains("[Madoka]"), "{reply}");
    assert!(reply.contains("76561197960278073"));

    let reloaded = BindStore::load(h.dir.path().join("bind_data.json")).await?;
    assert_eq!(reloaded.get("g1", "100").unwrap().steam_id, "76561197960278073");
    Ok(())
}

#[tokio::test]
async fn bind_rejects_non_numeric_ids_without_mutation() -> Result<(), Error> {
    let h = harness().await?;
    let reply = last_reply(&h, "100", false, "steam bind abc").await;
    assert_eq!(reply, "Please enter a valid Steam ID or friend code.");
    assert!(h.binds.get("g1", "100").is_none());
    Ok(())
}

#[tokio::test]
async fn rebinding_keeps_the_nickname() -> Result<(), Error> {
    let h = harness().await?;
    last_reply(&h, "100", false, "steam bind 76561198000000001").await;
    last_reply(&h, "100", false, "steam nickname Mado").await;
    last_reply(&h, "100", false, "steam 绑定 76561198000000002").await;

    let record = h.binds.get("g1", "100").unwrap();
    assert_eq!(record.steam_id, "76561198000000002");
    assert_eq!(record.nickname.as_deref(), Some("Mado"));

    assert_eq!(last_reply(&h, "100", false, "steam nickname 删除").await, "Nickname removed.");
    assert_eq!(h.binds.get("g1", "100").unwrap().nickname, None);
    Ok(())
}

#[tokio::test]
async fn add_is_admin_only_and_enforces_steam_id_uniqueness() -> Result<(), Error> {
    let h = harness().await?;
    assert_eq!(
        last_reply(&h, "1", false, "steam add @200 76561198000000001").await,
        "Only group admins can use this command."
    );
    assert!(h.binds.get("g1", "200").is_none());

    last_reply(&h, "1", true, "steam add @200 76561198000000001").await;
    assert_eq!(h.binds.get("g1", "200").unwrap().steam_id, "76561198000000001");

    let reply = last_reply(&h, "1", true, "steam add 300 76561198000000001").await;
    assert!(reply.contains("already taken by member 200"), "{reply}");
    assert!(h.binds.get("g1", "300").is_none());
    Ok(())
}

#[tokio::test]
async fn remove_lists_then_deletes() -> Result<(), Error> {
    let h = harness().await?;
    h.binds.upsert("g1", "200", "76561198000000001").await?;
    h.host
        .names
        .lock()
        .insert(("g1".into(), "200".into()), "Homura".into());

    let listing = last_reply(&h, "1", true, "steam remove").await;
    assert!(listing.contains("- Homura (200) -> 76561198000000001"), "{listing}");

    assert_eq!(last_reply(&h, "1", true, "steam remove @200").await, "Removed the bind data of 200.");
    assert_eq!(last_reply(&h, "1", true, "steam remove @200").await, "200 has no bind data in this group.");
    assert_eq!(last_reply(&h, "200", false, "steam unbind").await, "You have not bound a Steam ID yet.");
    Ok(())
}

#[tokio::test]
async fn enable_and_disable_toggle_broadcasts() -> Result<(), Error> {
    let h = harness().await?;
    last_reply(&h, "1", true, "steam disable").await;
    assert!(h.disabled.is_disabled("g1"));
    last_reply(&h, "1", true, "steam 启用").await;
    assert!(!h.disabled.is_disabled("g1"));
    Ok(())
}

#[tokio::test]
async fn check_renders_the_friends_board() -> Result<(), Error> {
    let h = harness().await?;
    assert_eq!(
        last_reply(&h, "1", false, "steam check").await,
        "No Steam accounts are bound in this group."
    );

    h.binds.upsert("g1", "100", "1").await?;
    h.http.set_player(player("1", "Alice", Some("Dota 2")));
    let replies = h.service.handle(&group_message("g1", "1", false, "steam check")).await?.unwrap();
    let image = replies.last().unwrap().images().next().unwrap().clone();
    let svg = String::from_utf8(image).unwrap();
    assert!(svg.contains("Alice"));
    assert!(svg.contains("Dota 2"));
    Ok(())
}

#[tokio::test]
async fn update_stores_group_name_and_avatar() -> Result<(), Error> {
    let h = harness().await?;
    assert_eq!(
        last_reply(&h, "1", false, "steam update").await,
        "Could not read the group avatar or name."
    );

    *h.host.group_name.lock() = Some("Mahou Shoujo".into());
    assert_eq!(
        last_reply(&h, "1", false, "steam update").await,
        "Updated, the new name is Mahou Shoujo"
    );
    assert_eq!(h.parents.get("g1").unwrap().name.as_deref(), Some("Mahou Shoujo"));
    assert_eq!(h.parents.avatar_bytes("g1").await.unwrap(), PNG);
    Ok(())
}

#[tokio::test]
async fn info_falls_back_to_defaults_when_the_page_is_unavailable() -> Result<(), Error> {
    let h = harness().await?;
    assert!(last_reply(&h, "100", false, "steam info").await.starts_with("You have not bound"));

    h.binds.upsert("g1", "100", "76561197960278073").await?;
    let replies = h.service.handle(&group_message("g1", "1", false, "steam info @100")).await?.unwrap();
    let svg = String::from_utf8(replies.last().unwrap().images().next().unwrap().clone()).unwrap();
    assert!(svg.contains("Unknown"));
    assert!(svg.contains("Friend code: 12345"));
    Ok(())
}

#[tokio::test]
async fn non_steam_text_is_ignored() -> Result<(), Error> {
    let h = harness().await?;
    assert!(h.service.handle(&group_message("g1", "1", false, "hello steam")).await?.is_none());
    let help = last_reply(&h, "1", false, "steam").await;
    assert!(help.starts_with("steam help"));
    Ok(())
}
