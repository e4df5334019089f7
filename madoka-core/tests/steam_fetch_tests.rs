// File: madoka-core/tests/steam_fetch_tests.rs

mod test_utils;

use std::sync::Arc;
use std::time::Duration;
use madoka_core::cache::TtlCache;
use madoka_core::platforms::steam::client::BATCH_PAUSE;
use madoka_core::platforms::steam::{batch_cache_key, SteamClient};
use test_utils::{player, MockSteamHttp};

fn ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("7656119800000{:04}", i)).collect()
}

fn client(http: Arc<MockSteamHttp>) -> SteamClient {
    SteamClient::new(http, "KEY", Arc::new(TtlCache::new(100)))
}

#[tokio::test(start_paused = true)]
async fn thirty_ids_take_two_calls_with_a_pause() {
    let http = MockSteamHttp::new();
    let all = ids(30);
    for id in &all {
        http.set_player(player(id, "p", None));
    }

    let players = client(http.clone()).fetch_batch(&all).await;
    assert_eq!(players.len(), 30);

    let calls = http.calls.lock().clone();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].ids.len(), 25);
    assert_eq!(calls[1].ids.len(), 5);
    assert!(calls[1].at.duration_since(calls[0].at) >= BATCH_PAUSE);
}

#[tokio::test(start_paused = true)]
async fn empty_input_makes_no_call() {
    let http = MockSteamHttp::new();
    assert!(client(http.clone()).fetch_batch(&[]).await.is_empty());
    assert_eq!(http.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn a_failed_chunk_is_retried_once() {
    let http = MockSteamHttp::new();
    http.set_player(player("1", "one", None));
    http.fail_next(1);

    let players = client(http.clone()).fetch_batch(&["1".to_string()]).await;
    assert_eq!(players.len(), 1);
    assert_eq!(http.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn a_chunk_failing_twice_is_skipped() {
    let http = MockSteamHttp::new();
    let all = ids(30);
    for id in &all {
        http.set_player(player(id, "p", None));
    }
    http.fail_next(2);

    let players = client(http.clone()).fetch_batch(&all).await;
    assert_eq!(players.len(), 5, "only the second chunk survives");
    assert_eq!(http.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn cached_lookups_ignore_id_order() {
    let http = MockSteamHttp::new();
    http.set_player(player("1", "one", None));
    http.set_player(player("2", "two", None));
    let steam = client(http.clone());
    let ttl = Duration::from_secs(30);

    steam.fetch_batch_cached(&["2".into(), "1".into()], ttl).await;
    let again = steam.fetch_batch_cached(&["1".into(), "2".into()], ttl).await;
    assert_eq!(again.len(), 2);
    assert_eq!(http.call_count(), 1);

    tokio::time::advance(Duration::from_secs(31)).await;
    steam.fetch_batch_cached(&["1".into(), "2".into()], ttl).await;
    assert_eq!(http.call_count(), 2);
}

#[test]
fn cache_key_is_sorted_and_prefixed() {
    assert_eq!(batch_cache_key("K", &["b".into(), "a".into()]), "K:a,b");
}
