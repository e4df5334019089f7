/// Difference between a SteamID64 and the account's friend code.
pub const STEAM_ID_OFFSET: u64 = 76561197960265728;

/// Accepts a SteamID64 or a friend code and returns the SteamID64.
///
/// Anything that is not all ASCII digits is rejected. Numbers below the offset are
/// friend codes and get the offset added; everything else passes through unchanged.
pub fn resolve_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let id: u64 = input.parse().ok()?;
    if id < STEAM_ID_OFFSET {
        return Some((id + STEAM_ID_OFFSET).to_string());
    }
    Some(input.to_string())
}

/// The friend code shown on profile cards. `None` for non-numeric ids.
pub fn friend_code(steam_id: &str) -> Option<String> {
    let id: u64 = steam_id.parse().ok()?;
    Some(id.saturating_sub(STEAM_ID_OFFSET).to_string())
}

/// Cache line for a batch lookup: order-independent in `ids`.
pub fn batch_cache_key(api_key: &str, ids: &[String]) -> String {
    let mut sorted: Vec<&str> = ids.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    format!("{api_key}:{}", sorted.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_ids_pass_through() {
        assert_eq!(resolve_id("76561197960265728").as_deref(), Some("76561197960265728"));
        assert_eq!(resolve_id("76561198000000000").as_deref(), Some("76561198000000000"));
    }

    #[test]
    fn friend_codes_get_the_offset() {
        assert_eq!(resolve_id("12345").as_deref(), Some("76561197960278073"));
        assert_eq!(resolve_id("0").as_deref(), Some("76561197960265728"));
    }

    #[test]
    fn non_digits_are_invalid() {
        assert_eq!(resolve_id("abc"), None);
        assert_eq!(resolve_id(""), None);
        assert_eq!(resolve_id("-5"), None);
        assert_eq!(resolve_id("12a"), None);
    }

    #[test]
    fn friend_code_inverts_resolve() {
        assert_eq!(friend_code("76561197960278073").as_deref(), Some("12345"));
    }

    #[test]
    fn cache_key_ignores_order() {
        let a = batch_cache_key("k", &["b".into(), "a".into()]);
        let b = batch_cache_key("k", &["a".into(), "b".into()]);
        assert_eq!(a, b);
        assert_eq!(a, "k:a,b");
    }
}
