//! Identity Normalization
//!
//! Collapses every transport representation of one account into a single
//! canonical identity key, used everywhere else as the lookup key for
//! ranks and audit fields.

use unicode_normalization::UnicodeNormalization;

/// Canonical domain for direct user accounts.
pub const USER_DOMAIN: &str = "telegram";

/// Transport domains that are aliases of [`USER_DOMAIN`].
const DOMAIN_ALIASES: &[&str] = &["tg", "telegram.org"];

/// Normalize a raw transport identifier into a canonical identity key.
///
/// Raw identifiers look like `user[:device][@domain]`. The device suffix is
/// transport-internal session state and is stripped; a missing or aliased
/// domain collapses to [`USER_DOMAIN`]. Returns `None` for malformed input —
/// callers must drop the action silently rather than fall back to any rank.
pub fn normalize(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let (user, domain) = match raw.split_once('@') {
        Some((u, d)) => (u, d),
        None => (raw, USER_DOMAIN),
    };

    // Device suffixes (":<n>") identify a session, not an account.
    let user = user.split(':').next().unwrap_or("");
    if user.is_empty() {
        return None;
    }

    let domain = domain.trim().to_ascii_lowercase();
    if domain.is_empty() {
        return None;
    }
    let domain = if DOMAIN_ALIASES.contains(&domain.as_str()) {
        USER_DOMAIN
    } else {
        domain.as_str()
    };

    Some(format!("{}@{}", user, domain))
}

/// Normalize a human-entered name for catalog matching: decompose (NFD),
/// drop combining marks, lowercase, trim. "Capitão", "CAPITAO" and
/// "capitao " all compare equal.
pub fn normalize_name(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036f}')
}

/// Render an identity key as a short mention handle (the user part only).
pub fn handle(key: &str) -> &str {
    key.split('@').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_device_suffix() {
        assert_eq!(
            normalize("5511999:22@telegram").as_deref(),
            Some("5511999@telegram")
        );
    }

    #[test]
    fn defaults_missing_domain() {
        assert_eq!(normalize("12345").as_deref(), Some("12345@telegram"));
    }

    #[test]
    fn collapses_domain_aliases() {
        assert_eq!(normalize("12345@tg").as_deref(), Some("12345@telegram"));
        assert_eq!(
            normalize("12345@Telegram").as_deref(),
            Some("12345@telegram")
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize("@telegram"), None);
        assert_eq!(normalize(":3@telegram"), None);
        assert_eq!(normalize("123@  "), None);
    }

    #[test]
    fn name_matching_ignores_case_and_accents() {
        assert_eq!(normalize_name("Capitão"), "capitao");
        assert_eq!(normalize_name("CAPITAO  "), "capitao");
        assert_eq!(normalize_name("capitão"), normalize_name("Capitao"));
        assert_eq!(normalize_name("Sargentó"), "sargento");
    }

    #[test]
    fn handle_is_user_part() {
        assert_eq!(handle("5511999@telegram"), "5511999");
        assert_eq!(handle("bare"), "bare");
    }
}
