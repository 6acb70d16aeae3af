//! Anonymous login nickname generator.
//!
//! Twitch chat accepts read-only logins as `justinfan<digits>` with any
//! password, which lets the connector listen without credentials.

use rand::RngExt;

pub const ANONYMOUS_PREFIX: &str = "justinfan";

/// Placeholder token sent with anonymous logins.
pub const ANONYMOUS_ACCESS_CODE: &str = "anonymous";

/// Generate a nickname like `justinfan48213`.
pub fn anonymous_nickname() -> String {
    let mut rng = rand::rng();
    let num: u32 = rng.random_range(10_000..100_000);
    format!("{}{}", ANONYMOUS_PREFIX, num)
}

pub fn is_anonymous(nickname: &str) -> bool {
    nickname
        .strip_prefix(ANONYMOUS_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_nickname_shape() {
        for _ in 0..20 {
            let nick = anonymous_nickname();
            assert!(is_anonymous(&nick), "{}", nick);
            assert_eq!(nick.len(), ANONYMOUS_PREFIX.len() + 5);
        }
    }

    #[test]
    fn test_is_anonymous() {
        assert!(!is_anonymous("justinfan"));
        assert!(!is_anonymous("justinfanx1"));
        assert!(!is_anonymous("mybot"));
    }
}
