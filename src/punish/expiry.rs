//! Lazy expiration.
//!
//! Punishments are never swept on a timer. Readers call [`check_expiry`]
//! and pardon whatever comes back [`ExpiryCheck::Expired`].

use super::types::Punishment;

/// Outcome of checking a punishment against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryCheck {
    /// Still in force.
    Active,
    /// Lapsed; the caller must pardon it.
    Expired,
}

/// Check a punishment against `now` (unix seconds).
pub fn check_expiry(punishment: &Punishment, now: i64) -> ExpiryCheck {
    match punishment.expires_at {
        Some(expires) if now > expires => ExpiryCheck::Expired,
        _ => ExpiryCheck::Active,
    }
}

/// Current unix time in seconds.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expiring(at: Option<i64>) -> Punishment {
        Punishment::new(Some("Test".into()), at, 1)
    }

    #[test]
    fn test_expiration() {
        let now = now();

        assert_eq!(check_expiry(&expiring(Some(now - 3600)), now), ExpiryCheck::Expired);
        assert_eq!(check_expiry(&expiring(Some(now - 1)), now), ExpiryCheck::Expired);
        assert_eq!(check_expiry(&expiring(Some(now + 3600)), now), ExpiryCheck::Active);
        assert_eq!(check_expiry(&expiring(None), now), ExpiryCheck::Active);
    }

    #[test]
    fn expiry_instant_itself_is_still_active() {
        assert_eq!(check_expiry(&expiring(Some(100)), 100), ExpiryCheck::Active);
        assert_eq!(check_expiry(&expiring(Some(100)), 101), ExpiryCheck::Expired);
    }
}
