use std::time::Duration;

/// Requested lifetime of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiration {
    /// Use the store's configured default expiration.
    #[default]
    Default,
    /// Never expire.
    Forever,
    /// Expire after the given duration.
    After(Duration),
}

impl From<Duration> for Expiration {
    fn from(duration: Duration) -> Self {
        Expiration::After(duration)
    }
}

/// Resolve the sentinels against a store's default expiration.
///
/// The result is what backends hand to their expiry mechanism, where
/// `Duration::ZERO` means "no expiry".
pub fn normalize_expire(requested: Expiration, default_expiration: Duration) -> Duration {
    match requested {
        Expiration::Default => default_expiration,
        Expiration::Forever => Duration::ZERO,
        Expiration::After(duration) => duration,
    }
}
