use chrono::{DateTime, Duration, Utc};

/// How long an upload stays downloadable.
pub const DEFAULT_TTL_HOURS: i64 = 48;

pub fn default_ttl() -> Duration {
    Duration::hours(DEFAULT_TTL_HOURS)
}

/// Expiration for a record created right now with the default TTL.
pub fn calculate_expiration_date() -> DateTime<Utc> {
    expiration_from(Utc::now(), default_ttl())
}

pub fn expiration_from(created_at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    created_at + ttl
}

/// A record is expired strictly after its `expires_at` instant.
pub fn is_expired(expires_at: DateTime<Utc>) -> bool {
    is_expired_at(expires_at, Utc::now())
}

pub fn is_expired_at(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > expires_at
}
