//! Anti-forgery tokens for the range-selection endpoint.
//!
//! A token is `hex(HMAC-SHA256(secret, "{tick}|{action}|{user}"))`, where `tick`
//! counts half-lifetimes since the epoch. A token verifies during the tick it
//! was issued in and the one after, so its useful life is between one half and
//! one full lifetime.
use chrono::{DateTime, Utc};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Action name the report's tokens are bound to.
pub const RANGE_ACTION: &str = "author_report.set_range";

pub struct NonceKeeper {
    /// MAC already keyed with the secret; cloned per token.
    keyed: HmacSha256,
    /// Half of the token lifetime, in seconds. Never zero.
    tick_secs: i64,
}

impl NonceKeeper {
    pub fn new(secret: &SecretString, lifetime_hours: u64) -> Result<Self, InvalidLength> {
        let keyed = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())?;
        let lifetime_secs = i64::try_from(lifetime_hours.saturating_mul(3600)).unwrap_or(i64::MAX);
        Ok(Self {
            keyed,
            tick_secs: (lifetime_secs / 2).max(1),
        })
    }

    fn tick(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp().div_euclid(self.tick_secs)
    }

    fn mac(&self, tick: i64, action: &str, user: &str) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(format!("{tick}|{action}|{user}").as_bytes());
        mac
    }

    /// Issue a token for `action` on behalf of `user`.
    pub fn issue(&self, action: &str, user: &str, now: DateTime<Utc>) -> String {
        let tag = self.mac(self.tick(now), action, user).finalize().into_bytes();
        hex::encode(tag)
    }

    /// Check a submitted token. Comparison is constant-time.
    pub fn verify(&self, action: &str, user: &str, token: &str, now: DateTime<Utc>) -> bool {
        let Ok(submitted) = hex::decode(token.trim()) else {
            return false;
        };
        let tick = self.tick(now);
        [tick, tick - 1]
            .into_iter()
            .any(|t| self.mac(t, action, user).verify_slice(&submitted).is_ok())
    }
}
