//! Rotating QR check-in tokens
//!
//! Tokens are derived from the activity's secret and the current time slot,
//! so the presenter screen and the verifier agree without shared state. A
//! token is only accepted during the slot it was generated in.

use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::models::activity::Activity;

/// Floor applied to configured refresh intervals, in seconds
pub const MIN_REFRESH_INTERVAL_S: i64 = 10;

/// Hex characters kept from the digest
pub const TOKEN_LEN: usize = 24;

/// Effective rotation interval for an activity, never below the floor.
pub fn refresh_interval(activity: &Activity) -> i64 {
    i64::from(activity.qr_refresh_interval_s).max(MIN_REFRESH_INTERVAL_S)
}

/// Time slot index that `instant` falls into for the given activity.
pub fn current_slot(activity: &Activity, instant: DateTime<Utc>) -> i64 {
    instant.timestamp().div_euclid(refresh_interval(activity))
}

fn token_for_slot(secret: &str, slot: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", secret, slot).as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..TOKEN_LEN].to_string()
}

/// Token valid at `instant`, or None when the activity has no secret.
pub fn current_token(activity: &Activity, instant: DateTime<Utc>) -> Option<String> {
    if activity.qr_secret.is_empty() {
        return None;
    }
    Some(token_for_slot(&activity.qr_secret, current_slot(activity, instant)))
}

/// Verifies a submitted token against the current slot only. Expired
/// tokens from earlier slots are rejected; there is no grace window.
pub fn is_valid(activity: &Activity, submitted: &str, instant: DateTime<Utc>) -> bool {
    if !activity.qr_enabled || submitted.is_empty() {
        return false;
    }
    match current_token(activity, instant) {
        Some(expected) => expected == submitted,
        None => false,
    }
}

/// Fresh 256-bit secret, hex encoded.
pub fn generate_secret() -> String {
    let mut buf = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}
