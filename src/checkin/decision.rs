//! Check-in decision ladder
//!
//! Combines the availability, geofence, and QR evaluators with the
//! caller-supplied participation/record snapshot into one terminal
//! decision. Evaluation order is fixed and short-circuits on the first
//! failure, so the reason a user sees is deterministic.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::checkin::{availability, geofence, qr};
use crate::models::activity::Activity;

/// Terminal outcome of a check-in attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    Rejected(RejectReason),
}

/// Why a check-in attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    ActivityNotFound,
    ActivityClosed,
    NotEligible,
    AlreadyCheckedIn,
    MissingOrInvalidLocation,
    OutsideGeofence,
    InvalidOrExpiredQrToken,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::ActivityNotFound => "activity_not_found",
            RejectReason::ActivityClosed => "activity_closed",
            RejectReason::NotEligible => "not_eligible",
            RejectReason::AlreadyCheckedIn => "already_checked_in",
            RejectReason::MissingOrInvalidLocation => "missing_or_invalid_location",
            RejectReason::OutsideGeofence => "outside_geofence",
            RejectReason::InvalidOrExpiredQrToken => "invalid_or_expired_qr_token",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::ActivityNotFound => "Activity not found",
            RejectReason::ActivityClosed => "Activity is not open for check-in right now",
            RejectReason::NotEligible => "You are not on the participant list for this activity",
            RejectReason::AlreadyCheckedIn => "You have already checked in to this activity",
            RejectReason::MissingOrInvalidLocation => {
                "A valid location is required to check in to this activity"
            }
            RejectReason::OutsideGeofence => "You are too far from the activity location",
            RejectReason::InvalidOrExpiredQrToken => "The QR code is invalid or has expired",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Evaluates one check-in attempt against a snapshot of state.
///
/// `eligible` and `already_checked_in` describe the `(activity, user)`
/// pair as read by the caller immediately before evaluation. Persisting
/// the record on `Accepted` is the caller's job; everything here is a
/// pure read.
pub fn evaluate(
    activity: Option<&Activity>,
    eligible: bool,
    already_checked_in: bool,
    coordinate: Option<(f64, f64)>,
    qr_token: Option<&str>,
    instant: DateTime<Utc>,
) -> Decision {
    let activity = match activity {
        Some(a) if a.active => a,
        _ => return Decision::Rejected(RejectReason::ActivityNotFound),
    };

    if !availability::is_open(activity, instant) {
        return Decision::Rejected(RejectReason::ActivityClosed);
    }

    if !eligible {
        return Decision::Rejected(RejectReason::NotEligible);
    }

    if already_checked_in {
        return Decision::Rejected(RejectReason::AlreadyCheckedIn);
    }

    if activity.location_enabled {
        let (lat, lng) = match coordinate {
            Some((lat, lng)) if lat.is_finite() && lng.is_finite() => (lat, lng),
            _ => return Decision::Rejected(RejectReason::MissingOrInvalidLocation),
        };
        if !geofence::within_radius(activity, lat, lng) {
            return Decision::Rejected(RejectReason::OutsideGeofence);
        }
    }

    if activity.qr_enabled && !qr::is_valid(activity, qr_token.unwrap_or_default(), instant) {
        return Decision::Rejected(RejectReason::InvalidOrExpiredQrToken);
    }

    Decision::Accepted
}
