//! Participant check-in endpoints

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    checkin::RejectReason,
    error::AppResult,
    models::activity::DashboardActivity,
    services::checkin::{CheckinOutcome, CheckinRequest},
};

use super::AuthenticatedUser;

/// Check-in request body; all proof fields are optional and only
/// consulted when the activity requires them
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckInBody {
    /// Device latitude in decimal degrees
    pub lat: Option<f64>,
    /// Device longitude in decimal degrees
    pub lng: Option<f64>,
    /// Scanned QR token
    pub qr_token: Option<String>,
}

/// Check-in attempt result
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckInResponse {
    pub accepted: bool,
    /// Stable rejection code, absent on acceptance
    pub reason: Option<String>,
    /// Human-readable rejection message, absent on acceptance
    pub message: Option<String>,
    pub checkin_time: Option<DateTime<Utc>>,
}

/// List activities on the caller's dashboard
#[utoipa::path(
    get,
    path = "/checkin/activities",
    tag = "checkin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Enrolled activities with live open state", body = Vec<DashboardActivity>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn dashboard(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<DashboardActivity>>> {
    let activities = state.services.checkin.dashboard(claims.user_id).await?;
    Ok(Json(activities))
}

/// Attempt to check in to an activity
#[utoipa::path(
    post,
    path = "/checkin/activities/{id}",
    tag = "checkin",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Activity ID")
    ),
    request_body = CheckInBody,
    responses(
        (status = 200, description = "Check-in accepted", body = CheckInResponse),
        (status = 403, description = "Not on the participant list", body = CheckInResponse),
        (status = 404, description = "Activity not found", body = CheckInResponse),
        (status = 409, description = "Already checked in", body = CheckInResponse),
        (status = 422, description = "Check-in requirement not met", body = CheckInResponse)
    )
)]
pub async fn check_in(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<CheckInBody>,
) -> AppResult<(StatusCode, Json<CheckInResponse>)> {
    let request = CheckinRequest {
        activity_id: id,
        user_id: claims.user_id,
        coordinate: body.lat.zip(body.lng),
        qr_token: body.qr_token,
        ip_address: Some(client_ip(&headers, peer)),
        user_agent: headers
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string(),
    };

    let outcome = state.services.checkin.attempt(&request).await?;

    match outcome {
        CheckinOutcome::Accepted(record) => Ok((
            StatusCode::OK,
            Json(CheckInResponse {
                accepted: true,
                reason: None,
                message: None,
                checkin_time: Some(record.checkin_time),
            }),
        )),
        CheckinOutcome::Rejected(reason) => Ok((
            reject_status(reason),
            Json(CheckInResponse {
                accepted: false,
                reason: Some(reason.as_str().to_string()),
                message: Some(reason.message().to_string()),
                checkin_time: None,
            }),
        )),
    }
}

/// HTTP status a rejection maps to
fn reject_status(reason: RejectReason) -> StatusCode {
    match reason {
        RejectReason::ActivityNotFound => StatusCode::NOT_FOUND,
        RejectReason::NotEligible => StatusCode::FORBIDDEN,
        RejectReason::AlreadyCheckedIn => StatusCode::CONFLICT,
        RejectReason::ActivityClosed
        | RejectReason::MissingOrInvalidLocation
        | RejectReason::OutsideGeofence
        | RejectReason::InvalidOrExpiredQrToken => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Client address, preferring the first hop recorded by a proxy
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "192.0.2.10:54321".parse().unwrap()
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, peer()), "203.0.113.7");
    }

    #[test]
    fn test_client_ip_falls_back_to_peer() {
        let headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, peer()), "192.0.2.10");
    }

    #[test]
    fn test_client_ip_ignores_empty_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        assert_eq!(client_ip(&headers, peer()), "192.0.2.10");
    }

    #[test]
    fn test_reject_status_mapping() {
        assert_eq!(
            reject_status(RejectReason::ActivityNotFound),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            reject_status(RejectReason::NotEligible),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            reject_status(RejectReason::AlreadyCheckedIn),
            StatusCode::CONFLICT
        );
        assert_eq!(
            reject_status(RejectReason::ActivityClosed),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            reject_status(RejectReason::OutsideGeofence),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
