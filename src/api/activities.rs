//! Activity management endpoints (staff)

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::activity::{Activity, ActivityQuery, ActivitySummary, CreateActivity, UpdateActivity},
    models::participation::{Participation, ParticipantEntry, UpdateParticipation},
    models::record::{ActivityStats, CheckInRecord, UpdateRecordStatus},
    services::stats::ExportKind,
};

use super::{AuthenticatedUser, PaginatedResponse};

/// Activity with its enrolled participants
#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityDetail {
    pub activity: Activity,
    pub participants: Vec<ParticipantEntry>,
}

/// Rotating token for the presenter screen
#[derive(Debug, Serialize, ToSchema)]
pub struct QrTokenResponse {
    pub token: String,
    /// Rotation interval in seconds
    pub interval_s: i64,
    /// Seconds until the current token rotates away
    pub expires_in_s: i64,
}

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    /// `checked` (default) or `unchecked`
    pub kind: Option<String>,
}

/// List activities with search and pagination
#[utoipa::path(
    get,
    path = "/activities",
    tag = "activities",
    security(("bearer_auth" = [])),
    params(
        ("name" = Option<String>, Query, description = "Search in activity name"),
        ("active" = Option<bool>, Query, description = "Filter by active flag"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "List of activities", body = PaginatedResponse<ActivitySummary>),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn list_activities(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<PaginatedResponse<ActivitySummary>>> {
    claims.require_staff()?;

    let (activities, total) = state.services.activities.search(&query).await?;

    Ok(Json(PaginatedResponse {
        items: activities,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// Create a new activity
#[utoipa::path(
    post,
    path = "/activities",
    tag = "activities",
    security(("bearer_auth" = [])),
    request_body = CreateActivity,
    responses(
        (status = 201, description = "Activity created", body = Activity),
        (status = 400, description = "Invalid schedule"),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn create_activity(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateActivity>,
) -> AppResult<(StatusCode, Json<Activity>)> {
    claims.require_staff()?;

    let activity = state
        .services
        .activities
        .create(request, claims.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

/// Get activity details with the participant list
#[utoipa::path(
    get,
    path = "/activities/{id}",
    tag = "activities",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Activity ID")
    ),
    responses(
        (status = 200, description = "Activity details", body = ActivityDetail),
        (status = 404, description = "Activity not found")
    )
)]
pub async fn get_activity(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ActivityDetail>> {
    claims.require_staff()?;

    let detail = state.services.activities.get_detail(id).await?;
    Ok(Json(detail))
}

/// Update an existing activity
#[utoipa::path(
    put,
    path = "/activities/{id}",
    tag = "activities",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Activity ID")
    ),
    request_body = UpdateActivity,
    responses(
        (status = 200, description = "Activity updated", body = Activity),
        (status = 400, description = "Invalid schedule"),
        (status = 404, description = "Activity not found")
    )
)]
pub async fn update_activity(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateActivity>,
) -> AppResult<Json<Activity>> {
    claims.require_staff()?;

    let activity = state.services.activities.update(id, request).await?;
    Ok(Json(activity))
}

/// Delete an activity with its enrollment and records
#[utoipa::path(
    delete,
    path = "/activities/{id}",
    tag = "activities",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Activity ID")
    ),
    responses(
        (status = 204, description = "Activity deleted"),
        (status = 404, description = "Activity not found")
    )
)]
pub async fn delete_activity(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;

    state.services.activities.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Close an activity ahead of schedule
#[utoipa::path(
    post,
    path = "/activities/{id}/close",
    tag = "activities",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Activity ID")
    ),
    responses(
        (status = 200, description = "Activity closed", body = Activity),
        (status = 404, description = "Activity not found")
    )
)]
pub async fn close_activity(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Activity>> {
    claims.require_staff()?;

    let activity = state.services.activities.close(id).await?;
    Ok(Json(activity))
}

/// Current QR token for the presenter screen
#[utoipa::path(
    get,
    path = "/activities/{id}/qr-token",
    tag = "activities",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Activity ID")
    ),
    responses(
        (status = 200, description = "Current token with rotation metadata", body = QrTokenResponse),
        (status = 404, description = "Activity not found"),
        (status = 422, description = "QR check-in not enabled")
    )
)]
pub async fn qr_token(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<QrTokenResponse>> {
    claims.require_staff()?;

    let token = state.services.activities.presenter_token(id).await?;
    Ok(Json(token))
}

/// Toggle one participant's eligibility
#[utoipa::path(
    put,
    path = "/activities/{id}/participants/{user_id}",
    tag = "activities",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Activity ID"),
        ("user_id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateParticipation,
    responses(
        (status = 200, description = "Eligibility updated", body = Participation),
        (status = 404, description = "Activity or enrollment not found")
    )
)]
pub async fn update_participant(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, user_id)): Path<(i32, i32)>,
    Json(request): Json<UpdateParticipation>,
) -> AppResult<Json<Participation>> {
    claims.require_staff()?;

    let participation = state
        .services
        .activities
        .set_participant_eligibility(id, user_id, request.can_participate)
        .await?;
    Ok(Json(participation))
}

/// Attendance statistics for one activity
#[utoipa::path(
    get,
    path = "/activities/{id}/stats",
    tag = "activities",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Activity ID")
    ),
    responses(
        (status = 200, description = "Attendance split", body = ActivityStats),
        (status = 404, description = "Activity not found")
    )
)]
pub async fn activity_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ActivityStats>> {
    claims.require_staff()?;

    let stats = state.services.stats.activity_stats(id).await?;
    Ok(Json(stats))
}

/// Export one side of the attendance split as CSV
#[utoipa::path(
    get,
    path = "/activities/{id}/stats/export",
    tag = "activities",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Activity ID"),
        ("kind" = Option<String>, Query, description = "checked (default) or unchecked")
    ),
    responses(
        (status = 200, description = "CSV document", body = String, content_type = "text/csv"),
        (status = 400, description = "Invalid export kind"),
        (status = 404, description = "Activity not found")
    )
)]
pub async fn export_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Query(params): Query<ExportParams>,
) -> AppResult<Response> {
    claims.require_staff()?;

    let kind = params
        .kind
        .as_deref()
        .unwrap_or("checked")
        .parse::<ExportKind>()
        .map_err(AppError::BadRequest)?;

    let (filename, body) = state.services.stats.export_csv(id, kind).await?;

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(body))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

/// Administrative attendance override on one record
#[utoipa::path(
    put,
    path = "/records/{id}/status",
    tag = "activities",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Record ID")
    ),
    request_body = UpdateRecordStatus,
    responses(
        (status = 200, description = "Record updated", body = CheckInRecord),
        (status = 404, description = "Record not found")
    )
)]
pub async fn update_record_status(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateRecordStatus>,
) -> AppResult<Json<CheckInRecord>> {
    claims.require_staff()?;

    let record = state
        .services
        .stats
        .override_record_status(id, request)
        .await?;
    Ok(Json(record))
}
