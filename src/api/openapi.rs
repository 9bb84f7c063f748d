//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{activities, auth, checkin, health, settings, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rollcall API",
        version = "1.0.0",
        description = "Campus activity check-in REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        auth::change_password,
        // Check-in
        checkin::dashboard,
        checkin::check_in,
        // Activities
        activities::list_activities,
        activities::create_activity,
        activities::get_activity,
        activities::update_activity,
        activities::delete_activity,
        activities::close_activity,
        activities::qr_token,
        activities::update_participant,
        activities::activity_stats,
        activities::export_stats,
        activities::update_record_status,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::bulk_create_users,
        users::bulk_reset_passwords,
        users::bulk_delete_users,
        users::bulk_update_role,
        // Settings
        settings::get_settings,
        settings::update_settings,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            crate::models::user::ChangePassword,
            // Check-in
            checkin::CheckInBody,
            checkin::CheckInResponse,
            crate::checkin::RejectReason,
            crate::models::activity::DashboardActivity,
            // Activities
            crate::models::activity::Activity,
            crate::models::activity::ActivitySummary,
            crate::models::activity::RepeatMode,
            crate::models::activity::CreateActivity,
            crate::models::activity::UpdateActivity,
            activities::ActivityDetail,
            activities::QrTokenResponse,
            crate::models::participation::Participation,
            crate::models::participation::ParticipantEntry,
            crate::models::participation::UpdateParticipation,
            // Records
            crate::models::record::CheckInRecord,
            crate::models::record::CheckInStatus,
            crate::models::record::UpdateRecordStatus,
            crate::models::record::CheckedEntry,
            crate::models::record::UncheckedEntry,
            crate::models::record::ActivityStats,
            // Users
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::Role,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::user::CreatedUser,
            crate::models::user::BulkCreateUsers,
            crate::models::user::BulkUserEntry,
            crate::models::user::BulkCreateResponse,
            crate::models::user::BulkUserIds,
            crate::models::user::ResetCredential,
            crate::models::user::BulkResetResponse,
            crate::models::user::BulkDeleteResponse,
            crate::models::user::BulkRoleUpdate,
            crate::models::user::BulkRoleResponse,
            // Settings
            crate::models::settings::SiteSettings,
            crate::models::settings::UpdateSiteSettings,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "checkin", description = "Participant check-in"),
        (name = "activities", description = "Activity management"),
        (name = "users", description = "User management"),
        (name = "settings", description = "Site settings")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
