//! Site settings endpoints (admin)

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::settings::{SiteSettings, UpdateSiteSettings},
};

use super::AuthenticatedUser;

/// Get site settings
#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current settings", body = SiteSettings),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn get_settings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<SiteSettings>> {
    claims.require_admin()?;

    let settings = state.services.settings.get().await?;
    Ok(Json(settings))
}

/// Update site settings
#[utoipa::path(
    put,
    path = "/settings",
    tag = "settings",
    security(("bearer_auth" = [])),
    request_body = UpdateSiteSettings,
    responses(
        (status = 200, description = "Settings updated", body = SiteSettings),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn update_settings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdateSiteSettings>,
) -> AppResult<Json<SiteSettings>> {
    claims.require_admin()?;

    let settings = state.services.settings.update(request).await?;
    Ok(Json(settings))
}
