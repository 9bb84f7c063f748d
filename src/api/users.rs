//! User management endpoints (admin)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::user::{
        BulkCreateResponse, BulkCreateUsers, BulkDeleteResponse, BulkResetResponse,
        BulkRoleResponse, BulkRoleUpdate, BulkUserIds, CreateUser, CreatedUser, UpdateUser, User,
        UserQuery, UserShort,
    },
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List users with search and pagination
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("q" = Option<String>, Query, description = "Search in username and display name"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "List of users", body = PaginatedResponse<UserShort>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<PaginatedResponse<UserShort>>> {
    claims.require_admin()?;

    let (users, total) = state.services.users.search(&query).await?;

    Ok(Json(PaginatedResponse {
        items: users,
        total,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    }))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<User>> {
    claims.require_admin()?;

    let user = state.services.users.get_by_id(id).await?;
    Ok(Json(user))
}

/// Create a new user; a missing password is generated from the site policy
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created, initial password included", body = CreatedUser),
        (status = 400, description = "Invalid username"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<CreatedUser>)> {
    claims.require_admin()?;

    let created = state.services.users.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateUser>,
) -> AppResult<Json<User>> {
    claims.require_admin()?;

    let updated = state.services.users.update_user(id, request).await?;
    Ok(Json(updated))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Administrators cannot be deleted")
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_admin()?;

    state.services.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create users in bulk from structured entries
#[utoipa::path(
    post,
    path = "/users/bulk",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = BulkCreateUsers,
    responses(
        (status = 200, description = "Created users with their initial passwords", body = BulkCreateResponse),
        (status = 400, description = "Invalid username in the batch")
    )
)]
pub async fn bulk_create_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BulkCreateUsers>,
) -> AppResult<Json<BulkCreateResponse>> {
    claims.require_admin()?;

    let response = state.services.users.bulk_create(request).await?;
    Ok(Json(response))
}

/// Reset passwords for the selected users
#[utoipa::path(
    post,
    path = "/users/bulk-reset",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = BulkUserIds,
    responses(
        (status = 200, description = "Regenerated credentials", body = BulkResetResponse)
    )
)]
pub async fn bulk_reset_passwords(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BulkUserIds>,
) -> AppResult<Json<BulkResetResponse>> {
    claims.require_admin()?;

    let response = state.services.users.bulk_reset(request).await?;
    Ok(Json(response))
}

/// Delete the selected users, skipping administrators
#[utoipa::path(
    post,
    path = "/users/bulk-delete",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = BulkUserIds,
    responses(
        (status = 200, description = "Deletion summary", body = BulkDeleteResponse)
    )
)]
pub async fn bulk_delete_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BulkUserIds>,
) -> AppResult<Json<BulkDeleteResponse>> {
    claims.require_admin()?;

    let response = state.services.users.bulk_delete(request).await?;
    Ok(Json(response))
}

/// Assign a role to the selected users, skipping existing administrators
#[utoipa::path(
    put,
    path = "/users/bulk-role",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = BulkRoleUpdate,
    responses(
        (status = 200, description = "Role assignment summary", body = BulkRoleResponse)
    )
)]
pub async fn bulk_update_role(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BulkRoleUpdate>,
) -> AppResult<Json<BulkRoleResponse>> {
    claims.require_admin()?;

    let response = state.services.users.bulk_role(request).await?;
    Ok(Json(response))
}
