//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Assignable user role, mapped onto the two role flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Normal,
    Staff,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Normal => "normal",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }

    /// Flag pair (is_staff, is_admin) this role maps to
    pub fn flags(&self) -> (bool, bool) {
        match self {
            Role::Normal => (false, false),
            Role::Staff => (true, false),
            Role::Admin => (true, true),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    /// Student or staff number, 4-23 digits, unique
    pub username: String,
    pub display_name: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    /// Back-office access
    pub is_staff: bool,
    /// Full administrative rights
    pub is_admin: bool,
    /// True until the forced password change after first login
    pub first_login: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Short user representation for lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserShort {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_admin: bool,
    pub first_login: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// User query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    /// Search in username and display name
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create user request; a missing password is generated from the site policy
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 4, max = 23, message = "Username must be 4-23 digits"))]
    pub username: String,
    pub display_name: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    pub role: Option<Role>,
}

/// Update user request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUser {
    pub display_name: Option<String>,
    pub is_active: Option<bool>,
    pub role: Option<Role>,
}

/// Created user with its one-time initial password
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedUser {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    /// Returned exactly once, never stored in clear
    pub password: String,
}

/// Bulk create request (structured entries, no file upload)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkCreateUsers {
    #[validate(length(min = 1, message = "At least one user is required"))]
    #[validate(nested)]
    pub users: Vec<BulkUserEntry>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct BulkUserEntry {
    #[validate(length(min = 4, max = 23, message = "Username must be 4-23 digits"))]
    pub username: String,
    pub display_name: Option<String>,
}

/// Bulk create response
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkCreateResponse {
    pub created: Vec<CreatedUser>,
    /// Usernames skipped because they already exist
    pub skipped_existing: i64,
}

/// Selection of users for bulk reset/delete
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkUserIds {
    #[validate(length(min = 1, message = "At least one user id is required"))]
    pub user_ids: Vec<i32>,
}

/// One regenerated credential from a bulk password reset
#[derive(Debug, Serialize, ToSchema)]
pub struct ResetCredential {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkResetResponse {
    pub reset: Vec<ResetCredential>,
    /// Administrators are never reset in bulk
    pub skipped_admins: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkDeleteResponse {
    pub deleted: i64,
    /// Administrators are never deleted in bulk
    pub skipped_admins: i64,
}

/// Bulk role assignment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BulkRoleUpdate {
    #[validate(length(min = 1, message = "At least one user id is required"))]
    pub user_ids: Vec<i32>,
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkRoleResponse {
    pub updated: i64,
    /// Existing administrators are never demoted in bulk
    pub skipped_admins: i64,
}

/// Change own password request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePassword {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub is_staff: bool,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Back-office capability from the role flags
    pub fn can_manage(&self) -> bool {
        self.is_staff || self.is_admin
    }

    /// Require staff privileges (activity and record management)
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.can_manage() {
            Ok(())
        } else {
            Err(AppError::Authorization("Staff privileges required".to_string()))
        }
    }

    /// Require admin privileges (user and settings management)
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }
}
