//! Site settings model (single-row table)

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Site-wide settings, including the initial-password generation policy
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SiteSettings {
    pub id: i32,
    pub site_title: String,
    pub technician_contact: String,
    pub map_api_key: String,
    /// Length of generated initial passwords
    pub password_length: i16,
    pub password_require_uppercase: bool,
    pub password_require_lowercase: bool,
    pub password_require_digits: bool,
    pub password_require_symbols: bool,
    /// Symbol pool for generated passwords
    pub password_symbols: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            id: 1,
            site_title: "Rollcall".to_string(),
            technician_contact: String::new(),
            map_api_key: String::new(),
            password_length: 12,
            password_require_uppercase: true,
            password_require_lowercase: true,
            password_require_digits: true,
            password_require_symbols: true,
            password_symbols: "!@#$%^&*".to_string(),
        }
    }
}

/// Update site settings request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSiteSettings {
    #[validate(length(min = 1, max = 100, message = "Site title must be 1-100 characters"))]
    pub site_title: Option<String>,
    pub technician_contact: Option<String>,
    pub map_api_key: Option<String>,
    #[validate(range(min = 6, max = 64, message = "Password length must be 6-64"))]
    pub password_length: Option<i16>,
    pub password_require_uppercase: Option<bool>,
    pub password_require_lowercase: Option<bool>,
    pub password_require_digits: Option<bool>,
    pub password_require_symbols: Option<bool>,
    pub password_symbols: Option<String>,
}
