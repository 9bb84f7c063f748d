//! Site settings repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::settings::{SiteSettings, UpdateSiteSettings},
};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: Pool<Postgres>,
}

impl SettingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// The singleton settings row, if seeded
    pub async fn get(&self) -> AppResult<Option<SiteSettings>> {
        let settings =
            sqlx::query_as::<_, SiteSettings>("SELECT * FROM site_settings WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(settings)
    }

    /// Update the singleton row, keeping unspecified fields. The row is
    /// seeded by migration.
    pub async fn update(&self, update: &UpdateSiteSettings) -> AppResult<SiteSettings> {
        sqlx::query_as::<_, SiteSettings>(
            r#"
            UPDATE site_settings SET
                site_title = COALESCE($1, site_title),
                technician_contact = COALESCE($2, technician_contact),
                map_api_key = COALESCE($3, map_api_key),
                password_length = COALESCE($4, password_length),
                password_require_uppercase = COALESCE($5, password_require_uppercase),
                password_require_lowercase = COALESCE($6, password_require_lowercase),
                password_require_digits = COALESCE($7, password_require_digits),
                password_require_symbols = COALESCE($8, password_require_symbols),
                password_symbols = COALESCE($9, password_symbols)
            WHERE id = 1
            RETURNING *
            "#,
        )
        .bind(&update.site_title)
        .bind(&update.technician_contact)
        .bind(&update.map_api_key)
        .bind(update.password_length)
        .bind(update.password_require_uppercase)
        .bind(update.password_require_lowercase)
        .bind(update.password_require_digits)
        .bind(update.password_require_symbols)
        .bind(&update.password_symbols)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Internal("Site settings row is missing".to_string()))
    }
}
