//! Site settings service

use crate::{
    error::AppResult,
    models::settings::{SiteSettings, UpdateSiteSettings},
    repository::Repository,
};

#[derive(Clone)]
pub struct SettingsService {
    repository: Repository,
}

impl SettingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Current settings; defaults if the row was never seeded
    pub async fn get(&self) -> AppResult<SiteSettings> {
        Ok(self.repository.settings.get().await?.unwrap_or_default())
    }

    /// Update settings, keeping unspecified fields
    pub async fn update(&self, update: UpdateSiteSettings) -> AppResult<SiteSettings> {
        self.repository.settings.update(&update).await
    }
}
