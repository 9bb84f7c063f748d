//! Business logic services

pub mod activities;
pub mod checkin;
pub mod settings;
pub mod stats;
pub mod users;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub activities: activities::ActivitiesService,
    pub checkin: checkin::CheckinService,
    pub users: users::UsersService,
    pub stats: stats::StatsService,
    pub settings: settings::SettingsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            activities: activities::ActivitiesService::new(repository.clone()),
            checkin: checkin::CheckinService::new(repository.clone()),
            users: users::UsersService::new(repository.clone(), auth_config),
            stats: stats::StatsService::new(repository.clone()),
            settings: settings::SettingsService::new(repository),
        }
    }
}
