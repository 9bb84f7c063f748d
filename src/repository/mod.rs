//! Repository layer for database operations

pub mod activities;
pub mod participations;
pub mod records;
pub mod settings;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub activities: activities::ActivitiesRepository,
    pub participations: participations::ParticipationsRepository,
    pub records: records::RecordsRepository,
    pub users: users::UsersRepository,
    pub settings: settings::SettingsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            activities: activities::ActivitiesRepository::new(pool.clone()),
            participations: participations::ParticipationsRepository::new(pool.clone()),
            records: records::RecordsRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            settings: settings::SettingsRepository::new(pool.clone()),
            pool,
        }
    }
}
