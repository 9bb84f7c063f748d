//! Participation (enrollment) model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Enrollment of one user in one activity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Participation {
    pub id: i32,
    pub activity_id: i32,
    pub user_id: i32,
    /// False suspends eligibility without deleting the association
    pub can_participate: bool,
}

/// Enrolled user as shown in the activity detail view
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ParticipantEntry {
    pub user_id: i32,
    pub username: String,
    pub display_name: String,
    pub can_participate: bool,
}

/// Toggle one enrollment's eligibility
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateParticipation {
    pub can_participate: bool,
}
