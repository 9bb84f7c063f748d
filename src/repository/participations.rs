//! Participations repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::participation::{Participation, ParticipantEntry},
};

#[derive(Clone)]
pub struct ParticipationsRepository {
    pool: Pool<Postgres>,
}

impl ParticipationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// True when the user holds an eligible participation for the activity
    pub async fn is_eligible(&self, activity_id: i32, user_id: i32) -> AppResult<bool> {
        let eligible: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM participations WHERE activity_id = $1 AND user_id = $2 AND can_participate = TRUE)",
        )
        .bind(activity_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(eligible)
    }

    /// Enrolled users for an activity, with display info
    pub async fn list_for_activity(&self, activity_id: i32) -> AppResult<Vec<ParticipantEntry>> {
        let participants = sqlx::query_as::<_, ParticipantEntry>(
            r#"
            SELECT p.user_id, u.username, u.display_name, p.can_participate
            FROM participations p
            JOIN users u ON u.id = p.user_id
            WHERE p.activity_id = $1
            ORDER BY u.username
            "#,
        )
        .bind(activity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }

    /// Number of enrolled users for an activity
    pub async fn count_for_activity(&self, activity_id: i32) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM participations WHERE activity_id = $1")
                .bind(activity_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Replace the enrollment set: absent pairs are deleted, new pairs are
    /// inserted, pairs already present keep their eligibility flag.
    pub async fn replace_for_activity(&self, activity_id: i32, user_ids: &[i32]) -> AppResult<()> {
        sqlx::query("DELETE FROM participations WHERE activity_id = $1 AND user_id != ALL($2)")
            .bind(activity_id)
            .bind(user_ids)
            .execute(&self.pool)
            .await?;

        for user_id in user_ids {
            sqlx::query(
                r#"
                INSERT INTO participations (activity_id, user_id, can_participate)
                VALUES ($1, $2, TRUE)
                ON CONFLICT (activity_id, user_id) DO NOTHING
                "#,
            )
            .bind(activity_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    /// Flip one participant's eligibility without touching history
    pub async fn set_eligibility(
        &self,
        activity_id: i32,
        user_id: i32,
        can_participate: bool,
    ) -> AppResult<Participation> {
        sqlx::query_as::<_, Participation>(
            r#"
            UPDATE participations SET can_participate = $3
            WHERE activity_id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(activity_id)
        .bind(user_id)
        .bind(can_participate)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "User {} is not enrolled in activity {}",
                user_id, activity_id
            ))
        })
    }
}
