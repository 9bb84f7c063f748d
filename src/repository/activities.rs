//! Activities repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::activity::{Activity, ActivityQuery, ActivitySummary, NewActivity},
};

#[derive(Clone)]
pub struct ActivitiesRepository {
    pool: Pool<Postgres>,
}

impl ActivitiesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get activity by ID if it exists
    pub async fn get_optional(&self, id: i32) -> AppResult<Option<Activity>> {
        let activity = sqlx::query_as::<_, Activity>("SELECT * FROM activities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(activity)
    }

    /// Get activity by ID
    pub async fn get(&self, id: i32) -> AppResult<Activity> {
        self.get_optional(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity with id {} not found", id)))
    }

    /// Search activities with pagination
    pub async fn search(&self, query: &ActivityQuery) -> AppResult<(Vec<ActivitySummary>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref name) = query.name {
            params.push(format!("%{}%", name.to_lowercase()));
            conditions.push(format!("LOWER(a.name) LIKE ${}", params.len()));
        }

        if let Some(active) = query.active {
            conditions.push(format!("a.active = {}", active));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM activities a {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            r#"
            SELECT a.id, a.name, a.start_time, a.end_time, a.repeat_mode,
                   a.location_enabled, a.qr_enabled, a.active, a.created_at,
                   (SELECT COUNT(*) FROM participations p WHERE p.activity_id = a.id) as participant_count,
                   (SELECT COUNT(*) FROM checkin_records r WHERE r.activity_id = a.id) as checkin_count
            FROM activities a
            {}
            ORDER BY a.created_at DESC
            LIMIT {} OFFSET {}
            "#,
            where_clause, per_page, offset
        );

        let mut select_builder = sqlx::query_as::<_, ActivitySummary>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let activities = select_builder.fetch_all(&self.pool).await?;

        Ok((activities, total))
    }

    /// Active activities the user is enrolled in with eligibility
    pub async fn list_for_participant(&self, user_id: i32) -> AppResult<Vec<Activity>> {
        let activities = sqlx::query_as::<_, Activity>(
            r#"
            SELECT a.*
            FROM activities a
            JOIN participations p ON p.activity_id = a.id
            WHERE p.user_id = $1 AND p.can_participate = TRUE AND a.active = TRUE
            ORDER BY a.start_time DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }

    /// Create a new activity
    pub async fn create(&self, activity: &NewActivity) -> AppResult<Activity> {
        let created = sqlx::query_as::<_, Activity>(
            r#"
            INSERT INTO activities (
                name, description, start_time, end_time, repeat_mode, repeat_weekdays,
                window_start, window_end, location_enabled, location_lat, location_lng,
                location_radius_m, qr_enabled, qr_refresh_interval_s, qr_secret, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(&activity.name)
        .bind(&activity.description)
        .bind(activity.start_time)
        .bind(activity.end_time)
        .bind(activity.repeat_mode)
        .bind(&activity.repeat_weekdays)
        .bind(activity.window_start)
        .bind(activity.window_end)
        .bind(activity.location_enabled)
        .bind(activity.location_lat)
        .bind(activity.location_lng)
        .bind(activity.location_radius_m)
        .bind(activity.qr_enabled)
        .bind(activity.qr_refresh_interval_s)
        .bind(&activity.qr_secret)
        .bind(activity.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update an activity's editable columns (the secret is immutable)
    pub async fn update(&self, activity: &Activity) -> AppResult<Activity> {
        sqlx::query_as::<_, Activity>(
            r#"
            UPDATE activities SET
                name = $1, description = $2, start_time = $3, end_time = $4,
                repeat_mode = $5, repeat_weekdays = $6, window_start = $7, window_end = $8,
                location_enabled = $9, location_lat = $10, location_lng = $11,
                location_radius_m = $12, qr_enabled = $13, qr_refresh_interval_s = $14,
                active = $15
            WHERE id = $16
            RETURNING *
            "#,
        )
        .bind(&activity.name)
        .bind(&activity.description)
        .bind(activity.start_time)
        .bind(activity.end_time)
        .bind(activity.repeat_mode)
        .bind(&activity.repeat_weekdays)
        .bind(activity.window_start)
        .bind(activity.window_end)
        .bind(activity.location_enabled)
        .bind(activity.location_lat)
        .bind(activity.location_lng)
        .bind(activity.location_radius_m)
        .bind(activity.qr_enabled)
        .bind(activity.qr_refresh_interval_s)
        .bind(activity.active)
        .bind(activity.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Activity with id {} not found", activity.id)))
    }

    /// Manual early close: disable and pull the end instant to `now`
    pub async fn close(&self, id: i32, now: DateTime<Utc>) -> AppResult<Activity> {
        sqlx::query_as::<_, Activity>(
            "UPDATE activities SET active = FALSE, end_time = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Activity with id {} not found", id)))
    }

    /// Delete an activity (participations and records go with it)
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM activities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Activity with id {} not found", id)));
        }
        Ok(())
    }

    /// Disable activities whose end instant has passed; returns how many
    pub async fn close_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE activities SET active = FALSE WHERE active = TRUE AND end_time IS NOT NULL AND end_time < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
