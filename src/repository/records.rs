//! Check-in records repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::record::{CheckInRecord, CheckInStatus, CheckedEntry, UncheckedEntry},
};

/// Insert payload for a new check-in record
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub activity_id: i32,
    pub user_id: i32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub ip_address: Option<String>,
    pub user_agent: String,
}

#[derive(Clone)]
pub struct RecordsRepository {
    pool: Pool<Postgres>,
}

impl RecordsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// True when a record already exists for the pair
    pub async fn exists(&self, activity_id: i32, user_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM checkin_records WHERE activity_id = $1 AND user_id = $2)",
        )
        .bind(activity_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Get record by ID
    pub async fn get(&self, id: i32) -> AppResult<CheckInRecord> {
        sqlx::query_as::<_, CheckInRecord>("SELECT * FROM checkin_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Record with id {} not found", id)))
    }

    /// All records belonging to one user, across activities
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<CheckInRecord>> {
        let records = sqlx::query_as::<_, CheckInRecord>(
            "SELECT * FROM checkin_records WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Insert a new record with status `present`.
    ///
    /// The unique index on `(activity_id, user_id)` is the final authority
    /// on duplicates; callers inspect the error for a unique violation.
    pub async fn insert(&self, record: &NewRecord) -> AppResult<CheckInRecord> {
        let created = sqlx::query_as::<_, CheckInRecord>(
            r#"
            INSERT INTO checkin_records (
                activity_id, user_id, latitude, longitude, ip_address, user_agent, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(record.activity_id)
        .bind(record.user_id)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(&record.ip_address)
        .bind(&record.user_agent)
        .bind(CheckInStatus::Present)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Checked-in participants for an activity, newest last
    pub async fn list_checked(&self, activity_id: i32) -> AppResult<Vec<CheckedEntry>> {
        let entries = sqlx::query_as::<_, CheckedEntry>(
            r#"
            SELECT r.id as record_id, r.user_id, u.username, u.display_name,
                   r.checkin_time, r.ip_address, r.status, r.status_note
            FROM checkin_records r
            JOIN users u ON u.id = r.user_id
            WHERE r.activity_id = $1
            ORDER BY r.checkin_time
            "#,
        )
        .bind(activity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Enrolled participants without a record for an activity
    pub async fn list_unchecked(&self, activity_id: i32) -> AppResult<Vec<UncheckedEntry>> {
        let entries = sqlx::query_as::<_, UncheckedEntry>(
            r#"
            SELECT p.user_id, u.username, u.display_name
            FROM participations p
            JOIN users u ON u.id = p.user_id
            WHERE p.activity_id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM checkin_records r
                  WHERE r.activity_id = p.activity_id AND r.user_id = p.user_id
              )
            ORDER BY u.username
            "#,
        )
        .bind(activity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Administrative attendance override
    pub async fn update_status(
        &self,
        id: i32,
        status: CheckInStatus,
        status_note: &str,
    ) -> AppResult<CheckInRecord> {
        sqlx::query_as::<_, CheckInRecord>(
            "UPDATE checkin_records SET status = $2, status_note = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(status_note)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Record with id {} not found", id)))
    }
}
