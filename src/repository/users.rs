//! Users repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{User, UserQuery, UserShort},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by username (primary authentication lookup)
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Check if username already exists
    pub async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// True when at least one administrator account exists
    pub async fn admin_exists(&self) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE is_admin = TRUE)")
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Which of the given usernames are already taken
    pub async fn existing_usernames(&self, usernames: &[String]) -> AppResult<Vec<String>> {
        let existing: Vec<String> =
            sqlx::query_scalar("SELECT username FROM users WHERE username = ANY($1)")
                .bind(usernames)
                .fetch_all(&self.pool)
                .await?;
        Ok(existing)
    }

    /// Search users with pagination
    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<UserShort>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref q) = query.q {
            params.push(format!("%{}%", q.to_lowercase()));
            conditions.push(format!(
                "(username LIKE ${} OR LOWER(display_name) LIKE ${})",
                params.len(),
                params.len()
            ));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM users {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            r#"
            SELECT id, username, display_name, is_active, is_staff, is_admin,
                   first_login, created_at, last_login
            FROM users
            {}
            ORDER BY username
            LIMIT {} OFFSET {}
            "#,
            where_clause, per_page, offset
        );

        let mut select_builder = sqlx::query_as::<_, UserShort>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let users = select_builder.fetch_all(&self.pool).await?;

        Ok((users, total))
    }

    /// Create a new user
    pub async fn create(
        &self,
        username: &str,
        display_name: &str,
        password_hash: &str,
        is_staff: bool,
        is_admin: bool,
    ) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, display_name, password_hash, is_staff, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(display_name)
        .bind(password_hash)
        .bind(is_staff)
        .bind(is_admin)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update display name and active flag
    pub async fn update(
        &self,
        id: i32,
        display_name: Option<&str>,
        is_active: Option<bool>,
    ) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                display_name = COALESCE($2, display_name),
                is_active = COALESCE($3, is_active)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(display_name)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Replace the password hash; `first_login` marks whether the user must
    /// change it at next login
    pub async fn update_password(
        &self,
        id: i32,
        password_hash: &str,
        first_login: bool,
    ) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, first_login = $3 WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .bind(first_login)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    /// Stamp a successful login
    pub async fn update_last_login(&self, id: i32, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Set role flags
    pub async fn update_role(&self, id: i32, is_staff: bool, is_admin: bool) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET is_staff = $2, is_admin = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_staff)
        .bind(is_admin)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Delete a user
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    /// Users among the given IDs, in ID order
    pub async fn get_many(&self, ids: &[i32]) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1) ORDER BY id")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Delete the given users, refusing admins; returns how many went
    pub async fn delete_many_non_admin(&self, ids: &[i32]) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM users WHERE id = ANY($1) AND is_admin = FALSE")
            .bind(ids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Set role flags on the given users, refusing admins; returns how many
    /// changed
    pub async fn update_role_many_non_admin(
        &self,
        ids: &[i32],
        is_staff: bool,
        is_admin: bool,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE users SET is_staff = $2, is_admin = $3 WHERE id = ANY($1) AND is_admin = FALSE",
        )
        .bind(ids)
        .bind(is_staff)
        .bind(is_admin)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
