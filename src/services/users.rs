//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use regex::Regex;
use std::collections::HashSet;

use crate::{
    config::{AuthConfig, BootstrapConfig},
    error::{AppError, AppResult},
    models::settings::SiteSettings,
    models::user::{
        BulkCreateResponse, BulkCreateUsers, BulkDeleteResponse, BulkResetResponse,
        BulkRoleResponse, BulkRoleUpdate, BulkUserIds, CreateUser, CreatedUser, ResetCredential,
        Role, UpdateUser, User, UserClaims, UserQuery, UserShort,
    },
    repository::Repository,
};

/// Usernames are student/staff numbers: digits only, 4 to 23 of them
static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4,23}$").unwrap());

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Create the first administrator account on startup when none exists.
    /// Idempotent: does nothing once any administrator is present, or when
    /// the bootstrap credentials are not configured.
    pub async fn bootstrap_admin(&self, bootstrap: &BootstrapConfig) -> AppResult<Option<User>> {
        if bootstrap.admin_username.is_empty() || bootstrap.admin_password.is_empty() {
            return Ok(None);
        }

        if self.repository.users.admin_exists().await? {
            return Ok(None);
        }

        let hash = self.hash_password(&bootstrap.admin_password)?;
        let user = self
            .repository
            .users
            .create(&bootstrap.admin_username, "Administrator", &hash, true, true)
            .await?;
        // The bootstrap password is operator-chosen, not generated; skip the
        // forced change
        self.repository
            .users
            .update_password(user.id, &hash, false)
            .await?;

        tracing::info!("Bootstrap administrator '{}' created", user.username);
        Ok(Some(user))
    }

    /// Authenticate by username and password, returning a JWT and the user
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| {
                AppError::Authentication("Invalid username or password".to_string())
            })?;

        if !user.is_active {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication(
                "Invalid username or password".to_string(),
            ));
        }

        let now = Utc::now();
        self.repository.users.update_last_login(user.id, now).await?;

        let token = self.create_token_for(&user)?;

        Ok((token, user))
    }

    fn create_token_for(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + self.config.jwt_expiration_hours as i64 * 3600;

        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            is_staff: user.is_staff,
            is_admin: user.is_admin,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Change the caller's own password; clears the forced-change flag
    pub async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        if new_password.len() < 8 {
            return Err(AppError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let user = self.repository.users.get_by_id(user_id).await?;

        if !self.verify_password(&user, current_password)? {
            return Err(AppError::Authentication(
                "Current password is incorrect".to_string(),
            ));
        }

        let hash = self.hash_password(new_password)?;
        self.repository.users.update_password(user_id, &hash, false).await
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Search users
    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<UserShort>, i64)> {
        self.repository.users.search(query).await
    }

    /// Initial-password policy, from site settings
    async fn password_policy(&self) -> AppResult<SiteSettings> {
        Ok(self.repository.settings.get().await?.unwrap_or_default())
    }

    /// Create a user. A missing password is generated from the site policy
    /// and returned exactly once.
    pub async fn create_user(&self, create: CreateUser) -> AppResult<CreatedUser> {
        if !USERNAME_RE.is_match(&create.username) {
            return Err(AppError::Validation(
                "Username must be 4-23 digits".to_string(),
            ));
        }

        if self.repository.users.username_exists(&create.username).await? {
            return Err(AppError::Conflict(format!(
                "Username {} already exists",
                create.username
            )));
        }

        let password = match create.password {
            Some(password) => password,
            None => generate_password(&self.password_policy().await?),
        };
        let hash = self.hash_password(&password)?;

        let (is_staff, is_admin) = create.role.unwrap_or(Role::Normal).flags();
        let user = self
            .repository
            .users
            .create(
                &create.username,
                create.display_name.as_deref().unwrap_or(""),
                &hash,
                is_staff,
                is_admin,
            )
            .await?;

        Ok(CreatedUser {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
            password,
        })
    }

    /// Update display name, active flag, role
    pub async fn update_user(&self, id: i32, update: UpdateUser) -> AppResult<User> {
        let mut user = self
            .repository
            .users
            .update(id, update.display_name.as_deref(), update.is_active)
            .await?;

        if let Some(role) = update.role {
            let (is_staff, is_admin) = role.flags();
            user = self.repository.users.update_role(id, is_staff, is_admin).await?;
        }

        Ok(user)
    }

    /// Delete a user; administrators are protected
    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        let user = self.repository.users.get_by_id(id).await?;
        if user.is_admin {
            return Err(AppError::BusinessRule(
                "Administrators cannot be deleted".to_string(),
            ));
        }
        self.repository.users.delete(id).await
    }

    /// Create many users at once, skipping usernames that already exist.
    /// Every created entry carries its generated one-time password.
    pub async fn bulk_create(&self, request: BulkCreateUsers) -> AppResult<BulkCreateResponse> {
        for entry in &request.users {
            if !USERNAME_RE.is_match(&entry.username) {
                return Err(AppError::Validation(format!(
                    "Username {} must be 4-23 digits",
                    entry.username
                )));
            }
        }

        let usernames: Vec<String> =
            request.users.iter().map(|u| u.username.clone()).collect();
        let mut taken: HashSet<String> = self
            .repository
            .users
            .existing_usernames(&usernames)
            .await?
            .into_iter()
            .collect();

        let policy = self.password_policy().await?;

        let mut created = Vec::new();
        let mut skipped_existing = 0i64;

        for entry in request.users {
            // Duplicates inside the batch count as existing too
            if !taken.insert(entry.username.clone()) {
                skipped_existing += 1;
                continue;
            }

            let password = generate_password(&policy);
            let hash = self.hash_password(&password)?;
            let user = self
                .repository
                .users
                .create(
                    &entry.username,
                    entry.display_name.as_deref().unwrap_or(""),
                    &hash,
                    false,
                    false,
                )
                .await?;

            created.push(CreatedUser {
                id: user.id,
                username: user.username,
                display_name: user.display_name,
                password,
            });
        }

        Ok(BulkCreateResponse {
            created,
            skipped_existing,
        })
    }

    /// Regenerate initial passwords for the selected users. Administrators
    /// are skipped; affected users must change the password at next login.
    pub async fn bulk_reset(&self, request: BulkUserIds) -> AppResult<BulkResetResponse> {
        let users = self.repository.users.get_many(&request.user_ids).await?;
        let policy = self.password_policy().await?;

        let mut reset = Vec::new();
        let mut skipped_admins = 0i64;

        for user in users {
            if user.is_admin {
                skipped_admins += 1;
                continue;
            }

            let password = generate_password(&policy);
            let hash = self.hash_password(&password)?;
            self.repository.users.update_password(user.id, &hash, true).await?;

            reset.push(ResetCredential {
                username: user.username,
                password,
            });
        }

        Ok(BulkResetResponse {
            reset,
            skipped_admins,
        })
    }

    /// Delete the selected users; administrators are skipped
    pub async fn bulk_delete(&self, request: BulkUserIds) -> AppResult<BulkDeleteResponse> {
        let users = self.repository.users.get_many(&request.user_ids).await?;
        let skipped_admins = users.iter().filter(|u| u.is_admin).count() as i64;

        let deleted = self
            .repository
            .users
            .delete_many_non_admin(&request.user_ids)
            .await? as i64;

        Ok(BulkDeleteResponse {
            deleted,
            skipped_admins,
        })
    }

    /// Assign a role to the selected users; existing administrators are
    /// never demoted in bulk
    pub async fn bulk_role(&self, request: BulkRoleUpdate) -> AppResult<BulkRoleResponse> {
        let users = self.repository.users.get_many(&request.user_ids).await?;
        let skipped_admins = users.iter().filter(|u| u.is_admin).count() as i64;

        let (is_staff, is_admin) = request.role.flags();
        let updated = self
            .repository
            .users
            .update_role_many_non_admin(&request.user_ids, is_staff, is_admin)
            .await? as i64;

        Ok(BulkRoleResponse {
            updated,
            skipped_admins,
        })
    }
}

/// Generate an initial password from the site policy: one character from
/// every required pool, the rest drawn from their union, shuffled.
pub fn generate_password(policy: &SiteSettings) -> String {
    let mut rng = rand::thread_rng();

    let mut pools: Vec<Vec<char>> = Vec::new();
    if policy.password_require_uppercase {
        pools.push(('A'..='Z').collect());
    }
    if policy.password_require_lowercase {
        pools.push(('a'..='z').collect());
    }
    if policy.password_require_digits {
        pools.push(('0'..='9').collect());
    }
    if policy.password_require_symbols && !policy.password_symbols.is_empty() {
        pools.push(policy.password_symbols.chars().collect());
    }
    if pools.is_empty() {
        pools.push(('a'..='z').collect());
    }

    let length = policy.password_length.max(6) as usize;
    let union: Vec<char> = pools.iter().flatten().copied().collect();

    let mut chars: Vec<char> = pools
        .iter()
        .filter_map(|pool| pool.choose(&mut rng).copied())
        .collect();
    while chars.len() < length {
        if let Some(c) = union.choose(&mut rng) {
            chars.push(*c);
        }
    }
    chars.shuffle(&mut rng);

    chars.into_iter().collect()
}
