//! Database operations for users.

use chrono::Utc;
use sea_orm::*;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::user;
use crate::error::{AppError, AppResult};
use crate::models::user::{NewUser, UpdateUserRequest};
use crate::models::{Caller, Role, UserResponse};
use crate::services::passwords::{hash_password, verify_password};

use super::DbPool;

impl DbPool {
    /// Register a new user with role `user`.
    pub async fn register_user(&self, new_user: NewUser) -> AppResult<UserResponse> {
        let taken_username = user::Entity::find()
            .filter(user::Column::Username.eq(new_user.username.as_str()))
            .count(&self.conn)
            .await?;
        if taken_username > 0 {
            return Err(AppError::Conflict("username already exists".to_string()));
        }
        let taken_email = user::Entity::find()
            .filter(user::Column::Email.eq(new_user.email.as_str()))
            .count(&self.conn)
            .await?;
        if taken_email > 0 {
            return Err(AppError::Conflict("email already exists".to_string()));
        }

        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(Uuid::now_v7()),
            username: Set(new_user.username),
            email: Set(new_user.email),
            password_hash: Set(hash_password(&new_user.password)?),
            role: Set(Role::User.as_str().to_string()),
            is_active: Set(true),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        // A concurrent registration with the same name trips the unique index
        let created = model.insert(&self.conn).await?;

        info!("Registered user {} ({})", created.username, created.id);
        Ok(UserResponse::from(created))
    }

    /// Check credentials and record the login time.
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let found = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.conn)
            .await?;

        let Some(found) = found.filter(|u| verify_password(password, &u.password_hash)) else {
            warn!("Failed login for '{}'", username);
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        };
        if !found.is_active {
            warn!("Login attempt for disabled account '{}'", username);
            return Err(AppError::Unauthorized("Account is disabled".to_string()));
        }

        let mut active: user::ActiveModel = found.into();
        active.last_login = Set(Some(Utc::now()));
        let updated = active.update(&self.conn).await?;
        Ok(updated)
    }

    /// Find a user by ID.
    pub async fn find_user(&self, id: Uuid) -> AppResult<Option<user::Model>> {
        Ok(user::Entity::find_by_id(id).one(&self.conn).await?)
    }

    /// Every user, oldest first. Admin only.
    pub async fn list_users(&self, caller: &Caller) -> AppResult<Vec<UserResponse>> {
        caller.require_admin()?;

        let users = user::Entity::find()
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.conn)
            .await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Change a user's role and/or active flag. Admin only.
    pub async fn update_user(
        &self,
        caller: &Caller,
        id: Uuid,
        update: UpdateUserRequest,
    ) -> AppResult<UserResponse> {
        caller.require_admin()?;

        let existing = self
            .find_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", id)))?;

        let mut active: user::ActiveModel = existing.into();
        if let Some(role) = update.role {
            active.role = Set(role.as_str().to_string());
        }
        if let Some(is_active) = update.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&self.conn).await?;

        info!(
            "User {} updated by {} (role={}, active={})",
            updated.username, caller.username, updated.role, updated.is_active
        );
        Ok(UserResponse::from(updated))
    }
}
