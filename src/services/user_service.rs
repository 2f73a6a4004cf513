// src/services/user_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{CreateUserPayload, UpdateUserPayload, User, UserRole},
    services::auth::hash_password,
};

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
    repo: UserRepository,
}

impl UserService {
    pub fn new(pool: PgPool, repo: UserRepository) -> Self {
        Self { pool, repo }
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        self.repo.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<User, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound("Usuário"))
    }

    pub async fn create(&self, name: &str, email: &str, password: &str, role: UserRole) -> Result<User, AppError> {
        let hashed = hash_password(password).await?;
        let user = self
            .repo
            .create_user(&self.pool, name.trim(), email.trim(), &hashed, role)
            .await?;
        tracing::info!(user_id = %user.id, role = ?user.role, "Usuário criado");
        Ok(user)
    }

    pub async fn create_from_payload(&self, payload: &CreateUserPayload) -> Result<User, AppError> {
        self.create(&payload.name, &payload.email, &payload.password, payload.role).await
    }

    /// Atualização feita por um administrador. Ninguém rebaixa ou desativa a si mesmo.
    pub async fn update(&self, acting: &User, id: Uuid, payload: &UpdateUserPayload) -> Result<User, AppError> {
        if acting.id == id {
            if payload.is_active == Some(false) {
                return Err(AppError::Forbidden("Você não pode desativar o próprio usuário.".into()));
            }
            if payload.role.is_some_and(|r| r != acting.role) {
                return Err(AppError::Forbidden("Você não pode alterar o próprio papel.".into()));
            }
        }

        let hashed = match payload.password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let user = self
            .repo
            .update_user(
                id,
                payload.name.as_deref().map(str::trim),
                payload.email.as_deref().map(str::trim),
                hashed.as_deref(),
                payload.role,
                payload.is_active,
            )
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        tracing::info!(user_id = %user.id, by = %acting.id, "Usuário atualizado");
        Ok(user)
    }

    /// "Excluir" desativa: o histórico de movimentações aponta para o usuário.
    pub async fn deactivate(&self, acting: &User, id: Uuid) -> Result<User, AppError> {
        if acting.id == id {
            return Err(AppError::Forbidden("Você não pode desativar o próprio usuário.".into()));
        }
        let user = self
            .repo
            .update_user(id, None, None, None, None, Some(false))
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;
        tracing::warn!(user_id = %user.id, by = %acting.id, "Usuário desativado");
        Ok(user)
    }

    /// Troca de senha administrativa (CLI).
    pub async fn reset_password(&self, email: &str, password: &str) -> Result<User, AppError> {
        let user = self
            .repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;
        let hashed = hash_password(password).await?;
        let user = self
            .repo
            .update_user(user.id, None, None, Some(&hashed), None, None)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;
        tracing::warn!(user_id = %user.id, "Senha redefinida");
        Ok(user)
    }
}
