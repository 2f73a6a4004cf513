// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    middleware::auth::AuthenticatedUser,
    models::auth::UserRole,
};

/// O que um papel exigido precisa dizer
pub trait RoleDef: Send + Sync + 'static {
    fn allows(role: UserRole) -> bool;
    fn description() -> &'static str;
}

/// O Extractor (Guardião). Precisa rodar depois do `auth_guard`.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)?;

        if !T::allows(user.0.role) {
            tracing::warn!(user_id = %user.0.id, role = ?user.0.role, required = T::description(), "Acesso negado");
            return Err(AppError::Forbidden(format!(
                "Esta ação exige o papel {}.",
                T::description()
            )));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// PAPÉIS (TIPOS)
// ---

pub struct RoleAdmin;
impl RoleDef for RoleAdmin {
    fn allows(role: UserRole) -> bool {
        role == UserRole::Admin
    }
    fn description() -> &'static str {
        "ADMIN"
    }
}

// Operadores executam; administradores também podem
pub struct RoleOperator;
impl RoleDef for RoleOperator {
    fn allows(role: UserRole) -> bool {
        matches!(role, UserRole::Admin | UserRole::Operator)
    }
    fn description() -> &'static str {
        "OPERATOR ou ADMIN"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_role_is_exclusive() {
        assert!(RoleAdmin::allows(UserRole::Admin));
        assert!(!RoleAdmin::allows(UserRole::Operator));
    }

    #[test]
    fn operator_role_includes_admin() {
        assert!(RoleOperator::allows(UserRole::Operator));
        assert!(RoleOperator::allows(UserRole::Admin));
    }
}
