use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::product::ProductStatus;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário inativo")]
    UserInactive,

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    #[error("{0} não encontrado(a)")]
    NotFound(&'static str),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("Local {0} já está ocupado")]
    LocationOccupied(String),

    #[error("Capacidade excedida no local {code}")]
    CapacityExceeded {
        code: String,
        max_capacity_kg: Decimal,
        requested_kg: Decimal,
    },

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidStatusTransition { from: ProductStatus, to: ProductStatus },

    #[error("Versão desatualizada (esperada {expected}, atual {current})")]
    VersionConflict { expected: i32, current: i32 },

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro ao gerar documento: {0}")]
    DocumentError(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// O corpo de erro padronizado devolvido pela API.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

// Formato do corpo de erro, para a documentação OpenAPI
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "Produto não encontrado(a).")]
    pub error: String,
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into(), details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn to_api_error(&self) -> ApiError {
        match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::BTreeMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                ApiError {
                    status: StatusCode::BAD_REQUEST,
                    error: "Um ou mais campos são inválidos.".into(),
                    details: Some(json!(details)),
                }
            }
            AppError::BadRequest(msg) => ApiError::new(StatusCode::BAD_REQUEST, msg.clone()),
            AppError::EmailAlreadyExists => {
                ApiError::new(StatusCode::CONFLICT, "Este e-mail já está em uso.")
            }
            AppError::InvalidCredentials => {
                ApiError::new(StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.")
            }
            AppError::InvalidToken => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.",
            ),
            AppError::UserInactive => {
                ApiError::new(StatusCode::FORBIDDEN, "Usuário desativado.")
            }
            AppError::Forbidden(msg) => ApiError::new(StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(resource) => {
                ApiError::new(StatusCode::NOT_FOUND, format!("{} não encontrado(a).", resource))
            }
            AppError::UniqueConstraintViolation(msg) | AppError::Conflict(msg) => {
                ApiError::new(StatusCode::CONFLICT, msg.clone())
            }
            AppError::LocationOccupied(code) => ApiError::new(
                StatusCode::CONFLICT,
                format!("O local {} já está ocupado por outro produto.", code),
            ),
            AppError::CapacityExceeded { code, max_capacity_kg, requested_kg } => ApiError {
                status: StatusCode::CONFLICT,
                error: format!("Capacidade do local {} excedida.", code),
                details: Some(json!({
                    "maxCapacityKg": max_capacity_kg,
                    "requestedKg": requested_kg,
                })),
            },
            AppError::InvalidStatusTransition { from, to } => ApiError::new(
                StatusCode::CONFLICT,
                format!("Não é possível mudar o status de {} para {}.", from, to),
            ),
            AppError::VersionConflict { expected, current } => ApiError {
                status: StatusCode::CONFLICT,
                error: "O registro foi alterado por outro usuário. Recarregue e tente novamente."
                    .into(),
                details: Some(json!({ "expectedVersion": expected, "currentVersion": current })),
            },
            AppError::DatabaseError(sqlx::Error::RowNotFound) => {
                ApiError::new(StatusCode::NOT_FOUND, "Registro não encontrado.")
            }

            // Todos os outros erros viram 500. O `tracing` loga a mensagem detalhada.
            e => {
                tracing::error!(error = ?e, "Erro Interno do Servidor: {}", e);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error().into_response()
    }
}

/// Converte um erro de violação de unicidade em um erro de domínio.
pub(crate) fn map_unique_violation(e: sqlx::Error, on_unique: impl FnOnce(&str) -> AppError) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return on_unique(db_err.constraint().unwrap_or_default());
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn domain_errors_map_to_expected_status() {
        let cases = vec![
            (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AppError::UserInactive, StatusCode::FORBIDDEN),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::NotFound("Produto"), StatusCode::NOT_FOUND),
            (AppError::LocationOccupied("Q01-L01-F01-A01".into()), StatusCode::CONFLICT),
            (
                AppError::InvalidStatusTransition {
                    from: ProductStatus::Retirado,
                    to: ProductStatus::Locado,
                },
                StatusCode::CONFLICT,
            ),
            (AppError::VersionConflict { expected: 1, current: 2 }, StatusCode::CONFLICT),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::DatabaseError(sqlx::Error::RowNotFound), StatusCode::NOT_FOUND),
            (
                AppError::InternalServerError(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.to_api_error().status, status, "{:?}", err);
        }
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("length");
        err.message = Some("O nome é obrigatório.".into());
        errors.add("name", err);

        let api = AppError::ValidationError(errors).to_api_error();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["name"][0], "O nome é obrigatório.");
    }

    #[test]
    fn capacity_error_exposes_numbers() {
        let api = AppError::CapacityExceeded {
            code: "Q01-L01-F01-A01".into(),
            max_capacity_kg: Decimal::new(1000, 0),
            requested_kg: Decimal::new(1200, 0),
        }
        .to_api_error();
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert!(api.error.contains("Q01-L01-F01-A01"));
        assert!(api.details.is_some());
    }
}
