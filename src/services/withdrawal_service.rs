// src/services/withdrawal_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::WithdrawalRepository,
    models::{
        product::measure,
        withdrawal::{WithdrawalDetail, WithdrawalKind, WithdrawalRequest, WithdrawalStatus},
    },
    services::product_service::ProductService,
};

/// Regras da solicitação: PARCIAL exige quantidade, TOTAL não aceita quantidade.
fn validate_kind(kind: WithdrawalKind, quantity: Option<Decimal>) -> Result<Option<Decimal>, AppError> {
    match (kind, quantity) {
        (WithdrawalKind::Total, None) => Ok(None),
        (WithdrawalKind::Total, Some(_)) => Err(AppError::BadRequest(
            "Retirada total não aceita quantidade.".into(),
        )),
        (WithdrawalKind::Parcial, Some(q)) => Ok(Some(measure(q, "Quantidade")?)),
        (WithdrawalKind::Parcial, None) => Err(AppError::BadRequest(
            "Retirada parcial exige uma quantidade maior que zero.".into(),
        )),
    }
}

fn ensure_pending(request: &WithdrawalRequest) -> Result<(), AppError> {
    if request.status != WithdrawalStatus::Pendente {
        return Err(AppError::Conflict(format!(
            "Solicitação já encerrada ({:?}).",
            request.status
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct WithdrawalService {
    pool: PgPool,
    repo: WithdrawalRepository,
    product_service: ProductService,
}

impl WithdrawalService {
    pub fn new(pool: PgPool, repo: WithdrawalRepository, product_service: ProductService) -> Self {
        Self { pool, repo, product_service }
    }

    pub async fn list(&self, status: Option<WithdrawalStatus>) -> Result<Vec<WithdrawalDetail>, AppError> {
        self.repo.list(status).await
    }

    pub async fn get(&self, id: Uuid) -> Result<WithdrawalDetail, AppError> {
        self.repo
            .find_detail(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Solicitação de retirada"))
    }

    /// Abre a solicitação e coloca o produto em AGUARDANDO_RETIRADA.
    pub async fn create(
        &self,
        product_id: Uuid,
        kind: WithdrawalKind,
        quantity: Option<Decimal>,
        reason: Option<&str>,
        requested_by: Uuid,
    ) -> Result<WithdrawalDetail, AppError> {
        let quantity = validate_kind(kind, quantity)?;

        let mut tx = self.pool.begin().await?;
        if let Some(pending) = self.repo.pending_for_product(&mut *tx, product_id).await? {
            return Err(AppError::Conflict(format!(
                "O produto já possui a solicitação de retirada {} pendente.",
                pending.id
            )));
        }
        let product = self.product_service.mark_awaiting_withdrawal(&mut tx, product_id).await?;

        if let Some(q) = quantity {
            if q >= product.quantity {
                return Err(AppError::BadRequest(format!(
                    "Quantidade parcial ({}) deve ser menor que a quantidade atual ({}).",
                    q, product.quantity
                )));
            }
        }

        let request = self
            .repo
            .create(&mut *tx, product.id, product.client_id, kind, quantity, reason, requested_by)
            .await?;
        tx.commit().await?;

        tracing::info!(request_id = %request.id, product_id = %product.id, kind = ?kind, "Solicitação de retirada criada");
        self.get(request.id).await
    }

    /// Conclui a retirada (baixa do estoque) e encerra a solicitação.
    pub async fn confirm(&self, id: Uuid, user_id: Uuid) -> Result<WithdrawalDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        let request = self
            .repo
            .find_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Solicitação de retirada"))?;
        ensure_pending(&request)?;

        let reason = request.reason.as_deref();
        match (request.kind, request.quantity) {
            (WithdrawalKind::Parcial, Some(quantity)) => {
                self.product_service
                    .complete_partial_withdrawal(&mut tx, request.product_id, quantity, reason, user_id)
                    .await?;
            }
            _ => {
                self.product_service
                    .complete_total_withdrawal(&mut tx, request.product_id, reason, user_id)
                    .await?;
            }
        }

        self.repo
            .resolve(&mut *tx, request.id, WithdrawalStatus::Concluida, user_id)
            .await?;
        tx.commit().await?;

        tracing::info!(request_id = %request.id, product_id = %request.product_id, "Retirada confirmada");
        self.get(id).await
    }

    /// Cancela a solicitação; o produto volta a LOCADO.
    pub async fn cancel(&self, id: Uuid, user_id: Uuid) -> Result<WithdrawalDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        let request = self
            .repo
            .find_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Solicitação de retirada"))?;
        ensure_pending(&request)?;

        self.product_service.release_withdrawal(&mut tx, request.product_id).await?;
        self.repo
            .resolve(&mut *tx, request.id, WithdrawalStatus::Cancelada, user_id)
            .await?;
        tx.commit().await?;

        tracing::info!(request_id = %request.id, product_id = %request.product_id, "Retirada cancelada");
        self.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_withdrawal_has_no_quantity() {
        assert_eq!(validate_kind(WithdrawalKind::Total, None).unwrap(), None);
        assert!(validate_kind(WithdrawalKind::Total, Some(Decimal::ONE)).is_err());
    }

    #[test]
    fn partial_withdrawal_needs_positive_quantity() {
        assert_eq!(
            validate_kind(WithdrawalKind::Parcial, Some(Decimal::from(4))).unwrap(),
            Some(Decimal::from(4))
        );
        assert!(validate_kind(WithdrawalKind::Parcial, None).is_err());
        assert!(validate_kind(WithdrawalKind::Parcial, Some(Decimal::ZERO)).is_err());
        assert_eq!(
            validate_kind(WithdrawalKind::Parcial, Some(Decimal::new(12345, 4))).unwrap(),
            Some(Decimal::new(1235, 3))
        );
    }
}
